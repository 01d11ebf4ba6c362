mod calculator;
mod error;
mod logging;
mod property;

pub use calculator::{
    CalculatorOutput, EnergyCalculator, EnergyGradient, ParameterValues, ScfFailure, ScfOutcome,
};
pub use error::LossError;
pub use property::{LossProperty, Reference, ReferenceData, N_IMPLEMENTED};

use crate::constants::Constants;
use crate::defaults::{EIG, LOSS_WEIGHT};
use crate::initialization::{check_molecule_lists, MoleculeParser, ParseError};
use crate::io::{CalculatorSettings, SeqmSettings};
use crate::utils::{init_logger, pad_species, pad_vectors, Timer};
use itertools::Itertools;
use log::{debug, warn};
use logging::*;
use ndarray::prelude::*;
use ndarray::Zip;

/// Loss returned when the SCF of the energy calculator fails.
pub const LOSS_FAIL: f64 = f64::INFINITY;

const GAP_WARNING: &str = "HOMO-LUMO gap explicitly depends on eigenvalues. These might have \
    derivative discontinuities w.r.t. SEQM parameters (MOs crossing) -> unlikely, but possible \
    instabilities in the parameter gradient!";

/// Weighted sum of squared errors of SEQM properties of a molecule batch w.r.t. reference
/// data. The loss is a function of the trainable semiempirical parameters only, the geometry
/// of the batch stays fixed.
pub struct LossEngine<C: EnergyCalculator> {
    /// Atomic numbers, zero padded (n_mol, molsize)
    pub species: Array2<u8>,
    /// Coordinates, zero padded (n_mol, molsize, 3)
    pub coordinates: Array3<f64>,
    /// Number of real atoms of every molecule
    pub n_atoms: Array1<usize>,
    /// Elements of the batch with a leading 0 for the padding
    pub elements: Vec<u8>,
    parameter_names: Vec<String>,
    settings: SeqmSettings,
    include: [bool; N_IMPLEMENTED],
    weights: Array1<f64>,
    references: [Option<Reference>; N_IMPLEMENTED],
    constants: Constants,
    calc: C,
}

impl<C: EnergyCalculator> LossEngine<C> {
    /// Sets up the loss for a list of molecules. `overrides` is a TOML document with the
    /// settings that differ from the defaults of [SeqmSettings].
    pub fn new(
        parameter_names: Vec<String>,
        species: Vec<Array1<u8>>,
        coordinates: Vec<Array2<f64>>,
        overrides: &str,
    ) -> Result<Self, LossError> {
        check_molecule_lists(&species, &coordinates)?;
        let settings: SeqmSettings =
            SeqmSettings::from_toml(overrides).map_err(LossError::Settings)?;

        let species: Array2<u8> = pad_species(&species);
        let molsize: usize = species.ncols();
        let coordinates: Array3<f64> = pad_vectors(&coordinates, molsize);
        let n_atoms: Array1<usize> = species
            .outer_iter()
            .map(|row| row.iter().filter(|&&z| z != 0).count())
            .collect();
        let elements: Vec<u8> = std::iter::once(0)
            .chain(species.iter().copied().filter(|&z| z != 0).unique().sorted())
            .collect();

        let constants: Constants = Constants::new();
        if let Some((molecule, atomic_number)) =
            species.outer_iter().enumerate().find_map(|(m, row)| {
                row.iter()
                    .copied()
                    .find(|&z| !constants.is_known(z))
                    .map(|z| (m, z))
            })
        {
            return Err(LossError::Parser(ParseError::UnknownElement {
                molecule,
                atomic_number,
            }));
        }

        let calc: C = C::configure(CalculatorSettings {
            settings: settings.clone(),
            elements: elements.clone(),
            learned: parameter_names.clone(),
            eig: EIG,
        })
        .map_err(LossError::Calculator)?;

        init_logger(settings.verbose);
        print_loss_init(species.nrows(), molsize, &elements, &settings);

        Ok(Self {
            species,
            coordinates,
            n_atoms,
            elements,
            parameter_names,
            settings,
            include: [false; N_IMPLEMENTED],
            weights: Array1::zeros(N_IMPLEMENTED),
            references: Default::default(),
            constants,
            calc,
        })
    }

    pub fn n_mol(&self) -> usize {
        self.species.nrows()
    }

    pub fn settings(&self) -> &SeqmSettings {
        &self.settings
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn weights(&self) -> ArrayView1<f64> {
        self.weights.view()
    }

    pub fn is_enabled(&self, property: LossProperty) -> bool {
        self.include[property.index()]
    }

    pub fn reference(&self, property: LossProperty) -> Option<&Reference> {
        self.references[property.index()].as_ref()
    }

    pub fn calculator(&self) -> &C {
        &self.calc
    }

    pub fn calculator_mut(&mut self) -> &mut C {
        &mut self.calc
    }

    /// Enables the loss term of `property` ("energy", "forces", "gap" or "atomization").
    /// Adding the same property again replaces its weight and reference.
    pub fn add_loss<R: Into<ReferenceData>>(
        &mut self,
        property: &str,
        reference: R,
        weight: f64,
    ) -> Result<(), LossError> {
        let prop: LossProperty = property.parse()?;
        if prop == LossProperty::Gap {
            warn!("{}", GAP_WARNING);
        }
        let reference: Reference = Reference::from_data(
            prop,
            reference.into(),
            self.n_atoms.view(),
            self.species.ncols(),
        )?;
        self.weights[prop.index()] = weight;
        self.references[prop.index()] = Some(reference);
        self.include[prop.index()] = true;
        print_loss_term_added(prop, weight);
        Ok(())
    }

    /// [add_loss](Self::add_loss) with the default weight of 1.
    pub fn add_loss_default<R: Into<ReferenceData>>(
        &mut self,
        property: &str,
        reference: R,
    ) -> Result<(), LossError> {
        self.add_loss(property, reference, LOSS_WEIGHT)
    }

    /// Evaluates the loss for the given values of the trainable parameters (in the order of
    /// the parameter names). If the SCF fails, [LOSS_FAIL] is returned instead of an error,
    /// so that an optimizer can treat the step as a bad one.
    pub fn forward(&mut self, parameters: &[f64]) -> Result<f64, LossError> {
        if !self.include.iter().any(|&x| x) {
            return Err(LossError::NoLossProperty);
        }
        let learned: ParameterValues = ParameterValues::bind(&self.parameter_names, parameters)?;

        let output: CalculatorOutput = match self.calc.calculate(
            &self.constants,
            self.coordinates.view(),
            self.species.view(),
            &learned,
        ) {
            ScfOutcome::Converged(output) => output,
            ScfOutcome::Failed(failure) => {
                warn!("{}, the loss is set to {}", failure, LOSS_FAIL);
                return Ok(LOSS_FAIL);
            }
        };

        let mask: Array1<f64> = output.convergence_mask();
        let n_atoms: Array1<f64> = self.n_atoms.mapv(|n| n as f64);
        let mut deltas: Array1<f64> = Array1::zeros(N_IMPLEMENTED);

        let idx: usize = LossProperty::Atomization.index();
        if let (true, Some(Reference::Scalar(reference))) =
            (self.include[idx], self.references[idx].as_ref())
        {
            let delta_a2: Array1<f64> =
                (&output.atomization_energy - reference).mapv(|x| x * x) / &n_atoms;
            deltas[idx] = masked_sum(delta_a2.view(), mask.view());
        }
        let idx: usize = LossProperty::Energy.index();
        if let (true, Some(Reference::Scalar(reference))) =
            (self.include[idx], self.references[idx].as_ref())
        {
            let delta_e2: Array1<f64> =
                (&output.total_energy - reference).mapv(|x| x * x) / &n_atoms;
            deltas[idx] = masked_sum(delta_e2.view(), mask.view());
        }
        let idx: usize = LossProperty::Forces.index();
        if let (true, Some(Reference::Vector(reference))) =
            (self.include[idx], self.references[idx].as_ref())
        {
            // F = -dE/dR of the batch-summed total energy
            let gradient: EnergyGradient = match self.calc.energy_gradient(
                &self.constants,
                self.coordinates.view(),
                self.species.view(),
                &learned,
                self.settings.coordinate_step,
            ) {
                ScfOutcome::Converged(gradient) => gradient,
                ScfOutcome::Failed(failure) => {
                    warn!(
                        "{} during the force evaluation, the loss is set to {}",
                        failure, LOSS_FAIL
                    );
                    return Ok(LOSS_FAIL);
                }
            };
            // molecules that fail at a displaced geometry have no forces
            let force_mask: Array1<f64> = Zip::from(&mask)
                .and(&gradient.not_converged)
                .map_collect(|&m, &failed| if failed { 0.0 } else { m });
            let n_unstable: usize = gradient.not_converged.iter().filter(|&&x| x).count();
            if n_unstable > 0 {
                debug!(
                    "{} molecule(s) did not converge at a displaced geometry and are masked in the forces",
                    n_unstable
                );
            }
            let forces: Array3<f64> = -gradient.gradient;
            let delta_f2: Array1<f64> = (&forces - reference)
                .mapv(|x| x * x)
                .sum_axis(Axis(2))
                .sum_axis(Axis(1))
                / &n_atoms;
            deltas[idx] = masked_sum(delta_f2.view(), force_mask.view());
        }
        let idx: usize = LossProperty::Gap.index();
        if let (true, Some(Reference::Scalar(reference))) =
            (self.include[idx], self.references[idx].as_ref())
        {
            let gap: Array1<f64> = self.homo_lumo_gap(&output, mask.view())?;
            let delta_g2: Array1<f64> = (&gap - reference).mapv(|x| x * x);
            deltas[idx] = masked_sum(delta_g2.view(), mask.view());
        }

        let n_failed: usize = output.not_converged.iter().filter(|&&x| x).count();
        if n_failed > 0 {
            debug!("{} molecule(s) did not converge and are masked", n_failed);
        }
        print_loss_terms(deltas.view(), self.weights.view(), n_failed);
        Ok(deltas.dot(&self.weights))
    }

    /// Gradient of the loss w.r.t. the trainable parameters by central finite differences.
    /// If the loss itself is [LOSS_FAIL] there is no meaningful gradient and every entry is NaN.
    pub fn parameter_gradient(&mut self, parameters: &[f64]) -> Result<Array1<f64>, LossError> {
        let loss: f64 = self.forward(parameters)?;
        if !loss.is_finite() {
            warn!("The loss is not finite, no parameter gradient can be computed");
            return Ok(Array1::from_elem(parameters.len(), f64::NAN));
        }
        let timer: Timer = Timer::start();
        let mut gradient: Array1<f64> = Array1::zeros(parameters.len());
        for (idx, value) in parameters.iter().enumerate() {
            let stepsize: f64 = self.settings.parameter_step * value.abs().max(1.0);
            let mut params_1: Vec<f64> = parameters.to_vec();
            let mut params_2: Vec<f64> = parameters.to_vec();
            params_1[idx] += stepsize;
            params_2[idx] -= stepsize;
            let loss_1: f64 = self.forward(&params_1)?;
            let loss_2: f64 = self.forward(&params_2)?;
            gradient[idx] = (loss_1 - loss_2) / (2.0 * stepsize);
        }
        debug!("{}", timer);
        Ok(gradient)
    }

    /// LUMO - HOMO orbital energy of every molecule. Masked molecules get a gap of 0.
    fn homo_lumo_gap(
        &self,
        output: &CalculatorOutput,
        mask: ArrayView1<f64>,
    ) -> Result<Array1<f64>, LossError> {
        let parser: MoleculeParser = MoleculeParser::new(self.settings.method);
        let n_occ: Array1<usize> = parser
            .parse(&self.constants, self.species.view(), self.coordinates.view())?
            .occupation
            .alpha();
        let orb_eigs: &Array2<f64> = &output.orbital_energies;
        let n_orbitals: usize = orb_eigs.ncols();
        let mut gap: Array1<f64> = Array1::zeros(n_occ.len());
        for (m, &nocc) in n_occ.iter().enumerate() {
            if mask[m] == 0.0 {
                continue;
            }
            if nocc == 0 || nocc >= n_orbitals {
                return Err(LossError::OrbitalIndex {
                    molecule: m,
                    n_occ: nocc,
                    n_orbitals,
                });
            }
            let (homo, lumo): (usize, usize) = (nocc - 1, nocc);
            gap[m] = orb_eigs[[m, lumo]] - orb_eigs[[m, homo]];
        }
        Ok(gap)
    }
}

/// Sum over the converged molecules. Masked molecules are skipped, so that non-finite
/// values of a failed SCF cannot reach the loss.
fn masked_sum(values: ArrayView1<f64>, mask: ArrayView1<f64>) -> f64 {
    values
        .iter()
        .zip(mask.iter())
        .filter(|&(_, &m)| m != 0.0)
        .map(|(v, m)| v * m)
        .sum()
}
