use crate::constants::Constants;
use crate::io::CalculatorSettings;
use crate::loss::LossError;
use ndarray::prelude::*;
use std::fmt;

/// Values of the trainable parameters, bound to their declared names in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValues {
    names: Vec<String>,
    values: Vec<f64>,
}

impl ParameterValues {
    /// Binds `values` to `names` by position. Every declared name needs exactly one value.
    pub fn bind(names: &[String], values: &[f64]) -> Result<Self, LossError> {
        if values.len() < names.len() {
            return Err(LossError::MissingParameter(names[values.len()].clone()));
        }
        if values.len() > names.len() {
            return Err(LossError::ParameterCount {
                expected: names.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            names: names.to_vec(),
            values: values.to_vec(),
        })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Reason why the SCF procedure of the energy calculator did not finish.
#[derive(Debug, Clone, PartialEq)]
pub struct ScfFailure {
    pub message: String,
}

impl ScfFailure {
    pub fn new(message: &str) -> Self {
        Self {
            message: String::from(message),
        }
    }
}

impl fmt::Display for ScfFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "SCF failed: {}", self.message)
    }
}

/// Result of a call to the energy calculator. A failed SCF is an expected outcome during
/// training and not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ScfOutcome<T> {
    Converged(T),
    Failed(ScfFailure),
}

/// Output of the energy calculator for a batch of molecules. All energies are per molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorOutput {
    pub atomization_energy: Array1<f64>,
    pub total_energy: Array1<f64>,
    pub electronic_energy: Array1<f64>,
    pub nuclear_energy: Array1<f64>,
    pub isolated_atom_energy: Array1<f64>,
    /// Orbital energies in ascending order (n_mol, n_orbitals)
    pub orbital_energies: Array2<f64>,
    pub density_matrix: Option<Array3<f64>>,
    pub charges: Option<Array2<f64>>,
    /// Molecules whose SCF did not converge within the batch
    pub not_converged: Array1<bool>,
}

impl CalculatorOutput {
    /// Output with the given energies; the electronic energy is set to the total energy,
    /// nuclear and isolated atom energies to zero and every molecule counts as converged.
    pub fn new(
        total_energy: Array1<f64>,
        atomization_energy: Array1<f64>,
        orbital_energies: Array2<f64>,
    ) -> Self {
        let n_mol: usize = total_energy.len();
        Self {
            atomization_energy,
            electronic_energy: total_energy.clone(),
            total_energy,
            nuclear_energy: Array1::zeros(n_mol),
            isolated_atom_energy: Array1::zeros(n_mol),
            orbital_energies,
            density_matrix: None,
            charges: None,
            not_converged: Array1::from_elem(n_mol, false),
        }
    }

    pub fn with_not_converged(mut self, not_converged: Array1<bool>) -> Self {
        self.not_converged = not_converged;
        self
    }

    /// Weight of every molecule in the loss: 1 if converged, 0 otherwise.
    pub fn convergence_mask(&self) -> Array1<f64> {
        self.not_converged.mapv(|failed| if failed { 0.0 } else { 1.0 })
    }
}

/// Nuclear gradient of the batch-summed total energy together with the molecules whose SCF
/// did not converge in any of the evaluations the gradient is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGradient {
    /// (n_mol, molsize, 3)
    pub gradient: Array3<f64>,
    pub not_converged: Array1<bool>,
}

impl EnergyGradient {
    /// Gradient of a batch in which every molecule converged.
    pub fn converged(gradient: Array3<f64>) -> Self {
        let n_mol: usize = gradient.dim().0;
        Self {
            gradient,
            not_converged: Array1::from_elem(n_mol, false),
        }
    }
}

/// Trait of the SEQM energy calculator that runs the SCF for a whole batch.
pub trait EnergyCalculator: Sized {
    /// Creates the calculator for the elements, trainable parameters and settings of a batch.
    fn configure(settings: CalculatorSettings) -> anyhow::Result<Self>;

    /// Energies, orbital energies and convergence flags of the batch for the given parameters.
    fn calculate(
        &mut self,
        constants: &Constants,
        coordinates: ArrayView3<f64>,
        species: ArrayView2<u8>,
        parameters: &ParameterValues,
    ) -> ScfOutcome<CalculatorOutput>;

    /// Gradient of the batch-summed total energy w.r.t. the nuclear coordinates.
    /// The default uses central finite differences of `calculate`; since the molecules are
    /// independent, one coordinate is displaced in all molecules at once. A molecule that
    /// does not converge at one of the displaced geometries is flagged and its gradient is
    /// set to zero. Calculators with analytic gradients should override this method.
    fn energy_gradient(
        &mut self,
        constants: &Constants,
        coordinates: ArrayView3<f64>,
        species: ArrayView2<u8>,
        parameters: &ParameterValues,
        stepsize: f64,
    ) -> ScfOutcome<EnergyGradient> {
        let (n_mol, molsize, _) = coordinates.dim();
        let mut gradient: Array3<f64> = Array3::zeros([n_mol, molsize, 3]);
        let mut not_converged: Array1<bool> = Array1::from_elem(n_mol, false);
        for atom in 0..molsize {
            for xyz in 0..3 {
                let mut geom_1: Array3<f64> = coordinates.to_owned();
                let mut geom_2: Array3<f64> = coordinates.to_owned();
                geom_1.slice_mut(s![.., atom, xyz]).mapv_inplace(|x| x + stepsize);
                geom_2.slice_mut(s![.., atom, xyz]).mapv_inplace(|x| x - stepsize);

                let mut energies: Vec<Array1<f64>> = Vec::with_capacity(2);
                for geom in [geom_1, geom_2].iter() {
                    match self.calculate(constants, geom.view(), species, parameters) {
                        ScfOutcome::Converged(output) => {
                            not_converged
                                .zip_mut_with(&output.not_converged, |failed, &f| *failed |= f);
                            energies.push(output.total_energy);
                        }
                        ScfOutcome::Failed(failure) => return ScfOutcome::Failed(failure),
                    }
                }
                let numerical_deriv: Array1<f64> =
                    (&energies[0] - &energies[1]) / (2.0 * stepsize);
                gradient
                    .slice_mut(s![.., atom, xyz])
                    .assign(&numerical_deriv);
            }
        }
        // padding atoms do not move
        for ((m, atom), z) in species.indexed_iter() {
            if *z == 0 {
                gradient.slice_mut(s![m, atom, ..]).fill(0.0);
            }
        }
        for (m, &failed) in not_converged.iter().enumerate() {
            if failed {
                gradient.index_axis_mut(Axis(0), m).fill(0.0);
            }
        }
        ScfOutcome::Converged(EnergyGradient {
            gradient,
            not_converged,
        })
    }
}
