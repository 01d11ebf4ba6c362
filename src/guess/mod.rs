mod collaborators;
mod density;
mod eigensolver;
mod error;
mod gershgorin;
mod logging;
mod packing;
mod parameters;
mod seed;

pub use collaborators::{
    Collaborators, CoreHamiltonian, CoreHamiltonianBuilder, FockBuilder, IntegralEvaluator,
    LearnedParameters, PackedParameters, ParameterMap, ParameterPacker, TwoElectronIntegrals,
};
pub use density::{degenerate_density, mix_homo_lumo, occupied_density};
pub use eigensolver::{diagonalize_with_retry, NalgebraEigensolver, SymmetricEigensolver};
pub use error::GuessError;
pub use gershgorin::{gershgorin_bounds, regularize_padding, SpectralBounds};
pub use packing::{OrbitalLayout, OrbitalSpan};
pub use parameters::{ParameterTables, D_TABLES, SP_TABLES};
pub use seed::atomic_density;

use crate::defaults::{
    CHECK_DEGENERACY, DEGENERACY_TOLERANCE, MIX_COEFF, MIX_HOMO_LUMO, OVERWRITE_EXISTING_DM,
};
use crate::initialization::{DensityMatrix, MoleculeBatch};
use crate::utils::Timer;
use derive_builder::Builder;
use log::{info, warn};
use logging::*;
use ndarray::prelude::*;

/// Options of the initial guess.
///
/// ```ignore
/// let options: GuessOptions = GuessOptionsBuilder::default()
///     .mix_homo_lumo(true)
///     .mix_coeff(0.3)
///     .build()?;
/// ```
#[derive(Builder, Debug, Clone, Copy, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct GuessOptions {
    /// Mix the LUMO into the HOMO of the alpha channel of open shell molecules.
    #[builder(default = "MIX_HOMO_LUMO")]
    pub mix_homo_lumo: bool,
    /// Fraction of the LUMO in the mixed HOMO, in [0, 1].
    #[builder(default = "MIX_COEFF")]
    pub mix_coeff: f64,
    /// Rebuild the atomic density even if the batch already holds a density matrix.
    #[builder(default = "OVERWRITE_EXISTING_DM")]
    pub overwrite_existing_dm: bool,
    #[builder(default = "CHECK_DEGENERACY")]
    pub check_degeneracy: bool,
    #[builder(default = "DEGENERACY_TOLERANCE")]
    pub degeneracy_tolerance: f64,
}

impl GuessOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(c) = self.mix_coeff {
            check_mix_coeff(c)?;
        }
        if let Some(tol) = self.degeneracy_tolerance {
            check_tolerance(tol)?;
        }
        Ok(())
    }
}

fn check_mix_coeff(c: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&c) {
        return Err(format!("mix_coeff must lie in [0, 1], got {}", c));
    }
    Ok(())
}

fn check_tolerance(tol: f64) -> Result<(), String> {
    if !(tol >= 0.0 && tol.is_finite()) {
        return Err(format!(
            "degeneracy_tolerance must be finite and non-negative, got {}",
            tol
        ));
    }
    Ok(())
}

impl Default for GuessOptions {
    fn default() -> Self {
        Self {
            mix_homo_lumo: MIX_HOMO_LUMO,
            mix_coeff: MIX_COEFF,
            overwrite_existing_dm: OVERWRITE_EXISTING_DM,
            check_degeneracy: CHECK_DEGENERACY,
            degeneracy_tolerance: DEGENERACY_TOLERANCE,
        }
    }
}

/// Initial density matrix of a batch. Orbitals and their energies are only available if
/// the density was obtained from the diagonalization of the pseudo-Fock matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessResult {
    pub density: DensityMatrix,
    /// Eigenvectors of the packed matrices (n_mol, 2, size, size)
    pub orbitals: Option<Array4<f64>>,
    /// Orbital energies (n_mol, 2, N), zero for the padding orbitals
    pub orbital_energies: Option<Array3<f64>>,
}

/// Builds the initial density matrix that seeds the SCF of a batch. Closed shell batches
/// and open shell batches without HOMO-LUMO mixing get the atomic density. With mixing,
/// the pseudo-Fock matrices of the atomic density are diagonalized and the density is
/// built from the orbitals with a mixed HOMO of the alpha channel.
pub struct GuessBuilder<'a> {
    collaborators: Collaborators<'a>,
    options: GuessOptions,
}

impl<'a> GuessBuilder<'a> {
    pub fn new(collaborators: Collaborators<'a>, options: GuessOptions) -> Result<Self, GuessError> {
        check_mix_coeff(options.mix_coeff).map_err(GuessError::InvalidOption)?;
        check_tolerance(options.degeneracy_tolerance).map_err(GuessError::InvalidOption)?;
        Ok(Self {
            collaborators,
            options,
        })
    }

    pub fn options(&self) -> &GuessOptions {
        &self.options
    }

    /// Builds the guess and stores its density matrix in the batch.
    pub fn build(
        &self,
        batch: &mut MoleculeBatch,
        learned: &LearnedParameters,
    ) -> Result<GuessResult, GuessError> {
        let timer: Timer = Timer::start();
        print_guess_init(
            batch.method,
            batch.n_mol(),
            batch.is_open_shell(),
            &self.options,
        );

        // parameters of the real atoms
        let learned: ParameterMap = learned.resolve(batch.species.view(), batch.coordinates.view());
        let atomic_numbers: Vec<u8> = batch.species.iter().copied().filter(|&z| z != 0).collect();
        let packed: PackedParameters = self.collaborators.packer.pack(&atomic_numbers, &learned)?;
        let parameters: ParameterTables = ParameterTables::select(batch.method, packed)?;
        if parameters.n_atoms() != atomic_numbers.len() {
            return Err(GuessError::Shape(format!(
                "the packer returned parameters for {} atoms, the batch has {}",
                parameters.n_atoms(),
                atomic_numbers.len()
            )));
        }

        let hcore: CoreHamiltonian = self.collaborators.hcore.build(batch, &parameters)?;
        let k: usize = batch.block_size();
        let n_pairs: usize = batch.n_mol() * batch.molsize() * batch.molsize();
        if hcore.blocks.dim() != (n_pairs, k, k) {
            return Err(GuessError::Shape(format!(
                "core Hamiltonian blocks {:?}, expected {:?}",
                hcore.blocks.dim(),
                (n_pairs, k, k)
            )));
        }

        let density: DensityMatrix = match &batch.dm {
            Some(dm) if !self.options.overwrite_existing_dm => dm.clone(),
            _ => {
                info!("Reinitializing density matrix");
                atomic_density(batch)
            }
        };
        self.check_density(batch, &density)?;
        batch.dm = Some(density.clone());

        let integrals: TwoElectronIntegrals = if batch.method.has_d_orbitals() {
            if batch.is_open_shell() {
                let (coulomb, exchange) =
                    self.collaborators
                        .integrals
                        .open_shell(batch, &parameters, &density)?;
                TwoElectronIntegrals {
                    coulomb: Some(coulomb),
                    exchange: Some(exchange),
                }
            } else {
                TwoElectronIntegrals {
                    coulomb: Some(self.collaborators.integrals.closed_shell(
                        batch,
                        &parameters,
                        &density,
                    )?),
                    exchange: None,
                }
            }
        } else {
            TwoElectronIntegrals::empty()
        };

        let guess: GuessResult = match density {
            DensityMatrix::Unrestricted(p) if self.options.mix_homo_lumo => {
                self.mixed_guess(batch, p.view(), &hcore, &integrals, &parameters)?
            }
            density => GuessResult {
                density,
                orbitals: None,
                orbital_energies: None,
            },
        };
        info!("{}", timer);
        Ok(guess)
    }

    /// Density from the pseudo-Fock matrices of an open shell batch with a mixed alpha HOMO.
    fn mixed_guess(
        &self,
        batch: &mut MoleculeBatch,
        p_spin: ArrayView4<f64>,
        hcore: &CoreHamiltonian,
        integrals: &TwoElectronIntegrals,
        parameters: &ParameterTables,
    ) -> Result<GuessResult, GuessError> {
        let n_mol: usize = batch.n_mol();
        let n: usize = batch.n_basis();
        let fock: Array4<f64> =
            self.collaborators
                .fock
                .unrestricted(batch, p_spin, hcore, integrals, parameters)?;
        if fock.dim() != (n_mol, 2, n, n) {
            return Err(GuessError::Shape(format!(
                "pseudo-Fock matrices {:?}, expected {:?}",
                fock.dim(),
                (n_mol, 2, n, n)
            )));
        }
        // molecule-major, spin-minor
        let fock: Array3<f64> = fock
            .as_standard_layout()
            .into_owned()
            .into_shape((2 * n_mol, n, n))
            .map_err(|err| GuessError::Shape(err.to_string()))?;

        let layout: OrbitalLayout =
            OrbitalLayout::new(batch.orbitals_per_atom().view(), batch.block_size())
                .repeat_channels(2);
        let mut packed: Array3<f64> = layout.pack(fock.view())?;
        let size: usize = layout.packed_size();
        let bounds: Vec<SpectralBounds> = regularize_padding(&mut packed, layout.n_orbitals());
        print_padding(layout.n_orbitals(), size, &bounds);

        let (energies, mut orbitals) =
            diagonalize_with_retry(self.collaborators.eigensolver, packed.view())?;
        if energies.dim() != (2 * n_mol, size) || orbitals.dim() != (2 * n_mol, size, size) {
            return Err(GuessError::Shape(format!(
                "eigensolver returned {:?} and {:?} for {} matrices of size {}",
                energies.dim(),
                orbitals.dim(),
                2 * n_mol,
                size
            )));
        }

        // padding eigenvalues are not physical
        let mut orbital_energies: Array2<f64> = Array2::zeros([2 * n_mol, n]);
        for (m, &n_orb) in layout.n_orbitals().iter().enumerate() {
            orbital_energies
                .slice_mut(s![m, ..n_orb])
                .assign(&energies.slice(s![m, ..n_orb]));
        }

        let n_occ: Vec<usize> = batch.occupation.flatten();
        for m in 0..n_mol {
            let n_orb: usize = layout.n_orbitals()[2 * m];
            if n_occ[2 * m] == 0 || n_occ[2 * m] >= n_orb {
                warn!(
                    "Molecule {} has no LUMO among its {} orbitals, its HOMO is not mixed",
                    m, n_orb
                );
                continue;
            }
            mix_homo_lumo(
                orbitals.index_axis_mut(Axis(0), 2 * m),
                n_occ[2 * m],
                n_orb,
                self.options.mix_coeff,
            )?;
        }

        let mut packed_density: Array3<f64> = Array3::zeros([2 * n_mol, size, size]);
        for (m, mut p) in packed_density.outer_iter_mut().enumerate() {
            let c = orbitals.index_axis(Axis(0), m);
            if self.options.check_degeneracy {
                p.assign(&degenerate_density(
                    energies.row(m),
                    c,
                    n_occ[m],
                    layout.n_orbitals()[m],
                    self.options.degeneracy_tolerance,
                ));
            } else {
                p.assign(&occupied_density(c, n_occ[m]));
            }
        }

        let mut density: Array4<f64> = layout
            .unpack(packed_density.view())?
            .into_shape((n_mol, 2, n, n))
            .map_err(|err| GuessError::Shape(err.to_string()))?;
        if batch.method.has_d_orbitals() {
            density /= 2.0;
        }
        let density: DensityMatrix = DensityMatrix::Unrestricted(density);
        batch.dm = Some(density.clone());

        let orbitals: Array4<f64> = orbitals
            .into_shape((n_mol, 2, size, size))
            .map_err(|err| GuessError::Shape(err.to_string()))?;
        let orbital_energies: Array3<f64> = orbital_energies
            .into_shape((n_mol, 2, n))
            .map_err(|err| GuessError::Shape(err.to_string()))?;
        Ok(GuessResult {
            density,
            orbitals: Some(orbitals),
            orbital_energies: Some(orbital_energies),
        })
    }

    /// A cached density must match the basis and the shell of the batch.
    fn check_density(&self, batch: &MoleculeBatch, density: &DensityMatrix) -> Result<(), GuessError> {
        let n: usize = batch.n_basis();
        let n_mol: usize = batch.n_mol();
        let consistent: bool = match density {
            DensityMatrix::Restricted(p) => !batch.is_open_shell() && p.dim() == (n_mol, n, n),
            DensityMatrix::Unrestricted(p) => {
                batch.is_open_shell() && p.dim() == (n_mol, 2, n, n)
            }
        };
        if !consistent {
            return Err(GuessError::Shape(format!(
                "the cached density matrix (open shell: {}, N = {}) does not fit the batch \
                 (open shell: {}, N = {}), use overwrite_existing_dm",
                density.is_open_shell(),
                density.dim(),
                batch.is_open_shell(),
                n
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
