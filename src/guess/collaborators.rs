use crate::guess::eigensolver::SymmetricEigensolver;
use crate::guess::parameters::ParameterTables;
use crate::initialization::{DensityMatrix, MoleculeBatch};
use anyhow::Result;
use hashbrown::HashMap;
use ndarray::prelude::*;

/// Learned per-element parameter overrides, keyed by the parameter name (e.g. "U_ss").
pub type ParameterMap = HashMap<String, Array1<f64>>;

/// Parameter overrides of the guess construction: either a fixed map, or a function of the
/// species and coordinates of the batch (e.g. a machine learning model) that produces one.
pub enum LearnedParameters {
    Fixed(ParameterMap),
    Generated(Box<dyn Fn(ArrayView2<u8>, ArrayView3<f64>) -> ParameterMap>),
}

impl Default for LearnedParameters {
    fn default() -> Self {
        LearnedParameters::Fixed(ParameterMap::new())
    }
}

impl LearnedParameters {
    pub fn resolve(&self, species: ArrayView2<u8>, coordinates: ArrayView3<f64>) -> ParameterMap {
        match self {
            LearnedParameters::Fixed(map) => map.clone(),
            LearnedParameters::Generated(generator) => generator(species, coordinates),
        }
    }
}

/// Per-atom parameter tables of the real atoms of a batch (in row-major order of the padded
/// species) as produced by the parameter packer.
#[derive(Debug, Clone, Default)]
pub struct PackedParameters {
    pub tables: HashMap<String, Array1<f64>>,
    pub alpha: Array1<f64>,
    pub chi: Array1<f64>,
}

/// One-electron matrix of the batch as (n_mol * molsize * molsize, k, k) atom pair blocks
/// together with the two-center intermediates needed by the Fock builder.
#[derive(Debug, Clone)]
pub struct CoreHamiltonian {
    pub blocks: Array3<f64>,
    pub w: Array2<f64>,
    pub rho0xi: Array1<f64>,
    pub rho0xj: Array1<f64>,
}

/// One-center two-electron integrals of the d-shell. Methods without d-orbitals leave
/// both fields empty.
#[derive(Debug, Clone, Default)]
pub struct TwoElectronIntegrals {
    pub coulomb: Option<ArrayD<f64>>,
    pub exchange: Option<ArrayD<f64>>,
}

impl TwoElectronIntegrals {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.coulomb.is_none() && self.exchange.is_none()
    }
}

/// Maps the atomic numbers of the real atoms of a batch to per-atom parameter tables.
pub trait ParameterPacker {
    fn pack(&self, atomic_numbers: &[u8], learned: &ParameterMap) -> Result<PackedParameters>;
}

/// Builds the core Hamiltonian of a batch.
pub trait CoreHamiltonianBuilder {
    fn build(&self, batch: &MoleculeBatch, parameters: &ParameterTables)
        -> Result<CoreHamiltonian>;
}

/// Builds the spin-resolved Fock matrices (n_mol, 2, N, N) of an open shell density.
pub trait FockBuilder {
    fn unrestricted(
        &self,
        batch: &MoleculeBatch,
        density: ArrayView4<f64>,
        hcore: &CoreHamiltonian,
        integrals: &TwoElectronIntegrals,
        parameters: &ParameterTables,
    ) -> Result<Array4<f64>>;
}

/// One-center integrals of the d-shell for the spd methods.
pub trait IntegralEvaluator {
    fn closed_shell(
        &self,
        batch: &MoleculeBatch,
        parameters: &ParameterTables,
        density: &DensityMatrix,
    ) -> Result<ArrayD<f64>>;

    /// Coulomb and exchange integrals of an open shell density.
    fn open_shell(
        &self,
        batch: &MoleculeBatch,
        parameters: &ParameterTables,
        density: &DensityMatrix,
    ) -> Result<(ArrayD<f64>, ArrayD<f64>)>;
}

/// The external routines the guess builder delegates to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub packer: &'a dyn ParameterPacker,
    pub hcore: &'a dyn CoreHamiltonianBuilder,
    pub fock: &'a dyn FockBuilder,
    pub integrals: &'a dyn IntegralEvaluator,
    pub eigensolver: &'a dyn SymmetricEigensolver,
}
