use crate::constants::Constants;
use crate::initialization::parser::{orbitals_per_atom, MoleculeParser, Occupation, ParseError};
use crate::io::Method;
use enum_as_inner::EnumAsInner;
use ndarray::prelude::*;

/// Density matrix of a batch in the padded orbital layout. Closed shell batches store one
/// matrix per molecule (n_mol, N, N), open shell batches one per spin channel (n_mol, 2, N, N).
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum DensityMatrix {
    Restricted(Array3<f64>),
    Unrestricted(Array4<f64>),
}

impl DensityMatrix {
    pub fn is_open_shell(&self) -> bool {
        matches!(self, DensityMatrix::Unrestricted(_))
    }

    /// Dimension N of the padded matrices.
    pub fn dim(&self) -> usize {
        match self {
            DensityMatrix::Restricted(p) => p.dim().2,
            DensityMatrix::Unrestricted(p) => p.dim().3,
        }
    }

    /// Total density, the spin channels of an open shell density are summed up.
    pub fn total(&self) -> Array3<f64> {
        match self {
            DensityMatrix::Restricted(p) => p.clone(),
            DensityMatrix::Unrestricted(p) => p.sum_axis(Axis(1)),
        }
    }
}

/// A batch of molecules padded to a common number of atoms. The atoms of each molecule are
/// expected at the front of their row, padding atoms have the atomic number 0.
#[derive(Debug, Clone)]
pub struct MoleculeBatch {
    pub method: Method,
    pub constants: Constants,
    /// Atomic numbers (n_mol, molsize)
    pub species: Array2<u8>,
    /// Cartesian coordinates (n_mol, molsize, 3)
    pub coordinates: Array3<f64>,
    pub charges: Array1<i32>,
    pub multiplicities: Array1<u8>,
    pub n_atoms: Array1<usize>,
    pub n_heavy: Array1<usize>,
    pub n_hydro: Array1<usize>,
    pub n_superheavy: Array1<usize>,
    pub occupation: Occupation,
    /// Cached density matrix, `None` until an initial guess was built.
    pub dm: Option<DensityMatrix>,
}

impl MoleculeBatch {
    pub fn new(
        method: Method,
        species: Array2<u8>,
        coordinates: Array3<f64>,
        charges: Array1<i32>,
        multiplicities: Array1<u8>,
    ) -> Result<Self, ParseError> {
        let constants: Constants = Constants::new();
        let parsed = MoleculeParser::new(method)
            .with_charges(charges.clone())
            .with_multiplicities(multiplicities.clone())
            .parse(&constants, species.view(), coordinates.view())?;
        Ok(Self {
            method,
            constants,
            species,
            coordinates,
            charges,
            multiplicities,
            n_atoms: parsed.n_atoms,
            n_heavy: parsed.n_heavy,
            n_hydro: parsed.n_hydro,
            n_superheavy: parsed.n_superheavy,
            occupation: parsed.occupation,
            dm: None,
        })
    }

    pub fn n_mol(&self) -> usize {
        self.species.nrows()
    }

    pub fn molsize(&self) -> usize {
        self.species.ncols()
    }

    /// Orbitals per atom block of the padded matrices (4 or 9).
    pub fn block_size(&self) -> usize {
        self.method.block_size()
    }

    /// Dimension N of the padded batch matrices.
    pub fn n_basis(&self) -> usize {
        self.block_size() * self.molsize()
    }

    pub fn is_open_shell(&self) -> bool {
        self.occupation.is_open_shell()
    }

    /// Number of orbitals of every atom, (n_mol, molsize).
    pub fn orbitals_per_atom(&self) -> Array2<usize> {
        self.species.mapv(|z| orbitals_per_atom(z, self.method))
    }
}
