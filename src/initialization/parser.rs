use crate::constants::{has_d_shell, Constants};
use crate::io::Method;
use enum_as_inner::EnumAsInner;
use ndarray::prelude::*;
use std::fmt;

/// Occupied orbitals per molecule. Closed shell batches have one count per molecule, open
/// shell batches one count per spin channel (alpha in column 0, beta in column 1).
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Occupation {
    Restricted(Array1<usize>),
    Unrestricted(Array2<usize>),
}

impl Occupation {
    pub fn is_open_shell(&self) -> bool {
        matches!(self, Occupation::Unrestricted(_))
    }

    /// Occupation of the first (alpha) channel, or the doubly occupied count for closed shell.
    pub fn alpha(&self) -> Array1<usize> {
        match self {
            Occupation::Restricted(nocc) => nocc.clone(),
            Occupation::Unrestricted(nocc) => nocc.column(0).to_owned(),
        }
    }

    /// Occupations of all channels in molecule-major, spin-minor order.
    pub fn flatten(&self) -> Vec<usize> {
        match self {
            Occupation::Restricted(nocc) => nocc.to_vec(),
            Occupation::Unrestricted(nocc) => nocc.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Shape(String),
    UnknownElement { molecule: usize, atomic_number: u8 },
    ElectronCount { molecule: usize, electrons: i64, multiplicity: u8 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ParseError::Shape(msg) => write!(f, "Inconsistent molecule batch: {}", msg),
            ParseError::UnknownElement {
                molecule,
                atomic_number,
            } => write!(
                f,
                "Molecule {} contains the element Z = {} which has no core charge",
                molecule, atomic_number
            ),
            ParseError::ElectronCount {
                molecule,
                electrons,
                multiplicity,
            } => write!(
                f,
                "Molecule {} has {} electrons which is incompatible with multiplicity {}",
                molecule, electrons, multiplicity
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Per-molecule counts derived from the padded species.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch {
    pub n_atoms: Array1<usize>,
    /// Atoms with an sp shell (Z > 1 without a d-shell in the current method)
    pub n_heavy: Array1<usize>,
    pub n_hydro: Array1<usize>,
    /// Atoms with an spd shell, always zero for methods without d-orbitals
    pub n_superheavy: Array1<usize>,
    pub n_electrons: Array1<usize>,
    pub occupation: Occupation,
}

impl ParsedBatch {
    /// Number of active (non-padding) orbitals of every molecule.
    pub fn n_orbitals(&self) -> Array1<usize> {
        &self.n_heavy * 4 + &self.n_hydro + &self.n_superheavy * 9
    }
}

/// Number of orbitals of an atom with atomic number `z`; padding atoms have none.
pub fn orbitals_per_atom(z: u8, method: Method) -> usize {
    match z {
        0 => 0,
        1 => 1,
        _ if method.has_d_orbitals() && has_d_shell(z) => 9,
        _ => 4,
    }
}

/// Derives atom, orbital and electron counts of a padded molecule batch.
#[derive(Debug, Clone)]
pub struct MoleculeParser {
    method: Method,
    charges: Option<Array1<i32>>,
    multiplicities: Option<Array1<u8>>,
}

impl MoleculeParser {
    /// Parser for neutral singlet molecules.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            charges: None,
            multiplicities: None,
        }
    }

    pub fn with_charges(mut self, charges: Array1<i32>) -> Self {
        self.charges = Some(charges);
        self
    }

    pub fn with_multiplicities(mut self, multiplicities: Array1<u8>) -> Self {
        self.multiplicities = Some(multiplicities);
        self
    }

    pub fn parse(
        &self,
        constants: &Constants,
        species: ArrayView2<u8>,
        coordinates: ArrayView3<f64>,
    ) -> Result<ParsedBatch, ParseError> {
        let (n_mol, molsize) = species.dim();
        if coordinates.dim() != (n_mol, molsize, 3) {
            return Err(ParseError::Shape(format!(
                "species have shape {:?} but coordinates have shape {:?}",
                species.dim(),
                coordinates.dim()
            )));
        }
        let charges: Array1<i32> = self
            .charges
            .clone()
            .unwrap_or_else(|| Array1::zeros(n_mol));
        let multiplicities: Array1<u8> = self
            .multiplicities
            .clone()
            .unwrap_or_else(|| Array1::ones(n_mol));
        if charges.len() != n_mol || multiplicities.len() != n_mol {
            return Err(ParseError::Shape(format!(
                "{} molecules but {} charges and {} multiplicities",
                n_mol,
                charges.len(),
                multiplicities.len()
            )));
        }

        let mut n_atoms: Array1<usize> = Array1::zeros(n_mol);
        let mut n_heavy: Array1<usize> = Array1::zeros(n_mol);
        let mut n_hydro: Array1<usize> = Array1::zeros(n_mol);
        let mut n_superheavy: Array1<usize> = Array1::zeros(n_mol);
        let mut n_electrons: Array1<usize> = Array1::zeros(n_mol);
        let open_shell: bool = multiplicities.iter().any(|&m| m != 1);
        let mut nocc: Array2<usize> = Array2::zeros([n_mol, 2]);

        for (m, row) in species.outer_iter().enumerate() {
            let mut core_charge: f64 = 0.0;
            for &z in row.iter().filter(|&&z| z > 0) {
                if !constants.is_known(z) {
                    return Err(ParseError::UnknownElement {
                        molecule: m,
                        atomic_number: z,
                    });
                }
                n_atoms[m] += 1;
                core_charge += constants.tore(z);
                match orbitals_per_atom(z, self.method) {
                    1 => n_hydro[m] += 1,
                    9 => n_superheavy[m] += 1,
                    _ => n_heavy[m] += 1,
                }
            }
            let electrons: i64 = core_charge.round() as i64 - charges[m] as i64;
            let unpaired: i64 = multiplicities[m] as i64 - 1;
            if electrons < unpaired || (electrons - unpaired) % 2 != 0 || multiplicities[m] == 0 {
                return Err(ParseError::ElectronCount {
                    molecule: m,
                    electrons,
                    multiplicity: multiplicities[m],
                });
            }
            n_electrons[m] = electrons as usize;
            nocc[[m, 0]] = ((electrons + unpaired) / 2) as usize;
            nocc[[m, 1]] = ((electrons - unpaired) / 2) as usize;
        }

        let occupation: Occupation = if open_shell {
            Occupation::Unrestricted(nocc)
        } else {
            Occupation::Restricted(nocc.column(0).to_owned())
        };

        Ok(ParsedBatch {
            n_atoms,
            n_heavy,
            n_hydro,
            n_superheavy,
            n_electrons,
            occupation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_and_methyl() -> (Array2<u8>, Array3<f64>) {
        let species: Array2<u8> = array![[8, 1, 1, 0], [6, 1, 1, 1]];
        let coordinates: Array3<f64> = Array3::zeros([2, 4, 3]);
        (species, coordinates)
    }

    #[test]
    fn closed_shell_counts() {
        let (species, coordinates) = water_and_methyl();
        let species = species.slice(s![0..1, ..]).to_owned();
        let coordinates = coordinates.slice(s![0..1, .., ..]).to_owned();
        let parsed = MoleculeParser::new(Method::AM1)
            .parse(&Constants::new(), species.view(), coordinates.view())
            .unwrap();
        assert_eq!(parsed.n_atoms, array![3]);
        assert_eq!(parsed.n_heavy, array![1]);
        assert_eq!(parsed.n_hydro, array![2]);
        assert_eq!(parsed.n_electrons, array![8]);
        assert_eq!(parsed.occupation, Occupation::Restricted(array![4]));
        assert_eq!(parsed.n_orbitals(), array![6]);
    }

    #[test]
    fn open_shell_counts() {
        let (species, coordinates) = water_and_methyl();
        let parsed = MoleculeParser::new(Method::AM1)
            .with_multiplicities(array![1, 2])
            .parse(&Constants::new(), species.view(), coordinates.view())
            .unwrap();
        let nocc = parsed.occupation.as_unrestricted().unwrap();
        assert_eq!(nocc, &array![[4, 4], [4, 3]]);
        assert_eq!(parsed.occupation.flatten(), vec![4, 4, 4, 3]);
        assert_eq!(parsed.occupation.alpha(), array![4, 4]);
    }

    #[test]
    fn odd_electrons_need_multiplicity() {
        let (species, coordinates) = water_and_methyl();
        let result = MoleculeParser::new(Method::AM1).parse(
            &Constants::new(),
            species.view(),
            coordinates.view(),
        );
        assert!(matches!(
            result,
            Err(ParseError::ElectronCount { molecule: 1, .. })
        ));
    }

    #[test]
    fn d_shell_only_for_pm6() {
        let species: Array2<u8> = array![[16, 1, 1]];
        let coordinates: Array3<f64> = Array3::zeros([1, 3, 3]);
        let constants = Constants::new();
        let pm6 = MoleculeParser::new(Method::PM6)
            .parse(&constants, species.view(), coordinates.view())
            .unwrap();
        assert_eq!(pm6.n_superheavy, array![1]);
        assert_eq!(pm6.n_orbitals(), array![11]);
        let am1 = MoleculeParser::new(Method::AM1)
            .parse(&constants, species.view(), coordinates.view())
            .unwrap();
        assert_eq!(am1.n_superheavy, array![0]);
        assert_eq!(am1.n_heavy, array![1]);
        assert_eq!(am1.n_orbitals(), array![6]);
    }
}
