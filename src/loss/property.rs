use crate::loss::LossError;
use crate::utils::pad_vectors;
use ndarray::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Number of implemented loss terms.
pub const N_IMPLEMENTED: usize = 4;

/// Properties that can enter the loss. The discriminant is the position of the term in the
/// weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossProperty {
    Atomization = 0,
    Energy = 1,
    Forces = 2,
    Gap = 3,
}

impl LossProperty {
    pub const ALL: [LossProperty; N_IMPLEMENTED] = [
        LossProperty::Atomization,
        LossProperty::Energy,
        LossProperty::Forces,
        LossProperty::Gap,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            LossProperty::Atomization => "atomization",
            LossProperty::Energy => "energy",
            LossProperty::Forces => "forces",
            LossProperty::Gap => "gap",
        }
    }
}

impl FromStr for LossProperty {
    type Err = LossError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomization" => Ok(LossProperty::Atomization),
            "energy" => Ok(LossProperty::Energy),
            "forces" => Ok(LossProperty::Forces),
            "gap" => Ok(LossProperty::Gap),
            _ => Err(LossError::UnsupportedProperty(String::from(s))),
        }
    }
}

impl fmt::Display for LossProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Reference values as handed over by the caller: one scalar per molecule, or one
/// (n_atoms, 3) array per molecule for the forces.
#[derive(Debug, Clone)]
pub enum ReferenceData {
    PerMolecule(Vec<f64>),
    PerAtom(Vec<Array2<f64>>),
}

impl From<Vec<f64>> for ReferenceData {
    fn from(values: Vec<f64>) -> Self {
        ReferenceData::PerMolecule(values)
    }
}

impl From<&[f64]> for ReferenceData {
    fn from(values: &[f64]) -> Self {
        ReferenceData::PerMolecule(values.to_vec())
    }
}

impl From<Vec<Array2<f64>>> for ReferenceData {
    fn from(values: Vec<Array2<f64>>) -> Self {
        ReferenceData::PerAtom(values)
    }
}

/// Reference values in batch layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// (n_mol)
    Scalar(Array1<f64>),
    /// (n_mol, molsize, 3)
    Vector(Array3<f64>),
}

impl Reference {
    /// Converts the caller's reference into batch layout and checks it against the batch
    /// dimensions. Forces are padded to `molsize` atoms.
    pub fn from_data(
        property: LossProperty,
        data: ReferenceData,
        n_atoms: ArrayView1<usize>,
        molsize: usize,
    ) -> Result<Self, LossError> {
        let n_mol: usize = n_atoms.len();
        match (property, data) {
            (LossProperty::Forces, ReferenceData::PerAtom(forces)) => {
                if forces.len() != n_mol {
                    return Err(LossError::ReferenceMismatch(format!(
                        "{} force arrays for {} molecules",
                        forces.len(),
                        n_mol
                    )));
                }
                for (idx, (f, n)) in forces.iter().zip(n_atoms.iter()).enumerate() {
                    if f.dim() != (*n, 3) {
                        return Err(LossError::ReferenceMismatch(format!(
                            "forces of molecule {} have shape {:?}, expected ({}, 3)",
                            idx,
                            f.dim(),
                            n
                        )));
                    }
                }
                Ok(Reference::Vector(pad_vectors(&forces, molsize)))
            }
            (LossProperty::Forces, ReferenceData::PerMolecule(_)) => {
                Err(LossError::ReferenceMismatch(String::from(
                    "forces need one (n_atoms, 3) array per molecule",
                )))
            }
            (_, ReferenceData::PerMolecule(values)) => {
                if values.len() != n_mol {
                    return Err(LossError::ReferenceMismatch(format!(
                        "{} reference values of '{}' for {} molecules",
                        values.len(),
                        property,
                        n_mol
                    )));
                }
                Ok(Reference::Scalar(Array1::from(values)))
            }
            (_, ReferenceData::PerAtom(_)) => Err(LossError::ReferenceMismatch(format!(
                "'{}' needs one value per molecule",
                property
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names() {
        for prop in LossProperty::ALL.iter() {
            assert_eq!(prop.name().parse::<LossProperty>().unwrap(), *prop);
        }
        assert_eq!(LossProperty::Gap.index(), 3);
        assert_eq!(LossProperty::Atomization.index(), 0);
        assert!(matches!(
            "force".parse::<LossProperty>(),
            Err(LossError::UnsupportedProperty(_))
        ));
    }

    #[test]
    fn forces_are_padded() {
        let n_atoms: Array1<usize> = array![2, 1];
        let forces = vec![Array2::ones([2, 3]), Array2::ones([1, 3])];
        let reference = Reference::from_data(
            LossProperty::Forces,
            ReferenceData::from(forces),
            n_atoms.view(),
            2,
        )
        .unwrap();
        let padded = match reference {
            Reference::Vector(f) => f,
            _ => panic!("forces must be stored per atom"),
        };
        assert_eq!(padded.dim(), (2, 2, 3));
        assert_eq!(padded.sum(), 9.0);
    }

    #[test]
    fn scalar_reference_length_is_checked() {
        let n_atoms: Array1<usize> = array![2, 1];
        let result = Reference::from_data(
            LossProperty::Energy,
            ReferenceData::from(vec![-1.0]),
            n_atoms.view(),
            2,
        );
        assert!(matches!(result, Err(LossError::ReferenceMismatch(_))));
    }
}
