use log::debug;
use ndarray::prelude::*;
use std::fmt;

pub const LIST_OF_ARRAYS_MSG: &str =
    "Input has to be provided as one array per molecule (species: [n_atoms], coordinates: [n_atoms, 3])!";

#[derive(Debug, Clone, PartialEq)]
pub struct InputError {
    pub message: String,
}

impl InputError {
    fn new(detail: String) -> Self {
        Self {
            message: format!("{} {}", LIST_OF_ARRAYS_MSG, detail),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InputError {}

/// Checks the per-molecule species and coordinate lists before they are padded into a batch.
pub fn check_molecule_lists(
    species: &[Array1<u8>],
    coordinates: &[Array2<f64>],
) -> Result<(), InputError> {
    debug!("{:^80}", "");
    debug!("{:-^80}", "");

    if species.is_empty() || coordinates.is_empty() {
        return Err(InputError::new(String::from("The molecule lists are empty.")));
    }
    if species.len() != coordinates.len() {
        return Err(InputError::new(format!(
            "Got {} species arrays but {} coordinate arrays.",
            species.len(),
            coordinates.len()
        )));
    }
    for (idx, (z, xyz)) in species.iter().zip(coordinates.iter()).enumerate() {
        if z.is_empty() {
            return Err(InputError::new(format!("Molecule {} has no atoms.", idx)));
        }
        if z.iter().any(|&number| number == 0) {
            return Err(InputError::new(format!(
                "Molecule {} contains the atomic number 0 which is reserved for padding.",
                idx
            )));
        }
        if xyz.dim() != (z.len(), 3) {
            return Err(InputError::new(format!(
                "Molecule {} has {} atoms but coordinates of shape {:?}.",
                idx,
                z.len(),
                xyz.dim()
            )));
        }
        if xyz.iter().any(|x| !x.is_finite()) {
            return Err(InputError::new(format!(
                "Molecule {} has non-finite coordinates.",
                idx
            )));
        }
    }

    debug!("{: ^80}", "Finished input check. No problems occured!");
    debug!("{:-<80} ", "");
    Ok(())
}
