use ndarray::prelude::*;

/// Highest atomic number with tabulated core charges.
pub const MAX_ATOMIC_NUMBER: u8 = 54;

// number of valence electrons (core charge) of the elements H - Xe, index 0 is the
// padding pseudo-atom
const CORE_CHARGES: [f64; 55] = [
    0.0, // padding
    1.0, 2.0, // H, He
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, // Li - Ne
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, // Na - Ar
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 2.0, // K - Zn
    3.0, 4.0, 5.0, 6.0, 7.0, 8.0, // Ga - Kr
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 2.0, // Rb - Cd
    3.0, 4.0, 5.0, 6.0, 7.0, 8.0, // In - Xe
];

// elements without a d-shell in the spd parameterization beyond Al
const NO_D_SHELL: [u8; 5] = [18, 30, 36, 48, 54];

/// Physical constants shared by the loss and the guess construction.
#[derive(Debug, Clone)]
pub struct Constants {
    /// Core charge of each element, indexed by the atomic number.
    pub tore: Array1<f64>,
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}

impl Constants {
    pub fn new() -> Self {
        Self {
            tore: Array1::from(CORE_CHARGES.to_vec()),
        }
    }

    pub fn tore(&self, atomic_number: u8) -> f64 {
        self.tore[atomic_number as usize]
    }

    pub fn is_known(&self, atomic_number: u8) -> bool {
        atomic_number <= MAX_ATOMIC_NUMBER
    }
}

/// Elements that carry a d-shell (nine orbitals) in methods with d-orbitals.
pub fn has_d_shell(atomic_number: u8) -> bool {
    atomic_number >= 13
        && atomic_number <= MAX_ATOMIC_NUMBER
        && !NO_D_SHELL.contains(&atomic_number)
}
