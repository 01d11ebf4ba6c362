use crate::io::Method;

// SEMIEMPIRICAL MODEL
// semiempirical Hamiltonian that is used by the energy calculator
pub const METHOD: Method = Method::AM1;
// convergence threshold of the SCF energy
pub const SCF_EPS: f64 = 1.0e-6;
// SCF convergence acceleration: [mode, linear mixing coefficient]
pub const SCF_CONVERGER: [f64; 2] = [0.0, 0.15];
// SP2 purification is only used on accelerators, the CPU path diagonalizes
pub const SP2: bool = false;
// pairs of atoms beyond this distance (Angstrom) are not included
pub const PAIR_OUTER_CUTOFF: f64 = 1.0e10;
// report heat of formation instead of the total energy
pub const HF_FLAG: bool = false;
// the energy calculator returns orbital energies and coefficients
pub const EIG: bool = true;

// LOSS FUNCTION
// weight of a loss term if none is given
pub const LOSS_WEIGHT: f64 = 1.0;
// step size of the central finite differences w.r.t. the trainable parameters
pub const PARAMETER_STEP: f64 = 1.0e-5;
// step size of the central finite differences w.r.t. the nuclear coordinates
pub const COORDINATE_STEP: f64 = 1.0e-4;

// INITIAL GUESS
// fraction of the LUMO that is mixed into the HOMO of the alpha channel
pub const MIX_COEFF: f64 = 0.4;
pub const MIX_HOMO_LUMO: bool = false;
pub const OVERWRITE_EXISTING_DM: bool = false;
// the degeneracy aware construction of the density matrix is off by default
pub const CHECK_DEGENERACY: bool = false;
pub const DEGENERACY_TOLERANCE: f64 = 1.0e-6;
// increment of the synthetic spectrum that is placed on the padding diagonal
pub const PADDING_STEP: f64 = 0.005;
// convergence threshold and maximal number of QR sweeps of the symmetric eigensolver
pub const EIGENSOLVER_EPS: f64 = 1.0e-14;
pub const EIGENSOLVER_MAX_ITER: usize = 10000;

// ORBITAL BASIS
// orbitals per atom block for sp and spd methods
pub const SP_BLOCK: usize = 4;
pub const SPD_BLOCK: usize = 9;

// LOGGING
pub const VERBOSE: i8 = 0;
