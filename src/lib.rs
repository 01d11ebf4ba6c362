//! Training loss for semiempirical (SEQM) energies and derived properties with graceful
//! handling of SCF failures, and the initial density matrix guess that seeds the SCF of a
//! batch of molecules.

pub mod constants;
pub mod defaults;
pub mod guess;
pub mod initialization;
pub mod io;
pub mod loss;
pub mod utils;

pub use constants::Constants;
pub use guess::{
    Collaborators, GuessBuilder, GuessError, GuessOptions, GuessOptionsBuilder, GuessResult,
    LearnedParameters,
};
pub use initialization::{DensityMatrix, MoleculeBatch};
pub use io::{CalculatorSettings, Method, SeqmSettings};
pub use loss::{
    CalculatorOutput, EnergyCalculator, EnergyGradient, LossEngine, LossError, ParameterValues,
    ScfOutcome, LOSS_FAIL,
};
