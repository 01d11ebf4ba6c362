pub(crate) mod settings;

pub use settings::{CalculatorSettings, Method, SeqmSettings};
