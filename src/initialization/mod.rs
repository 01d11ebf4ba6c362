pub mod input_check;
pub mod molecule;
pub mod parser;

pub use input_check::{check_molecule_lists, InputError};
pub use molecule::{DensityMatrix, MoleculeBatch};
pub use parser::{orbitals_per_atom, MoleculeParser, Occupation, ParseError, ParsedBatch};
