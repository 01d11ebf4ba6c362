use crate::initialization::{InputError, ParseError};
use std::fmt;

#[derive(Debug)]
pub enum LossError {
    /// Malformed species/coordinate lists.
    InputValidation(InputError),
    /// The property name is not one of the implemented loss terms.
    UnsupportedProperty(String),
    /// The reference data do not fit the property or the batch.
    ReferenceMismatch(String),
    /// `forward` was called before any loss term was added.
    NoLossProperty,
    /// A declared trainable parameter has no value.
    MissingParameter(String),
    /// More parameter values than declared parameter names.
    ParameterCount { expected: usize, got: usize },
    /// Occupation numbers could not be derived for the gap term.
    Parser(ParseError),
    /// The HOMO or LUMO index lies outside of the orbital energies of a molecule.
    OrbitalIndex { molecule: usize, n_occ: usize, n_orbitals: usize },
    /// The settings overrides could not be parsed.
    Settings(anyhow::Error),
    /// The energy calculator could not be configured.
    Calculator(anyhow::Error),
}

impl fmt::Display for LossError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            LossError::InputValidation(err) => write!(f, "{}", err),
            LossError::UnsupportedProperty(prop) => write!(
                f,
                "Only 'energy', 'forces', 'gap', 'atomization' implemented for loss. \
                 Check for typos or write a corresponding loss term for '{}'.",
                prop
            ),
            LossError::ReferenceMismatch(msg) => write!(f, "Invalid reference data: {}", msg),
            LossError::NoLossProperty => write!(f, "Need to add a loss property!"),
            LossError::MissingParameter(name) => {
                write!(f, "No value was supplied for the parameter '{}'", name)
            }
            LossError::ParameterCount { expected, got } => write!(
                f,
                "Expected {} parameter values but got {}",
                expected, got
            ),
            LossError::Parser(err) => write!(f, "{}", err),
            LossError::OrbitalIndex {
                molecule,
                n_occ,
                n_orbitals,
            } => write!(
                f,
                "Molecule {} has {} occupied orbitals, the HOMO-LUMO gap is not defined for {} orbital energies",
                molecule, n_occ, n_orbitals
            ),
            LossError::Settings(err) => write!(f, "{:#}", err),
            LossError::Calculator(err) => {
                write!(f, "The energy calculator could not be set up: {:#}", err)
            }
        }
    }
}

impl std::error::Error for LossError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LossError::InputValidation(err) => Some(err),
            LossError::Parser(err) => Some(err),
            LossError::Calculator(err) | LossError::Settings(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<InputError> for LossError {
    fn from(err: InputError) -> Self {
        LossError::InputValidation(err)
    }
}

impl From<ParseError> for LossError {
    fn from(err: ParseError) -> Self {
        LossError::Parser(err)
    }
}
