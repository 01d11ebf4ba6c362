use std::fmt;

#[derive(Debug)]
pub enum GuessError {
    /// An option of the guess builder is out of range.
    InvalidOption(String),
    /// The parameter packer did not provide a table the method needs.
    MissingParameter(String),
    /// One of the external routines (packer, Hcore, Fock, integrals) failed.
    Collaborator(anyhow::Error),
    /// The eigendecomposition of the packed pseudo-Fock matrices failed twice.
    Eigensolver(anyhow::Error),
    /// Arrays of the batch or of a collaborator do not have the expected shape.
    Shape(String),
}

impl fmt::Display for GuessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            GuessError::InvalidOption(msg) => write!(f, "Invalid guess option: {}", msg),
            GuessError::MissingParameter(name) => write!(
                f,
                "The parameter table '{}' is required for the initial guess but was not packed",
                name
            ),
            GuessError::Collaborator(err) => write!(f, "{:#}", err),
            GuessError::Eigensolver(err) => write!(
                f,
                "Diagonalization of the packed matrices failed after a retry: {:#}",
                err
            ),
            GuessError::Shape(msg) => write!(f, "Shape mismatch in the initial guess: {}", msg),
        }
    }
}

impl std::error::Error for GuessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuessError::Collaborator(err) | GuessError::Eigensolver(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for GuessError {
    fn from(err: anyhow::Error) -> Self {
        GuessError::Collaborator(err)
    }
}
