use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Precondition violations. These signal a programming error on the caller's side and are
/// never used to report numerical outcomes such as a bracket that could not be found.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("[{operation}] dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("[{operation}] the function is not one-dimensional (ndim = {ndim})")]
    NotOneDimensional { operation: &'static str, ndim: usize },

    #[error("[{operation}] invalid bracket: {reason}")]
    InvalidBracket {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("[{operation}] invalid argument: {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("[{operation}] no initial position has been set")]
    MissingPosition { operation: &'static str },
}

impl Error {
    pub(crate) fn check_dim(operation: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                operation,
                expected,
                found,
            })
        }
    }
}
