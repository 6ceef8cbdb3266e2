use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImagingError>;

/// Category of an [`ImagingError`], for callers that branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InputShape,
    InputDomain,
    DimensionMismatch,
}

/// Input validation failures. Every check runs before numeric work starts,
/// so an error never comes with partial output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImagingError {
    /// Wrong rank, wrong column count or mismatched lengths of paired arrays
    #[error("input shape error: {0}")]
    InputShape(String),

    /// Value outside the accepted domain (frequency, ordering, sign, finiteness)
    #[error("input domain error: {0}")]
    InputDomain(String),

    /// Delay map, phase factor map and baseband channel extents disagree
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl ImagingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImagingError::InputShape(_) => ErrorKind::InputShape,
            ImagingError::InputDomain(_) => ErrorKind::InputDomain,
            ImagingError::DimensionMismatch(_) => ErrorKind::DimensionMismatch,
        }
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        ImagingError::InputShape(msg.into())
    }

    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        ImagingError::InputDomain(msg.into())
    }

    pub(crate) fn mismatch(msg: impl Into<String>) -> Self {
        ImagingError::DimensionMismatch(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ImagingError};

    #[test]
    fn kind_follows_variant() {
        assert_eq!(ImagingError::shape("x").kind(), ErrorKind::InputShape);
        assert_eq!(ImagingError::domain("x").kind(), ErrorKind::InputDomain);
        assert_eq!(
            ImagingError::mismatch("x").kind(),
            ErrorKind::DimensionMismatch
        );
    }

    #[test]
    fn display_carries_category_and_detail() {
        let err = ImagingError::domain("carrier frequency must be positive");
        assert_eq!(
            err.to_string(),
            "input domain error: carrier frequency must be positive"
        );
    }
}
