//! Failures surfaced by fallible list operations.

use crate::alloc::AllocError;
use std::convert::Infallible;
use std::fmt;

/// The failure of an operation that allocates a node and then constructs
/// its element.
///
/// `E` is the error type of the element constructor. Operations whose
/// elements cannot fail to construct use the default `Infallible`, see
/// [`Error::into_alloc_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E = Infallible> {
    /// Storage for a node could not be reserved.
    Alloc(AllocError),
    /// The element constructor failed after its node was allocated.
    Construct(E),
}

impl<E> Error<E> {
    /// Returns `true` if the failure happened while reserving storage.
    pub fn is_alloc(&self) -> bool {
        matches!(self, Error::Alloc(_))
    }

    /// Returns the construction error, if any.
    pub fn into_construct(self) -> Option<E> {
        match self {
            Error::Alloc(_) => None,
            Error::Construct(err) => Some(err),
        }
    }
}

impl Error<Infallible> {
    /// Narrow an error whose construction step cannot fail.
    pub fn into_alloc_error(self) -> AllocError {
        match self {
            Error::Alloc(err) => err,
            Error::Construct(never) => match never {},
        }
    }
}

impl<E> From<AllocError> for Error<E> {
    fn from(err: AllocError) -> Self {
        Error::Alloc(err)
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alloc(_) => f.write_str("memory allocation for a list node failed"),
            Error::Construct(err) => write!(f, "list element construction failed: {}", err),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Error<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Alloc(_) => None,
            Error::Construct(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::alloc::AllocError;
    use std::error::Error as _;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    #[test]
    fn error_display_and_source() {
        let err: Error<Refused> = Error::Construct(Refused);
        assert_eq!(err.to_string(), "list element construction failed: refused");
        assert!(err.source().is_some());
        assert!(!err.is_alloc());

        let err: Error<Refused> = AllocError.into();
        assert_eq!(err.to_string(), "memory allocation for a list node failed");
        assert!(err.source().is_none());
        assert!(err.is_alloc());
        assert_eq!(err.into_construct(), None);
    }

    #[test]
    fn error_narrowing() {
        let err: Error = Error::Alloc(AllocError);
        assert_eq!(err.into_alloc_error(), AllocError);
    }
}
