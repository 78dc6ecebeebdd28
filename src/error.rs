use core::fmt;

/// Configuration errors reported when building or reconfiguring a [`crate::Virtualizer`].
///
/// Everything on the scroll path is total (inputs are clamped); only values that would make the
/// offset math meaningless are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The estimated item size was zero.
    InvalidEstimatedSize,
    /// The pool capacity was zero.
    InvalidPoolCapacity,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEstimatedSize => f.write_str("estimated item size must be greater than 0"),
            Self::InvalidPoolCapacity => f.write_str("pool capacity must be greater than 0"),
        }
    }
}

impl core::error::Error for Error {}
