//! Error taxonomy shared by every subsystem of the toolkit

use thiserror::Error;

/// Outcome of the suffix array self-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexCheckError {
    /// An entry of the suffix array falls outside `[0, n)`.
    #[error("suffix array entry out of range: SA[{index}] = {value}, n = {n}")]
    OutOfRange { index: usize, value: i64, n: usize },

    /// First characters of consecutive suffixes are not monotone.
    #[error("suffixes in wrong order at SA[{index}]")]
    WrongOrder { index: usize },

    /// The inverse-permutation consistency walk found a misplaced suffix.
    #[error("suffix in wrong position at SA[{index}]")]
    WrongPosition { index: usize },
}

/// Errors surfaced by the alignment core.
///
/// A failed banded-alignment extension is deliberately not represented
/// here: search fall-off is a normal outcome reported through the
/// `reached` flag of the alignment functions.
#[derive(Debug, Error)]
pub enum Error {
    /// Null-equivalent input, negative length, or an out-of-range index.
    #[error("invalid argument: {0}")]
    BadArgs(String),

    /// Index or matrix storage could not be allocated.
    #[error("allocation failed: {0}")]
    AllocFailed(String),

    /// Parser disagreement on FASTA, seed or delta input.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The suffix array failed its self-check.
    #[error("suffix array check failed: {0}")]
    IndexCheckFailed(#[from] IndexCheckError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn bad_args(msg: impl Into<String>) -> Self {
        Error::BadArgs(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_display() {
        let e = IndexCheckError::OutOfRange { index: 3, value: 99, n: 10 };
        assert_eq!(
            e.to_string(),
            "suffix array entry out of range: SA[3] = 99, n = 10"
        );
        let e: Error = e.into();
        assert!(matches!(e, Error::IndexCheckFailed(_)));
    }

    #[test]
    fn test_io_error_passthrough() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: Error = io.into();
        assert!(e.to_string().contains("gone"));
    }
}
