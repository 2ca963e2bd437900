//! Error taxonomy for the command surface.
//!
//! The audio path has no error path: [`DiffuseEngine::process`](crate::DiffuseEngine::process)
//! never fails. Everything here is reported synchronously by control-path
//! operations, and a failed operation leaves the engine untouched.

use alloc::string::String;
use alloc::vec::Vec;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Input channel index.
    Channel(usize),
    /// Snapshot slot index.
    Slot(usize),
    /// Output channel index.
    Output(usize),
    /// Named entry in a persistence store.
    State(String),
    /// The slot array itself (freed).
    Slots,
}

/// Errors returned by engine construction and command-surface operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffuseError {
    /// Wrong arity, type, or range. Carries a short description.
    InvalidArgument(&'static str),
    /// Channel, snapshot, output or name is out of range or absent.
    NotFound(Lookup),
    /// A persistence write was blocked by the protection flag.
    WriteProtected(String),
    /// A fixed-size array could not be allocated.
    AllocationFailure,
    /// A gain vector length did not match the output count.
    CountMismatch {
        /// Number of outputs the engine was built with.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
    /// The persistence backend failed (I/O, parse, ...).
    Storage(String),
}

impl core::fmt::Display for Lookup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Channel(i) => write!(f, "channel {i}"),
            Self::Slot(i) => write!(f, "state {i}"),
            Self::Output(i) => write!(f, "output {i}"),
            Self::State(name) => write!(f, "state \"{name}\""),
            Self::Slots => write!(f, "state array"),
        }
    }
}

impl core::fmt::Display for DiffuseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::WriteProtected(name) => write!(f, "state \"{name}\" is write protected"),
            Self::AllocationFailure => write!(f, "allocation failed"),
            Self::CountMismatch { expected, found } => {
                write!(f, "expected {expected} gain values, found {found}")
            }
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DiffuseError {}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, DiffuseError>;

/// Allocates a vector of `len` copies of `value` without aborting on OOM.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| DiffuseError::AllocationFailure)?;
    v.resize(len, value);
    Ok(v)
}

/// Allocates an empty vector able to hold `capacity` items without growing.
pub(crate) fn try_with_capacity<T>(capacity: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| DiffuseError::AllocationFailure)?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_messages() {
        assert_eq!(
            DiffuseError::NotFound(Lookup::Channel(3)).to_string(),
            "channel 3 not found"
        );
        assert_eq!(
            DiffuseError::CountMismatch {
                expected: 8,
                found: 2
            }
            .to_string(),
            "expected 8 gain values, found 2"
        );
        assert_eq!(
            DiffuseError::WriteProtected("front".into()).to_string(),
            "state \"front\" is write protected"
        );
    }

    #[test]
    fn try_filled_allocates_exactly() {
        let v = try_filled(5, 0.25_f64).unwrap();
        assert_eq!(v.len(), 5);
        assert!(v.iter().all(|&x| x == 0.25));

        let q: Vec<u8> = try_with_capacity(7).unwrap();
        assert!(q.is_empty());
        assert!(q.capacity() >= 7);
    }

    #[test]
    fn absurd_allocation_reports_failure() {
        let err = try_with_capacity::<f64>(usize::MAX).unwrap_err();
        assert_eq!(err, DiffuseError::AllocationFailure);
    }
}
