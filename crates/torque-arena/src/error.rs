//! Scratch arena error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during scratch arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScratchError {
    /// The OS refused to reserve the requested address range.
    ReservationFailed {
        /// Bytes requested.
        requested: usize,
        /// OS error text.
        reason: String,
    },
    /// A reserve size of zero was requested.
    InvalidReserveSize,
    /// Alignment is zero, not a power of two, or larger than a page.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
    /// The allocation does not fit in the reserved range.
    CapacityExceeded {
        /// Bytes requested.
        requested: usize,
        /// Bytes left between the aligned offset and the end of the reserve.
        available: usize,
    },
    /// The OS refused to back reserved pages with memory.
    CommitFailed {
        /// Committed size that was being reached.
        target: usize,
        /// OS error text.
        reason: String,
    },
    /// The arena has not been initialised, or its memory has been freed.
    NotInitialized,
    /// A marker points past the current offset.
    InvalidMarker {
        /// Offset stored in the marker.
        marker: usize,
        /// Current arena offset.
        current: usize,
    },
}

impl fmt::Display for ScratchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservationFailed { requested, reason } => {
                write!(f, "failed to reserve {requested} bytes: {reason}")
            }
            Self::InvalidReserveSize => write!(f, "reserve size must be non-zero"),
            Self::InvalidAlignment { alignment } => {
                write!(f, "alignment {alignment} must be a power of two no larger than a page")
            }
            Self::CapacityExceeded {
                requested,
                available,
            } => {
                write!(
                    f,
                    "scratch capacity exceeded: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::CommitFailed { target, reason } => {
                write!(f, "failed to commit up to {target} bytes: {reason}")
            }
            Self::NotInitialized => write!(f, "scratch arena not initialised"),
            Self::InvalidMarker { marker, current } => {
                write!(f, "marker {marker} is past the current offset {current}")
            }
        }
    }
}

impl Error for ScratchError {}
