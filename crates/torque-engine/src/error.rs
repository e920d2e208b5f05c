//! Errors returned by [`PhysicsWorld`](crate::PhysicsWorld) operations.

use std::error::Error;
use std::fmt;

use torque_arena::ScratchError;
use torque_core::{AggregateId, BackendError, BodyHandle};

// ── StepError ─────────────────────────────────────────────────────

/// [`PhysicsWorld::update`](crate::PhysicsWorld::update) failed.
///
/// A failed step dispatches nothing: reports captured before the failure
/// are discarded and the event queues stay empty until the next step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// A variable timestep was zero, negative, or not finite.
    InvalidTimestep {
        /// The rejected delta.
        dt: f32,
    },
    /// The backend failed to simulate.
    Backend(BackendError),
    /// The per-step scratch block could not be allocated.
    Scratch(ScratchError),
    /// The world has been released.
    Released,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimestep { dt } => {
                write!(f, "timestep must be finite and positive, got {dt}")
            }
            Self::Backend(e) => write!(f, "simulate: {e}"),
            Self::Scratch(e) => write!(f, "scratch: {e}"),
            Self::Released => write!(f, "world has been released"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            Self::Scratch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for StepError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

impl From<ScratchError> for StepError {
    fn from(e: ScratchError) -> Self {
        Self::Scratch(e)
    }
}

// ── BodyError ─────────────────────────────────────────────────────

/// A body, aggregate, or query operation failed.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyError {
    /// The handle is already attached to a live body.
    DuplicateHandle {
        /// The handle in use.
        handle: BodyHandle,
    },
    /// No live body carries this handle.
    UnknownBody {
        /// The unrecognised handle.
        handle: BodyHandle,
    },
    /// No live aggregate carries this id.
    UnknownAggregate {
        /// The unrecognised aggregate.
        aggregate: AggregateId,
    },
    /// The body already belongs to an aggregate.
    AlreadyAggregated {
        /// The body.
        handle: BodyHandle,
        /// Its current aggregate.
        aggregate: AggregateId,
    },
    /// The backend rejected the operation.
    Backend(BackendError),
    /// The world has been released.
    Released,
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateHandle { handle } => write!(f, "body {handle} already exists"),
            Self::UnknownBody { handle } => write!(f, "unknown body {handle}"),
            Self::UnknownAggregate { aggregate } => write!(f, "unknown aggregate {aggregate}"),
            Self::AlreadyAggregated { handle, aggregate } => {
                write!(f, "body {handle} already belongs to aggregate {aggregate}")
            }
            Self::Backend(e) => write!(f, "backend: {e}"),
            Self::Released => write!(f, "world has been released"),
        }
    }
}

impl Error for BodyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for BodyError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}
