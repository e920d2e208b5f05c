//! Error types shared across the backend seam.
//!
//! Engine-level errors (`StepError`, `BodyError`, `ConfigError`) live in
//! `torque-engine`; this module holds the ones a backend itself produces.

use std::error::Error;
use std::fmt;

use crate::id::{ActorKey, AggregateId};

// ── InitError ─────────────────────────────────────────────────────

/// Initialisation stage that failed.
///
/// Stages are listed in the order a world brings them up; teardown runs
/// in reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InitStage {
    /// World configuration validation.
    Config,
    /// Scratch arena reservation.
    Scratch,
    /// Backend foundation / allocator hookup.
    Foundation,
    /// Physics context creation.
    Physics,
    /// Worker-thread dispatcher creation.
    Dispatcher,
    /// Scene creation.
    Scene,
    /// Default material creation.
    Material,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Scratch => "scratch",
            Self::Foundation => "foundation",
            Self::Physics => "physics",
            Self::Dispatcher => "dispatcher",
            Self::Scene => "scene",
            Self::Material => "material",
        };
        f.write_str(name)
    }
}

/// World initialisation failed.
///
/// Returned from world construction so callers can branch on the stage
/// instead of inspecting log output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitError {
    /// The stage that failed.
    pub stage: InitStage,
    /// Human-readable cause.
    pub reason: String,
}

impl InitError {
    /// Build an error for `stage`.
    pub fn new(stage: InitStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} creation failed: {}", self.stage, self.reason)
    }
}

impl Error for InitError {}

// ── BackendError ──────────────────────────────────────────────────

/// Errors returned by [`PhysicsBackend`](crate::PhysicsBackend) operations.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendError {
    /// The actor key does not name a live actor.
    UnknownActor {
        /// The unrecognised key.
        actor: ActorKey,
    },
    /// The aggregate id does not name a live aggregate.
    UnknownAggregate {
        /// The unrecognised aggregate.
        aggregate: AggregateId,
    },
    /// The aggregate already holds its configured maximum number of actors.
    AggregateFull {
        /// The full aggregate.
        aggregate: AggregateId,
        /// Its configured capacity.
        capacity: u32,
    },
    /// Geometry the backend cannot build.
    InvalidShape {
        /// Why the shape was rejected.
        reason: String,
    },
    /// Mass must be finite and positive.
    InvalidMass {
        /// The rejected mass.
        mass: f32,
    },
    /// The operation only applies to dynamic actors.
    NotDynamic {
        /// The static or kinematic actor.
        actor: ActorKey,
    },
    /// The backend has not been initialised, or has been released.
    NotInitialized,
    /// Any other backend-side failure.
    Failed {
        /// Backend-supplied description.
        reason: String,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownActor { actor } => write!(f, "unknown actor {actor}"),
            Self::UnknownAggregate { aggregate } => write!(f, "unknown aggregate {aggregate}"),
            Self::AggregateFull {
                aggregate,
                capacity,
            } => write!(f, "aggregate {aggregate} is full ({capacity} actors)"),
            Self::InvalidShape { reason } => write!(f, "invalid shape: {reason}"),
            Self::InvalidMass { mass } => write!(f, "invalid mass {mass}"),
            Self::NotDynamic { actor } => write!(f, "{actor} is not dynamic"),
            Self::NotInitialized => write!(f, "backend not initialised"),
            Self::Failed { reason } => write!(f, "backend failure: {reason}"),
        }
    }
}

impl Error for BackendError {}
