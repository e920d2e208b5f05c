//! Strongly-typed identifiers.

use std::fmt;

/// Application-level handle of a rigid body.
///
/// Chosen by the embedding application when the body is added to the
/// world. This is the identity that appears in every hook call and in the
/// handle-pair queues; backend references never leak past the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BodyHandle {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Backend-native reference to a live actor.
///
/// Assigned by the [`PhysicsBackend`](crate::PhysicsBackend) when an actor
/// is created. Opaque to the engine apart from equality and hashing; a key
/// is only meaningful while its actor is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorKey(pub u64);

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

impl From<u64> for ActorKey {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies an aggregate (a backend-side group of actors that shares a
/// single broad-phase entry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateId(pub u32);

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AggregateId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing simulation step counter.
///
/// Incremented once per successful `update`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl StepId {
    /// The step that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_display_their_raw_value() {
        assert_eq!(BodyHandle(7).to_string(), "7");
        assert_eq!(ActorKey(3).to_string(), "actor#3");
        assert_eq!(AggregateId::from(2).to_string(), "2");
    }

    #[test]
    fn step_id_advances_by_one() {
        assert_eq!(StepId::default().next(), StepId(1));
        assert_eq!(StepId(41).next(), StepId(42));
    }
}
