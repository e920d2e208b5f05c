//! Handle-to-entity map.
//!
//! Backend reports name actors by [`ActorKey`]; everything the application
//! sees is keyed by [`BodyHandle`]. [`BodyRegistry`] holds both directions
//! plus per-body bookkeeping. An entry exists exactly while its backend
//! actor is alive: it is inserted after the actor is created and removed
//! before the actor is destroyed.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use torque_core::{ActorKey, AggregateId, BodyHandle, BodyKind};

use crate::error::BodyError;
use crate::hooks::BodyListener;

/// Bookkeeping for one live body.
#[derive(Clone)]
pub struct BodyRecord {
    /// Backend reference.
    pub actor: ActorKey,
    /// Simulation behaviour.
    pub kind: BodyKind,
    /// Mass in kilograms, as last set.
    pub mass: f32,
    /// Whether the shape is a trigger volume.
    pub is_trigger: bool,
    /// Contact callbacks, if any.
    pub listener: Option<Arc<dyn BodyListener>>,
    /// Aggregate membership.
    pub aggregate: Option<AggregateId>,
}

impl fmt::Debug for BodyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyRecord")
            .field("actor", &self.actor)
            .field("kind", &self.kind)
            .field("mass", &self.mass)
            .field("is_trigger", &self.is_trigger)
            .field("listener", &self.listener.is_some())
            .field("aggregate", &self.aggregate)
            .finish()
    }
}

/// Members of one aggregate, in insertion order.
pub type AggregateMembers = SmallVec<[BodyHandle; 8]>;

/// Bidirectional actor/handle map.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    by_actor: IndexMap<ActorKey, BodyHandle>,
    bodies: IndexMap<BodyHandle, BodyRecord>,
    aggregates: IndexMap<AggregateId, AggregateMembers>,
}

impl BodyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// `true` when no bodies are registered.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// `true` if `handle` names a live body.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    /// Map a backend actor back to its application handle.
    pub fn resolve(&self, actor: ActorKey) -> Option<BodyHandle> {
        self.by_actor.get(&actor).copied()
    }

    /// The record for `handle`.
    pub fn get(&self, handle: BodyHandle) -> Result<&BodyRecord, BodyError> {
        self.bodies
            .get(&handle)
            .ok_or(BodyError::UnknownBody { handle })
    }

    /// Mutable record for `handle`.
    pub fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut BodyRecord, BodyError> {
        self.bodies
            .get_mut(&handle)
            .ok_or(BodyError::UnknownBody { handle })
    }

    /// Backend actor of `handle`.
    pub fn actor(&self, handle: BodyHandle) -> Result<ActorKey, BodyError> {
        self.get(handle).map(|r| r.actor)
    }

    /// Listener of `handle`, if it is live and has one.
    pub fn listener(&self, handle: BodyHandle) -> Option<Arc<dyn BodyListener>> {
        self.bodies.get(&handle).and_then(|r| r.listener.clone())
    }

    /// Check that `handle` is free to use.
    pub fn check_vacant(&self, handle: BodyHandle) -> Result<(), BodyError> {
        if self.contains(handle) {
            Err(BodyError::DuplicateHandle { handle })
        } else {
            Ok(())
        }
    }

    /// Register a freshly created actor.
    pub fn insert(&mut self, handle: BodyHandle, record: BodyRecord) -> Result<(), BodyError> {
        self.check_vacant(handle)?;
        self.by_actor.insert(record.actor, handle);
        self.bodies.insert(handle, record);
        Ok(())
    }

    /// Unregister a body, dropping it from its aggregate's member list.
    pub fn remove(&mut self, handle: BodyHandle) -> Result<BodyRecord, BodyError> {
        let record = self
            .bodies
            .shift_remove(&handle)
            .ok_or(BodyError::UnknownBody { handle })?;
        self.by_actor.shift_remove(&record.actor);
        if let Some(members) = record
            .aggregate
            .and_then(|id| self.aggregates.get_mut(&id))
        {
            members.retain(|m| *m != handle);
        }
        Ok(record)
    }

    /// Live handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.keys().copied()
    }

    // ── Aggregates ────────────────────────────────────────────────

    /// Track a newly created aggregate.
    pub fn insert_aggregate(&mut self, aggregate: AggregateId) {
        self.aggregates.insert(aggregate, AggregateMembers::new());
    }

    /// Members of `aggregate`.
    pub fn aggregate_members(&self, aggregate: AggregateId) -> Result<&[BodyHandle], BodyError> {
        self.aggregates
            .get(&aggregate)
            .map(|m| m.as_slice())
            .ok_or(BodyError::UnknownAggregate { aggregate })
    }

    /// Record `handle` as a member of `aggregate`.
    pub fn join_aggregate(
        &mut self,
        aggregate: AggregateId,
        handle: BodyHandle,
    ) -> Result<(), BodyError> {
        let record = self
            .bodies
            .get_mut(&handle)
            .ok_or(BodyError::UnknownBody { handle })?;
        let members = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or(BodyError::UnknownAggregate { aggregate })?;
        record.aggregate = Some(aggregate);
        members.push(handle);
        Ok(())
    }

    /// Drop `handle` from `aggregate`'s member list.
    pub fn leave_aggregate(
        &mut self,
        aggregate: AggregateId,
        handle: BodyHandle,
    ) -> Result<(), BodyError> {
        let members = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or(BodyError::UnknownAggregate { aggregate })?;
        members.retain(|m| *m != handle);
        if let Some(record) = self.bodies.get_mut(&handle) {
            if record.aggregate == Some(aggregate) {
                record.aggregate = None;
            }
        }
        Ok(())
    }

    /// Forget an aggregate. Its members stay registered.
    pub fn remove_aggregate(&mut self, aggregate: AggregateId) -> Result<AggregateMembers, BodyError> {
        let members = self
            .aggregates
            .shift_remove(&aggregate)
            .ok_or(BodyError::UnknownAggregate { aggregate })?;
        for handle in &members {
            if let Some(record) = self.bodies.get_mut(handle) {
                record.aggregate = None;
            }
        }
        Ok(members)
    }

    /// Number of live aggregates.
    pub fn aggregate_count(&self) -> usize {
        self.aggregates.len()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.by_actor.clear();
        self.bodies.clear();
        self.aggregates.clear();
    }
}
