//! Core types and traits for the Torque physics facade.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: handle types,
//! math primitives, collider shapes, contact records, error types, and
//! the [`PhysicsBackend`] seam that a concrete physics SDK plugs into.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod event;
pub mod geometry;
pub mod id;
pub mod math;
pub mod shape;

pub use backend::{ForceMode, PhysicsBackend, QueryFilter, RaycastHit, SceneDesc, SimulationEvents};
pub use error::{BackendError, InitError, InitStage};
pub use event::{
    BackendDiagnostic, Collision, ContactPoint, ContactPoints, ContactReport, DiagnosticLevel,
    EventKind, HandlePair, TouchTransition, TriggerReport, TriggerTransition,
};
pub use id::{ActorKey, AggregateId, BodyHandle, StepId};
pub use math::{Aabb, Pose, Quat, Vec3};
pub use shape::{BodyDesc, BodyKind, ColliderShape, FilterData, MaterialDesc};
