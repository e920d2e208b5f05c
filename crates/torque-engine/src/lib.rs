//! Physics world orchestrating scratch memory, scene locking and contact
//! dispatch on top of a [`PhysicsBackend`](torque_core::PhysicsBackend).
//!
//! # Architecture
//!
//! ```text
//! PhysicsWorld<B>
//! ├── step gate (Mutex)          serialises update()
//! ├── SceneLock<Scene<B>>        read: poses, queries, polling
//! │   ├── B: PhysicsBackend      write: step, bodies, teleports
//! │   ├── BodyRegistry           ActorKey <-> BodyHandle
//! │   ├── EventCollector         per-step accumulators, active triggers
//! │   ├── EventQueues            four handle-pair queues
//! │   └── ScratchAllocator       per-step transient memory
//! └── LogSink                    messages and backend errors
//! ```
//!
//! With the `rapier` feature, `rapier::RapierBackend` drives a real
//! `rapier3d` scene.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collector;
pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod lock;
pub mod metrics;
pub mod query;
#[cfg(feature = "rapier")]
pub mod rapier;
pub mod registry;
pub mod world;

pub use collector::{Delivery, Dispatch, EventCollector, ReportIntake};
pub use config::{ConfigError, Timestep, WorldConfig};
pub use error::{BodyError, StepError};
pub use events::EventQueues;
pub use hooks::{BodyListener, FnListener, LogCrateSink, LogSink};
pub use lock::{SceneLock, SceneReadGuard, SceneWriteGuard};
pub use metrics::{StepMetrics, StepReport};
pub use query::{OverlapInfo, RayHit, RaycastInfo};
pub use registry::{BodyRecord, BodyRegistry};
pub use world::{PhysicsWorld, SceneView};
