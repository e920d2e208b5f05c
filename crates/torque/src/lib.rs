//! Torque: a physics façade that owns a backend scene, a per-step scratch
//! arena, and the contact and trigger events each step produces.
//!
//! This is the top-level crate that re-exports the public API from the
//! Torque sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use torque::prelude::*;
//! use torque_test_utils::{test_config, ScriptedBackend};
//!
//! let world = PhysicsWorld::new(test_config(), ScriptedBackend::new()).unwrap();
//!
//! let entered = FnListener::new()
//!     .with_collision_enter(|c| println!("{:?} touched {:?}", c.this_body, c.other_body))
//!     .into_shared();
//! world
//!     .add_body(BodyHandle(1), BodyDesc::dynamic(ColliderShape::sphere(1.0)), Some(entered))
//!     .unwrap();
//! world
//!     .add_body(
//!         BodyHandle(2),
//!         BodyDesc::fixed(ColliderShape::sphere(1.0)).at(Vec3::new(1.5, 0.0, 0.0)),
//!         None,
//!     )
//!     .unwrap();
//!
//! world.update(1.0 / 60.0).unwrap();
//! assert_eq!(
//!     world.collisions_entered(),
//!     vec![HandlePair::new(BodyHandle(1), BodyHandle(2))]
//! );
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `torque-core` | Handles, math, shapes, reports, the backend trait |
//! | [`arena`] | `torque-arena` | Reserved-range scratch allocator |
//! | [`engine`] | `torque-engine` | `PhysicsWorld`, event queues, hooks, scene lock |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary and the backend seam (`torque-core`).
pub use torque_core as types;

/// Scratch memory (`torque-arena`).
///
/// [`arena::ScratchAllocator`] reserves its address range once and
/// commits pages as the bump pointer advances.
pub use torque_arena as arena;

/// The physics world (`torque-engine`).
///
/// With the `rapier` feature, `engine::rapier::RapierBackend` provides
/// a ready-made backend.
pub use torque_engine as engine;

/// Common imports for typical Torque usage.
pub mod prelude {
    // Core types
    pub use torque_core::{
        BodyDesc, BodyHandle, ColliderShape, Collision, EventKind, FilterData, ForceMode,
        HandlePair, PhysicsBackend, Pose, Quat, QueryFilter, Vec3,
    };

    // Errors
    pub use torque_core::{BackendError, InitError};
    pub use torque_engine::{BodyError, StepError};

    // Engine
    pub use torque_engine::{
        BodyListener, FnListener, LogSink, PhysicsWorld, StepMetrics, StepReport, Timestep,
        WorldConfig,
    };
}
