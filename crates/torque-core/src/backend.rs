//! The seam between the facade and a concrete physics SDK.
//!
//! A [`PhysicsBackend`] owns the native scene and everything in it. The
//! engine drives it under its own scene lock, so implementations need no
//! internal locking for scene access; they only have to be movable and
//! shareable across threads.

use crate::error::{BackendError, InitError};
use crate::event::{BackendDiagnostic, ContactReport, TriggerReport};
use crate::id::{ActorKey, AggregateId};
use crate::math::{Pose, Vec3};
use crate::shape::{BodyDesc, ColliderShape};

// ── Scene description ─────────────────────────────────────────────

/// Scene-wide parameters handed to [`PhysicsBackend::initialize`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDesc {
    /// Gravity acceleration. Default: `(0, -9.81, 0)`.
    pub gravity: Vec3,
    /// Size of the backend's CPU worker pool. Default: 4.
    pub worker_threads: usize,
    /// Enable continuous collision detection for dynamic bodies.
    pub enable_ccd: bool,
    /// Typical object length, used by the backend to scale tolerances.
    pub tolerance_length: f32,
    /// Typical object speed, used by the backend to scale tolerances.
    pub tolerance_speed: f32,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            worker_threads: 4,
            enable_ccd: true,
            tolerance_length: 1.0,
            tolerance_speed: 9.81,
        }
    }
}

// ── Queries ───────────────────────────────────────────────────────

/// Which shapes a raycast or overlap query may report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryFilter {
    /// Report trigger shapes as well as solid ones.
    pub hit_triggers: bool,
    /// Only report shapes whose filter group intersects this mask.
    pub layer_mask: u32,
}

impl QueryFilter {
    /// Everything, triggers included.
    pub const ALL: QueryFilter = QueryFilter {
        hit_triggers: true,
        layer_mask: u32::MAX,
    };

    /// Solid shapes in any layer.
    pub const SOLID: QueryFilter = QueryFilter {
        hit_triggers: false,
        layer_mask: u32::MAX,
    };

    /// `true` if a shape with these properties passes the filter.
    pub fn accepts(&self, is_trigger: bool, group: u32) -> bool {
        (self.hit_triggers || !is_trigger) && (group & self.layer_mask) != 0
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::SOLID
    }
}

/// One ray hit, in backend terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// The actor hit.
    pub actor: ActorKey,
    /// Distance along the ray.
    pub distance: f32,
    /// World-space hit point.
    pub position: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// How [`PhysicsBackend::add_force`] interprets its vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceMode {
    /// Continuous force, integrated over the next step.
    Force,
    /// Instantaneous change in momentum.
    Impulse,
}

// ── Report sink ───────────────────────────────────────────────────

/// Receives the raw per-step report stream while a backend simulates.
///
/// Implemented by the engine's event collector. Calls arrive synchronously
/// from inside [`PhysicsBackend::simulate`], in the order the backend
/// produced them.
pub trait SimulationEvents {
    /// A solid-contact pair changed touch state, or is still touching.
    fn on_contact(&mut self, report: ContactReport);

    /// A shape entered or left a trigger volume.
    fn on_trigger(&mut self, report: TriggerReport);

    /// The backend hit a runtime problem. The step carries on.
    fn on_backend_error(&mut self, diagnostic: BackendDiagnostic);
}

// ── PhysicsBackend ────────────────────────────────────────────────

/// A rigid-body physics SDK behind the facade.
///
/// All methods run with the engine's scene lock held: `&mut self` methods
/// under the write lock, `&self` methods under the read lock.
pub trait PhysicsBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Create the native scene. Called once, before any other method.
    fn initialize(&mut self, desc: &SceneDesc) -> Result<(), InitError>;

    /// Tear down the native scene and everything in it. Idempotent.
    fn release(&mut self);

    /// Create an actor with one attached shape and add it to the scene.
    fn create_actor(&mut self, desc: &BodyDesc) -> Result<ActorKey, BackendError>;

    /// Remove an actor from the scene and destroy it.
    fn destroy_actor(&mut self, actor: ActorKey) -> Result<(), BackendError>;

    /// Create an empty aggregate holding at most `max_actors` actors.
    fn create_aggregate(
        &mut self,
        max_actors: u32,
        self_collisions: bool,
    ) -> Result<AggregateId, BackendError>;

    /// Move an actor into an aggregate.
    fn aggregate_add(&mut self, aggregate: AggregateId, actor: ActorKey)
        -> Result<(), BackendError>;

    /// Take an actor out of an aggregate. The actor stays in the scene.
    fn aggregate_remove(
        &mut self,
        aggregate: AggregateId,
        actor: ActorKey,
    ) -> Result<(), BackendError>;

    /// Destroy an aggregate. Member actors stay in the scene.
    fn release_aggregate(&mut self, aggregate: AggregateId) -> Result<(), BackendError>;

    /// Advance the scene by `dt` seconds.
    ///
    /// `scratch` is transient memory valid only for the duration of this
    /// call. Every contact and trigger transition produced by the step is
    /// delivered to `events` before this returns.
    fn simulate(
        &mut self,
        dt: f32,
        scratch: &mut [u8],
        events: &mut dyn SimulationEvents,
    ) -> Result<(), BackendError>;

    /// Current world pose of an actor.
    fn pose(&self, actor: ActorKey) -> Result<Pose, BackendError>;

    /// Teleport an actor.
    fn set_pose(&mut self, actor: ActorKey, pose: Pose) -> Result<(), BackendError>;

    /// Current linear velocity. Zero for static actors.
    fn linear_velocity(&self, actor: ActorKey) -> Result<Vec3, BackendError>;

    /// Change a dynamic actor's mass.
    fn set_mass(&mut self, actor: ActorKey, mass: f32) -> Result<(), BackendError>;

    /// Apply a force or impulse to a dynamic actor's centre of mass.
    fn add_force(
        &mut self,
        actor: ActorKey,
        force: Vec3,
        mode: ForceMode,
    ) -> Result<(), BackendError>;

    /// All hits along a ray, nearest first.
    ///
    /// `direction` is normalised by the caller.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Vec<RaycastHit>;

    /// Every actor whose shape overlaps `shape` placed at `pose`.
    fn overlap(&self, shape: &ColliderShape, pose: &Pose, filter: &QueryFilter) -> Vec<ActorKey>;
}
