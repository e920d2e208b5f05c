//! The physics world: one backend scene behind a lock discipline.
//!
//! [`PhysicsWorld`] owns a [`PhysicsBackend`], the scratch arena it
//! simulates with, the handle registry, and the event collector. Each
//! [`update()`](PhysicsWorld::update) runs one step:
//!
//! ```text
//! step gate ──┬─ write lock ─┬─ clear queues
//!             │              ├─ allocate scratch block
//!             │              ├─ backend.simulate  ──► ReportIntake
//!             │              ├─ drain collector   ──► delivery list
//!             │              └─ reset scratch
//!             ├─ backend diagnostics ──► LogSink::error
//!             └─ per delivery: hooks (no scene lock held) ──► queue entry
//! ```
//!
//! Listeners are looked up again right before each hook call. A body
//! removed by an earlier hook in the same step receives no further calls,
//! and its pending queue entries are never published.
//!
//! # Ownership model
//!
//! `PhysicsWorld` is [`Send`] and [`Sync`]; every method takes `&self`.
//! Scene mutations take the write lock, reads take the read lock, and a
//! separate step gate serialises `update` calls so hook delivery for step
//! N finishes before step N+1 starts.
//!
//! # Shutdown
//!
//! [`release()`](PhysicsWorld::release) or dropping the world destroys all
//! actors, releases the backend scene, and returns scratch memory to the
//! OS, in that order.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use torque_arena::{ScratchAllocator, ScratchConfig};
use torque_core::{
    ActorKey, AggregateId, BackendDiagnostic, BackendError, BodyDesc, BodyHandle, BodyKind,
    ColliderShape, EventKind, ForceMode, HandlePair, InitError, InitStage, PhysicsBackend, Pose,
    Quat, QueryFilter, StepId, Vec3,
};

use crate::collector::{Delivery, EventCollector};
use crate::config::{Timestep, WorldConfig};
use crate::error::{BodyError, StepError};
use crate::events::EventQueues;
use crate::hooks::{BodyListener, LogSink};
use crate::lock::{SceneLock, SceneReadGuard};
use crate::metrics::{StepMetrics, StepReport};
use crate::query::{OverlapInfo, RayHit, RaycastInfo};
use crate::registry::{BodyRecord, BodyRegistry};

// Compile-time assertion: a world can be shared across threads for any
// backend.
const _: () = {
    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}
    #[allow(dead_code)]
    fn check<B: PhysicsBackend>() {
        assert_send_sync::<PhysicsWorld<B>>();
    }
};

// ── Scene ─────────────────────────────────────────────────────────

struct Scene<B> {
    backend: B,
    registry: BodyRegistry,
    collector: EventCollector,
    queues: EventQueues,
    scratch: ScratchAllocator,
    step: StepId,
    released: bool,
}

impl<B: PhysicsBackend> Scene<B> {
    fn ensure_live(&self) -> Result<(), BodyError> {
        if self.released {
            Err(BodyError::Released)
        } else {
            Ok(())
        }
    }

    fn pose_of(&self, handle: BodyHandle) -> Result<Pose, BodyError> {
        self.ensure_live()?;
        let actor = self.registry.actor(handle)?;
        Ok(self.backend.pose(actor)?)
    }

    fn velocity_of(&self, handle: BodyHandle) -> Result<Vec3, BodyError> {
        self.ensure_live()?;
        let actor = self.registry.actor(handle)?;
        Ok(self.backend.linear_velocity(actor)?)
    }

    fn holds_pair(&self, a: BodyHandle, b: BodyHandle) -> bool {
        !self.released && self.registry.contains(a) && self.registry.contains(b)
    }

    fn teardown(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.registry.clear();
        self.collector.reset();
        self.queues.clear();
        self.backend.release();
        self.scratch.reset(true);
        self.released = true;
        true
    }
}

// ── PhysicsWorld ──────────────────────────────────────────────────

/// A simulated scene driven through a [`PhysicsBackend`].
///
/// Created from a [`WorldConfig`] via [`new()`](PhysicsWorld::new).
///
/// # Example
///
/// ```ignore
/// let world = PhysicsWorld::new(WorldConfig::default(), backend)?;
/// world.add_body(BodyHandle(1), BodyDesc::dynamic(ColliderShape::sphere(0.5)), None)?;
/// loop {
///     world.update(frame_dt)?;
///     for pair in world.collisions_entered() { /* ... */ }
/// }
/// ```
pub struct PhysicsWorld<B: PhysicsBackend> {
    step_gate: Mutex<()>,
    scene: SceneLock<Scene<B>>,
    last_metrics: Mutex<StepMetrics>,
    timestep: Timestep,
    scratch_config: ScratchConfig,
    log_sink: Arc<dyn LogSink>,
}

impl<B: PhysicsBackend> PhysicsWorld<B> {
    /// Bring up a world: validate `config`, reserve scratch memory, and
    /// initialise the backend scene.
    ///
    /// Every failure is also reported through the configured log sink.
    pub fn new(config: WorldConfig, mut backend: B) -> Result<Self, InitError> {
        let sink = Arc::clone(&config.log_sink);
        let fail = |e: InitError| {
            sink.error(&e.to_string());
            e
        };

        config
            .validate()
            .map_err(|e| fail(InitError::new(InitStage::Config, e.to_string())))?;
        let scratch = ScratchAllocator::from_config(&config.scratch)
            .map_err(|e| fail(InitError::new(InitStage::Scratch, e.to_string())))?;
        backend.initialize(&config.scene_desc()).map_err(fail)?;

        sink.message(&format!(
            "{} scene ready: {} worker threads, {} byte scratch reserve",
            backend.name(),
            config.worker_threads,
            scratch.reserved()
        ));

        Ok(Self {
            step_gate: Mutex::new(()),
            scene: SceneLock::new(Scene {
                backend,
                registry: BodyRegistry::new(),
                collector: EventCollector::new(),
                queues: EventQueues::new(),
                scratch,
                step: StepId::default(),
                released: false,
            }),
            last_metrics: Mutex::new(StepMetrics::default()),
            timestep: config.timestep,
            scratch_config: config.scratch,
            log_sink: config.log_sink,
        })
    }

    // ── Stepping ──────────────────────────────────────────────────

    /// Advance the scene one step and dispatch its contact transitions.
    ///
    /// With a fixed timestep `dt` is ignored. Queues from the previous
    /// step are replaced. Hooks run before this returns, after the scene
    /// write lock has been released.
    ///
    /// # Errors
    ///
    /// [`StepError::InvalidTimestep`] for a bad variable `dt`,
    /// [`StepError::Scratch`] if the step block cannot be allocated,
    /// [`StepError::Backend`] if simulation fails. A failed step
    /// dispatches nothing and leaves the queues empty.
    pub fn update(&self, dt: f32) -> Result<StepReport, StepError> {
        let _gate = self.step_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let step_start = Instant::now();
        let dt = self.timestep.resolve(dt)?;

        let mut guard = self.scene.write();
        if guard.released {
            return Err(StepError::Released);
        }
        let Scene {
            backend,
            registry,
            collector,
            queues,
            scratch,
            step,
            ..
        } = &mut *guard;

        queues.clear();

        let simulate_start = Instant::now();
        let outcome = {
            let mut intake = collector.intake(registry);
            match scratch.try_allocate(
                self.scratch_config.step_block_size,
                self.scratch_config.step_block_alignment,
                true,
            ) {
                Ok(Some(mut block)) => backend
                    .simulate(dt, &mut block, &mut intake)
                    .map_err(StepError::Backend),
                Ok(None) => backend
                    .simulate(dt, &mut [], &mut intake)
                    .map_err(StepError::Backend),
                Err(e) => Err(StepError::Scratch(e)),
            }
        };
        let simulate_us = simulate_start.elapsed().as_micros() as u64;

        let mut metrics = StepMetrics {
            simulate_us,
            scratch_used_bytes: scratch.used(),
            scratch_committed_bytes: scratch.committed(),
            ..StepMetrics::default()
        };
        scratch.reset(false);
        let diagnostics = collector.take_diagnostics();
        metrics.backend_errors = diagnostics.len() as u32;

        if let Err(e) = outcome {
            let backend_name = backend.name();
            collector.discard_step();
            drop(guard);
            self.forward_diagnostics(&diagnostics);
            log::debug!("step failed in {backend_name}: {e}");
            return Err(e);
        }

        let dispatch_start = Instant::now();
        let mut deliveries = Vec::with_capacity(collector.pending());
        let summary = collector.drain(&mut deliveries);

        *step = step.next();
        let step_id = *step;
        metrics.stay_events = summary.stay_events;
        metrics.dropped_reports = summary.dropped_reports;
        drop(guard);

        self.forward_diagnostics(&diagnostics);
        for delivery in &deliveries {
            if !self.deliver(delivery) {
                continue;
            }
            if let Some((kind, pair)) = delivery.entry {
                if self.publish(kind, pair) {
                    match kind {
                        EventKind::CollisionEnter => metrics.collision_enter_events += 1,
                        EventKind::CollisionExit => metrics.collision_exit_events += 1,
                        EventKind::TriggerEnter => metrics.trigger_enter_events += 1,
                        EventKind::TriggerExit => metrics.trigger_exit_events += 1,
                    }
                }
            }
        }
        metrics.dispatch_us = dispatch_start.elapsed().as_micros() as u64;
        metrics.total_us = step_start.elapsed().as_micros() as u64;

        log::debug!(
            "step {step_id}: dt={dt} transitions={} stays={} dropped={} simulate={}us",
            metrics.transition_events(),
            metrics.stay_events,
            metrics.dropped_reports,
            metrics.simulate_us
        );
        *self
            .last_metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = metrics.clone();

        Ok(StepReport {
            step: step_id,
            dt,
            metrics,
        })
    }

    /// Run both hook calls of `delivery`, looking each listener up at call
    /// time. Stops and returns `false` once either body has been removed,
    /// so a body destroyed by an earlier hook receives nothing further.
    fn deliver(&self, delivery: &Delivery) -> bool {
        for call in &delivery.calls {
            let listener = {
                let scene = self.scene.read();
                if !scene.holds_pair(call.target(), call.counterpart()) {
                    log::trace!("skipping {} for removed body", delivery.pair());
                    return false;
                }
                scene.registry.listener(call.target())
            };
            if let Some(listener) = listener {
                call.deliver(listener.as_ref());
            }
        }
        true
    }

    /// Append a queue entry whose hooks have all run, unless one of its
    /// bodies was removed meanwhile.
    fn publish(&self, kind: EventKind, pair: HandlePair) -> bool {
        let mut scene = self.scene.write();
        if !scene.holds_pair(pair.first, pair.second) {
            return false;
        }
        scene.queues.push(kind, pair);
        true
    }

    fn forward_diagnostics(&self, diagnostics: &[BackendDiagnostic]) {
        for d in diagnostics {
            self.log_sink.error(&d.to_string());
        }
    }

    /// Metrics from the most recent successful step.
    pub fn last_metrics(&self) -> StepMetrics {
        self.last_metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The last completed step. [`StepId::default()`] before the first.
    pub fn step_id(&self) -> StepId {
        self.scene.read().step
    }

    /// The step policy this world was built with.
    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    // ── Bodies ────────────────────────────────────────────────────

    /// Create a body and attach it under `handle`.
    ///
    /// Static bodies never use gravity, whatever `desc` says.
    pub fn add_body(
        &self,
        handle: BodyHandle,
        mut desc: BodyDesc,
        listener: Option<Arc<dyn BodyListener>>,
    ) -> Result<(), BodyError> {
        if desc.kind == BodyKind::Static {
            desc.use_gravity = false;
        }
        desc.validate()?;

        let mut scene = self.scene.write();
        scene.ensure_live()?;
        scene.registry.check_vacant(handle)?;
        let actor = scene.backend.create_actor(&desc)?;
        scene.registry.insert(
            handle,
            BodyRecord {
                actor,
                kind: desc.kind,
                mass: desc.mass,
                is_trigger: desc.is_trigger,
                listener,
                aggregate: None,
            },
        )?;
        log::debug!(
            "added body {handle} as {actor}: {:?} {}{}",
            desc.kind,
            desc.shape.kind_name(),
            if desc.is_trigger { " trigger" } else { "" }
        );
        Ok(())
    }

    /// Detach and destroy a body.
    ///
    /// Transitions for the body that the current step has not dispatched
    /// yet are discarded, as is its membership in any trigger pair.
    pub fn remove_body(&self, handle: BodyHandle) -> Result<(), BodyError> {
        let mut guard = self.scene.write();
        guard.ensure_live()?;
        let Scene {
            backend,
            registry,
            collector,
            ..
        } = &mut *guard;

        let record = registry.get(handle)?;
        let (actor, aggregate) = (record.actor, record.aggregate);
        if let Some(aggregate) = aggregate {
            if let Err(e) = backend.aggregate_remove(aggregate, actor) {
                log::warn!("removing {handle} from aggregate {aggregate}: {e}");
            }
        }
        if let Err(e) = backend.destroy_actor(actor) {
            // The actor is still alive, so it stays registered.
            if let Some(aggregate) = aggregate {
                if let Err(re) = backend.aggregate_add(aggregate, actor) {
                    log::warn!("restoring {handle} to aggregate {aggregate}: {re}");
                }
            }
            return Err(e.into());
        }
        registry.remove(handle)?;
        let purged = collector.purge(handle);
        log::debug!("removed body {handle} ({purged} pending records purged)");
        Ok(())
    }

    /// Replace the listener of a live body.
    pub fn set_listener(
        &self,
        handle: BodyHandle,
        listener: Option<Arc<dyn BodyListener>>,
    ) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        scene.registry.get_mut(handle)?.listener = listener;
        Ok(())
    }

    /// `true` if `handle` names a live body.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.scene.read().registry.contains(handle)
    }

    /// Backend actor behind `handle`, for use with
    /// [`with_backend`](Self::with_backend).
    pub fn actor(&self, handle: BodyHandle) -> Result<ActorKey, BodyError> {
        self.scene.read().registry.actor(handle)
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.scene.read().registry.len()
    }

    /// Current world pose.
    pub fn pose(&self, handle: BodyHandle) -> Result<Pose, BodyError> {
        self.scene.read().pose_of(handle)
    }

    /// Current world position.
    pub fn position(&self, handle: BodyHandle) -> Result<Vec3, BodyError> {
        self.pose(handle).map(|p| p.position)
    }

    /// Current world rotation.
    pub fn rotation(&self, handle: BodyHandle) -> Result<Quat, BodyError> {
        self.pose(handle).map(|p| p.rotation)
    }

    /// Current linear velocity.
    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec3, BodyError> {
        self.scene.read().velocity_of(handle)
    }

    /// Teleport a body.
    pub fn set_pose(&self, handle: BodyHandle, pose: Pose) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        let actor = scene.registry.actor(handle)?;
        scene.backend.set_pose(actor, pose)?;
        Ok(())
    }

    /// Move a body, keeping its rotation.
    pub fn set_position(&self, handle: BodyHandle, position: Vec3) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        let mut pose = scene.pose_of(handle)?;
        pose.position = position;
        let actor = scene.registry.actor(handle)?;
        scene.backend.set_pose(actor, pose)?;
        Ok(())
    }

    /// Rotate a body, keeping its position.
    pub fn set_rotation(&self, handle: BodyHandle, rotation: Quat) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        let mut pose = scene.pose_of(handle)?;
        pose.rotation = rotation;
        let actor = scene.registry.actor(handle)?;
        scene.backend.set_pose(actor, pose)?;
        Ok(())
    }

    /// Mass as last set.
    pub fn mass(&self, handle: BodyHandle) -> Result<f32, BodyError> {
        let scene = self.scene.read();
        scene.ensure_live()?;
        Ok(scene.registry.get(handle)?.mass)
    }

    /// Change a dynamic body's mass.
    pub fn set_mass(&self, handle: BodyHandle, mass: f32) -> Result<(), BodyError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(BackendError::InvalidMass { mass }.into());
        }
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        let record = scene.registry.get(handle)?;
        let actor = record.actor;
        if record.kind != BodyKind::Dynamic {
            return Err(BackendError::NotDynamic { actor }.into());
        }
        scene.backend.set_mass(actor, mass)?;
        scene.registry.get_mut(handle)?.mass = mass;
        Ok(())
    }

    /// Push a dynamic body.
    pub fn add_force(
        &self,
        handle: BodyHandle,
        force: Vec3,
        mode: ForceMode,
    ) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        let record = scene.registry.get(handle)?;
        let actor = record.actor;
        if record.kind != BodyKind::Dynamic {
            return Err(BackendError::NotDynamic { actor }.into());
        }
        scene.backend.add_force(actor, force, mode)?;
        Ok(())
    }

    // ── Aggregates ────────────────────────────────────────────────

    /// Create an empty aggregate for at most `max_actors` bodies.
    ///
    /// With `self_collisions` off, members never generate contacts with
    /// each other.
    pub fn create_aggregate(
        &self,
        max_actors: u32,
        self_collisions: bool,
    ) -> Result<AggregateId, BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        let aggregate = scene.backend.create_aggregate(max_actors, self_collisions)?;
        scene.registry.insert_aggregate(aggregate);
        log::debug!(
            "created aggregate {aggregate} (max {max_actors}, self collisions {self_collisions})"
        );
        Ok(aggregate)
    }

    /// Add a body to an aggregate.
    pub fn add_to_aggregate(
        &self,
        aggregate: AggregateId,
        handle: BodyHandle,
    ) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        scene.registry.aggregate_members(aggregate)?;
        let record = scene.registry.get(handle)?;
        if let Some(current) = record.aggregate {
            return Err(BodyError::AlreadyAggregated {
                handle,
                aggregate: current,
            });
        }
        let actor = record.actor;
        scene.backend.aggregate_add(aggregate, actor)?;
        scene.registry.join_aggregate(aggregate, handle)
    }

    /// Take a body out of an aggregate. The body stays in the scene.
    pub fn remove_from_aggregate(
        &self,
        aggregate: AggregateId,
        handle: BodyHandle,
    ) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        let actor = scene.registry.actor(handle)?;
        scene.backend.aggregate_remove(aggregate, actor)?;
        scene.registry.leave_aggregate(aggregate, handle)
    }

    /// Destroy an aggregate. Its members stay in the scene.
    pub fn release_aggregate(&self, aggregate: AggregateId) -> Result<(), BodyError> {
        let mut scene = self.scene.write();
        scene.ensure_live()?;
        scene.registry.aggregate_members(aggregate)?;
        scene.backend.release_aggregate(aggregate)?;
        scene.registry.remove_aggregate(aggregate)?;
        Ok(())
    }

    /// Current members of an aggregate.
    pub fn aggregate_members(
        &self,
        aggregate: AggregateId,
    ) -> Result<Vec<BodyHandle>, BodyError> {
        let scene = self.scene.read();
        Ok(scene.registry.aggregate_members(aggregate)?.to_vec())
    }

    // ── Queries ───────────────────────────────────────────────────

    /// Cast a ray from a body's position. The body itself is never
    /// reported.
    pub fn raycast(
        &self,
        from: BodyHandle,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Result<RaycastInfo, BodyError> {
        let scene = self.scene.read();
        let origin = scene.pose_of(from)?.position;
        let caster = scene.registry.actor(from)?;
        Ok(Self::cast(&scene, origin, direction, max_distance, filter, Some(caster)))
    }

    /// Cast a ray from an arbitrary point.
    pub fn raycast_from(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> RaycastInfo {
        let scene = self.scene.read();
        if scene.released {
            return RaycastInfo::default();
        }
        Self::cast(&scene, origin, direction, max_distance, filter, None)
    }

    fn cast(
        scene: &Scene<B>,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
        skip: Option<ActorKey>,
    ) -> RaycastInfo {
        let Some(direction) = direction.try_normalize() else {
            return RaycastInfo::default();
        };
        if max_distance.is_nan() || max_distance <= 0.0 {
            return RaycastInfo::default();
        }
        let hits = scene
            .backend
            .raycast(origin, direction, max_distance, filter)
            .into_iter()
            .filter(|h| Some(h.actor) != skip)
            .filter_map(|h| {
                scene.registry.resolve(h.actor).map(|body| RayHit {
                    body,
                    distance: h.distance,
                    position: h.position,
                    normal: h.normal,
                })
            })
            .collect();
        RaycastInfo { hits }
    }

    /// Bodies overlapping `shape` placed at `pose`.
    pub fn overlap(
        &self,
        shape: &ColliderShape,
        pose: &Pose,
        filter: &QueryFilter,
    ) -> Result<OverlapInfo, BodyError> {
        shape.validate()?;
        let scene = self.scene.read();
        scene.ensure_live()?;
        let bodies = scene
            .backend
            .overlap(shape, pose, filter)
            .into_iter()
            .filter_map(|actor| scene.registry.resolve(actor))
            .collect();
        Ok(OverlapInfo { bodies })
    }

    /// Bodies overlapping an oriented box.
    pub fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        filter: &QueryFilter,
    ) -> Result<OverlapInfo, BodyError> {
        self.overlap(
            &ColliderShape::Box { half_extents },
            &Pose::new(center, rotation),
            filter,
        )
    }

    /// Bodies overlapping a sphere.
    pub fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        filter: &QueryFilter,
    ) -> Result<OverlapInfo, BodyError> {
        self.overlap(
            &ColliderShape::Sphere { radius },
            &Pose::from_position(center),
            filter,
        )
    }

    /// Bodies overlapping a capsule.
    pub fn overlap_capsule(
        &self,
        center: Vec3,
        radius: f32,
        half_height: f32,
        rotation: Quat,
        filter: &QueryFilter,
    ) -> Result<OverlapInfo, BodyError> {
        self.overlap(
            &ColliderShape::Capsule {
                radius,
                half_height,
            },
            &Pose::new(center, rotation),
            filter,
        )
    }

    /// `true` if anything overlaps an oriented box.
    pub fn check_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        filter: &QueryFilter,
    ) -> Result<bool, BodyError> {
        Ok(self
            .overlap_box(center, half_extents, rotation, filter)?
            .is_overlapping())
    }

    /// `true` if anything overlaps a sphere.
    pub fn check_sphere(
        &self,
        center: Vec3,
        radius: f32,
        filter: &QueryFilter,
    ) -> Result<bool, BodyError> {
        Ok(self.overlap_sphere(center, radius, filter)?.is_overlapping())
    }

    /// `true` if anything overlaps a capsule.
    pub fn check_capsule(
        &self,
        center: Vec3,
        radius: f32,
        half_height: f32,
        rotation: Quat,
        filter: &QueryFilter,
    ) -> Result<bool, BodyError> {
        Ok(self
            .overlap_capsule(center, radius, half_height, rotation, filter)?
            .is_overlapping())
    }

    // ── Queue polling ─────────────────────────────────────────────

    /// Pairs of `kind` from the last step. Non-destructive.
    pub fn events(&self, kind: EventKind) -> Vec<HandlePair> {
        self.scene.read().queues.get(kind).to_vec()
    }

    /// Pairs that started touching in the last step.
    pub fn collisions_entered(&self) -> Vec<HandlePair> {
        self.events(EventKind::CollisionEnter)
    }

    /// Pairs that stopped touching in the last step.
    pub fn collisions_exited(&self) -> Vec<HandlePair> {
        self.events(EventKind::CollisionExit)
    }

    /// Trigger pairs entered in the last step.
    pub fn triggers_entered(&self) -> Vec<HandlePair> {
        self.events(EventKind::TriggerEnter)
    }

    /// Trigger pairs exited in the last step.
    pub fn triggers_exited(&self) -> Vec<HandlePair> {
        self.events(EventKind::TriggerExit)
    }

    /// Trigger pairs currently overlapping, smaller handle first.
    pub fn active_triggers(&self) -> Vec<HandlePair> {
        self.scene.read().collector.active_triggers().collect()
    }

    // ── Batched access ────────────────────────────────────────────

    /// Hold the read lock for several reads in a row.
    ///
    /// Updates and body changes block until the view is dropped.
    pub fn read(&self) -> SceneView<'_, B> {
        SceneView {
            scene: self.scene.read(),
        }
    }

    /// Run `f` against the backend under the read lock.
    pub fn with_backend<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.scene.read().backend)
    }

    /// Run `f` against the backend under the write lock.
    ///
    /// Changes made here bypass the registry; creating or destroying
    /// actors directly leaves reports for them unresolvable.
    pub fn with_backend_mut<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.scene.write().backend)
    }

    // ── Shutdown ──────────────────────────────────────────────────

    /// Destroy every body, release the backend scene, and free scratch
    /// memory. Later updates fail with [`StepError::Released`]. Idempotent.
    pub fn release(&self) {
        let _gate = self.step_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let released = self.scene.write().teardown();
        if released {
            self.log_sink.message("scene released");
        }
    }

    /// `true` once [`release()`](Self::release) has run.
    pub fn is_released(&self) -> bool {
        self.scene.read().released
    }
}

impl<B: PhysicsBackend> Drop for PhysicsWorld<B> {
    fn drop(&mut self) {
        if self.scene.get_mut().teardown() {
            log::debug!("world dropped without release; scene torn down");
        }
    }
}

// ── SceneView ─────────────────────────────────────────────────────

/// Several reads under one read lock. Obtained from
/// [`PhysicsWorld::read`].
pub struct SceneView<'w, B> {
    scene: SceneReadGuard<'w, Scene<B>>,
}

impl<B: PhysicsBackend> SceneView<'_, B> {
    /// Current world pose.
    pub fn pose(&self, handle: BodyHandle) -> Result<Pose, BodyError> {
        self.scene.pose_of(handle)
    }

    /// Current world position.
    pub fn position(&self, handle: BodyHandle) -> Result<Vec3, BodyError> {
        self.pose(handle).map(|p| p.position)
    }

    /// Current world rotation.
    pub fn rotation(&self, handle: BodyHandle) -> Result<Quat, BodyError> {
        self.pose(handle).map(|p| p.rotation)
    }

    /// Current linear velocity.
    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec3, BodyError> {
        self.scene.velocity_of(handle)
    }

    /// `true` if `handle` names a live body.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.scene.registry.contains(handle)
    }

    /// Live bodies in insertion order.
    pub fn bodies(&self) -> Vec<BodyHandle> {
        self.scene.registry.handles().collect()
    }

    /// Pairs of `kind` from the last step.
    pub fn events(&self, kind: EventKind) -> &[HandlePair] {
        self.scene.queues.get(kind)
    }

    /// The last completed step.
    pub fn step_id(&self) -> StepId {
        self.scene.step
    }
}
