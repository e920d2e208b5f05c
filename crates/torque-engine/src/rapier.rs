//! [`PhysicsBackend`] on top of `rapier3d`.
//!
//! Each actor is one rigid body with one attached collider. Rapier has no
//! native aggregates, so aggregate membership is tracked here and stamped
//! into collider user data; a pair filter hook drops contacts between
//! members of an aggregate created without self collisions.
//!
//! Rapier owns its own step memory, so the scratch slice handed to
//! [`simulate`](PhysicsBackend::simulate) goes unused.

use crossbeam_channel::{unbounded, Sender};
use indexmap::{IndexMap, IndexSet};
use rapier3d::prelude::*;
use smallvec::SmallVec;

use torque_core::geometry::{
    build_shape, from_isometry, from_vector, place, to_isometry, to_point, to_vector,
};
use torque_core::{
    ActorKey, AggregateId, BackendDiagnostic, BackendError, BodyDesc, BodyKind, ColliderShape,
    ContactPoint, ContactPoints, ContactReport, DiagnosticLevel, ForceMode, InitError, InitStage,
    PhysicsBackend, Pose, QueryFilter as SceneFilter, RaycastHit, SceneDesc,
    SimulationEvents, TouchTransition, TriggerReport, TriggerTransition, Vec3,
};

// ── Handles ───────────────────────────────────────────────────────

fn actor_key(handle: RigidBodyHandle) -> ActorKey {
    let (index, generation) = handle.into_raw_parts();
    ActorKey(u64::from(index) | (u64::from(generation) << 32))
}

fn body_handle(actor: ActorKey) -> RigidBodyHandle {
    RigidBodyHandle::from_raw_parts(actor.0 as u32, (actor.0 >> 32) as u32)
}

// ── Aggregates ────────────────────────────────────────────────────

#[derive(Debug)]
struct AggregateSlot {
    max_actors: u32,
    self_collisions: bool,
    members: IndexSet<ActorKey>,
}

/// Drops contact and intersection pairs inside one non-self-colliding
/// aggregate. Colliders carry `aggregate id + 1` in their user data.
#[derive(Debug, Default)]
struct AggregateFilter {
    isolated: IndexSet<u128>,
}

impl AggregateFilter {
    fn same_isolated_group(&self, colliders: &ColliderSet, a: ColliderHandle, b: ColliderHandle) -> bool {
        match (colliders.get(a), colliders.get(b)) {
            (Some(ca), Some(cb)) => {
                ca.user_data != 0 && ca.user_data == cb.user_data && self.isolated.contains(&ca.user_data)
            }
            _ => false,
        }
    }
}

impl PhysicsHooks for AggregateFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        if self.same_isolated_group(context.colliders, context.collider1, context.collider2) {
            None
        } else {
            Some(SolverFlags::COMPUTE_IMPULSES)
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        !self.same_isolated_group(context.colliders, context.collider1, context.collider2)
    }
}

// ── Events ────────────────────────────────────────────────────────

/// Queues collision events for draining after the step. Colliders only
/// enable `COLLISION_EVENTS`, so force events are ignored.
struct CollisionForwarder {
    tx: Sender<CollisionEvent>,
}

impl EventHandler for CollisionForwarder {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // The receiver lives until the drain loop finishes.
        let _ = self.tx.send(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

// ── RapierBackend ─────────────────────────────────────────────────

/// A rapier scene behind the [`PhysicsBackend`] seam.
pub struct RapierBackend {
    initialized: bool,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    enable_ccd: bool,
    collider_of: IndexMap<ActorKey, ColliderHandle>,
    aggregates: IndexMap<AggregateId, AggregateSlot>,
    filter: AggregateFilter,
    next_aggregate: u32,
}

impl RapierBackend {
    /// An uninitialised backend. The scene is built by
    /// [`initialize`](PhysicsBackend::initialize).
    pub fn new() -> Self {
        Self {
            initialized: false,
            gravity: Vector::zeros(),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            enable_ccd: true,
            collider_of: IndexMap::new(),
            aggregates: IndexMap::new(),
            filter: AggregateFilter::default(),
            next_aggregate: 0,
        }
    }

    fn ensure_initialized(&self) -> Result<(), BackendError> {
        if self.initialized {
            Ok(())
        } else {
            Err(BackendError::NotInitialized)
        }
    }

    fn body(&self, actor: ActorKey) -> Result<&RigidBody, BackendError> {
        self.ensure_initialized()?;
        self.bodies
            .get(body_handle(actor))
            .ok_or(BackendError::UnknownActor { actor })
    }

    fn body_mut(&mut self, actor: ActorKey) -> Result<&mut RigidBody, BackendError> {
        self.ensure_initialized()?;
        self.bodies
            .get_mut(body_handle(actor))
            .ok_or(BackendError::UnknownActor { actor })
    }

    fn owner(&self, collider: ColliderHandle) -> Option<ActorKey> {
        self.colliders.get(collider)?.parent().map(actor_key)
    }

    fn is_sensor(&self, collider: ColliderHandle) -> bool {
        self.colliders.get(collider).map_or(false, |c| c.is_sensor())
    }

    fn velocity_of(&self, actor: ActorKey) -> Vec3 {
        self.bodies
            .get(body_handle(actor))
            .map_or(Vec3::ZERO, |b| from_vector(b.linvel()))
    }

    fn stamp_aggregate(&mut self, actor: ActorKey, aggregate: Option<AggregateId>) {
        if let Some(collider) = self
            .collider_of
            .get(&actor)
            .and_then(|h| self.colliders.get_mut(*h))
        {
            collider.user_data = aggregate.map_or(0, |a| u128::from(a.0) + 1);
        }
    }

    /// Full contact report for a touching pair, framed for `collider1`.
    fn contact_report(
        &self,
        pair: &ContactPair,
        transition: TouchTransition,
    ) -> Option<ContactReport> {
        let a = self.owner(pair.collider1)?;
        let b = self.owner(pair.collider2)?;
        let mut contacts = ContactPoints::new();
        for manifold in &pair.manifolds {
            let normal = -from_vector(&manifold.data.normal);
            for solver_contact in &manifold.data.solver_contacts {
                contacts.push(ContactPoint {
                    position: from_vector(&solver_contact.point.coords),
                    normal,
                    separation: solver_contact.dist,
                });
            }
        }
        Some(ContactReport {
            actors: [a, b],
            transition,
            impulse: -from_vector(&pair.total_impulse()),
            post_velocities: Some([self.velocity_of(a), self.velocity_of(b)]),
            contacts,
        })
    }

    fn query_filter_accepts(collider: &Collider, filter: &SceneFilter) -> bool {
        filter.accepts(collider.is_sensor(), collider.collision_groups().memberships.bits())
    }
}

impl Default for RapierBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RapierBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapierBackend")
            .field("initialized", &self.initialized)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .field("aggregates", &self.aggregates.len())
            .finish()
    }
}

impl PhysicsBackend for RapierBackend {
    fn name(&self) -> &'static str {
        "rapier3d"
    }

    fn initialize(&mut self, desc: &SceneDesc) -> Result<(), InitError> {
        if self.initialized {
            return Err(InitError::new(InitStage::Scene, "scene already initialized"));
        }
        if !desc.tolerance_length.is_finite() || desc.tolerance_length <= 0.0 {
            return Err(InitError::new(
                InitStage::Physics,
                format!("tolerance length must be positive, got {}", desc.tolerance_length),
            ));
        }
        self.gravity = to_vector(desc.gravity);
        let mut params = IntegrationParameters::default();
        params.allowed_linear_error *= desc.tolerance_length;
        params.prediction_distance *= desc.tolerance_length;
        self.integration_parameters = params;
        self.enable_ccd = desc.enable_ccd;
        if desc.worker_threads > 1 {
            log::debug!(
                target: "torque",
                "rapier3d steps on the calling thread; {} worker threads requested",
                desc.worker_threads
            );
        }
        self.initialized = true;
        Ok(())
    }

    fn release(&mut self) {
        if !self.initialized {
            return;
        }
        *self = Self::new();
    }

    fn create_actor(&mut self, desc: &BodyDesc) -> Result<ActorKey, BackendError> {
        self.ensure_initialized()?;
        desc.validate()?;
        let (shape, offset) = build_shape(&desc.shape)?;
        let body_type = match desc.kind {
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        let body = RigidBodyBuilder::new(body_type)
            .position(to_isometry(&desc.pose))
            .gravity_scale(if desc.use_gravity { 1.0 } else { 0.0 })
            .ccd_enabled(self.enable_ccd && desc.kind == BodyKind::Dynamic)
            .build();
        let handle = self.bodies.insert(body);

        let groups = InteractionGroups::new(
            Group::from_bits_truncate(desc.filter.group),
            Group::from_bits_truncate(desc.filter.mask),
        );
        let mut builder = ColliderBuilder::new(shape)
            .translation(to_vector(offset))
            .friction(desc.material.dynamic_friction)
            .restitution(desc.material.restitution)
            .sensor(desc.is_trigger)
            .collision_groups(groups)
            .solver_groups(groups)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR)
            .active_collision_types(ActiveCollisionTypes::all());
        if desc.kind == BodyKind::Dynamic {
            builder = builder.mass(desc.mass);
        }
        let collider = self
            .colliders
            .insert_with_parent(builder.build(), handle, &mut self.bodies);

        let actor = actor_key(handle);
        self.collider_of.insert(actor, collider);
        self.query_pipeline.update(&self.bodies, &self.colliders);
        Ok(actor)
    }

    fn destroy_actor(&mut self, actor: ActorKey) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        let removed = self.bodies.remove(
            body_handle(actor),
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_none() {
            return Err(BackendError::UnknownActor { actor });
        }
        self.collider_of.shift_remove(&actor);
        for slot in self.aggregates.values_mut() {
            slot.members.shift_remove(&actor);
        }
        self.query_pipeline.update(&self.bodies, &self.colliders);
        Ok(())
    }

    fn create_aggregate(
        &mut self,
        max_actors: u32,
        self_collisions: bool,
    ) -> Result<AggregateId, BackendError> {
        self.ensure_initialized()?;
        let id = AggregateId(self.next_aggregate);
        self.next_aggregate += 1;
        self.aggregates.insert(
            id,
            AggregateSlot {
                max_actors,
                self_collisions,
                members: IndexSet::new(),
            },
        );
        if !self_collisions {
            self.filter.isolated.insert(u128::from(id.0) + 1);
        }
        Ok(id)
    }

    fn aggregate_add(&mut self, aggregate: AggregateId, actor: ActorKey) -> Result<(), BackendError> {
        self.body(actor)?;
        let slot = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or(BackendError::UnknownAggregate { aggregate })?;
        if slot.members.len() as u32 >= slot.max_actors {
            return Err(BackendError::AggregateFull {
                aggregate,
                capacity: slot.max_actors,
            });
        }
        slot.members.insert(actor);
        self.stamp_aggregate(actor, Some(aggregate));
        Ok(())
    }

    fn aggregate_remove(
        &mut self,
        aggregate: AggregateId,
        actor: ActorKey,
    ) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        let slot = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or(BackendError::UnknownAggregate { aggregate })?;
        if !slot.members.shift_remove(&actor) {
            return Err(BackendError::UnknownActor { actor });
        }
        self.stamp_aggregate(actor, None);
        Ok(())
    }

    fn release_aggregate(&mut self, aggregate: AggregateId) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        let slot = self
            .aggregates
            .shift_remove(&aggregate)
            .ok_or(BackendError::UnknownAggregate { aggregate })?;
        if !slot.self_collisions {
            self.filter.isolated.shift_remove(&(u128::from(aggregate.0) + 1));
        }
        for actor in slot.members {
            self.stamp_aggregate(actor, None);
        }
        Ok(())
    }

    fn simulate(
        &mut self,
        dt: f32,
        _scratch: &mut [u8],
        events: &mut dyn SimulationEvents,
    ) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.integration_parameters.dt = dt;

        let (collision_tx, collision_rx) = unbounded();
        let collector = CollisionForwarder { tx: collision_tx };

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.filter,
            &collector,
        );

        let mut started: SmallVec<[(ColliderHandle, ColliderHandle); 16]> = SmallVec::new();
        while let Ok(event) = collision_rx.try_recv() {
            let (c1, c2, entering) = match event {
                CollisionEvent::Started(c1, c2, _) => (c1, c2, true),
                CollisionEvent::Stopped(c1, c2, _) => (c1, c2, false),
            };
            if self.is_sensor(c1) || self.is_sensor(c2) {
                let (trigger, other) = if self.is_sensor(c1) { (c1, c2) } else { (c2, c1) };
                // Removed colliders have no owner any more; their exits are dropped here.
                if let (Some(trigger), Some(other)) = (self.owner(trigger), self.owner(other)) {
                    events.on_trigger(TriggerReport {
                        trigger,
                        other,
                        transition: if entering {
                            TriggerTransition::Entered
                        } else {
                            TriggerTransition::Exited
                        },
                    });
                }
                continue;
            }
            if entering {
                started.push((c1, c2));
                let report = self
                    .narrow_phase
                    .contact_pair(c1, c2)
                    .and_then(|pair| self.contact_report(pair, TouchTransition::Found))
                    .or_else(|| {
                        let (a, b) = (self.owner(c1)?, self.owner(c2)?);
                        Some(ContactReport::bare(a, b, TouchTransition::Found))
                    });
                if let Some(report) = report {
                    events.on_contact(report);
                }
            } else if let (Some(a), Some(b)) = (self.owner(c1), self.owner(c2)) {
                events.on_contact(ContactReport::bare(a, b, TouchTransition::Lost));
            }
        }

        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let fresh = started.iter().any(|&(a, b)| {
                (a == pair.collider1 && b == pair.collider2) || (a == pair.collider2 && b == pair.collider1)
            });
            if fresh {
                continue;
            }
            if let Some(report) = self.contact_report(pair, TouchTransition::Persists) {
                events.on_contact(report);
            }
        }

        for (handle, body) in self.bodies.iter() {
            if !body.translation().iter().all(|c| c.is_finite()) {
                events.on_backend_error(BackendDiagnostic {
                    level: DiagnosticLevel::Warning,
                    message: format!("{} has a non-finite position", actor_key(handle)),
                    location: None,
                });
            }
        }
        Ok(())
    }

    fn pose(&self, actor: ActorKey) -> Result<Pose, BackendError> {
        Ok(from_isometry(self.body(actor)?.position()))
    }

    fn set_pose(&mut self, actor: ActorKey, pose: Pose) -> Result<(), BackendError> {
        let body = self.body_mut(actor)?;
        body.set_position(to_isometry(&pose), true);
        self.query_pipeline.update(&self.bodies, &self.colliders);
        Ok(())
    }

    fn linear_velocity(&self, actor: ActorKey) -> Result<Vec3, BackendError> {
        Ok(from_vector(self.body(actor)?.linvel()))
    }

    fn set_mass(&mut self, actor: ActorKey, mass: f32) -> Result<(), BackendError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(BackendError::InvalidMass { mass });
        }
        if !self.body(actor)?.is_dynamic() {
            return Err(BackendError::NotDynamic { actor });
        }
        let collider = self
            .collider_of
            .get(&actor)
            .and_then(|h| self.colliders.get_mut(*h))
            .ok_or(BackendError::UnknownActor { actor })?;
        collider.set_mass(mass);
        Ok(())
    }

    fn add_force(&mut self, actor: ActorKey, force: Vec3, mode: ForceMode) -> Result<(), BackendError> {
        let body = self.body_mut(actor)?;
        if !body.is_dynamic() {
            return Err(BackendError::NotDynamic { actor });
        }
        match mode {
            ForceMode::Force => body.add_force(to_vector(force), true),
            ForceMode::Impulse => body.apply_impulse(to_vector(force), true),
        }
        Ok(())
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &SceneFilter,
    ) -> Vec<RaycastHit> {
        if !self.initialized {
            return Vec::new();
        }
        let ray = Ray::new(to_point(origin), to_vector(direction));
        let accepts = |_: ColliderHandle, c: &Collider| Self::query_filter_accepts(c, filter);
        let query = QueryFilter::default().predicate(&accepts);
        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            query,
            |handle, intersection| {
                if let Some(actor) = self.owner(handle) {
                    hits.push(RaycastHit {
                        actor,
                        distance: intersection.toi,
                        position: from_vector(&ray.point_at(intersection.toi).coords),
                        normal: from_vector(&intersection.normal),
                    });
                }
                true
            },
        );
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn overlap(&self, shape: &ColliderShape, pose: &Pose, filter: &SceneFilter) -> Vec<ActorKey> {
        if !self.initialized {
            return Vec::new();
        }
        let Some((native, placed)) = place(shape, pose) else {
            return Vec::new();
        };
        let accepts = |_: ColliderHandle, c: &Collider| Self::query_filter_accepts(c, filter);
        let query = QueryFilter::default().predicate(&accepts);
        let mut found = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            &placed,
            &*native,
            query,
            |handle| {
                if let Some(actor) = self.owner(handle) {
                    found.push(actor);
                }
                true
            },
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sink {
        contacts: Vec<ContactReport>,
        triggers: Vec<TriggerReport>,
    }

    impl SimulationEvents for Sink {
        fn on_contact(&mut self, report: ContactReport) {
            self.contacts.push(report);
        }
        fn on_trigger(&mut self, report: TriggerReport) {
            self.triggers.push(report);
        }
        fn on_backend_error(&mut self, _: BackendDiagnostic) {}
    }

    fn scene() -> RapierBackend {
        let mut backend = RapierBackend::new();
        backend.initialize(&SceneDesc::default()).unwrap();
        backend
    }

    #[test]
    fn actor_keys_round_trip_through_handles() {
        let mut backend = scene();
        let actor = backend
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(0.5)).at(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        assert_eq!(backend.pose(actor).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
        backend.destroy_actor(actor).unwrap();
        assert!(matches!(
            backend.pose(actor),
            Err(BackendError::UnknownActor { .. })
        ));
    }

    #[test]
    fn falling_ball_lands_on_ground() {
        let mut backend = scene();
        let ground = backend
            .create_actor(&BodyDesc::fixed(ColliderShape::cuboid(20.0, 1.0, 20.0)))
            .unwrap();
        let ball = backend
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(0.5)).at(Vec3::new(0.0, 1.2, 0.0)))
            .unwrap();
        let mut sink = Sink::default();
        for _ in 0..60 {
            backend.simulate(1.0 / 60.0, &mut [], &mut sink).unwrap();
        }
        let found = sink
            .contacts
            .iter()
            .find(|r| r.transition == TouchTransition::Found)
            .expect("ball never touched the ground");
        assert!(found.actors.contains(&ground) && found.actors.contains(&ball));
        assert!(sink
            .contacts
            .iter()
            .any(|r| r.transition == TouchTransition::Persists));
        let y = backend.pose(ball).unwrap().position.y;
        assert!(y > 0.5 && y < 1.2, "ball resting height {y}");
    }

    #[test]
    fn sensor_reports_enter_as_trigger() {
        let mut backend = scene();
        let zone = backend
            .create_actor(&BodyDesc::fixed(ColliderShape::cuboid(2.0, 2.0, 2.0)).trigger())
            .unwrap();
        let ball = backend
            .create_actor(
                &BodyDesc::kinematic(ColliderShape::sphere(0.25)).at(Vec3::new(5.0, 0.0, 0.0)),
            )
            .unwrap();
        backend.set_pose(ball, Pose::from_position(Vec3::ZERO)).unwrap();
        let mut sink = Sink::default();
        backend.simulate(1.0 / 60.0, &mut [], &mut sink).unwrap();
        assert_eq!(
            sink.triggers,
            vec![TriggerReport {
                trigger: zone,
                other: ball,
                transition: TriggerTransition::Entered,
            }]
        );
        assert!(sink.contacts.is_empty());
    }

    #[test]
    fn leaving_a_sensor_reports_exit() {
        let mut backend = scene();
        let zone = backend
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(1.0)).trigger())
            .unwrap();
        let ball = backend
            .create_actor(&BodyDesc::kinematic(ColliderShape::sphere(0.25)))
            .unwrap();
        let mut sink = Sink::default();
        backend.simulate(1.0 / 60.0, &mut [], &mut sink).unwrap();
        backend
            .set_pose(ball, Pose::from_position(Vec3::new(8.0, 0.0, 0.0)))
            .unwrap();
        backend.simulate(1.0 / 60.0, &mut [], &mut sink).unwrap();

        let transitions: Vec<_> = sink.triggers.iter().map(|t| t.transition).collect();
        assert_eq!(
            transitions,
            vec![TriggerTransition::Entered, TriggerTransition::Exited]
        );
        assert!(sink.triggers.iter().all(|t| t.trigger == zone && t.other == ball));
    }

    #[test]
    fn raycast_sorts_hits_and_respects_triggers() {
        let mut backend = scene();
        let near = backend
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(0.0, 0.0, 2.0)))
            .unwrap();
        let far = backend
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(0.0, 0.0, 6.0)))
            .unwrap();
        backend
            .create_actor(
                &BodyDesc::fixed(ColliderShape::sphere(0.5))
                    .at(Vec3::new(0.0, 0.0, 4.0))
                    .trigger(),
            )
            .unwrap();
        let hits = backend.raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 100.0, &SceneFilter::SOLID);
        let actors: Vec<_> = hits.iter().map(|h| h.actor).collect();
        assert_eq!(actors, vec![near, far]);
        assert!((hits[0].distance - 1.5).abs() < 1e-3);
        let all = backend.raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 100.0, &SceneFilter::ALL);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn overlap_finds_bodies_in_volume() {
        let mut backend = scene();
        let inside = backend
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        backend
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        let found = backend.overlap(
            &ColliderShape::sphere(1.0),
            &Pose::IDENTITY,
            &SceneFilter::ALL,
        );
        assert_eq!(found, vec![inside]);
    }

    #[test]
    fn aggregate_capacity_is_enforced() {
        let mut backend = scene();
        let agg = backend.create_aggregate(1, false).unwrap();
        let a = backend
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(0.5)))
            .unwrap();
        let b = backend
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(0.5)).at(Vec3::new(3.0, 0.0, 0.0)))
            .unwrap();
        backend.aggregate_add(agg, a).unwrap();
        assert_eq!(
            backend.aggregate_add(agg, b),
            Err(BackendError::AggregateFull {
                aggregate: agg,
                capacity: 1
            })
        );
        backend.release_aggregate(agg).unwrap();
        assert_eq!(
            backend.aggregate_remove(agg, a),
            Err(BackendError::UnknownAggregate { aggregate: agg })
        );
    }
}
