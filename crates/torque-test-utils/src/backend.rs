//! A deterministic in-process backend for engine tests.
//!
//! [`ScriptedBackend`] integrates dynamic bodies with explicit Euler steps
//! and detects touching pairs by brute force with the shared geometry
//! helpers. Contacts are detected but never resolved: bodies pass through
//! each other. Tests can also inject raw reports and failures directly.

use indexmap::{IndexMap, IndexSet};

use torque_core::geometry::{contact_estimate, ray_cast, shapes_overlap};
use torque_core::{
    ActorKey, AggregateId, BackendDiagnostic, BackendError, BodyDesc, BodyKind, ColliderShape,
    ContactPoints, ContactReport, ForceMode, InitError, InitStage, PhysicsBackend, Pose,
    QueryFilter, RaycastHit, SceneDesc, SimulationEvents, TouchTransition, TriggerReport,
    TriggerTransition, Vec3,
};

#[derive(Clone, Debug)]
struct Actor {
    desc: BodyDesc,
    pose: Pose,
    velocity: Vec3,
    mass: f32,
    pending_force: Vec3,
    aggregate: Option<AggregateId>,
}

#[derive(Clone, Debug)]
struct Aggregate {
    max_actors: u32,
    self_collisions: bool,
    members: IndexSet<ActorKey>,
}

/// A report queued for delivery on the next `simulate`.
#[derive(Clone, Debug, PartialEq)]
pub enum Scripted {
    Contact(ContactReport),
    Trigger(TriggerReport),
    Diagnostic(BackendDiagnostic),
}

/// Brute-force backend with scripting hooks.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    initialized: bool,
    desc: Option<SceneDesc>,
    actors: IndexMap<ActorKey, Actor>,
    next_actor: u64,
    aggregates: IndexMap<AggregateId, Aggregate>,
    next_aggregate: u32,
    touching: IndexSet<(ActorKey, ActorKey)>,
    inside: IndexSet<(ActorKey, ActorKey)>,
    scripted: Vec<Scripted>,
    fail_next_simulate: Option<BackendError>,
    fail_next_destroy: Option<BackendError>,
    fail_init: Option<InitStage>,
    detect_contacts: bool,
    simulate_calls: u64,
    last_dt: Option<f32>,
    last_scratch_len: usize,
    releases: u32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            detect_contacts: true,
            next_actor: 1,
            ..Self::default()
        }
    }

    /// Only deliver injected reports; skip geometric detection.
    pub fn scripted_only() -> Self {
        Self {
            detect_contacts: false,
            ..Self::new()
        }
    }

    /// Make `initialize` fail at `stage`.
    pub fn failing_init(stage: InitStage) -> Self {
        Self {
            fail_init: Some(stage),
            ..Self::new()
        }
    }

    /// Queue a contact report for the next step.
    pub fn inject_contact(&mut self, report: ContactReport) {
        self.scripted.push(Scripted::Contact(report));
    }

    /// Queue a trigger report for the next step.
    pub fn inject_trigger(&mut self, trigger: ActorKey, other: ActorKey, transition: TriggerTransition) {
        self.scripted.push(Scripted::Trigger(TriggerReport {
            trigger,
            other,
            transition,
        }));
    }

    /// Queue a runtime diagnostic for the next step.
    pub fn inject_diagnostic(&mut self, diagnostic: BackendDiagnostic) {
        self.scripted.push(Scripted::Diagnostic(diagnostic));
    }

    /// Make the next `simulate` fail with `error` after delivering any
    /// injected reports.
    pub fn fail_next_simulate(&mut self, error: BackendError) {
        self.fail_next_simulate = Some(error);
    }

    /// Make the next `destroy_actor` fail with `error`, leaving the actor
    /// alive.
    pub fn fail_next_destroy(&mut self, error: BackendError) {
        self.fail_next_destroy = Some(error);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn scene_desc(&self) -> Option<&SceneDesc> {
        self.desc.as_ref()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn has_actor(&self, actor: ActorKey) -> bool {
        self.actors.contains_key(&actor)
    }

    pub fn simulate_calls(&self) -> u64 {
        self.simulate_calls
    }

    /// `dt` passed to the most recent `simulate`.
    pub fn last_dt(&self) -> Option<f32> {
        self.last_dt
    }

    /// Length of the scratch slice passed to the most recent `simulate`.
    pub fn last_scratch_len(&self) -> usize {
        self.last_scratch_len
    }

    pub fn releases(&self) -> u32 {
        self.releases
    }

    pub fn aggregate_of(&self, actor: ActorKey) -> Option<AggregateId> {
        self.actors.get(&actor).and_then(|a| a.aggregate)
    }

    pub fn aggregate_count(&self) -> usize {
        self.aggregates.len()
    }

    fn ensure_initialized(&self) -> Result<(), BackendError> {
        if self.initialized {
            Ok(())
        } else {
            Err(BackendError::NotInitialized)
        }
    }

    fn actor(&self, key: ActorKey) -> Result<&Actor, BackendError> {
        self.ensure_initialized()?;
        self.actors
            .get(&key)
            .ok_or(BackendError::UnknownActor { actor: key })
    }

    fn actor_mut(&mut self, key: ActorKey) -> Result<&mut Actor, BackendError> {
        self.ensure_initialized()?;
        self.actors
            .get_mut(&key)
            .ok_or(BackendError::UnknownActor { actor: key })
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.desc.as_ref().map_or(Vec3::ZERO, |d| d.gravity);
        for actor in self.actors.values_mut() {
            if actor.desc.kind != BodyKind::Dynamic {
                actor.pending_force = Vec3::ZERO;
                continue;
            }
            let mut accel = actor.pending_force * (1.0 / actor.mass);
            if actor.desc.use_gravity {
                accel += gravity;
            }
            actor.velocity += accel * dt;
            actor.pose.position += actor.velocity * dt;
            actor.pending_force = Vec3::ZERO;
        }
    }

    fn isolated(&self, a: &Actor, b: &Actor) -> bool {
        match (a.aggregate, b.aggregate) {
            (Some(x), Some(y)) if x == y => self
                .aggregates
                .get(&x)
                .is_some_and(|agg| !agg.self_collisions),
            _ => false,
        }
    }

    fn detect(&mut self, events: &mut dyn SimulationEvents) {
        let keys: Vec<ActorKey> = self.actors.keys().copied().collect();
        let mut touching = IndexSet::new();
        let mut inside = IndexSet::new();
        for (i, &ka) in keys.iter().enumerate() {
            for &kb in &keys[i + 1..] {
                let (a, b) = (&self.actors[&ka], &self.actors[&kb]);
                if a.desc.kind != BodyKind::Dynamic && b.desc.kind != BodyKind::Dynamic
                    && !(a.desc.is_trigger || b.desc.is_trigger)
                {
                    continue;
                }
                if !a.desc.filter.interacts_with(&b.desc.filter) || self.isolated(a, b) {
                    continue;
                }
                if a.desc.is_trigger && b.desc.is_trigger {
                    continue;
                }
                if !shapes_overlap(&a.desc.shape, &a.pose, &b.desc.shape, &b.pose) {
                    continue;
                }
                if a.desc.is_trigger {
                    inside.insert((ka, kb));
                } else if b.desc.is_trigger {
                    inside.insert((kb, ka));
                } else {
                    touching.insert((ka, kb));
                }
            }
        }

        for &(a, b) in &self.touching {
            if !touching.contains(&(a, b)) {
                events.on_contact(ContactReport::bare(a, b, TouchTransition::Lost));
            }
        }
        for &(a, b) in &touching {
            let transition = if self.touching.contains(&(a, b)) {
                TouchTransition::Persists
            } else {
                TouchTransition::Found
            };
            events.on_contact(self.contact(a, b, transition));
        }
        for &(trigger, other) in &self.inside {
            if !inside.contains(&(trigger, other)) {
                events.on_trigger(TriggerReport {
                    trigger,
                    other,
                    transition: TriggerTransition::Exited,
                });
            }
        }
        for &(trigger, other) in &inside {
            if !self.inside.contains(&(trigger, other)) {
                events.on_trigger(TriggerReport {
                    trigger,
                    other,
                    transition: TriggerTransition::Entered,
                });
            }
        }
        self.touching = touching;
        self.inside = inside;
    }

    fn contact(&self, ka: ActorKey, kb: ActorKey, transition: TouchTransition) -> ContactReport {
        let (a, b) = (&self.actors[&ka], &self.actors[&kb]);
        let point = contact_estimate(&a.desc.shape, &a.pose, &b.desc.shape, &b.pose);
        let approach = (a.velocity - b.velocity).dot(point.normal);
        let impulse = if approach < 0.0 {
            let reduced = match (a.desc.kind, b.desc.kind) {
                (BodyKind::Dynamic, BodyKind::Dynamic) => a.mass * b.mass / (a.mass + b.mass),
                (BodyKind::Dynamic, _) => a.mass,
                (_, BodyKind::Dynamic) => b.mass,
                _ => 0.0,
            };
            point.normal * (-approach * reduced)
        } else {
            Vec3::ZERO
        };
        let mut contacts = ContactPoints::new();
        contacts.push(point);
        ContactReport {
            actors: [ka, kb],
            transition,
            impulse,
            post_velocities: Some([a.velocity, b.velocity]),
            contacts,
        }
    }

    fn forget_pairs(&mut self, actor: ActorKey) {
        self.touching.retain(|&(a, b)| a != actor && b != actor);
        self.inside.retain(|&(a, b)| a != actor && b != actor);
    }
}

impl PhysicsBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn initialize(&mut self, desc: &SceneDesc) -> Result<(), InitError> {
        if let Some(stage) = self.fail_init {
            return Err(InitError::new(stage, "scripted failure"));
        }
        if self.initialized {
            return Err(InitError::new(InitStage::Scene, "scene already initialized"));
        }
        self.desc = Some(desc.clone());
        self.initialized = true;
        Ok(())
    }

    fn release(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        self.actors.clear();
        self.aggregates.clear();
        self.touching.clear();
        self.inside.clear();
        self.scripted.clear();
        self.releases += 1;
    }

    fn create_actor(&mut self, desc: &BodyDesc) -> Result<ActorKey, BackendError> {
        self.ensure_initialized()?;
        desc.validate()?;
        let key = ActorKey(self.next_actor);
        self.next_actor += 1;
        self.actors.insert(
            key,
            Actor {
                desc: desc.clone(),
                pose: desc.pose,
                velocity: Vec3::ZERO,
                mass: desc.mass,
                pending_force: Vec3::ZERO,
                aggregate: None,
            },
        );
        Ok(key)
    }

    fn destroy_actor(&mut self, actor: ActorKey) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        if let Some(error) = self.fail_next_destroy.take() {
            return Err(error);
        }
        self.actors
            .shift_remove(&actor)
            .ok_or(BackendError::UnknownActor { actor })?;
        for agg in self.aggregates.values_mut() {
            agg.members.shift_remove(&actor);
        }
        self.forget_pairs(actor);
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
            Aggregate {
                max_actors,
                self_collisions,
                members: IndexSet::new(),
            },
        );
        Ok(id)
    }

    fn aggregate_add(&mut self, aggregate: AggregateId, actor: ActorKey) -> Result<(), BackendError> {
        self.actor(actor)?;
        let agg = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or(BackendError::UnknownAggregate { aggregate })?;
        if agg.members.len() as u32 >= agg.max_actors {
            return Err(BackendError::AggregateFull {
                aggregate,
                capacity: agg.max_actors,
            });
        }
        agg.members.insert(actor);
        self.actor_mut(actor)?.aggregate = Some(aggregate);
        Ok(())
    }

    fn aggregate_remove(
        &mut self,
        aggregate: AggregateId,
        actor: ActorKey,
    ) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        let agg = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or(BackendError::UnknownAggregate { aggregate })?;
        if !agg.members.shift_remove(&actor) {
            return Err(BackendError::UnknownActor { actor });
        }
        if let Some(a) = self.actors.get_mut(&actor) {
            a.aggregate = None;
        }
        Ok(())
    }

    fn release_aggregate(&mut self, aggregate: AggregateId) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        let agg = self
            .aggregates
            .shift_remove(&aggregate)
            .ok_or(BackendError::UnknownAggregate { aggregate })?;
        for actor in agg.members {
            if let Some(a) = self.actors.get_mut(&actor) {
                a.aggregate = None;
            }
        }
        Ok(())
    }

    fn simulate(
        &mut self,
        dt: f32,
        scratch: &mut [u8],
        events: &mut dyn SimulationEvents,
    ) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.simulate_calls += 1;
        self.last_dt = Some(dt);
        self.last_scratch_len = scratch.len();

        for item in std::mem::take(&mut self.scripted) {
            match item {
                Scripted::Contact(report) => events.on_contact(report),
                Scripted::Trigger(report) => events.on_trigger(report),
                Scripted::Diagnostic(d) => events.on_backend_error(d),
            }
        }
        if let Some(error) = self.fail_next_simulate.take() {
            log::debug!("scripted backend failing step {}: {error}", self.simulate_calls);
            return Err(error);
        }

        self.integrate(dt);
        if self.detect_contacts {
            self.detect(events);
        }
        Ok(())
    }

    fn pose(&self, actor: ActorKey) -> Result<Pose, BackendError> {
        Ok(self.actor(actor)?.pose)
    }

    fn set_pose(&mut self, actor: ActorKey, pose: Pose) -> Result<(), BackendError> {
        self.actor_mut(actor)?.pose = pose;
        Ok(())
    }

    fn linear_velocity(&self, actor: ActorKey) -> Result<Vec3, BackendError> {
        Ok(self.actor(actor)?.velocity)
    }

    fn set_mass(&mut self, actor: ActorKey, mass: f32) -> Result<(), BackendError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(BackendError::InvalidMass { mass });
        }
        let a = self.actor_mut(actor)?;
        if a.desc.kind != BodyKind::Dynamic {
            return Err(BackendError::NotDynamic { actor });
        }
        a.mass = mass;
        Ok(())
    }

    fn add_force(&mut self, actor: ActorKey, force: Vec3, mode: ForceMode) -> Result<(), BackendError> {
        let a = self.actor_mut(actor)?;
        if a.desc.kind != BodyKind::Dynamic {
            return Err(BackendError::NotDynamic { actor });
        }
        match mode {
            ForceMode::Force => a.pending_force += force,
            ForceMode::Impulse => a.velocity += force * (1.0 / a.mass),
        }
        Ok(())
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Vec<RaycastHit> {
        let mut hits: Vec<RaycastHit> = self
            .actors
            .iter()
            .filter(|(_, a)| filter.accepts(a.desc.is_trigger, a.desc.filter.group))
            .filter_map(|(&key, a)| {
                let (distance, normal) =
                    ray_cast(&a.desc.shape, &a.pose, origin, direction, max_distance)?;
                Some(RaycastHit {
                    actor: key,
                    distance,
                    position: origin + direction * distance,
                    normal,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn overlap(&self, shape: &ColliderShape, pose: &Pose, filter: &QueryFilter) -> Vec<ActorKey> {
        self.actors
            .iter()
            .filter(|(_, a)| filter.accepts(a.desc.is_trigger, a.desc.filter.group))
            .filter(|(_, a)| shapes_overlap(shape, pose, &a.desc.shape, &a.pose))
            .map(|(&key, _)| key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sink {
        contacts: Vec<ContactReport>,
        triggers: Vec<TriggerReport>,
        diagnostics: Vec<BackendDiagnostic>,
    }

    impl SimulationEvents for Sink {
        fn on_contact(&mut self, report: ContactReport) {
            self.contacts.push(report);
        }
        fn on_trigger(&mut self, report: TriggerReport) {
            self.triggers.push(report);
        }
        fn on_backend_error(&mut self, diagnostic: BackendDiagnostic) {
            self.diagnostics.push(diagnostic);
        }
    }

    fn backend() -> ScriptedBackend {
        let mut b = ScriptedBackend::new();
        b.initialize(&SceneDesc {
            gravity: Vec3::ZERO,
            ..SceneDesc::default()
        })
        .unwrap();
        b
    }

    #[test]
    fn found_persists_lost_sequence() {
        let mut b = backend();
        let a = b
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(1.0)))
            .unwrap();
        let c = b
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(1.0)).at(Vec3::new(1.5, 0.0, 0.0)))
            .unwrap();
        let mut sink = Sink::default();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        b.set_pose(c, Pose::from_position(Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        let transitions: Vec<_> = sink.contacts.iter().map(|r| r.transition).collect();
        assert_eq!(
            transitions,
            vec![
                TouchTransition::Found,
                TouchTransition::Persists,
                TouchTransition::Lost
            ]
        );
        assert!(sink.contacts.iter().all(|r| r.actors == [a, c]));
        assert_eq!(sink.contacts[2].post_velocities, None);
    }

    #[test]
    fn static_pairs_are_never_reported() {
        let mut b = backend();
        b.create_actor(&BodyDesc::fixed(ColliderShape::sphere(1.0)))
            .unwrap();
        b.create_actor(&BodyDesc::fixed(ColliderShape::sphere(1.0)))
            .unwrap();
        let mut sink = Sink::default();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        assert!(sink.contacts.is_empty());
    }

    #[test]
    fn trigger_enter_and_exit() {
        let mut b = backend();
        let zone = b
            .create_actor(&BodyDesc::fixed(ColliderShape::cuboid(2.0, 2.0, 2.0)).trigger())
            .unwrap();
        let ball = b
            .create_actor(&BodyDesc::kinematic(ColliderShape::sphere(0.5)))
            .unwrap();
        let mut sink = Sink::default();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        b.set_pose(ball, Pose::from_position(Vec3::new(9.0, 0.0, 0.0)))
            .unwrap();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        assert_eq!(
            sink.triggers,
            vec![
                TriggerReport {
                    trigger: zone,
                    other: ball,
                    transition: TriggerTransition::Entered
                },
                TriggerReport {
                    trigger: zone,
                    other: ball,
                    transition: TriggerTransition::Exited
                },
            ]
        );
        assert!(sink.contacts.is_empty());
    }

    #[test]
    fn injected_reports_arrive_before_failure() {
        let mut b = ScriptedBackend::scripted_only();
        b.initialize(&SceneDesc::default()).unwrap();
        b.inject_diagnostic(BackendDiagnostic::error("bad"));
        b.fail_next_simulate(BackendError::Failed {
            reason: "boom".into(),
        });
        let mut sink = Sink::default();
        assert!(b.simulate(0.1, &mut [], &mut sink).is_err());
        assert_eq!(sink.diagnostics.len(), 1);
        assert!(b.simulate(0.1, &mut [], &mut sink).is_ok());
    }

    #[test]
    fn failed_destroy_keeps_the_actor() {
        let mut b = backend();
        let a = b
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(1.0)))
            .unwrap();
        b.fail_next_destroy(BackendError::Failed {
            reason: "locked".into(),
        });
        assert!(b.destroy_actor(a).is_err());
        assert!(b.has_actor(a));
        assert!(b.destroy_actor(a).is_ok());
        assert!(!b.has_actor(a));
    }

    #[test]
    fn gravity_and_impulses_integrate() {
        let mut b = ScriptedBackend::new();
        b.initialize(&SceneDesc::default()).unwrap();
        let ball = b
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(0.5)).with_mass(2.0))
            .unwrap();
        b.add_force(ball, Vec3::new(4.0, 0.0, 0.0), ForceMode::Impulse)
            .unwrap();
        let mut sink = Sink::default();
        b.simulate(1.0, &mut [], &mut sink).unwrap();
        let v = b.linear_velocity(ball).unwrap();
        assert_eq!(v.x, 2.0);
        assert!((v.y + 9.81).abs() < 1e-4);
    }

    #[test]
    fn isolated_aggregate_members_do_not_touch() {
        let mut b = backend();
        let agg = b.create_aggregate(4, false).unwrap();
        let x = b
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(1.0)))
            .unwrap();
        let y = b
            .create_actor(&BodyDesc::dynamic(ColliderShape::sphere(1.0)))
            .unwrap();
        b.aggregate_add(agg, x).unwrap();
        b.aggregate_add(agg, y).unwrap();
        let mut sink = Sink::default();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        assert!(sink.contacts.is_empty());
        b.release_aggregate(agg).unwrap();
        b.simulate(0.1, &mut [], &mut sink).unwrap();
        assert_eq!(sink.contacts.len(), 1);
    }

    #[test]
    fn raycast_orders_hits() {
        let mut b = backend();
        let far = b
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(0.0, 0.0, 8.0)))
            .unwrap();
        let near = b
            .create_actor(&BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(0.0, 0.0, 3.0)))
            .unwrap();
        let hits = b.raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 20.0, &QueryFilter::ALL);
        let order: Vec<_> = hits.iter().map(|h| h.actor).collect();
        assert_eq!(order, vec![near, far]);
        assert!((hits[0].distance - 2.5).abs() < 1e-4);
    }
}
