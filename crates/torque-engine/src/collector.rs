//! Collision and trigger event collection.
//!
//! While a backend simulates, [`ReportIntake`] receives its raw report
//! stream, resolves actor keys to body handles, and appends each report
//! to one of the per-step accumulators. Unresolvable reports (an actor
//! removed while the backend still had it in flight) are dropped.
//!
//! After the backend returns, [`EventCollector::drain`] turns the
//! accumulators into an ordered list of [`Delivery`] entries. Each entry
//! holds the hook call for both bodies of one pair and the queue entry to
//! publish once both have run:
//!
//! ```text
//! removed collisions  ─► exit   (this, other), (other, this)  ─► collision-exited
//! new collisions      ─► enter  ...then later transitions of the same pair
//! persisting          ─► stay   (no queue)
//! lost triggers       ─► exit                                 ─► trigger-exited
//! new triggers        ─► enter  ...then later transitions of the same pair
//! active triggers     ─► stay   (no queue)
//! ```
//!
//! A pair that changes state more than once in a step (found, lost, found
//! again) reaches hooks and queues in report order.

use indexmap::IndexSet;
use smallvec::{smallvec, SmallVec};
use torque_core::{
    ActorKey, BackendDiagnostic, BodyHandle, Collision, ContactReport, EventKind, HandlePair,
    SimulationEvents, TouchTransition, TriggerReport, TriggerTransition, Vec3,
};

use crate::hooks::BodyListener;
use crate::registry::BodyRegistry;

// ── Dispatch ──────────────────────────────────────────────────────

/// One hook call, framed for the receiving body.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// `on_collision_enter` on `collision.this_body`.
    CollisionEnter(Collision),
    /// `on_collision_exit` on `collision.this_body`.
    CollisionExit(Collision),
    /// `on_collision_stay` on `collision.this_body`.
    CollisionStay(Collision),
    /// `on_trigger_enter(first, second)` on `first`.
    TriggerEnter(HandlePair),
    /// `on_trigger_exit(first, second)` on `first`.
    TriggerExit(HandlePair),
    /// `on_trigger_stay(first, second)` on `first`.
    TriggerStay(HandlePair),
}

impl Dispatch {
    /// The body whose listener receives this call.
    pub fn target(&self) -> BodyHandle {
        match self {
            Dispatch::CollisionEnter(c) | Dispatch::CollisionExit(c) | Dispatch::CollisionStay(c) => {
                c.this_body
            }
            Dispatch::TriggerEnter(p) | Dispatch::TriggerExit(p) | Dispatch::TriggerStay(p) => {
                p.first
            }
        }
    }

    /// The other body of the pair.
    pub fn counterpart(&self) -> BodyHandle {
        match self {
            Dispatch::CollisionEnter(c) | Dispatch::CollisionExit(c) | Dispatch::CollisionStay(c) => {
                c.other_body
            }
            Dispatch::TriggerEnter(p) | Dispatch::TriggerExit(p) | Dispatch::TriggerStay(p) => {
                p.second
            }
        }
    }

    /// Invoke the matching listener method.
    pub fn deliver(&self, listener: &dyn BodyListener) {
        match self {
            Dispatch::CollisionEnter(c) => listener.on_collision_enter(c),
            Dispatch::CollisionExit(c) => listener.on_collision_exit(c),
            Dispatch::CollisionStay(c) => listener.on_collision_stay(c),
            Dispatch::TriggerEnter(p) => listener.on_trigger_enter(p.first, p.second),
            Dispatch::TriggerExit(p) => listener.on_trigger_exit(p.first, p.second),
            Dispatch::TriggerStay(p) => listener.on_trigger_stay(p.first, p.second),
        }
    }
}

/// Both sides of one pair transition, plus the queue entry it produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    /// Hook calls in delivery order: the reporting body, then its partner.
    pub calls: [Dispatch; 2],
    /// Published once both calls have run. `None` for stays.
    pub entry: Option<(EventKind, HandlePair)>,
}

impl Delivery {
    fn collision(kind: EventKind, collision: Collision) -> Self {
        log::trace!("{kind} {}", collision.pair());
        let pair = collision.pair();
        let other = collision.swapped();
        let calls = match kind {
            EventKind::CollisionExit => [Dispatch::CollisionExit(collision), Dispatch::CollisionExit(other)],
            _ => [Dispatch::CollisionEnter(collision), Dispatch::CollisionEnter(other)],
        };
        Self {
            calls,
            entry: Some((kind, pair)),
        }
    }

    fn collision_stay(collision: Collision) -> Self {
        let other = collision.swapped();
        Self {
            calls: [Dispatch::CollisionStay(collision), Dispatch::CollisionStay(other)],
            entry: None,
        }
    }

    fn trigger(kind: EventKind, pair: HandlePair) -> Self {
        log::trace!("{kind} {pair}");
        let flipped = HandlePair::new(pair.second, pair.first);
        let calls = match kind {
            EventKind::TriggerExit => [Dispatch::TriggerExit(pair), Dispatch::TriggerExit(flipped)],
            _ => [Dispatch::TriggerEnter(pair), Dispatch::TriggerEnter(flipped)],
        };
        Self {
            calls,
            entry: Some((kind, pair)),
        }
    }

    fn trigger_stay(pair: HandlePair) -> Self {
        Self {
            calls: [
                Dispatch::TriggerStay(pair),
                Dispatch::TriggerStay(HandlePair::new(pair.second, pair.first)),
            ],
            entry: None,
        }
    }

    /// The two bodies, in report order.
    pub fn pair(&self) -> HandlePair {
        HandlePair::new(self.calls[0].target(), self.calls[0].counterpart())
    }
}

/// Per-step counts produced by [`EventCollector::drain`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Pairs that stayed in contact or inside a trigger.
    pub stay_events: u32,
    /// Reports dropped because an actor could not be resolved.
    pub dropped_reports: u32,
}

// ── EventCollector ────────────────────────────────────────────────

/// Transitions of one pair within a step, in report order. Starts with an
/// enter.
type Chain<T> = SmallVec<[(EventKind, T); 1]>;

/// Per-step report accumulators plus the set of active trigger pairs.
#[derive(Debug, Default)]
pub struct EventCollector {
    removed_collisions: Vec<Collision>,
    new_collisions: Vec<Chain<Collision>>,
    persisting_collisions: Vec<Collision>,
    lost_triggers: Vec<HandlePair>,
    new_triggers: Vec<Chain<HandlePair>>,
    /// Canonical trigger pairs currently overlapping, across steps.
    active_triggers: IndexSet<HandlePair>,
    diagnostics: Vec<BackendDiagnostic>,
    dropped_reports: u32,
}

impl EventCollector {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// A report sink for one simulate call.
    pub fn intake<'a>(&'a mut self, registry: &'a BodyRegistry) -> ReportIntake<'a> {
        ReportIntake {
            registry,
            collector: self,
        }
    }

    /// Records waiting for dispatch.
    pub fn pending(&self) -> usize {
        self.removed_collisions.len()
            + self.new_collisions.iter().map(|c| c.len()).sum::<usize>()
            + self.persisting_collisions.len()
            + self.lost_triggers.len()
            + self.new_triggers.iter().map(|c| c.len()).sum::<usize>()
    }

    /// Trigger pairs currently overlapping, in the order they entered.
    pub fn active_triggers(&self) -> impl Iterator<Item = HandlePair> + '_ {
        self.active_triggers.iter().copied()
    }

    /// Drop every pending record and active trigger pair mentioning
    /// `body`. Returns how many pending records were dropped.
    pub fn purge(&mut self, body: BodyHandle) -> usize {
        let before = self.pending();
        let involved = |c: &Collision| c.this_body == body || c.other_body == body;
        self.removed_collisions.retain(|c| !involved(c));
        self.persisting_collisions.retain(|c| !involved(c));
        self.new_collisions.retain(|chain| !involved(&chain[0].1));
        self.lost_triggers.retain(|p| !p.contains(body));
        self.new_triggers.retain(|chain| !chain[0].1.contains(body));
        self.active_triggers.retain(|p| !p.contains(body));
        before - self.pending()
    }

    /// Discard this step's accumulators and diagnostics. Active trigger
    /// pairs survive.
    pub fn discard_step(&mut self) {
        self.removed_collisions.clear();
        self.new_collisions.clear();
        self.persisting_collisions.clear();
        self.lost_triggers.clear();
        self.new_triggers.clear();
        self.diagnostics.clear();
        self.dropped_reports = 0;
    }

    /// Forget everything, including active trigger pairs.
    pub fn reset(&mut self) {
        self.discard_step();
        self.active_triggers.clear();
    }

    /// Backend diagnostics captured during the step.
    pub fn take_diagnostics(&mut self) -> Vec<BackendDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Turn this step's accumulators into deliveries, collisions first.
    ///
    /// Every accumulator is empty afterwards.
    pub fn drain(&mut self, out: &mut Vec<Delivery>) -> DrainSummary {
        let mut stay_events = 0;

        for c in self.removed_collisions.drain(..) {
            out.push(Delivery::collision(EventKind::CollisionExit, c));
        }
        for chain in self.new_collisions.drain(..) {
            for (kind, c) in chain {
                out.push(Delivery::collision(kind, c));
            }
        }
        for c in self.persisting_collisions.drain(..) {
            out.push(Delivery::collision_stay(c));
            stay_events += 1;
        }

        // Pairs active before this step with no transition in it.
        let staying: Vec<HandlePair> = self
            .active_triggers
            .iter()
            .copied()
            .filter(|p| {
                !self.lost_triggers.iter().any(|l| l.same_bodies(p))
                    && !self.new_triggers.iter().any(|chain| chain[0].1.same_bodies(p))
            })
            .collect();

        for p in self.lost_triggers.drain(..) {
            self.active_triggers.shift_remove(&p.canonical());
            out.push(Delivery::trigger(EventKind::TriggerExit, p));
        }
        for chain in self.new_triggers.drain(..) {
            for (kind, p) in chain {
                if kind == EventKind::TriggerEnter {
                    self.active_triggers.insert(p.canonical());
                } else {
                    self.active_triggers.shift_remove(&p.canonical());
                }
                out.push(Delivery::trigger(kind, p));
            }
        }
        for p in staying {
            out.push(Delivery::trigger_stay(p));
            stay_events += 1;
        }

        let summary = DrainSummary {
            stay_events,
            dropped_reports: self.dropped_reports,
        };
        self.dropped_reports = 0;
        summary
    }
}

// ── ReportIntake ──────────────────────────────────────────────────

/// [`SimulationEvents`] sink for one simulate call.
pub struct ReportIntake<'a> {
    registry: &'a BodyRegistry,
    collector: &'a mut EventCollector,
}

impl ReportIntake<'_> {
    fn resolve(&mut self, a: ActorKey, b: ActorKey) -> Option<(BodyHandle, BodyHandle)> {
        match (self.registry.resolve(a), self.registry.resolve(b)) {
            (Some(ha), Some(hb)) => Some((ha, hb)),
            _ => {
                log::trace!("dropping report for unresolved pair ({a}, {b})");
                self.collector.dropped_reports += 1;
                None
            }
        }
    }
}

/// Append `item` to the chain already open for its pair, if any.
fn extend_chain<T>(
    chains: &mut [Chain<T>],
    pair: &HandlePair,
    pair_of: impl Fn(&T) -> HandlePair,
    kind: EventKind,
    item: T,
) -> Result<(), T> {
    match chains.iter_mut().find(|chain| pair_of(&chain[0].1).same_bodies(pair)) {
        Some(chain) => {
            chain.push((kind, item));
            Ok(())
        }
        None => Err(item),
    }
}

impl SimulationEvents for ReportIntake<'_> {
    fn on_contact(&mut self, report: ContactReport) {
        let Some((this, other)) = self.resolve(report.actors[0], report.actors[1]) else {
            return;
        };
        let [this_velocity, other_velocity] = report.post_velocities.unwrap_or([Vec3::ZERO; 2]);
        let collision = Collision {
            this_body: this,
            other_body: other,
            impulse: report.impulse,
            this_velocity,
            other_velocity,
            contacts: report.contacts,
        };
        let pair = collision.pair();
        let c = &mut *self.collector;
        let kind = match report.transition {
            TouchTransition::Persists => {
                c.persisting_collisions.push(collision);
                return;
            }
            TouchTransition::Found => EventKind::CollisionEnter,
            TouchTransition::Lost => EventKind::CollisionExit,
        };
        if let Err(collision) = extend_chain(&mut c.new_collisions, &pair, Collision::pair, kind, collision) {
            match kind {
                EventKind::CollisionEnter => c.new_collisions.push(smallvec![(kind, collision)]),
                _ => c.removed_collisions.push(collision),
            }
        }
    }

    fn on_trigger(&mut self, report: TriggerReport) {
        let Some((trigger, other)) = self.resolve(report.trigger, report.other) else {
            return;
        };
        let pair = HandlePair::new(trigger, other);
        let c = &mut *self.collector;
        let kind = match report.transition {
            TriggerTransition::Entered => EventKind::TriggerEnter,
            TriggerTransition::Exited => EventKind::TriggerExit,
        };
        if let Err(pair) = extend_chain(&mut c.new_triggers, &pair, |p| *p, kind, pair) {
            match kind {
                EventKind::TriggerEnter => c.new_triggers.push(smallvec![(kind, pair)]),
                _ => c.lost_triggers.push(pair),
            }
        }
    }

    fn on_backend_error(&mut self, diagnostic: BackendDiagnostic) {
        self.collector.diagnostics.push(diagnostic);
    }
}
