//! Per-step performance metrics for the physics world.
//!
//! [`StepMetrics`] captures timing, event counts, and scratch usage for a
//! single [`update`](crate::PhysicsWorld::update).

use torque_core::StepId;

/// Timing, event, and memory metrics collected during a single step.
///
/// All durations are in microseconds. Event counts are per transition,
/// not per hook call: one collision enter counts once even though both
/// bodies' listeners run.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Wall-clock time for the whole update, in microseconds.
    pub total_us: u64,
    /// Time inside the backend's simulate call, in microseconds.
    pub simulate_us: u64,
    /// Time spent building the dispatch list and running hooks, in
    /// microseconds.
    pub dispatch_us: u64,
    /// Collision pairs that started touching.
    pub collision_enter_events: u32,
    /// Collision pairs that stopped touching.
    pub collision_exit_events: u32,
    /// Trigger pairs entered.
    pub trigger_enter_events: u32,
    /// Trigger pairs exited.
    pub trigger_exit_events: u32,
    /// Collision and trigger pairs that stayed in contact.
    pub stay_events: u32,
    /// Backend reports naming an actor the world no longer knows.
    pub dropped_reports: u32,
    /// Backend diagnostics forwarded to the log sink.
    pub backend_errors: u32,
    /// Scratch memory committed after the step, in bytes.
    pub scratch_committed_bytes: usize,
    /// Scratch memory handed out during the step, in bytes.
    pub scratch_used_bytes: usize,
}

impl StepMetrics {
    /// Enter and exit transitions of every kind.
    pub fn transition_events(&self) -> u32 {
        self.collision_enter_events
            + self.collision_exit_events
            + self.trigger_enter_events
            + self.trigger_exit_events
    }
}

/// Outcome of a successful [`update`](crate::PhysicsWorld::update).
#[derive(Clone, Debug)]
pub struct StepReport {
    /// The step that just completed. The first update reports step 1.
    pub step: StepId,
    /// Simulated step length in seconds.
    pub dt: f32,
    /// Metrics for this step.
    pub metrics: StepMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.simulate_us, 0);
        assert_eq!(m.dispatch_us, 0);
        assert_eq!(m.transition_events(), 0);
        assert_eq!(m.stay_events, 0);
        assert_eq!(m.dropped_reports, 0);
        assert_eq!(m.backend_errors, 0);
        assert_eq!(m.scratch_committed_bytes, 0);
        assert_eq!(m.scratch_used_bytes, 0);
    }

    #[test]
    fn transition_events_sums_every_kind() {
        let m = StepMetrics {
            collision_enter_events: 3,
            collision_exit_events: 1,
            trigger_enter_events: 2,
            trigger_exit_events: 4,
            stay_events: 7,
            ..StepMetrics::default()
        };
        assert_eq!(m.transition_events(), 10);
    }
}
