//! Application hooks: per-body contact listeners and the world log sink.
//!
//! Hooks are sugar over the handle-pair queues. Every transition that
//! reaches a listener also lands in the matching queue, whether or not
//! the body has a listener attached.

use std::fmt;
use std::sync::Arc;

use torque_core::{BodyHandle, Collision};

// ── BodyListener ──────────────────────────────────────────────────

/// Contact and trigger callbacks for one body.
///
/// Every method defaults to a no-op. Collision records are framed for the
/// receiving body, so `collision.this_body` is always the body the
/// listener is attached to. Trigger callbacks receive `(this, other)` in
/// the same sense.
///
/// Callbacks run after the step has released the scene write lock, so a
/// listener may read poses, run queries, or add and remove bodies. It must
/// not call [`update`](crate::PhysicsWorld::update): the step is still in
/// progress and the step gate is not reentrant.
#[allow(unused_variables)]
pub trait BodyListener: Send + Sync {
    /// This body started touching `collision.other_body`.
    fn on_collision_enter(&self, collision: &Collision) {}

    /// This body stopped touching `collision.other_body`.
    fn on_collision_exit(&self, collision: &Collision) {}

    /// This body is still touching `collision.other_body`.
    fn on_collision_stay(&self, collision: &Collision) {}

    /// `other` entered a trigger pair with this body.
    fn on_trigger_enter(&self, this: BodyHandle, other: BodyHandle) {}

    /// `other` left a trigger pair with this body.
    fn on_trigger_exit(&self, this: BodyHandle, other: BodyHandle) {}

    /// `other` remains inside a trigger pair with this body.
    fn on_trigger_stay(&self, this: BodyHandle, other: BodyHandle) {}
}

type CollisionFn = Box<dyn Fn(&Collision) + Send + Sync>;
type TriggerFn = Box<dyn Fn(BodyHandle, BodyHandle) + Send + Sync>;

/// A [`BodyListener`] assembled from closures.
///
/// ```ignore
/// let listener = FnListener::new()
///     .with_collision_enter(|c| println!("{} hit {}", c.this_body, c.other_body))
///     .into_shared();
/// world.add_body(BodyHandle(1), desc, Some(listener))?;
/// ```
#[derive(Default)]
pub struct FnListener {
    collision_enter: Option<CollisionFn>,
    collision_exit: Option<CollisionFn>,
    collision_stay: Option<CollisionFn>,
    trigger_enter: Option<TriggerFn>,
    trigger_exit: Option<TriggerFn>,
    trigger_stay: Option<TriggerFn>,
}

impl FnListener {
    /// A listener with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on collision enter.
    pub fn with_collision_enter(mut self, f: impl Fn(&Collision) + Send + Sync + 'static) -> Self {
        self.collision_enter = Some(Box::new(f));
        self
    }

    /// Run `f` on collision exit.
    pub fn with_collision_exit(mut self, f: impl Fn(&Collision) + Send + Sync + 'static) -> Self {
        self.collision_exit = Some(Box::new(f));
        self
    }

    /// Run `f` on collision stay.
    pub fn with_collision_stay(mut self, f: impl Fn(&Collision) + Send + Sync + 'static) -> Self {
        self.collision_stay = Some(Box::new(f));
        self
    }

    /// Run `f` on trigger enter.
    pub fn with_trigger_enter(
        mut self,
        f: impl Fn(BodyHandle, BodyHandle) + Send + Sync + 'static,
    ) -> Self {
        self.trigger_enter = Some(Box::new(f));
        self
    }

    /// Run `f` on trigger exit.
    pub fn with_trigger_exit(
        mut self,
        f: impl Fn(BodyHandle, BodyHandle) + Send + Sync + 'static,
    ) -> Self {
        self.trigger_exit = Some(Box::new(f));
        self
    }

    /// Run `f` on trigger stay.
    pub fn with_trigger_stay(
        mut self,
        f: impl Fn(BodyHandle, BodyHandle) + Send + Sync + 'static,
    ) -> Self {
        self.trigger_stay = Some(Box::new(f));
        self
    }

    /// Wrap in the shared pointer [`PhysicsWorld::add_body`](crate::PhysicsWorld::add_body)
    /// takes.
    pub fn into_shared(self) -> Arc<dyn BodyListener> {
        Arc::new(self)
    }
}

impl BodyListener for FnListener {
    fn on_collision_enter(&self, collision: &Collision) {
        if let Some(f) = &self.collision_enter {
            f(collision);
        }
    }

    fn on_collision_exit(&self, collision: &Collision) {
        if let Some(f) = &self.collision_exit {
            f(collision);
        }
    }

    fn on_collision_stay(&self, collision: &Collision) {
        if let Some(f) = &self.collision_stay {
            f(collision);
        }
    }

    fn on_trigger_enter(&self, this: BodyHandle, other: BodyHandle) {
        if let Some(f) = &self.trigger_enter {
            f(this, other);
        }
    }

    fn on_trigger_exit(&self, this: BodyHandle, other: BodyHandle) {
        if let Some(f) = &self.trigger_exit {
            f(this, other);
        }
    }

    fn on_trigger_stay(&self, this: BodyHandle, other: BodyHandle) {
        if let Some(f) = &self.trigger_stay {
            f(this, other);
        }
    }
}

impl fmt::Debug for FnListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener")
            .field("collision_enter", &self.collision_enter.is_some())
            .field("collision_exit", &self.collision_exit.is_some())
            .field("collision_stay", &self.collision_stay.is_some())
            .field("trigger_enter", &self.trigger_enter.is_some())
            .field("trigger_exit", &self.trigger_exit.is_some())
            .field("trigger_stay", &self.trigger_stay.is_some())
            .finish()
    }
}

// ── LogSink ───────────────────────────────────────────────────────

/// Destination for world messages and backend errors.
pub trait LogSink: Send + Sync {
    /// An informational message.
    fn message(&self, text: &str);

    /// An error: failed initialisation or a backend diagnostic.
    fn error(&self, text: &str);
}

/// Forwards to the `log` facade under the `torque` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn message(&self, text: &str) {
        log::info!(target: "torque", "{text}");
    }

    fn error(&self, text: &str) {
        if text.is_empty() {
            log::error!(target: "torque", "backend error");
        } else {
            log::error!(target: "torque", "{text}");
        }
    }
}
