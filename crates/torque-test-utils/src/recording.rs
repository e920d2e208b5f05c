//! Listeners and log sinks that record what they receive.

use std::sync::{Arc, Mutex, PoisonError};

use torque_core::{BodyHandle, Collision};
use torque_engine::{BodyListener, LogSink};

/// One hook invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Hook {
    CollisionEnter(Collision),
    CollisionExit(Collision),
    CollisionStay(Collision),
    TriggerEnter { this: BodyHandle, other: BodyHandle },
    TriggerExit { this: BodyHandle, other: BodyHandle },
    TriggerStay { this: BodyHandle, other: BodyHandle },
}

impl Hook {
    /// The body whose hook ran.
    pub fn receiver(&self) -> BodyHandle {
        match self {
            Hook::CollisionEnter(c) | Hook::CollisionExit(c) | Hook::CollisionStay(c) => c.this_body,
            Hook::TriggerEnter { this, .. }
            | Hook::TriggerExit { this, .. }
            | Hook::TriggerStay { this, .. } => *this,
        }
    }

    /// The partner body.
    pub fn other(&self) -> BodyHandle {
        match self {
            Hook::CollisionEnter(c) | Hook::CollisionExit(c) | Hook::CollisionStay(c) => {
                c.other_body
            }
            Hook::TriggerEnter { other, .. }
            | Hook::TriggerExit { other, .. }
            | Hook::TriggerStay { other, .. } => *other,
        }
    }

    pub fn is_stay(&self) -> bool {
        matches!(
            self,
            Hook::CollisionStay(_) | Hook::TriggerStay { .. }
        )
    }

    /// Short label, e.g. `"collision enter"`.
    pub fn label(&self) -> &'static str {
        match self {
            Hook::CollisionEnter(_) => "collision enter",
            Hook::CollisionExit(_) => "collision exit",
            Hook::CollisionStay(_) => "collision stay",
            Hook::TriggerEnter { .. } => "trigger enter",
            Hook::TriggerExit { .. } => "trigger exit",
            Hook::TriggerStay { .. } => "trigger stay",
        }
    }
}

/// Records every hook call into a log that clones share.
///
/// Attach clones of one recorder to several bodies to observe the global
/// delivery order across them.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    log: Arc<Mutex<Vec<Hook>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Arc<dyn BodyListener> {
        Arc::new(self.clone())
    }

    fn push(&self, hook: Hook) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(hook);
    }

    /// Snapshot of every call so far.
    pub fn hooks(&self) -> Vec<Hook> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Calls received by `body`, in order.
    pub fn hooks_for(&self, body: BodyHandle) -> Vec<Hook> {
        self.hooks()
            .into_iter()
            .filter(|h| h.receiver() == body)
            .collect()
    }

    /// `(label, receiver, other)` triples, handy for order assertions.
    pub fn labels(&self) -> Vec<(&'static str, u32, u32)> {
        self.hooks()
            .iter()
            .map(|h| (h.label(), h.receiver().0, h.other().0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl BodyListener for RecordingListener {
    fn on_collision_enter(&self, collision: &Collision) {
        self.push(Hook::CollisionEnter(collision.clone()));
    }

    fn on_collision_exit(&self, collision: &Collision) {
        self.push(Hook::CollisionExit(collision.clone()));
    }

    fn on_collision_stay(&self, collision: &Collision) {
        self.push(Hook::CollisionStay(collision.clone()));
    }

    fn on_trigger_enter(&self, this: BodyHandle, other: BodyHandle) {
        self.push(Hook::TriggerEnter { this, other });
    }

    fn on_trigger_exit(&self, this: BodyHandle, other: BodyHandle) {
        self.push(Hook::TriggerExit { this, other });
    }

    fn on_trigger_stay(&self, this: BodyHandle, other: BodyHandle) {
        self.push(Hook::TriggerStay { this, other });
    }
}

/// A [`LogSink`] that keeps messages and errors for inspection.
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    messages: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingLogSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for RecordingLogSink {
    fn message(&self, text: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
    }

    fn error(&self, text: &str) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
    }
}
