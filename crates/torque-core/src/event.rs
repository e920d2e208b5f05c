//! Contact records, handle pairs, and the raw reports a backend emits
//! while it simulates.

use std::fmt;

use smallvec::SmallVec;

use crate::id::{ActorKey, BodyHandle};
use crate::math::Vec3;

// ── Contact data ──────────────────────────────────────────────────

/// One contact point of a touching pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContactPoint {
    /// World-space contact position.
    pub position: Vec3,
    /// Contact normal pointing from the other body towards this body.
    pub normal: Vec3,
    /// Signed separation. Negative values are penetration depth.
    pub separation: f32,
}

/// Inline storage for the handful of points a manifold usually carries.
pub type ContactPoints = SmallVec<[ContactPoint; 4]>;

/// A solid-contact transition as seen from one of the two bodies.
///
/// The record handed to a body's collision hooks is always framed for the
/// receiving body: `this_body` is the body whose hook runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Collision {
    /// The body receiving this record.
    pub this_body: BodyHandle,
    /// The body it touched.
    pub other_body: BodyHandle,
    /// Total impulse applied to `this_body` by the contact during the step.
    pub impulse: Vec3,
    /// Post-solve linear velocity of `this_body`.
    pub this_velocity: Vec3,
    /// Post-solve linear velocity of `other_body`.
    pub other_velocity: Vec3,
    /// Contact points, normals oriented towards `this_body`.
    pub contacts: ContactPoints,
}

impl Collision {
    /// Velocity of this body relative to the other one.
    pub fn relative_velocity(&self) -> Vec3 {
        self.this_velocity - self.other_velocity
    }

    /// The same contact seen from the other body.
    ///
    /// Swaps the bodies and their velocities. The impulse and contact
    /// normals flip sign because they are expressed relative to
    /// `this_body`.
    pub fn swapped(&self) -> Collision {
        Collision {
            this_body: self.other_body,
            other_body: self.this_body,
            impulse: -self.impulse,
            this_velocity: self.other_velocity,
            other_velocity: self.this_velocity,
            contacts: self
                .contacts
                .iter()
                .map(|c| ContactPoint {
                    normal: -c.normal,
                    ..*c
                })
                .collect(),
        }
    }

    /// The handle pair in report order.
    pub fn pair(&self) -> HandlePair {
        HandlePair::new(self.this_body, self.other_body)
    }
}

// ── HandlePair ────────────────────────────────────────────────────

/// Two application handles involved in one transition, in report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlePair {
    /// First body as reported.
    pub first: BodyHandle,
    /// Second body as reported.
    pub second: BodyHandle,
}

impl HandlePair {
    /// Construct a pair.
    pub const fn new(first: BodyHandle, second: BodyHandle) -> Self {
        Self { first, second }
    }

    /// `true` if either side is `body`.
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.first == body || self.second == body
    }

    /// The partner of `body`, or `None` if `body` is not in the pair.
    pub fn partner_of(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.first == body {
            Some(self.second)
        } else if self.second == body {
            Some(self.first)
        } else {
            None
        }
    }

    /// Same two bodies regardless of order.
    pub fn same_bodies(&self, other: &HandlePair) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }

    /// Order-independent form, smaller handle first.
    pub fn canonical(self) -> HandlePair {
        if self.first <= self.second {
            self
        } else {
            HandlePair::new(self.second, self.first)
        }
    }
}

impl fmt::Display for HandlePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

impl From<(BodyHandle, BodyHandle)> for HandlePair {
    fn from((a, b): (BodyHandle, BodyHandle)) -> Self {
        Self::new(a, b)
    }
}

/// The four transition kinds that have a handle-pair queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Two solid shapes started touching.
    CollisionEnter,
    /// Two solid shapes stopped touching.
    CollisionExit,
    /// A shape entered a trigger volume.
    TriggerEnter,
    /// A shape left a trigger volume.
    TriggerExit,
}

impl EventKind {
    /// All kinds, in dispatch order within a step.
    pub const ALL: [EventKind; 4] = [
        EventKind::CollisionExit,
        EventKind::CollisionEnter,
        EventKind::TriggerExit,
        EventKind::TriggerEnter,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CollisionEnter => "collision enter",
            Self::CollisionExit => "collision exit",
            Self::TriggerEnter => "trigger enter",
            Self::TriggerExit => "trigger exit",
        };
        f.write_str(name)
    }
}

// ── Raw backend reports ───────────────────────────────────────────

/// Touch state change of a solid-contact pair, derived from backend flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchTransition {
    /// The pair started touching this step.
    Found,
    /// The pair was already touching and still is.
    Persists,
    /// The pair stopped touching this step.
    Lost,
}

/// One solid-contact pair report, keyed by backend actor references.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactReport {
    /// The two actors, in backend order.
    pub actors: [ActorKey; 2],
    /// What happened to the pair this step.
    pub transition: TouchTransition,
    /// Total impulse applied to `actors[0]`.
    pub impulse: Vec3,
    /// Post-solve linear velocities of both actors. Backends omit this for
    /// lost pairs; missing velocities are treated as zero.
    pub post_velocities: Option<[Vec3; 2]>,
    /// Contact points, normals oriented towards `actors[0]`.
    pub contacts: ContactPoints,
}

impl ContactReport {
    /// A report with no impulse, velocities, or contact points.
    pub fn bare(a: ActorKey, b: ActorKey, transition: TouchTransition) -> Self {
        Self {
            actors: [a, b],
            transition,
            impulse: Vec3::ZERO,
            post_velocities: None,
            contacts: ContactPoints::new(),
        }
    }
}

/// Overlap state change between a trigger volume and another shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerTransition {
    /// The other shape entered the trigger.
    Entered,
    /// The other shape left the trigger.
    Exited,
}

/// One trigger-pair report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriggerReport {
    /// The actor owning the trigger shape.
    pub trigger: ActorKey,
    /// The actor that entered or left it.
    pub other: ActorKey,
    /// Enter or exit.
    pub transition: TriggerTransition,
}

/// Severity of a backend runtime diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticLevel {
    /// Informational notice.
    Info,
    /// Recoverable problem, e.g. a solver warning.
    Warning,
    /// Invalid input or internal failure. The step still completes.
    Error,
}

/// A runtime problem reported by the backend while it works.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendDiagnostic {
    /// Severity.
    pub level: DiagnosticLevel,
    /// Backend message. May be empty.
    pub message: String,
    /// Source location inside the backend, if known.
    pub location: Option<(String, u32)>,
}

impl BackendDiagnostic {
    /// An error-level diagnostic without a source location.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            location: None,
        }
    }
}

impl fmt::Display for BackendDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str("backend error")?;
        } else {
            f.write_str(&self.message)?;
        }
        if let Some((file, line)) = &self.location {
            write!(f, " in file: {file} in line: {line}")?;
        }
        Ok(())
    }
}
