//! Raycast and overlap results in application terms.

use torque_core::{BodyHandle, Vec3};

/// One ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// The body hit.
    pub body: BodyHandle,
    /// Distance from the ray origin.
    pub distance: f32,
    /// World-space hit point.
    pub position: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// Every hit along a ray, nearest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RaycastInfo {
    /// Hits ordered by distance.
    pub hits: Vec<RayHit>,
}

impl RaycastInfo {
    /// Number of bodies hit.
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// `true` if anything was hit.
    pub fn is_hit(&self) -> bool {
        !self.hits.is_empty()
    }

    /// The closest hit.
    pub fn nearest(&self) -> Option<&RayHit> {
        self.hits.first()
    }

    /// Position of the closest hit.
    pub fn position(&self) -> Option<Vec3> {
        self.nearest().map(|h| h.position)
    }
}

/// Bodies overlapping a query shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlapInfo {
    /// Overlapping bodies, in backend order.
    pub bodies: Vec<BodyHandle>,
}

impl OverlapInfo {
    /// `true` if at least one body overlaps.
    pub fn is_overlapping(&self) -> bool {
        !self.bodies.is_empty()
    }

    /// Number of overlapping bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// `true` if nothing overlaps.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// `true` if `body` is among the overlapping bodies.
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains(&body)
    }
}
