//! Shape-vs-shape and ray-vs-shape queries on `parry3d`.
//!
//! These run without a scene: no broad phase, no backend. Useful for
//! gameplay checks between two known shapes and as the narrow phase of
//! backends that do not bring their own. Also home to the conversions
//! between the facade's `glam` types and parry's nalgebra types, which the
//! rapier backend shares.

use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::na::{Quaternion, Translation3, Unit, UnitQuaternion};
use parry3d::query::{self, Ray, RayCast};
use parry3d::shape::{Shape, SharedShape};

use crate::error::BackendError;
use crate::event::ContactPoint;
use crate::math::{Aabb, Pose, Quat, Vec3};
use crate::shape::ColliderShape;

// ── Conversions ───────────────────────────────────────────────────

/// `glam` vector to nalgebra vector.
pub fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

/// nalgebra vector to `glam` vector.
pub fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// `glam` vector to nalgebra point.
pub fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

/// nalgebra point to `glam` vector.
pub fn from_point(p: &Point<Real>) -> Vec3 {
    from_vector(&p.coords)
}

/// `glam` quaternion to a normalised nalgebra rotation.
pub fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

/// [`Pose`] to nalgebra isometry.
pub fn to_isometry(pose: &Pose) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::from(to_vector(pose.position)),
        to_rotation(pose.rotation),
    )
}

/// nalgebra isometry to [`Pose`].
pub fn from_isometry(iso: &Isometry<Real>) -> Pose {
    let r = iso.rotation;
    Pose::new(
        from_vector(&iso.translation.vector),
        Quat::from_xyzw(r.i, r.j, r.k, r.w),
    )
}

// ── Native shapes ─────────────────────────────────────────────────

/// Native geometry for `shape`, plus the local offset it needs on its
/// body. Planes become half-spaces shifted along their normal.
pub fn build_shape(shape: &ColliderShape) -> Result<(SharedShape, Vec3), BackendError> {
    shape.validate()?;
    let built = match shape {
        ColliderShape::Box { half_extents } => (
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            Vec3::ZERO,
        ),
        ColliderShape::Sphere { radius } => (SharedShape::ball(*radius), Vec3::ZERO),
        ColliderShape::Capsule {
            radius,
            half_height,
        } => (SharedShape::capsule_y(*half_height, *radius), Vec3::ZERO),
        ColliderShape::Plane { normal, distance } => {
            let n = normal.try_normalize().ok_or_else(|| BackendError::InvalidShape {
                reason: "plane normal is zero".into(),
            })?;
            (
                SharedShape::halfspace(Unit::new_normalize(to_vector(n))),
                n * *distance,
            )
        }
        ColliderShape::ConvexMesh { vertices } => {
            let points: Vec<Point<Real>> = vertices.iter().copied().map(to_point).collect();
            let hull = SharedShape::convex_hull(&points).ok_or_else(|| BackendError::InvalidShape {
                reason: "convex hull construction failed".into(),
            })?;
            (hull, Vec3::ZERO)
        }
        ColliderShape::TriangleMesh { vertices, indices } => {
            let points = vertices.iter().copied().map(to_point).collect();
            (SharedShape::trimesh(points, indices.clone()), Vec3::ZERO)
        }
    };
    Ok(built)
}

/// Native shape and its world isometry at `pose`, or `None` for
/// degenerate geometry.
pub fn place(shape: &ColliderShape, pose: &Pose) -> Option<(SharedShape, Isometry<Real>)> {
    let (native, offset) = build_shape(shape).ok()?;
    let placed = Pose::new(pose.transform_point(offset), pose.rotation);
    Some((native, to_isometry(&placed)))
}

/// World-space bounds of `shape` at `pose`. `None` for planes and
/// degenerate geometry.
pub fn world_bounds(shape: &ColliderShape, pose: &Pose) -> Option<Aabb> {
    if matches!(shape, ColliderShape::Plane { .. }) {
        return None;
    }
    let (native, iso) = place(shape, pose)?;
    let bounds = native.compute_aabb(&iso);
    Some(Aabb {
        min: from_point(&bounds.mins),
        max: from_point(&bounds.maxs),
    })
}

// ── Pair queries ──────────────────────────────────────────────────

/// `true` if the two placed shapes overlap or touch. Pairs parry cannot
/// test (two planes) never overlap.
pub fn shapes_overlap(
    a: &ColliderShape,
    pose_a: &Pose,
    b: &ColliderShape,
    pose_b: &Pose,
) -> bool {
    let (Some((sa, ia)), Some((sb, ib))) = (place(a, pose_a), place(b, pose_b)) else {
        return false;
    };
    query::intersection_test(&ia, &*sa, &ib, &*sb).unwrap_or(false)
}

/// A representative contact point for two overlapping shapes.
///
/// The point is midway between the deepest points of each shape and the
/// normal points from `b` towards `a`. Pairs parry has no contact
/// generator for fall back to the midpoint of the two poses.
pub fn contact_estimate(
    a: &ColliderShape,
    pose_a: &Pose,
    b: &ColliderShape,
    pose_b: &Pose,
) -> ContactPoint {
    let contact = match (place(a, pose_a), place(b, pose_b)) {
        (Some((sa, ia)), Some((sb, ib))) => {
            query::contact(&ia, &*sa, &ib, &*sb, 0.0).ok().flatten()
        }
        _ => None,
    };
    match contact {
        Some(c) => ContactPoint {
            position: (from_point(&c.point1) + from_point(&c.point2)) * 0.5,
            normal: -from_vector(&c.normal1),
            separation: c.dist,
        },
        None => ContactPoint {
            position: (pose_a.position + pose_b.position) * 0.5,
            normal: (pose_a.position - pose_b.position)
                .try_normalize()
                .unwrap_or(Vec3::Y),
            separation: 0.0,
        },
    }
}

// ── Rays ──────────────────────────────────────────────────────────

/// Cast a ray against one placed shape.
///
/// Returns the hit distance and surface normal, or `None` if the ray
/// misses within `max_distance`. A ray starting inside the shape hits at
/// distance zero with the normal facing back along the ray. `direction`
/// must be normalised.
pub fn ray_cast(
    shape: &ColliderShape,
    pose: &Pose,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<(f32, Vec3)> {
    let (native, iso) = place(shape, pose)?;
    let ray = Ray::new(to_point(origin), to_vector(direction));
    let hit = native.cast_ray_and_get_normal(&iso, &ray, max_distance, true)?;
    let normal = from_vector(&hit.normal).try_normalize().unwrap_or(-direction);
    Some((hit.toi, normal))
}
