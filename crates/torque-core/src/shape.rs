//! Collider shapes, materials, and body descriptors.
//!
//! [`ColliderShape`] is a closed set of geometry kinds matched exhaustively
//! by each backend when it builds native geometry.

use crate::error::BackendError;
use crate::geometry;
use crate::math::{Aabb, Pose, Vec3};

// ── ColliderShape ─────────────────────────────────────────────────

/// Geometry attached to a body or used as a query volume.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    /// Oriented box given by its half extents.
    Box {
        /// Half size along each local axis.
        half_extents: Vec3,
    },
    /// Sphere centred on the body origin.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },
    /// Capsule aligned with the local Y axis.
    Capsule {
        /// Radius of the hemispherical caps and cylinder.
        radius: f32,
        /// Half length of the cylindrical section.
        half_height: f32,
    },
    /// Infinite half-space `dot(normal, p) <= distance`. Static bodies only.
    Plane {
        /// Outward plane normal.
        normal: Vec3,
        /// Signed distance of the plane from the origin along `normal`.
        distance: f32,
    },
    /// Convex hull of a point cloud.
    ConvexMesh {
        /// Hull input points in local space.
        vertices: Vec<Vec3>,
    },
    /// Triangle soup. Static or kinematic bodies only.
    TriangleMesh {
        /// Vertex positions in local space.
        vertices: Vec<Vec3>,
        /// Triangle vertex indices.
        indices: Vec<[u32; 3]>,
    },
}

impl ColliderShape {
    /// Box shape from full side lengths.
    pub fn cuboid(x: f32, y: f32, z: f32) -> Self {
        Self::Box {
            half_extents: Vec3::new(x * 0.5, y * 0.5, z * 0.5),
        }
    }

    /// Sphere shape.
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Capsule from radius and total cylinder height.
    pub fn capsule(radius: f32, height: f32) -> Self {
        Self::Capsule {
            radius,
            half_height: height * 0.5,
        }
    }

    /// Box shape covering `bounds`, plus the centre the body must be placed
    /// at for the box to line up with them.
    pub fn from_bounds(bounds: &Aabb) -> (Self, Vec3) {
        (
            Self::Box {
                half_extents: bounds.half_extents(),
            },
            bounds.center(),
        )
    }

    /// Short name used in log lines and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Plane { .. } => "plane",
            Self::ConvexMesh { .. } => "convex mesh",
            Self::TriangleMesh { .. } => "triangle mesh",
        }
    }

    /// Reject degenerate geometry before it reaches the backend.
    pub fn validate(&self) -> Result<(), BackendError> {
        let invalid = |reason: String| Err(BackendError::InvalidShape { reason });
        match self {
            Self::Box { half_extents } => {
                if !half_extents.is_finite()
                    || half_extents.x <= 0.0
                    || half_extents.y <= 0.0
                    || half_extents.z <= 0.0
                {
                    return invalid(format!("box half extents must be positive, got {half_extents:?}"));
                }
            }
            Self::Sphere { radius } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return invalid(format!("sphere radius must be positive, got {radius}"));
                }
            }
            Self::Capsule {
                radius,
                half_height,
            } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return invalid(format!("capsule radius must be positive, got {radius}"));
                }
                if !half_height.is_finite() || *half_height < 0.0 {
                    return invalid(format!(
                        "capsule half height must be non-negative, got {half_height}"
                    ));
                }
            }
            Self::Plane { normal, distance } => {
                if normal.try_normalize().is_none() || !distance.is_finite() {
                    return invalid("plane needs a non-zero normal and finite distance".into());
                }
            }
            Self::ConvexMesh { vertices } => {
                if vertices.len() < 4 {
                    return invalid(format!(
                        "convex mesh needs at least 4 points, got {}",
                        vertices.len()
                    ));
                }
            }
            Self::TriangleMesh { vertices, indices } => {
                if indices.is_empty() {
                    return invalid("triangle mesh has no triangles".into());
                }
                let n = vertices.len();
                if let Some(tri) = indices.iter().find(|t| t.iter().any(|&i| i as usize >= n)) {
                    return invalid(format!(
                        "triangle {tri:?} indexes past {n} vertices"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Local-space bounds, or `None` for planes and degenerate geometry.
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.world_bounds(&Pose::IDENTITY)
    }

    /// World-space bounds at `pose`, or `None` for planes and degenerate
    /// geometry.
    pub fn world_bounds(&self, pose: &Pose) -> Option<Aabb> {
        geometry::world_bounds(self, pose)
    }
}

// ── Body description ──────────────────────────────────────────────

/// Simulation behaviour of a rigid body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Immovable. Never affected by gravity or contacts.
    Static,
    /// Fully simulated.
    Dynamic,
    /// Moved only by explicit pose writes; pushes dynamic bodies.
    Kinematic,
}

/// Surface material coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialDesc {
    /// Static friction coefficient. Default: 0.8.
    pub static_friction: f32,
    /// Dynamic friction coefficient. Default: 0.8.
    pub dynamic_friction: f32,
    /// Restitution (bounciness). Default: 0.6.
    pub restitution: f32,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            static_friction: 0.8,
            dynamic_friction: 0.8,
            restitution: 0.6,
        }
    }
}

/// Collision filtering bits.
///
/// Two shapes interact when each one's `group` intersects the other's
/// `mask`. The default interacts with everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterData {
    /// Groups this shape belongs to.
    pub group: u32,
    /// Groups this shape interacts with.
    pub mask: u32,
}

impl FilterData {
    /// Interacts with every group.
    pub const ALL: FilterData = FilterData {
        group: u32::MAX,
        mask: u32::MAX,
    };

    /// `true` if shapes carrying `self` and `other` should interact.
    pub fn interacts_with(&self, other: &FilterData) -> bool {
        (self.group & other.mask) != 0 && (other.group & self.mask) != 0
    }
}

impl Default for FilterData {
    fn default() -> Self {
        Self::ALL
    }
}

/// Everything a backend needs to create one actor with one shape.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDesc {
    /// Simulation behaviour.
    pub kind: BodyKind,
    /// Initial world pose.
    pub pose: Pose,
    /// Attached geometry.
    pub shape: ColliderShape,
    /// Surface material.
    pub material: MaterialDesc,
    /// Mass in kilograms. Ignored for static bodies. Default: 1.
    pub mass: f32,
    /// Trigger shapes report overlap transitions and never generate contacts.
    pub is_trigger: bool,
    /// Collision filtering.
    pub filter: FilterData,
    /// Whether gravity applies. Always `false` for static bodies.
    pub use_gravity: bool,
}

impl BodyDesc {
    /// A body of `kind` at the origin with default material and unit mass.
    pub fn new(kind: BodyKind, shape: ColliderShape) -> Self {
        Self {
            kind,
            pose: Pose::IDENTITY,
            shape,
            material: MaterialDesc::default(),
            mass: 1.0,
            is_trigger: false,
            filter: FilterData::ALL,
            use_gravity: kind == BodyKind::Dynamic,
        }
    }

    /// Shorthand for a static body.
    pub fn fixed(shape: ColliderShape) -> Self {
        Self::new(BodyKind::Static, shape)
    }

    /// Shorthand for a dynamic body.
    pub fn dynamic(shape: ColliderShape) -> Self {
        Self::new(BodyKind::Dynamic, shape)
    }

    /// Shorthand for a kinematic body.
    pub fn kinematic(shape: ColliderShape) -> Self {
        Self::new(BodyKind::Kinematic, shape)
    }

    /// Place the body at `position`.
    pub fn at(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    /// Set the full initial pose.
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Set the mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set the surface material.
    pub fn with_material(mut self, material: MaterialDesc) -> Self {
        self.material = material;
        self
    }

    /// Set collision filtering.
    pub fn with_filter(mut self, filter: FilterData) -> Self {
        self.filter = filter;
        self
    }

    /// Make the shape a trigger volume.
    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Disable gravity for this body.
    pub fn without_gravity(mut self) -> Self {
        self.use_gravity = false;
        self
    }

    /// Check the descriptor for combinations no backend accepts.
    pub fn validate(&self) -> Result<(), BackendError> {
        self.shape.validate()?;
        if !self.pose.position.is_finite() {
            return Err(BackendError::InvalidShape {
                reason: format!("non-finite position {:?}", self.pose.position),
            });
        }
        if self.kind == BodyKind::Dynamic {
            if !self.mass.is_finite() || self.mass <= 0.0 {
                return Err(BackendError::InvalidMass { mass: self.mass });
            }
            if matches!(
                self.shape,
                ColliderShape::Plane { .. } | ColliderShape::TriangleMesh { .. }
            ) {
                return Err(BackendError::InvalidShape {
                    reason: format!("{} cannot be attached to a dynamic body", self.shape.kind_name()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[test]
    fn material_defaults() {
        let m = MaterialDesc::default();
        assert_eq!(m.static_friction, 0.8);
        assert_eq!(m.dynamic_friction, 0.8);
        assert_eq!(m.restitution, 0.6);
    }

    #[test]
    fn static_bodies_ignore_gravity() {
        assert!(!BodyDesc::fixed(ColliderShape::sphere(1.0)).use_gravity);
        assert!(BodyDesc::dynamic(ColliderShape::sphere(1.0)).use_gravity);
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        assert!(ColliderShape::sphere(0.0).validate().is_err());
        assert!(ColliderShape::cuboid(1.0, -1.0, 1.0).validate().is_err());
        assert!(ColliderShape::Plane {
            normal: Vec3::ZERO,
            distance: 0.0
        }
        .validate()
        .is_err());
        let bad_mesh = ColliderShape::TriangleMesh {
            vertices: vec![Vec3::ZERO; 3],
            indices: vec![[0, 1, 3]],
        };
        assert!(matches!(
            bad_mesh.validate(),
            Err(BackendError::InvalidShape { .. })
        ));
    }

    #[test]
    fn dynamic_planes_are_rejected() {
        let plane = ColliderShape::Plane {
            normal: Vec3::Y,
            distance: 0.0,
        };
        assert!(BodyDesc::fixed(plane.clone()).validate().is_ok());
        assert!(BodyDesc::dynamic(plane).validate().is_err());
        assert!(matches!(
            BodyDesc::dynamic(ColliderShape::sphere(1.0)).with_mass(0.0).validate(),
            Err(BackendError::InvalidMass { .. })
        ));
    }

    #[test]
    fn rotated_box_bounds_grow() {
        let shape = ColliderShape::cuboid(2.0, 2.0, 2.0);
        let pose = Pose::new(
            Vec3::new(5.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_4),
        );
        let bounds = shape.world_bounds(&pose).unwrap();
        assert!((bounds.half_extents().x - 2f32.sqrt()).abs() < 1e-5);
        assert!((bounds.half_extents().y - 1.0).abs() < 1e-5);
        assert!((bounds.center().x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn mesh_bounds_cover_every_vertex() {
        let hull = ColliderShape::ConvexMesh {
            vertices: vec![
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 3.0, 0.0),
                Vec3::new(0.0, 0.0, -4.0),
            ],
        };
        let b = hull.local_bounds().unwrap();
        assert!(b.min.abs_diff_eq(Vec3::new(-1.0, 0.0, -4.0), 1e-5));
        assert!(b.max.abs_diff_eq(Vec3::new(2.0, 3.0, 0.0), 1e-5));
        let plane = ColliderShape::Plane {
            normal: Vec3::Y,
            distance: 0.0,
        };
        assert_eq!(plane.local_bounds(), None);
    }

    #[test]
    fn from_bounds_centres_the_box() {
        let bounds = Aabb {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(2.0, 4.0, 6.0),
        };
        let (shape, center) = ColliderShape::from_bounds(&bounds);
        assert_eq!(center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            shape,
            ColliderShape::Box {
                half_extents: Vec3::new(1.0, 2.0, 3.0)
            }
        );
    }

    #[test]
    fn filter_requires_both_directions() {
        let a = FilterData { group: 0b01, mask: 0b10 };
        let b = FilterData { group: 0b10, mask: 0b01 };
        let c = FilterData { group: 0b10, mask: 0b10 };
        assert!(a.interacts_with(&b));
        assert!(!a.interacts_with(&c));
    }
}
