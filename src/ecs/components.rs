//! Common ECS components

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Local pose relative to the parent (or the world, for roots).
///
/// Authoritative transform, written by gameplay and tools. Rotation is
/// euler angles in radians, applied Z then Y then X (see [`LocalTransform::matrix`]).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LocalTransform {
    /// Position relative to the parent
    pub position: Vec3,
    /// Euler rotation in radians
    pub rotation: Vec3,
    /// Scale factor
    pub scale: Vec3,
}

impl LocalTransform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and euler rotation
    pub fn from_position_rotation(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local matrix: `translate * rotateZ * rotateY * rotateX * scale`
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Add euler angles (in radians)
    pub fn rotate_euler(&mut self, euler: Vec3) {
        self.rotation += euler;
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// World-space transform, derived from the hierarchy by propagation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    /// World-space transformation matrix
    pub matrix: Mat4,
    /// Translation decomposed from `matrix`
    pub position: Vec3,
    /// Euler rotation decomposed from `matrix`
    pub rotation: Vec3,
    /// Per-axis scale decomposed from `matrix`
    pub scale: Vec3,
}

impl WorldTransform {
    /// Transform a point from local to world space
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// Transform a direction vector (ignores translation)
    #[must_use]
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.matrix.transform_vector3(direction)
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Velocity component, integrated by the movement system
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    /// Units per second
    pub linear: Vec3,
    /// Euler radians per second
    pub angular: Vec3,
}

/// Local-space bounds used by spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spatial {
    pub bounding_min: Vec3,
    pub bounding_max: Vec3,
    /// Layers this entity belongs to
    pub layer_mask: u32,
    /// Set whenever the owning transform changes
    pub dirty: bool,
}

impl Spatial {
    /// Axis-aligned bounds with the default layer
    pub fn new(bounding_min: Vec3, bounding_max: Vec3) -> Self {
        Self {
            bounding_min,
            bounding_max,
            ..Default::default()
        }
    }

    /// Builder-style layer override
    #[must_use]
    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }
}

impl Default for Spatial {
    fn default() -> Self {
        Self {
            bounding_min: Vec3::splat(-0.5),
            bounding_max: Vec3::splat(0.5),
            layer_mask: 1,
            dirty: true,
        }
    }
}

/// Human-facing entity metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    pub name: String,
    pub visible: bool,
    pub is_static: bool,
    pub layer: u32,
}

impl SceneEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Default for SceneEntity {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible: true,
            is_static: false,
            layer: 0,
        }
    }
}

/// Perspective camera. View and projection are refreshed by the
/// `CameraTransformUpdate` observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Point the camera looks at
    pub target: Vec3,
    pub up: Vec3,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
}

impl Camera {
    /// Recompute view and projection for a camera at `position`
    pub fn refresh(&mut self, position: Vec3) {
        self.view_matrix = Mat4::look_at_rh(position, self.target, self.up);
        self.projection_matrix = Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );
    }

    /// Set aspect ratio from a viewport size
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect_ratio = width as f32 / height.max(1) as f32;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 45.0,
            aspect_ratio: 16.0 / 9.0,
            near_plane: 0.1,
            far_plane: 100.0,
            target: Vec3::ZERO,
            up: Vec3::Y,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        }
    }
}

/// Tag: spin around Y at one radian per second while simulating
#[derive(Debug, Clone, Copy, Default)]
pub struct Rotating;

/// Tag: top-level scene entity
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneRoot;

/// Tag: the camera used for rendering. At most one entity carries it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveCamera;
