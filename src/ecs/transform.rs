//! Transform propagation
//!
//! Keeps `WorldTransform` equal to the product of the ancestor chain's local
//! matrices. Propagation is reactive: it runs when an entity gains
//! `LocalTransform`/`WorldTransform` and on every `LocalTransform` write, then
//! marks each direct child's `LocalTransform` modified so the whole subtree
//! settles depth-first inside the same call.
//!
//! A parent without `WorldTransform` is ignored, so the child acts as a root.
//! In Play mode, dynamic physics bodies own their `WorldTransform`; they are
//! not recomputed but still cascade to their children.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use hecs::Entity;

use super::World;
use super::components::{LocalTransform, WorldTransform};
use crate::physics::{MotionType, RigidBody};

/// Scale below which rotation is not extracted from a matrix
const SCALE_EPSILON: f32 = 1e-6;

/// Decompose a world matrix. If any axis scale is below the epsilon the
/// rotation cannot be recovered and `fallback_rotation` is used instead.
pub fn decompose(matrix: Mat4, fallback_rotation: Vec3) -> WorldTransform {
    let col0 = matrix.x_axis.truncate();
    let col1 = matrix.y_axis.truncate();
    let col2 = matrix.z_axis.truncate();
    let scale = Vec3::new(col0.length(), col1.length(), col2.length());

    let rotation = if scale.min_element() > SCALE_EPSILON {
        let rotation_matrix = Mat3::from_cols(col0 / scale.x, col1 / scale.y, col2 / scale.z);
        // ZYX returns the angles of Rz * Ry * Rx, matching LocalTransform::matrix
        let (z, y, x) = Quat::from_mat3(&rotation_matrix).to_euler(EulerRot::ZYX);
        Vec3::new(x, y, z)
    } else {
        fallback_rotation
    };

    WorldTransform {
        matrix,
        position: matrix.w_axis.truncate(),
        rotation,
        scale,
    }
}

/// World matrix of `entity` given its local transform and current parent
pub fn world_matrix(world: &World, entity: Entity, local: &LocalTransform) -> Mat4 {
    let parent_matrix = world
        .parent(entity)
        .and_then(|parent| world.get::<WorldTransform>(parent).map(|wt| wt.matrix));

    match parent_matrix {
        Some(parent) => parent * local.matrix(),
        None => local.matrix(),
    }
}

fn physics_owns_pose(world: &World, entity: Entity) -> bool {
    world.phases().simulation_enabled()
        && world
            .get::<RigidBody>(entity)
            .is_some_and(|body| body.motion_type == MotionType::Dynamic)
}

/// Recompute one entity and cascade to its children
pub fn propagate(world: &mut World, entity: Entity) {
    if !physics_owns_pose(world, entity) {
        let Some(local) = world.cloned::<LocalTransform>(entity) else {
            return;
        };
        let settled = decompose(world_matrix(world, entity, &local), local.rotation);
        if let Some(mut world_transform) = world.get_mut::<WorldTransform>(entity) {
            *world_transform = settled;
        }

        // Lets a physics backend push the new pose to its body
        world.modified::<RigidBody>(entity);
    }

    for child in world.children(entity) {
        world.modified::<LocalTransform>(child);
    }
}

/// Register the `TransformPropagation` observer
pub fn install(world: &mut World) {
    world
        .observer("TransformPropagation")
        .with::<LocalTransform>()
        .with::<WorldTransform>()
        .on_add::<LocalTransform>()
        .on_add::<WorldTransform>()
        .on_set::<LocalTransform>()
        .each(propagate);
}
