//! Linear spatial queries over bounded entities
//!
//! Every query scans all entities with `Spatial` and `LocalTransform`. There
//! is no acceleration structure; broad-phase work belongs to physics.

use glam::Vec3;
use hecs::Entity;

use super::World;
use super::components::{LocalTransform, Spatial, WorldTransform};

/// World-space origin of a bounded entity
fn origin(world: &World, entity: Entity, local: &LocalTransform) -> Vec3 {
    world
        .get::<WorldTransform>(entity)
        .map_or(local.position, |wt| wt.position)
}

fn candidates(world: &World, layer_mask: u32) -> Vec<(Entity, Spatial, LocalTransform)> {
    world
        .query::<(&Spatial, &LocalTransform)>()
        .iter()
        .filter(|(_, (spatial, _))| spatial.layer_mask & layer_mask != 0)
        .map(|(entity, (spatial, local))| (entity, *spatial, *local))
        .collect()
}

/// Entities whose bounds contain `point` (inclusive) on any layer in `layer_mask`
pub fn query_point(world: &World, point: Vec3, layer_mask: u32) -> Vec<Entity> {
    candidates(world, layer_mask)
        .into_iter()
        .filter(|(entity, spatial, local)| {
            let origin = origin(world, *entity, local);
            let min = origin + spatial.bounding_min;
            let max = origin + spatial.bounding_max;
            point.cmpge(min).all() && point.cmple(max).all()
        })
        .map(|(entity, _, _)| entity)
        .collect()
}

/// Entities whose origin lies within `radius` of `center` on any layer in `layer_mask`
pub fn query_sphere(world: &World, center: Vec3, radius: f32, layer_mask: u32) -> Vec<Entity> {
    let radius_sq = radius * radius;
    candidates(world, layer_mask)
        .into_iter()
        .filter(|(entity, _, local)| {
            origin(world, *entity, local).distance_squared(center) <= radius_sq
        })
        .map(|(entity, _, _)| entity)
        .collect()
}

/// Register the `SpatialBoundsUpdate` observer marking bounds dirty on move
pub fn install(world: &mut World) {
    world
        .observer("SpatialBoundsUpdate")
        .with::<Spatial>()
        .on_set::<LocalTransform>()
        .each(|world, entity| {
            if let Some(mut spatial) = world.get_mut::<Spatial>(entity) {
                spatial.dirty = true;
            }
        });
}
