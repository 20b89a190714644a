//! Built-in gameplay systems and camera upkeep

use glam::Vec3;
use hecs::Entity;

use super::World;
use super::components::{Camera, LocalTransform, Rotating, Velocity};
use super::phases::{Phase, Schedule};

/// Spin rate of `Rotating` entities, radians per second about Y
pub const ROTATION_SPEED: f32 = 1.0;

/// Integrate `Velocity` into `LocalTransform`
pub fn movement(world: &mut World, delta_time: f32) {
    let moving: Vec<(Entity, Velocity)> = world
        .query::<(&Velocity, &LocalTransform)>()
        .iter()
        .map(|(entity, (velocity, _))| (entity, *velocity))
        .collect();

    for (entity, velocity) in moving {
        world.update::<LocalTransform>(entity, |transform| {
            transform.translate(velocity.linear * delta_time);
            transform.rotate_euler(velocity.angular * delta_time);
        });
    }
}

/// Turn `Rotating` entities about Y
pub fn rotation(world: &mut World, delta_time: f32) {
    let spinning: Vec<Entity> = world
        .query::<(&Rotating, &LocalTransform)>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for entity in spinning {
        world.update::<LocalTransform>(entity, |transform| {
            transform.rotate_euler(Vec3::new(0.0, ROTATION_SPEED * delta_time, 0.0));
        });
    }
}

/// Add movement and rotation to the Simulation phase
pub fn register(schedule: &mut Schedule) {
    schedule.add_system("MovementSystem", Phase::Simulation, movement);
    schedule.add_system("RotationSystem", Phase::Simulation, rotation);
}

/// Register the `CameraTransformUpdate` observer
pub fn install_camera(world: &mut World) {
    world
        .observer("CameraTransformUpdate")
        .with::<Camera>()
        .with::<LocalTransform>()
        .on_add::<Camera>()
        .on_set::<Camera>()
        .on_set::<LocalTransform>()
        .each(|world, entity| {
            let Some(position) = world.get::<LocalTransform>(entity).map(|t| t.position) else {
                return;
            };
            if let Some(mut camera) = world.get_mut::<Camera>(entity) {
                camera.refresh(position);
            }
        });
}
