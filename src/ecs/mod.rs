//! Entity Component System module
//!
//! Built on top of the hecs ECS library. [`World`] adds observers,
//! always-together rules and a parent/child relation to `hecs::World`;
//! [`EcsWorld`] wires the built-in components, observers and systems.

mod asset_ref;
mod components;
mod ecs_world;
mod hierarchy;
mod phases;
mod reflect;
mod registry;
pub mod spatial;
pub mod systems;
pub mod transform;
mod world;

pub use asset_ref::{AssetRefBinding, NameRef, declare_ref};
pub use components::{
    ActiveCamera, Camera, LocalTransform, Rotating, SceneEntity, SceneRoot, Spatial, Velocity,
    WorldTransform,
};
pub use ecs_world::{EcsWorld, EcsWorldBuilder};
pub use hierarchy::{Children, HierarchyError, Parent};
pub use phases::{Phase, PipelineMode, PipelinePhases, Schedule};
pub use reflect::{FieldAccessor, FieldType, Reflect, ReflectError};
pub use registry::{ComponentBuilder, ComponentInfo, ComponentRegistry, FieldInfo};
pub use world::{ObserverBuilder, ObserverEvent, ObserverId, World};
