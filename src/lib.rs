//! Scene ECS core
//!
//! This crate provides:
//! - An observed entity world over hecs with a parent/child hierarchy
//! - Reactive world-transform propagation
//! - A reflective component registry for tooling
//! - Name-to-handle asset reference bindings
//! - A Play/Edit pipeline gate over per-tick systems

pub mod audio;
pub mod core;
pub mod ecs;
pub mod physics;
pub mod renderer;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::audio::{
        AudioBackend, AudioListener, AudioSource, PlayState, SoundCatalog, SoundRef,
    };
    pub use crate::core::WorldConfig;
    pub use crate::ecs::{
        Camera, ComponentRegistry, EcsWorld, FieldInfo, LocalTransform, Phase, PipelineMode,
        Rotating, SceneEntity, Spatial, Velocity, World, WorldTransform,
    };
    pub use crate::physics::{MotionType, RigidBody};
    pub use crate::renderer::{
        MaterialId, MaterialRef, MeshId, MeshRef, RenderBackend, RenderCommand, Renderable,
        ShaderId, ShaderRef,
    };
    pub use glam::{Mat4, Vec2, Vec3, Vec4};
}
