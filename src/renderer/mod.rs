//! Renderer boundary
//!
//! Mesh, shader and material managers and draw submission live outside this
//! crate. This module holds the components that reference renderer assets and
//! the interface the ECS consumes to resolve names and submit draws.

mod backend;
mod components;

pub use backend::{ModelUniform, RenderBackend, RenderCommand};
pub use components::{
    MaterialId, MaterialRef, MeshId, MeshRef, RenderState, Renderable, ShaderId, ShaderRef,
};
