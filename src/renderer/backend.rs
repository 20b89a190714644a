//! Interface to the renderer

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::components::{MaterialId, MeshId, RenderState, ShaderId};

/// One draw, submitted per visible entity per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCommand {
    pub mesh: MeshId,
    pub shader: ShaderId,
    pub material: MaterialId,
    pub render_state: RenderState,
    /// Model matrix (the entity's world transform)
    pub transform: Mat4,
    pub camera_view: Mat4,
    pub camera_projection: Mat4,
}

impl RenderCommand {
    /// GPU-ready model uniform for this draw
    #[must_use]
    pub fn model_uniform(&self) -> ModelUniform {
        ModelUniform::from_transform(self.transform)
    }
}

/// Uniform buffer for model transform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn from_transform(model: Mat4) -> Self {
        let normal_matrix = model.inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
        }
    }
}

impl Default for ModelUniform {
    fn default() -> Self {
        Self::from_transform(Mat4::IDENTITY)
    }
}

/// What the ECS needs from the renderer.
///
/// Lookups return the invalid handle or an empty string on a miss.
/// Submission order carries no meaning.
pub trait RenderBackend {
    fn find_shader(&self, name: &str) -> ShaderId;
    fn shader_name(&self, id: ShaderId) -> String;
    fn find_mesh(&self, name: &str) -> MeshId;
    fn mesh_name(&self, id: MeshId) -> String;
    fn find_material(&self, name: &str) -> MaterialId;
    fn material_name(&self, id: MaterialId) -> String;
    fn submit(&self, command: RenderCommand);
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_model_uniform_bytes() {
        let command = RenderCommand {
            mesh: MeshId(1),
            shader: ShaderId(1),
            material: MaterialId::INVALID,
            render_state: RenderState::default(),
            transform: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            camera_view: Mat4::IDENTITY,
            camera_projection: Mat4::IDENTITY,
        };
        let uniform = command.model_uniform();
        let bytes = bytemuck::bytes_of(&uniform);
        assert_eq!(bytes.len(), 128);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(
            ModelUniform::default().normal_matrix,
            Mat4::IDENTITY.to_cols_array_2d()
        );
    }
}
