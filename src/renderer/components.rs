//! Rendering components and asset handles

use serde::{Deserialize, Serialize};

use crate::ecs::{FieldAccessor, FieldType, NameRef, Reflect};
use crate::field;

macro_rules! asset_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Handle that refers to no asset
            pub const INVALID: Self = Self(0);

            /// Whether this handle refers to an asset
            #[must_use]
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl Reflect for $name {
            const FIELD_TYPE: FieldType = FieldType::ReadOnly;
        }
    };
}

asset_id!(
    /// Renderer handle of a mesh
    MeshId
);
asset_id!(
    /// Renderer handle of a shader program
    ShaderId
);
asset_id!(
    /// Renderer handle of a material
    MaterialId
);

/// Fixed-function state applied when drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
    pub cull_back_faces: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            blend: false,
            cull_back_faces: true,
        }
    }
}

/// Something to draw. Attaching it also attaches `MeshRef`, `ShaderRef` and
/// `MaterialRef`, which keep the handles in sync with asset names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub mesh: MeshId,
    pub shader: ShaderId,
    pub material: MaterialId,
    pub visible: bool,
    pub render_state: RenderState,
}

impl Default for Renderable {
    fn default() -> Self {
        Self {
            mesh: MeshId::INVALID,
            shader: ShaderId::INVALID,
            material: MaterialId::INVALID,
            visible: true,
            render_state: RenderState::default(),
        }
    }
}

/// Shader referenced by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderRef {
    pub name: String,
}

/// Mesh referenced by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshRef {
    pub name: String,
}

/// Material referenced by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialRef {
    pub name: String,
}

impl NameRef for ShaderRef {
    fn name_field() -> FieldAccessor<Self, String> {
        field!(ShaderRef, name)
    }
}

impl NameRef for MeshRef {
    fn name_field() -> FieldAccessor<Self, String> {
        field!(MeshRef, name)
    }
}

impl NameRef for MaterialRef {
    fn name_field() -> FieldAccessor<Self, String> {
        field!(MaterialRef, name)
    }
}

impl ShaderRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MeshRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MaterialRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
