//! Field reflection
//!
//! Describes component fields for tooling (inspectors, serializers) without
//! the components depending on that tooling. Each field is a name, a semantic
//! [`FieldType`], its byte offset and size, and a typed accessor pair that
//! converts to and from `serde_json::Value`.
//!
//! Accessors are usually produced with the [`field!`](crate::field) macro,
//! which takes the offset from `core::mem::offset_of!` so it always matches
//! the real struct layout.

use std::path::PathBuf;

use glam::{Vec2, Vec3, Vec4};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Semantic type of a reflected field, used to pick an editor widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    FilePath,
    Vec2,
    Vec3,
    Vec4,
    /// RGBA color stored as `Vec4`
    Color,
    /// Displayed but not editable
    ReadOnly,
    /// Integer-backed choice with labels
    Enum,
    /// String chosen from a fixed option list
    Selection,
    ListInt,
    ListFloat,
    ListString,
    /// Name of an asset of a given type key
    AssetRef,
}

/// A value type that can be exposed through reflection
pub trait Reflect: Serialize + DeserializeOwned + 'static {
    /// Default semantic tag for fields of this type
    const FIELD_TYPE: FieldType;
}

macro_rules! impl_reflect {
    ($($ty:ty => $field_type:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                const FIELD_TYPE: FieldType = FieldType::$field_type;
            }
        )*
    };
}

impl_reflect! {
    bool => Bool,
    i32 => Int,
    u32 => Int,
    u64 => Int,
    f32 => Float,
    String => String,
    PathBuf => FilePath,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Vec<i32> => ListInt,
    Vec<f32> => ListFloat,
    Vec<String> => ListString,
}

/// Typed accessor for one field of component `T`
pub struct FieldAccessor<T, F> {
    name: &'static str,
    offset: usize,
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T, F> FieldAccessor<T, F> {
    /// Create an accessor. Prefer the [`field!`](crate::field) macro.
    pub const fn new(
        name: &'static str,
        offset: usize,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name,
            offset,
            get,
            get_mut,
        }
    }

    /// Field name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Byte offset of the field inside `T`
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Size of the field in bytes
    pub const fn size(&self) -> usize {
        std::mem::size_of::<F>()
    }

    /// Borrow the field
    pub fn get<'a>(&self, component: &'a T) -> &'a F {
        (self.get)(component)
    }

    /// Mutably borrow the field
    pub fn get_mut<'a>(&self, component: &'a mut T) -> &'a mut F {
        (self.get_mut)(component)
    }
}

impl<T, F> Clone for FieldAccessor<T, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, F> Copy for FieldAccessor<T, F> {}

/// Type-erased (over the field type) read/write of one field of `T`
pub(crate) trait FieldAccess<T>: Send + Sync {
    fn read(&self, component: &T) -> Result<Value, ReflectError>;
    fn write(&self, component: &mut T, value: Value) -> Result<(), ReflectError>;
}

impl<T: 'static, F: Reflect> FieldAccess<T> for FieldAccessor<T, F> {
    fn read(&self, component: &T) -> Result<Value, ReflectError> {
        serde_json::to_value((self.get)(component)).map_err(|e| ReflectError::Encode(e.to_string()))
    }

    fn write(&self, component: &mut T, value: Value) -> Result<(), ReflectError> {
        let decoded: F = serde_json::from_value(value).map_err(|e| ReflectError::Decode {
            field: self.name.to_string(),
            message: e.to_string(),
        })?;
        *(self.get_mut)(component) = decoded;
        Ok(())
    }
}

/// Build a [`FieldAccessor`] for `$ty::$member`
#[macro_export]
macro_rules! field {
    ($ty:ty, $member:ident) => {
        $crate::ecs::FieldAccessor::<$ty, _>::new(
            stringify!($member),
            ::core::mem::offset_of!($ty, $member),
            |c: &$ty| &c.$member,
            |c: &mut $ty| &mut c.$member,
        )
    };
}

/// Errors from reflective component access
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectError {
    /// No component registered under this name
    UnknownComponent(String),
    /// The component has no field with this name
    UnknownField { component: String, field: String },
    /// The entity does not carry the component
    MissingComponent(String),
    /// The entity does not exist
    NoSuchEntity,
    /// Expected a JSON object of field values
    NotAnObject,
    /// Field value could not be converted to JSON
    Encode(String),
    /// JSON value did not match the field type
    Decode { field: String, message: String },
}

impl std::fmt::Display for ReflectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownComponent(name) => write!(f, "unknown component: {name}"),
            Self::UnknownField { component, field } => {
                write!(f, "component {component} has no field {field}")
            }
            Self::MissingComponent(name) => write!(f, "entity has no {name} component"),
            Self::NoSuchEntity => write!(f, "no such entity"),
            Self::NotAnObject => write!(f, "expected a JSON object"),
            Self::Encode(e) => write!(f, "encode error: {e}"),
            Self::Decode { field, message } => write!(f, "cannot decode field {field}: {message}"),
        }
    }
}

impl std::error::Error for ReflectError {}
