//! Component registry
//!
//! Catalogue of component descriptors for editor and serialization tooling.
//! A registry is filled once while a world is being built, then frozen behind
//! an `Arc` and only read afterwards, so it can be shared freely.
//!
//! ```ignore
//! registry
//!     .register::<Spatial>("Spatial", "Core")
//!     .field(field!(Spatial, bounding_min))
//!     .field(field!(Spatial, bounding_max))
//!     .field(field!(Spatial, layer_mask))
//!     .build();
//! ```
//!
//! Fields must be registered in declaration order: tooling lists them, and
//! reads raw component bytes, in that order.

use std::any::TypeId;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use hecs::{Component, Entity};
use serde_json::{Map, Value};

use super::World;
use super::reflect::{FieldAccess, FieldAccessor, FieldType, Reflect, ReflectError};

/// Metadata for one reflected field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    /// Optional label shown instead of `name`
    pub display_name: String,
    pub field_type: FieldType,
    /// Byte offset inside the component
    pub offset: usize,
    /// Size in bytes
    pub size: usize,
    /// Asset type key for `FieldType::AssetRef` fields
    pub asset_type: String,
    pub enum_labels: Vec<String>,
    pub enum_tooltips: Vec<String>,
}

impl FieldInfo {
    /// Label for display
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// The bytes of this field inside a component's byte image
    pub fn slice<'a>(&self, component_bytes: &'a [u8]) -> Option<&'a [u8]> {
        component_bytes.get(self.offset..self.offset + self.size)
    }
}

/// Descriptor of a registered component type
pub struct ComponentInfo {
    pub name: String,
    pub category: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Size of the component in bytes
    pub size: usize,
    /// Fields in registration order
    pub fields: Vec<FieldInfo>,
    ops: Box<dyn ComponentOps>,
}

impl ComponentInfo {
    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn field_index(&self, name: &str) -> Result<usize, ReflectError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| ReflectError::UnknownField {
                component: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Check whether an entity carries this component
    pub fn has(&self, world: &World, entity: Entity) -> bool {
        self.ops.has(world, entity)
    }

    /// Attach a default instance (no-op if present)
    pub fn add_to(&self, world: &mut World, entity: Entity) -> Result<(), ReflectError> {
        self.ops.add_default(world, entity)
    }

    /// Read one field as JSON
    pub fn get_field(
        &self,
        world: &World,
        entity: Entity,
        field: &str,
    ) -> Result<Value, ReflectError> {
        let index = self.field_index(field)?;
        Ok(self.ops.read(world, entity, &self.name)?.swap_remove(index))
    }

    /// Write one field from JSON and notify observers
    pub fn set_field(
        &self,
        world: &mut World,
        entity: Entity,
        field: &str,
        value: Value,
    ) -> Result<(), ReflectError> {
        let index = self.field_index(field)?;
        self.ops
            .write(world, entity, &self.name, vec![(index, value)], false)
    }

    /// All fields as a JSON object keyed by field name
    pub fn serialize(&self, world: &World, entity: Entity) -> Result<Value, ReflectError> {
        let values = self.ops.read(world, entity, &self.name)?;
        let object: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| f.name.clone())
            .zip(values)
            .collect();
        Ok(Value::Object(object))
    }

    /// Apply a JSON object of field values, attaching the component first if
    /// missing. Unknown keys are rejected; absent fields keep their value.
    /// Either every field is applied or none is.
    pub fn deserialize(
        &self,
        world: &mut World,
        entity: Entity,
        value: &Value,
    ) -> Result<(), ReflectError> {
        let Value::Object(object) = value else {
            return Err(ReflectError::NotAnObject);
        };
        let writes = object
            .iter()
            .map(|(key, v)| Ok((self.field_index(key)?, v.clone())))
            .collect::<Result<Vec<_>, ReflectError>>()?;

        self.ops.write(world, entity, &self.name, writes, true)
    }
}

impl std::fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("type_name", &self.type_name)
            .field("size", &self.size)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Operations on a component type, erased over `T`
trait ComponentOps: Send + Sync {
    fn has(&self, world: &World, entity: Entity) -> bool;
    fn add_default(&self, world: &mut World, entity: Entity) -> Result<(), ReflectError>;
    fn read(&self, world: &World, entity: Entity, name: &str) -> Result<Vec<Value>, ReflectError>;
    /// Decode `values` into a staged copy, then write it back in one `set`.
    /// With `attach`, a missing component is staged from its default.
    fn write(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
        values: Vec<(usize, Value)>,
        attach: bool,
    ) -> Result<(), ReflectError>;
}

struct TypedComponent<T> {
    fields: Vec<Box<dyn FieldAccess<T>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component + Default + Clone> ComponentOps for TypedComponent<T> {
    fn has(&self, world: &World, entity: Entity) -> bool {
        world.has::<T>(entity)
    }

    fn add_default(&self, world: &mut World, entity: Entity) -> Result<(), ReflectError> {
        world
            .add::<T>(entity)
            .map_err(|_| ReflectError::NoSuchEntity)
    }

    fn read(&self, world: &World, entity: Entity, name: &str) -> Result<Vec<Value>, ReflectError> {
        if !world.contains(entity) {
            return Err(ReflectError::NoSuchEntity);
        }
        let component = world
            .get::<T>(entity)
            .ok_or_else(|| ReflectError::MissingComponent(name.to_string()))?;
        self.fields.iter().map(|f| f.read(&component)).collect()
    }

    fn write(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
        values: Vec<(usize, Value)>,
        attach: bool,
    ) -> Result<(), ReflectError> {
        if !world.contains(entity) {
            return Err(ReflectError::NoSuchEntity);
        }
        let mut staged = match world.cloned::<T>(entity) {
            Some(current) => current,
            None if attach => T::default(),
            None => return Err(ReflectError::MissingComponent(name.to_string())),
        };
        for (index, value) in values {
            self.fields[index].write(&mut staged, value)?;
        }
        world
            .set(entity, staged)
            .map_err(|_| ReflectError::NoSuchEntity)
    }
}

/// Catalogue of component descriptors
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start describing component `T`
    pub fn register<T: Component + Default + Clone>(
        &mut self,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> ComponentBuilder<'_, T> {
        ComponentBuilder {
            registry: self,
            name: name.into(),
            category: category.into(),
            fields: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// All registered components, in registration order
    pub fn components(&self) -> &[ComponentInfo] {
        &self.components
    }

    /// Find a component by name (first registration wins)
    pub fn find_component(&self, name: &str) -> Option<&ComponentInfo> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Find the descriptor of a Rust type
    pub fn find_by_type<T: Component>(&self) -> Option<&ComponentInfo> {
        let type_id = TypeId::of::<T>();
        self.components.iter().find(|c| c.type_id == type_id)
    }

    /// Components in a category, in registration order
    pub fn components_by_category(&self, category: &str) -> Vec<&ComponentInfo> {
        self.components
            .iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.components
            .iter()
            .map(|c| c.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Registered components present on an entity
    pub fn components_of(&self, world: &World, entity: Entity) -> Vec<&ComponentInfo> {
        self.components
            .iter()
            .filter(|c| c.has(world, entity))
            .collect()
    }

    fn lookup(&self, component: &str) -> Result<&ComponentInfo, ReflectError> {
        self.find_component(component)
            .ok_or_else(|| ReflectError::UnknownComponent(component.to_string()))
    }

    /// Read a field by component and field name
    pub fn get_field(
        &self,
        world: &World,
        entity: Entity,
        component: &str,
        field: &str,
    ) -> Result<Value, ReflectError> {
        self.lookup(component)?.get_field(world, entity, field)
    }

    /// Write a field by component and field name, notifying observers
    pub fn set_field(
        &self,
        world: &mut World,
        entity: Entity,
        component: &str,
        field: &str,
        value: Value,
    ) -> Result<(), ReflectError> {
        self.lookup(component)?
            .set_field(world, entity, field, value)
    }

    /// Serialize one component of an entity to a JSON object
    pub fn serialize_component(
        &self,
        world: &World,
        entity: Entity,
        component: &str,
    ) -> Result<Value, ReflectError> {
        self.lookup(component)?.serialize(world, entity)
    }

    /// Apply a JSON object to one component of an entity
    pub fn deserialize_component(
        &self,
        world: &mut World,
        entity: Entity,
        component: &str,
        value: &Value,
    ) -> Result<(), ReflectError> {
        self.lookup(component)?.deserialize(world, entity, value)
    }

    /// Serialize every registered component on an entity, keyed by name
    pub fn serialize_entity(&self, world: &World, entity: Entity) -> Result<Value, ReflectError> {
        if !world.contains(entity) {
            return Err(ReflectError::NoSuchEntity);
        }
        let mut object = Map::new();
        for info in self.components_of(world, entity) {
            object.insert(info.name.clone(), info.serialize(world, entity)?);
        }
        Ok(Value::Object(object))
    }
}

/// Builder returned by [`ComponentRegistry::register`]
pub struct ComponentBuilder<'r, T> {
    registry: &'r mut ComponentRegistry,
    name: String,
    category: String,
    fields: Vec<FieldInfo>,
    accessors: Vec<Box<dyn FieldAccess<T>>>,
}

impl<T: Component + Default + Clone> ComponentBuilder<'_, T> {
    /// Append a field with the default tag for its type
    #[must_use]
    pub fn field<F: Reflect>(self, accessor: FieldAccessor<T, F>) -> Self {
        self.field_as(accessor, F::FIELD_TYPE)
    }

    /// Append a field with an explicit semantic tag
    #[must_use]
    pub fn field_as<F: Reflect>(
        mut self,
        accessor: FieldAccessor<T, F>,
        field_type: FieldType,
    ) -> Self {
        self.fields.push(FieldInfo {
            name: accessor.name().to_string(),
            display_name: String::new(),
            field_type,
            offset: accessor.offset(),
            size: accessor.size(),
            asset_type: String::new(),
            enum_labels: Vec::new(),
            enum_tooltips: Vec::new(),
        });
        self.accessors.push(Box::new(accessor));
        self
    }

    /// Mark the last field as a reference to assets of `type_key`
    #[must_use]
    pub fn asset_ref(mut self, type_key: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.field_type = FieldType::AssetRef;
            field.asset_type = type_key.into();
        }
        self
    }

    /// Mark the last field as an enum with these labels
    #[must_use]
    pub fn enum_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.field_type = FieldType::Enum;
            field.enum_labels = labels.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Tooltips for the last field's enum labels
    #[must_use]
    pub fn enum_tooltips<S: Into<String>>(mut self, tooltips: impl IntoIterator<Item = S>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.enum_tooltips = tooltips.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Display label for the last field
    #[must_use]
    pub fn display_name(mut self, label: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.display_name = label.into();
        }
        self
    }

    /// Commit the descriptor
    pub fn build(self) {
        if self.registry.find_component(&self.name).is_some() {
            log::warn!("component {} registered more than once", self.name);
        }
        log::debug!(
            "registered component {} ({}) with {} fields",
            self.name,
            self.category,
            self.fields.len()
        );
        self.registry.components.push(ComponentInfo {
            name: self.name,
            category: self.category,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
            fields: self.fields,
            ops: Box::new(TypedComponent {
                fields: self.accessors,
                _marker: PhantomData,
            }),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec3;
    use serde_json::json;

    use super::*;
    use crate::ecs::LocalTransform;
    use crate::field;

    #[derive(Debug, Default, Clone)]
    struct Foo {
        a: f32,
        b: Vec3,
    }

    #[derive(Debug, Default, Clone)]
    struct Mode {
        kind: u32,
        label: String,
    }

    fn register_foo(registry: &mut ComponentRegistry) {
        registry
            .register::<Foo>("Foo", "Test")
            .field(field!(Foo, a))
            .field(field!(Foo, b))
            .build();
    }

    #[test]
    fn test_register_single_component() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);

        let foos: Vec<_> = registry
            .components()
            .iter()
            .filter(|c| c.name == "Foo")
            .collect();
        assert_eq!(foos.len(), 1);
        let names: Vec<_> = foos[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(foos[0].fields[0].field_type, FieldType::Float);
        assert_eq!(foos[0].fields[1].field_type, FieldType::Vec3);
    }

    #[test]
    fn test_field_offsets_match_layout() {
        let mut registry = ComponentRegistry::new();
        registry
            .register::<LocalTransform>("LocalTransform", "Core")
            .field(field!(LocalTransform, position))
            .field(field!(LocalTransform, rotation))
            .field(field!(LocalTransform, scale))
            .build();

        let transform =
            LocalTransform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::splat(4.0));
        let base = std::ptr::from_ref(&transform) as usize;
        let info = registry.find_component("LocalTransform").unwrap();

        assert_eq!(
            info.fields[0].offset,
            std::ptr::from_ref(&transform.position) as usize - base
        );
        assert_eq!(
            info.fields[1].offset,
            std::ptr::from_ref(&transform.rotation) as usize - base
        );
        assert_eq!(
            info.fields[2].offset,
            std::ptr::from_ref(&transform.scale) as usize - base
        );

        let bytes = bytemuck::bytes_of(&transform);
        assert_eq!(
            info.fields[2].slice(bytes),
            Some(bytemuck::bytes_of(&transform.scale))
        );
        assert_eq!(info.size, bytes.len());
    }

    #[test]
    fn test_modifiers_before_field_are_noops() {
        let mut registry = ComponentRegistry::new();
        registry
            .register::<Mode>("Mode", "Test")
            .asset_ref("mesh")
            .enum_labels(["A", "B"])
            .field(field!(Mode, kind))
            .enum_labels(["Off", "On"])
            .enum_tooltips(["Disabled", "Enabled"])
            .field(field!(Mode, label))
            .asset_ref("sound")
            .build();

        let info = registry.find_component("Mode").unwrap();
        assert_eq!(info.fields.len(), 2);
        assert_eq!(info.fields[0].field_type, FieldType::Enum);
        assert_eq!(info.fields[0].enum_labels, vec!["Off", "On"]);
        assert_eq!(info.fields[0].enum_tooltips, vec!["Disabled", "Enabled"]);
        assert_eq!(info.fields[1].field_type, FieldType::AssetRef);
        assert_eq!(info.fields[1].asset_type, "sound");
    }

    #[test]
    fn test_duplicate_registration_appends() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);
        register_foo(&mut registry);
        assert_eq!(registry.components().len(), 2);
        assert!(registry.find_component("Foo").is_some());
    }

    #[test]
    fn test_categories_and_lookup() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);
        registry
            .register::<LocalTransform>("LocalTransform", "Core")
            .field(field!(LocalTransform, position))
            .build();

        assert_eq!(
            registry.categories(),
            vec!["Core".to_string(), "Test".to_string()]
        );
        assert_eq!(registry.components_by_category("Core").len(), 1);
        assert!(registry.components_by_category("Missing").is_empty());
        assert!(registry.find_component("Bar").is_none());
        assert_eq!(
            registry.find_by_type::<Foo>().map(|c| c.name.as_str()),
            Some("Foo")
        );
    }

    #[test]
    fn test_json_roundtrip_through_world() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);
        let mut world = World::new();
        let e = world.spawn();

        registry
            .deserialize_component(
                &mut world,
                e,
                "Foo",
                &json!({ "a": 1.5, "b": [1.0, 2.0, 3.0] }),
            )
            .unwrap();
        assert_eq!(world.get::<Foo>(e).unwrap().b, Vec3::new(1.0, 2.0, 3.0));

        let value = registry.serialize_component(&world, e, "Foo").unwrap();
        assert_eq!(value, json!({ "a": 1.5, "b": [1.0, 2.0, 3.0] }));
        assert_eq!(
            registry.get_field(&world, e, "Foo", "a").unwrap(),
            json!(1.5)
        );

        let entity_json = registry.serialize_entity(&world, e).unwrap();
        assert!(entity_json.get("Foo").is_some());
    }

    #[test]
    fn test_deserialize_is_all_or_nothing() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);
        let mut world = World::new();
        let e = world.spawn();
        let stored = Foo {
            a: 2.0,
            b: Vec3::ONE,
        };
        world.set(e, stored).unwrap();

        let err = registry
            .deserialize_component(&mut world, e, "Foo", &json!({ "a": 9.0, "b": "bad" }))
            .unwrap_err();
        assert!(matches!(err, ReflectError::Decode { .. }));
        assert_eq!(world.get::<Foo>(e).unwrap().a, 2.0);

        let err = registry
            .deserialize_component(&mut world, e, "Foo", &json!({ "c": 1 }))
            .unwrap_err();
        assert!(matches!(err, ReflectError::UnknownField { .. }));
    }

    #[test]
    fn test_failed_deserialize_leaves_absent_component_absent() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);
        let mut world = World::new();
        let added = Rc::new(Cell::new(0));
        let a = Rc::clone(&added);
        world
            .observer("foo added")
            .on_add::<Foo>()
            .each(move |_, _| a.set(a.get() + 1));
        let e = world.spawn();

        let err = registry
            .deserialize_component(&mut world, e, "Foo", &json!({ "a": 9.0, "b": "bad" }))
            .unwrap_err();
        assert!(matches!(err, ReflectError::Decode { .. }));
        assert!(!world.has::<Foo>(e));
        assert_eq!(added.get(), 0);

        registry
            .deserialize_component(&mut world, e, "Foo", &json!({ "a": 9.0 }))
            .unwrap();
        assert_eq!(world.get::<Foo>(e).unwrap().a, 9.0);
        assert_eq!(added.get(), 1);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ComponentRegistry>();
    }

    #[test]
    fn test_set_field_notifies_observers() {
        let mut registry = ComponentRegistry::new();
        register_foo(&mut registry);
        let mut world = World::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        world
            .observer("foo")
            .on_set::<Foo>()
            .each(move |_, _| c.set(c.get() + 1));

        let e = world.spawn();
        assert_eq!(
            registry.set_field(&mut world, e, "Foo", "a", json!(1.0)),
            Err(ReflectError::MissingComponent("Foo".to_string()))
        );

        world.add::<Foo>(e).unwrap();
        registry
            .set_field(&mut world, e, "Foo", "a", json!(3.0))
            .unwrap();
        assert_eq!(world.get::<Foo>(e).unwrap().a, 3.0);
        assert_eq!(count.get(), 1);

        assert!(matches!(
            registry.get_field(&world, e, "Nope", "a"),
            Err(ReflectError::UnknownComponent(_))
        ));
    }
}
