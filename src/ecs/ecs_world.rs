//! Composition root
//!
//! `EcsWorld` owns the observed world, the frame schedule and the frozen
//! component registry. Building one registers the built-in components,
//! installs the transform, camera and spatial observers, binds asset name
//! references to whatever backends were supplied, and schedules the
//! Simulation systems.

use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use hecs::Entity;
use serde_json::Value;

use super::asset_ref::{AssetRefBinding, declare_ref};
use super::components::{
    ActiveCamera, Camera, LocalTransform, SceneEntity, SceneRoot, Spatial, Velocity, WorldTransform,
};
use super::hierarchy::HierarchyError;
use super::phases::{Phase, PipelineMode, Schedule};
use super::reflect::{FieldType, ReflectError};
use super::registry::ComponentRegistry;
use super::{World, spatial, systems, transform};
use crate::audio::{
    self, AudioBackend, AudioListener, AudioSource, PlayState, SoundCatalog, SoundRef,
};
use crate::core::WorldConfig;
use crate::field;
use crate::physics::{MotionType, RigidBody};
use crate::renderer::{
    MaterialId, MaterialRef, MeshId, MeshRef, RenderBackend, RenderCommand, Renderable, ShaderId,
    ShaderRef,
};

type ComponentSetup = Box<dyn FnOnce(&mut World, &mut ComponentRegistry)>;

/// Builder for [`EcsWorld`]
#[derive(Default)]
pub struct EcsWorldBuilder {
    config: WorldConfig,
    renderer: Option<Rc<dyn RenderBackend>>,
    audio: Option<(Rc<dyn AudioBackend>, Rc<dyn SoundCatalog>)>,
    components: Vec<ComponentSetup>,
}

impl EcsWorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration
    pub fn with_config(mut self, config: WorldConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve shader, mesh and material names through `renderer`
    pub fn with_renderer(mut self, renderer: Rc<dyn RenderBackend>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Resolve sound names and drive playback through `backend`
    pub fn with_audio(
        mut self,
        backend: Rc<dyn AudioBackend>,
        catalog: Rc<dyn SoundCatalog>,
    ) -> Self {
        self.audio = Some((backend, catalog));
        self
    }

    /// Register application components before the registry is frozen
    pub fn with_components(
        mut self,
        setup: impl FnOnce(&mut World, &mut ComponentRegistry) + 'static,
    ) -> Self {
        self.components.push(Box::new(setup));
        self
    }

    /// Build the world
    pub fn build(self) -> EcsWorld {
        let mut world = World::new();
        world.phases_mut().set_mode(self.config.initial_mode);
        let mut registry = ComponentRegistry::new();
        let mut schedule = Schedule::new();

        register_builtin_components(&mut registry);

        transform::install(&mut world);
        systems::install_camera(&mut world);
        spatial::install(&mut world);
        systems::register(&mut schedule);

        match self.renderer {
            Some(renderer) => bind_render_refs(&mut world, &mut registry, &renderer),
            None => {
                log::debug!("no renderer, render references are not resolved");
                declare_ref::<ShaderRef, Renderable>(
                    &mut world,
                    &mut registry,
                    "ShaderRef",
                    "Rendering",
                    "shader",
                );
                declare_ref::<MeshRef, Renderable>(
                    &mut world,
                    &mut registry,
                    "MeshRef",
                    "Rendering",
                    "mesh",
                );
                declare_ref::<MaterialRef, Renderable>(
                    &mut world,
                    &mut registry,
                    "MaterialRef",
                    "Rendering",
                    "material",
                );
            }
        }

        match self.audio {
            Some((backend, catalog)) => {
                audio::sound_ref_binding(Rc::clone(&backend), catalog)
                    .install(&mut world, &mut registry);
                audio::register(&mut schedule, &backend);
            }
            None => {
                log::debug!("no audio backend, sound references are not resolved");
                declare_ref::<SoundRef, AudioSource>(
                    &mut world,
                    &mut registry,
                    "SoundRef",
                    "Audio",
                    "sound",
                );
            }
        }

        for setup in self.components {
            setup(&mut world, &mut registry);
        }

        log::info!(
            "ECS world ready: {} components, {} observers, mode {:?}",
            registry.components().len(),
            world.observer_count(),
            world.phases().mode()
        );

        EcsWorld {
            world,
            schedule,
            registry: Arc::new(registry),
            config: self.config,
        }
    }
}

fn register_builtin_components(registry: &mut ComponentRegistry) {
    registry
        .register::<LocalTransform>("Transform", "Core")
        .field(field!(LocalTransform, position))
        .field(field!(LocalTransform, rotation))
        .display_name("Rotation (radians)")
        .field(field!(LocalTransform, scale))
        .build();
    registry
        .register::<WorldTransform>("WorldTransform", "Core")
        .field_as(field!(WorldTransform, position), FieldType::ReadOnly)
        .field_as(field!(WorldTransform, rotation), FieldType::ReadOnly)
        .field_as(field!(WorldTransform, scale), FieldType::ReadOnly)
        .build();
    registry
        .register::<Velocity>("Velocity", "Core")
        .field(field!(Velocity, linear))
        .field(field!(Velocity, angular))
        .build();
    registry
        .register::<SceneEntity>("SceneEntity", "Core")
        .field(field!(SceneEntity, name))
        .field(field!(SceneEntity, visible))
        .field(field!(SceneEntity, is_static))
        .display_name("Static")
        .field(field!(SceneEntity, layer))
        .build();
    registry
        .register::<Spatial>("Spatial", "Core")
        .field(field!(Spatial, bounding_min))
        .field(field!(Spatial, bounding_max))
        .field(field!(Spatial, layer_mask))
        .field_as(field!(Spatial, dirty), FieldType::ReadOnly)
        .build();

    registry
        .register::<Camera>("Camera", "Rendering")
        .field(field!(Camera, fov))
        .display_name("Field of View")
        .field(field!(Camera, aspect_ratio))
        .field(field!(Camera, near_plane))
        .field(field!(Camera, far_plane))
        .field(field!(Camera, target))
        .field(field!(Camera, up))
        .build();
    registry
        .register::<Renderable>("Renderable", "Rendering")
        .field(field!(Renderable, mesh))
        .field(field!(Renderable, shader))
        .field(field!(Renderable, material))
        .field(field!(Renderable, visible))
        .build();

    registry
        .register::<AudioSource>("AudioSource", "Audio")
        .field(field!(AudioSource, clip_id))
        .field(field!(AudioSource, volume))
        .field(field!(AudioSource, pitch))
        .field(field!(AudioSource, looping))
        .field(field!(AudioSource, spatial))
        .field(field!(AudioSource, position))
        .field(field!(AudioSource, state))
        .enum_labels(PlayState::LABELS)
        .field_as(field!(AudioSource, play_handle), FieldType::ReadOnly)
        .build();
    registry
        .register::<AudioListener>("AudioListener", "Audio")
        .field(field!(AudioListener, position))
        .field(field!(AudioListener, forward))
        .field(field!(AudioListener, up))
        .build();

    registry
        .register::<RigidBody>("RigidBody", "Physics")
        .field(field!(RigidBody, motion_type))
        .enum_labels(MotionType::LABELS)
        .enum_tooltips([
            "Never moves",
            "Moved by gameplay code",
            "Moved by the physics solver",
        ])
        .field_as(field!(RigidBody, body_id), FieldType::ReadOnly)
        .build();
}

fn bind_render_refs(
    world: &mut World,
    registry: &mut ComponentRegistry,
    renderer: &Rc<dyn RenderBackend>,
) {
    let (find, name) = (Rc::clone(renderer), Rc::clone(renderer));
    AssetRefBinding::<ShaderRef, Renderable, ShaderId>::new(
        "ShaderRef",
        field!(Renderable, shader),
        ShaderId::INVALID,
        move |n| find.find_shader(n),
    )
    .category("Rendering")
    .asset_type("shader")
    .reverse(move |id| name.shader_name(id))
    .install(world, registry);

    let (find, name) = (Rc::clone(renderer), Rc::clone(renderer));
    AssetRefBinding::<MeshRef, Renderable, MeshId>::new(
        "MeshRef",
        field!(Renderable, mesh),
        MeshId::INVALID,
        move |n| find.find_mesh(n),
    )
    .category("Rendering")
    .asset_type("mesh")
    .reverse(move |id| name.mesh_name(id))
    .install(world, registry);

    let (find, name) = (Rc::clone(renderer), Rc::clone(renderer));
    AssetRefBinding::<MaterialRef, Renderable, MaterialId>::new(
        "MaterialRef",
        field!(Renderable, material),
        MaterialId::INVALID,
        move |n| find.find_material(n),
    )
    .category("Rendering")
    .asset_type("material")
    .reverse(move |id| name.material_name(id))
    .install(world, registry);
}

/// The scene world: entities, hierarchy, systems and reflection
pub struct EcsWorld {
    world: World,
    schedule: Schedule,
    registry: Arc<ComponentRegistry>,
    config: WorldConfig,
}

impl EcsWorld {
    /// World with default config and no backends
    pub fn new() -> Self {
        EcsWorldBuilder::new().build()
    }

    pub fn builder() -> EcsWorldBuilder {
        EcsWorldBuilder::new()
    }

    /// The observed world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the observed world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Component descriptors for tooling
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Entity with identity `LocalTransform` and `WorldTransform`
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.world.spawn();
        self.attach_transforms(entity);
        entity
    }

    /// Entity with transforms and a `SceneEntity` carrying `name`
    pub fn create_named_entity(&mut self, name: &str) -> Entity {
        let entity = self.world.spawn();
        let _ = self.world.set(entity, SceneEntity::new(name));
        self.attach_transforms(entity);
        entity
    }

    /// Named entity tagged `SceneRoot`
    pub fn create_scene_root(&mut self, name: &str) -> Entity {
        let entity = self.create_named_entity(name);
        let _ = self.world.set(entity, SceneRoot);
        entity
    }

    fn attach_transforms(&mut self, entity: Entity) {
        let _ = self.world.set(entity, LocalTransform::default());
        let _ = self.world.set(entity, WorldTransform::default());
    }

    /// Despawn an entity. Its children become roots and re-settle.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        let orphans = self.world.children(entity);
        self.world.despawn(entity)?;
        for child in orphans {
            self.world.modified::<LocalTransform>(child);
        }
        Ok(())
    }

    /// Set a field on a component of `entity` through the registry
    ///
    /// # Errors
    ///
    /// Returns an error if the component or field is unknown, the entity
    /// lacks the component, or the value has the wrong shape
    pub fn set_field(
        &mut self,
        entity: Entity,
        component: &str,
        field: &str,
        value: Value,
    ) -> Result<(), ReflectError> {
        self.registry
            .set_field(&mut self.world, entity, component, field, value)
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// Parent `child` under `parent` and re-settle its world transform
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is missing or the link would form a cycle
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        self.world.set_parent(child, parent)?;
        self.world.modified::<LocalTransform>(child);
        Ok(())
    }

    /// Detach `child`, making it a root
    pub fn remove_parent(&mut self, child: Entity) -> Option<Entity> {
        let old = self.world.remove_parent(child)?;
        self.world.modified::<LocalTransform>(child);
        Some(old)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.parent(entity)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world.children(entity).into_vec()
    }

    /// All descendants, depth first, parents before their children
    pub fn descendants(&self, root: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack: Vec<Entity> = self.world.children(root).into_iter().rev().collect();
        while let Some(entity) = stack.pop() {
            out.push(entity);
            stack.extend(self.world.children(entity).into_iter().rev());
        }
        out
    }

    /// Whether `ancestor` appears above `entity` in the hierarchy
    pub fn is_descendant_of(&self, entity: Entity, ancestor: Entity) -> bool {
        self.world.ancestors(entity).any(|e| e == ancestor)
    }

    /// Entity whose `SceneEntity` name matches, optionally restricted to
    /// descendants of `root`. When several match, the last one visited wins.
    pub fn find_entity_by_name(&self, name: &str, root: Option<Entity>) -> Option<Entity> {
        self.world
            .query::<&SceneEntity>()
            .iter()
            .filter(|(_, scene_entity)| scene_entity.name == name)
            .map(|(entity, _)| entity)
            .filter(|entity| root.is_none_or(|root| self.is_descendant_of(*entity, root)))
            .last()
    }

    // -------------------------------------------------------------------------
    // Cameras
    // -------------------------------------------------------------------------

    /// Make `camera` the only entity tagged `ActiveCamera`. `None` clears it.
    pub fn set_active_camera(&mut self, camera: Option<Entity>) {
        self.world.deferred(|world, commands| {
            for (entity, _) in world.query::<&ActiveCamera>().iter() {
                commands.remove_one::<ActiveCamera>(entity);
            }
            if let Some(camera) = camera.filter(|c| world.contains(*c)) {
                commands.insert_one(camera, ActiveCamera);
            }
        });
        log::debug!("active camera: {camera:?}");
    }

    pub fn active_camera(&self) -> Option<Entity> {
        self.world
            .query::<&ActiveCamera>()
            .iter()
            .next()
            .map(|(entity, _)| entity)
    }

    /// View and projection of the active camera, or of the configured default
    pub fn camera_matrices(&self) -> (Mat4, Mat4) {
        self.active_camera()
            .and_then(|entity| {
                self.world
                    .get::<Camera>(entity)
                    .map(|c| (c.view_matrix, c.projection_matrix))
            })
            .unwrap_or_else(|| {
                let fallback = &self.config.default_camera;
                (fallback.view_matrix(), fallback.projection_matrix())
            })
    }

    // -------------------------------------------------------------------------
    // Spatial queries
    // -------------------------------------------------------------------------

    pub fn query_point(&self, point: Vec3, layer_mask: u32) -> Vec<Entity> {
        spatial::query_point(&self.world, point, layer_mask)
    }

    pub fn query_sphere(&self, center: Vec3, radius: f32, layer_mask: u32) -> Vec<Entity> {
        spatial::query_sphere(&self.world, center, radius, layer_mask)
    }

    // -------------------------------------------------------------------------
    // Frame
    // -------------------------------------------------------------------------

    /// Add a system to the schedule
    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        system: impl FnMut(&mut World, f32) + 'static,
    ) {
        self.schedule.add_system(name, phase, system);
    }

    /// Run one tick
    pub fn progress(&mut self, delta_time: f32) {
        self.schedule.run(&mut self.world, delta_time);
    }

    pub fn mode(&self) -> PipelineMode {
        self.world.phases().mode()
    }

    /// Switch between Play and Edit
    pub fn set_mode(&mut self, mode: PipelineMode) {
        self.world.phases_mut().set_mode(mode);
    }

    /// Submit one draw per visible `Renderable` with a `WorldTransform`.
    /// Returns the number of commands submitted.
    pub fn submit_render_commands(&self, renderer: &dyn RenderBackend) -> usize {
        let (camera_view, camera_projection) = self.camera_matrices();
        let mut submitted = 0;
        let mut query = self.world.query::<(&WorldTransform, &Renderable)>();
        for (_, (transform, renderable)) in query.iter() {
            if !renderable.visible {
                continue;
            }
            renderer.submit(RenderCommand {
                mesh: renderable.mesh,
                shader: renderable.shader,
                material: renderable.material,
                render_state: renderable.render_state,
                transform: transform.matrix,
                camera_view,
                camera_projection,
            });
            submitted += 1;
        }
        log::trace!("submitted {submitted} render commands");
        submitted
    }
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use rustc_hash::FxHashMap;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct FakeRenderer {
        shaders: FxHashMap<String, u32>,
        meshes: FxHashMap<String, u32>,
        materials: FxHashMap<String, u32>,
        submitted: RefCell<Vec<RenderCommand>>,
    }

    fn lookup(table: &FxHashMap<String, u32>, name: &str) -> u32 {
        table.get(name).copied().unwrap_or(0)
    }

    fn reverse(table: &FxHashMap<String, u32>, id: u32) -> String {
        table
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.clone())
            .unwrap_or_default()
    }

    impl FakeRenderer {
        fn with_assets() -> Self {
            let mut renderer = Self::default();
            renderer.shaders.insert("basic".into(), 1);
            renderer.shaders.insert("lit".into(), 2);
            renderer.meshes.insert("cube".into(), 1);
            renderer.materials.insert("red".into(), 4);
            renderer
        }
    }

    impl RenderBackend for FakeRenderer {
        fn find_shader(&self, name: &str) -> ShaderId {
            ShaderId(lookup(&self.shaders, name))
        }

        fn shader_name(&self, id: ShaderId) -> String {
            reverse(&self.shaders, id.0)
        }

        fn find_mesh(&self, name: &str) -> MeshId {
            MeshId(lookup(&self.meshes, name))
        }

        fn mesh_name(&self, id: MeshId) -> String {
            reverse(&self.meshes, id.0)
        }

        fn find_material(&self, name: &str) -> MaterialId {
            MaterialId(lookup(&self.materials, name))
        }

        fn material_name(&self, id: MaterialId) -> String {
            reverse(&self.materials, id.0)
        }

        fn submit(&self, command: RenderCommand) {
            self.submitted.borrow_mut().push(command);
        }
    }

    fn world_position(ecs: &EcsWorld, entity: Entity) -> Vec3 {
        ecs.world().get::<WorldTransform>(entity).unwrap().position
    }

    #[test]
    fn test_reparent_updates_world_transform() {
        let mut ecs = EcsWorld::new();
        let e1 = ecs.create_entity();
        let e2 = ecs.create_entity();
        ecs.world_mut()
            .set(e2, LocalTransform::from_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();

        ecs.set_parent(e2, e1).unwrap();
        assert!(world_position(&ecs, e2).abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));

        let e3 = ecs.create_entity();
        ecs.world_mut()
            .set(e3, LocalTransform::from_position(Vec3::new(0.0, 5.0, 0.0)))
            .unwrap();
        ecs.set_parent(e2, e3).unwrap();

        assert!(world_position(&ecs, e2).abs_diff_eq(Vec3::new(1.0, 5.0, 0.0), 1e-6));
        assert_eq!(ecs.parent(e2), Some(e3));
        assert!(ecs.children(e1).is_empty());

        ecs.remove_parent(e2);
        assert!(world_position(&ecs, e2).abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_builtin_components_registered() {
        let ecs = EcsWorld::new();
        let registry = ecs.registry();

        assert_eq!(
            registry.categories(),
            vec!["Audio", "Core", "Physics", "Rendering"]
        );
        assert!(registry.find_component("Transform").is_some());
        assert!(registry.find_by_type::<WorldTransform>().is_some());
        assert_eq!(
            registry
                .find_component("ShaderRef")
                .unwrap()
                .fields[0]
                .asset_type,
            "shader"
        );
        assert_eq!(
            registry.find_component("SoundRef").unwrap().category,
            "Audio"
        );
        assert_eq!(registry.components_by_category("Audio").len(), 3);

        let body = registry.find_component("RigidBody").unwrap();
        assert_eq!(body.fields[0].field_type, FieldType::Enum);
        assert_eq!(
            body.fields[0].enum_labels,
            vec!["Static", "Kinematic", "Dynamic"]
        );
        assert_eq!(body.fields[1].field_type, FieldType::ReadOnly);
    }

    #[test]
    fn test_render_refs_resolve_through_renderer() {
        let renderer = Rc::new(FakeRenderer::with_assets());
        let mut ecs = EcsWorld::builder().with_renderer(renderer).build();
        let e = ecs.create_named_entity("box");
        ecs.world_mut().set(e, Renderable::default()).unwrap();

        ecs.world_mut().set(e, ShaderRef::new("lit")).unwrap();
        ecs.world_mut().set(e, MeshRef::new("cube")).unwrap();
        ecs.world_mut().set(e, MaterialRef::new("red")).unwrap();
        {
            let renderable = ecs.world().get::<Renderable>(e).unwrap();
            assert_eq!(renderable.shader, ShaderId(2));
            assert_eq!(renderable.mesh, MeshId(1));
            assert_eq!(renderable.material, MaterialId(4));
        }

        ecs.world_mut()
            .update::<Renderable>(e, |r| r.shader = ShaderId(1));
        assert_eq!(ecs.world().get::<ShaderRef>(e).unwrap().name, "basic");
    }

    #[test]
    fn test_refs_declared_without_backends() {
        let mut ecs = EcsWorld::new();
        let e = ecs.create_entity();
        ecs.world_mut().set(e, Renderable::default()).unwrap();
        ecs.world_mut().set(e, AudioSource::default()).unwrap();

        assert!(ecs.world().has::<ShaderRef>(e));
        assert!(ecs.world().has::<MeshRef>(e));
        assert!(ecs.world().has::<MaterialRef>(e));
        assert!(ecs.world().has::<SoundRef>(e));

        ecs.world_mut().set(e, ShaderRef::new("lit")).unwrap();
        assert_eq!(
            ecs.world().get::<Renderable>(e).unwrap().shader,
            ShaderId::INVALID
        );
    }

    #[test]
    fn test_hierarchy_queries() {
        let mut ecs = EcsWorld::new();
        let root = ecs.create_scene_root("level");
        let house = ecs.create_named_entity("house");
        let door = ecs.create_named_entity("door");
        let other_root = ecs.create_scene_root("other");
        let other_door = ecs.create_named_entity("door");
        ecs.set_parent(house, root).unwrap();
        ecs.set_parent(door, house).unwrap();
        ecs.set_parent(other_door, other_root).unwrap();

        assert_eq!(ecs.descendants(root), vec![house, door]);
        assert!(ecs.is_descendant_of(door, root));
        assert!(!ecs.is_descendant_of(root, door));
        assert_eq!(ecs.find_entity_by_name("door", Some(root)), Some(door));
        assert_eq!(
            ecs.find_entity_by_name("door", Some(other_root)),
            Some(other_door)
        );
        assert!(ecs.find_entity_by_name("door", None).is_some());
        assert_eq!(ecs.find_entity_by_name("window", None), None);

        let first = ecs.create_named_entity("dup");
        let second = ecs.create_named_entity("dup");
        assert_ne!(first, second);
        assert_eq!(ecs.find_entity_by_name("dup", None), Some(second));
        assert!(ecs.world().has::<SceneRoot>(root));

        assert_eq!(ecs.set_parent(root, door), Err(HierarchyError::Cycle));
    }

    #[test]
    fn test_destroy_entity_orphans_children() {
        let mut ecs = EcsWorld::new();
        let root = ecs.create_entity();
        ecs.world_mut()
            .set(
                root,
                LocalTransform::from_position(Vec3::new(0.0, 10.0, 0.0)),
            )
            .unwrap();
        let child = ecs.create_entity();
        ecs.world_mut()
            .set(child, LocalTransform::from_position(Vec3::X))
            .unwrap();
        let grandchild = ecs.create_entity();
        ecs.set_parent(child, root).unwrap();
        ecs.set_parent(grandchild, child).unwrap();
        assert!(world_position(&ecs, child).abs_diff_eq(Vec3::new(1.0, 10.0, 0.0), 1e-6));

        ecs.destroy_entity(root).unwrap();
        assert!(!ecs.world().contains(root));
        assert_eq!(ecs.parent(child), None);
        assert_eq!(ecs.parent(grandchild), Some(child));
        assert!(world_position(&ecs, child).abs_diff_eq(Vec3::X, 1e-6));
        assert!(world_position(&ecs, grandchild).abs_diff_eq(Vec3::X, 1e-6));
        assert!(ecs.destroy_entity(root).is_err());
        assert_eq!(
            ecs.set_parent(child, root),
            Err(HierarchyError::NoSuchEntity)
        );
        assert_eq!(ecs.parent(child), None);
    }

    #[test]
    fn test_active_camera_is_unique() {
        let mut ecs = EcsWorld::new();
        let a = ecs.create_entity();
        let b = ecs.create_entity();
        ecs.world_mut().set(a, Camera::default()).unwrap();
        ecs.world_mut().set(b, Camera::default()).unwrap();

        ecs.set_active_camera(Some(a));
        assert_eq!(ecs.active_camera(), Some(a));
        ecs.set_active_camera(Some(b));
        assert_eq!(ecs.active_camera(), Some(b));
        assert!(!ecs.world().has::<ActiveCamera>(a));

        ecs.set_active_camera(None);
        assert_eq!(ecs.active_camera(), None);
    }

    #[test]
    fn test_submit_render_commands() {
        let renderer = FakeRenderer::with_assets();
        let mut ecs = EcsWorld::new();
        let visible = ecs.create_entity();
        ecs.world_mut()
            .set(
                visible,
                LocalTransform::from_position(Vec3::new(2.0, 0.0, 0.0)),
            )
            .unwrap();
        ecs.world_mut().set(visible, Renderable::default()).unwrap();
        let hidden = ecs.create_entity();
        ecs.world_mut()
            .set(
                hidden,
                Renderable {
                    visible: false,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(ecs.submit_render_commands(&renderer), 1);
        let command = renderer.submitted.borrow()[0];
        assert_eq!(
            command.transform,
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
        );
        let fallback = ecs.config().default_camera;
        assert_eq!(command.camera_view, fallback.view_matrix());

        let camera = ecs.create_entity();
        ecs.world_mut()
            .set(
                camera,
                LocalTransform::from_position(Vec3::new(0.0, 3.0, 3.0)),
            )
            .unwrap();
        ecs.world_mut().set(camera, Camera::default()).unwrap();
        ecs.set_active_camera(Some(camera));

        ecs.submit_render_commands(&renderer);
        let command = renderer.submitted.borrow()[1];
        assert_eq!(
            command.camera_view,
            ecs.world().get::<Camera>(camera).unwrap().view_matrix
        );
        assert_ne!(command.camera_view, fallback.view_matrix());
    }

    #[test]
    fn test_progress_respects_mode() {
        let config = WorldConfig::default().with_initial_mode(PipelineMode::Edit);
        let mut ecs = EcsWorld::builder().with_config(config).build();
        let e = ecs.create_entity();
        ecs.world_mut()
            .set(
                e,
                Velocity {
                    linear: Vec3::X,
                    angular: Vec3::ZERO,
                },
            )
            .unwrap();

        ecs.progress(1.0);
        assert_eq!(world_position(&ecs, e), Vec3::ZERO);

        ecs.set_mode(PipelineMode::Play);
        ecs.progress(1.0);
        assert!(world_position(&ecs, e).abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_set_field_propagates() {
        let mut ecs = EcsWorld::new();
        let parent = ecs.create_entity();
        let child = ecs.create_entity();
        ecs.set_parent(child, parent).unwrap();

        ecs.set_field(parent, "Transform", "position", json!([0.0, 0.0, 4.0]))
            .unwrap();
        assert!(world_position(&ecs, child).abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-6));

        let err = ecs.set_field(parent, "Transform", "size", json!(1.0))
            .unwrap_err();
        assert!(matches!(err, ReflectError::UnknownField { .. }));
    }
}
