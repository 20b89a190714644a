//! Headless demo: a small scene ticked for a few frames

use std::cell::Cell;
use std::rc::Rc;

use scene_ecs::prelude::*;

/// Renderer stand-in that knows a few asset names and logs draws
#[derive(Default)]
struct LogRenderer {
    draws: Cell<usize>,
}

impl RenderBackend for LogRenderer {
    fn find_shader(&self, name: &str) -> ShaderId {
        match name {
            "basic" => ShaderId(1),
            _ => ShaderId::INVALID,
        }
    }

    fn shader_name(&self, id: ShaderId) -> String {
        if id == ShaderId(1) {
            "basic".into()
        } else {
            String::new()
        }
    }

    fn find_mesh(&self, name: &str) -> MeshId {
        match name {
            "cube" => MeshId(1),
            "plane" => MeshId(2),
            _ => MeshId::INVALID,
        }
    }

    fn mesh_name(&self, id: MeshId) -> String {
        match id.0 {
            1 => "cube".into(),
            2 => "plane".into(),
            _ => String::new(),
        }
    }

    fn find_material(&self, _name: &str) -> MaterialId {
        MaterialId::INVALID
    }

    fn material_name(&self, _id: MaterialId) -> String {
        String::new()
    }

    fn submit(&self, command: RenderCommand) {
        self.draws.set(self.draws.get() + 1);
        let uniform = command.model_uniform();
        log::debug!(
            "draw mesh {:?}: {} uniform bytes, origin {:?}",
            command.mesh,
            bytemuck::bytes_of(&uniform).len(),
            uniform.model[3]
        );
    }
}

fn main() {
    env_logger::init();

    let renderer = Rc::new(LogRenderer::default());
    let mut ecs = EcsWorld::builder().with_renderer(renderer.clone()).build();

    let root = ecs.create_scene_root("Level");

    let ground = ecs.create_named_entity("Ground");
    let world = ecs.world_mut();
    let _ = world.set(ground, Renderable::default());
    let _ = world.set(ground, MeshRef::new("plane"));
    let _ = world.set(ground, ShaderRef::new("basic"));

    let spinner = ecs.create_named_entity("Spinner");
    let world = ecs.world_mut();
    let _ = world.set(spinner, LocalTransform::from_position(Vec3::Y));
    let _ = world.set(spinner, Rotating);
    let _ = world.set(spinner, Renderable::default());
    let _ = world.set(spinner, MeshRef::new("cube"));
    let _ = world.set(spinner, ShaderRef::new("basic"));

    let moon = ecs.create_named_entity("Moon");
    let orbit = LocalTransform::from_position(Vec3::X * 2.0);
    let _ = ecs.world_mut().set(moon, orbit);
    let _ = ecs.world_mut().set(moon, Renderable::default());
    let _ = ecs.world_mut().set(moon, MeshRef::new("cube"));

    let camera = ecs.create_named_entity("Camera");
    let eye = LocalTransform::from_position(Vec3::new(0.0, 4.0, 8.0));
    let _ = ecs.world_mut().set(camera, eye);
    let mut lens = Camera::default();
    lens.set_aspect(1280, 720);
    let _ = ecs.world_mut().set(camera, lens);
    ecs.set_active_camera(Some(camera));

    for (child, parent) in [(ground, root), (spinner, root), (moon, spinner)] {
        if let Err(e) = ecs.set_parent(child, parent) {
            log::error!("failed to build hierarchy: {e}");
            return;
        }
    }

    for frame in 0..5 {
        ecs.progress(1.0 / 60.0);
        let submitted = ecs.submit_render_commands(renderer.as_ref());
        if let Some(moon_world) = ecs.world().get::<WorldTransform>(moon) {
            log::info!(
                "frame {frame}: {submitted} draws, moon at {}",
                moon_world.position
            );
        }
    }

    ecs.set_mode(PipelineMode::Edit);
    ecs.progress(1.0 / 60.0);
    log::info!("paused after {} draws total", renderer.draws.get());

    if let Some(info) = ecs.registry().find_component("Transform") {
        let labels: Vec<&str> = info.fields.iter().map(FieldInfo::label).collect();
        log::info!("Transform fields: {}", labels.join(", "));
    }

    match ecs.registry().serialize_entity(ecs.world(), spinner) {
        Ok(json) => log::info!("spinner: {json}"),
        Err(e) => log::error!("failed to serialize spinner: {e}"),
    }
}
