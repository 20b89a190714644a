//! Playback driving and sound name resolution

use std::rc::Rc;

use hecs::Entity;

use super::backend::{AudioBackend, SoundCatalog};
use super::components::{AudioListener, AudioSource, PlayState, SoundRef};
use crate::ecs::{AssetRefBinding, Phase, Schedule, World, WorldTransform};
use crate::field;

/// Resolve a sound name to a clip handle.
///
/// Clips already loaded are found by name. Otherwise the scene catalogue is
/// asked for the file and the clip is loaded on the spot. Returns 0 when the
/// backend is down or the name is unknown.
pub fn resolve_sound(backend: &dyn AudioBackend, catalog: &dyn SoundCatalog, name: &str) -> u32 {
    if !backend.is_initialized() {
        return 0;
    }
    let id = backend.find_clip_by_name(name);
    if id != 0 {
        return id;
    }
    match catalog.sound_path(name) {
        Some(path) if !path.as_os_str().is_empty() => {
            log::debug!("lazy loading sound '{name}' from {}", path.display());
            backend.load_clip_named(name, &path)
        }
        _ => 0,
    }
}

/// `SoundRef` -> `AudioSource::clip_id` binding.
///
/// Forward only: lazily loaded clips have no canonical name to sync back.
pub fn sound_ref_binding(
    backend: Rc<dyn AudioBackend>,
    catalog: Rc<dyn SoundCatalog>,
) -> AssetRefBinding<SoundRef, AudioSource, u32> {
    AssetRefBinding::new("SoundRef", field!(AudioSource, clip_id), 0, move |name| {
        resolve_sound(backend.as_ref(), catalog.as_ref(), name)
    })
    .category("Audio")
    .asset_type("sound")
}

/// Apply one source's requested state, returning its new play handle
fn drive(backend: &dyn AudioBackend, world: &World, entity: Entity, source: &AudioSource) -> u32 {
    let mut handle = source.play_handle;
    match source.state {
        PlayState::Playing => {
            if handle == 0 && source.clip_id != 0 {
                handle = backend.play_clip(source.clip_id, source.volume, source.looping);
            } else if handle != 0 {
                backend.resume(handle);
            }
            if handle != 0 {
                backend.set_volume(handle, source.volume);
                backend.set_pitch(handle, source.pitch);
                if source.spatial {
                    let position = world
                        .get::<WorldTransform>(entity)
                        .map_or(source.position, |wt| wt.position);
                    backend.set_source_position(handle, position.x, position.y, position.z);
                }
            }
        }
        PlayState::Paused => {
            if handle != 0 {
                backend.pause(handle);
            }
        }
        PlayState::Stopped => {
            if handle != 0 {
                backend.stop(handle);
                handle = 0;
            }
        }
    }
    handle
}

/// The `AudioSourceSystem`: drives playback from `AudioSource` components
pub fn audio_source_system(backend: Rc<dyn AudioBackend>) -> impl FnMut(&mut World, f32) + 'static {
    move |world, _delta_time| {
        if !backend.is_initialized() {
            return;
        }
        let sources: Vec<(Entity, AudioSource)> = world
            .query::<&AudioSource>()
            .iter()
            .map(|(entity, source)| (entity, *source))
            .collect();

        for (entity, source) in sources {
            let handle = drive(backend.as_ref(), world, entity, &source);
            if handle != source.play_handle {
                if let Some(mut source) = world.get_mut::<AudioSource>(entity) {
                    source.play_handle = handle;
                }
            }
        }
    }
}

/// The `AudioListenerSystem`: keeps the backend listener on the
/// `AudioListener` component
pub fn audio_listener_system(
    backend: Rc<dyn AudioBackend>,
) -> impl FnMut(&mut World, f32) + 'static {
    move |world, _delta_time| {
        if !backend.is_initialized() {
            return;
        }
        for (_, listener) in world.query::<&AudioListener>().iter() {
            backend.set_listener_position(listener);
        }
    }
}

/// Add the source and listener systems to the Simulation phase
pub fn register(schedule: &mut Schedule, backend: &Rc<dyn AudioBackend>) {
    schedule.add_system(
        "AudioSourceSystem",
        Phase::Simulation,
        audio_source_system(Rc::clone(backend)),
    );
    schedule.add_system(
        "AudioListenerSystem",
        Phase::Simulation,
        audio_listener_system(Rc::clone(backend)),
    );
}
