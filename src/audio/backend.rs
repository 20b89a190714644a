//! Interfaces to the audio backend and the scene sound catalogue

use std::path::{Path, PathBuf};

use super::components::AudioListener;

/// Playback service. Clip and play handles are non-zero; 0 means none.
pub trait AudioBackend {
    fn is_initialized(&self) -> bool;
    /// Clip already loaded under `name`, or 0
    fn find_clip_by_name(&self, name: &str) -> u32;
    /// Load a clip from disk and register it under `name`; 0 on failure
    fn load_clip_named(&self, name: &str, path: &Path) -> u32;
    /// Start a clip, returning a play handle or 0
    fn play_clip(&self, clip: u32, volume: f32, looping: bool) -> u32;
    fn pause(&self, handle: u32);
    fn resume(&self, handle: u32);
    fn stop(&self, handle: u32);
    fn set_volume(&self, handle: u32, volume: f32);
    fn set_pitch(&self, handle: u32, pitch: f32);
    fn set_source_position(&self, handle: u32, x: f32, y: f32, z: f32);
    /// Place the listener: position, facing and world up
    fn set_listener_position(&self, listener: &AudioListener);
}

/// Sound assets declared by the active scene
pub trait SoundCatalog {
    /// File backing the sound asset `name`, if the scene declares one
    fn sound_path(&self, name: &str) -> Option<PathBuf>;
}
