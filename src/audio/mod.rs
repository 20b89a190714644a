//! Audio boundary
//!
//! Decoding, mixing and clip storage live in an external audio backend. The
//! ECS owns `AudioSource` and `AudioListener` components and pushes them to
//! the backend during the Simulation phase.

mod backend;
mod components;
mod system;

pub use backend::{AudioBackend, SoundCatalog};
pub use components::{AudioListener, AudioSource, PlayState, SoundRef};
pub use system::{
    audio_listener_system, audio_source_system, register, resolve_sound, sound_ref_binding,
};
