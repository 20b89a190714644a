//! Audio components

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ecs::{FieldAccessor, FieldType, NameRef, Reflect};
use crate::field;

/// Requested playback state of an [`AudioSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum PlayState {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlayState {
    /// Labels in discriminant order, for enum fields
    pub const LABELS: [&'static str; 3] = ["Playing", "Paused", "Stopped"];
}

impl From<PlayState> for u32 {
    fn from(value: PlayState) -> Self {
        value as u32
    }
}

impl TryFrom<u32> for PlayState {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Playing),
            1 => Ok(Self::Paused),
            2 => Ok(Self::Stopped),
            other => Err(format!("invalid play state {other}")),
        }
    }
}

impl Reflect for PlayState {
    const FIELD_TYPE: FieldType = FieldType::Enum;
}

/// A sound emitter. Attaching it also attaches a [`SoundRef`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSource {
    /// Clip handle, 0 when no clip is bound
    pub clip_id: u32,
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    /// Positioned in 3D
    pub spatial: bool,
    /// Fallback position for entities without `WorldTransform`
    pub position: Vec3,
    pub state: PlayState,
    /// Backend play handle, 0 when not started
    pub play_handle: u32,
}

impl Default for AudioSource {
    fn default() -> Self {
        Self {
            clip_id: 0,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            spatial: false,
            position: Vec3::ZERO,
            state: PlayState::Stopped,
            play_handle: 0,
        }
    }
}

impl AudioSource {
    /// Source that starts playing on the next simulation tick
    #[must_use]
    pub fn playing(clip_id: u32) -> Self {
        Self {
            clip_id,
            state: PlayState::Playing,
            ..Default::default()
        }
    }
}

/// Where sounds are heard from. One per scene is expected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioListener {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

/// Sound asset referenced by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundRef {
    pub name: String,
}

impl SoundRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl NameRef for SoundRef {
    fn name_field() -> FieldAccessor<Self, String> {
        field!(SoundRef, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_state_serializes_as_index() {
        assert_eq!(
            serde_json::to_value(PlayState::Paused).unwrap(),
            serde_json::json!(1)
        );
        assert!(serde_json::from_value::<PlayState>(serde_json::json!(3)).is_err());
        assert_eq!(AudioSource::default().state, PlayState::Stopped);
    }
}
