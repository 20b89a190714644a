//! Rigid body component shared with the physics backend

use serde::{Deserialize, Serialize};

use crate::ecs::{FieldType, Reflect};

/// How the physics backend simulates a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum MotionType {
    /// Never moves
    #[default]
    Static,
    /// Moved by gameplay, pushes dynamic bodies
    Kinematic,
    /// Moved by the solver; physics owns its world pose while simulating
    Dynamic,
}

impl MotionType {
    /// Labels in discriminant order, for enum fields
    pub const LABELS: [&'static str; 3] = ["Static", "Kinematic", "Dynamic"];
}

impl From<MotionType> for u32 {
    fn from(value: MotionType) -> Self {
        value as u32
    }
}

impl TryFrom<u32> for MotionType {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Static),
            1 => Ok(Self::Kinematic),
            2 => Ok(Self::Dynamic),
            other => Err(format!("invalid motion type {other}")),
        }
    }
}

impl Reflect for MotionType {
    const FIELD_TYPE: FieldType = FieldType::Enum;
}

/// Rigid body attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RigidBody {
    pub motion_type: MotionType,
    /// Backend handle, 0 until the backend creates the body
    pub body_id: u64,
}

impl RigidBody {
    /// A body not yet known to the backend
    #[must_use]
    pub const fn new(motion_type: MotionType) -> Self {
        Self {
            motion_type,
            body_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_type_serializes_as_index() {
        assert_eq!(
            serde_json::to_value(MotionType::Dynamic).unwrap(),
            serde_json::json!(2)
        );
        let parsed: MotionType = serde_json::from_value(serde_json::json!(1)).unwrap();
        assert_eq!(parsed, MotionType::Kinematic);
        assert!(serde_json::from_value::<MotionType>(serde_json::json!(7)).is_err());
    }
}
