//! Physics boundary
//!
//! The physics backend lives outside this crate. The core only reads the
//! body classification so transform propagation knows when physics owns an
//! entity's world pose.

mod body;

pub use body::{MotionType, RigidBody};
