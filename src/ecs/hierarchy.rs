//! Entity hierarchy components
//!
//! Parent-child relation used by transform propagation. Both sides are kept
//! in sync by [`World::set_parent`](super::World::set_parent); do not insert
//! these components by hand.

use hecs::Entity;
use smallvec::SmallVec;

/// Parent component - indicates this entity has a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

impl Parent {
    /// Create a new parent reference
    #[must_use]
    pub const fn new(entity: Entity) -> Self {
        Self(entity)
    }

    /// Get the parent entity
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.0
    }
}

/// Children component - tracks all children of this entity
#[derive(Debug, Clone, Default)]
pub struct Children(pub SmallVec<[Entity; 8]>);

impl Children {
    /// Create from a single child
    #[must_use]
    pub fn single(child: Entity) -> Self {
        let mut children = SmallVec::new();
        children.push(child);
        Self(children)
    }

    /// Add a child
    pub fn add(&mut self, child: Entity) {
        if !self.0.contains(&child) {
            self.0.push(child);
        }
    }

    /// Remove a child
    pub fn remove(&mut self, child: Entity) -> bool {
        if let Some(pos) = self.0.iter().position(|&e| e == child) {
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if this entity has children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over children
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }
}

/// Errors that can occur when editing the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    /// Child or parent does not exist
    NoSuchEntity,
    /// An entity cannot be its own parent
    SelfParent,
    /// The new parent is a descendant of the child
    Cycle,
}

impl std::fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuchEntity => write!(f, "no such entity"),
            Self::SelfParent => write!(f, "entity cannot be its own parent"),
            Self::Cycle => write!(f, "parent is a descendant of the child"),
        }
    }
}

impl std::error::Error for HierarchyError {}
