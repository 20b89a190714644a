//! World wrapper around hecs
//!
//! `hecs` provides archetype storage and queries. This wrapper layers the
//! capabilities the rest of the crate relies on:
//!
//! - **Observers**: callbacks fired synchronously on component add/write
//! - **Always-together rules**: attaching one component attaches another
//! - **Parent/child relation**: kept consistent across reparent and despawn
//! - **Deferred scopes**: structural changes buffered in a `CommandBuffer`
//!
//! Writes made through [`World::set`], [`World::update`] and
//! [`World::modified`] notify observers. [`World::get_mut`] is a raw write
//! that notifies nobody; observers use it to avoid re-triggering themselves.

use std::any::TypeId;
use std::rc::Rc;

use hecs::{Component, Entity};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::hierarchy::{Children, HierarchyError, Parent};
use super::phases::PipelinePhases;

/// Component lifecycle events observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverEvent {
    /// The component was attached to an entity that did not have it
    OnAdd,
    /// The component value was written (or explicitly marked modified)
    OnSet,
}

/// Identifier returned when an observer is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

type ObserverFn = dyn Fn(&mut World, Entity);

/// A component requirement checked before an observer fires
#[derive(Clone, Copy)]
struct Term {
    type_id: TypeId,
    has: fn(&hecs::World, Entity) -> bool,
}

impl Term {
    fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            has: has_component::<T>,
        }
    }
}

struct Observer {
    name: String,
    terms: SmallVec<[Term; 4]>,
    callback: Rc<ObserverFn>,
}

/// Component attached automatically alongside another one
#[derive(Clone, Copy)]
struct Companion {
    term: Term,
    insert_default: fn(&mut hecs::World, Entity),
}

fn has_component<T: Component>(world: &hecs::World, entity: Entity) -> bool {
    world.entity(entity).is_ok_and(|e| e.has::<T>())
}

fn insert_default<T: Component + Default>(world: &mut hecs::World, entity: Entity) {
    // Entity liveness is checked by the caller
    let _ = world.insert_one(entity, T::default());
}

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    inner: hecs::World,
    /// Registered observers, indexed by `ObserverId`
    observers: Vec<Rc<Observer>>,
    /// Observers interested in an (event, component) pair
    triggers: FxHashMap<(ObserverEvent, TypeId), SmallVec<[usize; 4]>>,
    /// Always-together rules keyed by the owning component
    companions: FxHashMap<TypeId, SmallVec<[Companion; 2]>>,
    /// Play/Edit gate shared with observers
    phases: PipelinePhases,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
            observers: Vec::new(),
            triggers: FxHashMap::default(),
            companions: FxHashMap::default(),
            phases: PipelinePhases::default(),
        }
    }

    /// Query for entities with the given components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Spawn an empty entity
    pub fn spawn(&mut self) -> Entity {
        self.inner.spawn(())
    }

    /// Despawn an entity.
    ///
    /// The entity is detached from its parent and its children become roots;
    /// children are not despawned.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.inner.contains(entity) {
            return Err(hecs::NoSuchEntity);
        }
        self.detach(entity);
        for child in self.children(entity) {
            let _ = self.inner.remove_one::<Parent>(child);
        }
        self.inner.despawn(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Check whether an entity carries a component
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        has_component::<T>(&self.inner, entity)
    }

    /// Get a reference to a component
    pub fn get<T: Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.inner.get::<&T>(entity).ok()
    }

    /// Get a copy of a component
    pub fn cloned<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.get::<T>(entity).map(|c| (*c).clone())
    }

    /// Get a mutable reference to a component without notifying observers
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, T>> {
        self.inner.get::<&mut T>(entity).ok()
    }

    /// Write a component and notify observers.
    ///
    /// Fires `OnAdd` (after attaching always-together companions) when the
    /// component is new, then `OnSet`.
    pub fn set<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), hecs::NoSuchEntity> {
        let added = !self.has::<T>(entity);
        self.inner.insert_one(entity, component)?;
        if added {
            self.on_added(entity, Term::of::<T>());
        }
        self.dispatch(ObserverEvent::OnSet, entity, &[TypeId::of::<T>()]);
        Ok(())
    }

    /// Attach a default component if missing. Fires `OnAdd` only.
    pub fn add<T: Component + Default>(
        &mut self,
        entity: Entity,
    ) -> Result<(), hecs::NoSuchEntity> {
        if !self.inner.contains(entity) {
            return Err(hecs::NoSuchEntity);
        }
        if !self.has::<T>(entity) {
            self.inner.insert_one(entity, T::default())?;
            self.on_added(entity, Term::of::<T>());
        }
        Ok(())
    }

    /// Mutate a component in place and notify observers.
    ///
    /// Returns `false` if the entity does not carry the component.
    pub fn update<T: Component>(&mut self, entity: Entity, f: impl FnOnce(&mut T)) -> bool {
        match self.inner.get::<&mut T>(entity) {
            Ok(mut component) => f(&mut component),
            Err(_) => return false,
        }
        self.dispatch(ObserverEvent::OnSet, entity, &[TypeId::of::<T>()]);
        true
    }

    /// Fire `OnSet` for a component that was changed elsewhere
    pub fn modified<T: Component>(&mut self, entity: Entity) {
        if self.has::<T>(entity) {
            self.dispatch(ObserverEvent::OnSet, entity, &[TypeId::of::<T>()]);
        }
    }

    /// Remove a component, returning it
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.inner.remove_one::<T>(entity).ok()
    }

    /// Register an always-together rule: attaching `T` also attaches `R`
    pub fn add_with<T: Component, R: Component + Default>(&mut self) {
        let companion = Companion {
            term: Term::of::<R>(),
            insert_default: insert_default::<R>,
        };
        let id = companion.term.type_id;
        let list = self.companions.entry(TypeId::of::<T>()).or_default();
        if !list.iter().any(|c| c.term.type_id == id) {
            list.push(companion);
        }
    }

    fn on_added(&mut self, entity: Entity, term: Term) {
        let mut added: SmallVec<[TypeId; 4]> = SmallVec::new();
        added.push(term.type_id);

        let mut i = 0;
        while i < added.len() {
            let companions = self.companions.get(&added[i]).cloned().unwrap_or_default();
            for companion in companions {
                if !(companion.term.has)(&self.inner, entity) {
                    (companion.insert_default)(&mut self.inner, entity);
                    added.push(companion.term.type_id);
                }
            }
            i += 1;
        }

        self.dispatch(ObserverEvent::OnAdd, entity, &added);
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    /// Start building an observer
    pub fn observer(&mut self, name: impl Into<String>) -> ObserverBuilder<'_> {
        ObserverBuilder {
            world: self,
            name: name.into(),
            terms: SmallVec::new(),
            triggers: SmallVec::new(),
        }
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn dispatch(&mut self, event: ObserverEvent, entity: Entity, types: &[TypeId]) {
        let mut fired: SmallVec<[usize; 8]> = SmallVec::new();
        for type_id in types {
            if let Some(ids) = self.triggers.get(&(event, *type_id)) {
                for id in ids {
                    if !fired.contains(id) {
                        fired.push(*id);
                    }
                }
            }
        }

        for id in fired {
            if !self.inner.contains(entity) {
                return;
            }
            let observer = Rc::clone(&self.observers[id]);
            if observer.terms.iter().all(|t| (t.has)(&self.inner, entity)) {
                log::trace!(
                    "observer {} fired for {entity:?} ({event:?})",
                    observer.name
                );
                (observer.callback)(self, entity);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// Make `child` a child of `parent`, detaching it from any previous parent.
    ///
    /// Refuses self-parenting and cycles. No observers fire; callers decide
    /// whether transforms need to be refreshed.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        if !self.inner.contains(child) || !self.inner.contains(parent) {
            return Err(HierarchyError::NoSuchEntity);
        }
        if child == parent {
            return Err(HierarchyError::SelfParent);
        }
        if parent_chain(&self.inner, parent).any(|ancestor| ancestor == child) {
            return Err(HierarchyError::Cycle);
        }

        self.detach(child);
        self.inner
            .insert_one(child, Parent::new(parent))
            .map_err(|_| HierarchyError::NoSuchEntity)?;

        if let Some(mut children) = self.get_mut::<Children>(parent) {
            children.add(child);
            return Ok(());
        }
        self.inner
            .insert_one(parent, Children::single(child))
            .map_err(|_| HierarchyError::NoSuchEntity)
    }

    /// Remove the parent relation of `child`. Returns the old parent.
    pub fn remove_parent(&mut self, child: Entity) -> Option<Entity> {
        let old = self.detach(child);
        let _ = self.inner.remove_one::<Parent>(child);
        old
    }

    /// Get the parent of an entity
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.get::<Parent>(entity).map(|p| p.entity())
    }

    /// Get the direct children of an entity, in insertion order
    pub fn children(&self, entity: Entity) -> SmallVec<[Entity; 8]> {
        self.get::<Children>(entity)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    /// Iterate the ancestors of an entity, nearest first
    pub fn ancestors(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        parent_chain(&self.inner, entity)
    }

    fn detach(&mut self, child: Entity) -> Option<Entity> {
        let old = self.parent(child)?;
        let now_empty = match self.inner.get::<&mut Children>(old) {
            Ok(mut children) => {
                children.remove(child);
                children.is_empty()
            }
            Err(_) => false,
        };
        if now_empty {
            let _ = self.inner.remove_one::<Children>(old);
        }
        Some(old)
    }

    // -------------------------------------------------------------------------
    // Deferred structural changes
    // -------------------------------------------------------------------------

    /// Run `f` with a command buffer and apply the buffered changes after it
    /// returns, so `f` may query the world while queuing structural edits.
    ///
    /// Buffered changes do not notify observers.
    pub fn deferred<R>(
        &mut self,
        f: impl FnOnce(&hecs::World, &mut hecs::CommandBuffer) -> R,
    ) -> R {
        let mut commands = hecs::CommandBuffer::new();
        let result = f(&self.inner, &mut commands);
        commands.run_on(&mut self.inner);
        result
    }

    // -------------------------------------------------------------------------
    // Pipeline gate
    // -------------------------------------------------------------------------

    /// Play/Edit gate state
    pub fn phases(&self) -> &PipelinePhases {
        &self.phases
    }

    /// Mutable Play/Edit gate state
    pub fn phases_mut(&mut self) -> &mut PipelinePhases {
        &mut self.phases
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_chain(world: &hecs::World, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
    std::iter::successors(
        world.get::<&Parent>(entity).ok().map(|p| p.entity()),
        move |current| world.get::<&Parent>(*current).ok().map(|p| p.entity()),
    )
}

/// Builder for an observer over a set of required components
pub struct ObserverBuilder<'w> {
    world: &'w mut World,
    name: String,
    terms: SmallVec<[Term; 4]>,
    triggers: SmallVec<[(ObserverEvent, TypeId); 4]>,
}

impl ObserverBuilder<'_> {
    /// Require the entity to carry `T` for the observer to fire
    pub fn with<T: Component>(mut self) -> Self {
        let term = Term::of::<T>();
        if !self.terms.iter().any(|t| t.type_id == term.type_id) {
            self.terms.push(term);
        }
        self
    }

    /// Fire when `T` is attached
    pub fn on_add<T: Component>(mut self) -> Self {
        self.triggers
            .push((ObserverEvent::OnAdd, TypeId::of::<T>()));
        self.with::<T>()
    }

    /// Fire when `T` is written
    pub fn on_set<T: Component>(mut self) -> Self {
        self.triggers
            .push((ObserverEvent::OnSet, TypeId::of::<T>()));
        self.with::<T>()
    }

    /// Register the callback
    pub fn each(self, callback: impl Fn(&mut World, Entity) + 'static) -> ObserverId {
        let id = self.world.observers.len();
        for trigger in &self.triggers {
            self.world.triggers.entry(*trigger).or_default().push(id);
        }
        log::debug!("registered observer {}", self.name);
        self.world.observers.push(Rc::new(Observer {
            name: self.name,
            terms: self.terms,
            callback: Rc::new(callback),
        }));
        ObserverId(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Health(i32);

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Armor(i32);

    #[test]
    fn test_set_fires_add_then_set() {
        let mut world = World::new();
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        world
            .observer("add")
            .on_add::<Health>()
            .each(move |_, _| l.borrow_mut().push("add"));
        let l = Rc::clone(&log);
        world
            .observer("set")
            .on_set::<Health>()
            .each(move |_, _| l.borrow_mut().push("set"));

        let e = world.spawn();
        world.set(e, Health(10)).unwrap();
        world.set(e, Health(5)).unwrap();

        assert_eq!(*log.borrow(), vec!["add", "set", "set"]);
    }

    #[test]
    fn test_observer_requires_all_terms() {
        let mut world = World::new();
        let count = Rc::new(Cell::new(0));

        let c = Rc::clone(&count);
        world
            .observer("both")
            .with::<Armor>()
            .on_set::<Health>()
            .each(move |_, _| c.set(c.get() + 1));

        let e = world.spawn();
        world.set(e, Health(1)).unwrap();
        assert_eq!(count.get(), 0);

        world.set(e, Armor(2)).unwrap();
        world.set(e, Health(3)).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_get_mut_does_not_notify() {
        let mut world = World::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        world
            .observer("set")
            .on_set::<Health>()
            .each(move |_, _| c.set(c.get() + 1));

        let e = world.spawn();
        world.set(e, Health(1)).unwrap();
        world.get_mut::<Health>(e).unwrap().0 = 7;
        assert_eq!(count.get(), 1);
        assert_eq!(world.cloned::<Health>(e), Some(Health(7)));

        assert!(world.update::<Health>(e, |h| h.0 += 1));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_always_together() {
        let mut world = World::new();
        world.add_with::<Health, Armor>();

        let e = world.spawn();
        world.set(e, Health(1)).unwrap();
        assert_eq!(world.cloned::<Armor>(e), Some(Armor(0)));

        // Existing companion is left alone
        let e2 = world.spawn();
        world.set(e2, Armor(9)).unwrap();
        world.set(e2, Health(1)).unwrap();
        assert_eq!(world.cloned::<Armor>(e2), Some(Armor(9)));
    }

    #[test]
    fn test_hierarchy_reparent_and_despawn() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let child = world.spawn();

        world.set_parent(child, a).unwrap();
        assert_eq!(world.parent(child), Some(a));
        assert_eq!(world.children(a).as_slice(), &[child]);

        world.set_parent(child, b).unwrap();
        assert!(world.children(a).is_empty());
        assert_eq!(world.children(b).as_slice(), &[child]);

        world.despawn(b).unwrap();
        assert!(world.contains(child));
        assert_eq!(world.parent(child), None);
    }

    #[test]
    fn test_hierarchy_refuses_cycles() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.set_parent(b, a).unwrap();
        world.set_parent(c, b).unwrap();

        assert_eq!(world.set_parent(a, c), Err(HierarchyError::Cycle));
        assert_eq!(world.set_parent(a, a), Err(HierarchyError::SelfParent));
        assert_eq!(world.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn test_deferred_applies_after_scope() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        world.set(a, Health(1)).unwrap();
        world.set(b, Health(2)).unwrap();

        world.deferred(|inner, commands| {
            for (entity, _) in inner.query::<&Health>().iter() {
                commands.remove_one::<Health>(entity);
            }
        });

        assert!(!world.has::<Health>(a));
        assert!(!world.has::<Health>(b));
    }
}
