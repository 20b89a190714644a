//! Name/handle asset reference binding
//!
//! Runtime components address assets by small numeric handles that only mean
//! something to one subsystem. Scenes and tools want names. A binding keeps a
//! lightweight reference component (`R`, the name) and a target component
//! (`T`, the handle) in sync with two one-directional observers:
//!
//! - `<Ref>Resolve`: on a write of `R`, resolve the name into `T`'s handle.
//!   An empty name clears the handle; a name that does not resolve leaves the
//!   handle untouched so assets can be loaded after they are referenced.
//! - `<Ref>Sync`: on a write of `T`, copy the canonical name back into `R`,
//!   unless the name is empty (an explicit "no asset") or the handle invalid.
//!
//! Each observer writes the other component without notification, so the two
//! never trigger each other. Resolvers must be idempotent:
//! `reverse(resolve(name))` has to return `name` for names that resolve.

use std::fmt::Debug;
use std::rc::Rc;

use hecs::Component;

use super::World;
use super::reflect::FieldAccessor;
use super::registry::ComponentRegistry;

/// A component holding an asset name
pub trait NameRef: Component + Default + Clone {
    /// Accessor for the name field, used for registration
    fn name_field() -> FieldAccessor<Self, String>;

    /// Current name
    fn name(&self) -> &str {
        Self::name_field().get(self)
    }

    /// Replace the name
    fn set_name(&mut self, name: String) {
        *Self::name_field().get_mut(self) = name;
    }
}

/// Register a reference component and attach it alongside its target.
///
/// Used on its own when no resolver is available; the reference is still
/// listed for tools and travels with the target.
pub fn declare_ref<R: NameRef, T: Component>(
    world: &mut World,
    registry: &mut ComponentRegistry,
    ref_name: &str,
    category: &str,
    asset_type: &str,
) {
    registry
        .register::<R>(ref_name, category)
        .field(R::name_field())
        .asset_ref(asset_type)
        .build();
    world.add_with::<T, R>();
}

type Resolve<Id> = Rc<dyn Fn(&str) -> Id>;
type Reverse<Id> = Rc<dyn Fn(Id) -> String>;

/// Two-way binding between reference component `R` and the handle in `T`
pub struct AssetRefBinding<R, T, Id> {
    ref_name: String,
    category: String,
    asset_type: String,
    handle: FieldAccessor<T, Id>,
    invalid: Id,
    resolve: Resolve<Id>,
    reverse: Option<Reverse<Id>>,
    _marker: std::marker::PhantomData<fn() -> R>,
}

impl<R, T, Id> AssetRefBinding<R, T, Id>
where
    R: NameRef,
    T: Component,
    Id: Copy + PartialEq + Debug + 'static,
{
    /// Create a binding resolving names through `resolve`
    pub fn new(
        ref_name: impl Into<String>,
        handle: FieldAccessor<T, Id>,
        invalid: Id,
        resolve: impl Fn(&str) -> Id + 'static,
    ) -> Self {
        Self {
            ref_name: ref_name.into(),
            category: String::from("Assets"),
            asset_type: String::new(),
            handle,
            invalid,
            resolve: Rc::new(resolve),
            reverse: None,
            _marker: std::marker::PhantomData,
        }
    }

    /// Registry category of the reference component
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Asset type key shown on the name field
    #[must_use]
    pub fn asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = asset_type.into();
        self
    }

    /// Enable handle-to-name sync. Without it the backward direction is
    /// omitted, e.g. for handles created lazily that have no stable name.
    #[must_use]
    pub fn reverse(mut self, reverse: impl Fn(Id) -> String + 'static) -> Self {
        self.reverse = Some(Rc::new(reverse));
        self
    }

    /// Register the reference component and wire up both observers
    pub fn install(self, world: &mut World, registry: &mut ComponentRegistry) {
        declare_ref::<R, T>(
            world,
            registry,
            &self.ref_name,
            &self.category,
            &self.asset_type,
        );

        let handle = self.handle;
        let invalid = self.invalid;
        let resolve = self.resolve;
        let ref_name = self.ref_name.clone();
        world
            .observer(format!("{}Resolve", self.ref_name))
            .with::<T>()
            .on_set::<R>()
            .each(move |world, entity| {
                let Some(name) = world.get::<R>(entity).map(|r| r.name().to_owned()) else {
                    return;
                };
                let id = if name.is_empty() {
                    invalid
                } else {
                    let id = resolve(&name);
                    if id == invalid {
                        log::debug!("{ref_name}: '{name}' not resolved, keeping previous handle");
                        return;
                    }
                    id
                };
                if let Some(mut target) = world.get_mut::<T>(entity) {
                    *handle.get_mut(&mut target) = id;
                }
            });

        let Some(reverse) = self.reverse else {
            return;
        };
        world
            .observer(format!("{}Sync", self.ref_name))
            .with::<R>()
            .on_set::<T>()
            .each(move |world, entity| {
                let Some(id) = world.get::<T>(entity).map(|t| *handle.get(&t)) else {
                    return;
                };
                if id == invalid {
                    return;
                }
                let current = match world.get::<R>(entity) {
                    Some(r) if !r.name().is_empty() => r.name().to_owned(),
                    _ => return,
                };
                let canonical = reverse(id);
                if !canonical.is_empty() && canonical != current {
                    if let Some(mut reference) = world.get_mut::<R>(entity) {
                        reference.set_name(canonical);
                    }
                }
            });
    }
}
