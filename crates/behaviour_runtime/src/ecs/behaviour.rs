//! Behaviour base contract
//!
//! Every attachable unit of logic (components, scripts, renderers, the
//! transform and the game object itself) implements [`Behaviour`]. The shared
//! lifecycle lives in [`BehaviourState`]:
//! - identity assigned once at construction
//! - active/destroyed flags, destruction is terminal and idempotent
//! - a weak link to the [`Runtime`] that created it, cleared on destroy
//!
//! Behaviours are shared as `Rc<T>` / `Rc<dyn Behaviour>`; all lifecycle state
//! is interior-mutable so hooks run on shared references.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use super::{BehaviourError, GameObject, Transform};
use crate::runtime::Runtime;

/// Opaque unique identifier of a behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviourId(Uuid);

impl BehaviourId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BehaviourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Variant tag of a behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourKind {
    /// Data/logic container with no event subscriptions
    Component,
    /// Updateable script driven by start and update events
    Script,
    /// Component driven by render events
    Renderer,
    /// Spatial transform owned by every game object
    Transform,
    /// Game object
    Entity,
}

impl fmt::Display for BehaviourKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Component => "Component",
            Self::Script => "MonoBehaviour",
            Self::Renderer => "Renderer",
            Self::Transform => "Transform",
            Self::Entity => "GameObject",
        };
        f.write_str(name)
    }
}

/// Lifecycle state shared by every behaviour
pub struct BehaviourState {
    id: BehaviourId,
    name: RefCell<String>,
    active: Cell<bool>,
    destroyed: Cell<bool>,
    destroying: Cell<bool>,
    runtime: RefCell<Weak<Runtime>>,
}

impl BehaviourState {
    /// Fresh state: new identity, active, not destroyed, no runtime yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BehaviourId::generate(),
            name: RefCell::new(name.into()),
            active: Cell::new(true),
            destroyed: Cell::new(false),
            destroying: Cell::new(false),
            runtime: RefCell::new(Weak::new()),
        }
    }

    /// Identity of the behaviour
    pub fn id(&self) -> BehaviourId {
        self.id
    }

    /// Display label
    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    /// Replace the display label
    pub fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = name.to_string();
    }

    /// Active flag
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Destroyed flag
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// The runtime this behaviour was created in, while both are alive
    pub fn runtime(&self) -> Option<Rc<Runtime>> {
        self.runtime.borrow().upgrade()
    }

    pub(crate) fn bind_runtime(&self, runtime: &Rc<Runtime>) {
        *self.runtime.borrow_mut() = Rc::downgrade(runtime);
    }
}

impl fmt::Debug for BehaviourState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourState")
            .field("id", &self.id)
            .field("name", &*self.name.borrow())
            .field("active", &self.active.get())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

/// Entity-link capability: a non-owning reference to the owning game object
///
/// The game object owns the behaviour, never the other way around, so the link
/// is weak. It is bound and cleared by the game object's management API.
#[derive(Default)]
pub struct EntityLink {
    entity: RefCell<Weak<GameObject>>,
}

impl EntityLink {
    /// Unbound link
    pub fn new() -> Self {
        Self::default()
    }

    /// The owning game object, if bound and still alive
    pub fn get(&self) -> Option<Rc<GameObject>> {
        self.entity.borrow().upgrade()
    }

    /// Whether the link currently resolves to a game object
    pub fn is_bound(&self) -> bool {
        self.entity.borrow().strong_count() > 0
    }

    /// Transform of the owning game object
    pub fn transform(&self) -> Option<Rc<Transform>> {
        self.get()?.transform()
    }

    pub(crate) fn bind(&self, entity: Weak<GameObject>) {
        *self.entity.borrow_mut() = entity;
    }

    pub(crate) fn clear(&self) {
        *self.entity.borrow_mut() = Weak::new();
    }
}

impl fmt::Debug for EntityLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLink").field("bound", &self.is_bound()).finish()
    }
}

/// Type-erasure helpers, implemented for every [`Behaviour`]
pub trait AsAny {
    /// Borrow as `Any` for exact-type checks and downcasts
    fn as_any(&self) -> &dyn Any;

    /// Convert a shared behaviour into a shared `Any`
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// Convert a shared behaviour into a shared trait object
    fn into_behaviour(self: Rc<Self>) -> Rc<dyn Behaviour>;
}

impl<T: Behaviour + 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn into_behaviour(self: Rc<Self>) -> Rc<dyn Behaviour> {
        self
    }
}

/// Shared lifecycle interface of every attachable unit
///
/// Implementors provide the state accessor, the variant tag and the two
/// hooks; everything else is provided. `destroy` and `set_active` are not
/// meant to be overridden.
pub trait Behaviour: AsAny + 'static {
    /// Lifecycle state
    fn state(&self) -> &BehaviourState;

    /// Variant tag
    fn kind(&self) -> BehaviourKind;

    /// Creation hook, run once by [`create`] after the runtime is bound
    fn on_create(this: &Rc<Self>, runtime: &Rc<Runtime>) -> Result<(), BehaviourError>
    where
        Self: Sized;

    /// Destruction hook, run exactly once by [`Behaviour::destroy`]
    fn on_destroy(&self);

    /// Entity-link capability, if this variant supports it
    fn entity_link(&self) -> Option<&EntityLink> {
        None
    }

    /// Identity
    fn id(&self) -> BehaviourId {
        self.state().id()
    }

    /// Display label
    fn name(&self) -> String {
        self.state().name()
    }

    /// Replace the display label
    fn set_name(&self, name: &str) {
        self.state().set_name(name);
    }

    /// Active flag
    fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Destroyed flag
    fn is_destroyed(&self) -> bool {
        self.state().is_destroyed()
    }

    /// Active and not destroyed
    fn is_alive(&self) -> bool {
        self.is_active() && !self.is_destroyed()
    }

    /// The runtime this behaviour was created in
    fn runtime(&self) -> Option<Rc<Runtime>> {
        self.state().runtime()
    }

    /// Flip the active flag. No hooks run; a destroyed behaviour stays inactive.
    fn set_active(&self, active: bool) {
        let state = self.state();
        if state.is_destroyed() {
            log::warn!(
                "Ignoring set_active({}) on destroyed {} '{}' {{{}}}",
                active,
                self.kind(),
                state.name(),
                state.id()
            );
            return;
        }
        state.active.set(active);
    }

    /// Tear the behaviour down
    ///
    /// Runs `on_destroy` exactly once, even when called again from inside the
    /// hook. Order: deactivate, hook, release runtime, mark destroyed.
    fn destroy(&self) {
        let state = self.state();
        if state.destroyed.get() || state.destroying.get() {
            return;
        }
        state.destroying.set(true);
        state.active.set(false);
        self.on_destroy();
        *state.runtime.borrow_mut() = Weak::new();
        state.destroyed.set(true);
        state.destroying.set(false);
        log::debug!("Destroyed {} '{}' {{{}}}", self.kind(), state.name(), state.id());
    }

    /// Owning game object through the entity-link capability
    fn entity(&self) -> Option<Rc<GameObject>> {
        self.entity_link()?.get()
    }

    /// Transform of the owning game object
    fn transform(&self) -> Option<Rc<Transform>> {
        self.entity()?.transform()
    }
}

impl dyn Behaviour {
    /// Whether the dynamic type is exactly `T`
    pub fn is<T: Behaviour>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// View as `T` if the dynamic type is exactly `T`
    pub fn cast<T: Behaviour>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Behaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behaviour")
            .field("kind", &self.kind())
            .field("state", self.state())
            .finish()
    }
}

/// Shared view of a behaviour as `T` if its dynamic type is exactly `T`
pub fn downcast<T: Behaviour>(behaviour: &Rc<dyn Behaviour>) -> Option<Rc<T>> {
    Rc::clone(behaviour).into_any().downcast::<T>().ok()
}

/// Create a behaviour: bind it to the runtime and run its creation hook
///
/// A failing hook propagates to the caller; the behaviour is dropped.
pub fn create<T: Behaviour>(runtime: &Rc<Runtime>, value: T) -> Result<Rc<T>, BehaviourError> {
    let behaviour = Rc::new(value);
    behaviour.state().bind_runtime(runtime);

    if let Err(err) = T::on_create(&behaviour, runtime) {
        log::error!("Failed to create {} '{}': {}", behaviour.kind(), behaviour.name(), err);
        return Err(err);
    }

    log::debug!("Created {} '{}' {{{}}}", behaviour.kind(), behaviour.name(), behaviour.id());
    Ok(behaviour)
}

/// Last path segment of a type name, without generic arguments
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
