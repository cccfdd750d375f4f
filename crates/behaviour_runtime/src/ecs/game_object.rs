//! Game object
//!
//! A scene object that owns a transform plus an ordered list of behaviours,
//! and sits in a parent/children hierarchy. Behaviour queries match the exact
//! dynamic type: asking for `T` never returns a different type that merely
//! shares a capability with `T`.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use super::behaviour::{self, downcast, AsAny, Behaviour, BehaviourId, BehaviourKind, BehaviourState};
use super::{BehaviourError, Transform};
use crate::runtime::Runtime;

type BehaviourList = Vec<Rc<dyn Behaviour>>;

/// Scene object owning a transform and a list of behaviours
///
/// The transform is element zero of the behaviour list. Children are owned
/// strongly, the parent is a weak back-reference. Destroying a game object
/// destroys its behaviours but leaves its children alone.
pub struct GameObject {
    state: BehaviourState,
    this: RefCell<Weak<GameObject>>,
    transform: RefCell<Option<Rc<Transform>>>,
    tag: RefCell<String>,
    behaviours: RefCell<BehaviourList>,
    parent: RefCell<Weak<GameObject>>,
    children: RefCell<Vec<Rc<GameObject>>>,
}

impl GameObject {
    fn new(name: &str, transform: Rc<Transform>) -> Self {
        let behaviours: BehaviourList = vec![Rc::clone(&transform).into_behaviour()];
        Self {
            state: BehaviourState::new(name),
            this: RefCell::new(Weak::new()),
            transform: RefCell::new(Some(transform)),
            tag: RefCell::new(String::new()),
            behaviours: RefCell::new(behaviours),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        }
    }

    /// Create a game object named after the runtime's default entity name
    pub fn create(runtime: &Rc<Runtime>) -> Result<Rc<Self>, BehaviourError> {
        let name = runtime.config().default_entity_name.clone();
        Self::create_named(runtime, &name)
    }

    /// Create a named game object with a fresh transform
    pub fn create_named(runtime: &Rc<Runtime>, name: &str) -> Result<Rc<Self>, BehaviourError> {
        let transform = behaviour::create(runtime, Transform::default())?;
        behaviour::create(runtime, Self::new(name, transform))
    }

    /// Create a named game object and attach an initial set of behaviours
    pub fn create_with<I>(runtime: &Rc<Runtime>, name: &str, behaviours: I) -> Result<Rc<Self>, BehaviourError>
    where
        I: IntoIterator<Item = Rc<dyn Behaviour>>,
    {
        let entity = Self::create_named(runtime, name)?;
        entity.add_behaviours(behaviours.into_iter().map(Some))?;
        Ok(entity)
    }

    /// The transform, absent once the game object is destroyed
    pub fn transform(&self) -> Option<Rc<Transform>> {
        self.transform.borrow().clone()
    }

    /// Tag string, empty by default
    pub fn tag(&self) -> String {
        self.tag.borrow().clone()
    }

    /// Set the tag and register it with the runtime's tag registry
    pub fn set_tag(&self, tag: &str) {
        if let Some(runtime) = self.runtime() {
            runtime.register_tag(tag);
        }
        *self.tag.borrow_mut() = tag.to_string();
    }

    /// Whether the tag equals `tag`
    pub fn compare_tag(&self, tag: &str) -> bool {
        *self.tag.borrow() == tag
    }

    // ========================================================================
    // BEHAVIOUR MANAGEMENT
    // ========================================================================

    /// First attached behaviour whose dynamic type is exactly `T`
    pub fn get_behaviour<T: Behaviour>(&self) -> Result<Option<Rc<T>>, BehaviourError> {
        let behaviours = self.behaviours_ref("get")?;
        Ok(behaviours.iter().find_map(downcast::<T>))
    }

    /// All attached behaviours whose dynamic type is exactly `T`, in attachment order
    ///
    /// The iterator runs over a snapshot taken at call time.
    pub fn get_behaviours<T: Behaviour>(&self) -> Result<impl Iterator<Item = Rc<T>>, BehaviourError> {
        let snapshot = self.behaviours_ref("get")?.clone();
        Ok(snapshot.into_iter().filter_map(|behaviour| downcast::<T>(&behaviour)))
    }

    /// Create a default `T` in this object's runtime and attach it
    pub fn add_new_behaviour<T: Behaviour + Default>(&self) -> Result<Rc<T>, BehaviourError> {
        drop(self.behaviours_mut("add")?);
        let runtime = self.runtime().ok_or_else(|| BehaviourError::RuntimeUnavailable { name: self.name() })?;
        let behaviour = behaviour::create(&runtime, T::default())?;
        self.add_behaviour(Some(Rc::clone(&behaviour)))?;
        Ok(behaviour)
    }

    /// Attach an existing behaviour; `None` is a no-op returning `None`
    ///
    /// Behaviours with the entity-link capability are bound to this object.
    pub fn add_behaviour<T: Behaviour + ?Sized>(&self, behaviour: Option<Rc<T>>) -> Result<Option<Rc<T>>, BehaviourError> {
        let mut behaviours = self.behaviours_mut("add")?;
        let Some(behaviour) = behaviour else {
            return Ok(None);
        };
        behaviours.push(Rc::clone(&behaviour).into_behaviour());
        drop(behaviours);

        self.link(&*behaviour);
        Ok(Some(behaviour))
    }

    /// Attach a batch of behaviours, skipping `None` entries
    ///
    /// Returns the behaviours actually attached.
    pub fn add_behaviours<T, I>(&self, items: I) -> Result<Vec<Rc<T>>, BehaviourError>
    where
        T: Behaviour + ?Sized,
        I: IntoIterator<Item = Option<Rc<T>>>,
    {
        let mut behaviours = self.behaviours_mut("add")?;
        let mut added = Vec::new();
        for behaviour in items.into_iter().flatten() {
            behaviours.push(Rc::clone(&behaviour).into_behaviour());
            self.link(&*behaviour);
            added.push(behaviour);
        }
        Ok(added)
    }

    /// Detach the first behaviour whose dynamic type is exactly `T`
    pub fn remove_behaviour_of<T: Behaviour>(&self) -> Result<Option<Rc<T>>, BehaviourError> {
        let mut behaviours = self.behaviours_mut("remove")?;
        let Some(index) = behaviours.iter().position(|behaviour| behaviour.is::<T>()) else {
            return Ok(None);
        };
        let removed = behaviours.remove(index);
        drop(behaviours);

        self.unlink(&*removed);
        Ok(downcast::<T>(&removed))
    }

    /// Detach a specific behaviour; `None` if it is not attached here
    pub fn remove_behaviour<T: Behaviour + ?Sized>(&self, behaviour: &Rc<T>) -> Result<Option<Rc<T>>, BehaviourError> {
        let mut behaviours = self.behaviours_mut("remove")?;
        let id = behaviour.id();
        let Some(index) = behaviours.iter().position(|attached| attached.id() == id) else {
            return Ok(None);
        };
        behaviours.remove(index);
        drop(behaviours);

        self.unlink(&**behaviour);
        Ok(Some(Rc::clone(behaviour)))
    }

    /// Detach every behaviour whose dynamic type is exactly `T`
    pub fn remove_behaviours_of<T: Behaviour>(&self) -> Result<Vec<Rc<T>>, BehaviourError> {
        let mut behaviours = self.behaviours_mut("remove")?;
        let (removed, kept): (BehaviourList, BehaviourList) =
            behaviours.drain(..).partition(|behaviour| behaviour.is::<T>());
        *behaviours = kept;
        drop(behaviours);

        for behaviour in &removed {
            self.unlink(&**behaviour);
        }
        Ok(removed.iter().filter_map(downcast::<T>).collect())
    }

    /// Detach a batch of specific behaviours, skipping `None` and unattached entries
    ///
    /// Returns the behaviours actually detached.
    pub fn remove_behaviours<T, I>(&self, items: I) -> Result<Vec<Rc<T>>, BehaviourError>
    where
        T: Behaviour + ?Sized,
        I: IntoIterator<Item = Option<Rc<T>>>,
    {
        let mut behaviours = self.behaviours_mut("remove")?;
        let mut removed = Vec::new();
        for behaviour in items.into_iter().flatten() {
            let id = behaviour.id();
            let Some(index) = behaviours.iter().position(|attached| attached.id() == id) else {
                continue;
            };
            behaviours.remove(index);
            self.unlink(&*behaviour);
            removed.push(behaviour);
        }
        Ok(removed)
    }

    /// Snapshot of the attached behaviours
    pub fn behaviours(&self) -> Result<Vec<Rc<dyn Behaviour>>, BehaviourError> {
        Ok(self.behaviours_ref("list")?.clone())
    }

    /// Number of attached behaviours, transform included
    pub fn behaviour_count(&self) -> Result<usize, BehaviourError> {
        Ok(self.behaviours_ref("count")?.len())
    }

    /// Whether a behaviour with this identity is attached
    pub fn contains(&self, id: BehaviourId) -> Result<bool, BehaviourError> {
        Ok(self.behaviours_ref("find")?.iter().any(|behaviour| behaviour.id() == id))
    }

    /// Attached behaviours exposing the entity-link capability, in attachment order
    pub fn linked_behaviours(&self) -> Result<Vec<Rc<dyn Behaviour>>, BehaviourError> {
        Ok(self
            .behaviours_ref("list")?
            .iter()
            .filter(|behaviour| behaviour.entity_link().is_some())
            .cloned()
            .collect())
    }

    // ========================================================================
    // HIERARCHY
    // ========================================================================

    /// Parent game object, if attached to one that is still alive
    pub fn parent(&self) -> Option<Rc<GameObject>> {
        self.parent.borrow().upgrade()
    }

    /// Snapshot of the children in insertion order
    pub fn children(&self) -> Vec<Rc<GameObject>> {
        self.children.borrow().clone()
    }

    /// Make `child` a child of this object, detaching it from any previous parent
    pub fn add_child(&self, child: &Rc<GameObject>) -> Result<(), BehaviourError> {
        if child.id() == self.id() || self.is_descendant_of(child) {
            return Err(self.invalid_state("parent", "child is this object or one of its ancestors"));
        }
        if let Some(previous) = child.parent() {
            previous.remove_child(child);
        }
        *child.parent.borrow_mut() = self.this.borrow().clone();
        self.children.borrow_mut().push(Rc::clone(child));
        Ok(())
    }

    /// Detach a child, returning it if it was a child of this object
    pub fn remove_child(&self, child: &GameObject) -> Option<Rc<GameObject>> {
        let mut children = self.children.borrow_mut();
        let index = children.iter().position(|c| c.id() == child.id())?;
        let removed = children.remove(index);
        drop(children);

        *removed.parent.borrow_mut() = Weak::new();
        Some(removed)
    }

    /// Create a named game object in the same runtime and adopt it
    pub fn create_child(&self, name: &str) -> Result<Rc<GameObject>, BehaviourError> {
        let runtime = self.runtime().ok_or_else(|| BehaviourError::RuntimeUnavailable { name: self.name() })?;
        let child = Self::create_named(&runtime, name)?;
        self.add_child(&child)?;
        Ok(child)
    }

    fn is_descendant_of(&self, other: &GameObject) -> bool {
        let mut current = self.parent();
        while let Some(ancestor) = current {
            if ancestor.id() == other.id() {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }

    // ========================================================================
    // PRIVATE HELPER METHODS
    // ========================================================================

    fn behaviours_ref(&self, operation: &str) -> Result<Ref<'_, BehaviourList>, BehaviourError> {
        self.behaviours
            .try_borrow()
            .map_err(|err| self.invalid_state(operation, &err.to_string()))
    }

    fn behaviours_mut(&self, operation: &str) -> Result<RefMut<'_, BehaviourList>, BehaviourError> {
        self.behaviours
            .try_borrow_mut()
            .map_err(|err| self.invalid_state(operation, &err.to_string()))
    }

    fn invalid_state(&self, operation: &str, reason: &str) -> BehaviourError {
        let name = self.name();
        log::error!("Failed to {} behaviour on GameObject {} {{{}}}\t{}", operation, name, self.id(), reason);
        BehaviourError::InvalidState {
            entity: name,
            id: self.id(),
            reason: format!("{operation}: {reason}"),
        }
    }

    fn link<T: Behaviour + ?Sized>(&self, behaviour: &T) {
        if let Some(link) = behaviour.entity_link() {
            link.bind(self.this.borrow().clone());
        }
    }

    fn unlink<T: Behaviour + ?Sized>(&self, behaviour: &T) {
        if let Some(link) = behaviour.entity_link() {
            link.clear();
        }
        let is_transform = self
            .transform
            .borrow()
            .as_ref()
            .is_some_and(|transform| transform.id() == behaviour.id());
        if is_transform {
            log::warn!(
                "Transform removed from GameObject {} {{{}}}; dependents expect it to stay attached",
                self.name(),
                self.id()
            );
        }
    }
}

impl Behaviour for GameObject {
    fn state(&self) -> &BehaviourState {
        &self.state
    }

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Entity
    }

    fn on_create(this: &Rc<Self>, _runtime: &Rc<Runtime>) -> Result<(), BehaviourError> {
        *this.this.borrow_mut() = Rc::downgrade(this);
        if let Some(transform) = this.transform() {
            this.link(&*transform);
        }
        Ok(())
    }

    fn on_destroy(&self) {
        let attached = match self.behaviours_ref("destroy") {
            Ok(behaviours) => behaviours.clone(),
            Err(_) => return,
        };
        for behaviour in &attached {
            behaviour.destroy();
        }
        self.transform.borrow_mut().take();
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("state", &self.state)
            .field("tag", &*self.tag.borrow())
            .field("behaviours", &self.behaviours.try_borrow().map(|list| list.len()).ok())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NullAssetLoader;
    use crate::config::RuntimeConfig;
    use crate::ecs::Component;

    #[derive(Default)]
    struct Health(u32);

    #[derive(Default)]
    struct Armor(u32);

    fn runtime() -> Rc<Runtime> {
        Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader)
    }

    #[test]
    fn test_new_object_has_transform_first() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();

        assert_eq!(entity.name(), "GameObject");
        assert_eq!(entity.behaviour_count().unwrap(), 1);
        let transform = entity.transform().unwrap();
        assert_eq!(entity.behaviours().unwrap()[0].id(), transform.id());
        assert!(transform.entity().is_some_and(|e| Rc::ptr_eq(&e, &entity)));
        assert_eq!(entity.tag(), "");
    }

    #[test]
    fn test_get_behaviour_returns_first_exact_match() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let first = entity.add_behaviour(Some(Component::create(&runtime, Health(1)).unwrap())).unwrap().unwrap();
        entity.add_behaviour(Some(Component::create(&runtime, Health(2)).unwrap())).unwrap();

        let found = entity.get_behaviour::<Component<Health>>().unwrap().unwrap();
        assert_eq!(found.id(), first.id());
        assert!(entity.get_behaviour::<Component<Armor>>().unwrap().is_none());

        let all: Vec<u32> = entity
            .get_behaviours::<Component<Health>>()
            .unwrap()
            .map(|health| health.data().0)
            .collect();
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn test_add_none_is_noop() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();

        let added = entity.add_behaviour::<Component<Health>>(None).unwrap();
        assert!(added.is_none());
        assert_eq!(entity.behaviour_count().unwrap(), 1);
    }

    #[test]
    fn test_add_behaviours_skips_absent_entries() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let health: Rc<dyn Behaviour> = Component::create(&runtime, Health(5)).unwrap();
        let armor: Rc<dyn Behaviour> = Component::create(&runtime, Armor(2)).unwrap();

        let added = entity.add_behaviours(vec![Some(health), None, Some(armor)]).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(entity.behaviour_count().unwrap(), 3);
        assert!(added.iter().all(|b| b.entity().is_some_and(|e| Rc::ptr_eq(&e, &entity))));
    }

    #[test]
    fn test_remove_missing_type_leaves_list_unchanged() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        entity.add_new_behaviour::<Component<Health>>().unwrap();
        let before: Vec<BehaviourId> = entity.behaviours().unwrap().iter().map(|b| b.id()).collect();

        assert!(entity.remove_behaviour_of::<Component<Armor>>().unwrap().is_none());

        let after: Vec<BehaviourId> = entity.behaviours().unwrap().iter().map(|b| b.id()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_unbinds_entity_link() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let health = entity.add_new_behaviour::<Component<Health>>().unwrap();

        let removed = entity.remove_behaviour_of::<Component<Health>>().unwrap().unwrap();
        assert_eq!(removed.id(), health.id());
        assert!(health.entity().is_none());
        assert!(!entity.contains(health.id()).unwrap());
    }

    #[test]
    fn test_remove_specific_instance() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let other = GameObject::create(&runtime).unwrap();
        let first = entity.add_new_behaviour::<Component<Health>>().unwrap();
        let second = entity.add_new_behaviour::<Component<Health>>().unwrap();

        assert!(other.remove_behaviour(&first).unwrap().is_none());
        assert!(first.entity().is_some());

        let removed = entity.remove_behaviour(&second).unwrap().unwrap();
        assert_eq!(removed.id(), second.id());
        assert!(entity.contains(first.id()).unwrap());
        assert!(!entity.contains(second.id()).unwrap());
    }

    #[test]
    fn test_batch_removal_variants() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        entity.add_new_behaviour::<Component<Health>>().unwrap();
        entity.add_new_behaviour::<Component<Health>>().unwrap();
        let armor = entity.add_new_behaviour::<Component<Armor>>().unwrap();
        let stray = Component::create(&runtime, Armor(9)).unwrap();

        let healths = entity.remove_behaviours_of::<Component<Health>>().unwrap();
        assert_eq!(healths.len(), 2);
        assert!(healths.iter().all(|h| h.entity().is_none()));
        assert_eq!(entity.behaviour_count().unwrap(), 2);

        let removed = entity.remove_behaviours(vec![Some(Rc::clone(&armor)), None, Some(stray)]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), armor.id());
        assert_eq!(entity.behaviour_count().unwrap(), 1);
    }

    #[test]
    fn test_removing_transform_is_permitted() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();

        let removed = entity.remove_behaviour_of::<Transform>().unwrap();
        assert!(removed.is_some());
        assert_eq!(entity.behaviour_count().unwrap(), 0);
        assert!(entity.transform().is_some());
    }

    #[test]
    fn test_destroy_destroys_behaviours_but_not_children() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let health = entity.add_new_behaviour::<Component<Health>>().unwrap();
        let transform = entity.transform().unwrap();
        let child = entity.create_child("Child").unwrap();

        entity.destroy();

        assert!(entity.is_destroyed());
        assert!(health.is_destroyed());
        assert!(transform.is_destroyed());
        assert!(entity.transform().is_none());
        assert_eq!(entity.children().len(), 1);
        assert!(!child.is_destroyed());
        assert!(child.transform().is_some());
    }

    #[test]
    fn test_hierarchy_reparenting() {
        let runtime = runtime();
        let root = GameObject::create_named(&runtime, "Root").unwrap();
        let other = GameObject::create_named(&runtime, "Other").unwrap();
        let child = root.create_child("Child").unwrap();

        assert!(child.parent().is_some_and(|p| Rc::ptr_eq(&p, &root)));

        other.add_child(&child).unwrap();
        assert!(root.children().is_empty());
        assert!(child.parent().is_some_and(|p| Rc::ptr_eq(&p, &other)));

        let detached = other.remove_child(&child).unwrap();
        assert!(Rc::ptr_eq(&detached, &child));
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_hierarchy_rejects_cycles() {
        let runtime = runtime();
        let root = GameObject::create(&runtime).unwrap();
        let child = root.create_child("Child").unwrap();

        assert!(matches!(child.add_child(&root), Err(BehaviourError::InvalidState { .. })));
        assert!(matches!(root.add_child(&root), Err(BehaviourError::InvalidState { .. })));
    }

    #[test]
    fn test_set_tag_registers_with_runtime() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();

        entity.set_tag("Enemy");
        assert_eq!(entity.tag(), "Enemy");
        assert!(entity.compare_tag("Enemy"));
        assert!(runtime.tags().contains("Enemy"));
    }

    #[test]
    fn test_create_with_attaches_initial_behaviours() {
        let runtime = runtime();
        let health: Rc<dyn Behaviour> = Component::create(&runtime, Health(7)).unwrap();
        let entity = GameObject::create_with(&runtime, "Player", vec![health]).unwrap();

        assert_eq!(entity.name(), "Player");
        assert_eq!(entity.behaviour_count().unwrap(), 2);
        assert_eq!(entity.get_behaviour::<Component<Health>>().unwrap().unwrap().data().0, 7);
    }

    #[test]
    fn test_reentrant_access_during_add_is_invalid_state() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let health = Component::create(&runtime, Health(1)).unwrap();
        let transform_id = entity.transform().unwrap().id();
        let seen = std::cell::RefCell::new(Vec::new());

        let items = std::iter::once(Some(Rc::clone(&health))).inspect(|_| {
            seen.borrow_mut().push(entity.contains(transform_id));
            seen.borrow_mut().push(entity.behaviour_count().map(|_| true));
            seen.borrow_mut().push(entity.get_behaviour::<Component<Health>>().map(|found| found.is_some()));
        });
        let added = entity.add_behaviours(items).unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(seen.borrow().len(), 3);
        assert!(seen
            .borrow()
            .iter()
            .all(|result| matches!(result, Err(BehaviourError::InvalidState { .. }))));
        assert!(entity.contains(health.id()).unwrap());
        assert_eq!(entity.behaviour_count().unwrap(), 2);
    }
}
