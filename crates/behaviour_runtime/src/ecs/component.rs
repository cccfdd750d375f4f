//! Component variant
//!
//! Components are behaviours that are not driven by frame events. They carry
//! user data and support the entity-link capability.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::behaviour::{self, short_type_name, Behaviour, BehaviourKind, BehaviourState, EntityLink};
use super::BehaviourError;
use crate::runtime::Runtime;

/// Behaviour wrapping plain data `C`
///
/// Named after `C` at construction. The creation hook is empty; destruction
/// clears the entity link.
pub struct Component<C: 'static> {
    state: BehaviourState,
    link: EntityLink,
    data: RefCell<C>,
}

impl<C: 'static> Component<C> {
    /// Wrap data without creating it in a runtime yet
    pub fn new(data: C) -> Self {
        Self {
            state: BehaviourState::new(short_type_name::<C>()),
            link: EntityLink::new(),
            data: RefCell::new(data),
        }
    }

    /// Create a component in a runtime
    pub fn create(runtime: &Rc<Runtime>, data: C) -> Result<Rc<Self>, BehaviourError> {
        behaviour::create(runtime, Self::new(data))
    }

    /// Borrow the data
    pub fn data(&self) -> Ref<'_, C> {
        self.data.borrow()
    }

    /// Mutably borrow the data
    pub fn data_mut(&self) -> RefMut<'_, C> {
        self.data.borrow_mut()
    }
}

impl<C: Default + 'static> Default for Component<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: 'static> Behaviour for Component<C> {
    fn state(&self) -> &BehaviourState {
        &self.state
    }

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Component
    }

    fn on_create(_this: &Rc<Self>, _runtime: &Rc<Runtime>) -> Result<(), BehaviourError> {
        Ok(())
    }

    fn on_destroy(&self) {
        self.link.clear();
    }

    fn entity_link(&self) -> Option<&EntityLink> {
        Some(&self.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NullAssetLoader;
    use crate::config::RuntimeConfig;
    use crate::ecs::GameObject;

    #[derive(Debug, Default, PartialEq)]
    struct Health {
        points: u32,
    }

    #[test]
    fn test_component_named_after_data_type() {
        let runtime = Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader);
        let health = Component::create(&runtime, Health { points: 3 }).unwrap();

        assert_eq!(health.name(), "Health");
        assert_eq!(health.kind(), BehaviourKind::Component);
        assert_eq!(health.data().points, 3);

        health.data_mut().points -= 1;
        assert_eq!(*health.data(), Health { points: 2 });
    }

    #[test]
    fn test_destroy_clears_entity_link() {
        let runtime = Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader);
        let entity = GameObject::create(&runtime).unwrap();
        let health = entity.add_new_behaviour::<Component<Health>>().unwrap();

        assert!(health.entity().is_some_and(|e| Rc::ptr_eq(&e, &entity)));
        assert!(health.transform().is_some());

        health.destroy();
        assert!(health.entity().is_none());
        assert!(health.transform().is_none());
    }
}
