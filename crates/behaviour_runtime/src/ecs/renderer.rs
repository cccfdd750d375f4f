//! Renderer variant
//!
//! A renderer is a component driven by render events. User drawing code lives
//! in a [`Render`] implementation; [`Renderer`] wraps it with the lifecycle,
//! the render subscription and the texture slot.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use super::behaviour::{self, short_type_name, Behaviour, BehaviourKind, BehaviourState, EntityLink};
use super::{BehaviourError, GameObject, Transform};
use crate::assets::Texture;
use crate::events::{FramePhase, FrameTime, Subscription};
use crate::runtime::Runtime;

/// Drawing hook of a renderer
pub trait Render: 'static {
    /// Issue draw calls for one frame
    fn render(&mut self, context: &RenderContext<'_>);
}

/// Everything a [`Render`] hook may draw with
pub struct RenderContext<'a> {
    time: FrameTime,
    entity: &'a Rc<GameObject>,
    transform: Option<Rc<Transform>>,
    texture: Option<Rc<Texture>>,
}

impl<'a> RenderContext<'a> {
    /// Frame timing
    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Owning game object
    pub fn entity(&self) -> &'a Rc<GameObject> {
        self.entity
    }

    /// Transform of the owning game object
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_deref()
    }

    /// Texture assigned to the renderer
    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.texture.as_ref()
    }
}

/// Behaviour invoking a [`Render`] hook on every render event
///
/// Render events are ignored while the renderer has no game object or while
/// either of them is inactive or destroyed.
pub struct Renderer<R: Render> {
    state: BehaviourState,
    link: EntityLink,
    texture: RefCell<Option<Rc<Texture>>>,
    time: Cell<Option<FrameTime>>,
    subscription: RefCell<Option<Subscription>>,
    renderer: RefCell<R>,
}

impl<R: Render> Renderer<R> {
    /// Wrap a render hook without creating it in a runtime yet
    pub fn new(renderer: R) -> Self {
        Self {
            state: BehaviourState::new(short_type_name::<R>()),
            link: EntityLink::new(),
            texture: RefCell::new(None),
            time: Cell::new(None),
            subscription: RefCell::new(None),
            renderer: RefCell::new(renderer),
        }
    }

    /// Create a renderer in a runtime
    pub fn create(runtime: &Rc<Runtime>, renderer: R) -> Result<Rc<Self>, BehaviourError> {
        behaviour::create(runtime, Self::new(renderer))
    }

    /// Create a renderer with an initial texture
    pub fn create_with_texture(
        runtime: &Rc<Runtime>,
        renderer: R,
        texture: Option<Rc<Texture>>,
    ) -> Result<Rc<Self>, BehaviourError> {
        let renderer = Self::new(renderer);
        *renderer.texture.borrow_mut() = texture;
        behaviour::create(runtime, renderer)
    }

    /// Assigned texture
    pub fn texture(&self) -> Option<Rc<Texture>> {
        self.texture.borrow().clone()
    }

    /// Assign or clear the texture
    pub fn set_texture(&self, texture: Option<Rc<Texture>>) {
        *self.texture.borrow_mut() = texture;
    }

    /// Timing of the last frame this renderer drew
    pub fn last_time(&self) -> Option<FrameTime> {
        self.time.get()
    }

    /// Borrow the render hook
    pub fn renderer(&self) -> Ref<'_, R> {
        self.renderer.borrow()
    }

    /// Mutably borrow the render hook
    pub fn renderer_mut(&self) -> RefMut<'_, R> {
        self.renderer.borrow_mut()
    }

    fn handle_render(&self, time: FrameTime) {
        let Some(entity) = self.link.get() else {
            return;
        };
        if !self.is_alive() || !entity.is_alive() {
            return;
        }
        self.time.set(Some(time));

        let context = RenderContext {
            time,
            entity: &entity,
            transform: entity.transform(),
            texture: self.texture(),
        };
        match self.renderer.try_borrow_mut() {
            Ok(mut renderer) => renderer.render(&context),
            Err(_) => log::warn!("Skipping re-entrant render of '{}' {{{}}}", self.name(), self.id()),
        }
    }
}

impl<R: Render + Default> Default for Renderer<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: Render> Behaviour for Renderer<R> {
    fn state(&self) -> &BehaviourState {
        &self.state
    }

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Renderer
    }

    fn on_create(this: &Rc<Self>, runtime: &Rc<Runtime>) -> Result<(), BehaviourError> {
        let weak = Rc::downgrade(this);
        let subscription = runtime.dispatcher().subscribe(FramePhase::Render, move |event| {
            if let (Some(renderer), Some(time)) = (weak.upgrade(), event.time()) {
                renderer.handle_render(time);
            }
        });
        *this.subscription.borrow_mut() = Some(subscription);
        Ok(())
    }

    fn on_destroy(&self) {
        self.subscription.borrow_mut().take();
        self.link.clear();
        self.texture.borrow_mut().take();
        self.time.set(None);
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
    use crate::events::FrameEvent;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingRender {
        calls: u32,
        had_transform: bool,
    }

    impl Render for CountingRender {
        fn render(&mut self, context: &RenderContext<'_>) {
            self.calls += 1;
            self.had_transform = context.transform().is_some();
        }
    }

    fn runtime() -> Rc<Runtime> {
        Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader)
    }

    fn render_event(frame: u64) -> FrameEvent {
        FrameEvent::Render(FrameTime::new(Duration::from_millis(16), Duration::from_millis(16 * frame), frame))
    }

    #[test]
    fn test_render_without_entity_is_ignored() {
        let runtime = runtime();
        let renderer = Renderer::create(&runtime, CountingRender::default()).unwrap();

        runtime.dispatch(&render_event(1));

        assert_eq!(renderer.renderer().calls, 0);
        assert!(renderer.last_time().is_none());
    }

    #[test]
    fn test_render_on_attached_renderer() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let renderer = entity.add_new_behaviour::<Renderer<CountingRender>>().unwrap();

        runtime.dispatch(&render_event(1));
        runtime.dispatch(&render_event(2));

        assert_eq!(renderer.renderer().calls, 2);
        assert!(renderer.renderer().had_transform);
        assert_eq!(renderer.last_time().map(|t| t.frame()), Some(2));
    }

    #[test]
    fn test_inactive_entity_suppresses_render() {
        let runtime = runtime();
        let entity = GameObject::create(&runtime).unwrap();
        let renderer = entity.add_new_behaviour::<Renderer<CountingRender>>().unwrap();

        entity.set_active(false);
        runtime.dispatch(&render_event(1));
        assert_eq!(renderer.renderer().calls, 0);

        entity.set_active(true);
        renderer.set_active(false);
        runtime.dispatch(&render_event(2));
        assert_eq!(renderer.renderer().calls, 0);
    }

    #[test]
    fn test_destroy_unsubscribes_and_releases_texture() {
        let runtime = runtime();
        let texture = Rc::new(Texture::solid_color(4, 4, [255, 255, 255, 255]));
        let renderer =
            Renderer::create_with_texture(&runtime, CountingRender::default(), Some(Rc::clone(&texture))).unwrap();
        let entity = GameObject::create(&runtime).unwrap();
        entity.add_behaviour(Some(Rc::clone(&renderer))).unwrap();
        assert_eq!(runtime.dispatcher().handler_count(FramePhase::Render), 1);

        runtime.dispatch(&render_event(1));
        renderer.destroy();

        assert_eq!(runtime.dispatcher().handler_count(FramePhase::Render), 0);
        assert!(renderer.texture().is_none());
        assert!(renderer.last_time().is_none());
        assert!(renderer.entity().is_none());
        assert_eq!(Rc::strong_count(&texture), 1);
    }

    #[test]
    fn test_renderer_named_after_hook_type() {
        let renderer = Renderer::new(CountingRender::default());
        assert_eq!(renderer.name(), "CountingRender");
    }
}
