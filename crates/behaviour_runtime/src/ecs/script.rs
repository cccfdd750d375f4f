//! Updateable script variant
//!
//! A [`Script`] holds user game logic. [`MonoBehaviour`] hosts it: it creates
//! a game object for the script, subscribes to start and update events and
//! forwards them to the script while both are alive.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use super::behaviour::{self, short_type_name, AsAny, Behaviour, BehaviourKind, BehaviourState, EntityLink};
use super::{BehaviourError, GameObject, Transform};
use crate::assets::{ResourceError, ResourceRequest};
use crate::events::{FramePhase, FrameTime, Subscription};
use crate::runtime::Runtime;

/// User game logic driven by frame events
pub trait Script: 'static {
    /// Called once, on the first start event the script is alive for
    fn start(&mut self, _context: &ScriptContext<'_>) {}

    /// Called on every update event the script is alive for
    fn update(&mut self, _context: &ScriptContext<'_>) {}

    /// Resources this script type needs before the first frame
    ///
    /// Collected by [`Runtime::register_script`] and loaded by the load pass.
    fn resource_requests() -> Vec<ResourceRequest>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// What a [`Script`] hook can reach
pub struct ScriptContext<'a> {
    time: FrameTime,
    entity: &'a Rc<GameObject>,
    runtime: &'a Rc<Runtime>,
}

impl<'a> ScriptContext<'a> {
    /// Frame timing
    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Game object hosting the script
    pub fn entity(&self) -> &'a Rc<GameObject> {
        self.entity
    }

    /// Transform of the hosting game object
    pub fn transform(&self) -> Option<Rc<Transform>> {
        self.entity.transform()
    }

    /// Runtime the script lives in
    pub fn runtime(&self) -> &'a Rc<Runtime> {
        self.runtime
    }

    /// A loaded resource
    pub fn resource<T: Any>(&self, name: &str) -> Result<Rc<T>, ResourceError> {
        self.runtime.resource::<T>(name)
    }
}

/// Behaviour hosting a [`Script`] on its own game object
///
/// The hosted game object is owned by the script and released on destroy.
pub struct MonoBehaviour<S: Script> {
    state: BehaviourState,
    link: EntityLink,
    host: RefCell<Option<Rc<GameObject>>>,
    started: Cell<bool>,
    time: Cell<Option<FrameTime>>,
    subscriptions: RefCell<Vec<Subscription>>,
    script: RefCell<S>,
}

impl<S: Script> MonoBehaviour<S> {
    fn new(script: S) -> Self {
        Self {
            state: BehaviourState::new(short_type_name::<S>()),
            link: EntityLink::new(),
            host: RefCell::new(None),
            started: Cell::new(false),
            time: Cell::new(None),
            subscriptions: RefCell::new(Vec::new()),
            script: RefCell::new(script),
        }
    }

    /// Create a script together with the game object hosting it
    pub fn create(runtime: &Rc<Runtime>, script: S) -> Result<Rc<Self>, BehaviourError> {
        Self::create_with(runtime, script, std::iter::empty())
    }

    /// Create a script and a hosting game object that also carries `behaviours`
    pub fn create_with<I>(runtime: &Rc<Runtime>, script: S, behaviours: I) -> Result<Rc<Self>, BehaviourError>
    where
        I: IntoIterator<Item = Rc<dyn Behaviour>>,
    {
        let this = behaviour::create(runtime, Self::new(script))?;
        let name = runtime.config().default_entity_name.clone();
        let attached = std::iter::once(Rc::clone(&this).into_behaviour()).chain(behaviours);
        let entity = GameObject::create_with(runtime, &name, attached)?;
        *this.host.borrow_mut() = Some(entity);
        Ok(this)
    }

    /// Whether `start` has run
    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    /// Timing of the last update, absent before the first one
    pub fn last_time(&self) -> Option<FrameTime> {
        self.time.get()
    }

    /// Game object created for this script, until destroyed
    pub fn host(&self) -> Option<Rc<GameObject>> {
        self.host.borrow().clone()
    }

    /// Borrow the script
    pub fn script(&self) -> Ref<'_, S> {
        self.script.borrow()
    }

    /// Mutably borrow the script
    pub fn script_mut(&self) -> RefMut<'_, S> {
        self.script.borrow_mut()
    }

    fn live_context(&self) -> Option<(Rc<GameObject>, Rc<Runtime>)> {
        let entity = self.link.get()?;
        if !self.is_alive() || !entity.is_alive() {
            return None;
        }
        Some((entity, self.runtime()?))
    }

    fn handle_start(&self, time: FrameTime) {
        if self.started.get() {
            return;
        }
        let Some((entity, runtime)) = self.live_context() else {
            return;
        };
        let context = ScriptContext {
            time,
            entity: &entity,
            runtime: &runtime,
        };
        if self.run_hook("start", |script| script.start(&context)) {
            self.started.set(true);
        }
    }

    fn handle_update(&self, time: FrameTime) {
        let Some((entity, runtime)) = self.live_context() else {
            return;
        };
        self.time.set(Some(time));
        let context = ScriptContext {
            time,
            entity: &entity,
            runtime: &runtime,
        };
        self.run_hook("update", |script| script.update(&context));
    }

    fn run_hook(&self, hook: &str, f: impl FnOnce(&mut S)) -> bool {
        match self.script.try_borrow_mut() {
            Ok(mut script) => {
                f(&mut script);
                true
            }
            Err(_) => {
                log::warn!("Skipping re-entrant {} of '{}' {{{}}}", hook, self.name(), self.id());
                false
            }
        }
    }
}

impl<S: Script> Behaviour for MonoBehaviour<S> {
    fn state(&self) -> &BehaviourState {
        &self.state
    }

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Script
    }

    fn on_create(this: &Rc<Self>, runtime: &Rc<Runtime>) -> Result<(), BehaviourError> {
        let dispatcher = runtime.dispatcher();

        let weak = Rc::downgrade(this);
        let start = dispatcher.subscribe(FramePhase::Start, move |event| {
            if let (Some(script), Some(time)) = (weak.upgrade(), event.time()) {
                script.handle_start(time);
            }
        });

        let weak = Rc::downgrade(this);
        let update = dispatcher.subscribe(FramePhase::Update, move |event| {
            if let (Some(script), Some(time)) = (weak.upgrade(), event.time()) {
                script.handle_update(time);
            }
        });

        this.subscriptions.borrow_mut().extend([start, update]);
        Ok(())
    }

    fn on_destroy(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        drop(subscriptions);
        self.link.clear();
        let host = self.host.borrow_mut().take();
        drop(host);
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
    use crate::ecs::Component;
    use crate::events::FrameEvent;
    use std::time::Duration;

    #[derive(Default)]
    struct Counter {
        starts: u32,
        updates: u32,
        last_frame: u64,
    }

    impl Script for Counter {
        fn start(&mut self, _context: &ScriptContext<'_>) {
            self.starts += 1;
        }

        fn update(&mut self, context: &ScriptContext<'_>) {
            self.updates += 1;
            self.last_frame = context.time().frame();
        }
    }

    struct Marker;

    fn runtime() -> Rc<Runtime> {
        Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader)
    }

    fn time(frame: u64) -> FrameTime {
        FrameTime::new(Duration::from_millis(10), Duration::from_millis(10 * frame), frame)
    }

    #[test]
    fn test_create_hosts_script_on_new_object() {
        let runtime = runtime();
        let script = MonoBehaviour::create(&runtime, Counter::default()).unwrap();

        let host = script.host().unwrap();
        assert_eq!(host.name(), "GameObject");
        assert_eq!(host.behaviour_count().unwrap(), 2);
        assert!(script.entity().is_some_and(|e| Rc::ptr_eq(&e, &host)));
        assert!(script.transform().is_some());
        assert_eq!(script.name(), "Counter");
        assert_eq!(script.kind(), BehaviourKind::Script);
    }

    #[test]
    fn test_create_with_attaches_extra_behaviours() {
        let runtime = runtime();
        let marker: Rc<dyn Behaviour> = Component::create(&runtime, Marker).unwrap();
        let script = MonoBehaviour::create_with(&runtime, Counter::default(), vec![marker]).unwrap();

        let host = script.host().unwrap();
        assert_eq!(host.behaviour_count().unwrap(), 3);
        assert!(host.get_behaviour::<Component<Marker>>().unwrap().is_some());
    }

    #[test]
    fn test_start_runs_once_and_update_every_frame() {
        let runtime = runtime();
        let script = MonoBehaviour::create(&runtime, Counter::default()).unwrap();
        assert!(script.last_time().is_none());

        for frame in 1..=3 {
            runtime.dispatch(&FrameEvent::Start(time(frame)));
            runtime.dispatch(&FrameEvent::Update(time(frame)));
        }

        assert!(script.is_started());
        assert_eq!(script.script().starts, 1);
        assert_eq!(script.script().updates, 3);
        assert_eq!(script.script().last_frame, 3);
        assert_eq!(script.last_time().map(|t| t.frame()), Some(3));
    }

    #[test]
    fn test_inactive_host_suppresses_hooks() {
        let runtime = runtime();
        let script = MonoBehaviour::create(&runtime, Counter::default()).unwrap();
        script.host().unwrap().set_active(false);

        runtime.dispatch(&FrameEvent::Start(time(1)));
        runtime.dispatch(&FrameEvent::Update(time(1)));

        assert!(!script.is_started());
        assert_eq!(script.script().updates, 0);
        assert!(script.last_time().is_none());
    }

    #[test]
    fn test_start_deferred_until_active() {
        let runtime = runtime();
        let script = MonoBehaviour::create(&runtime, Counter::default()).unwrap();
        script.set_active(false);
        runtime.dispatch(&FrameEvent::Start(time(1)));
        assert!(!script.is_started());

        script.set_active(true);
        runtime.dispatch(&FrameEvent::Start(time(2)));
        assert_eq!(script.script().starts, 1);
    }

    #[test]
    fn test_destroy_unsubscribes_and_releases_host() {
        let runtime = runtime();
        let script = MonoBehaviour::create(&runtime, Counter::default()).unwrap();
        let host = Rc::downgrade(&script.host().unwrap());
        assert_eq!(runtime.dispatcher().handler_count(FramePhase::Update), 1);

        script.destroy();

        assert_eq!(runtime.dispatcher().handler_count(FramePhase::Start), 0);
        assert_eq!(runtime.dispatcher().handler_count(FramePhase::Update), 0);
        assert!(script.host().is_none());
        assert!(script.entity().is_none());
        assert!(host.upgrade().is_none());
    }

    #[test]
    fn test_destroying_host_stops_updates() {
        let runtime = runtime();
        let script = MonoBehaviour::create(&runtime, Counter::default()).unwrap();
        runtime.dispatch(&FrameEvent::Update(time(1)));

        script.host().unwrap().destroy();
        runtime.dispatch(&FrameEvent::Update(time(2)));

        assert!(script.is_destroyed());
        assert_eq!(script.script().updates, 1);
    }
}
