//! Frame event dispatch
//!
//! The host fires one ordered set of events per frame (load once at startup,
//! then start → update → render every frame). Behaviours register handlers for
//! the phases they care about and keep the returned [`Subscription`] for as long
//! as they are alive. Key principles:
//! - Registration system (only handlers for the fired phase are notified)
//! - Subscription order is delivery order
//! - Unsubscription is scoped: dropping the guard releases the handler

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

new_key_type! {
    /// Key identifying one registered frame handler
    pub struct HandlerKey;
}

/// Phase of the frame loop an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// Content loading (fired once before the first frame)
    Load,
    /// Script start (fired every frame, scripts start at most once)
    Start,
    /// Script update
    Update,
    /// Rendering
    Render,
}

impl FramePhase {
    /// All phases in firing order
    pub const ALL: [FramePhase; 4] = [Self::Load, Self::Start, Self::Update, Self::Render];

    fn index(self) -> usize {
        match self {
            Self::Load => 0,
            Self::Start => 1,
            Self::Update => 2,
            Self::Render => 3,
        }
    }
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Start => "start",
            Self::Update => "update",
            Self::Render => "render",
        };
        f.write_str(name)
    }
}

/// Timing snapshot delivered with start, update and render events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameTime {
    elapsed: Duration,
    total: Duration,
    frame: u64,
}

impl FrameTime {
    /// Create a timing snapshot
    pub fn new(elapsed: Duration, total: Duration, frame: u64) -> Self {
        Self { elapsed, total, frame }
    }

    /// Time since the previous frame
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time since the host started
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Frame index, starting at 1 for the first stepped frame
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Time since the previous frame in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Diagnostic payload of the load event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadInfo {
    info: String,
}

impl LoadInfo {
    /// Create a load payload with a diagnostic message
    pub fn new(info: impl Into<String>) -> Self {
        Self { info: info.into() }
    }

    /// Diagnostic message supplied by the host
    pub fn info(&self) -> &str {
        &self.info
    }
}

/// Event fired by the host into the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Content load pass
    Load(LoadInfo),
    /// Frame start
    Start(FrameTime),
    /// Frame update
    Update(FrameTime),
    /// Frame render
    Render(FrameTime),
}

impl FrameEvent {
    /// Phase this event is delivered to
    pub fn phase(&self) -> FramePhase {
        match self {
            Self::Load(_) => FramePhase::Load,
            Self::Start(_) => FramePhase::Start,
            Self::Update(_) => FramePhase::Update,
            Self::Render(_) => FramePhase::Render,
        }
    }

    /// Frame timing, absent for the load event
    pub fn time(&self) -> Option<FrameTime> {
        match self {
            Self::Load(_) => None,
            Self::Start(time) | Self::Update(time) | Self::Render(time) => Some(*time),
        }
    }

    /// Load payload, present only for the load event
    pub fn load_info(&self) -> Option<&LoadInfo> {
        match self {
            Self::Load(info) => Some(info),
            _ => None,
        }
    }
}

/// Shared handler callable by the dispatcher
pub type FrameHandler = Rc<dyn Fn(&FrameEvent)>;

struct Registration {
    phase: FramePhase,
    handler: FrameHandler,
}

#[derive(Default)]
struct DispatcherInner {
    registrations: SlotMap<HandlerKey, Registration>,
    order: [Vec<HandlerKey>; 4],
}

impl DispatcherInner {
    fn unregister(&mut self, key: HandlerKey) -> Option<Registration> {
        let registration = self.registrations.remove(key)?;
        self.order[registration.phase.index()].retain(|k| *k != key);
        Some(registration)
    }
}

/// Frame event dispatcher with per-phase handler registration
///
/// Dispatch snapshots the handler list before invoking it, so handlers may
/// subscribe, unsubscribe or destroy other behaviours while an event is being
/// delivered:
/// - a handler unsubscribed mid-dispatch is skipped if it has not run yet
/// - a handler subscribed mid-dispatch first runs on the next event
#[derive(Default)]
pub struct FrameDispatcher {
    inner: Rc<RefCell<DispatcherInner>>,
}

impl FrameDispatcher {
    /// Create a new dispatcher with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one phase
    ///
    /// The handler stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, phase: FramePhase, handler: F) -> Subscription
    where
        F: Fn(&FrameEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let key = inner.registrations.insert(Registration {
            phase,
            handler: Rc::new(handler),
        });
        inner.order[phase.index()].push(key);
        log::debug!("Subscribed handler {:?} to {} events", key, phase);

        Subscription {
            dispatcher: Rc::downgrade(&self.inner),
            key,
            phase,
        }
    }

    /// Deliver an event to every handler registered for its phase
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &FrameEvent) -> usize {
        let phase = event.phase();
        let snapshot: Vec<(HandlerKey, FrameHandler)> = {
            let inner = self.inner.borrow();
            inner.order[phase.index()]
                .iter()
                .filter_map(|key| {
                    inner
                        .registrations
                        .get(*key)
                        .map(|registration| (*key, Rc::clone(&registration.handler)))
                })
                .collect()
        };

        let mut delivered = 0;
        for (key, handler) in snapshot {
            // Skip handlers released by an earlier handler of this dispatch
            if !self.inner.borrow().registrations.contains_key(key) {
                continue;
            }
            handler(event);
            delivered += 1;
        }

        log::trace!("Dispatched {} event to {} handler(s)", phase, delivered);
        delivered
    }

    /// Number of handlers currently registered for a phase
    pub fn handler_count(&self, phase: FramePhase) -> usize {
        self.inner.borrow().order[phase.index()].len()
    }
}

/// Scoped registration of a frame handler
///
/// Dropping the guard unsubscribes the handler exactly once. The guard only
/// holds a weak link to its dispatcher, so a guard that outlives the
/// dispatcher is inert.
#[must_use = "dropping a Subscription immediately unsubscribes its handler"]
pub struct Subscription {
    dispatcher: Weak<RefCell<DispatcherInner>>,
    key: HandlerKey,
    phase: FramePhase,
}

impl Subscription {
    /// Phase the handler is registered for
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Whether the handler is still registered with a live dispatcher
    pub fn is_registered(&self) -> bool {
        self.dispatcher
            .upgrade()
            .is_some_and(|inner| inner.borrow().registrations.contains_key(self.key))
    }

    /// Unsubscribe now instead of at end of scope
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.dispatcher.upgrade() else {
            return;
        };
        // The registration is dropped after the borrow ends; its handler may own other guards.
        let removed = match inner.try_borrow_mut() {
            Ok(mut inner) => inner.unregister(self.key),
            Err(_) => {
                log::error!(
                    "Could not release {} handler {:?}: dispatcher is busy",
                    self.phase,
                    self.key
                );
                None
            }
        };
        if removed.is_some() {
            log::debug!("Unsubscribed handler {:?} from {} events", self.key, self.phase);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn update_event(frame: u64) -> FrameEvent {
        FrameEvent::Update(FrameTime::new(Duration::from_millis(16), Duration::from_millis(16 * frame), frame))
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let dispatcher = FrameDispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first_log = Rc::clone(&log);
        let _first = dispatcher.subscribe(FramePhase::Update, move |_| first_log.borrow_mut().push("first"));
        let second_log = Rc::clone(&log);
        let _second = dispatcher.subscribe(FramePhase::Update, move |_| second_log.borrow_mut().push("second"));

        assert_eq!(dispatcher.dispatch(&update_event(1)), 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_only_matching_phase_is_notified() {
        let dispatcher = FrameDispatcher::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _render = dispatcher.subscribe(FramePhase::Render, move |_| counter.set(counter.get() + 1));

        dispatcher.dispatch(&update_event(1));
        dispatcher.dispatch(&FrameEvent::Load(LoadInfo::new("boot")));
        assert_eq!(hits.get(), 0);

        dispatcher.dispatch(&FrameEvent::Render(FrameTime::default()));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let dispatcher = FrameDispatcher::new();
        let subscription = dispatcher.subscribe(FramePhase::Start, |_| {});
        assert!(subscription.is_registered());
        assert_eq!(dispatcher.handler_count(FramePhase::Start), 1);

        subscription.cancel();
        assert_eq!(dispatcher.handler_count(FramePhase::Start), 0);
        assert_eq!(dispatcher.dispatch(&FrameEvent::Start(FrameTime::default())), 0);
    }

    #[test]
    fn test_handler_released_mid_dispatch_is_skipped() {
        let dispatcher = FrameDispatcher::new();
        let hits = Rc::new(Cell::new(0));
        let victim_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim_slot);
        let _killer = dispatcher.subscribe(FramePhase::Update, move |_| {
            slot.borrow_mut().take();
        });
        let counter = Rc::clone(&hits);
        *victim_slot.borrow_mut() =
            Some(dispatcher.subscribe(FramePhase::Update, move |_| counter.set(counter.get() + 1)));

        assert_eq!(dispatcher.dispatch(&update_event(1)), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(dispatcher.handler_count(FramePhase::Update), 1);
    }

    #[test]
    fn test_handler_added_mid_dispatch_runs_next_event() {
        let dispatcher = Rc::new(FrameDispatcher::new());
        let hits = Rc::new(Cell::new(0));
        let added: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let weak_dispatcher = Rc::downgrade(&dispatcher);
        let counter = Rc::clone(&hits);
        let store = Rc::clone(&added);
        let _spawner = dispatcher.subscribe(FramePhase::Update, move |_| {
            if let Some(dispatcher) = weak_dispatcher.upgrade() {
                let counter = Rc::clone(&counter);
                store
                    .borrow_mut()
                    .push(dispatcher.subscribe(FramePhase::Update, move |_| counter.set(counter.get() + 1)));
            }
        });

        dispatcher.dispatch(&update_event(1));
        assert_eq!(hits.get(), 0);

        dispatcher.dispatch(&update_event(2));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_dispatcher_is_inert() {
        let dispatcher = FrameDispatcher::new();
        let subscription = dispatcher.subscribe(FramePhase::Render, |_| {});
        drop(dispatcher);

        assert!(!subscription.is_registered());
        drop(subscription);
    }

    #[test]
    fn test_event_accessors() {
        let time = FrameTime::new(Duration::from_millis(10), Duration::from_millis(30), 3);
        let event = FrameEvent::Start(time);
        assert_eq!(event.phase(), FramePhase::Start);
        assert_eq!(event.time(), Some(time));
        assert!(event.load_info().is_none());

        let load = FrameEvent::Load(LoadInfo::new("content"));
        assert_eq!(load.load_info().map(LoadInfo::info), Some("content"));
        assert_eq!(load.time(), None);
    }
}
