//! Runtime context
//!
//! Everything behaviours share: the frame dispatcher, the tag registry, the
//! script manifest, the resource manager and the asset loader. Behaviours
//! hold a weak reference to the runtime that created them, so independent
//! runtimes can live side by side.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::assets::{
    AssetLoader, FileAssetLoader, LoadReport, ResourceConfig, ResourceError, ResourceManager, ScriptManifest,
};
use crate::config::RuntimeConfig;
use crate::ecs::{Script, TagRegistry};
use crate::events::{FrameDispatcher, FrameEvent, FramePhase, LoadInfo, Subscription};

/// Shared context of one behaviour world
pub struct Runtime {
    config: RuntimeConfig,
    dispatcher: FrameDispatcher,
    tags: RefCell<TagRegistry>,
    manifest: RefCell<ScriptManifest>,
    resources: RefCell<ResourceManager>,
    loader: Box<dyn AssetLoader>,
    last_load: RefCell<Option<LoadReport>>,
    _load_pass: Subscription,
}

impl Runtime {
    /// Runtime loading assets from `config.asset_root`
    pub fn new(config: RuntimeConfig) -> Rc<Self> {
        let loader = FileAssetLoader::new(config.asset_root.clone());
        Self::with_loader(config, loader)
    }

    /// Runtime loading assets through `loader`
    pub fn with_loader(config: RuntimeConfig, loader: impl AssetLoader + 'static) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Runtime>| {
            let dispatcher = FrameDispatcher::new();
            let weak = this.clone();
            let load_pass = dispatcher.subscribe(FramePhase::Load, move |event| {
                if let (Some(runtime), Some(info)) = (weak.upgrade(), event.load_info()) {
                    runtime.load_resources(info);
                }
            });

            let resources = ResourceManager::new(ResourceConfig {
                log_summary: config.log_resource_summary,
            });
            let tags = TagRegistry::with_tags(&config.initial_tags);
            log::debug!("Runtime created with asset root {:?}", config.asset_root);

            Self {
                config,
                dispatcher,
                tags: RefCell::new(tags),
                manifest: RefCell::new(ScriptManifest::new()),
                resources: RefCell::new(resources),
                loader: Box::new(loader),
                last_load: RefCell::new(None),
                _load_pass: load_pass,
            }
        })
    }

    /// Configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Frame event dispatcher
    pub fn dispatcher(&self) -> &FrameDispatcher {
        &self.dispatcher
    }

    /// Deliver a frame event; returns the number of handlers invoked
    pub fn dispatch(&self, event: &FrameEvent) -> usize {
        log::trace!("Dispatching {} event", event.phase());
        self.dispatcher.dispatch(event)
    }

    /// Run the resource load pass over every registered script type
    pub fn load_resources(&self, info: &LoadInfo) -> LoadReport {
        let manifest = self.manifest.borrow();
        let report = self.resources.borrow_mut().load_all(&manifest, self.loader.as_ref(), info);
        *self.last_load.borrow_mut() = Some(report);
        report
    }

    /// Report of the most recent load pass
    pub fn last_load_report(&self) -> Option<LoadReport> {
        *self.last_load.borrow()
    }

    /// Known tags
    pub fn tags(&self) -> Ref<'_, TagRegistry> {
        self.tags.borrow()
    }

    /// Add a tag; returns `false` if it is empty or already known
    pub fn register_tag(&self, tag: &str) -> bool {
        self.tags.borrow_mut().register(tag)
    }

    /// Declare a script type and its resource requests
    ///
    /// Returns `false` if the type was already registered.
    pub fn register_script<S: Script>(&self) -> bool {
        self.manifest.borrow_mut().register::<S>()
    }

    /// Registered script types
    pub fn manifest(&self) -> Ref<'_, ScriptManifest> {
        self.manifest.borrow()
    }

    /// Resource manager
    pub fn resources(&self) -> Ref<'_, ResourceManager> {
        self.resources.borrow()
    }

    /// Shared instance of the resource `name` loaded as `T`
    pub fn resource<T: Any>(&self, name: &str) -> Result<Rc<T>, ResourceError> {
        self.resources.borrow().get::<T>(name)
    }
}
