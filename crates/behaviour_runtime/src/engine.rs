//! Frame-loop host
//!
//! Fires the runtime's frame events in their fixed order: one load event, then
//! start, update and render for every frame.

use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::Application;
use crate::config::{Config, ConfigError, RuntimeConfig};
use crate::events::{FrameEvent, FrameTime, LoadInfo};
use crate::foundation::time::Timer;
use crate::runtime::Runtime;

/// Drives a [`Runtime`] frame by frame
pub struct Engine {
    runtime: Rc<Runtime>,
    timer: Timer,
    fixed_step: Option<Duration>,
    config: EngineConfig,
    loaded: bool,
    running: bool,
}

impl Engine {
    /// Create an engine with a fresh runtime
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let fixed_step = config.fixed_step()?;
        let runtime = Runtime::new(config.runtime.clone());
        Ok(Self::assemble(runtime, config, fixed_step))
    }

    /// Create an engine driving an existing runtime
    pub fn with_runtime(runtime: Rc<Runtime>, config: EngineConfig) -> Result<Self, EngineError> {
        let fixed_step = config.fixed_step()?;
        Ok(Self::assemble(runtime, config, fixed_step))
    }

    fn assemble(runtime: Rc<Runtime>, config: EngineConfig, fixed_step: Option<Duration>) -> Self {
        log::info!("Initializing engine...");
        Self {
            runtime,
            timer: Timer::new(),
            fixed_step,
            config,
            loaded: false,
            running: true,
        }
    }

    /// Run the engine main loop with the given application
    ///
    /// Stops when the application calls [`Engine::quit`] or after
    /// `max_frames` frames.
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        Self::new(config)?.run_app(app)
    }

    /// Run the main loop on this engine
    pub fn run_app<T: Application>(mut self, app: &mut T) -> Result<(), EngineError> {
        app.initialize(&mut self)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;
        self.load("Engine::run");

        log::info!("Starting main loop...");
        while self.running {
            if self.config.max_frames.is_some_and(|max| self.frame_count() >= max) {
                break;
            }
            let time = self.tick();
            app.frame(&mut self, time)
                .map_err(|e| EngineError::ApplicationError(format!("App frame: {}", e)))?;
        }

        app.cleanup(&mut self);

        log::info!("Engine shutdown complete after {} frames", self.frame_count());
        Ok(())
    }

    /// Fire the load event; only the first call does anything
    pub fn load(&mut self, info: impl Into<String>) -> bool {
        if self.loaded {
            return false;
        }
        self.loaded = true;
        self.runtime.dispatch(&FrameEvent::Load(LoadInfo::new(info)));
        true
    }

    /// Advance time by `delta` and fire one frame
    pub fn step(&mut self, delta: Duration) -> FrameTime {
        let time = self.timer.advance(delta);
        self.dispatch_frame(time);
        time
    }

    /// Fire one frame, timed by the fixed delta or the wall clock
    pub fn tick(&mut self) -> FrameTime {
        match self.fixed_step {
            Some(delta) => self.step(delta),
            None => {
                let time = self.timer.update();
                self.dispatch_frame(time);
                time
            }
        }
    }

    fn dispatch_frame(&self, time: FrameTime) {
        log::trace!("Frame {} ({:.4}s)", time.frame(), time.elapsed_secs());
        self.runtime.dispatch(&FrameEvent::Start(time));
        self.runtime.dispatch(&FrameEvent::Update(time));
        self.runtime.dispatch(&FrameEvent::Render(time));
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop should continue
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the load event has fired
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Frames fired so far
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    /// The runtime being driven
    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Runtime configuration
    pub runtime: RuntimeConfig,

    /// Stop after this many frames
    pub max_frames: Option<u64>,

    /// Seconds per frame; wall-clock time when unset
    pub fixed_delta: Option<f32>,
}

impl EngineConfig {
    /// The fixed frame step, checked to be a representable duration
    fn fixed_step(&self) -> Result<Option<Duration>, EngineError> {
        self.fixed_delta
            .map(|seconds| {
                Duration::try_from_secs_f32(seconds).map_err(|err| {
                    EngineError::InvalidConfig(format!(
                        "fixed_delta must be a finite, non-negative number of seconds, got {}: {}",
                        seconds, err
                    ))
                })
            })
            .transpose()
    }
}

impl Config for EngineConfig {}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The application failed
    #[error("Application error: {0}")]
    ApplicationError(String),
}
