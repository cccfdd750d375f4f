//! Application trait and lifecycle management

use crate::assets::ResourceError;
use crate::config::ConfigError;
use crate::ecs::BehaviourError;
use crate::engine::{Engine, EngineError};
use crate::events::FrameTime;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive a runtime with [`Engine::run`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the load event. Register script types and create
    /// the initial game objects here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called after each frame's start, update and render events
    fn frame(&mut self, _engine: &mut Engine, _time: FrameTime) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called when the main loop ends.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Behaviour or game object error
    #[error("Behaviour error: {0}")]
    Behaviour(#[from] BehaviourError),

    /// Resource lookup error
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
