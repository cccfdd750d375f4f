//! # Behaviour Runtime
//!
//! Behaviour lifecycle, game objects and shared resources for a small
//! frame-driven game engine.
//!
//! ## Features
//!
//! - **Behaviours**: components, updateable scripts and renderers sharing one lifecycle
//! - **Game objects**: a transform plus an ordered behaviour list, in a parent/child hierarchy
//! - **Frame events**: load, start, update and render delivered through a dispatcher
//! - **Resources**: script-declared assets loaded once and shared by every consumer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use behaviour_runtime::prelude::*;
//!
//! #[derive(Default)]
//! struct Spinner;
//!
//! impl Script for Spinner {
//!     fn update(&mut self, context: &ScriptContext<'_>) {
//!         if let Some(transform) = context.transform() {
//!             transform.rotate(context.time().elapsed_secs());
//!         }
//!     }
//! }
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         engine.runtime().register_script::<Spinner>();
//!         MonoBehaviour::create(engine.runtime(), Spinner)?;
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig { max_frames: Some(60), ..EngineConfig::default() };
//!     Engine::run(config, &mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod render;

mod application;
mod engine;
mod runtime;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineConfig, EngineError};
pub use runtime::Runtime;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        assets::{AssetLoader, FileAssetLoader, ResourceRequest, Texture},
        config::{Config, RuntimeConfig},
        ecs::{
            Behaviour, BehaviourError, Component, GameObject, MonoBehaviour, Render, RenderContext, Renderer,
            Script, ScriptContext, Sprite, SpriteRect, SpriteRenderer, Transform,
        },
        events::{FrameEvent, FramePhase, FrameTime},
        foundation::math::Vec2,
        render::{Color, DrawQueue, Rect, SpriteBatch, SpriteEffects},
        AppError, Application, Engine, EngineConfig, EngineError, Runtime,
    };
}
