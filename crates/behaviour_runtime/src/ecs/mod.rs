//! Behaviour and game object model
//!
//! Attachable units of logic and the scene object that owns them:
//! - [`Behaviour`]: shared lifecycle (identity, active/destroyed, hooks)
//! - [`Component`]: data container with the entity-link capability
//! - [`MonoBehaviour`]: updateable script driven by start/update events
//! - [`Renderer`]: component driven by render events
//! - [`GameObject`]: owns a transform and an ordered list of behaviours

pub mod behaviour;
pub mod component;
pub mod script;
pub mod renderer;
pub mod game_object;
pub mod tags;
pub mod components;

#[cfg(test)]
mod tests;

pub use behaviour::{
    create, downcast, AsAny, Behaviour, BehaviourId, BehaviourKind, BehaviourState, EntityLink,
};
pub use component::Component;
pub use script::{MonoBehaviour, Script, ScriptContext};
pub use renderer::{Render, RenderContext, Renderer};
pub use game_object::GameObject;
pub use tags::TagRegistry;
pub use components::{Sprite, SpriteRect, SpriteRenderer, Transform};

use thiserror::Error;

/// Behaviour and game object errors
#[derive(Debug, Error)]
pub enum BehaviourError {
    /// The runtime a behaviour was created in has been dropped
    #[error("Runtime is no longer available for '{name}'")]
    RuntimeUnavailable {
        /// Name of the behaviour that needed the runtime
        name: String,
    },

    /// An internal invariant of a game object does not hold
    #[error("Invalid state on GameObject {entity} {{{id}}}: {reason}")]
    InvalidState {
        /// Game object name
        entity: String,
        /// Game object identity
        id: BehaviourId,
        /// What went wrong
        reason: String,
    },

    /// A creation hook failed
    #[error("Creation hook of '{name}' failed: {message}")]
    Hook {
        /// Name of the behaviour being created
        name: String,
        /// Failure description
        message: String,
    },
}
