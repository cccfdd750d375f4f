//! Built-in behaviours
//!
//! Contains the transform every game object owns and the sprite renderer.

pub mod transform;
pub mod sprite_renderer;

pub use transform::Transform;
pub use sprite_renderer::{Sprite, SpriteRect, SpriteRenderer};
