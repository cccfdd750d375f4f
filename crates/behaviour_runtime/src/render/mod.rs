//! Sprite rendering seam
//!
//! Renderers never talk to a graphics backend directly. They submit
//! [`SpriteDraw`] commands to a [`SpriteBatch`]; a host decides what a batch
//! does with them. [`DrawQueue`] is the in-memory batch used by tools, tests
//! and headless hosts.

pub mod draw_queue;

pub use draw_queue::DrawQueue;

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::assets::Texture;
use crate::foundation::math::Vec2;

bitflags! {
    /// Mirroring applied to a sprite
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpriteEffects: u8 {
        /// Mirror along the vertical axis
        const FLIP_HORIZONTALLY = 1 << 0;
        /// Mirror along the horizontal axis
        const FLIP_VERTICALLY = 1 << 1;
    }
}

/// Axis-aligned rectangle in texture pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole texture
    pub fn of_texture(texture: &Texture) -> Self {
        Self::new(0, 0, texture.width(), texture.height())
    }
}

/// RGBA color multiplier, components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white, the identity tint
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Create a color from components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One sprite submission
#[derive(Clone)]
pub struct SpriteDraw {
    /// Texture to sample
    pub texture: Rc<Texture>,
    /// World position of the sprite origin
    pub position: Vec2,
    /// Source rectangle inside the texture
    pub source: Rect,
    /// Color multiplier
    pub tint: Color,
    /// Rotation in radians
    pub rotation: f32,
    /// Pivot in texture pixels
    pub origin: Vec2,
    /// Per-axis scale
    pub scale: Vec2,
    /// Mirroring
    pub effects: SpriteEffects,
    /// Layer depth, lower draws first
    pub depth: f32,
}

impl fmt::Debug for SpriteDraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteDraw")
            .field("texture", &format_args!("{}x{}", self.texture.width(), self.texture.height()))
            .field("position", &self.position)
            .field("source", &self.source)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("effects", &self.effects)
            .field("depth", &self.depth)
            .finish()
    }
}

/// Destination for sprite submissions
pub trait SpriteBatch {
    /// Queue one sprite
    fn draw(&mut self, sprite: SpriteDraw);
}
