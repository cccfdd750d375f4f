//! Sprite renderer
//!
//! Draws the renderer's texture at the owning transform through a shared
//! [`SpriteBatch`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::behaviour::Behaviour;
use crate::ecs::renderer::{Render, RenderContext, Renderer};
use crate::foundation::math::Vec2;
use crate::render::{Color, Rect, SpriteBatch, SpriteDraw, SpriteEffects};

/// Source rectangle used when a sprite has none
pub const DEFAULT_SOURCE: Rect = Rect::new(0, 0, 100, 100);

/// Sprite-local placement relative to the owning transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteRect {
    /// Region of the texture to draw, [`DEFAULT_SOURCE`] when unset
    pub source: Option<Rect>,
    /// Extra rotation in radians
    pub rotation: f32,
    /// Extra per-axis scale
    pub scale: Vec2,
}

impl Default for SpriteRect {
    fn default() -> Self {
        Self {
            source: None,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

/// Render hook drawing a textured sprite
pub struct Sprite {
    batch: Rc<RefCell<dyn SpriteBatch>>,
    /// Placement relative to the transform
    pub rect: SpriteRect,
    /// Mirroring
    pub effects: SpriteEffects,
    /// Layer depth
    pub depth: f32,
    /// Color multiplier
    pub tint: Color,
}

/// Renderer drawing a [`Sprite`]
pub type SpriteRenderer = Renderer<Sprite>;

impl Sprite {
    /// Sprite drawing into `batch` with default placement
    pub fn new(batch: Rc<RefCell<dyn SpriteBatch>>) -> Self {
        Self {
            batch,
            rect: SpriteRect::default(),
            effects: SpriteEffects::empty(),
            depth: 0.0,
            tint: Color::WHITE,
        }
    }

    /// Set the placement
    pub fn with_rect(mut self, rect: SpriteRect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the mirroring
    pub fn with_effects(mut self, effects: SpriteEffects) -> Self {
        self.effects = effects;
        self
    }

    /// Set the layer depth
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the tint
    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }
}

impl Render for Sprite {
    fn render(&mut self, context: &RenderContext<'_>) {
        let Some(texture) = context.texture() else {
            log::trace!("Sprite on '{}' has no texture, skipping draw", context.entity().name());
            return;
        };

        let (position, rotation, scale) = match context.transform() {
            Some(transform) => (transform.position(), transform.rotation(), transform.scale()),
            None => (Vec2::zeros(), 0.0, Vec2::new(1.0, 1.0)),
        };
        let draw = SpriteDraw {
            texture: Rc::clone(texture),
            position,
            source: self.rect.source.unwrap_or(DEFAULT_SOURCE),
            tint: self.tint,
            rotation: rotation + self.rect.rotation,
            origin: Vec2::new(texture.width() as f32 * 0.5, texture.height() as f32 * 0.5),
            scale: scale.component_mul(&self.rect.scale),
            effects: self.effects,
            depth: self.depth,
        };

        match self.batch.try_borrow_mut() {
            Ok(mut batch) => batch.draw(draw),
            Err(_) => log::error!("Sprite batch is busy, dropping draw for '{}'", context.entity().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{NullAssetLoader, Texture};
    use crate::config::RuntimeConfig;
    use crate::ecs::{Behaviour, GameObject};
    use crate::events::{FrameEvent, FrameTime};
    use crate::render::DrawQueue;
    use crate::runtime::Runtime;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn render_frame(runtime: &Rc<Runtime>) {
        runtime.dispatch(&FrameEvent::Render(FrameTime::new(Duration::from_millis(16), Duration::from_millis(16), 1)));
    }

    #[test]
    fn test_draws_at_transform_with_texture_centre_origin() {
        let runtime = Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader);
        let queue = Rc::new(RefCell::new(DrawQueue::new()));
        let texture = Rc::new(Texture::solid_color(32, 16, [255, 255, 255, 255]));

        let sprite = Sprite::new(queue.clone())
            .with_rect(SpriteRect {
                source: Some(Rect::new(0, 0, 32, 16)),
                rotation: 0.5,
                scale: Vec2::new(2.0, 3.0),
            })
            .with_depth(0.25);
        let renderer = SpriteRenderer::create_with_texture(&runtime, sprite, Some(texture)).unwrap();
        let entity = GameObject::create(&runtime).unwrap();
        entity.add_behaviour(Some(renderer)).unwrap();

        let transform = entity.transform().unwrap();
        transform.set_position(Vec2::new(10.0, -4.0));
        transform.set_rotation(0.25);
        transform.set_scale(Vec2::new(0.5, 0.5));

        render_frame(&runtime);

        let queue = queue.borrow();
        assert_eq!(queue.len(), 1);
        let draw = &queue.commands()[0];
        assert_relative_eq!(draw.position, Vec2::new(10.0, -4.0));
        assert_relative_eq!(draw.origin, Vec2::new(16.0, 8.0));
        assert_relative_eq!(draw.rotation, 0.75);
        assert_relative_eq!(draw.scale, Vec2::new(1.0, 1.5));
        assert_eq!(draw.source, Rect::new(0, 0, 32, 16));
        assert_eq!(draw.tint, Color::WHITE);
        assert_relative_eq!(draw.depth, 0.25);
    }

    #[test]
    fn test_missing_source_uses_default_rect() {
        let runtime = Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader);
        let queue = Rc::new(RefCell::new(DrawQueue::new()));
        let texture = Rc::new(Texture::solid_color(8, 8, [0, 0, 0, 255]));
        let renderer = SpriteRenderer::create_with_texture(&runtime, Sprite::new(queue.clone()), Some(texture)).unwrap();
        let entity = GameObject::create(&runtime).unwrap();
        entity.add_behaviour(Some(renderer)).unwrap();

        render_frame(&runtime);

        assert_eq!(queue.borrow().commands()[0].source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_no_texture_skips_draw() {
        let runtime = Runtime::with_loader(RuntimeConfig::default(), NullAssetLoader);
        let queue = Rc::new(RefCell::new(DrawQueue::new()));
        let renderer = SpriteRenderer::create(&runtime, Sprite::new(queue.clone())).unwrap();
        let entity = GameObject::create(&runtime).unwrap();
        entity.add_behaviour(Some(Rc::clone(&renderer))).unwrap();

        render_frame(&runtime);

        assert!(queue.borrow().is_empty());
        assert!(renderer.last_time().is_some());
        assert!(renderer.is_alive());
    }
}
