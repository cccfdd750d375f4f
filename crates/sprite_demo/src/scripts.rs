//! Demo scripts
//!
//! `Ship` spins in place and `Escort` drifts sideways. Both ask for the same
//! texture, so the load pass reads it once and both draw the shared copy.

use behaviour_runtime::prelude::*;

/// Texture requested by both scripts
pub const HERO_TEXTURE: &str = "hero.png";

fn hero_request() -> Vec<ResourceRequest> {
    vec![ResourceRequest::new::<Texture>([HERO_TEXTURE])]
}

/// Hand the shared texture to the sprite renderer on the script's game object
fn skin_sprite(context: &ScriptContext<'_>) {
    let texture = match context.resource::<Texture>(HERO_TEXTURE) {
        Ok(texture) => texture,
        Err(err) => {
            log::warn!("{} has no texture: {}", context.entity().name(), err);
            return;
        }
    };
    match context.entity().get_behaviour::<SpriteRenderer>() {
        Ok(Some(renderer)) => renderer.set_texture(Some(texture)),
        Ok(None) => log::warn!("{} has no sprite renderer", context.entity().name()),
        Err(err) => log::error!("{}", err),
    }
}

/// Spinning ship
pub struct Ship {
    /// Radians per second
    pub spin_speed: f32,
}

impl Script for Ship {
    fn start(&mut self, context: &ScriptContext<'_>) {
        context.entity().set_name("Ship");
        context.entity().set_tag("Player");
        skin_sprite(context);
    }

    fn update(&mut self, context: &ScriptContext<'_>) {
        if let Some(transform) = context.transform() {
            transform.rotate(self.spin_speed * context.time().elapsed_secs());
        }
    }

    fn resource_requests() -> Vec<ResourceRequest> {
        hero_request()
    }
}

/// Sideways-drifting escort
pub struct Escort {
    /// Units per second
    pub velocity: Vec2,
}

impl Script for Escort {
    fn start(&mut self, context: &ScriptContext<'_>) {
        context.entity().set_tag("Escort");
        skin_sprite(context);
    }

    fn update(&mut self, context: &ScriptContext<'_>) {
        if let Some(transform) = context.transform() {
            transform.translate(self.velocity * context.time().elapsed_secs());
        }
    }

    fn resource_requests() -> Vec<ResourceRequest> {
        hero_request()
    }
}
