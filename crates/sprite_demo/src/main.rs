//! Sprite demo
//!
//! Builds a ship and a few escorts, fires a handful of fixed-step frames and
//! prints the sprite draws each frame produced.

mod config;
mod scripts;

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use behaviour_runtime::assets::{AssetError, TypeTag};
use behaviour_runtime::foundation::logging;
use behaviour_runtime::prelude::*;

use config::DemoConfig;
use scripts::{Escort, Ship, HERO_TEXTURE};

const CONFIG_PATH: &str = "sprite_demo.toml";

struct SpriteDemo {
    config: DemoConfig,
    queue: Rc<RefCell<DrawQueue>>,
    scripts: Vec<Rc<dyn Behaviour>>,
}

impl SpriteDemo {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            queue: Rc::new(RefCell::new(DrawQueue::new())),
            scripts: Vec::new(),
        }
    }

    fn sprite(&self, runtime: &Rc<Runtime>, depth: f32) -> Result<Rc<dyn Behaviour>, AppError> {
        let sprite = Sprite::new(self.queue.clone()).with_depth(depth);
        Ok(SpriteRenderer::create(runtime, sprite)?)
    }
}

impl Application for SpriteDemo {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let runtime = Rc::clone(engine.runtime());
        runtime.register_script::<Ship>();
        runtime.register_script::<Escort>();

        let scene = &self.config.scene;
        let ship = MonoBehaviour::create_with(
            &runtime,
            Ship { spin_speed: scene.spin_speed },
            [self.sprite(&runtime, 1.0)?],
        )?;
        self.scripts.push(ship);

        for index in 0..scene.escort_count {
            let escort = MonoBehaviour::create_with(
                &runtime,
                Escort {
                    velocity: Vec2::new(scene.drift[0], scene.drift[1]),
                },
                [self.sprite(&runtime, 0.0)?],
            )?;
            if let Some(transform) = escort.transform() {
                transform.set_position(Vec2::new(-64.0, 48.0 * (index as f32 + 1.0)));
            }
            self.scripts.push(escort);
        }

        log::info!("Scene ready with {} scripted objects", self.scripts.len());
        Ok(())
    }

    fn frame(&mut self, _engine: &mut Engine, time: FrameTime) -> Result<(), AppError> {
        let mut queue = self.queue.borrow_mut();
        queue.sort_by_depth();

        println!("frame {} ({} sprites)", time.frame(), queue.len());
        for draw in queue.commands() {
            println!(
                "  {}x{} at ({:.1}, {:.1}) rot {:.3} depth {:.1}",
                draw.texture.width(),
                draw.texture.height(),
                draw.position.x,
                draw.position.y,
                draw.rotation,
                draw.depth
            );
        }
        queue.clear();
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        for script in self.scripts.drain(..) {
            script.destroy();
        }
        if let Some(report) = engine.runtime().last_load_report() {
            log::info!("Resources: {} loaded, {} reused, {} failed", report.loaded, report.reused, report.failed);
        }
    }
}

/// File loader that stands in a placeholder texture for a missing hero sprite
fn demo_loader(root: &std::path::Path) -> impl AssetLoader {
    let files = FileAssetLoader::new(root);
    move |name: &str, target: TypeTag| -> Result<Box<dyn Any>, AssetError> {
        match files.load(name, target) {
            Err(AssetError::NotFound(path)) if name == HERO_TEXTURE && target == TypeTag::of::<Texture>() => {
                log::warn!("{} not found, using a placeholder texture", path);
                Ok(Box::new(Texture::solid_color(32, 32, [255, 196, 0, 255])))
            }
            result => result,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DemoConfig::load_or_default(CONFIG_PATH).with_demo_defaults();
    logging::init_with_level(&config.engine.runtime.log_level);

    let runtime = Runtime::with_loader(config.engine.runtime.clone(), demo_loader(&config.engine.runtime.asset_root));
    let engine = Engine::with_runtime(runtime, config.engine.clone())?;
    let mut app = SpriteDemo::new(config);
    engine.run_app(&mut app)?;
    Ok(())
}
