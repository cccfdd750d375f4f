//! Demo configuration
//!
//! Read from `sprite_demo.toml` next to the working directory; every field is
//! optional.

use behaviour_runtime::config::Config;
use behaviour_runtime::EngineConfig;
use serde::{Deserialize, Serialize};

/// Demo configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Engine and runtime settings
    pub engine: EngineConfig,

    /// Scene settings
    pub scene: SceneConfig,
}

/// What the demo puts on screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Number of escorts following the ship
    pub escort_count: u32,

    /// Ship rotation speed in radians per second
    pub spin_speed: f32,

    /// Escort drift in units per second
    pub drift: [f32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            escort_count: 2,
            spin_speed: 1.5,
            drift: [40.0, 0.0],
        }
    }
}

impl Config for DemoConfig {}

impl DemoConfig {
    /// Fill in a frame limit and a fixed step when the file leaves them unset
    pub fn with_demo_defaults(mut self) -> Self {
        self.engine.max_frames.get_or_insert(5);
        self.engine.fixed_delta.get_or_insert(1.0 / 60.0);
        self
    }
}
