//! In-memory sprite batch
//!
//! Collects the sprites submitted during a frame so a host can sort them by
//! depth and hand them to whatever actually draws.

use super::{SpriteBatch, SpriteDraw};

/// Collected sprite submissions for one frame
#[derive(Debug, Default)]
pub struct DrawQueue {
    commands: Vec<SpriteDraw>,
}

impl DrawQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Submitted sprites in submission order (or depth order after sorting)
    pub fn commands(&self) -> &[SpriteDraw] {
        &self.commands
    }

    /// Drop all submissions, keeping the allocation
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Stable sort by ascending depth
    pub fn sort_by_depth(&mut self) {
        self.commands.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }

    /// Take the submissions out, leaving the queue empty
    pub fn drain(&mut self) -> std::vec::Drain<'_, SpriteDraw> {
        self.commands.drain(..)
    }

    /// Number of submissions
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was submitted
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl SpriteBatch for DrawQueue {
    fn draw(&mut self, sprite: SpriteDraw) {
        self.commands.push(sprite);
    }
}
