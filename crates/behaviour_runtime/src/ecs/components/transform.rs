//! Transform behaviour
//!
//! The one behaviour every game object owns: 2D position, rotation and scale.
//! Values live in `Cell`s so the transform can be moved through a shared
//! `Rc<Transform>` from any script.

use std::cell::Cell;
use std::rc::Rc;

use crate::ecs::behaviour::{Behaviour, BehaviourKind, BehaviourState, EntityLink};
use crate::ecs::BehaviourError;
use crate::foundation::math::{trs_matrix, Mat3, Vec2};
use crate::runtime::Runtime;

/// Spatial transform of a game object
///
/// Rotation is in radians. Transforms are created by their game object.
pub struct Transform {
    state: BehaviourState,
    link: EntityLink,
    position: Cell<Vec2>,
    rotation: Cell<f32>,
    scale: Cell<Vec2>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            state: BehaviourState::new("Transform"),
            link: EntityLink::new(),
            position: Cell::new(Vec2::zeros()),
            rotation: Cell::new(0.0),
            scale: Cell::new(Vec2::new(1.0, 1.0)),
        }
    }
}

impl Transform {
    /// World position
    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    /// Set world position
    pub fn set_position(&self, position: Vec2) {
        self.position.set(position);
    }

    /// Move by an offset
    pub fn translate(&self, offset: Vec2) {
        self.position.set(self.position.get() + offset);
    }

    /// Rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation.get()
    }

    /// Set rotation in radians
    pub fn set_rotation(&self, rotation: f32) {
        self.rotation.set(rotation);
    }

    /// Rotate by an angle in radians
    pub fn rotate(&self, angle: f32) {
        self.rotation.set(self.rotation.get() + angle);
    }

    /// Scale factors
    pub fn scale(&self) -> Vec2 {
        self.scale.get()
    }

    /// Set scale factors
    pub fn set_scale(&self, scale: Vec2) {
        self.scale.set(scale);
    }

    /// Convert to transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat3 {
        trs_matrix(self.position(), self.rotation(), self.scale())
    }
}

impl Behaviour for Transform {
    fn state(&self) -> &BehaviourState {
        &self.state
    }

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Transform
    }

    fn on_create(_this: &Rc<Self>, _runtime: &Rc<Runtime>) -> Result<(), BehaviourError> {
        Ok(())
    }

    fn on_destroy(&self) {
        self.link.clear();
    }

    fn entity_link(&self) -> Option<&EntityLink> {
        Some(&self.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_identity() {
        let transform = Transform::default();
        assert_eq!(transform.position(), Vec2::zeros());
        assert_relative_eq!(transform.rotation(), 0.0);
        assert_eq!(transform.scale(), Vec2::new(1.0, 1.0));
        assert_eq!(transform.to_matrix(), Mat3::identity());
    }

    #[test]
    fn test_translate_and_rotate_accumulate() {
        let transform = Transform::default();
        transform.translate(Vec2::new(2.0, 1.0));
        transform.translate(Vec2::new(1.0, -3.0));
        transform.rotate(0.25);
        transform.rotate(0.5);

        assert_relative_eq!(transform.position().x, 3.0);
        assert_relative_eq!(transform.position().y, -2.0);
        assert_relative_eq!(transform.rotation(), 0.75);
    }

    #[test]
    fn test_matrix_applies_scale_then_translation() {
        let transform = Transform::default();
        transform.set_position(Vec2::new(5.0, 0.0));
        transform.set_scale(Vec2::new(3.0, 3.0));

        let matrix = transform.to_matrix();
        assert_relative_eq!(matrix[(0, 0)], 3.0);
        assert_relative_eq!(matrix[(0, 2)], 5.0);
    }
}
