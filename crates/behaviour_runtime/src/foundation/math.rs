//! Math utilities and types
//!
//! The behaviour runtime drives a 2D sprite engine, so spatial data is kept in
//! the plane: positions and scales are [`Vec2`], rotations are radians around
//! the view axis and affine transforms are homogeneous [`Mat3`].

pub use nalgebra::{Matrix3, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3x3 homogeneous matrix type for 2D affine transforms
pub type Mat3 = Matrix3<f32>;

/// Build a TRS matrix (translation * rotation * scale) in homogeneous 2D.
pub fn trs_matrix(position: Vec2, rotation: f32, scale: Vec2) -> Mat3 {
    Mat3::new_translation(&position)
        * nalgebra::Rotation2::new(rotation).to_homogeneous()
        * Mat3::new_nonuniform_scaling(&scale)
}
