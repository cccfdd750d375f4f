//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the runtime:
//! - Math types for 2D spatial data
//! - Frame timing
//! - Logging setup

pub mod math;
pub mod time;
pub mod logging;
