// src/geo/mod.rs
//! Projection-plane math and the viewport transform

pub mod mercator;
mod transform;

pub use transform::{Transform, MAX_ZOOM, WHEEL_ZOOM_RATE};
