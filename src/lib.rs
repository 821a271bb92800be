// src/lib.rs
//! Map Viewport Library
//!
//! A Web Mercator viewport transform and a viewport-driven raster tile cache
//! with bounded parallel fetching and LRU eviction.

pub mod config;
pub mod display;
pub mod error;
pub mod geo;
pub mod map;
pub mod viewer;

// Re-export main types for convenience
pub use config::ViewerConfig;
pub use error::{MapError, Result};
pub use geo::Transform;
pub use map::{TileAddress, TileCache, TileSource, TileUploader};
pub use viewer::{Frame, MapViewer};
