// src/map/mod.rs
//! Tile addressing, visibility and the resource cache

mod address;
mod source;
mod tile_cache;
mod upload;
mod visible;

pub use address::TileAddress;
pub use source::{FetchFuture, HttpTileSource, RawTile, SyntheticTileSource, TileSource};
pub use tile_cache::{CacheEntry, CacheStats, TileCache, TileState};
pub use upload::{TexturePool, TextureId, TileUploader};
pub use visible::visible_tiles;
