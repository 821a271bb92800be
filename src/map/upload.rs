// src/map/upload.rs
//! Renderer-side resource upload and release

use super::source::RawTile;
use std::collections::HashMap;
use tracing::warn;

/// Turns fetched tile images into renderer resources.
///
/// Both calls run on the thread that owns the [`TileCache`](super::TileCache).
/// `release` consumes the handle, so a resource cannot be freed twice.
pub trait TileUploader {
    type Handle;

    fn upload(&mut self, tile: RawTile) -> Self::Handle;
    fn release(&mut self, handle: Self::Handle);
}

/// Opaque texture name handed out by [`TexturePool`]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Uploader that keeps tile pixels in host memory and accounts for them the
/// way a GPU texture allocator would.
#[derive(Debug, Default)]
pub struct TexturePool {
    next_id: u64,
    textures: HashMap<u64, RawTile>,
    bytes: usize,
    uploads: u64,
    releases: u64,
}

impl TexturePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixels(&self, id: &TextureId) -> Option<&RawTile> {
        self.textures.get(&id.0)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_bytes(&self) -> usize {
        self.bytes
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    pub fn release_count(&self) -> u64 {
        self.releases
    }
}

impl TileUploader for TexturePool {
    type Handle = TextureId;

    fn upload(&mut self, tile: RawTile) -> TextureId {
        self.next_id += 1;
        self.uploads += 1;
        self.bytes += tile.byte_len();
        self.textures.insert(self.next_id, tile);
        TextureId(self.next_id)
    }

    fn release(&mut self, handle: TextureId) {
        self.releases += 1;
        match self.textures.remove(&handle.0) {
            Some(tile) => self.bytes -= tile.byte_len(),
            None => warn!("Released unknown texture {}", handle.0),
        }
    }
}
