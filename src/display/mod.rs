// src/display/mod.rs
//! Text readouts of the viewer state

pub mod terminal;

use crate::{
    geo::mercator::lng_lat_to_tile,
    map::{CacheStats, TileUploader},
    viewer::MapViewer,
};

/// Point-in-time view of the viewer for display
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    pub frame_id: u64,
    pub center_lng: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub tile_zoom: u8,
    pub center_tile: (u32, u32),
    pub world_copies: bool,
    pub visible: usize,
    pub drawn: usize,
    pub max_parallel: usize,
    pub max_cache: usize,
    pub stats: CacheStats,
}

impl ViewSnapshot {
    pub fn capture<U: TileUploader>(viewer: &MapViewer<U>, visible: usize, drawn: usize) -> Self {
        let transform = viewer.transform();
        let (center_lng, center_lat) = transform.get_center();
        let tile_zoom = transform.tile_zoom();
        Self {
            frame_id: viewer.frame_id(),
            center_lng,
            center_lat,
            zoom: transform.zoom(),
            bearing: transform.bearing(),
            tile_zoom,
            center_tile: lng_lat_to_tile(center_lng, center_lat, tile_zoom),
            world_copies: transform.render_world_copies(),
            visible,
            drawn,
            max_parallel: viewer.cache().max_parallel(),
            max_cache: viewer.cache().max_cache(),
            stats: viewer.stats(),
        }
    }

    /// One-line summary for log output
    pub fn summary(&self) -> String {
        format!(
            "frame={} z={} visible={} drawn={} center=({:.4}, {:.4}) zoom={:.2} bearing={:.1}° cache={} inFlight={} queued={} evicted={}",
            self.frame_id,
            self.tile_zoom,
            self.visible,
            self.drawn,
            self.center_lng,
            self.center_lat,
            self.zoom,
            self.bearing,
            self.stats.resident,
            self.stats.in_flight,
            self.stats.queue_len,
            self.stats.evicted_last_frame,
        )
    }
}
