// src/viewer.rs
//! Frame driver tying the transform to the tile cache

use crate::{
    config::{ViewerConfig, OSM_URL_TEMPLATE},
    error::Result,
    geo::Transform,
    map::{
        visible_tiles, CacheStats, HttpTileSource, SyntheticTileSource, TileAddress, TileCache,
        TileSource, TileUploader,
    },
};
use glam::{DMat4, DVec2};
use std::sync::Arc;
use tracing::info;

/// One tile to draw this frame. `handle` is `None` while the tile is queued,
/// loading or failed; the renderer skips it.
#[derive(Debug)]
pub struct TileDraw<'a, H> {
    pub address: TileAddress,
    pub origin: DVec2,
    pub edge: f64,
    pub handle: Option<&'a H>,
}

/// Everything the renderer needs for one frame
#[derive(Debug)]
pub struct Frame<'a, H> {
    pub frame_id: u64,
    pub tile_zoom: u8,
    pub matrix: DMat4,
    pub tiles: Vec<TileDraw<'a, H>>,
}

impl<'a, H> Frame<'a, H> {
    /// Tiles with a loaded resource
    pub fn drawable(&self) -> impl Iterator<Item = &TileDraw<'a, H>> {
        self.tiles.iter().filter(|tile| tile.handle.is_some())
    }

    pub fn matrix_f32(&self) -> [f32; 16] {
        self.matrix.as_mat4().to_cols_array()
    }
}

/// Owns the viewport transform and tile cache and advances them one frame
/// at a time.
pub struct MapViewer<U: TileUploader> {
    transform: Transform,
    cache: TileCache<U>,
    frame_id: u64,
}

impl<U: TileUploader> MapViewer<U> {
    pub fn new(transform: Transform, cache: TileCache<U>) -> Self {
        Self {
            transform,
            cache,
            frame_id: 0,
        }
    }

    /// Build a viewer, its tile source and transform from configuration
    pub fn from_config(config: &ViewerConfig, uploader: U) -> Result<Self> {
        config.validate()?;
        let source = build_source(config)?;

        let mut transform = Transform::new(
            config.viewport_width as f64,
            config.viewport_height as f64,
            config.tile_size as f64,
        );
        transform.set_render_world_copies(config.render_world_copies);
        transform.set_center(config.center_lng, config.center_lat);
        transform.set_zoom(config.zoom, None);
        transform.set_bearing(config.bearing);

        let cache = TileCache::new(source, uploader, config.max_parallel, config.max_cache);
        Ok(Self::new(transform, cache))
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn cache(&self) -> &TileCache<U> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TileCache<U> {
        &mut self.cache
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Advance one frame: compute visible tiles, reconcile the cache and
    /// return what to draw.
    pub fn frame(&mut self) -> Frame<'_, U::Handle> {
        self.frame_id += 1;
        let tile_zoom = self.transform.tile_zoom();
        let visible = visible_tiles(&self.transform, tile_zoom);
        self.cache.reconcile(&visible, self.frame_id);

        let tiles = visible
            .into_iter()
            .map(|address| TileDraw {
                address,
                origin: address.origin(),
                edge: address.edge(),
                handle: self.cache.handle(&address),
            })
            .collect();

        Frame {
            frame_id: self.frame_id,
            tile_zoom,
            matrix: self.transform.projection_matrix(),
            tiles,
        }
    }
}

/// Tile source selected by `config.source_type`
pub fn build_source(config: &ViewerConfig) -> Result<Arc<dyn TileSource>> {
    config.validate()?;
    match config.source_type.as_str() {
        "http" => {
            let template = config.url_template.as_deref().unwrap_or(OSM_URL_TEMPLATE);
            let user_agent = config.user_agent.as_deref().unwrap_or("MapViewport/0.1");
            info!("Using HTTP tile source {}", template);
            Ok(Arc::new(HttpTileSource::new(template, user_agent, config.http_timeout())?))
        }
        _ => {
            let (min_delay, max_delay) = config.synthetic_delays();
            info!(
                "Using synthetic tile source ({}-{} ms latency)",
                min_delay.as_millis(),
                max_delay.as_millis()
            );
            Ok(Arc::new(SyntheticTileSource::new(config.tile_size, min_delay, max_delay)))
        }
    }
}
