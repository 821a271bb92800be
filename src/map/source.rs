// src/map/source.rs
//! Tile data sources: synthetic test pattern and HTTP raster tiles

use super::address::TileAddress;
use crate::error::{MapError, Result};
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

/// Pending fetch of one tile's pixels
pub type FetchFuture = BoxFuture<'static, Result<RawTile>>;

/// Decoded RGBA8 tile image, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTile {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawTile {
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Anything that can produce tile images.
///
/// `fetch` must not block; the returned future is driven on the Tokio
/// runtime and may resolve on any later frame.
pub trait TileSource: Send + Sync {
    fn fetch(&self, address: TileAddress) -> FetchFuture;
}

/// Generates colored test tiles after a simulated network latency.
#[derive(Debug, Clone)]
pub struct SyntheticTileSource {
    tile_size: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl SyntheticTileSource {
    pub fn new(tile_size: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            tile_size: tile_size.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Latency for an address, spread over `[min_delay, max_delay]`
    pub fn delay_for(&self, address: &TileAddress) -> Duration {
        let span = (self.max_delay - self.min_delay).as_millis() as u64;
        if span == 0 {
            return self.min_delay;
        }
        let mix = (address.x as u64).wrapping_mul(73_856_093)
            ^ (address.y as u64).wrapping_mul(19_349_663)
            ^ (address.zoom as u64).wrapping_mul(83_492_791)
            ^ (address.wrap as i64 as u64).wrapping_mul(2_654_435_761);
        self.min_delay + Duration::from_millis(mix % (span + 1))
    }

    /// Solid color keyed on `z/x/y` with a dark border and an 8×8 grid
    pub fn render(address: &TileAddress, size: u32) -> RawTile {
        let (x, y, z) = (address.x as u64, address.y as u64, address.zoom as u64);
        let base = [
            ((x * 37 + z * 13) % 255) as u8,
            ((y * 53 + z * 29) % 255) as u8,
            ((x * 17 + y * 19) % 255) as u8,
        ];

        let border = (size / 42).max(1);
        let cell = (size / 8).max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for py in 0..size {
            for px in 0..size {
                let mut rgb = base;
                if px % cell == 0 || py % cell == 0 {
                    rgb = blend(rgb, [255, 255, 255], 0.2);
                }
                let edge_distance = px.min(py).min(size - 1 - px).min(size - 1 - py);
                if edge_distance < border {
                    rgb = blend(rgb, [0, 0, 0], 0.35);
                }
                pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }

        RawTile {
            width: size,
            height: size,
            pixels,
        }
    }
}

fn blend(under: [u8; 3], over: [u8; 3], alpha: f32) -> [u8; 3] {
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - alpha) + b as f32 * alpha).round() as u8;
    [mix(under[0], over[0]), mix(under[1], over[1]), mix(under[2], over[2])]
}

impl TileSource for SyntheticTileSource {
    fn fetch(&self, address: TileAddress) -> FetchFuture {
        let delay = self.delay_for(&address);
        let size = self.tile_size;
        async move {
            tokio::time::sleep(delay).await;
            Ok(Self::render(&address, size))
        }
        .boxed()
    }
}

/// Raster tiles from a `{z}/{x}/{y}` URL template, e.g. OpenStreetMap.
///
/// World copies request the wrapped column, so every copy shares the same
/// remote image.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpTileSource {
    pub fn new(url_template: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        if !url_template.contains("{z}") || !url_template.contains("{x}") || !url_template.contains("{y}") {
            return Err(MapError::Config(format!(
                "URL template '{}' must contain {{z}}, {{x}} and {{y}}",
                url_template
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| MapError::Other(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }

    pub fn tile_url(&self, address: &TileAddress) -> String {
        self.url_template
            .replace("{z}", &address.zoom.to_string())
            .replace("{x}", &address.x.to_string())
            .replace("{y}", &address.y.to_string())
    }

    async fn download(client: reqwest::Client, url: String) -> Result<RawTile> {
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MapError::Fetch(format!("HTTP {} for {}", response.status(), url)));
        }
        let bytes = response.bytes().await?;

        tokio::task::spawn_blocking(move || -> Result<RawTile> {
            let image = image::load_from_memory(&bytes)?.to_rgba8();
            Ok(RawTile {
                width: image.width(),
                height: image.height(),
                pixels: image.into_raw(),
            })
        })
        .await
        .map_err(|e| MapError::Other(format!("Tile decode task failed: {}", e)))?
    }
}

impl TileSource for HttpTileSource {
    fn fetch(&self, address: TileAddress) -> FetchFuture {
        let url = self.tile_url(&address);
        Self::download(self.client.clone(), url).boxed()
    }
}
