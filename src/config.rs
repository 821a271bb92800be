// src/config.rs
//! Viewer configuration persisted as JSON in the user's config directory

use crate::error::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const OSM_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Largest tile edge accepted, in pixels
pub const MAX_TILE_SIZE: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub tile_size: u32,
    pub max_parallel: usize,
    pub max_cache: usize,
    pub render_world_copies: bool,
    pub center_lng: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub source_type: String,  // "synthetic", "http"
    pub url_template: Option<String>,
    pub user_agent: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub synthetic_min_delay_ms: Option<u64>,
    pub synthetic_max_delay_ms: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            max_parallel: 8,
            max_cache: 120,
            render_world_copies: true,
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 2.0,
            bearing: 0.0,
            viewport_width: 1024,
            viewport_height: 768,
            source_type: "synthetic".to_string(),
            url_template: Some(OSM_URL_TEMPLATE.to_string()),
            user_agent: Some("MapViewport/0.1 (Rust tile viewer)".to_string()),
            http_timeout_secs: Some(10),
            synthetic_min_delay_ms: Some(80),
            synthetic_max_delay_ms: Some(300),
        }
    }
}

impl ViewerConfig {
    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| MapError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MapError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| MapError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| MapError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("map-viewport").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(MapError::Config(format!(
                "tile_size must be between 1 and {}",
                MAX_TILE_SIZE
            )));
        }
        if self.max_parallel == 0 {
            return Err(MapError::Config("max_parallel must be at least 1".to_string()));
        }
        match self.source_type.as_str() {
            "synthetic" | "http" => Ok(()),
            other => Err(MapError::Config(format!("Unknown source type '{}'", other))),
        }
    }

    /// Switch to an HTTP raster source
    pub fn update_http(&mut self, url_template: String, user_agent: Option<String>) {
        self.source_type = "http".to_string();
        self.url_template = Some(url_template);
        if user_agent.is_some() {
            self.user_agent = user_agent;
        }
    }

    /// Switch to generated tiles with the given latency range
    pub fn update_synthetic(&mut self, min_delay_ms: u64, max_delay_ms: u64) {
        self.source_type = "synthetic".to_string();
        self.synthetic_min_delay_ms = Some(min_delay_ms);
        self.synthetic_max_delay_ms = Some(max_delay_ms.max(min_delay_ms));
    }

    pub fn synthetic_delays(&self) -> (Duration, Duration) {
        let min = self.synthetic_min_delay_ms.unwrap_or(80);
        let max = self.synthetic_max_delay_ms.unwrap_or(300).max(min);
        (Duration::from_millis(min), Duration::from_millis(max))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(10))
    }
}
