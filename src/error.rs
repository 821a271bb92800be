// src/error.rs
//! Error types for the map viewport

use std::fmt;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug)]
pub enum MapError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Image(image::ImageError),
    /// The tile data source rejected or failed a request
    Fetch(String),
    Config(String),
    Other(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "IO error: {}", e),
            MapError::Json(e) => write!(f, "JSON error: {}", e),
            MapError::Http(e) => write!(f, "HTTP error: {}", e),
            MapError::Image(e) => write!(f, "Image decode error: {}", e),
            MapError::Fetch(msg) => write!(f, "Tile fetch failed: {}", msg),
            MapError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MapError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io(e) => Some(e),
            MapError::Json(e) => Some(e),
            MapError::Http(e) => Some(e),
            MapError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(error: std::io::Error) -> Self {
        MapError::Io(error)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(error: serde_json::Error) -> Self {
        MapError::Json(error)
    }
}

impl From<reqwest::Error> for MapError {
    fn from(error: reqwest::Error) -> Self {
        MapError::Http(error)
    }
}

impl From<image::ImageError> for MapError {
    fn from(error: image::ImageError) -> Self {
        MapError::Image(error)
    }
}

impl From<anyhow::Error> for MapError {
    fn from(error: anyhow::Error) -> Self {
        MapError::Other(error.to_string())
    }
}
