// src/geo/mercator.rs
//! Web Mercator forward/inverse formulas on the normalized `[0,1]²` plane

use std::f64::consts::PI;

/// Latitude at which the projection plane reaches y = 0 / y = 1
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051129;

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Wrap `value` into the half-open range `[min, max)`.
pub fn wrap(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    let wrapped = (value - min).rem_euclid(range) + min;
    // rem_euclid can round up to exactly `range` for tiny negative inputs
    if wrapped >= max {
        min
    } else {
        wrapped
    }
}

pub fn mercator_x_from_lng(lng: f64) -> f64 {
    (180.0 + lng) / 360.0
}

/// Latitude is clamped to ±[`MAX_MERCATOR_LATITUDE`] first.
pub fn mercator_y_from_lat(lat: f64) -> f64 {
    let lat = clamp(lat, -MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    (180.0 - (180.0 / PI) * (PI / 4.0 + lat * PI / 360.0).tan().ln()) / 360.0
}

pub fn lng_from_mercator_x(x: f64) -> f64 {
    x * 360.0 - 180.0
}

pub fn lat_from_mercator_y(y: f64) -> f64 {
    let y2 = 180.0 - y * 360.0;
    (360.0 / PI) * (y2 * PI / 180.0).exp().atan() - 90.0
}

/// Calculate tile coordinates from lng/lat and zoom level
pub fn lng_lat_to_tile(lng: f64, lat: f64, zoom: u8) -> (u32, u32) {
    let n = 2_f64.powi(zoom as i32);
    let max_index = n - 1.0;
    let x = (wrap(mercator_x_from_lng(lng), 0.0, 1.0) * n).floor();
    let y = (mercator_y_from_lat(lat) * n).floor();
    (clamp(x, 0.0, max_index) as u32, clamp(y, 0.0, max_index) as u32)
}

/// Calculate the lng/lat of a tile's north-west corner
pub fn tile_to_lng_lat(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2_f64.powi(zoom as i32);
    let lng = lng_from_mercator_x(x as f64 / n);
    let lat = lat_from_mercator_y(y as f64 / n);
    (lng, lat)
}
