// src/geo/transform.rs
//! Pan/zoom/bearing transform between screen pixels and the projection plane

use super::mercator::{
    clamp, lat_from_mercator_y, lng_from_mercator_x, mercator_x_from_lng, mercator_y_from_lat,
    wrap, MAX_MERCATOR_LATITUDE,
};
use glam::{DMat4, DVec2, DVec3};

pub const MAX_ZOOM: f64 = 22.0;

/// Zoom levels per unit of raw wheel delta
pub const WHEEL_ZOOM_RATE: f64 = 0.0015;

/// Viewport state: size, center on the projection plane, zoom and bearing.
///
/// `center.y` is kept inside `[0, 1]` after every mutation. `center.x` is only
/// wrapped into `[0, 1)` when world copies are disabled; otherwise it may drift
/// into neighbouring copies of the world.
#[derive(Debug, Clone)]
pub struct Transform {
    width: f64,
    height: f64,
    tile_size: f64,
    zoom: f64,
    bearing: f64,
    bearing_rad: f64,
    center: DVec2,
    render_world_copies: bool,
}

impl Transform {
    pub fn new(width: f64, height: f64, tile_size: f64) -> Self {
        let mut transform = Self {
            width: 1.0,
            height: 1.0,
            tile_size: tile_size.max(1.0),
            zoom: 0.0,
            bearing: 0.0,
            bearing_rad: 0.0,
            center: DVec2::new(0.5, 0.5),
            render_world_copies: true,
        };
        transform.set_size(width, height);
        transform
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Bearing in degrees
    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn bearing_radians(&self) -> f64 {
        self.bearing_rad
    }

    /// Unwrapped center on the projection plane
    pub fn center_projected(&self) -> DVec2 {
        self.center
    }

    pub fn render_world_copies(&self) -> bool {
        self.render_world_copies
    }

    pub fn set_render_world_copies(&mut self, enabled: bool) {
        self.render_world_copies = enabled;
        self.normalize_center();
    }

    /// Pixel size of the whole projection plane at the current zoom
    pub fn world_size(&self) -> f64 {
        self.tile_size * 2_f64.powf(self.zoom)
    }

    /// Viewport dimensions below one pixel are raised to one.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    pub fn set_center(&mut self, lng: f64, lat: f64) {
        let lat = clamp(lat, -MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        self.center = DVec2::new(mercator_x_from_lng(lng), mercator_y_from_lat(lat));
        self.normalize_center();
    }

    /// Center as `(lng, lat)` with longitude wrapped into `[-180, 180)`.
    pub fn get_center(&self) -> (f64, f64) {
        let lng = lng_from_mercator_x(wrap(self.center.x, 0.0, 1.0));
        let lat = lat_from_mercator_y(self.center.y);
        (lng, lat)
    }

    pub fn set_center_projected(&mut self, center: DVec2) {
        self.center = center;
        self.normalize_center();
    }

    pub fn set_bearing(&mut self, degrees: f64) {
        self.bearing = degrees;
        self.bearing_rad = degrees.to_radians();
    }

    /// Set the zoom level, clamped to `[0, MAX_ZOOM]`.
    ///
    /// With an anchor, the projection-plane point under that screen pixel is
    /// the same before and after the change.
    pub fn set_zoom(&mut self, zoom: f64, anchor: Option<DVec2>) {
        let next_zoom = clamp(zoom, 0.0, MAX_ZOOM);
        let Some(anchor) = anchor else {
            self.zoom = next_zoom;
            return;
        };

        let before = self.screen_to_mercator(anchor.x, anchor.y);
        self.zoom = next_zoom;

        let world_size = self.world_size();
        let offset = self.unrotate(anchor - self.half_size());
        let center_world = before * world_size - offset;
        self.center = center_world / world_size;
        self.normalize_center();
    }

    /// Move the map by a screen-space drag delta.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        let delta = self.unrotate(DVec2::new(dx, dy)) / self.world_size();
        self.center -= delta;
        self.normalize_center();
    }

    /// Apply a raw wheel delta around `anchor`. Positive deltas zoom out.
    pub fn zoom_by_delta(&mut self, wheel_delta: f64, anchor: DVec2) {
        let zoom_delta = -wheel_delta * WHEEL_ZOOM_RATE;
        self.set_zoom(self.zoom + zoom_delta, Some(anchor));
    }

    pub fn mercator_to_screen(&self, x: f64, y: f64) -> DVec2 {
        let world_size = self.world_size();
        let relative = (DVec2::new(x, y) - self.center) * world_size;
        self.rotate(relative) + self.half_size()
    }

    /// Inverse of [`Transform::mercator_to_screen`]. The result's x is not
    /// wrapped, so it can land in a neighbouring world copy.
    pub fn screen_to_mercator(&self, screen_x: f64, screen_y: f64) -> DVec2 {
        let world_size = self.world_size();
        let offset = self.unrotate(DVec2::new(screen_x, screen_y) - self.half_size());
        self.center + offset / world_size
    }

    /// Projection-plane to clip-space matrix: `P * R * S * T`.
    pub fn projection_matrix(&self) -> DMat4 {
        let world_size = self.world_size();
        let translate = DMat4::from_translation(DVec3::new(-self.center.x, -self.center.y, 0.0));
        let scale = DMat4::from_scale(DVec3::new(world_size, world_size, 1.0));
        let rotate = DMat4::from_rotation_z(self.bearing_rad);
        let project = DMat4::from_scale(DVec3::new(2.0 / self.width, -2.0 / self.height, 1.0));
        project * rotate * scale * translate
    }

    /// Column-major single-precision matrix for uploading as a uniform
    pub fn projection_matrix_f32(&self) -> [f32; 16] {
        self.projection_matrix().as_mat4().to_cols_array()
    }

    /// Integer zoom level used to pick tiles
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.floor().max(0.0) as u8
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    fn rotate(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(self.bearing_rad).rotate(v)
    }

    fn unrotate(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(-self.bearing_rad).rotate(v)
    }

    fn normalize_center(&mut self) {
        self.center.y = clamp(self.center.y, 0.0, 1.0);
        if !self.render_world_copies {
            self.center.x = wrap(self.center.x, 0.0, 1.0);
        }
    }
}
