// src/map/visible.rs
//! Visible tile set for a viewport

use super::address::TileAddress;
use crate::geo::Transform;

/// Every tile at `zoom` that intersects the viewport's bounding box.
///
/// The four viewport corners are un-projected, so a rotated viewport yields
/// the tiles covering its axis-aligned bounds. Columns past either side of the
/// world come back as world copies; rows outside the plane are dropped.
/// Results are ordered row by row, west to east.
pub fn visible_tiles(transform: &Transform, zoom: u8) -> Vec<TileAddress> {
    let tiles_per_axis = 1_i64 << zoom;
    let n = tiles_per_axis as f64;
    let (width, height) = (transform.width(), transform.height());

    let corners = [
        transform.screen_to_mercator(0.0, 0.0),
        transform.screen_to_mercator(width, 0.0),
        transform.screen_to_mercator(0.0, height),
        transform.screen_to_mercator(width, height),
    ];

    let mut min = corners[0];
    let mut max = corners[0];
    for corner in &corners[1..] {
        min = min.min(*corner);
        max = max.max(*corner);
    }

    // x is left unclamped so neighbouring world copies stay visible
    let min_y = min.y.max(0.0);
    let max_y = max.y.min(1.0);

    // both edges floor, so a tile touching the far border is included; the
    // row past the bottom of the plane is dropped below
    let min_tile_x = (min.x * n).floor() as i64;
    let max_tile_x = (max.x * n).floor() as i64;
    let min_tile_y = (min_y * n).floor() as i64;
    let max_tile_y = (max_y * n).floor() as i64;

    let mut tiles = Vec::new();
    for tile_y in min_tile_y..=max_tile_y {
        if tile_y < 0 || tile_y >= tiles_per_axis {
            continue;
        }
        for tile_x in min_tile_x..=max_tile_x {
            let wrap = tile_x.div_euclid(tiles_per_axis);
            let x = tile_x.rem_euclid(tiles_per_axis);
            tiles.push(TileAddress::new(zoom, wrap as i32, x as u32, tile_y as u32));
        }
    }
    tiles
}
