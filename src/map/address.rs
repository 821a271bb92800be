// src/map/address.rs
//! Tile addresses and their footprint on the projection plane

use glam::DVec2;
use std::fmt;

/// One tile at `zoom`, in world copy `wrap`.
///
/// World copies of the same `(x, y)` are distinct addresses, so they never
/// share a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    pub zoom: u8,
    pub wrap: i32,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    pub fn new(zoom: u8, wrap: i32, x: u32, y: u32) -> Self {
        Self { zoom, wrap, x, y }
    }

    /// Number of tiles along one axis at this zoom
    pub fn tiles_per_axis(&self) -> u32 {
        1 << self.zoom
    }

    /// North-west corner on the projection plane, offset into its world copy
    pub fn origin(&self) -> DVec2 {
        let n = self.tiles_per_axis() as f64;
        DVec2::new(
            (self.x as f64 + self.wrap as f64 * n) / n,
            self.y as f64 / n,
        )
    }

    /// Edge length on the projection plane
    pub fn edge(&self) -> f64 {
        1.0 / self.tiles_per_axis() as f64
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.zoom, self.wrap, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_and_edge() {
        let tile = TileAddress::new(2, 0, 3, 1);
        assert_eq!(tile.origin(), DVec2::new(0.75, 0.25));
        assert_eq!(tile.edge(), 0.25);
    }

    #[test]
    fn test_world_copy_offsets_origin() {
        let east = TileAddress::new(1, 1, 0, 0);
        let west = TileAddress::new(1, -1, 1, 1);
        assert_eq!(east.origin(), DVec2::new(1.0, 0.0));
        assert_eq!(west.origin(), DVec2::new(-0.5, 0.5));
    }

    #[test]
    fn test_wrap_is_part_of_identity() {
        let primary = TileAddress::new(3, 0, 5, 2);
        let copy = TileAddress::new(3, 1, 5, 2);
        assert_ne!(primary, copy);
        assert_eq!(primary.to_string(), "3/0/5/2");
        assert_eq!(copy.to_string(), "3/1/5/2");
    }
}
