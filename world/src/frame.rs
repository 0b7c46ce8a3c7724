use glam::Vec2;
use tilestrike_core::TilePos;

/// Side length of a tile measured in world units, identical on both axes.
pub const TILE_SIZE: f32 = 2.0;

/// Maps tile indices onto world space.
///
/// Tile `(0, 0)` is centred on the configured minimum corner and every
/// further tile sits [`TILE_SIZE`] units away along its axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridFrame {
    min: Vec2,
}

impl GridFrame {
    /// Creates a frame anchored at the provided world-space minimums.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
        }
    }

    /// World-space position of tile `(0, 0)`.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// World-space centre of the provided tile.
    #[must_use]
    pub fn tile_to_world(&self, tile: TilePos) -> Vec2 {
        self.min + Vec2::new(tile.x() as f32, tile.y() as f32) * TILE_SIZE
    }

    /// Tile whose centre lies closest to the provided world-space point.
    #[must_use]
    pub fn world_to_tile(&self, position: Vec2) -> TilePos {
        let local = (position - self.min) / TILE_SIZE;
        TilePos::new(local.x.round() as i32, local.y.round() as i32)
    }
}

impl Default for GridFrame {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_are_two_units_apart() {
        let frame = GridFrame::new(-10.0, -6.0);
        assert_eq!(frame.tile_to_world(TilePos::new(0, 0)), Vec2::new(-10.0, -6.0));
        assert_eq!(frame.tile_to_world(TilePos::new(3, 1)), Vec2::new(-4.0, -4.0));
    }

    #[test]
    fn world_to_tile_snaps_to_nearest_centre() {
        let frame = GridFrame::new(-10.0, -6.0);
        assert_eq!(frame.world_to_tile(Vec2::new(-4.3, -3.2)), TilePos::new(3, 1));
        assert_eq!(frame.world_to_tile(Vec2::new(-12.0, -6.0)), TilePos::new(-1, 0));
    }

    #[test]
    fn conversions_agree_in_both_directions() {
        let frame = GridFrame::new(1.5, -0.5);
        let tile = TilePos::new(7, 4);
        assert_eq!(frame.world_to_tile(frame.tile_to_world(tile)), tile);
    }
}
