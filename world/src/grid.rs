use tilestrike_core::{EntityId, Event, FrameInput, TilePos, TileStatus};
use tracing::debug;

use crate::{Entities, GridFrame};

/// Occupancy record of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    status: TileStatus,
    occupant: Option<EntityId>,
}

impl Tile {
    /// Empty tile without an occupant.
    pub const EMPTY: Self = Self {
        status: TileStatus::Empty,
        occupant: None,
    };

    /// Synthetic wall reported for coordinates outside the grid.
    pub const WALL: Self = Self {
        status: TileStatus::Wall,
        occupant: None,
    };

    /// Creates a tile record. Empty tiles never keep an occupant.
    #[must_use]
    pub const fn new(status: TileStatus, occupant: Option<EntityId>) -> Self {
        let occupant = match status {
            TileStatus::Empty => None,
            _ => occupant,
        };
        Self { status, occupant }
    }

    /// Occupancy status of the tile.
    #[must_use]
    pub const fn status(&self) -> TileStatus {
        self.status
    }

    /// Entity currently standing on the tile, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<EntityId> {
        self.occupant
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Width by height grid of [`Tile`] records describing a whole level.
///
/// Every coordinate access is bounds-checked. Reads outside the grid report
/// [`Tile::WALL`] so callers treat the map edge as impassable, and writes
/// outside the grid are dropped without signalling anything.
#[derive(Clone, Debug)]
pub struct MapMatrix {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    player_position: TilePos,
    player: Option<EntityId>,
    frame: GridFrame,
    debug_view: bool,
}

impl MapMatrix {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32, frame: GridFrame) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::EMPTY; tile_capacity(width, height)],
            player_position: TilePos::new(0, 0),
            player: None,
            frame,
            debug_view: false,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile to world space mapping used for every positioned renderable.
    #[must_use]
    pub const fn frame(&self) -> &GridFrame {
        &self.frame
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub fn contains(&self, tile: TilePos) -> bool {
        self.index(tile).is_some()
    }

    /// Writes a tile record. Coordinates outside the grid are ignored.
    pub fn set_tile(&mut self, tile: TilePos, status: TileStatus, occupant: Option<EntityId>) {
        if let Some(index) = self.index(tile) {
            self.tiles[index] = Tile::new(status, occupant);
        }
    }

    /// Reads a tile record, reporting a wall for coordinates outside the grid.
    #[must_use]
    pub fn get_tile(&self, tile: TilePos) -> Tile {
        self.index(tile)
            .map_or(Tile::WALL, |index| self.tiles[index])
    }

    /// Moves `occupant` from one tile to another under the rank rule.
    ///
    /// Succeeds only when both coordinates lie inside the grid and the
    /// destination's current status ranks strictly below `status`. On
    /// success the source becomes empty and the destination holds
    /// `status`/`occupant`; on failure neither tile changes.
    pub fn move_tile(
        &mut self,
        from: TilePos,
        to: TilePos,
        status: TileStatus,
        occupant: Option<EntityId>,
    ) -> bool {
        let (Some(source), Some(destination)) = (self.index(from), self.index(to)) else {
            return false;
        };
        if !status.outranks(self.tiles[destination].status) {
            return false;
        }

        self.tiles[source] = Tile::EMPTY;
        self.tiles[destination] = Tile::new(status, occupant);
        true
    }

    /// Resets a tile to empty and marks its occupant for deferred destruction.
    ///
    /// Returns the occupant that was marked, if any.
    pub fn clear_tile(&mut self, tile: TilePos, entities: &mut Entities) -> Option<EntityId> {
        let index = self.index(tile)?;
        let occupant = self.tiles[index].occupant;
        if let Some(id) = occupant {
            let _ = entities.mark_for_destruction(id);
        }
        self.tiles[index] = Tile::EMPTY;
        occupant
    }

    /// Updates the remembered player position.
    ///
    /// Validates that the coordinate lies inside the grid and that its
    /// current status ranks below [`TileStatus::Player`]. Only the
    /// remembered position and player handle change; tile contents are left
    /// to [`MapMatrix::move_tile`].
    pub fn set_player_position(&mut self, tile: TilePos, player: EntityId) -> bool {
        if !self.contains(tile) || !TileStatus::Player.outranks(self.get_tile(tile).status) {
            return false;
        }

        self.player_position = tile;
        self.player = Some(player);
        true
    }

    /// Last position accepted by [`MapMatrix::set_player_position`] or the map loader.
    #[must_use]
    pub const fn player_position(&self) -> TilePos {
        self.player_position
    }

    /// Player handle recorded by the last accepted position update.
    #[must_use]
    pub const fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Classifies whether a status belongs to the sticker family.
    #[must_use]
    pub const fn is_sticker_status(status: TileStatus) -> bool {
        status.is_sticker()
    }

    /// Samples the frame input for grid-level toggles.
    pub fn update(&mut self, input: &FrameInput, out: &mut Vec<Event>) {
        if input.debug_toggle {
            self.debug_view = !self.debug_view;
            debug!(enabled = self.debug_view, "grid debug view toggled");
            out.push(Event::DebugViewToggled {
                enabled: self.debug_view,
            });
        }
    }

    /// Whether the debug overlay should be drawn.
    #[must_use]
    pub const fn debug_view(&self) -> bool {
        self.debug_view
    }

    /// Iterates over every tile in row-major order starting at the bottom row.
    pub fn tiles(&self) -> impl Iterator<Item = (TilePos, Tile)> + '_ {
        let width = self.width.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let x = (index as u64 % u64::from(width)) as i32;
            let y = (index as u64 / u64::from(width)) as i32;
            (TilePos::new(x, y), *tile)
        })
    }

    /// Iterates over every non-empty tile for the debug overlay.
    pub fn debug_tiles(&self) -> impl Iterator<Item = (TilePos, Tile)> + '_ {
        self.tiles()
            .filter(|(_, tile)| tile.status != TileStatus::Empty)
    }

    pub(crate) fn replace(
        &mut self,
        width: u32,
        height: u32,
        tiles: Vec<Tile>,
        player_position: TilePos,
    ) {
        self.width = width;
        self.height = height;
        self.tiles = tiles;
        self.player_position = player_position;
        self.player = None;
    }

    fn index(&self, tile: TilePos) -> Option<usize> {
        let column = u32::try_from(tile.x()).ok()?;
        let row = u32::try_from(tile.y()).ok()?;
        if column < self.width && row < self.height {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

pub(crate) fn tile_capacity(width: u32, height: u32) -> usize {
    let capacity = u64::from(width) * u64::from(height);
    usize::try_from(capacity).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Destructible, Entity};

    fn grid() -> MapMatrix {
        MapMatrix::new(4, 3, GridFrame::default())
    }

    #[test]
    fn out_of_range_reads_report_wall() {
        let map = grid();
        for tile in [
            TilePos::new(-1, 0),
            TilePos::new(0, -1),
            TilePos::new(4, 0),
            TilePos::new(0, 3),
            TilePos::new(i32::MAX, i32::MIN),
        ] {
            assert_eq!(map.get_tile(tile), Tile::WALL, "{tile:?} should read as wall");
        }
    }

    #[test]
    fn out_of_range_writes_are_dropped() {
        let mut map = grid();
        map.set_tile(TilePos::new(4, 1), TileStatus::Enemy, None);
        map.set_tile(TilePos::new(-1, 1), TileStatus::Enemy, None);
        assert!(map.tiles().all(|(_, tile)| tile == Tile::EMPTY));
    }

    #[test]
    fn empty_tiles_drop_occupants() {
        let mut map = grid();
        map.set_tile(TilePos::new(1, 1), TileStatus::Empty, Some(EntityId::new(3, 0)));
        assert_eq!(map.get_tile(TilePos::new(1, 1)).occupant(), None);
    }

    #[test]
    fn move_into_lower_rank_succeeds() {
        let mut map = grid();
        let enemy = EntityId::new(1, 0);
        let from = TilePos::new(0, 0);
        let to = TilePos::new(1, 0);
        map.set_tile(from, TileStatus::Enemy, Some(enemy));
        map.set_tile(to, TileStatus::Destructible, None);

        assert!(map.move_tile(from, to, TileStatus::Enemy, Some(enemy)));
        assert_eq!(map.get_tile(from), Tile::EMPTY);
        assert_eq!(map.get_tile(to), Tile::new(TileStatus::Enemy, Some(enemy)));
    }

    #[test]
    fn move_into_equal_rank_fails_without_mutation() {
        let mut map = grid();
        let from = TilePos::new(0, 0);
        let to = TilePos::new(1, 0);
        let mover = EntityId::new(1, 0);
        let blocker = EntityId::new(2, 0);
        map.set_tile(from, TileStatus::Bumper, Some(mover));
        map.set_tile(to, TileStatus::Sticker, Some(blocker));

        assert!(!map.move_tile(from, to, TileStatus::SandBlock, Some(mover)));
        assert_eq!(map.get_tile(from), Tile::new(TileStatus::Bumper, Some(mover)));
        assert_eq!(map.get_tile(to), Tile::new(TileStatus::Sticker, Some(blocker)));
    }

    #[test]
    fn move_off_grid_fails() {
        let mut map = grid();
        let from = TilePos::new(3, 0);
        map.set_tile(from, TileStatus::Player, None);
        assert!(!map.move_tile(from, TilePos::new(4, 0), TileStatus::Player, None));
        assert_eq!(map.get_tile(from).status(), TileStatus::Player);
    }

    #[test]
    fn clear_tile_marks_occupant() {
        let mut map = grid();
        let mut entities = Entities::new();
        let tile = TilePos::new(2, 2);
        let crate_id = entities.spawn(Entity::Destructible(Destructible::new(tile)));
        map.set_tile(tile, TileStatus::Destructible, Some(crate_id));

        assert_eq!(map.clear_tile(tile, &mut entities), Some(crate_id));
        assert_eq!(map.get_tile(tile), Tile::EMPTY);
        assert!(entities.is_marked(crate_id));
        assert!(entities.get(crate_id).is_some(), "destruction is deferred to the sweep");
    }

    #[test]
    fn set_player_position_leaves_tiles_untouched() {
        let mut map = grid();
        let player = EntityId::new(0, 0);
        let target = TilePos::new(2, 1);

        assert!(map.set_player_position(target, player));
        assert_eq!(map.player_position(), target);
        assert_eq!(map.player(), Some(player));
        assert_eq!(
            map.get_tile(target),
            Tile::EMPTY,
            "remembered position does not write the tile"
        );
    }

    #[test]
    fn set_player_position_respects_rank() {
        let mut map = grid();
        let player = EntityId::new(0, 0);
        map.set_tile(TilePos::new(1, 1), TileStatus::Player, Some(player));
        map.set_tile(TilePos::new(2, 1), TileStatus::Enemy, None);

        assert!(!map.set_player_position(TilePos::new(1, 1), player));
        assert!(!map.set_player_position(TilePos::new(9, 9), player));
        assert!(map.set_player_position(TilePos::new(2, 1), player));
    }

    #[test]
    fn debug_toggle_flips_overlay() {
        let mut map = grid();
        let mut events = Vec::new();
        let pressed = FrameInput {
            debug_toggle: true,
            ..FrameInput::default()
        };

        map.update(&FrameInput::default(), &mut events);
        assert!(!map.debug_view());
        map.update(&pressed, &mut events);
        assert!(map.debug_view());
        map.update(&pressed, &mut events);
        assert!(!map.debug_view());
        assert_eq!(
            events,
            vec![
                Event::DebugViewToggled { enabled: true },
                Event::DebugViewToggled { enabled: false },
            ]
        );
    }

    #[test]
    fn debug_tiles_skip_empty_cells() {
        let mut map = grid();
        map.set_tile(TilePos::new(3, 2), TileStatus::Wall, None);
        let listed: Vec<_> = map.debug_tiles().map(|(tile, _)| tile).collect();
        assert_eq!(listed, vec![TilePos::new(3, 2)]);
    }
}
