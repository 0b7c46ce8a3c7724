#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tilestrike adapters.
//!
//! Backends never look at the grid or the entity arena directly. Each frame
//! the caller captures a [`Scene`] holding world-space tile quads and sprite
//! instances, and the backend draws it however it likes.

mod sprites;

use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use tilestrike_core::{Color, EntityId, SpriteHandle, TilePos, TileStatus};
use tilestrike_world::{Entities, MapMatrix, Visual, TILE_SIZE};

pub use sprites::{SpriteManifest, SUPPORTED_MANIFEST_VERSION};

/// Flat color used for tiles of the provided status.
#[must_use]
pub const fn status_color(status: TileStatus) -> Color {
    match status {
        TileStatus::Empty => Color::new(0.12, 0.12, 0.14, 1.0),
        TileStatus::Destructible => Color::from_rgb_u8(0x8d, 0x6e, 0x63),
        TileStatus::Sticker => Color::from_rgb_u8(0xce, 0x93, 0xd8),
        TileStatus::Bumper => Color::from_rgb_u8(0x4f, 0xc3, 0xf7),
        TileStatus::SandBlock => Color::from_rgb_u8(0xff, 0xe0, 0x82),
        TileStatus::Enemy => Color::from_rgb_u8(0xe5, 0x39, 0x35),
        TileStatus::Player => Color::from_rgb_u8(0x66, 0xbb, 0x6a),
        TileStatus::Wall => Color::from_rgb_u8(0x45, 0x5a, 0x64),
    }
}

/// Square covering one tile of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileQuad {
    /// Tile the quad covers.
    pub tile: TilePos,
    /// World-space centre of the quad.
    pub center: Vec2,
    /// Status recorded for the tile.
    pub status: TileStatus,
    /// Entity the tile points at, if any.
    pub occupant: Option<EntityId>,
    /// Fill color.
    pub color: Color,
}

/// Textured quad placed in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    /// Sprite to draw.
    pub sprite: SpriteHandle,
    /// World-space centre of the quad.
    pub position: Vec2,
    /// Rotation around the centre in radians.
    pub rotation: f32,
    /// World-space size of the quad.
    pub size: Vec2,
    /// Draws the sprite mirrored horizontally when `false`.
    pub facing_right: bool,
    /// Tint multiplied into the sprite.
    pub tint: Color,
    /// Whether the instance is a placement preview rather than a live object.
    pub preview: bool,
}

impl SpriteInstance {
    /// Builds the instance drawn for a visual.
    #[must_use]
    pub fn from_visual(visual: &Visual) -> Self {
        Self {
            sprite: visual.sprite,
            position: visual.position,
            rotation: visual.rotation,
            size: visual.scale * TILE_SIZE,
            facing_right: visual.facing_right,
            tint: visual.color,
            preview: !visual.visible && visual.force_render,
        }
    }
}

/// Everything a backend needs to present one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// World-space centre of tile `(0, 0)`.
    pub origin: Vec2,
    /// Every tile of the grid in row-major order starting at the bottom row.
    pub tiles: Vec<TileQuad>,
    /// Drawn visuals in arena order, previews last.
    pub sprites: Vec<SpriteInstance>,
    /// Non-empty tiles highlighted while the debug view is on.
    pub debug_overlay: Vec<TileQuad>,
}

impl Scene {
    /// Captures the grid and every drawn visual of the arena.
    ///
    /// Hidden visuals are skipped unless they are forced to render, and the
    /// debug overlay is only filled while the grid's debug view is enabled.
    #[must_use]
    pub fn capture(map: &MapMatrix, entities: &Entities) -> Self {
        let frame = map.frame();
        let quad = |(tile, record): (TilePos, tilestrike_world::Tile)| TileQuad {
            tile,
            center: frame.tile_to_world(tile),
            status: record.status(),
            occupant: record.occupant(),
            color: status_color(record.status()),
        };

        let tiles = map.tiles().map(quad).collect();
        let debug_overlay = if map.debug_view() {
            map.debug_tiles().map(quad).collect()
        } else {
            Vec::new()
        };
        let sprites = entities
            .iter()
            .filter_map(|(_, entity)| entity.visual())
            .filter(|visual| visual.is_drawn())
            .map(SpriteInstance::from_visual)
            .collect();

        Self {
            columns: map.width(),
            rows: map.height(),
            origin: frame.min(),
            tiles,
            sprites,
            debug_overlay,
        }
    }

    /// Appends a visual that lives outside the arena, such as a held sticker.
    pub fn push_visual(&mut self, visual: &Visual) {
        if visual.is_drawn() {
            self.sprites.push(SpriteInstance::from_visual(visual));
        }
    }

    /// Tile whose centre lies closest to a world-space point.
    #[must_use]
    pub fn tile_at(&self, position: Vec2) -> TilePos {
        let local = ((position - self.origin) / TILE_SIZE).round();
        TilePos::new(local.x as i32, local.y as i32)
    }

    /// Tile quad recorded for the provided tile.
    #[must_use]
    pub fn tile(&self, tile: TilePos) -> Option<&TileQuad> {
        let column = usize::try_from(tile.x()).ok()?;
        let row = usize::try_from(tile.y()).ok()?;
        let columns = usize::try_from(self.columns).ok()?;
        if column >= columns {
            return None;
        }
        self.tiles.get(row * columns + column)
    }
}

/// Description of the presentation surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title displayed by windowed backends, or as a header by text backends.
    pub title: String,
    /// Background color.
    pub clear_color: Color,
    /// Scene shown before the first update.
    pub scene: Scene,
}

impl Presentation {
    /// Creates a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Tilestrike scenes.
pub trait RenderingBackend {
    /// Runs the backend until `update_scene` asks it to stop.
    ///
    /// Each frame the backend hands the simulated frame delta to
    /// `update_scene`, which refreshes the scene and returns `false` once no
    /// further frames should be drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene) -> AnyResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestrike_world::{Entity, GridFrame};

    #[test]
    fn capture_positions_tiles_in_world_space() {
        let mut map = MapMatrix::new(2, 2, GridFrame::new(-1.0, -1.0));
        map.set_tile(TilePos::new(1, 1), TileStatus::Wall, None);
        let scene = Scene::capture(&map, &Entities::new());

        assert_eq!(scene.tiles.len(), 4);
        let wall = scene.tile(TilePos::new(1, 1)).expect("tile inside grid");
        assert_eq!(wall.status, TileStatus::Wall);
        assert_eq!(wall.center, Vec2::new(1.0, 1.0));
        assert!(scene.tile(TilePos::new(2, 0)).is_none());
        assert_eq!(scene.tile_at(Vec2::new(0.8, -1.2)), TilePos::new(1, 0));
        assert!(scene.debug_overlay.is_empty(), "overlay waits for the debug view");
    }

    #[test]
    fn hidden_visuals_are_skipped_unless_forced() {
        let map = MapMatrix::new(1, 1, GridFrame::default());
        let mut entities = Entities::new();
        let mut hidden = Visual::new(SpriteHandle::new(1), Vec2::ZERO);
        hidden.visible = false;
        let mut forced = hidden.clone();
        forced.force_render = true;
        let _ = entities.spawn(Entity::Visual(Visual::new(SpriteHandle::new(0), Vec2::ZERO)));
        let _ = entities.spawn(Entity::Visual(hidden));
        let _ = entities.spawn(Entity::Visual(forced));

        let scene = Scene::capture(&map, &entities);

        assert_eq!(scene.sprites.len(), 2);
        assert!(!scene.sprites[0].preview);
        assert!(scene.sprites[1].preview);
        assert_eq!(scene.sprites[0].size, Vec2::splat(TILE_SIZE));
    }
}
