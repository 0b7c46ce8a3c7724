#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement protocol, inventory and per-frame updates for stickers.
//!
//! Every sticker variant answers the same three capabilities through
//! [`Placeable`]: previewing itself over a tile while held, writing itself
//! into the grid, and ticking once placed. Held stickers live in an
//! [`Inventory`]; a sticker only moves into the world's entity arena once
//! its placement succeeds.

use std::time::Duration;

use tilestrike_core::{EntityId, Event, FrameInput, TilePos, TileStatus};
use tilestrike_world::{Entities, Entity, GridFrame, MapMatrix, Sticker};
use tracing::{debug, trace};

/// Alpha applied to a held sticker previewed over a tile.
pub const PREVIEW_ALPHA: f32 = 0.5;

/// Capabilities shared by every placeable item.
pub trait Placeable {
    /// Previews the held item over `tile`, rotating it on input when allowed.
    fn hovering(&mut self, tile: TilePos, input: &FrameInput, frame: &GridFrame);

    /// Attempts to write the item into the grid as entity `id`.
    ///
    /// Returns `true` when the grid accepted the item. A rejected placement
    /// leaves both the grid and the item unchanged.
    fn place(
        &mut self,
        id: EntityId,
        tile: TilePos,
        map: &mut MapMatrix,
        out: &mut Vec<Event>,
    ) -> bool;

    /// Advances the placed item by `dt`.
    fn update(&mut self, id: EntityId, dt: Duration, map: &mut MapMatrix, out: &mut Vec<Event>);
}

impl Placeable for Sticker {
    fn hovering(&mut self, tile: TilePos, input: &FrameInput, frame: &GridFrame) {
        if self.can_rotate() {
            if input.rotate_left {
                self.rotate(false);
            }
            if input.rotate_right {
                self.rotate(true);
            }
        }

        let visual = self.visual_mut();
        visual.position = frame.tile_to_world(tile);
        visual.force_render = true;
        visual.color = visual.color.with_alpha(PREVIEW_ALPHA);
    }

    fn place(
        &mut self,
        id: EntityId,
        tile: TilePos,
        map: &mut MapMatrix,
        out: &mut Vec<Event>,
    ) -> bool {
        simple_place(self, id, tile, map, out)
    }

    fn update(&mut self, id: EntityId, dt: Duration, map: &mut MapMatrix, out: &mut Vec<Event>) {
        if !self.placement_active() {
            return;
        }
        let Some(tile) = self.tile() else {
            return;
        };
        let Some(block) = self.block_mut() else {
            return;
        };
        if !block.tick(dt) {
            return;
        }

        if map.get_tile(tile).status() != TileStatus::Empty {
            trace!(sticker = ?id, ?tile, "regeneration blocked by occupied tile");
            return;
        }

        self.restore();
        map.set_tile(tile, self.status(), Some(id));
        debug!(sticker = ?id, ?tile, "sand block regenerated");
        out.push(Event::StickerRegenerated { sticker: id, tile });
    }
}

/// Default placement: succeeds only on a tile whose status is exactly empty.
///
/// On success the sticker is written into the tile with its variant's
/// status tag, snapped to the tile centre, made fully opaque and marked as
/// placed.
pub fn simple_place(
    sticker: &mut Sticker,
    id: EntityId,
    tile: TilePos,
    map: &mut MapMatrix,
    out: &mut Vec<Event>,
) -> bool {
    let occupied = map.get_tile(tile).status();
    if occupied != TileStatus::Empty {
        debug!(?tile, ?occupied, "sticker placement rejected");
        return false;
    }

    let status = sticker.status();
    map.set_tile(tile, status, Some(id));
    sticker.visual_mut().position = map.frame().tile_to_world(tile);
    sticker.mark_placed(tile);
    debug!(sticker = ?id, ?tile, ?status, "sticker placed");
    out.push(Event::StickerPlaced {
        sticker: id,
        tile,
        status,
    });
    true
}

/// Ordered collection of held stickers with a selection cursor.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    items: Vec<Sticker>,
    selected: usize,
}

impl Inventory {
    /// Creates an inventory holding the provided stickers, selecting the first.
    #[must_use]
    pub fn new(items: Vec<Sticker>) -> Self {
        Self { items, selected: 0 }
    }

    /// Number of held stickers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether no sticker is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the selected sticker.
    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    /// Currently selected sticker, if any is held.
    #[must_use]
    pub fn selected(&self) -> Option<&Sticker> {
        self.items.get(self.selected)
    }

    /// Held stickers in inventory order.
    pub fn iter(&self) -> impl Iterator<Item = &Sticker> {
        self.items.iter()
    }

    /// Selects the next sticker, wrapping around, and hides the old preview.
    pub fn cycle(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if let Some(previous) = self.items.get_mut(self.selected) {
            previous.visual_mut().force_render = false;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    /// Previews the selected sticker over `tile`.
    pub fn hover_selected(&mut self, tile: TilePos, input: &FrameInput, frame: &GridFrame) {
        if let Some(sticker) = self.items.get_mut(self.selected) {
            sticker.hovering(tile, input, frame);
        }
    }

    /// Places the selected sticker on `tile`.
    ///
    /// On success the sticker leaves the inventory for the entity arena and
    /// its new handle is returned. On failure nothing changes.
    pub fn place_selected(
        &mut self,
        tile: TilePos,
        map: &mut MapMatrix,
        entities: &mut Entities,
        out: &mut Vec<Event>,
    ) -> Option<EntityId> {
        let sticker = self.items.get_mut(self.selected)?;
        let id = entities.vacant_id();
        if !sticker.place(id, tile, map, out) {
            return None;
        }

        let placed = self.items.remove(self.selected);
        if self.selected >= self.items.len() {
            self.selected = 0;
        }
        Some(entities.spawn(Entity::Sticker(placed)))
    }
}

/// Advances every placed sticker in the arena by `dt`.
pub fn update_stickers(
    dt: Duration,
    map: &mut MapMatrix,
    entities: &mut Entities,
    out: &mut Vec<Event>,
) {
    for (id, entity) in entities.iter_mut() {
        if let Some(sticker) = entity.as_sticker_mut() {
            sticker.update(id, dt, map, out);
        }
    }
}
