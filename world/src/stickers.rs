use std::{f32::consts::FRAC_PI_4, time::Duration};

use tilestrike_core::{TilePos, TileStatus};

use crate::Visual;

/// Number of 45 degree rotation increments in a full turn.
pub const ROTATION_STEPS: u8 = 8;

/// Regeneration state of a block sticker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockState {
    is_fragile: bool,
    regeneration: Duration,
    regeneration_timer: Duration,
    broken: bool,
}

impl BlockState {
    /// Creates an intact block. Fragile blocks break on contact and
    /// regenerate after `regeneration` elapses.
    #[must_use]
    pub const fn new(is_fragile: bool, regeneration: Duration) -> Self {
        Self {
            is_fragile,
            regeneration,
            regeneration_timer: Duration::ZERO,
            broken: false,
        }
    }

    /// Whether the block breaks on contact.
    #[must_use]
    pub const fn is_fragile(&self) -> bool {
        self.is_fragile
    }

    /// Whether the block is currently broken and waiting to regenerate.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    /// Time left before a broken block tries to regenerate.
    #[must_use]
    pub const fn regeneration_timer(&self) -> Duration {
        self.regeneration_timer
    }

    /// Counts the regeneration timer down, returning `true` once it has elapsed.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.broken {
            return false;
        }
        self.regeneration_timer = self.regeneration_timer.saturating_sub(dt);
        self.regeneration_timer.is_zero()
    }
}

/// Closed set of sticker variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StickerKind {
    /// Decorative sticker with no behaviour of its own.
    Plain,
    /// Rotatable bumper.
    Bumper,
    /// Solid or fragile block.
    Block(BlockState),
}

/// Placeable item that occupies exactly one tile once placed.
#[derive(Clone, Debug, PartialEq)]
pub struct Sticker {
    kind: StickerKind,
    placement_active: bool,
    can_rotate: bool,
    rotation_steps: u8,
    tile: Option<TilePos>,
    visual: Visual,
}

impl Sticker {
    /// Creates a held sticker of the provided kind.
    #[must_use]
    pub fn new(kind: StickerKind, visual: Visual) -> Self {
        let can_rotate = matches!(kind, StickerKind::Bumper);
        let mut visual = visual;
        visual.visible = false;
        Self {
            kind,
            placement_active: false,
            can_rotate,
            rotation_steps: 0,
            tile: None,
            visual,
        }
    }

    /// Variant and variant state of the sticker.
    #[must_use]
    pub const fn kind(&self) -> &StickerKind {
        &self.kind
    }

    /// Status tag written into the tile the sticker occupies.
    #[must_use]
    pub const fn status(&self) -> TileStatus {
        match &self.kind {
            StickerKind::Plain => TileStatus::Sticker,
            StickerKind::Bumper => TileStatus::Bumper,
            StickerKind::Block(block) if block.is_fragile => TileStatus::SandBlock,
            StickerKind::Block(_) => TileStatus::Sticker,
        }
    }

    /// Whether the sticker is placed and live rather than held.
    #[must_use]
    pub const fn placement_active(&self) -> bool {
        self.placement_active
    }

    /// Whether the held sticker may be rotated before placement.
    #[must_use]
    pub const fn can_rotate(&self) -> bool {
        self.can_rotate
    }

    /// Rotation in 45 degree increments, in `0..ROTATION_STEPS`.
    #[must_use]
    pub const fn rotation_steps(&self) -> u8 {
        self.rotation_steps
    }

    /// Tile the sticker was placed on.
    #[must_use]
    pub const fn tile(&self) -> Option<TilePos> {
        self.tile
    }

    /// Renderable quad of the sticker.
    #[must_use]
    pub const fn visual(&self) -> &Visual {
        &self.visual
    }

    /// Mutable renderable quad of the sticker.
    pub fn visual_mut(&mut self) -> &mut Visual {
        &mut self.visual
    }

    /// Mutable block state, if the sticker is a block.
    pub fn block_mut(&mut self) -> Option<&mut BlockState> {
        match &mut self.kind {
            StickerKind::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Rotates by whole 45 degree steps, wrapping around a full turn.
    ///
    /// Does nothing for stickers that cannot rotate.
    pub fn rotate(&mut self, clockwise: bool) {
        if !self.can_rotate {
            return;
        }
        self.rotation_steps = if clockwise {
            (self.rotation_steps + 1) % ROTATION_STEPS
        } else {
            (self.rotation_steps + ROTATION_STEPS - 1) % ROTATION_STEPS
        };
        self.visual.rotation = -f32::from(self.rotation_steps) * FRAC_PI_4;
    }

    /// Records a successful placement on `tile` and shows the sticker fully opaque.
    pub fn mark_placed(&mut self, tile: TilePos) {
        self.placement_active = true;
        self.tile = Some(tile);
        self.visual.color = self.visual.color.with_alpha(1.0);
        self.visual.visible = true;
        self.visual.force_render = false;
    }

    /// Breaks a fragile block and starts its regeneration timer.
    ///
    /// Returns `false` for stickers that are not fragile or already broken.
    pub fn shatter(&mut self) -> bool {
        let StickerKind::Block(block) = &mut self.kind else {
            return false;
        };
        if !block.is_fragile || block.broken {
            return false;
        }

        block.broken = true;
        block.regeneration_timer = block.regeneration;
        self.visual.visible = false;
        true
    }

    /// Restores a broken block.
    pub fn restore(&mut self) {
        if let StickerKind::Block(block) = &mut self.kind {
            block.broken = false;
            block.regeneration_timer = Duration::ZERO;
            self.visual.visible = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use tilestrike_core::SpriteHandle;

    fn visual() -> Visual {
        Visual::new(SpriteHandle::new(0), Vec2::ZERO)
    }

    #[test]
    fn status_tags_follow_the_variant() {
        let regen = Duration::from_secs(2);
        assert_eq!(Sticker::new(StickerKind::Plain, visual()).status(), TileStatus::Sticker);
        assert_eq!(Sticker::new(StickerKind::Bumper, visual()).status(), TileStatus::Bumper);
        assert_eq!(
            Sticker::new(StickerKind::Block(BlockState::new(true, regen)), visual()).status(),
            TileStatus::SandBlock
        );
        assert_eq!(
            Sticker::new(StickerKind::Block(BlockState::new(false, regen)), visual()).status(),
            TileStatus::Sticker
        );
    }

    #[test]
    fn only_bumpers_rotate_and_rotation_wraps() {
        let mut plain = Sticker::new(StickerKind::Plain, visual());
        plain.rotate(true);
        assert_eq!(plain.rotation_steps(), 0);

        let mut bumper = Sticker::new(StickerKind::Bumper, visual());
        bumper.rotate(false);
        assert_eq!(bumper.rotation_steps(), 7);
        bumper.rotate(true);
        bumper.rotate(true);
        assert_eq!(bumper.rotation_steps(), 1);
        assert!((bumper.visual().rotation + FRAC_PI_4).abs() < f32::EPSILON);
    }

    #[test]
    fn solid_blocks_do_not_shatter() {
        let mut block = Sticker::new(
            StickerKind::Block(BlockState::new(false, Duration::from_secs(1))),
            visual(),
        );
        assert!(!block.shatter());
    }

    #[test]
    fn fragile_blocks_count_down_after_shattering() {
        let mut block = Sticker::new(
            StickerKind::Block(BlockState::new(true, Duration::from_secs(1))),
            visual(),
        );
        block.mark_placed(TilePos::new(0, 0));

        assert!(block.shatter());
        assert!(!block.shatter(), "a broken block cannot break again");
        assert!(!block.visual().visible);

        let state = block.block_mut().expect("block state");
        assert!(!state.tick(Duration::from_millis(600)));
        assert!(state.tick(Duration::from_millis(600)));

        block.restore();
        assert!(block.visual().visible);
        assert!(matches!(block.kind(), StickerKind::Block(state) if !state.is_broken()));
    }
}
