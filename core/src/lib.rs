#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilestrike engine.
//!
//! This crate defines the vocabulary that connects the authoritative grid,
//! the frame systems and the adapters. The world crate owns tile and entity
//! state expressed with these types, systems mutate it once per frame and
//! report what happened through [`Event`] values pushed into caller-provided
//! buffers, and adapters read the results to present frames.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Occupancy state recorded for a single tile of the grid.
///
/// Statuses are totally ordered by [`TileStatus::rank`], which decides
/// whether something moving into a tile may displace what is already there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileStatus {
    /// Nothing occupies the tile.
    Empty,
    /// Breakable scenery that actions clear on contact.
    Destructible,
    /// A placed plain sticker.
    Sticker,
    /// A placed bumper sticker.
    Bumper,
    /// A placed fragile block sticker that breaks on contact.
    SandBlock,
    /// An enemy stands on the tile.
    Enemy,
    /// The player stands on the tile.
    Player,
    /// Impassable wall, also reported for every out-of-range coordinate.
    Wall,
}

impl TileStatus {
    /// Occupancy rank used for move and placement comparisons.
    ///
    /// Ordering from lowest to highest: `Empty < Destructible <
    /// sticker family < Enemy < Player < Wall`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Destructible => 1,
            Self::Sticker | Self::Bumper | Self::SandBlock => 2,
            Self::Enemy => 3,
            Self::Player => 4,
            Self::Wall => 5,
        }
    }

    /// Reports whether a status belongs to the placeable sticker family.
    #[must_use]
    pub const fn is_sticker(self) -> bool {
        matches!(self, Self::Sticker | Self::Bumper | Self::SandBlock)
    }

    /// Reports whether `self` may move into a tile currently holding `occupied`.
    #[must_use]
    pub const fn outranks(self, occupied: TileStatus) -> bool {
        occupied.rank() < self.rank()
    }
}

/// Location of a tile expressed as signed column and row indices.
///
/// Row zero is the bottom row of the map. Coordinates may lie outside the
/// grid; the grid treats such positions as walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    x: i32,
    y: i32,
}

impl TilePos {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column index of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index of the tile, counted upwards from the bottom row.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Returns the position shifted by `[dx, dy]`, mirroring `dx` when facing left.
    #[must_use]
    pub const fn facing_offset(self, delta: [i32; 2], facing_right: bool) -> Self {
        let dx = if facing_right { delta[0] } else { -delta[0] };
        self.offset(dx, delta[1])
    }
}

/// Non-owning handle to an entity stored in the world's entity arena.
///
/// The generation distinguishes successive occupants of the same slot so a
/// stale handle never resolves to a newer entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from its raw slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// RGBA color with floating point channels in the range 0.0..=1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel intensity.
    pub red: f32,
    /// Green channel intensity.
    pub green: f32,
    /// Blue channel intensity.
    pub blue: f32,
    /// Alpha channel intensity.
    pub alpha: f32,
}

impl Color {
    /// Opaque white, the neutral tint.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the alpha channel replaced.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Linearly interpolates every channel towards `target`.
    ///
    /// A `fraction` of 0.0 yields `self`, 1.0 yields `target`.
    #[must_use]
    pub fn lerp(self, target: Self, fraction: f32) -> Self {
        Self {
            red: lerp_channel(self.red, target.red, fraction),
            green: lerp_channel(self.green, target.green, fraction),
            blue: lerp_channel(self.blue, target.blue, fraction),
            alpha: lerp_channel(self.alpha, target.alpha, fraction),
        }
    }
}

fn lerp_channel(start: f32, target: f32, fraction: f32) -> f32 {
    start + fraction * (target - start)
}

/// Converts seconds read from configuration into a [`Duration`].
///
/// Negative, non-finite or overflowing values collapse to zero.
#[must_use]
pub fn duration_from_secs(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
}

/// Ability kinds the player can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Quick strike on the tile directly in front of the attacker.
    Slash,
    /// Reaching thrust two tiles ahead.
    Lunge,
    /// Slow overhead blow landing diagonally in front and below.
    Smash,
}

impl ActionType {
    /// Every action type in index order.
    pub const ALL: [ActionType; 3] = [Self::Slash, Self::Lunge, Self::Smash];

    /// Lower-case name used in configuration files and input scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Slash => "slash",
            Self::Lunge => "lunge",
            Self::Smash => "smash",
        }
    }

    /// Built-in timing, damage and effect profile for the action.
    #[must_use]
    pub fn default_profile(self) -> ActionProfile {
        match self {
            Self::Slash => ActionProfile {
                startup_secs: 0.10,
                active_secs: 0.15,
                ending_secs: 0.20,
                resource_cost: 0,
                damage: 1,
                hit_offset: [1, 0],
                effect: Some(EffectCue {
                    sprite: "slash".to_owned(),
                    tile_offset: [1, 0],
                    duration_secs: 0.30,
                    color: Color::WHITE,
                    fade_start_secs: 0.10,
                }),
            },
            Self::Lunge => ActionProfile {
                startup_secs: 0.20,
                active_secs: 0.20,
                ending_secs: 0.30,
                resource_cost: 1,
                damage: 2,
                hit_offset: [2, 0],
                effect: Some(EffectCue {
                    sprite: "lunge".to_owned(),
                    tile_offset: [1, 0],
                    duration_secs: 0.40,
                    color: Color::from_rgb_u8(0xa0, 0xd8, 0xff),
                    fade_start_secs: 0.0,
                }),
            },
            Self::Smash => ActionProfile {
                startup_secs: 0.35,
                active_secs: 0.10,
                ending_secs: 0.45,
                resource_cost: 2,
                damage: 3,
                hit_offset: [1, -1],
                effect: Some(EffectCue {
                    sprite: "smash".to_owned(),
                    tile_offset: [1, -1],
                    duration_secs: 0.50,
                    color: Color::from_rgb_u8(0xff, 0xc1, 0x07),
                    fade_start_secs: 0.25,
                }),
            },
        }
    }
}

impl TryFrom<u8> for ActionType {
    type Error = UnknownActionType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(UnknownActionType::Index(value))
    }
}

impl std::str::FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == value)
            .ok_or_else(|| UnknownActionType::Name(value.to_owned()))
    }
}

/// Raised when an action type is requested by an index or name that does not exist.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnknownActionType {
    /// The numeric index lies outside [`ActionType::ALL`].
    #[error("unknown action type index {0}")]
    Index(u8),
    /// The name matches no action type.
    #[error("unknown action type `{0}`")]
    Name(String),
}

/// Timed stage of an in-flight action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ActionPhase {
    /// No action is in flight. Also the terminal state of every action.
    #[default]
    Idle,
    /// Wind-up before the action can hit.
    Startup,
    /// Window during which hit detection runs every tick.
    Active,
    /// Recovery after the active window.
    Ending,
}

impl ActionPhase {
    /// Phase that follows `self` once its timer elapses.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Startup => Self::Active,
            Self::Active => Self::Ending,
            Self::Ending => Self::Idle,
        }
    }
}

/// Static timing and hit profile of an action type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionProfile {
    /// Duration of the startup phase in seconds.
    pub startup_secs: f32,
    /// Duration of the active phase in seconds.
    pub active_secs: f32,
    /// Duration of the ending phase in seconds.
    pub ending_secs: f32,
    /// Ability point cost. Reserved; nothing deducts it yet.
    pub resource_cost: u32,
    /// Damage dealt to each enemy hit during one activation.
    pub damage: u32,
    /// Tile offset from the action origin checked by hit detection, facing right.
    pub hit_offset: [i32; 2],
    /// Visual spawned when the action starts, if any.
    pub effect: Option<EffectCue>,
}

impl ActionProfile {
    /// Configured duration of the provided phase. `Idle` lasts zero.
    #[must_use]
    pub fn phase_duration(&self, phase: ActionPhase) -> Duration {
        match phase {
            ActionPhase::Idle => Duration::ZERO,
            ActionPhase::Startup => duration_from_secs(self.startup_secs),
            ActionPhase::Active => duration_from_secs(self.active_secs),
            ActionPhase::Ending => duration_from_secs(self.ending_secs),
        }
    }

    /// Sum of the startup, active and ending durations.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.phase_duration(ActionPhase::Startup)
            + self.phase_duration(ActionPhase::Active)
            + self.phase_duration(ActionPhase::Ending)
    }
}

/// Visual requested alongside an action start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectCue {
    /// Sprite resource name resolved through the [`SpriteCatalog`].
    pub sprite: String,
    /// Tile offset from the action origin, mirrored with the facing.
    pub tile_offset: [i32; 2],
    /// Lifetime of the effect in seconds.
    pub duration_secs: f32,
    /// Initial tint of the effect.
    pub color: Color,
    /// Seconds into the effect's life after which it starts fading.
    pub fade_start_secs: f32,
}

/// Profiles for every [`ActionType`].
#[derive(Clone, Debug, PartialEq)]
pub struct ActionProfiles {
    profiles: [ActionProfile; 3],
}

impl ActionProfiles {
    /// Profile registered for the provided action type.
    #[must_use]
    pub fn get(&self, action: ActionType) -> &ActionProfile {
        &self.profiles[action as usize]
    }

    /// Replaces the profile registered for the provided action type.
    pub fn set(&mut self, action: ActionType, profile: ActionProfile) {
        self.profiles[action as usize] = profile;
    }
}

impl Default for ActionProfiles {
    fn default() -> Self {
        Self {
            profiles: ActionType::ALL.map(ActionType::default_profile),
        }
    }
}

/// Kinds of transient effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Textured quad with optional color fade.
    Image,
    /// Reserved for particle bursts.
    Particle,
    /// Reserved for one-shot sounds.
    Sound,
}

/// Opaque handle to a renderable resource acquired from a [`SpriteCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteHandle(u32);

impl SpriteHandle {
    /// Creates a sprite handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Source of renderable resources addressed by name.
pub trait SpriteCatalog {
    /// Resolves a resource name into a handle, or `None` when it is unknown.
    fn acquire(&self, name: &str) -> Option<SpriteHandle>;
}

/// Boolean input states sampled once per frame by the platform layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Step the player one tile left.
    pub move_left: bool,
    /// Step the player one tile right.
    pub move_right: bool,
    /// Step the player one tile up.
    pub move_up: bool,
    /// Step the player one tile down.
    pub move_down: bool,
    /// Start a slash.
    pub slash: bool,
    /// Start a lunge.
    pub lunge: bool,
    /// Start a smash.
    pub smash: bool,
    /// Rotate the held sticker 45 degrees counter-clockwise.
    pub rotate_left: bool,
    /// Rotate the held sticker 45 degrees clockwise.
    pub rotate_right: bool,
    /// Select the next sticker in the inventory.
    pub cycle_sticker: bool,
    /// Place the held sticker on the hovered tile.
    pub place_sticker: bool,
    /// Toggle the grid debug overlay.
    pub debug_toggle: bool,
}

impl FrameInput {
    /// Action requested this frame, preferring the heaviest when several are pressed.
    #[must_use]
    pub const fn requested_action(&self) -> Option<ActionType> {
        if self.smash {
            Some(ActionType::Smash)
        } else if self.lunge {
            Some(ActionType::Lunge)
        } else if self.slash {
            Some(ActionType::Slash)
        } else {
            None
        }
    }
}

/// Notifications pushed by the grid and the frame systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A map description was loaded into the grid.
    MapLoaded {
        /// Number of tile columns.
        width: u32,
        /// Number of tile rows.
        height: u32,
        /// Number of uninterpreted tags handed back for entity spawning.
        tags: usize,
    },
    /// The grid debug overlay was switched on or off.
    DebugViewToggled {
        /// Whether the overlay is now visible.
        enabled: bool,
    },
    /// The player moved between two tiles.
    PlayerMoved {
        /// Tile the player left.
        from: TilePos,
        /// Tile the player entered.
        to: TilePos,
    },
    /// An action entered its startup phase.
    ActionStarted {
        /// Type of the new action.
        action: ActionType,
        /// Tile the action originates from.
        origin: TilePos,
        /// Whether the action faces towards increasing columns.
        facing_right: bool,
    },
    /// The in-flight action advanced to another timed phase.
    ActionPhaseChanged {
        /// Type of the in-flight action.
        action: ActionType,
        /// Phase that became current.
        phase: ActionPhase,
    },
    /// The in-flight action finished its ending phase and the manager is idle.
    ActionFinished {
        /// Type of the finished action.
        action: ActionType,
    },
    /// Hit detection damaged an enemy.
    EnemyHit {
        /// Type of the action that landed.
        action: ActionType,
        /// Enemy that was hit.
        enemy: EntityId,
        /// Tile the enemy occupied.
        tile: TilePos,
        /// Damage applied.
        damage: u32,
    },
    /// An enemy ran out of health and was removed from the grid.
    EnemyDefeated {
        /// Enemy that was defeated.
        enemy: EntityId,
        /// Tile the enemy occupied.
        tile: TilePos,
    },
    /// A tile was reset to empty and its occupant marked for destruction.
    TileCleared {
        /// Tile that was cleared.
        tile: TilePos,
        /// Occupant marked for destruction, if any.
        occupant: Option<EntityId>,
    },
    /// An effect started playing.
    EffectStarted {
        /// Visual entity owned by the effect.
        visual: EntityId,
        /// Kind of the effect.
        kind: EffectKind,
    },
    /// An effect ran out of time and its visual was marked for destruction.
    EffectExpired {
        /// Visual entity owned by the effect.
        visual: EntityId,
    },
    /// A sticker was written into the grid.
    StickerPlaced {
        /// Sticker entity.
        sticker: EntityId,
        /// Tile it occupies.
        tile: TilePos,
        /// Status tag written into the tile.
        status: TileStatus,
    },
    /// A fragile block sticker broke and vacated its tile.
    StickerBroken {
        /// Sticker entity.
        sticker: EntityId,
        /// Tile it vacated.
        tile: TilePos,
    },
    /// A broken block sticker re-entered its tile.
    StickerRegenerated {
        /// Sticker entity.
        sticker: EntityId,
        /// Tile it occupies again.
        tile: TilePos,
    },
}
