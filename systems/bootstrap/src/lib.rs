#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session bootstrap and frame loop for Tilestrike.
//!
//! A [`Session`] is built from a map description and a [`GameConfig`]: the
//! grid loads the map, every tag the grid hands back is resolved into an
//! entity, and the player's sticker inventory is filled. [`Session::tick`]
//! then drives the grid, the action, sticker and effect systems in a fixed
//! order once per frame.

mod config;

use std::{path::Path, time::Duration};

use glam::Vec2;
use thiserror::Error;
use tilestrike_core::{EntityId, Event, FrameInput, SpriteCatalog, TilePos, TileStatus};
use tilestrike_system_actions::{ActionContext, ActionManager};
use tilestrike_system_effects::EffectManager;
use tilestrike_system_stickers::{simple_place, update_stickers, Inventory};
use tilestrike_world::{
    BlockState, Destructible, Enemy, Entities, Entity, MapLoadError, MapMatrix, MapTag, Player,
    Sticker, StickerKind, Visual,
};
use tracing::{debug, info, trace, warn};

pub use config::{
    ActionOverride, ConfigError, EnemyConfig, FrameConfig, GameConfig, GridConfig, StickerChoice,
    StickerConfig,
};

/// Sprite names the session acquires for stickers.
pub const STICKER_SPRITES: [&str; 4] = ["sticker", "bumper", "block", "sand"];

/// Reasons a session could not be started.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The configuration could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The map description could not be loaded.
    #[error(transparent)]
    Map(#[from] MapLoadError),
    /// The map description contains no player spawn.
    #[error("map description has no player spawn `p`")]
    MissingPlayerSpawn,
    /// The sprite catalog cannot provide a sprite the session needs.
    #[error("sprite catalog has no sprite named `{0}`")]
    MissingSprite(String),
}

/// Authoritative game state plus the systems that advance it.
#[derive(Debug)]
pub struct Session<C> {
    map: MapMatrix,
    entities: Entities,
    actions: ActionManager,
    effects: EffectManager,
    inventory: Inventory,
    catalog: C,
    player: EntityId,
    max_delta: Duration,
    pending: Vec<Event>,
}

impl<C> Session<C>
where
    C: SpriteCatalog,
{
    /// Starts a session from a map file on disk.
    pub fn from_map_path(
        path: impl AsRef<Path>,
        config: &GameConfig,
        catalog: C,
    ) -> Result<Self, BootstrapError> {
        let mut map = MapMatrix::new(0, 0, config.grid_frame());
        let tags = map.load_from_path(path)?;
        Self::build(map, tags, config, catalog)
    }

    /// Starts a session from an in-memory map description.
    pub fn from_map_text(
        text: &str,
        config: &GameConfig,
        catalog: C,
    ) -> Result<Self, BootstrapError> {
        let mut map = MapMatrix::new(0, 0, config.grid_frame());
        let tags = map.load_from_text(text)?;
        Self::build(map, tags, config, catalog)
    }

    fn build(
        mut map: MapMatrix,
        tags: Vec<MapTag>,
        config: &GameConfig,
        catalog: C,
    ) -> Result<Self, BootstrapError> {
        let actions = ActionManager::with_profiles(config.action_profiles()?);
        let mut entities = Entities::new();
        let mut pending = vec![Event::MapLoaded {
            width: map.width(),
            height: map.height(),
            tags: tags.len(),
        }];

        let spawn = map.player_position();
        if map.get_tile(spawn).status() != TileStatus::Player {
            return Err(BootstrapError::MissingPlayerSpawn);
        }
        let player = entities.spawn(Entity::Player(Player::new(spawn)));
        map.set_tile(spawn, TileStatus::Empty, None);
        let _ = map.set_player_position(spawn, player);
        map.set_tile(spawn, TileStatus::Player, Some(player));

        let regeneration = config.stickers.sand_regeneration();
        for MapTag { tag, tile } in tags {
            let kind = match tag {
                'e' => {
                    let enemy = entities.spawn(Entity::Enemy(Enemy::new(tile, config.enemies.health)));
                    map.set_tile(tile, TileStatus::Enemy, Some(enemy));
                    continue;
                }
                'd' => {
                    let scenery = entities.spawn(Entity::Destructible(Destructible::new(tile)));
                    map.set_tile(tile, TileStatus::Destructible, Some(scenery));
                    continue;
                }
                's' => StickerChoice::Plain,
                'b' => StickerChoice::Bumper,
                'k' => StickerChoice::Block,
                'n' => StickerChoice::Sand,
                other => {
                    warn!(tag = %other, ?tile, "unknown map tag ignored");
                    continue;
                }
            };

            let mut sticker = new_sticker(kind, regeneration, &catalog)?;
            let id = entities.vacant_id();
            if simple_place(&mut sticker, id, tile, &mut map, &mut pending) {
                let _ = entities.spawn(Entity::Sticker(sticker));
            }
        }

        let held = config
            .stickers
            .inventory
            .iter()
            .map(|&kind| new_sticker(kind, regeneration, &catalog))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            entities = entities.len(),
            stickers = held.len(),
            "session started"
        );

        Ok(Self {
            map,
            entities,
            actions,
            effects: EffectManager::new(),
            inventory: Inventory::new(held),
            catalog,
            player,
            max_delta: config.max_delta(),
            pending,
        })
    }

    /// Advances the session by one frame and returns what happened.
    ///
    /// `dt` is clamped to the configured maximum. The grid samples its
    /// toggles first, then the player moves, actions and sticker placement
    /// react to input, the action, sticker and effect systems advance, and
    /// finally every entity marked for destruction is swept.
    pub fn tick(&mut self, dt: Duration, input: &FrameInput) -> Vec<Event> {
        let dt = dt.min(self.max_delta);
        let mut events = std::mem::take(&mut self.pending);

        self.map.update(input, &mut events);
        self.move_player(input, &mut events);

        let origin = self.map.player_position();
        let facing_right = self.facing_right();
        if let Some(action) = input.requested_action() {
            let mut ctx = ActionContext {
                map: &mut self.map,
                entities: &mut self.entities,
                effects: &mut self.effects,
                catalog: &self.catalog,
            };
            self.actions
                .start_action(action, origin, facing_right, &mut ctx, &mut events);
        }

        let ahead = origin.facing_offset([1, 0], facing_right);
        if input.cycle_sticker {
            self.inventory.cycle();
        }
        self.inventory.hover_selected(ahead, input, self.map.frame());
        if input.place_sticker {
            let _ = self.inventory.place_selected(
                ahead,
                &mut self.map,
                &mut self.entities,
                &mut events,
            );
        }

        let mut ctx = ActionContext {
            map: &mut self.map,
            entities: &mut self.entities,
            effects: &mut self.effects,
            catalog: &self.catalog,
        };
        self.actions.update_actions(dt, &mut ctx, &mut events);
        update_stickers(dt, &mut self.map, &mut self.entities, &mut events);
        self.effects.update(dt, &mut self.entities, &mut events);

        let swept = self.entities.sweep();
        if !swept.is_empty() {
            debug!(count = swept.len(), "entities swept");
        }
        events
    }

    fn move_player(&mut self, input: &FrameInput, out: &mut Vec<Event>) {
        let dx = i32::from(input.move_right) - i32::from(input.move_left);
        let dy = i32::from(input.move_up) - i32::from(input.move_down);
        if dx == 0 && dy == 0 {
            return;
        }

        let from = self.map.player_position();
        let to = from.offset(dx, dy);
        let destination = self.map.get_tile(to).status();
        // The player only walks onto free floor; occupants are never displaced.
        let moved = destination == TileStatus::Empty
            && self.map.set_player_position(to, self.player)
            && self
                .map
                .move_tile(from, to, TileStatus::Player, Some(self.player));
        if !moved {
            trace!(?from, ?to, ?destination, "player move blocked");
        }

        if let Some(player) = self
            .entities
            .get_mut(self.player)
            .and_then(Entity::as_player_mut)
        {
            if dx != 0 {
                player.facing_right = dx > 0;
            }
            if moved {
                player.tile = to;
            }
        }

        if moved {
            debug!(?from, ?to, "player moved");
            out.push(Event::PlayerMoved { from, to });
        }
    }

    /// Grid holding the level.
    #[must_use]
    pub fn map(&self) -> &MapMatrix {
        &self.map
    }

    /// Entity arena.
    #[must_use]
    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    /// Action state machine.
    #[must_use]
    pub fn actions(&self) -> &ActionManager {
        &self.actions
    }

    /// Running effects.
    #[must_use]
    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    /// Held stickers.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Catalog the session acquires sprites from.
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Handle of the player entity.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Tile the player stands on.
    #[must_use]
    pub fn player_tile(&self) -> TilePos {
        self.map.player_position()
    }

    /// Whether the player faces towards increasing columns.
    #[must_use]
    pub fn facing_right(&self) -> bool {
        match self.entities.get(self.player) {
            Some(Entity::Player(player)) => player.facing_right,
            _ => true,
        }
    }
}

fn new_sticker<C>(
    kind: StickerChoice,
    regeneration: Duration,
    catalog: &C,
) -> Result<Sticker, BootstrapError>
where
    C: SpriteCatalog + ?Sized,
{
    let (name, kind) = match kind {
        StickerChoice::Plain => (STICKER_SPRITES[0], StickerKind::Plain),
        StickerChoice::Bumper => (STICKER_SPRITES[1], StickerKind::Bumper),
        StickerChoice::Block => (
            STICKER_SPRITES[2],
            StickerKind::Block(BlockState::new(false, regeneration)),
        ),
        StickerChoice::Sand => (
            STICKER_SPRITES[3],
            StickerKind::Block(BlockState::new(true, regeneration)),
        ),
    };
    let sprite = catalog
        .acquire(name)
        .ok_or_else(|| BootstrapError::MissingSprite(name.to_owned()))?;
    Ok(Sticker::new(kind, Visual::new(sprite, Vec2::ZERO)))
}
