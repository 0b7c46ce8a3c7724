#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-phased state machine for the player's abilities.
//!
//! At most one action is in flight. Starting an action replaces whatever was
//! running, then the action walks `Startup -> Active -> Ending` on per-phase
//! timers before the manager falls back to idle. While the action is in its
//! active window every update checks the tile in front of the action's
//! origin and resolves hits against the grid.

use std::{collections::BTreeSet, time::Duration};

use tilestrike_core::{
    ActionPhase, ActionProfile, ActionProfiles, ActionType, EntityId, Event, SpriteCatalog,
    TilePos, TileStatus,
};
use tilestrike_system_effects::{EffectManager, EffectRequest};
use tilestrike_world::{Entities, Entity, MapMatrix};
use tracing::{debug, info, warn};

/// Mutable view of the world services an action touches during a frame.
#[derive(Debug)]
pub struct ActionContext<'a, C: ?Sized> {
    /// Grid queried and mutated by hit detection.
    pub map: &'a mut MapMatrix,
    /// Arena holding the entities that tiles point at.
    pub entities: &'a mut Entities,
    /// Manager receiving the visuals spawned at action start.
    pub effects: &'a mut EffectManager,
    /// Catalog resolving effect sprite names.
    pub catalog: &'a C,
}

/// The single in-flight action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    action_type: ActionType,
    phase: ActionPhase,
    origin: TilePos,
    facing_right: bool,
    phase_time_remaining: Duration,
    already_hit: BTreeSet<EntityId>,
}

impl Action {
    /// Type of the action.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// Current timed phase.
    #[must_use]
    pub const fn phase(&self) -> ActionPhase {
        self.phase
    }

    /// Tile the action originates from.
    #[must_use]
    pub const fn origin(&self) -> TilePos {
        self.origin
    }

    /// Whether the action faces towards increasing columns.
    #[must_use]
    pub const fn facing_right(&self) -> bool {
        self.facing_right
    }

    /// Time left in the current phase.
    #[must_use]
    pub const fn phase_time_remaining(&self) -> Duration {
        self.phase_time_remaining
    }

    /// Reports whether the entity was already hit by this activation.
    #[must_use]
    pub fn has_hit(&self, entity: EntityId) -> bool {
        self.already_hit.contains(&entity)
    }
}

/// Owns the in-flight action and advances it once per frame.
#[derive(Debug, Default)]
pub struct ActionManager {
    current: Option<Action>,
    profiles: ActionProfiles,
}

impl ActionManager {
    /// Creates an idle manager using the built-in action profiles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle manager using the provided action profiles.
    #[must_use]
    pub fn with_profiles(profiles: ActionProfiles) -> Self {
        Self {
            current: None,
            profiles,
        }
    }

    /// Profile used for the provided action type.
    #[must_use]
    pub fn profile(&self, action_type: ActionType) -> &ActionProfile {
        self.profiles.get(action_type)
    }

    /// Total duration of an action: startup, active and ending combined.
    #[must_use]
    pub fn action_length(&self, action_type: ActionType) -> Duration {
        self.profiles.get(action_type).total_duration()
    }

    /// The in-flight action, if any.
    #[must_use]
    pub fn current_action(&self) -> Option<&Action> {
        self.current.as_ref()
    }

    /// Phase of the in-flight action, or [`ActionPhase::Idle`].
    #[must_use]
    pub fn current_action_status(&self) -> ActionPhase {
        self.current
            .as_ref()
            .map_or(ActionPhase::Idle, |action| action.phase)
    }

    /// Starts an action, discarding any action already in flight.
    ///
    /// The new action enters its startup phase with a cleared hit set. When
    /// the action's profile carries an effect cue, the effect is started on
    /// the tile offset from `origin`, mirrored by the facing. A failure to
    /// start the effect is logged and does not prevent the action.
    pub fn start_action<C>(
        &mut self,
        action_type: ActionType,
        origin: TilePos,
        facing_right: bool,
        ctx: &mut ActionContext<'_, C>,
        out: &mut Vec<Event>,
    ) where
        C: SpriteCatalog + ?Sized,
    {
        if let Some(replaced) = &self.current {
            debug!(
                replaced = replaced.action_type.name(),
                phase = ?replaced.phase,
                "in-flight action replaced"
            );
        }

        let profile = self.profiles.get(action_type);
        self.current = Some(Action {
            action_type,
            phase: ActionPhase::Startup,
            origin,
            facing_right,
            phase_time_remaining: profile.phase_duration(ActionPhase::Startup),
            already_hit: BTreeSet::new(),
        });
        info!(action = action_type.name(), ?origin, facing_right, "action started");
        out.push(Event::ActionStarted {
            action: action_type,
            origin,
            facing_right,
        });

        if let Some(cue) = &profile.effect {
            let tile = origin.facing_offset(cue.tile_offset, facing_right);
            let request = EffectRequest::from_cue(cue);
            if let Err(error) = ctx.effects.start_effect_in_tile(
                &request,
                tile,
                facing_right,
                ctx.map.frame(),
                ctx.catalog,
                ctx.entities,
                out,
            ) {
                warn!(action = action_type.name(), %error, "action effect not started");
            }
        }
    }

    /// Advances the in-flight action by `dt`.
    ///
    /// Does nothing while idle. At most one phase transition happens per
    /// call, and the next phase starts with its full configured duration
    /// regardless of how far `dt` overshot. Hit detection runs on every call
    /// that leaves the action in its active phase.
    pub fn update_actions<C>(
        &mut self,
        dt: Duration,
        ctx: &mut ActionContext<'_, C>,
        out: &mut Vec<Event>,
    ) where
        C: SpriteCatalog + ?Sized,
    {
        let Some(action) = self.current.as_mut() else {
            return;
        };
        let profile = self.profiles.get(action.action_type);

        action.phase_time_remaining = action.phase_time_remaining.saturating_sub(dt);
        if action.phase_time_remaining.is_zero() {
            let next = action.phase.next();
            if next == ActionPhase::Idle {
                self.end_action(out);
                return;
            }

            action.phase = next;
            action.phase_time_remaining = profile.phase_duration(next);
            debug!(action = action.action_type.name(), phase = ?next, "action phase changed");
            out.push(Event::ActionPhaseChanged {
                action: action.action_type,
                phase: next,
            });
        }

        if action.phase == ActionPhase::Active {
            detect_hits(action, profile, ctx, out);
        }
    }

    fn end_action(&mut self, out: &mut Vec<Event>) {
        if let Some(finished) = self.current.take() {
            info!(action = finished.action_type.name(), "action finished");
            out.push(Event::ActionFinished {
                action: finished.action_type,
            });
        }
    }
}

fn detect_hits<C>(
    action: &mut Action,
    profile: &ActionProfile,
    ctx: &mut ActionContext<'_, C>,
    out: &mut Vec<Event>,
) where
    C: SpriteCatalog + ?Sized,
{
    let target = action
        .origin
        .facing_offset(profile.hit_offset, action.facing_right);
    let tile = ctx.map.get_tile(target);

    match tile.status() {
        TileStatus::Enemy => {
            let Some(enemy_id) = tile.occupant() else {
                return;
            };
            if !action.already_hit.insert(enemy_id) {
                return;
            }
            let Some(enemy) = ctx.entities.get_mut(enemy_id).and_then(Entity::as_enemy_mut) else {
                return;
            };

            let defeated = enemy.apply_damage(profile.damage);
            info!(
                action = action.action_type.name(),
                enemy = ?enemy_id,
                health = enemy.health(),
                "enemy hit"
            );
            out.push(Event::EnemyHit {
                action: action.action_type,
                enemy: enemy_id,
                tile: target,
                damage: profile.damage,
            });

            if defeated {
                let _ = ctx.map.clear_tile(target, ctx.entities);
                info!(enemy = ?enemy_id, "enemy defeated");
                out.push(Event::EnemyDefeated {
                    enemy: enemy_id,
                    tile: target,
                });
            }
        }
        TileStatus::Destructible => {
            let occupant = ctx.map.clear_tile(target, ctx.entities);
            debug!(tile = ?target, "destructible tile cleared");
            out.push(Event::TileCleared {
                tile: target,
                occupant,
            });
        }
        TileStatus::SandBlock => {
            let Some(sticker_id) = tile.occupant() else {
                return;
            };
            if !action.already_hit.insert(sticker_id) {
                return;
            }
            let shattered = ctx
                .entities
                .get_mut(sticker_id)
                .and_then(Entity::as_sticker_mut)
                .is_some_and(|sticker| sticker.shatter());
            if shattered {
                ctx.map.set_tile(target, TileStatus::Empty, None);
                debug!(sticker = ?sticker_id, tile = ?target, "sand block broken");
                out.push(Event::StickerBroken {
                    sticker: sticker_id,
                    tile: target,
                });
            }
        }
        _ => {}
    }
}
