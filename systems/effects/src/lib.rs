#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lifecycle manager for transient visual effects.
//!
//! Effects own a visual entity in the world's arena for a fixed duration,
//! optionally fade its tint towards a target color, and hand the visual back
//! to the arena's deferred destruction once their time runs out.

use std::time::Duration;

use glam::Vec2;
use thiserror::Error;
use tilestrike_core::{
    duration_from_secs, Color, EffectCue, EffectKind, EntityId, Event, SpriteCatalog, TilePos,
};
use tilestrike_world::{Entities, Entity, GridFrame, Visual};
use tracing::{debug, warn};

/// Description of an effect to start.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectRequest {
    /// Kind of effect. Only [`EffectKind::Image`] produces a visual.
    pub kind: EffectKind,
    /// Sprite resource name resolved through the catalog.
    pub sprite: String,
    /// Total lifetime of the effect.
    pub duration: Duration,
    /// Tint applied when the effect starts.
    pub color: Color,
    /// Time into the effect's life after which the tint starts fading.
    pub fade_start: Duration,
    /// Tint reached when the effect expires.
    pub fade_target: Color,
}

impl EffectRequest {
    /// Creates an image effect that never fades and targets a transparent tint.
    #[must_use]
    pub fn image(sprite: impl Into<String>, duration: Duration, color: Color) -> Self {
        Self {
            kind: EffectKind::Image,
            sprite: sprite.into(),
            duration,
            color,
            fade_start: duration,
            fade_target: color.with_alpha(0.0),
        }
    }

    /// Builds the image effect described by an action's effect cue.
    #[must_use]
    pub fn from_cue(cue: &EffectCue) -> Self {
        Self::image(cue.sprite.clone(), duration_from_secs(cue.duration_secs), cue.color)
            .with_fade_start(duration_from_secs(cue.fade_start_secs))
    }

    /// Overrides the kind of effect.
    #[must_use]
    pub fn with_kind(mut self, kind: EffectKind) -> Self {
        self.kind = kind;
        self
    }

    /// Overrides the point in the effect's life at which fading begins.
    #[must_use]
    pub fn with_fade_start(mut self, fade_start: Duration) -> Self {
        self.fade_start = fade_start;
        self
    }

    /// Overrides the tint reached at the end of the fade.
    #[must_use]
    pub fn with_fade_target(mut self, fade_target: Color) -> Self {
        self.fade_target = fade_target;
        self
    }
}

/// World-space transform of a new effect visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectPlacement {
    /// Centre of the visual in world units.
    pub position: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Size multiplier.
    pub scale: Vec2,
    /// Whether the sprite is drawn unmirrored.
    pub facing_right: bool,
}

impl EffectPlacement {
    /// Unrotated, unscaled placement at the provided position.
    #[must_use]
    pub const fn at(position: Vec2, facing_right: bool) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
            facing_right,
        }
    }
}

/// A running effect.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    kind: EffectKind,
    visual: EntityId,
    total_duration: Duration,
    remaining: Duration,
    fade_start: Duration,
    start_color: Color,
    fade_target: Color,
}

impl Effect {
    /// Kind of the effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Visual entity owned by the effect.
    #[must_use]
    pub const fn visual(&self) -> EntityId {
        self.visual
    }

    /// Total lifetime the effect was started with.
    #[must_use]
    pub const fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Time left before the effect expires.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Time into the effect's life after which fading begins.
    #[must_use]
    pub const fn fade_start(&self) -> Duration {
        self.fade_start
    }

    /// Tint at the start of the fade.
    #[must_use]
    pub const fn start_color(&self) -> Color {
        self.start_color
    }

    /// Tint at the end of the fade.
    #[must_use]
    pub const fn fade_target(&self) -> Color {
        self.fade_target
    }

    fn fade_fraction(&self) -> Option<f32> {
        let elapsed = self.total_duration.saturating_sub(self.remaining);
        if elapsed <= self.fade_start {
            return None;
        }
        let span = self.total_duration.saturating_sub(self.fade_start);
        if span.is_zero() {
            return Some(1.0);
        }
        Some((elapsed - self.fade_start).as_secs_f32() / span.as_secs_f32())
    }
}

/// Errors raised while starting an effect.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EffectError {
    /// The catalog holds no resource with the requested name.
    #[error("unknown effect sprite `{0}`")]
    UnknownSprite(String),
}

/// Owns every running effect and advances them once per frame.
#[derive(Debug, Default)]
pub struct EffectManager {
    effects: Vec<Effect>,
}

impl EffectManager {
    /// Creates a manager with no running effects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an effect at a world-space transform.
    ///
    /// Image effects acquire their sprite from `catalog`, spawn an owned
    /// visual entity and return its handle. Particle and sound effects are
    /// reserved and start nothing.
    pub fn start_effect<C>(
        &mut self,
        request: &EffectRequest,
        placement: EffectPlacement,
        catalog: &C,
        entities: &mut Entities,
        out: &mut Vec<Event>,
    ) -> Result<Option<EntityId>, EffectError>
    where
        C: SpriteCatalog + ?Sized,
    {
        if request.kind != EffectKind::Image {
            debug!(kind = ?request.kind, "effect kind is reserved, nothing started");
            return Ok(None);
        }

        let Some(sprite) = catalog.acquire(&request.sprite) else {
            warn!(sprite = %request.sprite, "effect sprite missing from catalog");
            return Err(EffectError::UnknownSprite(request.sprite.clone()));
        };

        let mut visual = Visual::new(sprite, placement.position);
        visual.rotation = placement.rotation;
        visual.scale = placement.scale;
        visual.facing_right = placement.facing_right;
        visual.color = request.color;
        let visual = entities.spawn(Entity::Visual(visual));

        self.effects.push(Effect {
            kind: request.kind,
            visual,
            total_duration: request.duration,
            remaining: request.duration,
            fade_start: request.fade_start,
            start_color: request.color,
            fade_target: request.fade_target,
        });
        debug!(sprite = %request.sprite, duration = ?request.duration, "effect started");
        out.push(Event::EffectStarted {
            visual,
            kind: request.kind,
        });
        Ok(Some(visual))
    }

    /// Starts an effect centred on a tile, unrotated and unscaled.
    #[allow(clippy::too_many_arguments)]
    pub fn start_effect_in_tile<C>(
        &mut self,
        request: &EffectRequest,
        tile: TilePos,
        facing_right: bool,
        frame: &GridFrame,
        catalog: &C,
        entities: &mut Entities,
        out: &mut Vec<Event>,
    ) -> Result<Option<EntityId>, EffectError>
    where
        C: SpriteCatalog + ?Sized,
    {
        let placement = EffectPlacement::at(frame.tile_to_world(tile), facing_right);
        self.start_effect(request, placement, catalog, entities, out)
    }

    /// Advances every effect by `dt`.
    ///
    /// Effects whose remaining time reaches zero are removed within this call
    /// and their visuals marked for destruction. Surviving effects past their
    /// fade start have their visual's tint interpolated linearly towards the
    /// fade target.
    pub fn update(&mut self, dt: Duration, entities: &mut Entities, out: &mut Vec<Event>) {
        self.effects.retain_mut(|effect| {
            effect.remaining = effect.remaining.saturating_sub(dt);
            if effect.remaining.is_zero() {
                let _ = entities.mark_for_destruction(effect.visual);
                debug!(visual = ?effect.visual, "effect expired");
                out.push(Event::EffectExpired {
                    visual: effect.visual,
                });
                return false;
            }

            if let Some(fraction) = effect.fade_fraction() {
                if let Some(visual) = entities.get_mut(effect.visual).and_then(Entity::visual_mut) {
                    visual.color = effect.start_color.lerp(effect.fade_target, fraction);
                }
            }
            true
        });
    }

    /// Drops every running effect and marks their visuals for destruction.
    pub fn clear_effect_list(&mut self, entities: &mut Entities) {
        for effect in self.effects.drain(..) {
            let _ = entities.mark_for_destruction(effect.visual);
        }
    }

    /// Running effects in start order.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Number of running effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Reports whether no effect is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
