//! TOML game configuration.
//!
//! Every section is optional. A missing key keeps the built-in default, so an
//! empty file describes the stock game.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tilestrike_core::{
    duration_from_secs, ActionProfile, ActionProfiles, ActionType, EffectCue, UnknownActionType,
};
use tilestrike_world::GridFrame;

/// Reasons a configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The contents were not valid configuration TOML.
    #[error("failed to parse configuration toml")]
    Parse(#[from] toml::de::Error),
    /// An `[actions.<name>]` table named no known action.
    #[error("configuration overrides an unknown action")]
    UnknownAction(#[from] UnknownActionType),
    /// `[frame] max_delta_secs` would stall or corrupt the simulation clock.
    #[error("frame.max_delta_secs must be a positive number of seconds, got {0}")]
    InvalidMaxDelta(f32),
}

/// Complete game configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Placement of the grid in world space.
    pub grid: GridConfig,
    /// Frame stepping limits.
    pub frame: FrameConfig,
    /// Parameters of map-spawned enemies.
    pub enemies: EnemyConfig,
    /// Sticker inventory and block regeneration.
    pub stickers: StickerConfig,
    /// Per action overrides keyed by lower-case action name.
    pub actions: BTreeMap<String, ActionOverride>,
}

impl GameConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        let max_delta = config.frame.max_delta_secs;
        if !(max_delta.is_finite() && max_delta > 0.0) {
            return Err(ConfigError::InvalidMaxDelta(max_delta));
        }
        let _ = config.action_profiles()?;
        Ok(config)
    }

    /// Tile to world mapping described by the `[grid]` section.
    #[must_use]
    pub fn grid_frame(&self) -> GridFrame {
        GridFrame::new(self.grid.min_x, self.grid.min_y)
    }

    /// Largest frame delta the simulation advances by.
    #[must_use]
    pub fn max_delta(&self) -> Duration {
        duration_from_secs(self.frame.max_delta_secs)
    }

    /// Built-in action profiles with the configured overrides applied.
    pub fn action_profiles(&self) -> Result<ActionProfiles, ConfigError> {
        let mut profiles = ActionProfiles::default();
        for (name, overrides) in &self.actions {
            let action: ActionType = name.parse()?;
            let mut profile = profiles.get(action).clone();
            overrides.apply(&mut profile);
            profiles.set(action, profile);
        }
        Ok(profiles)
    }
}

/// `[grid]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// World-space x coordinate of the centre of column zero.
    pub min_x: f32,
    /// World-space y coordinate of the centre of row zero.
    pub min_y: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
        }
    }
}

/// `[frame]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Frame deltas above this many seconds are clamped.
    pub max_delta_secs: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_delta_secs: 0.1,
        }
    }
}

/// `[enemies]` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnemyConfig {
    /// Starting health of every enemy spawned from the map.
    pub health: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self { health: 3 }
    }
}

/// Sticker variants the inventory may start with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerChoice {
    /// Plain sticker.
    Plain,
    /// Rotatable bumper.
    Bumper,
    /// Solid block.
    Block,
    /// Fragile block that regenerates after breaking.
    Sand,
}

/// `[stickers]` section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StickerConfig {
    /// Seconds a broken sand block waits before regenerating.
    pub sand_regeneration_secs: f32,
    /// Stickers held when the session starts, in selection order.
    pub inventory: Vec<StickerChoice>,
}

impl StickerConfig {
    /// Regeneration delay of sand blocks.
    #[must_use]
    pub fn sand_regeneration(&self) -> Duration {
        duration_from_secs(self.sand_regeneration_secs)
    }
}

impl Default for StickerConfig {
    fn default() -> Self {
        Self {
            sand_regeneration_secs: 3.0,
            inventory: vec![StickerChoice::Plain, StickerChoice::Bumper, StickerChoice::Sand],
        }
    }
}

/// Partial `[actions.<name>]` override. Missing keys keep the built-in value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionOverride {
    /// Replacement startup duration in seconds.
    pub startup_secs: Option<f32>,
    /// Replacement active duration in seconds.
    pub active_secs: Option<f32>,
    /// Replacement ending duration in seconds.
    pub ending_secs: Option<f32>,
    /// Replacement resource cost.
    pub resource_cost: Option<u32>,
    /// Replacement damage.
    pub damage: Option<u32>,
    /// Replacement hit offset.
    pub hit_offset: Option<[i32; 2]>,
    /// Replacement effect cue.
    pub effect: Option<EffectCue>,
}

impl ActionOverride {
    fn apply(&self, profile: &mut ActionProfile) {
        if let Some(secs) = self.startup_secs {
            profile.startup_secs = secs;
        }
        if let Some(secs) = self.active_secs {
            profile.active_secs = secs;
        }
        if let Some(secs) = self.ending_secs {
            profile.ending_secs = secs;
        }
        if let Some(cost) = self.resource_cost {
            profile.resource_cost = cost;
        }
        if let Some(damage) = self.damage {
            profile.damage = damage;
        }
        if let Some(offset) = self.hit_offset {
            profile.hit_offset = offset;
        }
        if let Some(effect) = &self.effect {
            profile.effect = Some(effect.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_files_yield_defaults() {
        let config = GameConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.max_delta(), duration_from_secs(0.1));
        assert_eq!(config.action_profiles().expect("profiles"), ActionProfiles::default());
    }

    #[test]
    fn action_overrides_patch_single_fields() {
        let config = GameConfig::from_toml_str(
            r#"
                [actions.lunge]
                damage = 7
                hit_offset = [3, 0]
            "#,
        )
        .expect("config parses");

        let profiles = config.action_profiles().expect("profiles");
        let lunge = profiles.get(ActionType::Lunge);
        let stock = ActionType::Lunge.default_profile();
        assert_eq!(lunge.damage, 7);
        assert_eq!(lunge.hit_offset, [3, 0]);
        assert_eq!(lunge.startup_secs, stock.startup_secs, "untouched fields keep defaults");
        assert_eq!(profiles.get(ActionType::Slash), &ActionType::Slash.default_profile());
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let result = GameConfig::from_toml_str("[actions.kick]\ndamage = 1\n");
        assert!(matches!(result, Err(ConfigError::UnknownAction(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = GameConfig::from_toml_str("[frame]\nmax_delta = 1.0\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn non_positive_frame_limits_are_rejected() {
        for value in ["0.0", "-1.0", "nan"] {
            let contents = format!("[frame]\nmax_delta_secs = {value}\n");
            let result = GameConfig::from_toml_str(&contents);
            assert!(
                matches!(result, Err(ConfigError::InvalidMaxDelta(_))),
                "max_delta_secs = {value} should be rejected, got {result:?}"
            );
        }
        let config = GameConfig::from_toml_str("[frame]\nmax_delta_secs = 0.05\n")
            .expect("positive limits load");
        assert_eq!(config.max_delta(), duration_from_secs(0.05));
    }

    #[test]
    fn sections_parse() {
        let config = GameConfig::from_toml_str(
            r#"
                [grid]
                min_x = -10.0
                min_y = -6.0

                [enemies]
                health = 9

                [stickers]
                sand_regeneration_secs = 1.5
                inventory = ["sand", "block"]
            "#,
        )
        .expect("config parses");

        assert_eq!(config.grid_frame(), GridFrame::new(-10.0, -6.0));
        assert_eq!(config.enemies.health, 9);
        assert_eq!(config.stickers.sand_regeneration(), Duration::from_millis(1500));
        assert_eq!(
            config.stickers.inventory,
            vec![StickerChoice::Sand, StickerChoice::Block]
        );
    }
}
