#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Tilestrike map in the terminal.
//!
//! The map is stepped a fixed number of frames with a constant delta while
//! an optional input script presses buttons, and the grid is printed as text.

mod ascii;
mod script;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tilestrike_core::{duration_from_secs, ActionType, Color};
use tilestrike_rendering::{Presentation, RenderingBackend, Scene, SpriteManifest};
use tilestrike_system_bootstrap::{GameConfig, Session, STICKER_SPRITES};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{ascii::AsciiBackend, script::InputScript};

#[derive(Debug, Parser)]
#[command(name = "tilestrike", about = "Play a Tilestrike map in the terminal")]
struct CliArgs {
    /// Map description to load.
    #[arg(long)]
    map: PathBuf,
    /// Game configuration TOML. Built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sprite manifest TOML. Conventional sprite paths apply when omitted.
    #[arg(long)]
    sprites: Option<PathBuf>,
    /// Input script with one line of input names per frame.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u64,
    /// Seconds simulated per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Print every Nth frame. Zero prints only the first and last frames.
    #[arg(long, default_value_t = 0)]
    render_every: u64,
}

/// Entry point for the Tilestrike command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };

    let profiles = config.action_profiles()?;
    let mut required: Vec<&str> = STICKER_SPRITES.to_vec();
    required.extend(
        ActionType::ALL
            .iter()
            .filter_map(|action| profiles.get(*action).effect.as_ref())
            .map(|cue| cue.sprite.as_str()),
    );
    let catalog = match &args.sprites {
        Some(path) => {
            let manifest = SpriteManifest::from_path(path)?;
            manifest.require(required.iter().copied())?;
            manifest
        }
        None => SpriteManifest::builtin(required.iter().copied()),
    };
    debug!(sprites = catalog.len(), "sprite catalog ready");

    let script = match &args.script {
        Some(path) => InputScript::from_path(path)?,
        None => InputScript::default(),
    };

    let mut session = Session::from_map_path(&args.map, &config, catalog)
        .with_context(|| format!("failed to start session on {}", args.map.display()))?;
    info!(
        map = %args.map.display(),
        width = session.map().width(),
        height = session.map().height(),
        "running session"
    );

    let title = format!("tilestrike: {}", args.map.display());
    let presentation = Presentation::new(
        title,
        Color::new(0.0, 0.0, 0.0, 1.0),
        Scene::capture(session.map(), session.entities()),
    );
    let backend = AsciiBackend::new(
        io::stdout().lock(),
        duration_from_secs(args.dt),
        args.frames,
        args.render_every,
    );

    let mut frame = 0_usize;
    backend.run(presentation, |dt, scene| {
        let input = script.frame(frame);
        for event in session.tick(dt, &input) {
            info!(frame, ?event, "event");
        }
        frame += 1;

        *scene = Scene::capture(session.map(), session.entities());
        if let Some(held) = session.inventory().selected() {
            scene.push_visual(held.visual());
        }
        Ok(true)
    })
}
