//! Text rendering backend.

use std::{io::Write, time::Duration};

use anyhow::{Context, Result};
use tilestrike_core::TileStatus;
use tilestrike_rendering::{Presentation, RenderingBackend, Scene};

/// Glyph drawn for a tile of the provided status.
pub(crate) const fn glyph(status: TileStatus) -> char {
    match status {
        TileStatus::Empty => '.',
        TileStatus::Destructible => '%',
        TileStatus::Sticker => 's',
        TileStatus::Bumper => 'b',
        TileStatus::SandBlock => 'n',
        TileStatus::Enemy => 'E',
        TileStatus::Player => '@',
        TileStatus::Wall => '#',
    }
}

/// Draws scenes as character grids, top row first.
#[derive(Debug)]
pub(crate) struct AsciiBackend<W> {
    out: W,
    dt: Duration,
    frames: u64,
    render_every: u64,
}

impl<W: Write> AsciiBackend<W> {
    pub(crate) fn new(out: W, dt: Duration, frames: u64, render_every: u64) -> Self {
        Self {
            out,
            dt,
            frames,
            render_every,
        }
    }

    fn draw(&mut self, frame: u64, scene: &Scene) -> Result<()> {
        writeln!(self.out, "frame {frame}")?;
        for line in render(scene) {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }
}

impl<W: Write> RenderingBackend for AsciiBackend<W> {
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, &mut Scene) -> Result<bool>,
    {
        writeln!(self.out, "{}", presentation.title)?;
        let mut scene = presentation.scene;
        self.draw(0, &scene)?;

        for frame in 1..=self.frames {
            let keep_going = update_scene(self.dt, &mut scene)
                .with_context(|| format!("failed to update frame {frame}"))?;
            let scheduled = self.render_every > 0 && frame % self.render_every == 0;
            if scheduled || frame == self.frames || !keep_going {
                self.draw(frame, &scene)?;
            }
            if !keep_going {
                break;
            }
        }
        self.out.flush().context("failed to flush rendered frames")
    }
}

/// Renders a scene into text rows, top row first.
///
/// Sprites mark empty tiles with `*`, placement previews with `+`, and tiles
/// listed in the debug overlay print in upper case.
pub(crate) fn render(scene: &Scene) -> Vec<String> {
    let columns = scene.columns as usize;
    let mut rows: Vec<Vec<char>> = (0..scene.rows)
        .map(|_| Vec::with_capacity(columns))
        .collect();
    for quad in &scene.tiles {
        if let Some(row) = usize::try_from(quad.tile.y())
            .ok()
            .and_then(|index| rows.get_mut(index))
        {
            row.push(glyph(quad.status));
        }
    }

    for sprite in &scene.sprites {
        let tile = scene.tile_at(sprite.position);
        let Some(quad) = scene.tile(tile) else {
            continue;
        };
        if quad.status != TileStatus::Empty {
            continue;
        }
        if let Some(cell) = usize::try_from(tile.y())
            .ok()
            .and_then(|row| rows.get_mut(row))
            .and_then(|row| usize::try_from(tile.x()).ok().and_then(|x| row.get_mut(x)))
        {
            *cell = if sprite.preview { '+' } else { '*' };
        }
    }

    for quad in &scene.debug_overlay {
        if let Some(cell) = usize::try_from(quad.tile.y())
            .ok()
            .and_then(|row| rows.get_mut(row))
            .and_then(|row| usize::try_from(quad.tile.x()).ok().and_then(|x| row.get_mut(x)))
        {
            *cell = cell.to_ascii_uppercase();
        }
    }

    rows.into_iter()
        .rev()
        .map(|row| row.into_iter().collect())
        .collect()
}
