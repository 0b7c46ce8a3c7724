//! Text map loader.
//!
//! A map description starts with a `<width>,<height>` header followed by
//! `height` rows of `width` two-character cells. The first text row is the
//! top of the level, so the last row becomes row zero. The character at the
//! even offset of every cell is its tag: `w` walls, `p` the player spawn,
//! `0` (or a blank) empty floor. Any other tag is handed back to the caller,
//! which decides what entity it stands for.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tilestrike_core::{TilePos, TileStatus};
use tracing::info;

use crate::{grid::tile_capacity, MapMatrix, Tile};

/// Uninterpreted map tag and the tile it was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapTag {
    /// Tag character read from the map description.
    pub tag: char,
    /// Tile the tag was read for.
    pub tile: TilePos,
}

/// Reasons a map description could not be loaded.
#[derive(Debug, Error)]
pub enum MapLoadError {
    /// The map file could not be read.
    #[error("failed to read map file {}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The description contained no header line.
    #[error("map description is empty")]
    MissingHeader,
    /// The header line was not a `<width>,<height>` pair.
    #[error("invalid map header `{0}`, expected `<width>,<height>`")]
    InvalidHeader(String),
    /// The description ended before every row was read.
    #[error("map description ends before text row {row} of {height}")]
    MissingRow {
        /// One-based text row that was missing.
        row: u32,
        /// Number of rows announced by the header.
        height: u32,
    },
    /// More than one tile is tagged as the player spawn.
    #[error("map description has a second player spawn at {second:?}, first at {first:?}")]
    DuplicatePlayerSpawn {
        /// Spawn read first.
        first: TilePos,
        /// Spawn that repeated it.
        second: TilePos,
    },
    /// A row was too short to hold a tag for every column.
    #[error("map line {line} holds {found} characters, expected at least {expected}")]
    ShortRow {
        /// One-based line number inside the description, header included.
        line: usize,
        /// Number of characters found on the line.
        found: usize,
        /// Minimum number of characters required.
        expected: usize,
    },
}

impl MapMatrix {
    /// Reads a map description from disk and loads it.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<Vec<MapTag>, MapLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MapLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from_text(&text)
    }

    /// Clears the grid and rebuilds it from a map description.
    ///
    /// Walls, the player spawn and empty floor are written directly; every
    /// other tag is returned with its coordinates for the caller to spawn.
    /// The grid is left untouched when the description is malformed.
    pub fn load_from_text(&mut self, text: &str) -> Result<Vec<MapTag>, MapLoadError> {
        let mut lines = text.lines();
        let header = lines.next().ok_or(MapLoadError::MissingHeader)?;
        let (width, height) = parse_header(header)?;

        let expected = usize::try_from(width)
            .unwrap_or(usize::MAX)
            .saturating_mul(2)
            .saturating_sub(1);
        let mut cells = Vec::new();
        let mut player_position = None;
        let mut tags = Vec::new();

        for text_row in 0..height {
            let line = lines.next().ok_or(MapLoadError::MissingRow {
                row: text_row + 1,
                height,
            })?;
            let row_cells: Vec<char> = line.chars().collect();
            if row_cells.len() < expected {
                return Err(MapLoadError::ShortRow {
                    line: text_row as usize + 2,
                    found: row_cells.len(),
                    expected,
                });
            }

            let row = height - 1 - text_row;
            for column in 0..width {
                let tile = TilePos::new(column as i32, row as i32);
                match row_cells[column as usize * 2] {
                    'w' => cells.push((tile, TileStatus::Wall)),
                    'p' => {
                        if let Some(first) = player_position.replace(tile) {
                            return Err(MapLoadError::DuplicatePlayerSpawn { first, second: tile });
                        }
                        cells.push((tile, TileStatus::Player));
                    }
                    '0' | ' ' => {}
                    tag => tags.push(MapTag { tag, tile }),
                }
            }
        }

        // Every announced row exists and is wide enough, so the grid size is
        // bounded by the length of the description.
        let mut tiles = vec![Tile::EMPTY; tile_capacity(width, height)];
        for (tile, status) in cells {
            let index = tile.y() as usize * width as usize + tile.x() as usize;
            tiles[index] = Tile::new(status, None);
        }

        self.replace(
            width,
            height,
            tiles,
            player_position.unwrap_or(TilePos::new(0, 0)),
        );
        info!(width, height, tags = tags.len(), "map loaded");
        Ok(tags)
    }
}

fn parse_header(header: &str) -> Result<(u32, u32), MapLoadError> {
    let invalid = || MapLoadError::InvalidHeader(header.to_owned());
    let (width, height) = header.split_once(',').ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if u64::from(width) * u64::from(height) > u64::from(u32::MAX) {
        return Err(invalid());
    }
    Ok((width, height))
}
