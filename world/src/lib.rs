#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Tilestrike.
//!
//! The [`MapMatrix`] records what occupies every tile of the level, the
//! [`Entities`] arena owns the gameplay objects those tiles point at, and
//! [`GridFrame`] translates between tile indices and the continuous world
//! space renderers draw in. Tiles only ever hold non-owning [`EntityId`]
//! handles; removing an entity goes through the arena's deferred
//! destruction sweep.
//!
//! [`EntityId`]: tilestrike_core::EntityId

mod entities;
mod frame;
mod grid;
mod load;
mod stickers;

pub use entities::{Destructible, Enemy, Entities, Entity, Player, Visual};
pub use frame::{GridFrame, TILE_SIZE};
pub use grid::{MapMatrix, Tile};
pub use load::{MapLoadError, MapTag};
pub use stickers::{BlockState, Sticker, StickerKind, ROTATION_STEPS};
