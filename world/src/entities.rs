use glam::Vec2;
use tilestrike_core::{Color, EntityId, SpriteHandle, TilePos};

use crate::Sticker;

/// The player avatar.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Tile the player stands on.
    pub tile: TilePos,
    /// Whether the player faces towards increasing columns.
    pub facing_right: bool,
}

impl Player {
    /// Creates a player standing on the provided tile, facing right.
    #[must_use]
    pub const fn new(tile: TilePos) -> Self {
        Self {
            tile,
            facing_right: true,
        }
    }
}

/// Hostile entity that actions can damage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    tile: TilePos,
    health: u32,
}

impl Enemy {
    /// Creates an enemy on the provided tile.
    #[must_use]
    pub const fn new(tile: TilePos, health: u32) -> Self {
        Self { tile, health }
    }

    /// Tile the enemy stands on.
    #[must_use]
    pub const fn tile(&self) -> TilePos {
        self.tile
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Subtracts damage from the enemy's health, returning `true` once it reaches zero.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }
}

/// Breakable scenery occupying a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Destructible {
    /// Tile the scenery occupies.
    pub tile: TilePos,
}

impl Destructible {
    /// Creates breakable scenery on the provided tile.
    #[must_use]
    pub const fn new(tile: TilePos) -> Self {
        Self { tile }
    }
}

/// Renderable quad positioned in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct Visual {
    /// Sprite drawn for the quad.
    pub sprite: SpriteHandle,
    /// Centre of the quad in world units.
    pub position: Vec2,
    /// Rotation around the centre in radians.
    pub rotation: f32,
    /// Size multiplier applied to the sprite's tile-sized quad.
    pub scale: Vec2,
    /// Whether the sprite is drawn unmirrored.
    pub facing_right: bool,
    /// Tint multiplied into the sprite.
    pub color: Color,
    /// Whether the quad is drawn during normal rendering.
    pub visible: bool,
    /// Draws the quad even while it is not visible, for placement previews.
    pub force_render: bool,
}

impl Visual {
    /// Creates a visible, untinted, unrotated quad at the provided position.
    #[must_use]
    pub fn new(sprite: SpriteHandle, position: Vec2) -> Self {
        Self {
            sprite,
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
            facing_right: true,
            color: Color::WHITE,
            visible: true,
            force_render: false,
        }
    }

    /// Reports whether renderers should draw the quad this frame.
    #[must_use]
    pub const fn is_drawn(&self) -> bool {
        self.visible || self.force_render
    }
}

/// Every kind of object the arena can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    /// The player avatar.
    Player(Player),
    /// A hostile entity.
    Enemy(Enemy),
    /// Breakable scenery.
    Destructible(Destructible),
    /// A free-standing renderable owned by an effect.
    Visual(Visual),
    /// A placed sticker.
    Sticker(Sticker),
}

impl Entity {
    /// Returns the enemy payload, if this entity is an enemy.
    #[must_use]
    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Returns the sticker payload, if this entity is a sticker.
    #[must_use]
    pub fn as_sticker(&self) -> Option<&Sticker> {
        match self {
            Self::Sticker(sticker) => Some(sticker),
            _ => None,
        }
    }

    /// Returns the mutable sticker payload, if this entity is a sticker.
    #[must_use]
    pub fn as_sticker_mut(&mut self) -> Option<&mut Sticker> {
        match self {
            Self::Sticker(sticker) => Some(sticker),
            _ => None,
        }
    }

    /// Returns the player payload, if this entity is the player.
    #[must_use]
    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Returns the renderable quad attached to the entity, if it has one.
    #[must_use]
    pub fn visual(&self) -> Option<&Visual> {
        match self {
            Self::Visual(visual) => Some(visual),
            Self::Sticker(sticker) => Some(sticker.visual()),
            _ => None,
        }
    }

    /// Returns the mutable renderable quad attached to the entity, if it has one.
    #[must_use]
    pub fn visual_mut(&mut self) -> Option<&mut Visual> {
        match self {
            Self::Visual(visual) => Some(visual),
            Self::Sticker(sticker) => Some(sticker.visual_mut()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
    doomed: bool,
}

/// Generational arena owning every gameplay entity.
///
/// Destruction is deferred: [`Entities::mark_for_destruction`] only flags an
/// entity, which stays readable until the next [`Entities::sweep`]. Swept
/// slots are reused with a bumped generation so stale handles never resolve.
#[derive(Clone, Debug, Default)]
pub struct Entities {
    slots: Vec<Slot>,
    free: Vec<u32>,
    doomed: Vec<EntityId>,
}

impl Entities {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entity and returns its handle.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            return EntityId::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
            doomed: false,
        });
        EntityId::new(index, 0)
    }

    /// Handle the next call to [`Entities::spawn`] will return.
    #[must_use]
    pub fn vacant_id(&self) -> EntityId {
        match self.free.last() {
            Some(&index) => EntityId::new(index, self.slots[index as usize].generation),
            None => EntityId::new(u32::try_from(self.slots.len()).unwrap_or(u32::MAX), 0),
        }
    }

    /// Resolves a handle to its entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_ref())
    }

    /// Resolves a handle to its mutable entity.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_mut())
    }

    /// Reports whether the handle resolves to a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Flags an entity for removal at the next sweep.
    ///
    /// Returns `false` for stale handles and entities that are already marked.
    pub fn mark_for_destruction(&mut self, id: EntityId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation() && slot.entity.is_some())
        else {
            return false;
        };
        if slot.doomed {
            return false;
        }

        slot.doomed = true;
        self.doomed.push(id);
        true
    }

    /// Reports whether the entity is waiting for the next sweep.
    #[must_use]
    pub fn is_marked(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.generation == id.generation() && slot.doomed)
    }

    /// Removes every marked entity, returning the handles that were freed.
    pub fn sweep(&mut self) -> Vec<EntityId> {
        let swept: Vec<EntityId> = self.doomed.drain(..).collect();
        for id in &swept {
            let slot = &mut self.slots[id.index() as usize];
            slot.entity = None;
            slot.doomed = false;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index());
        }
        swept
    }

    /// Iterates over live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity
                .as_ref()
                .map(|entity| (EntityId::new(index as u32, slot.generation), entity))
        })
    }

    /// Iterates mutably over live entities in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.entity
                .as_mut()
                .map(|entity| (EntityId::new(index as u32, generation), entity))
        })
    }

    /// Number of live entities, marked ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entity.is_some()).count()
    }

    /// Reports whether the arena holds no live entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(x: i32) -> Entity {
        Entity::Enemy(Enemy::new(TilePos::new(x, 0), 3))
    }

    #[test]
    fn marked_entities_survive_until_sweep() {
        let mut entities = Entities::new();
        let id = entities.spawn(enemy(0));

        assert!(entities.mark_for_destruction(id));
        assert!(!entities.mark_for_destruction(id), "second mark is a no-op");
        assert!(entities.contains(id));

        assert_eq!(entities.sweep(), vec![id]);
        assert!(!entities.contains(id));
        assert!(entities.is_empty());
    }

    #[test]
    fn reused_slots_invalidate_stale_handles() {
        let mut entities = Entities::new();
        let first = entities.spawn(enemy(0));
        let _ = entities.mark_for_destruction(first);
        let _ = entities.sweep();

        let predicted = entities.vacant_id();
        let second = entities.spawn(enemy(1));

        assert_eq!(predicted, second);
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(entities.get(first).is_none());
        assert!(!entities.mark_for_destruction(first));
        assert!(entities.get(second).is_some());
    }

    #[test]
    fn vacant_id_predicts_fresh_slots() {
        let mut entities = Entities::new();
        let _ = entities.spawn(enemy(0));
        let predicted = entities.vacant_id();
        assert_eq!(entities.spawn(enemy(1)), predicted);
    }

    #[test]
    fn enemies_report_defeat_at_zero_health() {
        let mut enemy = Enemy::new(TilePos::new(0, 0), 3);
        assert!(!enemy.apply_damage(2));
        assert!(enemy.apply_damage(5));
        assert_eq!(enemy.health(), 0);
    }

    #[test]
    fn iteration_skips_freed_slots() {
        let mut entities = Entities::new();
        let first = entities.spawn(enemy(0));
        let second = entities.spawn(enemy(1));
        let _ = entities.mark_for_destruction(first);
        let _ = entities.sweep();

        let ids: Vec<EntityId> = entities.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![second]);
        assert_eq!(entities.iter_mut().count(), 1);
    }
}
