use std::time::Duration;

use glam::Vec2;
use tilestrike_core::{
    ActionPhase, ActionProfile, ActionProfiles, ActionType, EntityId, Event, SpriteCatalog,
    SpriteHandle, TilePos, TileStatus,
};
use tilestrike_system_actions::{ActionContext, ActionManager};
use tilestrike_system_effects::EffectManager;
use tilestrike_world::{
    BlockState, Destructible, Enemy, Entities, Entity, GridFrame, MapMatrix, Sticker, StickerKind,
    Visual,
};

struct Catalog;

impl SpriteCatalog for Catalog {
    fn acquire(&self, name: &str) -> Option<SpriteHandle> {
        (name == "slash").then(|| SpriteHandle::new(7))
    }
}

struct World {
    map: MapMatrix,
    entities: Entities,
    effects: EffectManager,
}

impl World {
    fn new() -> Self {
        Self {
            map: MapMatrix::new(5, 3, GridFrame::default()),
            entities: Entities::new(),
            effects: EffectManager::new(),
        }
    }

    fn ctx(&mut self) -> ActionContext<'_, Catalog> {
        ActionContext {
            map: &mut self.map,
            entities: &mut self.entities,
            effects: &mut self.effects,
            catalog: &Catalog,
        }
    }

    fn place_enemy(&mut self, tile: TilePos, health: u32) -> EntityId {
        let id = self.entities.spawn(Entity::Enemy(Enemy::new(tile, health)));
        self.map.set_tile(tile, TileStatus::Enemy, Some(id));
        id
    }

    fn health(&self, enemy: EntityId) -> u32 {
        match self.entities.get(enemy) {
            Some(Entity::Enemy(enemy)) => enemy.health(),
            other => panic!("expected an enemy, found {other:?}"),
        }
    }
}

fn one_second_phases() -> ActionProfiles {
    let mut profiles = ActionProfiles::default();
    profiles.set(
        ActionType::Slash,
        ActionProfile {
            startup_secs: 1.0,
            active_secs: 1.0,
            ending_secs: 1.0,
            resource_cost: 0,
            damage: 1,
            hit_offset: [1, 0],
            effect: None,
        },
    );
    profiles
}

const ORIGIN: TilePos = TilePos::new(1, 1);

fn start_slash(manager: &mut ActionManager, world: &mut World, facing_right: bool) -> Vec<Event> {
    let mut events = Vec::new();
    manager.start_action(
        ActionType::Slash,
        ORIGIN,
        facing_right,
        &mut world.ctx(),
        &mut events,
    );
    events
}

fn step(manager: &mut ActionManager, world: &mut World, millis: u64) -> Vec<Event> {
    let mut events = Vec::new();
    manager.update_actions(Duration::from_millis(millis), &mut world.ctx(), &mut events);
    events
}

fn hits(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::EnemyHit { .. }))
        .count()
}

#[test]
fn idle_manager_ignores_updates() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();

    assert_eq!(manager.current_action_status(), ActionPhase::Idle);
    assert!(step(&mut manager, &mut world, 5_000).is_empty());
    assert!(manager.current_action().is_none());
}

#[test]
fn phases_advance_one_per_update_without_carry_over() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let _ = start_slash(&mut manager, &mut world, true);
    assert_eq!(manager.current_action_status(), ActionPhase::Startup);

    let events = step(&mut manager, &mut world, 5_000);
    assert_eq!(manager.current_action_status(), ActionPhase::Active);
    assert_eq!(
        manager.current_action().map(|action| action.phase_time_remaining()),
        Some(Duration::from_secs(1)),
        "the next phase starts with its full duration"
    );
    assert_eq!(
        events,
        vec![Event::ActionPhaseChanged {
            action: ActionType::Slash,
            phase: ActionPhase::Active,
        }]
    );

    let _ = step(&mut manager, &mut world, 5_000);
    assert_eq!(manager.current_action_status(), ActionPhase::Ending);

    let events = step(&mut manager, &mut world, 5_000);
    assert_eq!(manager.current_action_status(), ActionPhase::Idle);
    assert_eq!(events, vec![Event::ActionFinished { action: ActionType::Slash }]);
}

#[test]
fn partial_updates_stay_in_the_current_phase() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let _ = start_slash(&mut manager, &mut world, true);

    assert!(step(&mut manager, &mut world, 400).is_empty());
    assert!(step(&mut manager, &mut world, 400).is_empty());
    assert_eq!(manager.current_action_status(), ActionPhase::Startup);
    let _ = step(&mut manager, &mut world, 200);
    assert_eq!(manager.current_action_status(), ActionPhase::Active);
}

#[test]
fn action_length_sums_every_phase() {
    let manager = ActionManager::with_profiles(one_second_phases());
    assert_eq!(manager.action_length(ActionType::Slash), Duration::from_secs(3));
}

#[test]
fn enemies_are_hit_once_per_activation() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let enemy = world.place_enemy(TilePos::new(2, 1), 5);
    let _ = start_slash(&mut manager, &mut world, true);

    assert_eq!(hits(&step(&mut manager, &mut world, 1_000)), 1);
    assert_eq!(hits(&step(&mut manager, &mut world, 300)), 0);
    assert_eq!(hits(&step(&mut manager, &mut world, 300)), 0);
    assert_eq!(world.health(enemy), 4);
    assert!(manager
        .current_action()
        .is_some_and(|action| action.has_hit(enemy)));
}

#[test]
fn a_new_enemy_on_the_hit_tile_is_struck_once() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let tile = TilePos::new(2, 1);
    let first = world.place_enemy(tile, 5);
    let _ = start_slash(&mut manager, &mut world, true);
    assert_eq!(hits(&step(&mut manager, &mut world, 1_000)), 1);

    world.map.set_tile(tile, TileStatus::Empty, None);
    let second = world.place_enemy(tile, 5);

    let events = step(&mut manager, &mut world, 100);
    assert_eq!(hits(&events), 1, "the newcomer has not been hit yet");
    assert!(events.iter().any(|event| matches!(
        event,
        Event::EnemyHit { enemy, .. } if *enemy == second
    )));
    assert_eq!(hits(&step(&mut manager, &mut world, 100)), 0);
    assert_eq!(world.health(second), 4);
    assert_eq!(world.health(first), 4, "the first enemy is not struck again");
    assert_eq!(manager.current_action_status(), ActionPhase::Active);
}

#[test]
fn startup_never_hits() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let enemy = world.place_enemy(TilePos::new(2, 1), 5);
    let _ = start_slash(&mut manager, &mut world, true);

    assert_eq!(hits(&step(&mut manager, &mut world, 900)), 0);
    assert_eq!(world.health(enemy), 5);
}

#[test]
fn restarting_clears_the_hit_set() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let enemy = world.place_enemy(TilePos::new(2, 1), 5);

    let _ = start_slash(&mut manager, &mut world, true);
    let _ = step(&mut manager, &mut world, 1_000);
    let _ = start_slash(&mut manager, &mut world, true);
    assert_eq!(manager.current_action_status(), ActionPhase::Startup);
    let _ = step(&mut manager, &mut world, 1_000);

    assert_eq!(world.health(enemy), 3);
}

#[test]
fn facing_left_mirrors_the_hit_tile() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let behind = world.place_enemy(TilePos::new(2, 1), 5);
    let ahead = world.place_enemy(TilePos::new(0, 1), 5);
    let _ = start_slash(&mut manager, &mut world, false);

    let _ = step(&mut manager, &mut world, 1_000);

    assert_eq!(world.health(ahead), 4);
    assert_eq!(world.health(behind), 5);
}

#[test]
fn defeated_enemies_vacate_their_tile() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let tile = TilePos::new(2, 1);
    let enemy = world.place_enemy(tile, 1);
    let _ = start_slash(&mut manager, &mut world, true);

    let events = step(&mut manager, &mut world, 1_000);

    assert_eq!(world.map.get_tile(tile).status(), TileStatus::Empty);
    assert!(world.entities.is_marked(enemy));
    assert!(events.contains(&Event::EnemyDefeated { enemy, tile }));
}

#[test]
fn destructibles_are_cleared_on_contact() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let tile = TilePos::new(2, 1);
    let scenery = world
        .entities
        .spawn(Entity::Destructible(Destructible::new(tile)));
    world.map.set_tile(tile, TileStatus::Destructible, Some(scenery));
    let _ = start_slash(&mut manager, &mut world, true);

    let events = step(&mut manager, &mut world, 1_000);

    assert_eq!(world.map.get_tile(tile).status(), TileStatus::Empty);
    assert!(world.entities.is_marked(scenery));
    assert!(events.contains(&Event::TileCleared {
        tile,
        occupant: Some(scenery)
    }));
}

#[test]
fn sand_blocks_break_but_survive() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let tile = TilePos::new(2, 1);
    let mut block = Sticker::new(
        StickerKind::Block(BlockState::new(true, Duration::from_secs(2))),
        Visual::new(SpriteHandle::new(3), Vec2::ZERO),
    );
    block.mark_placed(tile);
    let sticker = world.entities.spawn(Entity::Sticker(block));
    world.map.set_tile(tile, TileStatus::SandBlock, Some(sticker));
    let _ = start_slash(&mut manager, &mut world, true);

    let events = step(&mut manager, &mut world, 1_000);

    assert_eq!(world.map.get_tile(tile).status(), TileStatus::Empty);
    assert!(!world.entities.is_marked(sticker), "broken blocks wait to regenerate");
    let broken = world
        .entities
        .get(sticker)
        .and_then(Entity::as_sticker)
        .map(|sticker| matches!(sticker.kind(), StickerKind::Block(state) if state.is_broken()));
    assert_eq!(broken, Some(true));
    assert!(events.contains(&Event::StickerBroken { sticker, tile }));
}

#[test]
fn regenerated_sand_blocks_break_once_per_activation() {
    let mut manager = ActionManager::with_profiles(one_second_phases());
    let mut world = World::new();
    let tile = TilePos::new(2, 1);
    let mut block = Sticker::new(
        StickerKind::Block(BlockState::new(true, Duration::from_millis(100))),
        Visual::new(SpriteHandle::new(3), Vec2::ZERO),
    );
    block.mark_placed(tile);
    let sticker = world.entities.spawn(Entity::Sticker(block));
    world.map.set_tile(tile, TileStatus::SandBlock, Some(sticker));
    let _ = start_slash(&mut manager, &mut world, true);

    let events = step(&mut manager, &mut world, 1_000);
    assert!(events.contains(&Event::StickerBroken { sticker, tile }));

    if let Some(block) = world
        .entities
        .get_mut(sticker)
        .and_then(Entity::as_sticker_mut)
    {
        block.restore();
    }
    world.map.set_tile(tile, TileStatus::SandBlock, Some(sticker));

    let events = step(&mut manager, &mut world, 100);
    assert_eq!(manager.current_action_status(), ActionPhase::Active);
    assert!(
        !events.contains(&Event::StickerBroken { sticker, tile }),
        "a block already broken by this swing survives the rest of it"
    );
    assert_eq!(world.map.get_tile(tile).status(), TileStatus::SandBlock);
}

#[test]
fn starting_spawns_the_mirrored_effect() {
    let mut manager = ActionManager::new();
    let mut world = World::new();

    let events = start_slash(&mut manager, &mut world, false);

    assert_eq!(world.effects.len(), 1);
    let visual = world.effects.effects()[0].visual();
    let drawn = world
        .entities
        .get(visual)
        .and_then(Entity::visual)
        .expect("effect visual");
    assert_eq!(drawn.position, Vec2::new(0.0, 2.0), "one tile behind the origin column");
    assert!(!drawn.facing_right);
    assert_eq!(
        events.first(),
        Some(&Event::ActionStarted {
            action: ActionType::Slash,
            origin: ORIGIN,
            facing_right: false,
        })
    );
}

#[test]
fn missing_effect_sprites_do_not_block_the_action() {
    let mut manager = ActionManager::new();
    let mut world = World::new();
    let mut events = Vec::new();

    manager.start_action(ActionType::Smash, ORIGIN, true, &mut world.ctx(), &mut events);

    assert_eq!(manager.current_action_status(), ActionPhase::Startup);
    assert!(world.effects.is_empty());
    assert!(world.entities.is_empty());
}
