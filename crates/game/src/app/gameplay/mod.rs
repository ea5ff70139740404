use std::collections::{HashMap, HashSet, VecDeque};

use engine::{
    CardinalFacing, EntityId, HudFrame, InputAction, InputSnapshot, MenuPanel, MotionClip, Rect,
    Renderable, RenderLayer, RgbRaster, Scene, SceneCommand, SceneKey, SceneWorld, Tilemap, Vec2,
};
use tracing::{debug, info, warn};

use super::config::{DeathTuning, EnemyTuning, GameplayConfig, PlayerTuning};

pub(crate) const TILE_SIZE_PX: u32 = 32;
pub(crate) const OVERWORLD_MAP_FILE: &str = "overworld.png";

const COLLISION_CORNER_MARGIN_PX: f32 = 2.0;
const SPAWN_SEARCH_MAX_RADIUS_TILES: i32 = 10;
const DEFAULT_SPAWN_TILE: (i32, i32) = (1, 1);
const CHEST_INTERACTION_RADIUS_PX: f32 = 40.0;
const INVENTORY_CAPACITY: usize = 20;
const HUD_LOG_CAPACITY: usize = 4;
const HUD_LOG_TTL_SECONDS: f64 = 4.0;
const SPRITE_DEATH_CLIP_SECONDS: f32 = 0.8;
const RARE_CHEST_CHANCE: f64 = 0.2;
const BASIC_CHEST_ROLLS: usize = 2;
const RARE_CHEST_ROLLS: usize = 3;
const XP_CURVE_FIRST_LEVEL: i32 = 100;
const LEVEL_UP_MAX_HEALTH_BONUS: i32 = 10;
const PLAYER_COLOR: [u8; 4] = [0, 128, 255, 255];
const GOBLIN_COLOR: [u8; 4] = [100, 255, 100, 255];
const OGRE_COLOR: [u8; 4] = [200, 100, 100, 255];
const CHEST_CLOSED_COLOR: [u8; 4] = [200, 200, 0, 255];
const CHEST_OPENED_COLOR: [u8; 4] = [120, 120, 40, 255];

/// Offsets, in pixels from the player spawn, where the starting enemy pack
/// appears. Near ones are visible immediately, far ones exercise pursuit.
const ENEMY_SPAWN_OFFSETS_PX: [(f32, f32, EnemyKind); 10] = [
    (100.0, 80.0, EnemyKind::Goblin),
    (80.0, -100.0, EnemyKind::Goblin),
    (-120.0, 60.0, EnemyKind::Goblin),
    (-80.0, -80.0, EnemyKind::Goblin),
    (200.0, 150.0, EnemyKind::Goblin),
    (150.0, -180.0, EnemyKind::Goblin),
    (-180.0, 120.0, EnemyKind::Goblin),
    (-150.0, -150.0, EnemyKind::Goblin),
    (350.0, 200.0, EnemyKind::Ogre),
    (300.0, -250.0, EnemyKind::Ogre),
];

include!("types.rs");
include!("map.rs");
include!("movement.rs");
include!("combat.rs");
include!("ai.rs");
include!("loot.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn build_overworld_scene(
    map: WorldMap,
    config: GameplayConfig,
) -> Box<dyn Scene> {
    Box::new(OverworldScene::new(map, config))
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
