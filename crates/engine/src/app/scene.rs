use thiserror::Error;

use super::input::{ActionStates, InputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Title,
    Overworld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    Quit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle in world pixels, top-left anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.w / 2.0,
            y: self.y + self.h / 2.0,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardinalFacing {
    North,
    #[default]
    South,
    East,
    West,
}

/// Camera center in world pixels. One world pixel maps to one screen pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub position: Vec2,
}

/// The clip an external animation layer should play for an entity. The
/// simulation only writes this; it never reads animation progress back except
/// through the finished flags the gameplay crate tracks itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionClip {
    #[default]
    Idle,
    Walk,
    Attack,
    Hurt,
    Death,
    Corpse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntityVisual {
    pub facing: CardinalFacing,
    pub clip: MotionClip,
    /// Some(fraction) draws a health bar above the entity when below full.
    pub health_fraction: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    ColorRect { color: [u8; 4] },
    Sprite { key: String, fallback: [u8; 4] },
}

/// Draw order, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderLayer {
    Ground,
    Object,
    Corpse,
    Actor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec2,
    pub size: Vec2,
    pub layer: RenderLayer,
    pub renderable: Renderable,
    pub visual: EntityVisual,
    pub debug_name: &'static str,
}

impl Entity {
    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.position.x,
            y: self.position.y,
            w: self.size.x,
            h: self.size.y,
        }
    }
}

#[derive(Debug, Default)]
struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Display-only tile grid built by the game from its decoded world map.
/// Tile (x, y) occupies world pixels [x*tile, (x+1)*tile) × [y*tile, (y+1)*tile).
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    tile_size_px: u32,
    width: u32,
    height: u32,
    colors: Vec<[u8; 4]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

impl Tilemap {
    pub fn new(
        tile_size_px: u32,
        width: u32,
        height: u32,
        colors: Vec<[u8; 4]>,
    ) -> Result<Self, TilemapError> {
        let expected = width as usize * height as usize;
        let actual = colors.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            tile_size_px,
            width,
            height,
            colors,
        })
    }

    pub fn tile_size_px(&self) -> u32 {
        self.tile_size_px
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.colors
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    attack_pressed: bool,
    interact_pressed: bool,
    inventory_pressed: bool,
    confirm_pressed: bool,
    cancel_pressed: bool,
    move_up_pressed: bool,
    move_down_pressed: bool,
    weapon_slot_pressed: Option<u8>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn attack_pressed(&self) -> bool {
        self.attack_pressed
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn inventory_pressed(&self) -> bool {
        self.inventory_pressed
    }

    pub fn confirm_pressed(&self) -> bool {
        self.confirm_pressed
    }

    pub fn cancel_pressed(&self) -> bool {
        self.cancel_pressed
    }

    pub fn move_up_pressed(&self) -> bool {
        self.move_up_pressed
    }

    pub fn move_down_pressed(&self) -> bool {
        self.move_down_pressed
    }

    pub fn weapon_slot_pressed(&self) -> Option<u8> {
        self.weapon_slot_pressed
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_attack_pressed(mut self, pressed: bool) -> Self {
        self.attack_pressed = pressed;
        self
    }

    pub fn with_interact_pressed(mut self, pressed: bool) -> Self {
        self.interact_pressed = pressed;
        self
    }

    pub fn with_inventory_pressed(mut self, pressed: bool) -> Self {
        self.inventory_pressed = pressed;
        self
    }

    pub fn with_confirm_pressed(mut self, pressed: bool) -> Self {
        self.confirm_pressed = pressed;
        self
    }

    pub fn with_cancel_pressed(mut self, pressed: bool) -> Self {
        self.cancel_pressed = pressed;
        self
    }

    pub fn with_move_up_pressed(mut self, pressed: bool) -> Self {
        self.move_up_pressed = pressed;
        self
    }

    pub fn with_move_down_pressed(mut self, pressed: bool) -> Self {
        self.move_down_pressed = pressed;
        self
    }

    pub fn with_weapon_slot_pressed(mut self, slot: Option<u8>) -> Self {
        self.weapon_slot_pressed = slot;
        self
    }
}

/// Render-facing UI model a scene hands to the renderer each frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudFrame {
    pub lines: Vec<String>,
    pub log: Vec<String>,
    pub menu: Option<MenuPanel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuPanel {
    pub title: String,
    pub entries: Vec<String>,
    pub selected: usize,
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    camera: Camera2D,
    tilemap: Option<Tilemap>,
}

impl SceneWorld {
    pub fn spawn(
        &mut self,
        position: Vec2,
        size: Vec2,
        layer: RenderLayer,
        renderable: Renderable,
        debug_name: &'static str,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            position,
            size,
            layer,
            renderable,
            visual: EntityVisual::default(),
            debug_name,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.pending_spawns.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            self.entities.append(&mut self.pending_spawns);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.camera = Camera2D::default();
        self.tilemap = None;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn hud(&self, _world: &SceneWorld) -> Option<HudFrame> {
        None
    }
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

pub(crate) struct SceneMachine {
    title: SceneRuntime,
    overworld: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(
        title: Box<dyn Scene>,
        overworld: Box<dyn Scene>,
        active_scene: SceneKey,
    ) -> Self {
        Self {
            title: SceneRuntime {
                scene: title,
                world: SceneWorld::default(),
                is_loaded: false,
            },
            overworld: SceneRuntime {
                scene: overworld,
                world: SceneWorld::default(),
                is_loaded: false,
            },
            active_scene,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn load_active(&mut self) {
        if self.active_runtime_ref().is_loaded {
            return;
        }
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.load(world);
        runtime.is_loaded = true;
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.update(fixed_dt_seconds, input, world)
    }

    pub(crate) fn apply_pending_active(&mut self) {
        self.active_runtime_mut().world.apply_pending();
    }

    pub(crate) fn active_world(&self) -> &SceneWorld {
        &self.active_runtime_ref().world
    }

    pub(crate) fn hud_active(&self) -> Option<HudFrame> {
        let runtime = self.active_runtime_ref();
        runtime.scene.hud(&runtime.world)
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        let runtime = self.active_runtime_ref();
        runtime.scene.debug_title(&runtime.world)
    }

    pub(crate) fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        if self.active_scene == next_scene {
            return false;
        }

        self.load_scene_if_needed(next_scene);
        self.active_scene = next_scene;
        true
    }

    pub(crate) fn shutdown_all(&mut self) {
        for runtime in [&mut self.title, &mut self.overworld] {
            if runtime.is_loaded {
                let (scene, world) = (&mut runtime.scene, &mut runtime.world);
                scene.unload(world);
                runtime.world.clear();
                runtime.is_loaded = false;
            }
        }
    }

    fn load_scene_if_needed(&mut self, key: SceneKey) {
        if self.runtime_ref(key).is_loaded {
            return;
        }
        let runtime = self.runtime_mut(key);
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.load(world);
        runtime.is_loaded = true;
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Title => &self.title,
            SceneKey::Overworld => &self.overworld,
        }
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Title => &mut self.title,
            SceneKey::Overworld => &mut self.overworld,
        }
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        self.runtime_ref(self.active_scene)
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        let key = self.active_scene;
        self.runtime_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_marker(world: &mut SceneWorld, name: &'static str) -> EntityId {
        world.spawn(
            Vec2 { x: 0.0, y: 0.0 },
            Vec2 { x: 32.0, y: 32.0 },
            RenderLayer::Actor,
            Renderable::ColorRect {
                color: [255, 255, 255, 255],
            },
            name,
        )
    }

    #[test]
    fn spawns_are_deferred_until_apply_pending() {
        let mut world = SceneWorld::default();
        let id = spawn_marker(&mut world, "deferred");
        assert_eq!(world.entity_count(), 0);

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(id).is_some());
    }

    #[test]
    fn despawn_of_pending_spawn_cancels_it() {
        let mut world = SceneWorld::default();
        let id = spawn_marker(&mut world, "cancelled");
        assert!(world.despawn(id));

        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn duplicate_despawns_are_deduplicated() {
        let mut world = SceneWorld::default();
        let keep = spawn_marker(&mut world, "keep");
        let drop = spawn_marker(&mut world, "drop");
        world.apply_pending();

        assert!(world.despawn(drop));
        assert!(world.despawn(drop));
        world.apply_pending();

        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(keep).is_some());
        assert!(world.find_entity(drop).is_none());
    }

    #[test]
    fn despawn_of_unknown_id_is_rejected() {
        let mut world = SceneWorld::default();
        assert!(!world.despawn(EntityId(99)));
    }

    #[test]
    fn rect_intersection_is_exclusive_at_edges() {
        let a = Rect::new(0.0, 0.0, 32.0, 32.0);
        let touching = Rect::new(32.0, 0.0, 32.0, 32.0);
        let overlapping = Rect::new(31.0, 0.0, 32.0, 32.0);
        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
        assert!(overlapping.intersects(&a));
    }

    #[test]
    fn rect_center_is_midpoint() {
        let rect = Rect::new(32.0, 64.0, 32.0, 32.0);
        let center = rect.center();
        assert_eq!(center, Vec2 { x: 48.0, y: 80.0 });
    }

    #[test]
    fn tilemap_rejects_count_mismatch() {
        let result = Tilemap::new(32, 3, 3, vec![[0, 0, 0, 255]; 8]);
        assert_eq!(
            result,
            Err(TilemapError::TileCountMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn tilemap_color_lookup_is_row_major() {
        let mut colors = vec![[0, 0, 0, 255]; 6];
        colors[1 * 3 + 2] = [9, 9, 9, 255];
        let tilemap = Tilemap::new(32, 3, 2, colors).expect("tilemap");
        assert_eq!(tilemap.color_at(2, 1), Some([9, 9, 9, 255]));
        assert_eq!(tilemap.color_at(3, 0), None);
    }

    struct CountingScene {
        loads: u32,
        command: SceneCommand,
    }

    impl CountingScene {
        fn new(command: SceneCommand) -> Self {
            Self { loads: 0, command }
        }
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.loads += 1;
            world.spawn(
                Vec2::default(),
                Vec2 { x: 1.0, y: 1.0 },
                RenderLayer::Actor,
                Renderable::ColorRect {
                    color: [255, 255, 255, 255],
                },
                "marker",
            );
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            self.command
        }

        fn unload(&mut self, _world: &mut SceneWorld) {
            assert!(self.loads > 0, "unload without a prior load");
        }
    }

    #[test]
    fn scene_machine_loads_lazily_and_switches() {
        let mut machine = SceneMachine::new(
            Box::new(CountingScene::new(SceneCommand::None)),
            Box::new(CountingScene::new(SceneCommand::None)),
            SceneKey::Title,
        );
        machine.load_active();
        assert_eq!(machine.active_scene(), SceneKey::Title);

        assert!(machine.switch_to(SceneKey::Overworld));
        assert_eq!(machine.active_scene(), SceneKey::Overworld);
        assert!(!machine.switch_to(SceneKey::Overworld));
    }

    #[test]
    fn scene_machine_shutdown_unloads_loaded_scenes_once() {
        let mut machine = SceneMachine::new(
            Box::new(CountingScene::new(SceneCommand::None)),
            Box::new(CountingScene::new(SceneCommand::None)),
            SceneKey::Title,
        );
        machine.load_active();
        machine.switch_to(SceneKey::Overworld);
        machine.shutdown_all();
        machine.shutdown_all();

        assert!(!machine.title.is_loaded);
        assert!(!machine.overworld.is_loaded);
        assert_eq!(machine.title.world.entity_count(), 0);
        assert_eq!(machine.overworld.world.entity_count(), 0);
    }
}
