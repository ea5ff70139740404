#[derive(Debug, Clone, PartialEq, Eq)]
struct Weapon {
    name: &'static str,
    damage: i32,
}

impl Weapon {
    fn basic_sword() -> Self {
        Self {
            name: "Basic Sword",
            damage: 20,
        }
    }

    fn steel_sword() -> Self {
        Self {
            name: "Steel Sword",
            damage: 35,
        }
    }

    fn legendary_sword() -> Self {
        Self {
            name: "Legendary Sword",
            damage: 50,
        }
    }
}

/// Insertion order is acquisition order. The equipped weapon is referenced by
/// index, so it is a member of the inventory by construction.
#[derive(Debug, Clone, Default)]
struct Inventory {
    items: Vec<Weapon>,
    equipped: Option<usize>,
}

impl Inventory {
    fn add(&mut self, weapon: Weapon) -> bool {
        if self.items.len() >= INVENTORY_CAPACITY {
            return false;
        }
        self.items.push(weapon);
        true
    }

    fn equip(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.equipped = Some(index);
        true
    }

    fn unequip(&mut self) -> Option<&Weapon> {
        let index = self.equipped.take()?;
        self.items.get(index)
    }

    fn equipped_weapon(&self) -> Option<&Weapon> {
        self.equipped.and_then(|index| self.items.get(index))
    }

    fn items(&self) -> &[Weapon] {
        &self.items
    }

    fn is_full(&self) -> bool {
        self.items.len() >= INVENTORY_CAPACITY
    }
}

/// How an actor is presented. Simulation code never branches on this; only
/// the clip-completion query differs between variants.
#[derive(Debug, Clone, PartialEq)]
enum Presentation {
    ColorBlock { color: [u8; 4] },
    SpriteSheet { key: &'static str, fallback: [u8; 4] },
}

impl Presentation {
    fn renderable(&self) -> Renderable {
        match self {
            Presentation::ColorBlock { color } => Renderable::ColorRect { color: *color },
            Presentation::SpriteSheet { key, fallback } => Renderable::Sprite {
                key: (*key).to_string(),
                fallback: *fallback,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ClipPlayback {
    clip: MotionClip,
    elapsed_seconds: f32,
}

impl ClipPlayback {
    fn set_clip(&mut self, clip: MotionClip) {
        if self.clip != clip {
            self.clip = clip;
            self.elapsed_seconds = 0.0;
        }
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed_seconds += dt;
    }

    /// Whether the death clip has played out. Sprite sheets carry a finite
    /// death clip; a color block has none, so only the failsafe timer can
    /// finish the transition for it.
    fn death_clip_finished(&self, presentation: &Presentation) -> bool {
        if self.clip != MotionClip::Death {
            return false;
        }
        match presentation {
            Presentation::SpriteSheet { .. } => self.elapsed_seconds >= SPRITE_DEATH_CLIP_SECONDS,
            Presentation::ColorBlock { .. } => false,
        }
    }
}

#[derive(Debug, Clone)]
struct PlayerState {
    position: Vec2,
    size: Vec2,
    velocity: Vec2,
    speed: f32,
    health: i32,
    max_health: i32,
    level: u32,
    experience: i32,
    experience_to_next_level: i32,
    gold: u32,
    base_attack_damage: i32,
    attack_range: f32,
    attack_cooldown_seconds: f32,
    attack_active_seconds: f32,
    last_attack_time: f64,
    attack_start_time: f64,
    is_attacking: bool,
    enemies_hit_this_attack: HashSet<EntityId>,
    facing: CardinalFacing,
    inventory: Inventory,
}

impl PlayerState {
    fn new(tuning: &PlayerTuning, spawn_center: Vec2) -> Self {
        let size = Vec2 {
            x: tuning.size_px,
            y: tuning.size_px,
        };
        let mut inventory = Inventory::default();
        inventory.add(Weapon::basic_sword());
        inventory.equip(0);

        Self {
            inventory,
            position: Vec2 {
                x: spawn_center.x - size.x / 2.0,
                y: spawn_center.y - size.y / 2.0,
            },
            size,
            velocity: Vec2::default(),
            speed: tuning.speed,
            health: tuning.max_health,
            max_health: tuning.max_health,
            level: 1,
            experience: 0,
            experience_to_next_level: XP_CURVE_FIRST_LEVEL,
            gold: tuning.starting_gold,
            base_attack_damage: tuning.base_attack_damage,
            attack_range: tuning.attack_range,
            attack_cooldown_seconds: tuning.attack_cooldown_seconds,
            attack_active_seconds: tuning.attack_active_seconds,
            last_attack_time: -1.0,
            attack_start_time: 0.0,
            is_attacking: false,
            enemies_hit_this_attack: HashSet::new(),
            facing: CardinalFacing::South,
        }
    }

    fn body(&self) -> Rect {
        Rect {
            x: self.position.x,
            y: self.position.y,
            w: self.size.x,
            h: self.size.y,
        }
    }

    fn center(&self) -> Vec2 {
        self.body().center()
    }

    fn take_damage(&mut self, damage: i32) -> bool {
        self.health = (self.health - damage).max(0);
        self.health == 0
    }

    fn heal_to_full(&mut self) {
        self.health = self.max_health;
    }

    fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Applies experience and returns how many levels were gained.
    fn gain_experience(&mut self, amount: u32) -> u32 {
        self.experience = self.experience.saturating_add(amount as i32);
        let mut levels_gained = 0;
        while self.experience >= self.experience_to_next_level {
            self.experience -= self.experience_to_next_level;
            self.level += 1;
            self.max_health += LEVEL_UP_MAX_HEALTH_BONUS;
            self.health = self.max_health;
            self.experience_to_next_level = self.experience_to_next_level * 3 / 2;
            levels_gained += 1;
        }
        levels_gained
    }

    fn attack_damage(&self) -> i32 {
        let weapon_bonus = self
            .inventory
            .equipped_weapon()
            .map(|weapon| weapon.damage)
            .unwrap_or(0);
        self.base_attack_damage + weapon_bonus
    }

    fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EnemyKind {
    Goblin,
    Ogre,
}

impl EnemyKind {
    fn name(self) -> &'static str {
        match self {
            EnemyKind::Goblin => "goblin",
            EnemyKind::Ogre => "ogre",
        }
    }

    fn presentation(self) -> Presentation {
        match self {
            EnemyKind::Goblin => Presentation::SpriteSheet {
                key: "goblin",
                fallback: GOBLIN_COLOR,
            },
            EnemyKind::Ogre => Presentation::ColorBlock { color: OGRE_COLOR },
        }
    }
}

#[derive(Debug, Clone)]
struct EnemyState {
    kind: EnemyKind,
    position: Vec2,
    size: Vec2,
    velocity: Vec2,
    speed: f32,
    health: i32,
    max_health: i32,
    attack_damage: i32,
    experience_value: u32,
    detection_radius: f32,
    attack_range: f32,
    attack_cooldown_seconds: f32,
    last_attack_time: f64,
    ai_state: AiState,
    target: Option<EntityId>,
    is_alive: bool,
    is_corpse: bool,
    death_started_at: Option<f64>,
    corpse_started_at: Option<f64>,
    facing: CardinalFacing,
    presentation: Presentation,
    playback: ClipPlayback,
}

impl EnemyState {
    fn new(kind: EnemyKind, tuning: &EnemyTuning, center: Vec2) -> Self {
        let size = Vec2 {
            x: tuning.size_px,
            y: tuning.size_px,
        };
        Self {
            kind,
            position: Vec2 {
                x: center.x - size.x / 2.0,
                y: center.y - size.y / 2.0,
            },
            size,
            velocity: Vec2::default(),
            speed: tuning.speed,
            health: tuning.max_health,
            max_health: tuning.max_health,
            attack_damage: tuning.attack_damage,
            experience_value: tuning.experience_value,
            detection_radius: tuning.detection_radius,
            attack_range: tuning.attack_range,
            attack_cooldown_seconds: tuning.attack_cooldown_seconds,
            last_attack_time: -1.0,
            ai_state: AiState::Idle,
            target: None,
            is_alive: true,
            is_corpse: false,
            death_started_at: None,
            corpse_started_at: None,
            facing: CardinalFacing::South,
            presentation: kind.presentation(),
            playback: ClipPlayback::default(),
        }
    }

    fn body(&self) -> Rect {
        Rect {
            x: self.position.x,
            y: self.position.y,
            w: self.size.x,
            h: self.size.y,
        }
    }

    fn center(&self) -> Vec2 {
        self.body().center()
    }

    fn blocks_movement(&self) -> bool {
        self.is_alive
    }

    fn can_be_hit(&self) -> bool {
        self.is_alive && !self.is_corpse
    }

    /// Returns true when this damage started the death transition.
    fn take_damage(&mut self, damage: i32, now: f64) -> bool {
        if !self.is_alive {
            return false;
        }
        self.health = (self.health - damage).max(0);
        if self.health == 0 {
            self.is_alive = false;
            self.velocity = Vec2::default();
            self.death_started_at = Some(now);
            self.playback.set_clip(MotionClip::Death);
            return true;
        }
        false
    }

    fn can_attack(&self, now: f64) -> bool {
        now - self.last_attack_time >= f64::from(self.attack_cooldown_seconds)
    }

    fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}

#[derive(Debug, Clone)]
struct HudLogEntry {
    message: String,
    expires_at: f64,
}

#[derive(Debug, Clone, Default)]
struct HudLog {
    entries: VecDeque<HudLogEntry>,
}

impl HudLog {
    fn push(&mut self, now: f64, message: String) {
        while self.entries.len() >= HUD_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(HudLogEntry {
            message,
            expires_at: now + HUD_LOG_TTL_SECONDS,
        });
    }

    fn prune(&mut self, now: f64) {
        while self
            .entries
            .front()
            .is_some_and(|entry| entry.expires_at <= now)
        {
            self.entries.pop_front();
        }
    }

    fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn equip_rejects_index_outside_inventory() {
        let mut inventory = Inventory::default();
        assert!(inventory.add(Weapon::basic_sword()));
        assert!(inventory.equip(0));
        assert!(!inventory.equip(1));
        assert_eq!(
            inventory.equipped_weapon().map(|weapon| weapon.name),
            Some("Basic Sword")
        );
    }

    #[test]
    fn inventory_capacity_is_enforced() {
        let mut inventory = Inventory::default();
        for _ in 0..INVENTORY_CAPACITY {
            assert!(inventory.add(Weapon::basic_sword()));
        }
        assert!(inventory.is_full());
        assert!(!inventory.add(Weapon::steel_sword()));
    }

    #[test]
    fn unequip_returns_weapon_and_clears_slot() {
        let mut inventory = Inventory::default();
        inventory.add(Weapon::steel_sword());
        inventory.equip(0);
        assert_eq!(
            inventory.unequip().map(|weapon| weapon.name),
            Some("Steel Sword")
        );
        assert!(inventory.equipped_weapon().is_none());
    }

    #[test]
    fn level_curve_multiplies_by_three_halves() {
        let tuning = PlayerTuning::default();
        let mut player = PlayerState::new(&tuning, Vec2 { x: 48.0, y: 48.0 });
        assert_eq!(player.experience_to_next_level, 100);

        let levels = player.gain_experience(100);
        assert_eq!(levels, 1);
        assert_eq!(player.level, 2);
        assert_eq!(player.experience_to_next_level, 150);
        assert_eq!(player.max_health, tuning.max_health + LEVEL_UP_MAX_HEALTH_BONUS);
        assert_eq!(player.health, player.max_health);
    }

    #[test]
    fn big_experience_award_grants_multiple_levels() {
        let mut player = PlayerState::new(&PlayerTuning::default(), Vec2::default());
        let levels = player.gain_experience(250);
        assert_eq!(levels, 2);
        assert_eq!(player.level, 3);
    }

    #[test]
    fn color_block_death_clip_never_self_finishes() {
        let presentation = Presentation::ColorBlock {
            color: [1, 2, 3, 255],
        };
        let mut playback = ClipPlayback::default();
        playback.set_clip(MotionClip::Death);
        playback.advance(100.0);
        assert!(!playback.death_clip_finished(&presentation));
    }

    #[test]
    fn sprite_death_clip_finishes_after_its_duration() {
        let presentation = Presentation::SpriteSheet {
            key: "goblin",
            fallback: [0, 0, 0, 255],
        };
        let mut playback = ClipPlayback::default();
        playback.set_clip(MotionClip::Death);
        playback.advance(SPRITE_DEATH_CLIP_SECONDS / 2.0);
        assert!(!playback.death_clip_finished(&presentation));
        playback.advance(SPRITE_DEATH_CLIP_SECONDS);
        assert!(playback.death_clip_finished(&presentation));
    }

    #[test]
    fn hud_log_drops_oldest_and_prunes_expired() {
        let mut log = HudLog::default();
        for index in 0..HUD_LOG_CAPACITY + 2 {
            log.push(0.0, format!("message {index}"));
        }
        assert_eq!(log.lines().len(), HUD_LOG_CAPACITY);
        assert_eq!(log.lines()[0], "message 2");

        log.prune(HUD_LOG_TTL_SECONDS + 1.0);
        assert!(log.lines().is_empty());
    }
}
