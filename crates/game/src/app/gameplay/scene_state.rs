struct OverworldScene {
    config: GameplayConfig,
    map: WorldMap,
    sim_time: f64,
    spawn_center: Vec2,
    player_id: Option<EntityId>,
    player: Option<PlayerState>,
    enemies: HashMap<EntityId, EnemyState>,
    chests: HashMap<EntityId, ChestState>,
    hud_log: HudLog,
    inventory_open: bool,
    inventory_selected: usize,
    loot_registry: LootRegistry,
}

impl OverworldScene {
    fn new(map: WorldMap, config: GameplayConfig) -> Self {
        Self {
            config,
            map,
            sim_time: 0.0,
            spawn_center: Vec2::default(),
            player_id: None,
            player: None,
            enemies: HashMap::new(),
            chests: HashMap::new(),
            hud_log: HudLog::default(),
            inventory_open: false,
            inventory_selected: 0,
            loot_registry: LootRegistry::new(),
        }
    }

    fn reset_runtime_state(&mut self) {
        self.sim_time = 0.0;
        self.spawn_center = Vec2::default();
        self.player_id = None;
        self.player = None;
        self.enemies.clear();
        self.chests.clear();
        self.hud_log = HudLog::default();
        self.inventory_open = false;
        self.inventory_selected = 0;
    }

    fn spawn_world_entities(&mut self, world: &mut SceneWorld) {
        world.set_tilemap(self.map.display_tilemap());

        self.spawn_static_objects_and_chests(world);

        let player_tuning = self.config.player.clone();
        self.spawn_center = self
            .map
            .find_safe_spawn(player_tuning.size_px, player_tuning.size_px);
        let player = PlayerState::new(&player_tuning, self.spawn_center);
        let player_id = world.spawn(
            player.position,
            player.size,
            RenderLayer::Actor,
            Renderable::Sprite {
                key: "player".to_string(),
                fallback: PLAYER_COLOR,
            },
            "player",
        );
        self.player_id = Some(player_id);
        self.player = Some(player);

        self.spawn_enemy_pack(world, player_id);
    }

    fn spawn_static_objects_and_chests(&mut self, world: &mut SceneWorld) {
        let mut chest_sites = Vec::new();
        for object in self.map.objects() {
            if object.descriptor.name == CHEST_OBJECT.name {
                chest_sites.push(object.bounds);
                continue;
            }
            world.spawn(
                Vec2 {
                    x: object.bounds.x,
                    y: object.bounds.y,
                },
                Vec2 {
                    x: object.bounds.w,
                    y: object.bounds.h,
                },
                RenderLayer::Object,
                Renderable::ColorRect {
                    color: object.descriptor.display_color,
                },
                object.descriptor.name,
            );
        }

        for bounds in chest_sites {
            let tile_x = (bounds.x / self.map.tile_size() as f32) as i64;
            let tile_y = (bounds.y / self.map.tile_size() as f32) as i64;
            let mut rng = LootRng::new(chest_seed(&self.map, tile_x, tile_y));
            let kind = if rng.next_fraction() < RARE_CHEST_CHANCE {
                ChestKind::Rare
            } else {
                ChestKind::Basic
            };
            let loot = self.loot_registry.chest_loot(kind, &mut rng);

            let chest_id = world.spawn(
                Vec2 {
                    x: bounds.x,
                    y: bounds.y,
                },
                Vec2 {
                    x: bounds.w,
                    y: bounds.h,
                },
                RenderLayer::Object,
                Renderable::ColorRect {
                    color: CHEST_CLOSED_COLOR,
                },
                "chest",
            );
            self.chests
                .insert(chest_id, ChestState::new(kind, bounds, loot));
        }
    }

    fn spawn_enemy_pack(&mut self, world: &mut SceneWorld, player_id: EntityId) {
        let mut spawned = 0usize;
        for (offset_x, offset_y, kind) in ENEMY_SPAWN_OFFSETS_PX {
            let center = Vec2 {
                x: self.spawn_center.x + offset_x,
                y: self.spawn_center.y + offset_y,
            };
            if !self.map.is_walkable(center.x, center.y) {
                continue;
            }

            let tuning = match kind {
                EnemyKind::Goblin => self.config.goblin.clone(),
                EnemyKind::Ogre => self.config.ogre.clone(),
            };
            let mut enemy = EnemyState::new(kind, &tuning, center);
            enemy.target = Some(player_id);

            let enemy_id = world.spawn(
                enemy.position,
                enemy.size,
                RenderLayer::Actor,
                enemy.presentation.renderable(),
                kind.name(),
            );
            self.enemies.insert(enemy_id, enemy);
            spawned += 1;
        }
        info!(count = spawned, "enemy_pack_spawned");
    }

    fn sorted_enemy_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.enemies.keys().copied().collect();
        ids.sort();
        ids
    }

    fn chest_obstacle_rects(&self) -> Vec<Rect> {
        let mut rects: Vec<(EntityId, Rect)> = self
            .chests
            .iter()
            .map(|(id, chest)| (*id, chest.bounds))
            .collect();
        rects.sort_by_key(|(id, _)| *id);
        rects.into_iter().map(|(_, bounds)| bounds).collect()
    }

    /// Blocker rectangles an enemy must avoid: chests, the player, and every
    /// other living enemy. Corpses block nothing.
    fn enemy_obstacles(&self, enemy_id: EntityId, player_body: Rect) -> Vec<Rect> {
        let mut obstacles = self.chest_obstacle_rects();
        obstacles.push(player_body);
        for id in self.sorted_enemy_ids() {
            if id == enemy_id {
                continue;
            }
            if let Some(other) = self.enemies.get(&id) {
                if other.blocks_movement() {
                    obstacles.push(other.body());
                }
            }
        }
        obstacles
    }

    /// Nearest unopened chest within interaction range of `point`.
    fn find_interactable_chest(&self, point: Vec2) -> Option<EntityId> {
        let mut best: Option<(f32, EntityId)> = None;
        let mut ids: Vec<EntityId> = self.chests.keys().copied().collect();
        ids.sort();
        for id in ids {
            let Some(chest) = self.chests.get(&id) else {
                continue;
            };
            if !chest.can_interact_from(point) {
                continue;
            }
            let distance = distance_between(point, chest.center());
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, id)),
            }
        }
        best.map(|(_, id)| id)
    }

    fn respawn_player(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.position = Vec2 {
            x: self.spawn_center.x - player.size.x / 2.0,
            y: self.spawn_center.y - player.size.y / 2.0,
        };
        player.velocity = Vec2::default();
        player.is_attacking = false;
        player.heal_to_full();
        self.hud_log
            .push(self.sim_time, "You were slain and wake at the spawn".to_string());
        info!("player_respawned");
    }

    fn sync_entity_visuals(&mut self, world: &mut SceneWorld) {
        if let (Some(player_id), Some(player)) = (self.player_id, self.player.as_ref()) {
            if let Some(entity) = world.find_entity_mut(player_id) {
                entity.position = player.position;
                entity.visual.facing = player.facing;
                entity.visual.clip = if player.is_attacking {
                    MotionClip::Attack
                } else if player.velocity != Vec2::default() {
                    MotionClip::Walk
                } else {
                    MotionClip::Idle
                };
                entity.visual.health_fraction = Some(player.health_fraction());
            }
        }

        for id in self.sorted_enemy_ids() {
            let Some(enemy) = self.enemies.get(&id) else {
                continue;
            };
            let Some(entity) = world.find_entity_mut(id) else {
                continue;
            };
            entity.position = enemy.position;
            entity.visual.facing = enemy.facing;
            entity.visual.clip = enemy_display_clip(enemy);
            entity.layer = if enemy.is_corpse {
                RenderLayer::Corpse
            } else {
                RenderLayer::Actor
            };
            entity.visual.health_fraction = if enemy.can_be_hit() {
                Some(enemy.health_fraction())
            } else {
                None
            };
        }
    }
}

fn enemy_display_clip(enemy: &EnemyState) -> MotionClip {
    if enemy.is_corpse {
        MotionClip::Corpse
    } else if !enemy.is_alive {
        MotionClip::Death
    } else {
        match enemy.ai_state {
            AiState::Attack => MotionClip::Attack,
            AiState::Idle | AiState::Chase => {
                if enemy.velocity == Vec2::default() {
                    MotionClip::Idle
                } else {
                    MotionClip::Walk
                }
            }
        }
    }
}

fn chest_seed(map: &WorldMap, tile_x: i64, tile_y: i64) -> u64 {
    (u64::from(map.width()) << 48)
        ^ (u64::from(map.height()) << 32)
        ^ ((tile_x as u64) << 16)
        ^ (tile_y as u64)
}
