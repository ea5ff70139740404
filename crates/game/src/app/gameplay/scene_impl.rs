impl Scene for OverworldScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.reset_runtime_state();
        self.spawn_world_entities(world);
        world.apply_pending();

        if let Some(player) = self.player.as_ref() {
            world.camera_mut().position = player.center();
        }
        info!(
            scene = "overworld",
            entity_count = world.entity_count(),
            enemies = self.enemies.len(),
            chests = self.chests.len(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        self.sim_time += f64::from(fixed_dt_seconds);
        let now = self.sim_time;
        self.hud_log.prune(now);

        if input.inventory_pressed() {
            self.inventory_open = !self.inventory_open;
            self.inventory_selected = 0;
        }
        if self.inventory_open {
            self.update_inventory_menu(input);
            return SceneCommand::None;
        }
        if input.cancel_pressed() {
            return SceneCommand::SwitchTo(SceneKey::Title);
        }

        self.update_player(fixed_dt_seconds, now, input);
        self.resolve_player_attacks(now);
        self.update_enemies(fixed_dt_seconds, now, world);
        if input.interact_pressed() {
            self.try_open_nearest_chest(now, world);
        }

        if let Some(player) = self.player.as_ref() {
            let (world_w, world_h) = self.map.world_size_px();
            let center = player.center();
            world.camera_mut().position = Vec2 {
                x: center.x.clamp(0.0, world_w),
                y: center.y.clamp(0.0, world_h),
            };
        }
        self.sync_entity_visuals(world);

        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(
            scene = "overworld",
            entity_count = world.entity_count(),
            "scene_unload"
        );
    }

    fn hud(&self, _world: &SceneWorld) -> Option<HudFrame> {
        let player = self.player.as_ref()?;
        let weapon_name = player
            .inventory
            .equipped_weapon()
            .map(|weapon| weapon.name)
            .unwrap_or("Unarmed");
        let live_enemies = self
            .enemies
            .values()
            .filter(|enemy| enemy.is_alive)
            .count();

        let lines = vec![
            format!("Level: {}", player.level),
            format!("Health: {}/{}", player.health, player.max_health),
            format!(
                "XP: {}/{}",
                player.experience, player.experience_to_next_level
            ),
            format!("Gold: {}", player.gold),
            format!("Weapon: {weapon_name}"),
            format!("Enemies: {live_enemies}"),
        ];

        let menu = self.inventory_open.then(|| {
            let items = player.inventory.items();
            let entries = if items.is_empty() {
                vec!["(empty)".to_string()]
            } else {
                items
                    .iter()
                    .enumerate()
                    .map(|(index, weapon)| {
                        let marker = if player.inventory.equipped == Some(index) {
                            " (equipped)"
                        } else {
                            ""
                        };
                        format!("{} - dmg {}{marker}", weapon.name, weapon.damage)
                    })
                    .collect()
            };
            MenuPanel {
                title: "Inventory".to_string(),
                entries,
                selected: self.inventory_selected,
            }
        });

        Some(HudFrame {
            lines,
            log: self.hud_log.lines(),
            menu,
        })
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let player = self.player.as_ref()?;
        Some(format!(
            "Hollowmere | Lvl {} | HP {}/{} | Gold {}",
            player.level, player.health, player.max_health, player.gold
        ))
    }
}

impl OverworldScene {
    fn update_inventory_menu(&mut self, input: &InputSnapshot) {
        let item_count = self
            .player
            .as_ref()
            .map(|player| player.inventory.items().len())
            .unwrap_or(0);

        if input.move_up_pressed() && self.inventory_selected > 0 {
            self.inventory_selected -= 1;
        }
        if input.move_down_pressed() && self.inventory_selected + 1 < item_count {
            self.inventory_selected += 1;
        }
        if input.cancel_pressed() {
            self.inventory_open = false;
            return;
        }

        let slot_index = input
            .weapon_slot_pressed()
            .map(|slot| (slot as usize).saturating_sub(1))
            .or_else(|| input.confirm_pressed().then_some(self.inventory_selected));
        let Some(index) = slot_index else {
            return;
        };
        let now = self.sim_time;
        if let Some(player) = self.player.as_mut() {
            if player.inventory.equip(index) {
                let name = player
                    .inventory
                    .equipped_weapon()
                    .map(|weapon| weapon.name)
                    .unwrap_or("Unarmed");
                self.hud_log.push(now, format!("Equipped {name}"));
            }
        }
    }

    fn update_player(&mut self, dt: f32, now: f64, input: &InputSnapshot) {
        let chest_rects = self.chest_obstacle_rects();
        let Some(player) = self.player.as_mut() else {
            return;
        };

        let mut velocity = Vec2::default();
        if input.is_down(InputAction::MoveLeft) {
            velocity.x = -player.speed;
        }
        if input.is_down(InputAction::MoveRight) {
            velocity.x = player.speed;
        }
        if input.is_down(InputAction::MoveUp) {
            velocity.y = -player.speed;
        }
        if input.is_down(InputAction::MoveDown) {
            velocity.y = player.speed;
        }

        // Weapon hotkeys work outside the menu too.
        if let Some(slot) = input.weapon_slot_pressed() {
            let index = (slot as usize).saturating_sub(1);
            if player.inventory.equip(index) {
                let name = player
                    .inventory
                    .equipped_weapon()
                    .map(|weapon| weapon.name)
                    .unwrap_or("Unarmed");
                self.hud_log.push(now, format!("Equipped {name}"));
            }
        }

        if (input.attack_pressed() || input.is_down(InputAction::Attack)) && player.can_attack(now)
        {
            player.start_attack(now);
        }
        player.update_attack_state(now);

        player.velocity = resolve_movement(&self.map, player.body(), velocity, dt, &chest_rects);
        player.position.x += player.velocity.x * dt;
        player.position.y += player.velocity.y * dt;
        player.facing = facing_from_velocity(player.velocity, player.facing);
    }

    fn resolve_player_attacks(&mut self, now: f64) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let outcome = resolve_player_swing(player, &mut self.enemies, now);
        if outcome.hits == 0 && outcome.kills.is_empty() {
            return;
        }

        for kill_id in &outcome.kills {
            if let Some(enemy) = self.enemies.get(kill_id) {
                self.hud_log.push(
                    now,
                    format!(
                        "{} slain, +{} xp",
                        enemy.kind.name(),
                        enemy.experience_value
                    ),
                );
            }
        }
        if outcome.experience_gained > 0 {
            let levels_gained = player.gain_experience(outcome.experience_gained);
            for _ in 0..levels_gained {
                self.hud_log
                    .push(now, format!("Level up! Now level {}", player.level));
            }
        }
    }

    fn update_enemies(&mut self, dt: f32, now: f64, world: &mut SceneWorld) {
        let Some(player_id) = self.player_id else {
            return;
        };
        let giveup_factor = self.config.ai.chase_giveup_factor;
        let death_tuning = self.config.death.clone();

        let mut player_died = false;
        // Snapshot the id set so removals cannot skip or double-visit.
        for enemy_id in self.sorted_enemy_ids() {
            let Some(mut enemy) = self.enemies.remove(&enemy_id) else {
                continue;
            };

            let target_center = enemy
                .target
                .filter(|target_id| *target_id == player_id)
                .and_then(|_| self.player.as_ref())
                .map(|player| player.center());
            let player_body = self
                .player
                .as_ref()
                .map(|player| player.body())
                .unwrap_or_default();

            let obstacles = self.enemy_obstacles(enemy_id, player_body);
            let outcome = update_enemy_ai(
                &mut enemy,
                now,
                dt,
                &self.map,
                target_center,
                &obstacles,
                giveup_factor,
            );
            if enemy.is_alive {
                enemy.position.x += enemy.velocity.x * dt;
                enemy.position.y += enemy.velocity.y * dt;
            }
            if let EnemyAiOutcome::AttackedTarget { damage } = outcome {
                if let Some(player) = self.player.as_mut() {
                    if player.take_damage(damage) {
                        player_died = true;
                    }
                }
            }

            match advance_death(&mut enemy, now, dt, &death_tuning) {
                DeathProgress::ShouldDespawn => {
                    world.despawn(enemy_id);
                    debug!(enemy = enemy.kind.name(), "corpse_decayed");
                    // Not reinserted: the store entry dies with the entity.
                }
                DeathProgress::BecameCorpse | DeathProgress::None => {
                    self.enemies.insert(enemy_id, enemy);
                }
            }
        }

        if player_died {
            self.respawn_player();
        }
    }

    fn try_open_nearest_chest(&mut self, now: f64, world: &mut SceneWorld) {
        let Some(player_center) = self.player.as_ref().map(|player| player.center()) else {
            return;
        };
        let Some(chest_id) = self.find_interactable_chest(player_center) else {
            return;
        };
        let Some(chest) = self.chests.get_mut(&chest_id) else {
            return;
        };

        let kind = chest.kind;
        let loot = chest.open();
        if let Some(entity) = world.find_entity_mut(chest_id) {
            entity.renderable = Renderable::ColorRect {
                color: CHEST_OPENED_COLOR,
            };
        }
        let kind_label = match kind {
            ChestKind::Basic => "chest",
            ChestKind::Rare => "rare chest",
        };
        self.hud_log.push(now, format!("Opened a {kind_label}"));

        let Some(player) = self.player.as_mut() else {
            return;
        };
        let mut gold_total = 0u32;
        let mut messages = Vec::new();
        for item in loot {
            match item.payload {
                LootPayload::Gold(amount) => gold_total += amount,
                LootPayload::Weapon(ref weapon) => {
                    if player.inventory.add(weapon.clone()) {
                        messages.push(format!("Found {}", item.describe()));
                    } else {
                        messages.push(format!("Inventory full, left {}", weapon.name));
                    }
                }
            }
        }
        if gold_total > 0 {
            player.add_gold(gold_total);
            messages.push(format!("+{gold_total} gold"));
        }
        for message in messages {
            self.hud_log.push(now, message);
        }
    }
}
