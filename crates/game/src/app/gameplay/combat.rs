impl PlayerState {
    fn can_attack(&self, now: f64) -> bool {
        now - self.last_attack_time >= f64::from(self.attack_cooldown_seconds)
    }

    fn start_attack(&mut self, now: f64) {
        self.is_attacking = true;
        self.attack_start_time = now;
        self.last_attack_time = now;
        self.enemies_hit_this_attack.clear();
    }

    fn update_attack_state(&mut self, now: f64) {
        if self.is_attacking
            && now - self.attack_start_time >= f64::from(self.attack_active_seconds)
        {
            self.is_attacking = false;
        }
    }

    fn attack_hitbox(&self) -> Rect {
        attack_hitbox(self.body(), self.facing, self.attack_range, self.is_attacking)
    }
}

/// A square of side `range` flush against the facing edge of `body`, centered
/// on the perpendicular axis. Zero-area while not attacking.
fn attack_hitbox(body: Rect, facing: CardinalFacing, range: f32, attacking: bool) -> Rect {
    if !attacking {
        return Rect::default();
    }
    match facing {
        CardinalFacing::East => Rect {
            x: body.x + body.w,
            y: body.y + (body.h - range) / 2.0,
            w: range,
            h: range,
        },
        CardinalFacing::West => Rect {
            x: body.x - range,
            y: body.y + (body.h - range) / 2.0,
            w: range,
            h: range,
        },
        CardinalFacing::South => Rect {
            x: body.x + (body.w - range) / 2.0,
            y: body.y + body.h,
            w: range,
            h: range,
        },
        CardinalFacing::North => Rect {
            x: body.x + (body.w - range) / 2.0,
            y: body.y - range,
            w: range,
            h: range,
        },
    }
}

#[derive(Debug, Default)]
struct SwingOutcome {
    experience_gained: u32,
    hits: u32,
    kills: Vec<EntityId>,
}

/// Applies the active swing to every enemy it touches, at most once per enemy
/// per swing. Re-running every tick of the active window is safe: already-hit
/// enemies are skipped via the per-swing set.
fn resolve_player_swing(
    player: &mut PlayerState,
    enemies: &mut HashMap<EntityId, EnemyState>,
    now: f64,
) -> SwingOutcome {
    let mut outcome = SwingOutcome::default();
    if !player.is_attacking {
        return outcome;
    }

    let hitbox = player.attack_hitbox();
    let damage = player.attack_damage();

    let mut enemy_ids: Vec<EntityId> = enemies.keys().copied().collect();
    enemy_ids.sort();

    for enemy_id in enemy_ids {
        let Some(enemy) = enemies.get_mut(&enemy_id) else {
            continue;
        };
        if !enemy.can_be_hit() || !enemy.body().intersects(&hitbox) {
            continue;
        }
        if !player.enemies_hit_this_attack.insert(enemy_id) {
            continue;
        }

        outcome.hits += 1;
        if enemy.take_damage(damage, now) {
            outcome.experience_gained += enemy.experience_value;
            outcome.kills.push(enemy_id);
        }
    }

    outcome
}
