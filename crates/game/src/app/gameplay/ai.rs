#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum AiState {
    #[default]
    Idle,
    Chase,
    Attack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnemyAiOutcome {
    None,
    AttackedTarget { damage: i32 },
}

/// One tick of the enemy state machine. `target_center` is already resolved
/// from the target handle; a dead or missing target arrives as `None` and
/// reads as infinite distance, which walks the machine back toward Idle.
///
/// Transitions, on center-to-center distance `d`:
///   Idle  -> Chase  at d <= detection_radius
///   Chase -> Attack at d <= attack_range
///   Chase -> Idle   at d >  detection_radius * giveup_factor
///   Attack-> Chase  at d >  attack_range
fn update_enemy_ai(
    enemy: &mut EnemyState,
    now: f64,
    dt: f32,
    map: &WorldMap,
    target_center: Option<Vec2>,
    obstacles: &[Rect],
    giveup_factor: f32,
) -> EnemyAiOutcome {
    if !enemy.is_alive {
        enemy.velocity = Vec2::default();
        return EnemyAiOutcome::None;
    }

    let distance = target_center
        .map(|center| distance_between(enemy.center(), center))
        .unwrap_or(f32::INFINITY);

    match enemy.ai_state {
        AiState::Idle => {
            if distance <= enemy.detection_radius {
                enemy.ai_state = AiState::Chase;
            }
        }
        AiState::Chase => {
            if distance <= enemy.attack_range {
                enemy.ai_state = AiState::Attack;
            } else if distance > enemy.detection_radius * giveup_factor {
                enemy.ai_state = AiState::Idle;
                enemy.velocity = Vec2::default();
            } else if let Some(center) = target_center {
                chase_toward(enemy, center, map, dt, obstacles);
            }
        }
        AiState::Attack => {
            if distance > enemy.attack_range {
                enemy.ai_state = AiState::Chase;
            } else {
                enemy.velocity = Vec2::default();
                if enemy.can_attack(now) {
                    enemy.last_attack_time = now;
                    return EnemyAiOutcome::AttackedTarget {
                        damage: enemy.attack_damage,
                    };
                }
            }
        }
    }

    EnemyAiOutcome::None
}

fn chase_toward(enemy: &mut EnemyState, target_center: Vec2, map: &WorldMap, dt: f32, obstacles: &[Rect]) {
    let Some(direction) = direction_toward(enemy.center(), target_center) else {
        enemy.velocity = Vec2::default();
        return;
    };
    let desired = Vec2 {
        x: direction.x * enemy.speed,
        y: direction.y * enemy.speed,
    };
    enemy.velocity = resolve_movement(map, enemy.body(), desired, dt, obstacles);
    if enemy.velocity != Vec2::default() {
        enemy.facing = facing_from_velocity(enemy.velocity, enemy.facing);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeathProgress {
    None,
    BecameCorpse,
    ShouldDespawn,
}

/// Advances the death timeline that runs outside the state machine: dying
/// enemies become corpses when their death clip reports finished or after the
/// failsafe elapses, and corpses despawn once the decay window passes.
fn advance_death(enemy: &mut EnemyState, now: f64, dt: f32, death: &DeathTuning) -> DeathProgress {
    if enemy.is_alive {
        return DeathProgress::None;
    }
    enemy.playback.advance(dt);

    if !enemy.is_corpse {
        let failsafe_elapsed = enemy
            .death_started_at
            .is_some_and(|started| now - started >= f64::from(death.failsafe_seconds));
        if enemy.playback.death_clip_finished(&enemy.presentation) || failsafe_elapsed {
            enemy.is_corpse = true;
            enemy.velocity = Vec2::default();
            enemy.corpse_started_at = Some(now);
            enemy.playback.set_clip(MotionClip::Corpse);
            return DeathProgress::BecameCorpse;
        }
        return DeathProgress::None;
    }

    let decay_elapsed = enemy
        .corpse_started_at
        .is_some_and(|started| now - started >= f64::from(death.corpse_decay_seconds));
    if decay_elapsed {
        DeathProgress::ShouldDespawn
    } else {
        DeathProgress::None
    }
}

#[cfg(test)]
mod ai_tests {
    use super::map_tests::raster_from_rows;
    use super::map_tests::G;
    use super::*;

    fn open_map() -> WorldMap {
        let rows: Vec<Vec<engine::Rgb>> = vec![vec![G; 24]; 24];
        let borrowed: Vec<&[engine::Rgb]> = rows.iter().map(|row| row.as_slice()).collect();
        WorldMap::decode(&raster_from_rows(&borrowed), 32).expect("decode")
    }

    fn goblin_at(center: Vec2) -> EnemyState {
        EnemyState::new(EnemyKind::Goblin, &EnemyTuning::goblin(), center)
    }

    fn tick(
        enemy: &mut EnemyState,
        map: &WorldMap,
        target_center: Option<Vec2>,
        now: f64,
    ) -> EnemyAiOutcome {
        update_enemy_ai(enemy, now, 1.0 / 60.0, map, target_center, &[], 1.5)
    }

    #[test]
    fn idle_becomes_chase_inside_detection_radius() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        // 85 px away: inside detection (100) but outside attack range (35).
        let target = Some(Vec2 { x: 285.0, y: 200.0 });

        tick(&mut enemy, &map, target, 0.0);
        assert_eq!(enemy.ai_state, AiState::Chase);
        assert_ne!(enemy.ai_state, AiState::Attack);
    }

    #[test]
    fn chase_becomes_attack_inside_attack_range() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.ai_state = AiState::Chase;
        let target = Some(Vec2 { x: 230.0, y: 200.0 });

        tick(&mut enemy, &map, target, 0.0);
        assert_eq!(enemy.ai_state, AiState::Attack);
    }

    #[test]
    fn chase_persists_in_the_hysteresis_band() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.ai_state = AiState::Chase;
        // 120 px: beyond detection (100) but inside the 1.5x give-up band.
        let near_target = Some(Vec2 { x: 320.0, y: 200.0 });

        for tick_index in 0..20 {
            tick(&mut enemy, &map, near_target, tick_index as f64 / 60.0);
            assert_eq!(enemy.ai_state, AiState::Chase);
        }
    }

    #[test]
    fn chase_gives_up_past_the_band() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.ai_state = AiState::Chase;
        let far_target = Some(Vec2 { x: 360.0, y: 200.0 });

        tick(&mut enemy, &map, far_target, 0.0);
        assert_eq!(enemy.ai_state, AiState::Idle);
        assert_eq!(enemy.velocity, Vec2::default());
    }

    #[test]
    fn target_on_the_detection_edge_does_not_flicker() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        let on_edge = Vec2 { x: 300.0, y: 200.0 };
        let just_outside = Vec2 { x: 301.0, y: 200.0 };

        tick(&mut enemy, &map, Some(on_edge), 0.0);
        assert_eq!(enemy.ai_state, AiState::Chase);
        // Oscillating around the detection boundary stays in Chase; the
        // enemy closes distance, so hold it in place each tick.
        for tick_index in 0..30 {
            enemy.position = Vec2 { x: 184.0, y: 184.0 };
            let wobble = if tick_index % 2 == 0 { on_edge } else { just_outside };
            tick(&mut enemy, &map, Some(wobble), tick_index as f64 / 60.0);
            assert_eq!(enemy.ai_state, AiState::Chase);
        }
    }

    #[test]
    fn missing_target_reads_as_infinite_distance() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.ai_state = AiState::Attack;

        tick(&mut enemy, &map, None, 0.0);
        assert_eq!(enemy.ai_state, AiState::Chase);
        tick(&mut enemy, &map, None, 1.0 / 60.0);
        assert_eq!(enemy.ai_state, AiState::Idle);
    }

    #[test]
    fn attack_applies_damage_on_cooldown() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.ai_state = AiState::Attack;
        let target = Some(Vec2 { x: 220.0, y: 200.0 });

        let first = tick(&mut enemy, &map, target, 0.0);
        assert_eq!(first, EnemyAiOutcome::AttackedTarget { damage: 8 });

        // Still cooling down.
        let second = tick(&mut enemy, &map, target, 0.4);
        assert_eq!(second, EnemyAiOutcome::None);

        let third = tick(&mut enemy, &map, target, 0.9);
        assert_eq!(third, EnemyAiOutcome::AttackedTarget { damage: 8 });
    }

    #[test]
    fn chase_moves_toward_the_target() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.ai_state = AiState::Chase;
        let target = Some(Vec2 { x: 280.0, y: 200.0 });

        tick(&mut enemy, &map, target, 0.0);
        assert!(enemy.velocity.x > 0.0);
        assert_eq!(enemy.facing, CardinalFacing::East);
    }

    #[test]
    fn dead_enemy_never_updates_ai() {
        let map = open_map();
        let mut enemy = goblin_at(Vec2 { x: 200.0, y: 200.0 });
        enemy.take_damage(1000, 0.0);
        enemy.ai_state = AiState::Chase;
        enemy.velocity = Vec2 { x: 50.0, y: 0.0 };

        let outcome = tick(&mut enemy, &map, Some(Vec2 { x: 210.0, y: 200.0 }), 0.1);
        assert_eq!(outcome, EnemyAiOutcome::None);
        assert_eq!(enemy.velocity, Vec2::default());
        assert_eq!(enemy.ai_state, AiState::Chase);
    }

    #[test]
    fn sprite_death_clip_converts_to_corpse_when_finished() {
        let death = DeathTuning::default();
        let mut enemy = goblin_at(Vec2 { x: 0.0, y: 0.0 });
        enemy.take_damage(1000, 0.0);

        let mut progress = DeathProgress::None;
        let mut now = 0.0;
        while progress == DeathProgress::None && now < 1.5 {
            now += 1.0 / 60.0;
            progress = advance_death(&mut enemy, now, 1.0 / 60.0, &death);
        }
        assert_eq!(progress, DeathProgress::BecameCorpse);
        assert!(enemy.is_corpse);
        // The clip finished well before the 2 s failsafe.
        assert!(now < f64::from(death.failsafe_seconds));
    }

    #[test]
    fn color_block_death_relies_on_the_failsafe() {
        let death = DeathTuning::default();
        let mut enemy = EnemyState::new(
            EnemyKind::Ogre,
            &EnemyTuning::ogre(),
            Vec2 { x: 0.0, y: 0.0 },
        );
        enemy.take_damage(1000, 0.0);

        let before_failsafe =
            advance_death(&mut enemy, 1.9, 1.0 / 60.0, &death);
        assert_eq!(before_failsafe, DeathProgress::None);
        let at_failsafe = advance_death(&mut enemy, 2.0, 1.0 / 60.0, &death);
        assert_eq!(at_failsafe, DeathProgress::BecameCorpse);
    }

    #[test]
    fn corpse_despawns_after_decay_window() {
        let death = DeathTuning::default();
        let mut enemy = goblin_at(Vec2 { x: 0.0, y: 0.0 });
        enemy.take_damage(1000, 0.0);
        advance_death(&mut enemy, 2.5, 2.5, &death);
        assert!(enemy.is_corpse);

        assert_eq!(
            advance_death(&mut enemy, 4.0, 1.0 / 60.0, &death),
            DeathProgress::None
        );
        assert_eq!(
            advance_death(&mut enemy, 2.5 + f64::from(death.corpse_decay_seconds), 1.0 / 60.0, &death),
            DeathProgress::ShouldDespawn
        );
    }
}
