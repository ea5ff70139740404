use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

pub(crate) const CONFIG_FILE_NAME: &str = "gameplay.json";

/// Tuning knobs for the simulation. Every section has a compiled default;
/// the JSON file only needs the sections it wants to override. Enemy sections
/// are all-or-nothing so a goblin override can never leak into the ogre.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameplayConfig {
    pub(crate) player: PlayerTuning,
    pub(crate) goblin: EnemyTuning,
    pub(crate) ogre: EnemyTuning,
    pub(crate) ai: AiTuning,
    pub(crate) death: DeathTuning,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerTuning {
    pub(crate) size_px: f32,
    pub(crate) max_health: i32,
    pub(crate) speed: f32,
    pub(crate) base_attack_damage: i32,
    pub(crate) attack_range: f32,
    pub(crate) attack_cooldown_seconds: f32,
    pub(crate) attack_active_seconds: f32,
    pub(crate) starting_gold: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EnemyTuning {
    pub(crate) size_px: f32,
    pub(crate) max_health: i32,
    pub(crate) speed: f32,
    pub(crate) attack_damage: i32,
    pub(crate) experience_value: u32,
    pub(crate) attack_cooldown_seconds: f32,
    pub(crate) detection_radius: f32,
    pub(crate) attack_range: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AiTuning {
    /// Chase reverts to Idle past detection_radius times this factor. The
    /// band keeps the state machine from flickering at the detection edge.
    pub(crate) chase_giveup_factor: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DeathTuning {
    /// Corpse conversion happens at the death clip's end or after this many
    /// seconds, whichever comes first.
    pub(crate) failsafe_seconds: f32,
    pub(crate) corpse_decay_seconds: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            goblin: EnemyTuning::goblin(),
            ogre: EnemyTuning::ogre(),
            ai: AiTuning::default(),
            death: DeathTuning::default(),
        }
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size_px: 32.0,
            max_health: 100,
            speed: 150.0,
            base_attack_damage: 10,
            attack_range: 25.0,
            attack_cooldown_seconds: 0.5,
            attack_active_seconds: 0.4,
            starting_gold: 100,
        }
    }
}

impl EnemyTuning {
    pub(crate) fn goblin() -> Self {
        Self {
            size_px: 32.0,
            max_health: 20,
            speed: 80.0,
            attack_damage: 8,
            experience_value: 15,
            attack_cooldown_seconds: 0.8,
            detection_radius: 100.0,
            attack_range: 35.0,
        }
    }

    pub(crate) fn ogre() -> Self {
        Self {
            size_px: 64.0,
            max_health: 100,
            speed: 30.0,
            attack_damage: 20,
            experience_value: 100,
            attack_cooldown_seconds: 1.5,
            detection_radius: 120.0,
            attack_range: 50.0,
        }
    }
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            chase_giveup_factor: 1.5,
        }
    }
}

impl Default for DeathTuning {
    fn default() -> Self {
        Self {
            failsafe_seconds: 2.0,
            corpse_decay_seconds: 4.0,
        }
    }
}

pub(crate) fn load_gameplay_config(config_dir: &Path) -> Result<GameplayConfig, String> {
    let path = config_dir.join(CONFIG_FILE_NAME);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "config_missing_using_defaults");
            return Ok(GameplayConfig::default());
        }
        Err(error) => {
            return Err(format!("read config '{}': {error}", path.display()));
        }
    };

    let config = parse_gameplay_config(&raw)
        .map_err(|reason| format!("parse config '{}': {reason}", path.display()))?;
    validate_gameplay_config(&config)
        .map_err(|reason| format!("invalid config '{}': {reason}", path.display()))?;
    info!(path = %path.display(), "config_loaded");
    Ok(config)
}

fn parse_gameplay_config(raw: &str) -> Result<GameplayConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameplayConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("{source}"))
            } else {
                Err(format!("at {path}: {source}"))
            }
        }
    }
}

fn validate_gameplay_config(config: &GameplayConfig) -> Result<(), String> {
    validate_enemy_tuning("goblin", &config.goblin)?;
    validate_enemy_tuning("ogre", &config.ogre)?;

    let player = &config.player;
    if player.size_px <= 0.0 || player.speed <= 0.0 || player.max_health <= 0 {
        return Err("player size, speed and max_health must be positive".to_string());
    }
    if player.attack_range <= 0.0 || player.attack_active_seconds <= 0.0 {
        return Err("player attack_range and attack_active_seconds must be positive".to_string());
    }

    if config.ai.chase_giveup_factor < 1.0 {
        return Err(format!(
            "ai.chase_giveup_factor must be at least 1.0, got {}",
            config.ai.chase_giveup_factor
        ));
    }
    if config.death.failsafe_seconds <= 0.0 || config.death.corpse_decay_seconds <= 0.0 {
        return Err("death timers must be positive".to_string());
    }
    Ok(())
}

fn validate_enemy_tuning(name: &str, tuning: &EnemyTuning) -> Result<(), String> {
    if tuning.size_px <= 0.0 || tuning.speed <= 0.0 || tuning.max_health <= 0 {
        return Err(format!("{name} size, speed and max_health must be positive"));
    }
    if tuning.detection_radius <= 0.0 || tuning.attack_range <= 0.0 {
        return Err(format!(
            "{name} detection_radius and attack_range must be positive"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_tuning() {
        let config = GameplayConfig::default();
        assert_eq!(config.player.max_health, 100);
        assert_eq!(config.player.base_attack_damage, 10);
        assert_eq!(config.goblin.max_health, 20);
        assert_eq!(config.goblin.detection_radius, 100.0);
        assert_eq!(config.goblin.attack_range, 35.0);
        assert_eq!(config.ogre.max_health, 100);
        assert_eq!(config.ai.chase_giveup_factor, 1.5);
        assert_eq!(config.death.failsafe_seconds, 2.0);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = parse_gameplay_config(r#"{"ai": {"chase_giveup_factor": 2.0}}"#)
            .expect("parse partial config");
        assert_eq!(config.ai.chase_giveup_factor, 2.0);
        assert_eq!(config.goblin.speed, 80.0);
    }

    #[test]
    fn parse_error_names_the_bad_field() {
        let error = parse_gameplay_config(r#"{"goblin": {"speed": "fast"}}"#)
            .expect_err("strings are not speeds");
        assert!(error.contains("goblin.speed"), "error was: {error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = parse_gameplay_config(r#"{"gremlin": {}}"#).expect_err("unknown section");
        assert!(error.contains("gremlin"), "error was: {error}");
    }

    #[test]
    fn hysteresis_below_one_fails_validation() {
        let config = parse_gameplay_config(r#"{"ai": {"chase_giveup_factor": 0.5}}"#)
            .expect("parse succeeds");
        let error = validate_gameplay_config(&config).expect_err("factor below 1.0");
        assert!(error.contains("chase_giveup_factor"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            load_gameplay_config(Path::new("/definitely/not/a/config/dir")).expect("defaults");
        assert_eq!(config.player.speed, 150.0);
    }
}
