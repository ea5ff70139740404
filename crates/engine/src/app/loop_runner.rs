use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::{resolve_app_paths, StartupError};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::rendering::Renderer;
use super::scene::SceneMachine;
use super::{InputAction, InputSnapshot, MetricsHandle, Scene, SceneCommand, SceneKey};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Hollowmere".to_string(),
            window_width: 960,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    title_scene: Box<dyn Scene>,
    overworld_scene: Box<dyn Scene>,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(title_scene, overworld_scene, SceneKey::Title);
    let app_paths = resolve_app_paths()?;
    info!(root = %app_paths.root.display(), "startup");

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let asset_root = app_paths.root.join("assets");
    let mut renderer =
        Renderer::new(Arc::clone(&window), asset_root).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / f64::from(target_tps));
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    let mut input_collector = InputCollector::default();
    scenes.load_active();
    scenes.apply_pending_active();
    info!(
        scene = ?scenes.active_scene(),
        entity_count = scenes.active_world().entity_count(),
        "scene_loaded"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        "loop_config"
    );

    let metrics_handle = MetricsHandle::default();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;
    let fallback_title = config.window_title.clone();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    scenes.shutdown_all();
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                let frame_dt = now
                    .saturating_duration_since(last_frame_instant)
                    .min(max_frame_delta);
                last_frame_instant = now;
                accumulator = accumulator.saturating_add(frame_dt);

                let mut ticks_this_frame = 0u32;
                while accumulator >= fixed_dt && ticks_this_frame < max_ticks_per_frame {
                    let snapshot = input_collector.take_snapshot();
                    let command = scenes.update_active(fixed_dt_seconds, &snapshot);
                    scenes.apply_pending_active();
                    match command {
                        SceneCommand::None => {}
                        SceneCommand::SwitchTo(next_scene) => {
                            if scenes.switch_to(next_scene) {
                                scenes.apply_pending_active();
                                info!(scene = ?next_scene, "scene_switched");
                            }
                        }
                        SceneCommand::Quit => {
                            info!(reason = "scene_command", "shutdown_requested");
                            scenes.shutdown_all();
                            window_target.exit();
                            return;
                        }
                    }

                    accumulator = accumulator.saturating_sub(fixed_dt);
                    ticks_this_frame += 1;
                    metrics_accumulator.record_tick();
                }
                if ticks_this_frame == max_ticks_per_frame && accumulator >= fixed_dt {
                    // Behind by more than the tick cap allows: drop the backlog
                    // instead of spiraling.
                    accumulator = Duration::ZERO;
                }

                metrics_accumulator.record_frame(frame_dt);
                if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                    metrics_handle.publish(snapshot);
                    info!(
                        fps = snapshot.fps,
                        tps = snapshot.tps,
                        avg_frame_ms = snapshot.avg_frame_ms,
                        "loop_metrics"
                    );
                }

                let next_title = scenes
                    .debug_title_active()
                    .unwrap_or_else(|| fallback_title.clone());
                if last_applied_title.as_deref() != Some(next_title.as_str()) {
                    window.set_title(&next_title);
                    last_applied_title = Some(next_title);
                }

                let hud = scenes.hud_active();
                if let Err(error) = renderer.render(scenes.active_world(), hud.as_ref()) {
                    warn!(error = %error, "render_failed");
                    window_target.exit();
                }
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Default)]
struct InputCollector {
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

impl InputCollector {
    fn handle_keyboard_input(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(action) = action_for_key(code) else {
            return;
        };
        let is_down = event.state == ElementState::Pressed;
        self.actions.set(action, is_down);

        if !is_down || event.repeat {
            return;
        }
        match action {
            InputAction::Attack => self.attack_pressed = true,
            InputAction::Interact => self.interact_pressed = true,
            InputAction::ToggleInventory => self.inventory_pressed = true,
            InputAction::Confirm => self.confirm_pressed = true,
            InputAction::Cancel => self.cancel_pressed = true,
            InputAction::MoveUp => self.move_up_pressed = true,
            InputAction::MoveDown => self.move_down_pressed = true,
            InputAction::WeaponSlot1 => self.weapon_slot_pressed = Some(1),
            InputAction::WeaponSlot2 => self.weapon_slot_pressed = Some(2),
            InputAction::WeaponSlot3 => self.weapon_slot_pressed = Some(3),
            InputAction::MoveLeft | InputAction::MoveRight => {}
        }
    }

    fn take_snapshot(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::empty()
            .with_attack_pressed(self.attack_pressed)
            .with_interact_pressed(self.interact_pressed)
            .with_inventory_pressed(self.inventory_pressed)
            .with_confirm_pressed(self.confirm_pressed)
            .with_cancel_pressed(self.cancel_pressed)
            .with_move_up_pressed(self.move_up_pressed)
            .with_move_down_pressed(self.move_down_pressed)
            .with_weapon_slot_pressed(self.weapon_slot_pressed);
        let snapshot = copy_held_actions(snapshot, &self.actions);

        self.attack_pressed = false;
        self.interact_pressed = false;
        self.inventory_pressed = false;
        self.confirm_pressed = false;
        self.cancel_pressed = false;
        self.move_up_pressed = false;
        self.move_down_pressed = false;
        self.weapon_slot_pressed = None;

        snapshot
    }
}

fn copy_held_actions(mut snapshot: InputSnapshot, actions: &ActionStates) -> InputSnapshot {
    for action in [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Attack,
        InputAction::Interact,
        InputAction::ToggleInventory,
        InputAction::Confirm,
        InputAction::Cancel,
        InputAction::WeaponSlot1,
        InputAction::WeaponSlot2,
        InputAction::WeaponSlot3,
    ] {
        snapshot = snapshot.with_action_down(action, actions.is_down(action));
    }
    snapshot
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::Space => Some(InputAction::Attack),
        KeyCode::KeyE => Some(InputAction::Interact),
        KeyCode::KeyI => Some(InputAction::ToggleInventory),
        KeyCode::Enter => Some(InputAction::Confirm),
        KeyCode::Escape => Some(InputAction::Cancel),
        KeyCode::Digit1 => Some(InputAction::WeaponSlot1),
        KeyCode::Digit2 => Some(InputAction::WeaponSlot2),
        KeyCode::Digit3 => Some(InputAction::WeaponSlot3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_movement_actions() {
        assert_eq!(action_for_key(KeyCode::KeyW), Some(InputAction::MoveUp));
        assert_eq!(
            action_for_key(KeyCode::ArrowRight),
            Some(InputAction::MoveRight)
        );
        assert_eq!(action_for_key(KeyCode::F24), None);
    }

    #[test]
    fn take_snapshot_clears_edge_flags() {
        let mut collector = InputCollector {
            attack_pressed: true,
            weapon_slot_pressed: Some(2),
            ..InputCollector::default()
        };

        let first = collector.take_snapshot();
        assert!(first.attack_pressed());
        assert_eq!(first.weapon_slot_pressed(), Some(2));

        let second = collector.take_snapshot();
        assert!(!second.attack_pressed());
        assert_eq!(second.weapon_slot_pressed(), None);
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }
}
