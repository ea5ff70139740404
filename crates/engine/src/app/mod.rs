mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{world_to_screen, Renderer, Viewport};
pub use scene::{
    Camera2D, CardinalFacing, Entity, EntityId, EntityVisual, HudFrame, InputSnapshot, MenuPanel,
    MotionClip, Rect, RenderLayer, Renderable, Scene, SceneCommand, SceneKey, SceneWorld, Tilemap,
    TilemapError, Vec2,
};
