mod renderer;
mod text;
mod transform;

pub use renderer::Renderer;
pub use transform::{world_to_screen, Viewport};
