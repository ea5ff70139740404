use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World pixels to screen pixels. Both spaces are y-down; the camera position
/// is the world point shown at the viewport center.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let x = world.x - camera.position.x + viewport.width as f32 * 0.5;
    let y = world.y - camera.position.y + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = Camera2D {
            position: Vec2 { x: 128.0, y: 96.0 },
        };
        let (x, y) = world_to_screen(Vec2 { x: 128.0, y: 96.0 }, &camera, viewport);
        assert_eq!(x, 400);
        assert_eq!(y, 300);
    }

    #[test]
    fn world_offset_shifts_screen_position_y_down() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = Camera2D {
            position: Vec2 { x: 0.0, y: 0.0 },
        };
        let (x, y) = world_to_screen(Vec2 { x: 10.0, y: -20.0 }, &camera, viewport);
        assert_eq!(x, 410);
        assert_eq!(y, 280);
    }
}
