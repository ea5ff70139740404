/// Whether a body rectangle stands clear of terrain and obstacle rectangles.
/// Terrain is sampled at the four corners inset by a small margin; the inset
/// keeps floating-point edge snapping at tile boundaries from rejecting a
/// body that visually fits.
fn can_occupy(map: &WorldMap, body: Rect, obstacles: &[Rect]) -> bool {
    let margin = COLLISION_CORNER_MARGIN_PX;
    let corners = [
        (body.x + margin, body.y + margin),
        (body.x + body.w - margin, body.y + margin),
        (body.x + margin, body.y + body.h - margin),
        (body.x + body.w - margin, body.y + body.h - margin),
    ];
    if corners
        .iter()
        .any(|(corner_x, corner_y)| !map.is_walkable(*corner_x, *corner_y))
    {
        return false;
    }
    !obstacles.iter().any(|obstacle| body.intersects(obstacle))
}

fn offset_rect(body: Rect, dx: f32, dy: f32) -> Rect {
    Rect {
        x: body.x + dx,
        y: body.y + dy,
        ..body
    }
}

/// Per-axis movement resolution: try the full displacement, then the
/// horizontal component alone, then the vertical component alone, else stop.
/// Diagonal motion into a wall slides along the open axis.
fn resolve_movement(
    map: &WorldMap,
    body: Rect,
    velocity: Vec2,
    dt: f32,
    obstacles: &[Rect],
) -> Vec2 {
    if velocity.x == 0.0 && velocity.y == 0.0 {
        return velocity;
    }

    let dx = velocity.x * dt;
    let dy = velocity.y * dt;

    if can_occupy(map, offset_rect(body, dx, dy), obstacles) {
        return velocity;
    }
    if velocity.x != 0.0 && can_occupy(map, offset_rect(body, dx, 0.0), obstacles) {
        return Vec2 {
            x: velocity.x,
            y: 0.0,
        };
    }
    if velocity.y != 0.0 && can_occupy(map, offset_rect(body, 0.0, dy), obstacles) {
        return Vec2 {
            x: 0.0,
            y: velocity.y,
        };
    }
    Vec2::default()
}
