fn distance_between(a: Vec2, b: Vec2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide.
fn direction_toward(from: Vec2, to: Vec2) -> Option<Vec2> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        return None;
    }
    let inv_length = length_sq.sqrt().recip();
    Some(Vec2 {
        x: dx * inv_length,
        y: dy * inv_length,
    })
}

/// Facing from a velocity, preferring the dominant axis; zero velocity keeps
/// the previous facing.
fn facing_from_velocity(velocity: Vec2, current: CardinalFacing) -> CardinalFacing {
    if velocity.x == 0.0 && velocity.y == 0.0 {
        return current;
    }
    if velocity.x.abs() >= velocity.y.abs() {
        if velocity.x > 0.0 {
            CardinalFacing::East
        } else {
            CardinalFacing::West
        }
    } else if velocity.y > 0.0 {
        CardinalFacing::South
    } else {
        CardinalFacing::North
    }
}
