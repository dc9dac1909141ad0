use crate::components::geometry::{Rect, Vec2};
use crate::data::sprites::SPRITE_SIZE;
use crate::rules::context::WorkArea;

/// Constant downward acceleration applied to airborne characters outside
/// the Fall branch (jump arcs, walked-off ledges).
pub const GRAVITY_STEP: f64 = 0.5;

/// Fixed flight time, in steps, of a targeted jump parabola.
pub const JUMP_TICKS: f64 = 30.0;

/// Launch speed of an untargeted jump when the action supplies none.
pub const DEFAULT_LAUNCH: f64 = 20.0;

/// Horizontal friction applied on the ground when no pose supplies a new
/// velocity and the falling config is unavailable.
pub const DEFAULT_FRICTION: f64 = 0.1;

/// Grounded actions that hold zero horizontal velocity outright.
pub const STATIC_ACTIONS: [&str; 5] = [
    "Stand",
    "Sit",
    "Sprawl",
    "SitAndLookUp",
    "SitAndLookAtMouse",
];

pub fn is_static_action(name: &str) -> bool {
    STATIC_ACTIONS.contains(&name)
}

/// Fall branch: exponential drift decay plus constant downward
/// acceleration.
pub fn fall_step(velocity: &mut Vec2, gravity: f64, resistance_x: f64, resistance_y: f64) {
    velocity.x *= 1.0 - resistance_x;
    velocity.y = velocity.y * (1.0 - resistance_y) + gravity;
}

/// Entry-frame velocity of a jump. With a target pair, solve the fixed-time
/// parabola; otherwise launch straight up.
pub fn jump_entry_velocity(from: Vec2, target: Option<(f64, f64)>, launch: f64) -> Vec2 {
    match target {
        Some((tx, ty)) => {
            let dx = tx - from.x;
            let dy = ty - from.y;
            Vec2::new(
                dx / JUMP_TICKS,
                (dy - 0.5 * GRAVITY_STEP * JUMP_TICKS * JUMP_TICKS) / JUMP_TICKS,
            )
        }
        None => Vec2::new(0.0, -launch),
    }
}

/// Direction-aware target crossing for the jump branch.
pub fn jump_crossed_target(x: f64, vx: f64, target_x: f64) -> bool {
    if vx >= 0.0 {
        x >= target_x
    } else {
        x <= target_x
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    /// Came to rest on the element top or the screen floor this step.
    pub landed: bool,
}

/// Resolve collisions after integration, in order: element top (falling
/// only, within span), screen floor, horizontal clamps (flip facing),
/// ceiling.
pub fn resolve_collisions(
    position: &mut Vec2,
    velocity: &mut Vec2,
    look_right: &mut bool,
    work_area: WorkArea,
    platform: Option<Rect>,
) -> CollisionOutcome {
    let mut outcome = CollisionOutcome::default();

    if let Some(rect) = platform {
        let bottom = position.y + SPRITE_SIZE;
        let was_above = bottom - velocity.y <= rect.top();
        if velocity.y >= 0.0
            && rect.spans_x(position.x + SPRITE_SIZE / 2.0)
            && bottom >= rect.top()
            && was_above
        {
            position.y = rect.top() - SPRITE_SIZE;
            velocity.y = 0.0;
            outcome.landed = true;
        }
    }

    if !outcome.landed && position.y >= work_area.floor {
        position.y = work_area.floor;
        velocity.y = 0.0;
        outcome.landed = true;
    }

    if position.x < work_area.left {
        position.x = work_area.left;
        *look_right = true;
    } else if position.x > work_area.right {
        position.x = work_area.right;
        *look_right = false;
    }

    if position.y < work_area.top {
        position.y = work_area.top;
        velocity.y = 0.0;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_area() -> WorkArea {
        WorkArea::from_viewport(1280.0, 720.0)
    }

    #[test]
    fn fall_decays_and_accelerates() {
        let mut velocity = Vec2::new(10.0, 4.0);
        fall_step(&mut velocity, 2.0, 0.1, 0.0);
        assert!((velocity.x - 9.0).abs() < 1e-9);
        assert!((velocity.y - 6.0).abs() < 1e-9);
    }

    #[test]
    fn jump_parabola_matches_fixed_time_solution() {
        let velocity = jump_entry_velocity(Vec2::ZERO, Some((300.0, 100.0)), DEFAULT_LAUNCH);
        assert!((velocity.x - 10.0).abs() < 1e-9);
        assert!((velocity.y - (100.0 - 225.0) / 30.0).abs() < 1e-9);
    }

    #[test]
    fn untargeted_jump_launches_up() {
        let velocity = jump_entry_velocity(Vec2::ZERO, None, 20.0);
        assert_eq!(velocity, Vec2::new(0.0, -20.0));
    }

    #[test]
    fn crossing_is_direction_aware() {
        assert!(jump_crossed_target(301.0, 10.0, 300.0));
        assert!(!jump_crossed_target(299.0, 10.0, 300.0));
        assert!(jump_crossed_target(299.0, -10.0, 300.0));
        assert!(!jump_crossed_target(301.0, -10.0, 300.0));
    }

    #[test]
    fn floor_clamp_is_idempotent() {
        let area = work_area();
        let mut position = Vec2::new(100.0, area.floor + 30.0);
        let mut velocity = Vec2::new(0.0, 12.0);
        let mut look_right = false;
        let outcome =
            resolve_collisions(&mut position, &mut velocity, &mut look_right, area, None);
        assert!(outcome.landed);
        assert_eq!(position.y, area.floor);
        assert_eq!(velocity.y, 0.0);

        let again =
            resolve_collisions(&mut position, &mut velocity, &mut look_right, area, None);
        assert!(again.landed);
        assert_eq!(position.y, area.floor);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn platform_wins_over_floor() {
        let area = work_area();
        let platform = Rect::new(50.0, 400.0, 300.0, 40.0);
        // Falling straight through the platform top this step.
        let mut position = Vec2::new(100.0, 400.0 - SPRITE_SIZE + 6.0);
        let mut velocity = Vec2::new(0.0, 10.0);
        let mut look_right = false;
        let outcome = resolve_collisions(
            &mut position,
            &mut velocity,
            &mut look_right,
            area,
            Some(platform),
        );
        assert!(outcome.landed);
        assert_eq!(position.y, 400.0 - SPRITE_SIZE);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn rising_character_passes_platform() {
        let area = work_area();
        let platform = Rect::new(50.0, 400.0, 300.0, 40.0);
        let mut position = Vec2::new(100.0, 400.0 - SPRITE_SIZE + 6.0);
        let mut velocity = Vec2::new(0.0, -10.0);
        let mut look_right = false;
        let outcome = resolve_collisions(
            &mut position,
            &mut velocity,
            &mut look_right,
            area,
            Some(platform),
        );
        assert!(!outcome.landed);
        assert_eq!(velocity.y, -10.0);
    }

    #[test]
    fn edge_clamps_flip_facing() {
        let area = work_area();
        let mut position = Vec2::new(-5.0, area.floor);
        let mut velocity = Vec2::new(-3.0, 0.0);
        let mut look_right = false;
        resolve_collisions(&mut position, &mut velocity, &mut look_right, area, None);
        assert_eq!(position.x, 0.0);
        assert!(look_right);

        let mut position = Vec2::new(area.right + 5.0, area.floor);
        let mut look_right = true;
        resolve_collisions(&mut position, &mut velocity, &mut look_right, area, None);
        assert_eq!(position.x, area.right);
        assert!(!look_right);
    }

    #[test]
    fn ceiling_zeroes_vertical_velocity() {
        let area = work_area();
        let mut position = Vec2::new(100.0, -10.0);
        let mut velocity = Vec2::new(0.0, -8.0);
        let mut look_right = false;
        resolve_collisions(&mut position, &mut velocity, &mut look_right, area, None);
        assert_eq!(position.y, 0.0);
        assert_eq!(velocity.y, 0.0);
    }
}
