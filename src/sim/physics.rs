//! Per-tick body integration
//!
//! Plain Euler steps at the host frame rate. Order inside one step:
//! input → jump → gravity → move → top landing → bounds/respawn → animation.

use super::collision::{Rect, is_grounded, resolve_top_landing};
use super::state::{AnimState, Facing, Player};
use super::tick::TickInput;
use crate::consts::*;

/// Horizontal speed that still reads as standing still
const WALK_ANIM_SPEED: f32 = 0.5;

/// What happened to the body during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub jumped: bool,
    pub landed: bool,
    pub respawned: bool,
}

/// Whether a jump impulse is allowed right now
pub fn can_jump(player: &Player, platforms: &[Rect]) -> bool {
    player.vel.y.abs() < JUMP_VY_THRESHOLD
        && is_grounded(&player.bounds(), platforms, WORLD_HEIGHT, GROUND_TOLERANCE)
}

/// Advance one body by one tick
pub fn step_body(player: &mut Player, input: &TickInput, platforms: &[Rect]) -> StepOutcome {
    let mut outcome = StepOutcome::default();

    match input.horizontal {
        Some(Facing::Left) => {
            player.vel.x = -MOVE_SPEED;
            player.facing = Facing::Left;
        }
        Some(Facing::Right) => {
            player.vel.x = MOVE_SPEED;
            player.facing = Facing::Right;
        }
        None => {
            player.vel.x *= FRICTION;
            if player.vel.x.abs() < REST_SPEED {
                player.vel.x = 0.0;
            }
        }
    }

    if input.jump && can_jump(player, platforms) {
        player.vel.y = JUMP_FORCE;
        outcome.jumped = true;
    }

    player.vel.y += GRAVITY;
    player.pos += player.vel;

    outcome.landed =
        resolve_top_landing(&mut player.pos, &mut player.vel, player.size, platforms).is_some();

    player.pos.x = player.pos.x.clamp(0.0, WORLD_WIDTH - player.size.x);
    if player.pos.y > WORLD_HEIGHT {
        log::debug!("{} fell out of the world, respawning", player.id);
        player.respawn();
        outcome.respawned = true;
    }

    player.anim = if !outcome.landed && !outcome.respawned {
        AnimState::Jump
    } else if player.vel.x.abs() > WALK_ANIM_SPEED {
        AnimState::Walk
    } else {
        AnimState::Idle
    };
    player.frame = player.frame.wrapping_add(1);

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PlayerId;
    use glam::Vec2;
    use proptest::prelude::*;

    fn cat_at(x: f32, y: f32) -> Player {
        Player::new(PlayerId::new("cat"), Vec2::new(x, y))
    }

    fn floor_platform() -> Vec<Rect> {
        vec![Rect::new(0.0, 470.0, 300.0, 20.0)]
    }

    #[test]
    fn test_spawn_falls_and_lands() {
        let mut cat = cat_at(100.0, 300.0);
        let platforms = floor_platform();
        let idle = TickInput::default();

        for _ in 0..60 {
            step_body(&mut cat, &idle, &platforms);
        }

        assert_eq!(cat.pos.y + cat.size.y, 470.0);
        assert_eq!(cat.vel.y, 0.0);
        assert!(cat.vel.x.abs() < 1e-6);
        assert_eq!(cat.anim, AnimState::Idle);
    }

    #[test]
    fn test_friction_decays_not_stops() {
        let mut cat = cat_at(100.0, 430.0);
        let platforms = floor_platform();
        step_body(&mut cat, &TickInput::right(), &platforms);
        assert_eq!(cat.vel.x, MOVE_SPEED);
        assert_eq!(cat.facing, Facing::Right);

        step_body(&mut cat, &TickInput::default(), &platforms);
        assert!((cat.vel.x - MOVE_SPEED * FRICTION).abs() < 1e-5);
        step_body(&mut cat, &TickInput::default(), &platforms);
        assert!((cat.vel.x - MOVE_SPEED * FRICTION * FRICTION).abs() < 1e-5);
        // Facing sticks after release
        assert_eq!(cat.facing, Facing::Right);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let platforms = floor_platform();
        let mut cat = cat_at(100.0, 430.0);
        let outcome = step_body(&mut cat, &TickInput::jump(), &platforms);
        assert!(outcome.jumped);
        assert_eq!(cat.vel.y, JUMP_FORCE + GRAVITY);
        assert_eq!(cat.anim, AnimState::Jump);

        // Holding jump while airborne adds nothing
        for _ in 0..5 {
            let vy_before = cat.vel.y;
            let outcome = step_body(&mut cat, &TickInput::jump(), &platforms);
            assert!(!outcome.jumped);
            assert_eq!(cat.vel.y, vy_before + GRAVITY);
        }
    }

    #[test]
    fn test_no_jump_while_moving_fast_vertically() {
        let platforms = floor_platform();
        let mut cat = cat_at(100.0, 430.0);
        cat.vel.y = 3.0;
        assert!(!can_jump(&cat, &platforms));
    }

    #[test]
    fn test_side_contact_not_resolved() {
        // Falling while already beside/inside a platform does not snap on top
        let platforms = vec![Rect::new(140.0, 400.0, 100.0, 100.0)];
        let mut cat = cat_at(100.0, 420.0);
        cat.vel.y = 1.0;
        let outcome = step_body(&mut cat, &TickInput::right(), &platforms);
        assert!(!outcome.landed);
        assert_eq!(cat.pos.x, 105.0);
        assert_eq!(cat.vel.y, 1.0 + GRAVITY);
    }

    #[test]
    fn test_horizontal_clamp() {
        let mut cat = cat_at(2.0, 100.0);
        step_body(&mut cat, &TickInput::left(), &[]);
        assert_eq!(cat.pos.x, 0.0);

        let mut cat = cat_at(WORLD_WIDTH - 42.0, 100.0);
        step_body(&mut cat, &TickInput::right(), &[]);
        assert_eq!(cat.pos.x, WORLD_WIDTH - cat.size.x);
    }

    #[test]
    fn test_fall_out_respawns() {
        let mut cat = cat_at(100.0, 300.0);
        cat.pos = Vec2::new(400.0, WORLD_HEIGHT - 1.0);
        cat.vel = Vec2::new(3.0, 10.0);
        let outcome = step_body(&mut cat, &TickInput::default(), &[]);
        assert!(outcome.respawned);
        assert_eq!(cat.pos, Vec2::new(100.0, 300.0));
        assert_eq!(cat.vel, Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_gravity_adds_each_airborne_tick(vy in -12.0f32..12.0, x in 50.0f32..700.0) {
            let mut cat = cat_at(x, 200.0);
            cat.vel.y = vy;
            step_body(&mut cat, &TickInput::default(), &[]);
            prop_assert_eq!(cat.vel.y, vy + GRAVITY);
        }

        #[test]
        fn prop_landing_rests_on_surface(start_y in 100.0f32..420.0, vy in 0.0f32..10.0) {
            let platforms = floor_platform();
            let mut cat = cat_at(100.0, start_y);
            cat.vel.y = vy;
            for _ in 0..200 {
                step_body(&mut cat, &TickInput::default(), &platforms);
            }
            prop_assert_eq!(cat.pos.y + cat.size.y, 470.0);
            prop_assert_eq!(cat.vel.y, 0.0);
        }
    }
}
