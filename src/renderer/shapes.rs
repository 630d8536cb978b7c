//! Shape generation for 2D primitives
//!
//! Everything is emitted in world pixels (y down); the pipeline maps to NDC.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::{Vertex, colors};
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::session::FrameSnapshot;
use crate::sim::{AnimState, Facing, Fish, Rect};

/// Height of the grass strip drawn on platform tops
const PLATFORM_TOP: f32 = 4.0;

/// Two triangles covering a rect
pub fn rect(r: &Rect, color: [f32; 4]) -> Vec<Vertex> {
    let (l, t, rt, b) = (r.left(), r.top(), r.right(), r.bottom());
    vec![
        Vertex::new(l, t, color),
        Vertex::new(rt, t, color),
        Vertex::new(l, b, color),
        Vertex::new(l, b, color),
        Vertex::new(rt, t, color),
        Vertex::new(rt, b, color),
    ]
}

pub fn triangle(a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
    ]
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

pub fn platform(r: &Rect) -> Vec<Vertex> {
    let mut vertices = rect(r, colors::PLATFORM);
    let top = Rect::new(r.x, r.y, r.w, PLATFORM_TOP.min(r.h));
    vertices.extend(rect(&top, colors::PLATFORM_TOP));
    vertices
}

/// Body, two ears, and a walk bob. Jumping cats stretch a little.
pub fn cat(
    pos: Vec2,
    size: Vec2,
    facing: Facing,
    anim: AnimState,
    frame: u32,
    color: [f32; 4],
) -> Vec<Vertex> {
    let bob = match anim {
        AnimState::Walk if (frame / 6) % 2 == 1 => 2.0,
        _ => 0.0,
    };
    let stretch = if anim == AnimState::Jump { 4.0 } else { 0.0 };

    let body = Rect::new(
        pos.x + stretch / 2.0,
        pos.y + size.y * 0.3 - stretch + bob,
        size.x - stretch,
        size.y * 0.7 + stretch - bob,
    );
    let mut vertices = rect(&body, color);

    // Head leads in the facing direction
    let head_w = size.x * 0.5;
    let head_x = match facing {
        Facing::Right => pos.x + size.x - head_w,
        Facing::Left => pos.x,
    };
    let head = Rect::new(head_x, body.y - size.y * 0.25, head_w, size.y * 0.35);
    vertices.extend(rect(&head, color));

    for ear_x in [head.left(), head.right() - head_w * 0.4] {
        vertices.extend(triangle(
            Vec2::new(ear_x, head.top()),
            Vec2::new(ear_x + head_w * 0.4, head.top()),
            Vec2::new(ear_x + head_w * 0.2, head.top() - size.y * 0.15),
            colors::CAT_EAR,
        ));
    }
    vertices
}

pub fn fish(r: &Rect) -> Vec<Vertex> {
    let body = Rect::new(r.x + r.w * 0.3, r.y + r.h * 0.2, r.w * 0.7, r.h * 0.6);
    let mut vertices = rect(&body, colors::FISH);
    vertices.extend(triangle(
        Vec2::new(r.x, r.y),
        Vec2::new(r.x, r.bottom()),
        Vec2::new(body.x, r.y + r.h / 2.0),
        colors::FISH_TAIL,
    ));
    let eye = Vec2::new(body.right() - body.w * 0.2, body.y + body.h * 0.35);
    vertices.extend(circle(eye, 1.5, colors::CAT_EAR, 6));
    vertices
}

/// Scratching post with rope bands
pub fn post(r: &Rect) -> Vec<Vertex> {
    let mut vertices = rect(r, colors::POST);
    let band = r.h / 8.0;
    for i in (1..8).step_by(2) {
        let y = r.y + band * i as f32;
        vertices.extend(rect(&Rect::new(r.x, y, r.w, band * 0.5), colors::POST_ROPE));
    }
    vertices
}

/// A fish held above a cat's head
fn carried_fish(pos: Vec2, size: Vec2) -> Vec<Vertex> {
    fish(&Rect::new(pos.x + size.x * 0.2, pos.y - 14.0, 25.0, 12.0))
}

fn visible_fish(fish_list: &[Fish]) -> impl Iterator<Item = &Fish> {
    fish_list.iter().filter(|f| f.is_available())
}

/// All geometry for one frame, back to front
pub fn snapshot_vertices(snapshot: &FrameSnapshot) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(512);

    for p in &snapshot.platforms {
        vertices.extend(platform(p));
    }
    vertices.extend(post(&snapshot.goal));
    for f in visible_fish(&snapshot.fish) {
        vertices.extend(fish(&f.rect));
    }

    let cat_size = snapshot.player.size;
    for remote in &snapshot.remotes {
        vertices.extend(cat(
            remote.pos,
            cat_size,
            remote.facing,
            remote.anim,
            0,
            colors::REMOTE_CAT,
        ));
        if remote.carrying {
            vertices.extend(carried_fish(remote.pos, cat_size));
        }
    }

    let player = &snapshot.player;
    vertices.extend(cat(
        player.pos,
        player.size,
        player.facing,
        player.anim,
        player.frame,
        colors::CAT,
    ));
    if snapshot.hud.carrying {
        vertices.extend(carried_fish(player.pos, player.size));
    }

    if snapshot.hud.phase.is_over() {
        vertices.extend(rect(
            &Rect::new(0.0, 0.0, WORLD_WIDTH, WORLD_HEIGHT),
            colors::DIM,
        ));
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Message, Session};
    use crate::net::Identity;
    use crate::sim::{LevelCatalog, Rules};

    #[test]
    fn test_rect_covers_corners() {
        let vertices = rect(&Rect::new(10.0, 20.0, 30.0, 40.0), colors::CAT);
        assert_eq!(vertices.len(), 6);
        let xs: Vec<f32> = vertices.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = vertices.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 40.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 20.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 60.0);
    }

    #[test]
    fn test_cat_head_follows_facing() {
        let pos = Vec2::new(100.0, 100.0);
        let size = Vec2::new(40.0, 40.0);
        let right = cat(pos, size, Facing::Right, AnimState::Idle, 0, colors::CAT);
        let left = cat(pos, size, Facing::Left, AnimState::Idle, 0, colors::CAT);
        // Head quad follows the body quad
        assert_eq!(right[6].position[0], 120.0);
        assert_eq!(left[6].position[0], 100.0);
    }

    #[test]
    fn test_game_over_dims_screen() {
        let mut session = Session::single_player(
            Identity::new("me", "Me"),
            Rules::single_player(),
            LevelCatalog::builtin(),
            1,
        );
        let playing = snapshot_vertices(&session.frame(0.0).unwrap());
        for _ in 0..90 {
            session.post(Message::TimerSecond);
        }
        let over = snapshot_vertices(&session.frame(16.0).unwrap());
        assert!(over.len() > playing.len());
        assert_eq!(over.last().unwrap().color, colors::DIM);
    }
}
