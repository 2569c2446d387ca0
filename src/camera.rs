use std::f32::consts::TAU;

use crate::settings::Settings;
use crate::world::GridMap;

/// Closest the observer may get to a wall face, in grid units.
pub const COLLISION_MARGIN: f32 = 0.2;

/// First-person viewpoint. Written once per frame by movement, read-only to
/// the casters.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    pub pos: [f32; 2],    // (x, y) in grid units
    pub angle: f32,       // radians, heading in [0, 2pi)
    pub half_fov: f32,    // radians
    pub screen_dist: f32, // projection plane distance in pixels
}

impl Observer {
    pub fn new(pos: [f32; 2], angle: f32, settings: &Settings) -> Self {
        let mut observer = Self {
            pos,
            angle: 0.0,
            half_fov: 0.0,
            screen_dist: 0.0,
        };
        observer.set_angle(angle);
        observer.set_fov_from_horizontal(settings.width as f32, settings.fov_degrees);
        observer
    }

    pub fn set_fov_from_horizontal(&mut self, width: f32, fov_x_deg: f32) {
        self.half_fov = 0.5 * fov_x_deg.to_radians();
        self.screen_dist = 0.5 * width / self.half_fov.tan();
    }

    #[inline]
    pub fn set_angle(&mut self, angle: f32) {
        let a = angle.rem_euclid(TAU);
        // rem_euclid can round up to TAU itself for tiny negative inputs
        self.angle = if a >= TAU { 0.0 } else { a };
    }

    #[inline]
    pub fn turn(&mut self, delta: f32) {
        self.set_angle(self.angle + delta);
    }

    #[inline]
    pub fn map_cell(&self) -> (i32, i32) {
        (self.pos[0].floor() as i32, self.pos[1].floor() as i32)
    }

    /// Moves by (dx, dy), one axis at a time, skipping any axis whose
    /// destination (padded by the collision margin) is inside a wall. The
    /// observer slides along walls instead of stopping dead.
    pub fn slide(&mut self, dx: f32, dy: f32, map: &GridMap) {
        if dx != 0.0 && map.is_open(self.pos[0] + dx + COLLISION_MARGIN.copysign(dx), self.pos[1]) {
            self.pos[0] += dx;
        }
        if dy != 0.0 && map.is_open(self.pos[0], self.pos[1] + dy + COLLISION_MARGIN.copysign(dy)) {
            self.pos[1] += dy;
        }
    }

    /// Unit heading vector.
    #[inline]
    pub fn direction(&self) -> [f32; 2] {
        let (s, c) = self.angle.sin_cos();
        [c, s]
    }

    /// Heading rotated 90 degrees, scaled to half the visible width at unit
    /// distance.
    #[inline]
    pub fn plane(&self, factor: f32) -> [f32; 2] {
        let (s, c) = self.angle.sin_cos();
        [-s * factor, c * factor]
    }
}
