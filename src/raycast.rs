//! Grid-DDA wall casting.
//!
//! Every ray runs two independent marches, one across horizontal grid lines
//! (`y = k`) and one across vertical grid lines (`x = k`). The nearer
//! crossing wins, then its length is projected onto the view direction to
//! remove the fisheye distortion.

use tracing::trace;

use crate::camera::Observer;
use crate::world::{Cell, GridMap, TextureId};

/// Added to the first ray so no ray in the sweep starts on an exact axis.
pub const RAY_ANGLE_NUDGE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Distance perpendicular to the view plane.
    pub depth: f32,
    /// Euclidean length of the ray up to the crossing.
    pub ray_length: f32,
    pub texture: TextureId,
    /// Horizontal position inside the tile, in [0, 1).
    pub offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Wall(WallHit),
    /// No wall within the search bound; the column stays empty.
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lines {
    Horizontal,
    Vertical,
}

impl Lines {
    /// (index of the axis whose lines are crossed, index of the other axis)
    #[inline]
    fn axes(self) -> (usize, usize) {
        match self {
            Lines::Horizontal => (1, 0),
            Lines::Vertical => (0, 1),
        }
    }

    #[inline]
    fn cell(self, across: i32, along: i32) -> (i32, i32) {
        match self {
            Lines::Horizontal => (along, across),
            Lines::Vertical => (across, along),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Crossing {
    depth: f32,
    /// Coordinate of the crossing point along the struck line.
    along: f32,
    texture: TextureId,
}

/// Marches across one family of grid lines. Returns the first crossing whose
/// far-side cell is a wall, or `None` when the direction never crosses that
/// family or `max_steps` lines were tested without a hit.
fn march(
    map: &GridMap,
    origin: [f32; 2],
    dir: [f32; 2],
    max_steps: usize,
    lines: Lines,
) -> Option<Crossing> {
    let (m, n) = lines.axes();
    let d = dir[m];
    if d == 0.0 {
        return None;
    }

    let start = origin[m].floor() as i32;
    // `line` is the first grid line ahead, `cell` the cell just beyond it.
    let (step, line, mut cell) = if d > 0.0 {
        (1, start + 1, start + 1)
    } else {
        (-1, start, start - 1)
    };

    let delta_depth = step as f32 / d;
    let mut depth = (line as f32 - origin[m]) / d;

    for _ in 0..max_steps {
        let along = origin[n] + depth * dir[n];
        if let Cell::Wall(texture) = map.lookup(lines.cell(cell, along.floor() as i32)) {
            return Some(Crossing {
                depth,
                along,
                texture,
            });
        }
        cell += step;
        depth += delta_depth;
    }
    None
}

/// Fractional part in [0, 1), also for negative inputs.
#[inline]
fn unit_fract(v: f32) -> f32 {
    let f = v - v.floor();
    if f >= 1.0 { 0.0 } else { f }
}

/// Picks the nearer crossing; the vertical one must be strictly nearer.
/// Returns (ray length, texture, texel offset).
fn merge(
    hor: Option<Crossing>,
    vert: Option<Crossing>,
    sin_a: f32,
    cos_a: f32,
) -> Option<(f32, TextureId, f32)> {
    let use_vert = match (hor, vert) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(h), Some(v)) => v.depth < h.depth,
    };

    if use_vert {
        let v = vert?;
        let f = unit_fract(v.along);
        let offset = if cos_a > 0.0 { f } else { unit_fract(1.0 - f) };
        Some((v.depth, v.texture, offset))
    } else {
        let h = hor?;
        let f = unit_fract(h.along);
        let offset = if sin_a > 0.0 { unit_fract(1.0 - f) } else { f };
        Some((h.depth, h.texture, offset))
    }
}

/// Casts a single ray at `ray_angle` and corrects its length against the
/// observer's heading.
pub fn cast_ray(
    map: &GridMap,
    origin: [f32; 2],
    ray_angle: f32,
    view_angle: f32,
    max_depth: usize,
) -> Hit {
    let (sin_a, cos_a) = ray_angle.sin_cos();
    let dir = [cos_a, sin_a];

    let hor = march(map, origin, dir, max_depth, Lines::Horizontal);
    let vert = march(map, origin, dir, max_depth, Lines::Vertical);

    match merge(hor, vert, sin_a, cos_a) {
        Some((ray_length, texture, offset)) => Hit::Wall(WallHit {
            depth: ray_length * (view_angle - ray_angle).cos(),
            ray_length,
            texture,
            offset,
        }),
        None => Hit::Miss,
    }
}

/// Sweeps `num_rays` rays evenly across the field of view, left to right.
pub struct WallCaster {
    num_rays: usize,
    max_depth: usize,
}

impl WallCaster {
    pub fn new(num_rays: usize, max_depth: usize) -> Self {
        Self {
            num_rays,
            max_depth,
        }
    }

    #[inline]
    pub fn num_rays(&self) -> usize {
        self.num_rays
    }

    #[inline]
    pub fn delta_angle(&self, observer: &Observer) -> f32 {
        2.0 * observer.half_fov / self.num_rays as f32
    }

    /// Angle of ray `i`. Computed from the index rather than accumulated so
    /// the sweep does not drift.
    #[inline]
    pub fn ray_angle(&self, observer: &Observer, i: usize) -> f32 {
        observer.angle - observer.half_fov + RAY_ANGLE_NUDGE + i as f32 * self.delta_angle(observer)
    }

    /// One result per screen column.
    pub fn cast(&self, observer: &Observer, map: &GridMap) -> Vec<Hit> {
        let hits: Vec<Hit> = (0..self.num_rays)
            .map(|i| {
                let ray_angle = self.ray_angle(observer, i);
                cast_ray(map, observer.pos, ray_angle, observer.angle, self.max_depth)
            })
            .collect();

        let misses = hits.iter().filter(|h| matches!(h, Hit::Miss)).count();
        if misses > 0 {
            trace!(misses, "rays exhausted their search depth");
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-4;

    fn wall(hit: Hit) -> WallHit {
        match hit {
            Hit::Wall(w) => w,
            Hit::Miss => panic!("expected a wall hit"),
        }
    }

    /// One open cell at (1, 1) walled in with a different texture per side.
    fn room() -> GridMap {
        let mut map = GridMap::default();
        map.set_wall((2, 1), 1); // east
        map.set_wall((1, 2), 2); // south (+y)
        map.set_wall((0, 1), 3); // west
        map.set_wall((1, 0), 4); // north (-y)
        map
    }

    #[test]
    fn test_room_faces_each_wall() {
        let map = room();
        let origin = [1.5, 1.5];
        for (angle, texture) in [(0.0, 1), (FRAC_PI_2, 2), (PI, 3), (1.5 * PI, 4)] {
            let w = wall(cast_ray(&map, origin, angle, angle, 20));
            assert_eq!(w.texture, texture, "angle {}", angle);
            assert!((w.depth - 0.5).abs() < EPS, "angle {} depth {}", angle, w.depth);
            assert!((w.offset - 0.5).abs() < EPS);
        }
    }

    #[test]
    fn test_room_center_ray_of_sweep() {
        let settings = Settings {
            width: 9,
            num_rays: 9,
            ..Settings::default()
        };
        let observer = Observer::new([1.5, 1.5], 0.0, &settings);
        let caster = WallCaster::new(9, 20);
        let hits = caster.cast(&observer, &room());
        assert_eq!(hits.len(), 9);

        // With an odd ray count and half a step of offset, ray 4 sits at
        // half a delta from the heading; close enough for a flat wall.
        let center = wall(hits[4]);
        assert_eq!(center.texture, 1);
        assert!((center.depth - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_corridor_length() {
        // Corridor along +x from cell 1 to cell 10, capped by a wall at x = 11.
        let mut map = GridMap::default();
        for x in 0..=11 {
            map.set_wall((x, 0), 2);
            map.set_wall((x, 2), 2);
        }
        map.set_wall((0, 1), 3);
        map.set_wall((11, 1), 1);

        let origin = [1.0, 1.5];
        let w = wall(cast_ray(&map, origin, 0.0, 0.0, 20));
        assert_eq!(w.texture, 1);
        assert!((w.depth - 10.0).abs() < EPS);
        assert!((w.ray_length - 10.0).abs() < EPS);
    }

    #[test]
    fn test_center_ray_uncorrected_edges_shorter() {
        let mut map = GridMap::default();
        for y in -20..20 {
            map.set_wall((5, y), 1);
        }
        let origin = [0.5, 0.5];

        let center = wall(cast_ray(&map, origin, 0.0, 0.0, 20));
        assert_eq!(center.depth, center.ray_length);

        let edge = wall(cast_ray(&map, origin, 0.5, 0.0, 20));
        assert!(edge.depth < edge.ray_length);
    }

    #[test]
    fn test_symmetric_rays_on_flat_wall() {
        // Wall plane at x = 4, observer 3.5 units away facing it.
        let mut map = GridMap::default();
        for y in -20..20 {
            map.set_wall((4, y), 1);
        }
        let origin = [0.5, 0.5];
        let perp = 3.5;
        let heading = 0.0;

        for delta in [0.1_f32, 0.3, 0.5] {
            let left = wall(cast_ray(&map, origin, heading - delta, heading, 20));
            let right = wall(cast_ray(&map, origin, heading + delta, heading, 20));

            let expected_len = perp / delta.cos();
            assert!((left.ray_length - expected_len).abs() < 1e-3);
            assert!((right.ray_length - expected_len).abs() < 1e-3);
            assert!((left.depth - right.depth).abs() < 1e-3);
            assert!((left.depth - perp).abs() < 1e-3);
            assert!((right.depth - left.ray_length * delta.cos()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_true_perpendicular_distance() {
        let map = GridMap::parse(crate::world::DEFAULT_LEVEL).unwrap();
        // Facing north (-y) from row 6: the border wall's lower face is y = 1.
        let origin = [2.25, 6.75];
        let angle = 1.5 * PI;
        let w = wall(cast_ray(&map, origin, angle, angle, 20));
        assert_eq!(w.texture, 1);
        assert!((w.depth - 5.75).abs() < EPS);
    }

    #[test]
    fn test_offset_in_unit_range() {
        let map = GridMap::parse(crate::world::DEFAULT_LEVEL).unwrap();
        let settings = Settings::default();
        let caster = WallCaster::new(settings.num_rays, settings.max_depth);
        let positions = [[1.5, 1.5], [2.0, 6.0], [14.9, 7.9], [7.3, 3.1], [10.01, 1.99]];
        for pos in positions {
            for k in 0..16 {
                let observer = Observer::new(pos, k as f32 * PI / 8.0, &settings);
                for hit in caster.cast(&observer, &map) {
                    let w = wall(hit);
                    assert!((0.0..1.0).contains(&w.offset), "offset {}", w.offset);
                    assert!(w.depth > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_offset_orientation_is_mirrored() {
        // Facing the east wall the offset grows with y; facing the west wall
        // it shrinks with y, so both read left-to-right from the viewer.
        let map = room();
        let east = wall(cast_ray(&map, [1.5, 1.25], 0.0, 0.0, 20));
        let west = wall(cast_ray(&map, [1.5, 1.25], PI, PI, 20));
        assert!((east.offset - 0.25).abs() < EPS);
        assert!((west.offset - 0.75).abs() < EPS);
    }

    #[test]
    fn test_exhausted_search_is_miss() {
        let mut map = GridMap::default();
        map.set_wall((30, 0), 1);
        assert_eq!(cast_ray(&map, [0.5, 0.5], 0.0, 0.0, 20), Hit::Miss);
        assert!(matches!(cast_ray(&map, [0.5, 0.5], 0.0, 0.0, 40), Hit::Wall(_)));
        assert_eq!(cast_ray(&GridMap::default(), [0.5, 0.5], 1.0, 1.0, 20), Hit::Miss);
    }

    #[test]
    fn test_negative_direction_enters_correct_cell() {
        // Stepping toward -x from far out must test cell 19, not 20.
        let mut map = GridMap::default();
        map.set_wall((19, 0), 5);
        map.set_wall((20, 0), 1);
        let w = wall(cast_ray(&map, [25.5, 0.5], PI, PI, 20));
        assert_eq!(w.texture, 1);
        let w = wall(cast_ray(&map, [20.0, 0.5], PI, PI, 20));
        assert_eq!(w.texture, 5);
        assert!(w.depth.abs() < EPS);
    }

    #[test]
    fn test_tie_favours_horizontal() {
        let h = Crossing { depth: 2.0, along: 3.25, texture: 1 };
        let v = Crossing { depth: 2.0, along: 4.5, texture: 2 };
        let (len, tex, _) = merge(Some(h), Some(v), 0.7, 0.7).unwrap();
        assert_eq!((len, tex), (2.0, 1));

        let nearer = Crossing { depth: 1.999, ..v };
        let (_, tex, _) = merge(Some(h), Some(nearer), 0.7, 0.7).unwrap();
        assert_eq!(tex, 2);

        assert_eq!(merge(None, None, 0.7, 0.7), None);
    }

    #[test]
    fn test_axis_aligned_ray_skips_parallel_lines() {
        let map = room();
        assert_eq!(march(&map, [1.5, 1.5], [1.0, 0.0], 20, Lines::Horizontal), None);
        let v = march(&map, [1.5, 1.5], [1.0, 0.0], 20, Lines::Vertical).unwrap();
        assert_eq!(v.texture, 1);
    }

    #[test]
    fn test_unit_fract() {
        assert_eq!(unit_fract(2.25), 0.25);
        assert_eq!(unit_fract(-0.25), 0.75);
        assert!(unit_fract(-1e-9) < 1.0);
    }
}
