//! Perspective floor mapping, one scanline at a time.
//!
//! Each row below the horizon sits at a fixed world distance, so a row is a
//! straight segment on the floor plane. The segment is walked with a
//! constant world-space step per pixel, no division inside the loop.

use tracing::debug;

use crate::camera::Observer;
use crate::textures::Texture;

/// Floor distance per screen row below the horizon for one screen height.
#[derive(Debug, Clone)]
pub struct RowDistanceTable {
    screen_height: usize,
    // distances[r - 1] belongs to row r, r in 1..screen_height / 2
    distances: Vec<f32>,
}

impl RowDistanceTable {
    pub fn new(screen_height: usize) -> Self {
        let half = screen_height / 2;
        let distances = (1..half)
            .map(|r| 0.5 * screen_height as f32 / r as f32)
            .collect();
        Self {
            screen_height,
            distances,
        }
    }

    /// Rebuilds the table if the screen height changed. Returns whether it did.
    pub fn ensure(&mut self, screen_height: usize) -> bool {
        if self.screen_height == screen_height {
            return false;
        }
        debug!(
            from = self.screen_height,
            to = screen_height,
            "rebuilding row distance table"
        );
        *self = Self::new(screen_height);
        true
    }

    #[inline]
    pub fn screen_height(&self) -> usize {
        self.screen_height
    }

    /// Height of the floor image this table fills, horizon row included.
    #[inline]
    pub fn image_height(&self) -> usize {
        self.screen_height / 2
    }

    /// Distance for row `row` counted from the horizon; row 0 has none.
    #[inline]
    pub fn distance(&self, row: usize) -> Option<f32> {
        row.checked_sub(1).and_then(|i| self.distances.get(i).copied())
    }

    /// (row, distance) pairs from the horizon downward.
    pub fn rows(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.distances.iter().enumerate().map(|(i, &d)| (i + 1, d))
    }
}

/// Owned floor pixels, `width` by half the screen height, row 0 at the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FloorImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u32] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }
}

/// Texel coordinates of a floor point, tiling on integer world boundaries.
#[inline]
pub fn tile_coords(x: f32, y: f32, tile: usize) -> (usize, usize) {
    let n = tile as i32;
    let tx = ((x * tile as f32).floor() as i32).rem_euclid(n);
    let ty = ((y * tile as f32).floor() as i32).rem_euclid(n);
    (tx as usize, ty as usize)
}

pub struct FloorCaster {
    plane_factor: f32,
}

impl FloorCaster {
    pub fn new(plane_factor: f32) -> Self {
        Self { plane_factor }
    }

    /// Left and right edge ray directions at unit distance.
    #[inline]
    fn edge_rays(&self, observer: &Observer) -> ([f32; 2], [f32; 2]) {
        let dir = observer.direction();
        let plane = observer.plane(self.plane_factor);
        (
            [dir[0] - plane[0], dir[1] - plane[1]],
            [dir[0] + plane[0], dir[1] + plane[1]],
        )
    }

    pub fn cast(
        &self,
        observer: &Observer,
        table: &RowDistanceTable,
        texture: &Texture,
        width: usize,
    ) -> FloorImage {
        let mut image = FloorImage::new(width, table.image_height());
        self.cast_into(observer, table, texture, &mut image);
        image
    }

    /// Refills `image`, resizing it when the geometry changed. The horizon
    /// row is cleared, every other row fully overwritten.
    pub fn cast_into(
        &self,
        observer: &Observer,
        table: &RowDistanceTable,
        texture: &Texture,
        image: &mut FloorImage,
    ) {
        let width = image.width;
        let height = table.image_height();
        if image.height != height || image.pixels.len() != width * height {
            *image = FloorImage::new(width, height);
        }
        if width == 0 || height == 0 {
            return;
        }
        image.pixels[..width].fill(0);

        let tile = texture.size();
        let (left, right) = self.edge_rays(observer);
        let [px, py] = observer.pos;

        for (y, row_dist) in table.rows() {
            let step_factor = row_dist / width as f32;
            let step_x = step_factor * (right[0] - left[0]);
            let step_y = step_factor * (right[1] - left[1]);

            let mut floor_x = px + row_dist * left[0];
            let mut floor_y = py + row_dist * left[1];

            let row = &mut image.pixels[y * width..(y + 1) * width];
            for pixel in row.iter_mut() {
                let (tx, ty) = tile_coords(floor_x, floor_y, tile);
                *pixel = texture.texel(tx, ty);
                floor_x += step_x;
                floor_y += step_y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn coord_texture(n: usize) -> Texture {
        Texture::from_fn(n, |x, y| (x * 1000 + y) as u32)
    }

    #[test]
    fn test_row_distances_strictly_decrease() {
        let table = RowDistanceTable::new(540);
        assert_eq!(table.image_height(), 270);
        assert_eq!(table.rows().count(), 269);
        assert_eq!(table.distance(0), None);
        assert_eq!(table.distance(1), Some(270.0));
        assert_eq!(table.distance(270), None);

        let d: Vec<f32> = table.rows().map(|(_, d)| d).collect();
        for pair in d.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn test_ensure_rebuilds_only_on_change() {
        let mut table = RowDistanceTable::new(480);
        assert!(!table.ensure(480));
        assert!(table.ensure(240));
        assert_eq!(table.screen_height(), 240);
        assert_eq!(table.distance(1), Some(120.0));
    }

    #[test]
    fn test_tiling_repeats_per_world_unit() {
        for (x, y) in [(2.25, 0.5), (0.0, 0.0), (-3.75, 7.125), (0.984375, -0.015625)] {
            let base = tile_coords(x, y, 64);
            assert_eq!(tile_coords(x + 1.0, y, 64), base);
            assert_eq!(tile_coords(x, y + 1.0, 64), base);
            assert_eq!(tile_coords(x - 1.0, y - 1.0, 64), base);
        }
        assert_eq!(tile_coords(2.25, 0.5, 64), (16, 32));
        assert_eq!(tile_coords(-0.015625, 0.0, 64), (63, 0));
    }

    #[test]
    fn test_floor_image_shape_and_horizon() {
        let settings = Settings::default();
        let observer = Observer::new([3.5, 2.5], 0.3, &settings);
        let table = RowDistanceTable::new(40);
        let floor = FloorCaster::new(0.66).cast(&observer, &table, &coord_texture(8), 32);
        assert_eq!(floor.width, 32);
        assert_eq!(floor.height, 20);
        assert_eq!(floor.pixels.len(), 32 * 20);
        assert!(floor.row(0).iter().all(|&p| p == 0));
    }

    #[test]
    fn test_row_starts_at_left_edge_ray() {
        let settings = Settings::default();
        let observer = Observer::new([3.5, 2.5], 1.1, &settings);
        let caster = FloorCaster::new(0.66);
        let table = RowDistanceTable::new(60);
        let floor = caster.cast(&observer, &table, &coord_texture(16), 24);

        let (left, _) = caster.edge_rays(&observer);
        for (y, d) in table.rows() {
            let x = observer.pos[0] + d * left[0];
            let y_world = observer.pos[1] + d * left[1];
            let (tx, ty) = tile_coords(x, y_world, 16);
            assert_eq!(floor.row(y)[0], (tx * 1000 + ty) as u32);
        }
    }

    #[test]
    fn test_far_rows_sample_farther_points() {
        // Facing +x with two columns, column 1 lies on the heading ray and
        // samples the floor point (pos.x + d, pos.y).
        let settings = Settings::default();
        let observer = Observer::new([0.5, 0.5], 0.0, &settings);
        let table = RowDistanceTable::new(200);
        let floor = FloorCaster::new(0.66).cast(&observer, &table, &coord_texture(4), 2);

        let bottom = table.image_height() - 1;
        let d = table.distance(bottom).unwrap();
        let (tx, _) = tile_coords(0.5 + d, 0.5, 4);
        assert_eq!(floor.row(bottom)[1] / 1000, tx as u32);
    }

    #[test]
    fn test_cast_into_reuses_and_resizes() {
        let settings = Settings::default();
        let observer = Observer::new([1.5, 1.5], 0.0, &settings);
        let caster = FloorCaster::new(0.66);
        let tex = coord_texture(8);

        let mut image = FloorImage::new(16, 3);
        image.pixels.fill(0xFFFFFF);
        let table = RowDistanceTable::new(20);
        caster.cast_into(&observer, &table, &tex, &mut image);
        assert_eq!(image.height, 10);
        assert_eq!(image, caster.cast(&observer, &table, &tex, 16));
    }
}
