use tracing::trace;

use crate::camera::Observer;
use crate::floor::{FloorCaster, FloorImage, RowDistanceTable};
use crate::projection::{ProjectionMapper, WallColumn};
use crate::raycast::WallCaster;
use crate::settings::Settings;
use crate::textures::{TextureAtlas, pack_rgb};
use crate::world::GridMap;

const SKY: u32 = pack_rgb(30, 30, 70);

/// Owns the per-resolution state of both casters and composites their
/// output into a framebuffer.
pub struct Renderer {
    walls: WallCaster,
    mapper: ProjectionMapper,
    rows: RowDistanceTable,
    floor: FloorCaster,
    floor_image: FloorImage,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            walls: WallCaster::new(settings.num_rays, settings.max_depth),
            mapper: ProjectionMapper::from_settings(settings),
            rows: RowDistanceTable::new(settings.height),
            floor: FloorCaster::new(settings.floor_plane),
            floor_image: FloorImage::new(settings.width, settings.half_height()),
        }
    }

    /// Rebuilds everything that depends on screen geometry.
    pub fn resize(&mut self, settings: &Settings) {
        self.walls = WallCaster::new(settings.num_rays, settings.max_depth);
        self.mapper = ProjectionMapper::from_settings(settings);
        self.rows.ensure(settings.height);
        if self.floor_image.width != settings.width {
            self.floor_image = FloorImage::new(settings.width, settings.half_height());
        }
    }

    /// Casts both kernels and composites sky, floor and walls into `buf`.
    pub fn render_frame(
        &mut self,
        buf: &mut [u32],
        width: usize,
        height: usize,
        map: &GridMap,
        atlas: &TextureAtlas,
        observer: &Observer,
    ) {
        let mid = height / 2;

        // Sky
        buf[..mid * width].fill(SKY);

        // Floor
        self.floor
            .cast_into(observer, &self.rows, atlas.floor(), &mut self.floor_image);
        blit_floor(buf, width, height, mid, &self.floor_image);

        // Walls, farthest first
        let hits = self.walls.cast(observer, map);
        let columns = self.mapper.project_all(&hits);
        trace!(columns = columns.len(), "wall columns");
        for column in &columns {
            draw_wall_column(buf, width, height, atlas, column);
        }
    }
}

fn blit_floor(buf: &mut [u32], width: usize, height: usize, top: usize, floor: &FloorImage) {
    let w = width.min(floor.width);
    for y in 0..floor.height {
        let dst_y = top + y;
        if dst_y >= height {
            break;
        }
        let row = dst_y * width;
        buf[row..row + w].copy_from_slice(&floor.row(y)[..w]);
    }
    // Odd heights leave one row under the floor image.
    for dst_y in (top + floor.height)..height {
        let row = dst_y * width;
        buf[row..row + width].fill(0);
    }
}

fn draw_wall_column(
    buf: &mut [u32],
    width: usize,
    height: usize,
    atlas: &TextureAtlas,
    column: &WallColumn,
) {
    let tex = match atlas.wall(column.texture) {
        Some(tex) => tex,
        None => return,
    };
    let rect = column.dest;
    let x0 = rect.x.min(width);
    let x1 = (rect.x + rect.w).min(width);
    if x0 >= x1 {
        return;
    }

    let texels = tex.sample_column(column.tex_x, column.src_y, column.src_h, rect.h);
    for (y, color) in (rect.y..).zip(texels) {
        if y >= height {
            break;
        }
        let row = y * width;
        buf[row + x0..row + x1].fill(color);
    }
}
