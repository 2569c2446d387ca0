use crate::raycast::Hit;
use crate::settings::Settings;
use crate::world::TextureId;

/// Keeps the projection finite when the observer touches a wall.
pub const PROJECTION_EPSILON: f32 = 1e-4;

/// Destination rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Screen placement of one textured wall slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallColumn {
    pub depth: f32,
    pub dest: ColumnRect,
    pub texture: TextureId,
    /// Source texel column.
    pub tex_x: usize,
    /// Source span `[src_y, src_y + src_h)` in texels.
    pub src_y: f32,
    pub src_h: f32,
}

pub struct ProjectionMapper {
    screen_height: usize,
    screen_dist: f32,
    column_width: usize,
    tex_size: usize,
}

impl ProjectionMapper {
    pub fn new(screen_height: usize, screen_dist: f32, column_width: usize, tex_size: usize) -> Self {
        Self {
            screen_height,
            screen_dist,
            column_width,
            tex_size,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.height,
            settings.screen_dist(),
            settings.column_width(),
            settings.texture_size,
        )
    }

    #[inline]
    pub fn projected_height(&self, depth: f32) -> f32 {
        self.screen_dist / (depth + PROJECTION_EPSILON)
    }

    /// Places the hit of ray `ray`. A miss produces no column.
    pub fn project(&self, ray: usize, hit: &Hit) -> Option<WallColumn> {
        let wall = match hit {
            Hit::Wall(wall) => wall,
            Hit::Miss => return None,
        };

        let tex = self.tex_size as f32;
        let screen_h = self.screen_height as f32;
        let proj_height = self.projected_height(wall.depth);
        let tex_x = ((wall.offset * tex) as usize).min(self.tex_size - 1);
        let x = ray * self.column_width;

        let (dest, src_y, src_h) = if proj_height < screen_h {
            // Whole tile stretched to the projected height, centred on the horizon.
            let h = proj_height as usize;
            let y = self.screen_height / 2 - h / 2;
            (ColumnRect { x, y, w: self.column_width, h }, 0.0, tex)
        } else {
            // Near wall: only the visible middle of the tile fills the screen.
            let span = tex * screen_h / proj_height;
            let rect = ColumnRect {
                x,
                y: 0,
                w: self.column_width,
                h: self.screen_height,
            };
            (rect, 0.5 * tex - 0.5 * span, span)
        };

        Some(WallColumn {
            depth: wall.depth,
            dest,
            texture: wall.texture,
            tex_x,
            src_y,
            src_h,
        })
    }

    /// Projects a whole frame and orders the columns farthest first, ready for
    /// painter's-order compositing.
    pub fn project_all(&self, hits: &[Hit]) -> Vec<WallColumn> {
        let mut columns: Vec<WallColumn> = hits
            .iter()
            .enumerate()
            .filter_map(|(ray, hit)| self.project(ray, hit))
            .collect();
        columns.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        columns
    }
}
