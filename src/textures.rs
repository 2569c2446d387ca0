use std::collections::HashMap;

use crate::world::TextureId;

#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

#[inline]
fn shade(c: u32, num: u32, den: u32) -> u32 {
    let r = ((c >> 16) & 0xFF) * num / den;
    let g = ((c >> 8) & 0xFF) * num / den;
    let b = (c & 0xFF) * num / den;
    (r.min(255) << 16) | (g.min(255) << 8) | b.min(255)
}

/// Square tile stored column-major so a wall column is one contiguous slice.
#[derive(Debug, Clone)]
pub struct Texture {
    size: usize,
    texels: Vec<u32>,
}

impl Texture {
    pub fn from_fn(size: usize, f: impl Fn(usize, usize) -> u32) -> Self {
        let mut texels = Vec::with_capacity(size * size);
        for x in 0..size {
            for y in 0..size {
                texels.push(f(x, y));
            }
        }
        Self { size, texels }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn column(&self, x: usize) -> &[u32] {
        let x = x.min(self.size - 1);
        &self.texels[x * self.size..(x + 1) * self.size]
    }

    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> u32 {
        self.texels[x * self.size + y]
    }

    /// Nearest-neighbour resampling of the span `[src_y, src_y + src_h)` of
    /// column `x` onto `dst_h` destination pixels.
    pub fn sample_column(
        &self,
        x: usize,
        src_y: f32,
        src_h: f32,
        dst_h: usize,
    ) -> impl Iterator<Item = u32> + '_ {
        let column = self.column(x);
        let last = self.size - 1;
        let step = if dst_h > 0 { src_h / dst_h as f32 } else { 0.0 };
        (0..dst_h).map(move |i| {
            let v = src_y + (i as f32 + 0.5) * step;
            column[(v.max(0.0) as usize).min(last)]
        })
    }
}

/// Wall tiles keyed by id plus the floor tile; all share one tile size.
pub struct TextureAtlas {
    tile_size: usize,
    walls: HashMap<TextureId, Texture>,
    floor: Texture,
}

impl TextureAtlas {
    /// Generated tiles for wall ids 1 to 5 and a flagstone floor.
    pub fn procedural(tile_size: usize) -> Self {
        let mut walls = HashMap::new();
        walls.insert(1, bricks(tile_size));
        walls.insert(2, stone_blocks(tile_size));
        walls.insert(3, panels(tile_size));
        walls.insert(4, stripes(tile_size));
        walls.insert(5, checker(tile_size, pack_rgb(40, 120, 60)));
        Self {
            tile_size,
            walls,
            floor: flagstones(tile_size),
        }
    }

    #[inline]
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    #[inline]
    pub fn contains(&self, id: TextureId) -> bool {
        self.walls.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    #[inline]
    pub fn wall(&self, id: TextureId) -> Option<&Texture> {
        self.walls.get(&id)
    }

    #[inline]
    pub fn column(&self, id: TextureId, x: usize) -> Option<&[u32]> {
        self.walls.get(&id).map(|t| t.column(x))
    }

    #[inline]
    pub fn texel(&self, id: TextureId, x: usize, y: usize) -> Option<u32> {
        self.walls
            .get(&id)
            .filter(|_| x < self.tile_size && y < self.tile_size)
            .map(|t| t.texel(x, y))
    }

    #[inline]
    pub fn floor(&self) -> &Texture {
        &self.floor
    }
}

fn bricks(n: usize) -> Texture {
    let mortar = pack_rgb(150, 140, 130);
    let brick = pack_rgb(150, 60, 45);
    let course = (n / 4).max(1);
    let brick_w = (n / 2).max(1);
    Texture::from_fn(n, |x, y| {
        let row = y / course;
        let shift = if row % 2 == 0 { 0 } else { brick_w / 2 };
        let bx = (x + shift) % brick_w;
        if y % course == 0 || bx == 0 {
            mortar
        } else {
            shade(brick, 90 + ((x * 7 + y * 13) % 11) as u32, 100)
        }
    })
}

fn stone_blocks(n: usize) -> Texture {
    let stone = pack_rgb(110, 110, 120);
    let block = (n / 2).max(1);
    Texture::from_fn(n, |x, y| {
        let (bx, by) = (x % block, y % block);
        if bx == 0 || by == 0 {
            shade(stone, 50, 100)
        } else if bx == block - 1 || by == block - 1 {
            shade(stone, 130, 100)
        } else {
            stone
        }
    })
}

fn panels(n: usize) -> Texture {
    let wood = pack_rgb(120, 85, 50);
    let plank = (n / 8).max(1);
    Texture::from_fn(n, |x, y| {
        if x % plank == 0 {
            shade(wood, 60, 100)
        } else {
            shade(wood, 85 + ((y / 3 + x) % 3) as u32 * 10, 100)
        }
    })
}

fn stripes(n: usize) -> Texture {
    let a = pack_rgb(30, 60, 140);
    let b = pack_rgb(200, 200, 210);
    let band = (n / 8).max(1);
    Texture::from_fn(n, |_, y| if (y / band) % 2 == 0 { a } else { b })
}

fn checker(n: usize, base: u32) -> Texture {
    let cell = (n / 8).max(1);
    Texture::from_fn(n, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            base
        } else {
            shade(base, 140, 100)
        }
    })
}

fn flagstones(n: usize) -> Texture {
    let slab = pack_rgb(90, 85, 75);
    let half = (n / 2).max(1);
    Texture::from_fn(n, |x, y| {
        if x % half == 0 || y % half == 0 {
            shade(slab, 55, 100)
        } else {
            shade(slab, 95 + (((x / half) + 2 * (y / half)) % 3) as u32 * 5, 100)
        }
    })
}
