use std::collections::HashMap;

use crate::error::RenderError;
use crate::textures::TextureAtlas;

pub type TextureId = u8;

/// Result of a grid lookup. Open space is a value, not a missing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall(TextureId),
    Open,
}

/// Sparse grid of wall cells keyed by (col, row).
#[derive(Debug, Default, Clone)]
pub struct GridMap {
    walls: HashMap<(i32, i32), TextureId>,
}

pub const DEFAULT_LEVEL: &[&str] = &[
    "1111111111111111",
    "1..............1",
    "1....3333...2..1",
    "1.......4...2..1",
    "1.......4...2..1",
    "1....3333......1",
    "1..............1",
    "1..5.....5.....1",
    "1111111111111111",
];

impl GridMap {
    /// Parses ASCII rows: `1`-`9` are walls carrying that texture id, `.` or
    /// a space is open floor.
    pub fn parse(rows: &[&str]) -> Result<Self, RenderError> {
        let mut walls = HashMap::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let (col, row) = (col as i32, row as i32);
                match ch {
                    '.' | ' ' => {}
                    '1'..='9' => {
                        walls.insert((col, row), ch as u8 - b'0');
                    }
                    _ => return Err(RenderError::InvalidCell { col, row, ch }),
                }
            }
        }
        Ok(Self { walls })
    }

    pub fn set_wall(&mut self, cell: (i32, i32), texture: TextureId) {
        self.walls.insert(cell, texture);
    }

    #[inline]
    pub fn lookup(&self, cell: (i32, i32)) -> Cell {
        match self.walls.get(&cell) {
            Some(&id) => Cell::Wall(id),
            None => Cell::Open,
        }
    }

    /// True when the cell containing the world point is open.
    #[inline]
    pub fn is_open(&self, x: f32, y: f32) -> bool {
        self.lookup((x.floor() as i32, y.floor() as i32)) == Cell::Open
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Every wall must reference a texture the atlas provides. Run once at
    /// startup; the casters never check ids themselves.
    pub fn validate(&self, atlas: &TextureAtlas) -> Result<(), RenderError> {
        let mut cells: Vec<_> = self.walls.iter().collect();
        cells.sort();
        for (&(col, row), &texture) in cells {
            if !atlas.contains(texture) {
                return Err(RenderError::UnknownTexture { col, row, texture });
            }
        }
        Ok(())
    }
}
