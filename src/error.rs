//! Startup-time errors: bad settings, malformed levels and missing textures.
//!
//! Nothing in here is produced per ray or per pixel; the casters resolve
//! their own edge cases locally (see `raycast::Hit::Miss`).

use crate::world::TextureId;

#[derive(Debug, PartialEq)]
pub enum RenderError {
    /// A setting is out of range or inconsistent with another one.
    InvalidSettings(&'static str),
    /// A level row contains a character that is neither open space nor a wall id.
    InvalidCell { col: i32, row: i32, ch: char },
    /// A wall references a texture id the atlas does not provide.
    UnknownTexture { col: i32, row: i32, texture: TextureId },
}

impl core::fmt::Display for RenderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RenderError::InvalidSettings(msg) => write!(f, "Invalid settings: {}", msg),
            RenderError::InvalidCell { col, row, ch } => {
                write!(f, "Invalid map cell {:?} at ({}, {})", ch, col, row)
            }
            RenderError::UnknownTexture { col, row, texture } => {
                write!(f, "Wall at ({}, {}) uses unknown texture {}", col, row, texture)
            }
        }
    }
}

impl core::error::Error for RenderError {}
