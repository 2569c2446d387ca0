//! Grid raycasting core: DDA wall casting, column projection and
//! perspective floor mapping, plus the small host pieces (settings, level
//! parsing, procedural textures, compositing) that drive it.

pub mod camera;
pub mod error;
pub mod floor;
pub mod projection;
pub mod raycast;
pub mod renderer;
pub mod scaler;
pub mod settings;
pub mod textures;
pub mod world;
