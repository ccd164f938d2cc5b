//! Resource management
//!
//! Meshes, OBJ loading, textures, cube maps, colour LUTs and materials.

mod lut;
mod material;
mod mesh;
mod obj;
mod texture;

pub use lut::*;
pub use material::*;
pub use mesh::*;
pub use obj::*;
pub use texture::*;
