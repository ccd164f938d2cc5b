//! Backend abstraction layer
//!
//! Handle-based GPU interface and its wgpu implementation.

pub mod traits;
pub mod types;
pub mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

pub use traits::*;
pub use types::*;
