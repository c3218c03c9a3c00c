//! Sampling geometry: point positions plus mesh connectivity.
//!
//! A `Geometry` is immutable once built. Scene updates replace it wholesale;
//! there is no in-place mutation, so every consumer sees either the old mesh
//! or the new one, never a mix.

mod grid;
mod mesh;
pub mod surface;

pub use mesh::{Geometry, GeometryError};
pub use surface::{surface_triangles, SurfaceExtractor};
