//! Surface index extraction.
//!
//! Turns a [`Geometry`] into the flat triangle list a surface renderer draws.
//! Extraction is a pure function so renderers can swap in their own rule.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::{grid, Geometry};

/// Pure function from geometry to drawable triangles.
pub type SurfaceExtractor = fn(&Geometry) -> Vec<[u32; 3]>;

/// Default extraction rule.
///
/// 1. explicit triangles are used as-is
/// 2. rectilinear grids are triangulated from their shape: the six outer
///    faces of the box for volumes, every quad for flat grids
/// 3. other tetrahedral meshes yield their boundary (faces owned by one cell)
///
/// An empty result means there is nothing to draw.
pub fn surface_triangles(geometry: &Geometry) -> Vec<[u32; 3]> {
    if !geometry.triangles().is_empty() {
        return geometry.triangles().to_vec();
    }
    match geometry.grid_shape() {
        Some(shape) => grid::surface_triangles(shape),
        None => tetrahedra_boundary(geometry.tetrahedra()),
    }
}

/// Faces that belong to exactly one tetrahedron, in first-seen order.
///
/// Faces are matched regardless of vertex order; the returned triangles keep
/// the winding of the owning tetrahedron.
pub fn tetrahedra_boundary(tetrahedra: &[[u32; 4]]) -> Vec<[u32; 3]> {
    const FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

    let mut owners: HashMap<[u32; 3], (u32, [u32; 3])> = HashMap::with_capacity(tetrahedra.len() * 4);
    let mut order = Vec::with_capacity(tetrahedra.len() * 4);

    for tet in tetrahedra {
        for face in FACES {
            let tri = face.map(|i| tet[i]);
            let mut key = tri;
            key.sort_unstable();
            match owners.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().0 += 1,
                Entry::Vacant(e) => {
                    e.insert((1, tri));
                    order.push(key);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| match owners.get(&key) {
            Some(&(1, tri)) => Some(tri),
            _ => None,
        })
        .collect()
}
