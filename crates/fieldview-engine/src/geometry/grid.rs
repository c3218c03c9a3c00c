use glam::{UVec3, Vec3};

use super::{Geometry, GeometryError};

/// Cube corners (bit 0 = +x, bit 1 = +y, bit 2 = +z) of the six tetrahedra
/// sharing the 0–7 diagonal. Adjacent cells split their shared faces along
/// the same diagonal, so the mesh is conforming.
const CELL_TETRAHEDRA: [[u32; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

impl Geometry {
    /// Regular grid with `n` points per axis spanning `[min, max]`.
    ///
    /// Points are ordered x-fastest. Flat grids (one axis with a single point)
    /// are triangulated, volumetric grids are split into tetrahedra, lines and
    /// single points carry no faces.
    pub fn cartesian(n: UVec3, min: Vec3, max: Vec3) -> Result<Self, GeometryError> {
        if n.min_element() == 0 {
            return Err(GeometryError::EmptyGrid);
        }
        Self::rectilinear(
            &axis_coords(n.x, min.x, max.x),
            &axis_coords(n.y, min.y, max.y),
            &axis_coords(n.z, min.z, max.z),
        )
    }

    /// Grid with explicit per-axis coordinates.
    pub fn rectilinear(xs: &[f32], ys: &[f32], zs: &[f32]) -> Result<Self, GeometryError> {
        if xs.is_empty() || ys.is_empty() || zs.is_empty() {
            return Err(GeometryError::EmptyGrid);
        }
        let shape = UVec3::new(xs.len() as u32, ys.len() as u32, zs.len() as u32);

        let mut positions = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        for &z in zs {
            for &y in ys {
                for &x in xs {
                    positions.push(Vec3::new(x, y, z));
                }
            }
        }

        let (triangles, tetrahedra) = match spanning_axes(shape) {
            3 => (Vec::new(), grid_tetrahedra(shape)),
            2 => (flat_grid_triangles(shape), Vec::new()),
            _ => (Vec::new(), Vec::new()),
        };

        Self::build(positions, triangles, tetrahedra, Some(shape))
    }
}

fn axis_coords(count: u32, lo: f32, hi: f32) -> Vec<f32> {
    if count == 1 {
        return vec![lo];
    }
    let last = (count - 1) as f32;
    (0..count).map(|i| lo + (hi - lo) * (i as f32 / last)).collect()
}

fn spanning_axes(shape: UVec3) -> usize {
    [shape.x, shape.y, shape.z].iter().filter(|&&c| c > 1).count()
}

/// Drawable triangles of a grid, without looking at its connectivity.
pub(super) fn surface_triangles(shape: UVec3) -> Vec<[u32; 3]> {
    match spanning_axes(shape) {
        3 => boundary_triangles(shape),
        2 => flat_grid_triangles(shape),
        _ => Vec::new(),
    }
}

#[inline]
fn strides(shape: UVec3) -> [u32; 3] {
    [1, shape.x, shape.x * shape.y]
}

/// Appends the two triangles of the quad spanned by `du`/`dv` at `base`.
///
/// The split runs from the low corner to the high corner, matching the
/// faces produced by [`CELL_TETRAHEDRA`].
pub(super) fn push_quad(out: &mut Vec<[u32; 3]>, base: u32, du: u32, dv: u32) {
    let p00 = base;
    let p10 = base + du;
    let p01 = base + dv;
    let p11 = base + du + dv;
    out.push([p00, p10, p11]);
    out.push([p00, p11, p01]);
}

/// Triangulates every quad of a grid with exactly two spanning axes.
fn flat_grid_triangles(shape: UVec3) -> Vec<[u32; 3]> {
    let n = [shape.x, shape.y, shape.z];
    let stride = strides(shape);
    let spanning: Vec<usize> = (0..3).filter(|&a| n[a] > 1).collect();
    let [a, b] = spanning[..] else {
        return Vec::new();
    };

    let mut triangles = Vec::with_capacity(2 * ((n[a] - 1) * (n[b] - 1)) as usize);
    for j in 0..n[b] - 1 {
        for i in 0..n[a] - 1 {
            push_quad(&mut triangles, i * stride[a] + j * stride[b], stride[a], stride[b]);
        }
    }
    triangles
}

fn grid_tetrahedra(shape: UVec3) -> Vec<[u32; 4]> {
    let [sx, sy, sz] = strides(shape);
    let corner_offset = |bits: u32| (bits & 1) * sx + ((bits >> 1) & 1) * sy + ((bits >> 2) & 1) * sz;

    let cells = ((shape.x - 1) * (shape.y - 1) * (shape.z - 1)) as usize;
    let mut tetrahedra = Vec::with_capacity(6 * cells);
    for k in 0..shape.z - 1 {
        for j in 0..shape.y - 1 {
            for i in 0..shape.x - 1 {
                let base = i * sx + j * sy + k * sz;
                for tet in CELL_TETRAHEDRA {
                    tetrahedra.push(tet.map(|bits| base + corner_offset(bits)));
                }
            }
        }
    }
    tetrahedra
}

/// Triangles covering the six outer faces of a volumetric grid.
pub(super) fn boundary_triangles(shape: UVec3) -> Vec<[u32; 3]> {
    let n = [shape.x, shape.y, shape.z];
    if n.iter().any(|&c| c < 2) {
        return Vec::new();
    }
    let stride = strides(shape);

    let mut triangles = Vec::new();
    for (axis, (u, v)) in [(0, (1, 2)), (1, (0, 2)), (2, (0, 1))] {
        for layer in [0, n[axis] - 1] {
            for j in 0..n[v] - 1 {
                for i in 0..n[u] - 1 {
                    let base = layer * stride[axis] + i * stride[u] + j * stride[v];
                    push_quad(&mut triangles, base, stride[u], stride[v]);
                }
            }
        }
    }
    triangles
}
