use glam::{UVec3, Vec3};

/// Errors raised while building a [`Geometry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("{kind} {face} references vertex {index}, but only {len} positions exist")]
    FaceIndexOutOfBounds {
        kind: &'static str,
        face: usize,
        index: u32,
        len: usize,
    },
    #[error("grid has no points along at least one axis")]
    EmptyGrid,
    #[error("grid shape {shape} holds {expected} points, but {len} positions exist")]
    GridShapeMismatch { shape: UVec3, expected: u64, len: usize },
}

/// Immutable sample-point mesh.
///
/// Invariants:
/// - every triangle and tetrahedron index is `< positions.len()`
/// - `min`/`max` are the componentwise bounds of `positions`, fixed at construction
///
/// An empty geometry has `min == max == 0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    tetrahedra: Vec<[u32; 4]>,

    /// Points per axis when built from a rectilinear grid.
    grid_shape: Option<UVec3>,

    min: Vec3,
    max: Vec3,
}

impl Geometry {
    /// Builds a geometry from explicit connectivity.
    ///
    /// Fails if any face references a vertex outside `positions`.
    pub fn new(
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        tetrahedra: Vec<[u32; 4]>,
    ) -> Result<Self, GeometryError> {
        Self::build(positions, triangles, tetrahedra, None)
    }

    pub(super) fn build(
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        tetrahedra: Vec<[u32; 4]>,
        grid_shape: Option<UVec3>,
    ) -> Result<Self, GeometryError> {
        check_faces("triangle", &triangles, positions.len())?;
        check_faces("tetrahedron", &tetrahedra, positions.len())?;

        let (min, max) = bounds(&positions);

        Ok(Self {
            positions,
            triangles,
            tetrahedra,
            grid_shape,
            min,
            max,
        })
    }

    /// Marks the positions as an x-fastest rectilinear grid of `shape` points.
    ///
    /// Surface extraction then uses the grid's own triangulation instead of
    /// the connectivity, which may be empty.
    pub fn with_grid_shape(mut self, shape: UVec3) -> Result<Self, GeometryError> {
        let expected = u64::from(shape.x) * u64::from(shape.y) * u64::from(shape.z);
        let len = self.positions.len();
        if expected != len as u64 {
            return Err(GeometryError::GridShapeMismatch { shape, expected, len });
        }
        self.grid_shape = Some(shape);
        Ok(self)
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn tetrahedra(&self) -> &[[u32; 4]] {
        &self.tetrahedra
    }

    /// Lower corner of the bounding box.
    #[inline]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Upper corner of the bounding box.
    #[inline]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Points per axis, if this geometry was built from a rectilinear grid.
    #[inline]
    pub fn grid_shape(&self) -> Option<UVec3> {
        self.grid_shape
    }

    #[inline]
    pub fn is_rectilinear(&self) -> bool {
        self.grid_shape.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn check_faces<const N: usize>(
    kind: &'static str,
    faces: &[[u32; N]],
    len: usize,
) -> Result<(), GeometryError> {
    for (face, indices) in faces.iter().enumerate() {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= len) {
            return Err(GeometryError::FaceIndexOutOfBounds { kind, face, index, len });
        }
    }
    Ok(())
}

fn bounds(positions: &[Vec3]) -> (Vec3, Vec3) {
    let Some(&first) = positions.first() else {
        return (Vec3::ZERO, Vec3::ZERO);
    };
    positions
        .iter()
        .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)))
}
