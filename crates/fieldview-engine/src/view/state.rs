use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

use crate::geometry::Geometry;
use crate::options::Options;

use super::CameraMatrices;

/// Identity of a [`View`](super::View), unique for the process lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub(super) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ViewId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Read-only borrow of the state a `View` shares with its renderers.
#[derive(Debug, Copy, Clone)]
pub struct ViewState<'a> {
    pub id: ViewId,
    pub options: &'a Options,
    pub geometry: &'a Geometry,
    /// One direction per geometry position.
    pub directions: &'a [Vec3],
}

/// Per-frame values resolved once by the `View` before drawing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameParams {
    pub aspect_ratio: f32,
    pub matrices: CameraMatrices,
}
