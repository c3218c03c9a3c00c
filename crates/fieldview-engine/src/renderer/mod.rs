//! Renderers draw a View's shared state through the View's GPU context.
//!
//! A renderer is bound to the View it was built against and keeps its GPU
//! resources for its whole lifetime. The View drives it through three calls:
//! - `on_options_changed`: records what must be rebuilt, never touches the GPU
//! - `update`: uploads geometry and/or directions
//! - `draw`: issues the frame's draw calls

use std::cell::RefCell;
use std::rc::Rc;

use crate::gpu::ShaderError;
use crate::options::ChangedOptions;
use crate::view::{FrameParams, ViewId, ViewState};

mod surface;

pub use surface::{SurfaceRenderer, SurfaceUniforms};

/// Shared renderer handle. The View and outside code may both hold one.
pub type RendererHandle = Rc<RefCell<dyn Renderer>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("{triangles} triangles exceed the 32-bit index range")]
    TooManyIndices { triangles: usize },
}

pub trait Renderer {
    /// The View this renderer was constructed against.
    fn view_id(&self) -> ViewId;

    fn on_options_changed(&mut self, changed: &ChangedOptions);

    /// Refreshes GPU data from `view`. With `keep_geometry` only the
    /// per-point directions are re-uploaded.
    fn update(&mut self, view: &ViewState<'_>, keep_geometry: bool) -> Result<(), RenderError>;

    /// Draws into the current frame. Does nothing when there is nothing to draw.
    fn draw(&mut self, view: &ViewState<'_>, frame: &FrameParams) -> Result<(), RenderError>;
}

/// Wraps a renderer into a [`RendererHandle`].
pub fn handle<R: Renderer + 'static>(renderer: R) -> RendererHandle {
    Rc::new(RefCell::new(renderer))
}
