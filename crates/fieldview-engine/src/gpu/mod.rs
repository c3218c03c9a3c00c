//! GPU backend seam.
//!
//! Renderers never talk to a graphics API directly. They go through a
//! [`GpuContext`], which hands out RAII guards for buffers, vertex arrays and
//! programs and forwards draw commands to a [`GpuBackend`].
//!
//! Backends:
//! - [`WgpuBackend`]: the real one; draws are recorded during `View::draw`
//!   and encoded into one render pass by [`WgpuBackend::encode_frame`]
//! - [`RecordingBackend`]: headless; keeps buffer contents and a command log
//!
//! All handles are single-threaded (`Rc`), matching the rule that every GPU
//! call happens on the thread owning the graphics context.

mod backend;
mod context;
mod recording;
pub mod shader;
mod wgpu_backend;

pub use backend::{
    BufferId, BufferKind, GpuBackend, IndexedDraw, ProgramDesc, ProgramId, VertexArrayId,
    VertexAttribute,
};
pub use context::{Buffer, GpuContext, Program, VertexArray};
pub use recording::{Command, RecordingBackend};
pub use shader::{ShaderError, ShaderStage};
pub use wgpu_backend::WgpuBackend;
