use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{
    BufferId, BufferKind, GpuBackend, IndexedDraw, ProgramDesc, ProgramId, ShaderError,
    VertexArrayId, VertexAttribute,
};

/// Shared handle to the backend of one graphics context.
///
/// Cloning is cheap. The handle is `!Send`: every GPU call must stay on the
/// thread that owns the context.
#[derive(Clone)]
pub struct GpuContext {
    backend: Rc<RefCell<dyn GpuBackend>>,
}

impl fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuContext").finish_non_exhaustive()
    }
}

impl GpuContext {
    pub fn new<B: GpuBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Rc::new(RefCell::new(backend)),
        }
    }

    /// Wraps a backend the caller keeps a typed handle to (e.g. to encode
    /// frames or inspect a recording).
    pub fn from_shared<B: GpuBackend + 'static>(backend: Rc<RefCell<B>>) -> Self {
        Self { backend }
    }

    pub fn create_vertex_array(&self, attributes: &[VertexAttribute]) -> VertexArray {
        let id = self.backend.borrow_mut().create_vertex_array(attributes);
        log::debug!("created vertex array {}", id.raw());
        VertexArray {
            ctx: self.clone(),
            id,
        }
    }

    pub fn create_buffer(&self, kind: BufferKind, label: &str) -> Buffer {
        let id = self.backend.borrow_mut().create_buffer(kind, label);
        log::debug!("created {kind:?} buffer {} ({label})", id.raw());
        Buffer {
            ctx: self.clone(),
            id,
            len: 0,
        }
    }

    pub fn create_program(&self, desc: &ProgramDesc<'_>) -> Result<Program, ShaderError> {
        let id = self.backend.borrow_mut().create_program(desc)?;
        log::debug!("linked program {} ({})", id.raw(), desc.label);
        Ok(Program {
            ctx: self.clone(),
            id,
        })
    }

    pub fn clear(&self, color: [f32; 3]) {
        self.backend.borrow_mut().clear(color);
    }

    pub fn draw_indexed(&self, draw: &IndexedDraw<'_>) {
        self.backend.borrow_mut().draw_indexed(draw);
    }

    /// Runs `release` against the backend unless it is already borrowed
    /// (only possible while unwinding out of a backend call).
    fn release(&self, what: &str, release: impl FnOnce(&mut dyn GpuBackend)) {
        match self.backend.try_borrow_mut() {
            Ok(mut backend) => release(&mut *backend),
            Err(_) => log::error!("backend busy; leaking {what}"),
        }
    }
}

/// Owned vertex array; destroyed on drop.
#[derive(Debug)]
pub struct VertexArray {
    ctx: GpuContext,
    id: VertexArrayId,
}

impl VertexArray {
    #[inline]
    pub fn id(&self) -> VertexArrayId {
        self.id
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        let id = self.id;
        self.ctx.release("vertex array", |b| b.destroy_vertex_array(id));
        log::debug!("destroyed vertex array {}", id.raw());
    }
}

/// Owned buffer; destroyed on drop.
#[derive(Debug)]
pub struct Buffer {
    ctx: GpuContext,
    id: BufferId,
    len: usize,
}

impl Buffer {
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Bytes written by the last [`write`](Self::write).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replaces the buffer contents.
    pub fn write(&mut self, data: &[u8]) {
        self.ctx.backend.borrow_mut().write_buffer(self.id, data);
        self.len = data.len();
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let id = self.id;
        self.ctx.release("buffer", |b| b.destroy_buffer(id));
        log::debug!("destroyed buffer {}", id.raw());
    }
}

/// Owned program; destroyed on drop.
#[derive(Debug)]
pub struct Program {
    ctx: GpuContext,
    id: ProgramId,
}

impl Program {
    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        let id = self.id;
        self.ctx.release("program", |b| b.destroy_program(id));
        log::debug!("destroyed program {}", id.raw());
    }
}
