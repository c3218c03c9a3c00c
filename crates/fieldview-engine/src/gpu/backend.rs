use super::ShaderError;

/// Handle to a GPU buffer. Ids are never reused within one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u64);

/// Handle to a vertex array (vertex input layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub(crate) u64);

/// Handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub(crate) u64);

impl BufferId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl VertexArrayId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl ProgramId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    /// `u32` indices.
    Index,
}

/// One non-interleaved vertex input. The attribute's position in the
/// vertex array is its buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

/// Everything needed to build a program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    /// Vertex inputs the program reads.
    pub vertex_array: VertexArrayId,
    /// Size in bytes of the uniform block at `@group(0) @binding(0)`.
    pub uniform_size: u64,
    /// Disable back-face culling.
    pub double_sided: bool,
}

/// Indexed triangle-list draw.
#[derive(Debug, Clone, Copy)]
pub struct IndexedDraw<'a> {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    /// Vertex buffers in slot order.
    pub vertex_buffers: &'a [BufferId],
    pub index_buffer: BufferId,
    pub index_count: u32,
    /// Uniform block contents, `uniform_size` bytes.
    pub uniforms: &'a [u8],
}

/// Graphics API the engine draws through.
///
/// Create/destroy calls are mirrored 1:1 by the guards in
/// [`GpuContext`](super::GpuContext); backends can assume every id they
/// receive is live.
pub trait GpuBackend {
    fn create_vertex_array(&mut self, attributes: &[VertexAttribute]) -> VertexArrayId;
    fn destroy_vertex_array(&mut self, id: VertexArrayId);

    fn create_buffer(&mut self, kind: BufferKind, label: &str) -> BufferId;
    /// Replaces the buffer contents, growing it when needed.
    fn write_buffer(&mut self, id: BufferId, data: &[u8]);
    fn destroy_buffer(&mut self, id: BufferId);

    /// Compiles and links a program.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, ShaderError>;
    fn destroy_program(&mut self, id: ProgramId);

    /// Clears color and depth before the next draws of this frame.
    fn clear(&mut self, color: [f32; 3]);
    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>);
}
