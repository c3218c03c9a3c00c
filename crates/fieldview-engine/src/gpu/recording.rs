use std::collections::{HashMap, HashSet};

use super::shader;
use super::{
    BufferId, BufferKind, GpuBackend, IndexedDraw, ProgramDesc, ProgramId, ShaderError,
    VertexArrayId, VertexAttribute,
};

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateVertexArray(VertexArrayId),
    DestroyVertexArray(VertexArrayId),
    CreateBuffer(BufferId, BufferKind),
    WriteBuffer { id: BufferId, len: usize },
    DestroyBuffer(BufferId),
    CreateProgram(ProgramId),
    DestroyProgram(ProgramId),
    Clear([f32; 3]),
    DrawIndexed {
        program: ProgramId,
        vertex_array: VertexArrayId,
        index_buffer: BufferId,
        index_count: u32,
    },
}

impl Command {
    #[inline]
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::DrawIndexed { .. })
    }
}

/// Headless backend.
///
/// Shaders go through the same compile/link checks as on the GPU. Buffer
/// contents and every received call are kept for inspection.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    commands: Vec<Command>,
    buffers: HashMap<BufferId, Vec<u8>>,
    vertex_arrays: HashSet<VertexArrayId>,
    programs: HashMap<ProgramId, Vec<u8>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns and forgets the recorded commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_calls(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Number of live buffers, vertex arrays and programs.
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len() + self.programs.len()
    }

    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(Vec::as_slice)
    }

    /// Uniform bytes of the last draw issued with `id`.
    pub fn program_uniforms(&self, id: ProgramId) -> Option<&[u8]> {
        self.programs.get(&id).map(Vec::as_slice)
    }

    pub fn is_live_program(&self, id: ProgramId) -> bool {
        self.programs.contains_key(&id)
    }
}

impl GpuBackend for RecordingBackend {
    fn create_vertex_array(&mut self, _attributes: &[VertexAttribute]) -> VertexArrayId {
        let id = VertexArrayId(self.alloc());
        self.vertex_arrays.insert(id);
        self.commands.push(Command::CreateVertexArray(id));
        id
    }

    fn destroy_vertex_array(&mut self, id: VertexArrayId) {
        self.vertex_arrays.remove(&id);
        self.commands.push(Command::DestroyVertexArray(id));
    }

    fn create_buffer(&mut self, kind: BufferKind, _label: &str) -> BufferId {
        let id = BufferId(self.alloc());
        self.buffers.insert(id, Vec::new());
        self.commands.push(Command::CreateBuffer(id, kind));
        id
    }

    fn write_buffer(&mut self, id: BufferId, data: &[u8]) {
        if let Some(contents) = self.buffers.get_mut(&id) {
            contents.clear();
            contents.extend_from_slice(data);
        }
        self.commands.push(Command::WriteBuffer { id, len: data.len() });
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        self.commands.push(Command::DestroyBuffer(id));
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, ShaderError> {
        shader::build_program(desc.vertex_source, desc.fragment_source)?;
        let id = ProgramId(self.alloc());
        self.programs.insert(id, Vec::new());
        self.commands.push(Command::CreateProgram(id));
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) {
        self.programs.remove(&id);
        self.commands.push(Command::DestroyProgram(id));
    }

    fn clear(&mut self, color: [f32; 3]) {
        self.commands.push(Command::Clear(color));
    }

    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>) {
        if let Some(uniforms) = self.programs.get_mut(&draw.program) {
            uniforms.clear();
            uniforms.extend_from_slice(draw.uniforms);
        }
        self.commands.push(Command::DrawIndexed {
            program: draw.program,
            vertex_array: draw.vertex_array,
            index_buffer: draw.index_buffer,
            index_count: draw.index_count,
        });
    }
}
