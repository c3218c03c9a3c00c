use std::collections::HashMap;

use super::shader::{self, FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::{
    BufferId, BufferKind, GpuBackend, IndexedDraw, ProgramDesc, ProgramId, ShaderError,
    VertexArrayId, VertexAttribute,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MIN_BUFFER_SIZE: u64 = 256;

struct GpuBuffer {
    kind: BufferKind,
    label: String,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniforms: Option<(wgpu::Buffer, wgpu::BindGroup)>,
}

struct PendingDraw {
    program: ProgramId,
    vertex_buffers: Vec<BufferId>,
    index_buffer: BufferId,
    index_count: u32,
}

/// wgpu implementation of [`GpuBackend`].
///
/// Uploads go straight to the queue. Clears and draws are recorded and
/// replayed into a single render pass by [`encode_frame`](Self::encode_frame).
/// Uniforms are per program, so the last draw of a program in a frame wins.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,

    depth_view: wgpu::TextureView,
    size: (u32, u32),

    next_id: u64,
    buffers: HashMap<BufferId, GpuBuffer>,
    vertex_arrays: HashMap<VertexArrayId, Vec<VertexAttribute>>,
    programs: HashMap<ProgramId, GpuProgram>,

    clear: Option<[f32; 3]>,
    last_clear: [f32; 3],
    pending: Vec<PendingDraw>,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        Self {
            depth_view: create_depth_view(device, size),
            device: device.clone(),
            queue: queue.clone(),
            color_format,
            size,
            next_id: 0,
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            programs: HashMap::new(),
            clear: None,
            last_clear: [0.0; 3],
            pending: Vec::new(),
        }
    }

    /// Recreates the depth target for a new framebuffer size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if size == self.size {
            return;
        }
        self.size = size;
        self.depth_view = create_depth_view(&self.device, size);
    }

    /// Replays this frame's clear and draws into `color_view`.
    ///
    /// The pass always clears, so a frame with nothing recorded still
    /// presents the last background color.
    ///
    /// Draws that reference resources destroyed since they were issued are
    /// dropped.
    pub fn encode_frame(&mut self, encoder: &mut wgpu::CommandEncoder, color_view: &wgpu::TextureView) {
        let [r, g, b] = frame_clear_color(self.clear.take(), &mut self.last_clear);
        let pending = std::mem::take(&mut self.pending);
        let color_load = wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        });
        let depth_load = wgpu::LoadOp::Clear(1.0);

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fieldview pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in &pending {
            let Some(program) = self.programs.get(&draw.program) else { continue };
            let Some(index) = self.buffers.get(&draw.index_buffer).and_then(|b| b.buffer.as_ref())
            else {
                continue;
            };

            let vertex: Option<Vec<&wgpu::Buffer>> = draw
                .vertex_buffers
                .iter()
                .map(|id| self.buffers.get(id).and_then(|b| b.buffer.as_ref()))
                .collect();
            let Some(vertex) = vertex else { continue };

            rpass.set_pipeline(&program.pipeline);
            if let Some((_, bind_group)) = &program.uniforms {
                rpass.set_bind_group(0, bind_group, &[]);
            }
            for (slot, buffer) in vertex.iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            rpass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }

    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn build_pipeline(&self, desc: &ProgramDesc<'_>) -> Result<GpuProgram, ShaderError> {
        shader::build_program(desc.vertex_source, desc.fragment_source)?;

        let attributes = self
            .vertex_arrays
            .get(&desc.vertex_array)
            .ok_or_else(|| ShaderError::Link(format!("unknown vertex array {}", desc.vertex_array.raw())))?;

        let vs = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.vertex_source.into()),
        });
        let fs = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.fragment_source.into()),
        });

        let bind_group_layout = (desc.uniform_size > 0).then(|| {
            self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(desc.uniform_size),
                    },
                    count: None,
                }],
            })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        // One non-interleaved buffer per attribute.
        let vertex_attributes: Vec<[wgpu::VertexAttribute; 1]> = attributes
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: a.format,
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();
        let vertex_layouts: Vec<wgpu::VertexBufferLayout<'_>> = attributes
            .iter()
            .zip(&vertex_attributes)
            .map(|(a, attrs)| wgpu::VertexBufferLayout {
                array_stride: a.format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &vertex_layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: if desc.double_sided { None } else { Some(wgpu::Face::Back) },
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniforms = bind_group_layout.map(|layout| {
            let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: desc.uniform_size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(desc.label),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            });
            (ubo, bind_group)
        });

        Ok(GpuProgram { pipeline, uniforms })
    }
}

impl GpuBackend for WgpuBackend {
    fn create_vertex_array(&mut self, attributes: &[VertexAttribute]) -> VertexArrayId {
        let id = VertexArrayId(self.alloc());
        self.vertex_arrays.insert(id, attributes.to_vec());
        id
    }

    fn destroy_vertex_array(&mut self, id: VertexArrayId) {
        self.vertex_arrays.remove(&id);
    }

    fn create_buffer(&mut self, kind: BufferKind, label: &str) -> BufferId {
        let id = BufferId(self.alloc());
        self.buffers.insert(
            id,
            GpuBuffer {
                kind,
                label: label.to_owned(),
                buffer: None,
                capacity: 0,
            },
        );
        id
    }

    fn write_buffer(&mut self, id: BufferId, data: &[u8]) {
        let Some(slot) = self.buffers.get_mut(&id) else { return };

        // Copies must be a multiple of COPY_BUFFER_ALIGNMENT.
        let padded;
        let bytes = if data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            data
        } else {
            let mut v = data.to_vec();
            v.resize(data.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);
            padded = v;
            &padded
        };
        let required = bytes.len() as u64;

        if slot.buffer.is_none() || required > slot.capacity {
            let capacity = required.next_power_of_two().max(MIN_BUFFER_SIZE);
            let usage = match slot.kind {
                BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
                BufferKind::Index => wgpu::BufferUsages::INDEX,
            };
            slot.buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&slot.label),
                size: capacity,
                usage: usage | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            slot.capacity = capacity;
        }

        if let Some(buffer) = &slot.buffer {
            if !bytes.is_empty() {
                self.queue.write_buffer(buffer, 0, bytes);
            }
        }
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, ShaderError> {
        let program = self.build_pipeline(desc)?;
        let id = ProgramId(self.alloc());
        self.programs.insert(id, program);
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) {
        self.programs.remove(&id);
    }

    fn clear(&mut self, color: [f32; 3]) {
        // A clear discards whatever was recorded before it this frame.
        self.pending.clear();
        self.clear = Some(color);
    }

    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>) {
        let Some(program) = self.programs.get(&draw.program) else {
            log::warn!("draw with unknown program {}", draw.program.raw());
            return;
        };
        if let Some((ubo, _)) = &program.uniforms {
            if !draw.uniforms.is_empty() {
                self.queue.write_buffer(ubo, 0, draw.uniforms);
            }
        }
        self.pending.push(PendingDraw {
            program: draw.program,
            vertex_buffers: draw.vertex_buffers.to_vec(),
            index_buffer: draw.index_buffer,
            index_count: draw.index_count,
        });
    }
}

fn create_depth_view(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("fieldview depth"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Color a frame starts from: this frame's clear, else the last one seen.
fn frame_clear_color(recorded: Option<[f32; 3]>, last: &mut [f32; 3]) -> [f32; 3] {
    if let Some(color) = recorded {
        *last = color;
    }
    *last
}
