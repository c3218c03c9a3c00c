use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::geometry::{surface_triangles, SurfaceExtractor};
use crate::gpu::{
    Buffer, BufferKind, GpuContext, IndexedDraw, Program, ProgramDesc, ShaderError, VertexArray,
    VertexAttribute,
};
use crate::options::{ChangedOptions, Options, ViewOption};
use crate::view::{FrameParams, View, ViewId, ViewState};

use super::{RenderError, Renderer};

const VERTEX_SOURCE: &str = include_str!("shaders/surface.vert.wgsl");
const FRAGMENT_SOURCE: &str = include_str!("shaders/surface.frag.wgsl");

const ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute {
        location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }, // position
    VertexAttribute {
        location: 1,
        format: wgpu::VertexFormat::Float32x3,
    }, // direction
];

/// Uniform block shared by both surface shader stages.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    /// View space, `w = 1`.
    pub light_position: [f32; 4],
    /// `xy` = effective z-range, `zw` unused.
    pub z_range: [f32; 4],
}

/// Draws the surface of the View's geometry, colored by direction.
///
/// The surface is a triangle list picked by a [`SurfaceExtractor`]. Fragments
/// whose normalized direction has a z component outside the z-range option
/// are discarded.
pub struct SurfaceRenderer {
    view_id: ViewId,
    gpu: GpuContext,
    extractor: SurfaceExtractor,

    // Declared first so the program is released before the buffers.
    program: Option<Program>,
    index_buffer: Buffer,
    position_buffer: Buffer,
    direction_buffer: Buffer,
    vertex_array: VertexArray,

    index_count: u32,
    shader_dirty: bool,
    warned_no_program: bool,
}

impl SurfaceRenderer {
    /// Builds a renderer for `view` using the default surface extraction.
    pub fn new(view: &View) -> Result<Self, RenderError> {
        Self::with_extractor(view, surface_triangles)
    }

    /// Builds a renderer for `view` with a custom surface extraction rule.
    ///
    /// Links the program from the current colormap and uploads the View's
    /// geometry. On failure every resource created so far is released.
    pub fn with_extractor(view: &View, extractor: SurfaceExtractor) -> Result<Self, RenderError> {
        let gpu = view.gpu().clone();
        let vertex_array = gpu.create_vertex_array(&ATTRIBUTES);
        let index_buffer = gpu.create_buffer(BufferKind::Index, "surface indices");
        let position_buffer = gpu.create_buffer(BufferKind::Vertex, "surface positions");
        let direction_buffer = gpu.create_buffer(BufferKind::Vertex, "surface directions");

        let mut renderer = Self {
            view_id: view.id(),
            gpu,
            extractor,
            program: None,
            index_buffer,
            position_buffer,
            direction_buffer,
            vertex_array,
            index_count: 0,
            shader_dirty: false,
            warned_no_program: false,
        };

        renderer.update_shader_program(view.options())?;
        renderer.update(&view.state(), false)?;
        Ok(renderer)
    }

    /// Number of indices the next draw would submit.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Whether the last link succeeded.
    #[inline]
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Rebuilds the program from the shipped stage sources followed by the
    /// colormap implementation in `options`.
    ///
    /// The previous program is released first; on failure the renderer is
    /// left without a program and skips draws until the next successful link.
    pub fn update_shader_program(&mut self, options: &Options) -> Result<(), ShaderError> {
        self.shader_dirty = false;
        self.program = None;

        let colormap = options.colormap_implementation();
        let vertex_source = format!("{VERTEX_SOURCE}\n{colormap}");
        let fragment_source = format!("{FRAGMENT_SOURCE}\n{colormap}");

        let program = self.gpu.create_program(&ProgramDesc {
            label: "surface",
            vertex_source: &vertex_source,
            fragment_source: &fragment_source,
            vertex_array: self.vertex_array.id(),
            uniform_size: std::mem::size_of::<SurfaceUniforms>() as u64,
            double_sided: true,
        })?;

        self.program = Some(program);
        self.warned_no_program = false;
        Ok(())
    }

    fn upload_geometry(&mut self, view: &ViewState<'_>) -> Result<(), RenderError> {
        self.position_buffer
            .write(bytemuck::cast_slice(view.geometry.positions()));

        let triangles = (self.extractor)(view.geometry);
        self.index_count = 0;
        if triangles.is_empty() {
            return Ok(());
        }
        let index_count = checked_index_count(triangles.len())?;
        self.index_buffer.write(bytemuck::cast_slice(&triangles));
        self.index_count = index_count;
        Ok(())
    }
}

impl Renderer for SurfaceRenderer {
    fn view_id(&self) -> ViewId {
        self.view_id
    }

    fn on_options_changed(&mut self, changed: &ChangedOptions) {
        if changed.contains(ViewOption::ColormapImplementation) {
            self.shader_dirty = true;
        }
    }

    fn update(&mut self, view: &ViewState<'_>, keep_geometry: bool) -> Result<(), RenderError> {
        // Data is uploaded even when the relink fails.
        let relinked = if self.shader_dirty {
            self.update_shader_program(view.options)
        } else {
            Ok(())
        };

        let uploaded = if keep_geometry { Ok(()) } else { self.upload_geometry(view) };
        self.direction_buffer.write(bytemuck::cast_slice(view.directions));

        relinked?;
        uploaded
    }

    fn draw(&mut self, view: &ViewState<'_>, frame: &FrameParams) -> Result<(), RenderError> {
        if self.index_count == 0 {
            return Ok(());
        }
        if self.shader_dirty {
            self.update_shader_program(view.options)?;
        }
        let Some(program) = self.program.as_ref().map(Program::id) else {
            if !self.warned_no_program {
                log::warn!("surface renderer has no linked program; skipping draws");
                self.warned_no_program = true;
            }
            return Ok(());
        };

        let z_range = effective_z_range(view.options.z_range());
        let light = frame.matrices.light_position(view.options.camera_position());
        let uniforms = SurfaceUniforms {
            projection: frame.matrices.projection.to_cols_array_2d(),
            model_view: frame.matrices.model_view.to_cols_array_2d(),
            light_position: light.extend(1.0).to_array(),
            z_range: [z_range.x, z_range.y, 0.0, 0.0],
        };

        self.gpu.draw_indexed(&IndexedDraw {
            program,
            vertex_array: self.vertex_array.id(),
            vertex_buffers: &[self.position_buffer.id(), self.direction_buffer.id()],
            index_buffer: self.index_buffer.id(),
            index_count: self.index_count,
            uniforms: bytemuck::bytes_of(&uniforms),
        });
        Ok(())
    }
}

/// Opens the z-range past the unit interval so that directions sitting
/// exactly on a `-1`/`1` bound are never clipped.
fn effective_z_range(range: Vec2) -> Vec2 {
    Vec2::new(
        if range.x <= -1.0 { -2.0 } else { range.x },
        if range.y >= 1.0 { 2.0 } else { range.y },
    )
}

/// Index count of `triangles` triangles, if it fits a 32-bit index buffer.
fn checked_index_count(triangles: usize) -> Result<u32, RenderError> {
    triangles
        .checked_mul(3)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(RenderError::TooManyIndices { triangles })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::colormap::{colormap_implementation, Colormap};
    use crate::geometry::Geometry;
    use crate::gpu::{Command, RecordingBackend};
    use crate::options::Configuration;
    use crate::view::CameraMatrices;

    fn setup() -> (Rc<RefCell<RecordingBackend>>, View) {
        let backend = Rc::new(RefCell::new(RecordingBackend::new()));
        let view = View::new(GpuContext::from_shared(backend.clone()));
        (backend, view)
    }

    fn quad() -> Geometry {
        Geometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![],
        )
        .unwrap()
    }

    fn frame(view: &View) -> FrameParams {
        FrameParams {
            aspect_ratio: 1.0,
            matrices: CameraMatrices::from_options(view.options(), 1.0),
        }
    }

    fn draws(backend: &RefCell<RecordingBackend>) -> usize {
        backend.borrow().draw_calls()
    }

    fn links(backend: &RefCell<RecordingBackend>) -> usize {
        backend
            .borrow()
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::CreateProgram(_)))
            .count()
    }

    fn indices(backend: &RefCell<RecordingBackend>, renderer: &SurfaceRenderer) -> Vec<u32> {
        let backend = backend.borrow();
        let bytes = backend.buffer_contents(renderer.index_buffer.id()).unwrap();
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    // ── construction / upload ─────────────────────────────────────────────

    #[test]
    fn two_triangles_upload_six_indices() {
        let (backend, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();
        let renderer = SurfaceRenderer::new(&view).unwrap();

        assert_eq!(renderer.index_count(), 6);
        assert_eq!(indices(&backend, &renderer), vec![0, 1, 2, 0, 2, 3]);
        let b = backend.borrow();
        assert_eq!(b.buffer_contents(renderer.position_buffer.id()).unwrap().len(), 4 * 12);
        assert_eq!(b.buffer_contents(renderer.direction_buffer.id()).unwrap().len(), 4 * 12);
    }

    #[test]
    fn empty_geometry_draws_nothing() {
        let (backend, view) = setup();
        let mut renderer = SurfaceRenderer::new(&view).unwrap();
        assert_eq!(renderer.index_count(), 0);

        backend.borrow_mut().take_commands();
        renderer.draw(&view.state(), &frame(&view)).unwrap();
        assert!(backend.borrow().commands().is_empty());
    }

    #[test]
    fn keep_geometry_only_uploads_directions() {
        let (backend, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();
        let mut renderer = SurfaceRenderer::new(&view).unwrap();
        backend.borrow_mut().take_commands();

        renderer.update(&view.state(), true).unwrap();
        assert_eq!(
            backend.borrow().commands(),
            &[Command::WriteBuffer { id: renderer.direction_buffer.id(), len: 48 }]
        );
    }

    #[test]
    fn tetrahedral_mesh_draws_its_boundary() {
        let (backend, mut view) = setup();
        let geometry = Geometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![],
            vec![[0, 1, 2, 3]],
        )
        .unwrap();
        view.set_geometry(geometry, vec![Vec3::X; 4]).unwrap();
        let renderer = SurfaceRenderer::new(&view).unwrap();
        assert_eq!(renderer.index_count(), 12);
        assert_eq!(indices(&backend, &renderer).len(), 12);
    }

    #[test]
    fn custom_extractor_is_used() {
        fn first_only(geometry: &Geometry) -> Vec<[u32; 3]> {
            geometry.triangles().iter().take(1).copied().collect()
        }
        let (_, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();
        let renderer = SurfaceRenderer::with_extractor(&view, first_only).unwrap();
        assert_eq!(renderer.index_count(), 3);
    }

    // ── lifetime ──────────────────────────────────────────────────────────

    #[test]
    fn drop_releases_everything_and_ids_are_fresh() {
        let (backend, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();

        let first = SurfaceRenderer::new(&view).unwrap();
        assert_eq!(backend.borrow().live_resources(), 5);
        let old_index = first.index_buffer.id();
        drop(first);
        assert_eq!(backend.borrow().live_resources(), 0);

        let second = SurfaceRenderer::new(&view).unwrap();
        assert!(second.index_buffer.id() > old_index);
    }

    #[test]
    fn failed_construction_releases_buffers() {
        let (backend, mut view) = setup();
        let mut config = Configuration::new();
        config.set_colormap_implementation("fn colormap(");
        view.update_options(&config).unwrap();

        let err = SurfaceRenderer::new(&view).err().unwrap();
        assert!(matches!(err, RenderError::Shader(ShaderError::Compile { .. })));
        assert_eq!(backend.borrow().live_resources(), 0);
    }

    // ── shader relink ─────────────────────────────────────────────────────

    #[test]
    fn only_colormap_changes_trigger_relink() {
        let (backend, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();
        let renderer = Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap()));
        view.add_renderer(renderer.clone()).unwrap();
        assert_eq!(links(&backend), 1);

        let mut config = Configuration::new();
        config
            .set_vertical_fov(30.0)
            .set_z_range(Vec2::new(-0.5, 0.5))
            .set_background_color(crate::options::Color::WHITE);
        view.update_options(&config).unwrap();
        view.draw().unwrap();
        assert_eq!(links(&backend), 1);

        let mut config = Configuration::new();
        config.set_colormap_implementation(colormap_implementation(Colormap::BlueRed));
        view.update_options(&config).unwrap();
        // deferred until the next update or draw
        assert_eq!(links(&backend), 1);
        view.draw().unwrap();
        assert_eq!(links(&backend), 2);
        assert!(renderer.borrow().has_program());
        assert_eq!(backend.borrow().live_resources(), 5);
    }

    #[test]
    fn relink_destroys_the_old_program_first() {
        let (backend, view) = setup();
        let mut renderer = SurfaceRenderer::new(&view).unwrap();
        let old = renderer.program.as_ref().map(Program::id).unwrap();
        backend.borrow_mut().take_commands();

        renderer.update_shader_program(view.options()).unwrap();
        let commands = backend.borrow_mut().take_commands();
        assert_eq!(commands[0], Command::DestroyProgram(old));
        assert!(matches!(commands[1], Command::CreateProgram(id) if id > old));
    }

    #[test]
    fn broken_colormap_skips_draws_until_fixed() {
        let (backend, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();
        let renderer = Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap()));
        view.add_renderer(renderer.clone()).unwrap();

        let mut config = Configuration::new();
        config.set_colormap_implementation("fn colormap(direction: vec3<f32>) -> vec3<f32> { return nope; }");
        view.update_options(&config).unwrap();

        let err = view.update().unwrap_err();
        assert!(matches!(
            err,
            crate::view::ViewError::Render(RenderError::Shader(ShaderError::Compile { .. }))
        ));
        assert!(!renderer.borrow().has_program());

        // The failed link is not retried on every frame.
        view.draw().unwrap();
        view.draw().unwrap();
        assert_eq!(draws(&backend), 0);

        let mut config = Configuration::new();
        config.set_colormap_implementation(colormap_implementation(Colormap::White));
        view.update_options(&config).unwrap();
        view.draw().unwrap();
        assert_eq!(draws(&backend), 1);
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn draw_issues_one_indexed_draw_with_uniforms() {
        let (backend, mut view) = setup();
        view.set_geometry(quad(), vec![Vec3::Z; 4]).unwrap();
        let mut renderer = SurfaceRenderer::new(&view).unwrap();
        let program = renderer.program.as_ref().map(Program::id).unwrap();
        backend.borrow_mut().take_commands();

        let frame = frame(&view);
        renderer.draw(&view.state(), &frame).unwrap();

        let b = backend.borrow();
        assert_eq!(
            b.commands(),
            &[Command::DrawIndexed {
                program,
                vertex_array: renderer.vertex_array.id(),
                index_buffer: renderer.index_buffer.id(),
                index_count: 6,
            }]
        );
        let uniforms: SurfaceUniforms = bytemuck::pod_read_unaligned(b.program_uniforms(program).unwrap());
        assert_eq!(uniforms.z_range, [-2.0, 2.0, 0.0, 0.0]);
        assert_eq!(uniforms.projection, frame.matrices.projection.to_cols_array_2d());
        assert_eq!(uniforms.light_position[3], 1.0);
    }

    #[test]
    fn z_range_is_widened_only_at_the_unit_bounds() {
        assert_eq!(effective_z_range(Vec2::new(-1.0, 1.0)), Vec2::new(-2.0, 2.0));
        assert_eq!(effective_z_range(Vec2::new(-1.5, 3.0)), Vec2::new(-2.0, 2.0));
        assert_eq!(effective_z_range(Vec2::new(-0.5, 0.25)), Vec2::new(-0.5, 0.25));
        assert_eq!(effective_z_range(Vec2::new(-1.0, 0.5)), Vec2::new(-2.0, 0.5));
    }

    #[test]
    fn uniform_block_is_160_bytes() {
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 160);
    }

    #[test]
    fn index_count_refuses_to_truncate() {
        assert_eq!(checked_index_count(8), Ok(24));
        let limit = u32::MAX as usize / 3;
        assert_eq!(checked_index_count(limit), Ok((limit * 3) as u32));
        assert_eq!(
            checked_index_count(limit + 1),
            Err(RenderError::TooManyIndices { triangles: limit + 1 })
        );
    }
}
