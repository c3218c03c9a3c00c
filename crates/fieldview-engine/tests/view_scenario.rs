//! View + SurfaceRenderer driven end to end against the recording backend.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{UVec3, Vec2, Vec3};

use fieldview_engine::colormap::{colormap_implementation, Colormap};
use fieldview_engine::geometry::Geometry;
use fieldview_engine::gpu::{Command, GpuContext, RecordingBackend, ShaderError};
use fieldview_engine::options::{ChangedOptions, Color, Configuration, ViewOption};
use fieldview_engine::renderer::{self, RenderError, Renderer, RendererHandle, SurfaceRenderer};
use fieldview_engine::view::{FrameParams, View, ViewError, ViewId, ViewState};

fn setup() -> (Rc<RefCell<RecordingBackend>>, View) {
    let backend = Rc::new(RefCell::new(RecordingBackend::new()));
    let view = View::new(GpuContext::from_shared(backend.clone()));
    (backend, view)
}

/// Remembers the point count of every geometry upload it is asked for.
struct MeshCounter {
    view: ViewId,
    uploads: Rc<RefCell<Vec<usize>>>,
}

impl Renderer for MeshCounter {
    fn view_id(&self) -> ViewId {
        self.view
    }

    fn on_options_changed(&mut self, _changed: &ChangedOptions) {}

    fn update(&mut self, view: &ViewState<'_>, keep_geometry: bool) -> Result<(), RenderError> {
        if !keep_geometry {
            self.uploads.borrow_mut().push(view.geometry.positions().len());
        }
        Ok(())
    }

    fn draw(&mut self, _view: &ViewState<'_>, _frame: &FrameParams) -> Result<(), RenderError> {
        Ok(())
    }
}

fn grid(n: UVec3) -> Geometry {
    Geometry::cartesian(n, Vec3::ZERO, n.as_vec3() - Vec3::ONE).unwrap()
}

#[test]
fn flat_grid_frame() {
    let (backend, mut view) = setup();
    let geometry = grid(UVec3::new(3, 3, 1));
    let points = geometry.positions().len();
    view.set_geometry(geometry, vec![Vec3::Z; points]).unwrap();
    assert_eq!(view.options().bounding_box(), (Vec3::ZERO, Vec3::new(2.0, 2.0, 0.0)));

    let surface = Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap()));
    view.add_renderer(surface.clone()).unwrap();
    // 2x2 cells, two triangles each
    assert_eq!(surface.borrow().index_count(), 24);

    let mut config = Configuration::new();
    config
        .set_camera_position(Vec3::new(1.0, 1.0, 8.0))
        .set_center_position(Vec3::new(1.0, 1.0, 0.0))
        .set_background_color(Color::new(0.1, 0.1, 0.1));
    view.update_options(&config).unwrap();

    backend.borrow_mut().take_commands();
    view.set_framebuffer_size(640, 480);
    view.draw().unwrap();

    let commands = backend.borrow_mut().take_commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0], Command::Clear([0.1, 0.1, 0.1]));
    assert!(matches!(commands[1], Command::DrawIndexed { index_count: 24, .. }));
}

#[test]
fn volume_grid_draws_only_its_hull() {
    let (_, mut view) = setup();
    let geometry = grid(UVec3::new(3, 3, 3));
    let points = geometry.positions().len();
    view.set_geometry(geometry, vec![Vec3::X; points]).unwrap();

    let surface = SurfaceRenderer::new(&view).unwrap();
    // six faces of 2x2 quads, two triangles each
    assert_eq!(surface.index_count(), 6 * 4 * 2 * 3);
}

#[test]
fn animation_frames_only_move_directions() {
    let (backend, mut view) = setup();
    let geometry = grid(UVec3::new(4, 4, 1));
    let points = geometry.positions().len();
    view.set_geometry(geometry, vec![Vec3::Z; points]).unwrap();
    let surface: RendererHandle = Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap()));
    view.add_renderer(surface).unwrap();
    backend.borrow_mut().take_commands();

    for step in 0..3 {
        let angle = step as f32 * 0.5;
        let dir = Vec3::new(angle.cos(), angle.sin(), 0.0);
        view.update_directions(vec![dir; points]).unwrap();
        view.draw_with_aspect(1.0).unwrap();
    }

    let commands = backend.borrow().commands().to_vec();
    let writes: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::WriteBuffer { len, .. } => Some(*len),
            _ => None,
        })
        .collect();
    assert_eq!(writes, vec![points * 12; 3]);
    assert_eq!(commands.iter().filter(|c| c.is_draw()).count(), 3);
    assert!(!commands.iter().any(|c| matches!(c, Command::CreateProgram(_))));
}

#[test]
fn colormap_cycle_relinks_once_per_change() {
    let (backend, mut view) = setup();
    let geometry = grid(UVec3::new(2, 2, 1));
    view.set_geometry(geometry, vec![Vec3::Z; 4]).unwrap();
    view.add_renderer(Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap())))
        .unwrap();
    backend.borrow_mut().take_commands();

    let mut colormap = Colormap::Hsv;
    for _ in 0..Colormap::ALL.len() {
        colormap = colormap.next();
        let mut config = Configuration::new();
        config.set_colormap_implementation(colormap_implementation(colormap));
        let changed = view.update_options(&config).unwrap();
        // back at hsv on the last step, which differs from the previous map
        assert_eq!(changed.as_slice(), &[ViewOption::ColormapImplementation]);
        view.draw().unwrap();
        view.draw().unwrap();
    }

    let b = backend.borrow();
    let links = b.commands().iter().filter(|c| matches!(c, Command::CreateProgram(_))).count();
    assert_eq!(links, Colormap::ALL.len());
    assert_eq!(b.draw_calls(), 2 * Colormap::ALL.len());
}

#[test]
fn z_range_reaches_the_shader_widened() {
    let (backend, mut view) = setup();
    view.set_geometry(grid(UVec3::new(2, 2, 1)), vec![Vec3::Z; 4]).unwrap();
    let surface = SurfaceRenderer::new(&view).unwrap();
    view.add_renderer(Rc::new(RefCell::new(surface))).unwrap();

    let mut config = Configuration::new();
    config.set_z_range(Vec2::new(-0.25, 1.0));
    view.update_options(&config).unwrap();
    view.draw().unwrap();

    let b = backend.borrow();
    let Some(Command::DrawIndexed { program, .. }) = b.commands().iter().rev().find(|c| c.is_draw()) else {
        panic!("no draw recorded");
    };
    let bytes = b.program_uniforms(*program).unwrap();
    // z_range is the last vec4 of the block
    let z: [f32; 4] = bytemuck::pod_read_unaligned(&bytes[144..160]);
    assert_eq!(z, [-0.25, 2.0, 0.0, 0.0]);
}

#[test]
fn renderer_from_another_view_is_refused() {
    let (_, mut a) = setup();
    let (_, b) = setup();
    let foreign = SurfaceRenderer::new(&b).unwrap();
    let err = a.add_renderer(Rc::new(RefCell::new(foreign))).unwrap_err();
    assert!(matches!(err, ViewError::ForeignRenderer { .. }));
}

#[test]
fn dropping_the_view_releases_gpu_resources() {
    let (backend, mut view) = setup();
    view.set_geometry(grid(UVec3::new(2, 2, 1)), vec![Vec3::Z; 4]).unwrap();
    view.add_renderer(Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap())))
        .unwrap();
    assert!(backend.borrow().live_resources() > 0);
    drop(view);
    assert_eq!(backend.borrow().live_resources(), 0);
}

#[test]
fn broken_colormap_does_not_hold_back_later_renderers() {
    let (_, mut view) = setup();
    view.set_geometry(grid(UVec3::new(2, 2, 1)), vec![Vec3::Z; 4]).unwrap();
    let surface = Rc::new(RefCell::new(SurfaceRenderer::new(&view).unwrap()));
    let uploads = Rc::new(RefCell::new(Vec::new()));
    let counter = renderer::handle(MeshCounter {
        view: view.id(),
        uploads: uploads.clone(),
    });
    view.set_renderers(vec![surface.clone(), counter]).unwrap();
    view.update().unwrap();

    let mut config = Configuration::new();
    config.set_colormap_implementation("fn colormap(");
    view.update_options(&config).unwrap();

    let err = view.set_geometry(grid(UVec3::new(3, 3, 1)), vec![Vec3::Z; 9]).unwrap_err();
    assert!(matches!(err, ViewError::Render(RenderError::Shader(ShaderError::Compile { .. }))));
    assert_eq!(*uploads.borrow(), vec![4, 9]);

    // The failing renderer still took the new mesh and keeps running.
    assert_eq!(surface.borrow().index_count(), 24);
    assert!(!surface.borrow().has_program());
    view.update_directions(vec![Vec3::X; 9]).unwrap();
    view.draw().unwrap();
}
