mod cli;
mod field;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::{UVec3, Vec3};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use fieldview_engine::colormap::{colormap_implementation, Colormap};
use fieldview_engine::core::{App, AppControl, FrameCtx};
use fieldview_engine::device::GpuInit;
use fieldview_engine::geometry::Geometry;
use fieldview_engine::gpu::{GpuContext, WgpuBackend};
use fieldview_engine::logging::{init_logging, LoggingConfig};
use fieldview_engine::options::Configuration;
use fieldview_engine::renderer::{self, SurfaceRenderer};
use fieldview_engine::view::View;
use fieldview_engine::window::{Runtime, RuntimeConfig};

use cli::Cli;

const ORBIT_STEP: f32 = 0.1;
const SPIN_SPEED: f32 = 0.5;

/// GPU-side state, created on the first frame once a device exists.
struct Scene {
    backend: Rc<RefCell<WgpuBackend>>,
    view: View,
    center: Vec3,
    radius: f32,
}

impl Scene {
    fn new(ctx: &FrameCtx<'_, '_>, args: &Cli, colormap: Colormap) -> Result<Self> {
        let backend = Rc::new(RefCell::new(WgpuBackend::new(
            ctx.gpu.device(),
            ctx.gpu.queue(),
            ctx.gpu.surface_format(),
            ctx.framebuffer_size(),
        )));
        let mut view = View::new(GpuContext::from_shared(backend.clone()));

        let n = UVec3::new(args.nx, args.ny, args.nz);
        let max = (n.as_vec3() - Vec3::ONE).max(Vec3::ZERO);
        let geometry = Geometry::cartesian(n, Vec3::ZERO, max).context("invalid grid size")?;
        let center = (geometry.min() + geometry.max()) * 0.5;
        let radius = (geometry.max() - geometry.min()).truncate().max_element().max(1.0) * 0.5;
        let directions = field::skyrmion(geometry.positions(), center, radius, 0.0);
        view.set_geometry(geometry, directions)?;

        let mut config = Configuration::new();
        config
            .set_center_position(center)
            .set_up_vector(Vec3::Z)
            .set_colormap_implementation(colormap_implementation(colormap));
        view.update_options(&config)?;

        let surface = SurfaceRenderer::new(&view).context("failed to build surface renderer")?;
        view.add_renderer(renderer::handle(surface))?;

        log::info!("scene ready: {}x{}x{} points", args.nx, args.ny, args.nz);
        Ok(Self {
            backend,
            view,
            center,
            radius,
        })
    }

    fn camera_position(&self, orbit: f32) -> Vec3 {
        let distance = self.radius * 3.0;
        self.center + Vec3::new(distance * orbit.sin(), -distance * orbit.cos(), distance)
    }
}

struct Studio {
    args: Cli,
    colormap: Colormap,
    orbit: f32,
    dirty_camera: bool,
    dirty_colormap: bool,
    scene: Option<Scene>,
}

impl Studio {
    fn new(args: Cli) -> Result<Self> {
        let colormap = Colormap::from_name(&args.colormap)
            .with_context(|| format!("unknown colormap `{}`", args.colormap))?;
        Ok(Self {
            args,
            colormap,
            orbit: 0.0,
            dirty_camera: true,
            dirty_colormap: false,
            scene: None,
        })
    }

    /// Pushes pending camera/colormap changes and animates the field.
    fn step(&mut self, scene: &mut Scene, elapsed: f32) -> Result<()> {
        let mut config = Configuration::new();
        if self.dirty_camera {
            config.set_camera_position(scene.camera_position(self.orbit));
            self.dirty_camera = false;
        }
        if self.dirty_colormap {
            config.set_colormap_implementation(colormap_implementation(self.colormap));
            self.dirty_colormap = false;
            log::info!("colormap: {}", self.colormap.name());
        }
        if !config.is_empty() {
            scene.view.update_options(&config)?;
        }

        let directions = field::skyrmion(
            scene.view.geometry().positions(),
            scene.center,
            scene.radius,
            elapsed * SPIN_SPEED,
        );
        scene.view.update_directions(directions)?;
        scene.view.draw()?;
        Ok(())
    }
}

impl App for Studio {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => return AppControl::Exit,
            PhysicalKey::Code(KeyCode::ArrowLeft) => {
                self.orbit -= ORBIT_STEP;
                self.dirty_camera = true;
            }
            PhysicalKey::Code(KeyCode::ArrowRight) => {
                self.orbit += ORBIT_STEP;
                self.dirty_camera = true;
            }
            PhysicalKey::Code(KeyCode::KeyC) => {
                self.colormap = self.colormap.next();
                self.dirty_colormap = true;
            }
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let mut scene = match self.scene.take() {
            Some(scene) => scene,
            None => match Scene::new(ctx, &self.args, self.colormap) {
                Ok(scene) => scene,
                Err(err) => {
                    log::error!("{err:#}");
                    return AppControl::Exit;
                }
            },
        };

        let (width, height) = ctx.framebuffer_size();
        scene.view.set_framebuffer_size(width, height);
        scene.backend.borrow_mut().resize(width, height);

        if let Err(err) = self.step(&mut scene, ctx.time.elapsed) {
            // The frame still clears to the last background; keep running.
            log::error!("{err:#}");
        }

        let backend = scene.backend.clone();
        self.scene = Some(scene);
        ctx.render(|encoder, color| backend.borrow_mut().encode_frame(encoder, color))
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let config = RuntimeConfig {
        title: "fieldview studio".to_string(),
        initial_size: LogicalSize::new(args.width, args.height),
    };
    let studio = Studio::new(args)?;
    Runtime::run(config, GpuInit::default(), studio)
}
