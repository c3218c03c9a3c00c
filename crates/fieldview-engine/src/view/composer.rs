use std::cell::RefMut;
use std::rc::Rc;

use glam::Vec3;

use crate::geometry::Geometry;
use crate::gpu::GpuContext;
use crate::options::{ChangedOptions, Configuration, Options, OptionsError};
use crate::renderer::{RenderError, Renderer, RendererHandle};

use super::{CameraMatrices, FrameParams, ViewId, ViewState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("expected {expected} directions (one per position), got {found}")]
    DirectionCount { expected: usize, found: usize },
    #[error("renderer belongs to {renderer}, not {view}")]
    ForeignRenderer { renderer: ViewId, view: ViewId },
    #[error("renderer is borrowed elsewhere")]
    RendererBusy,
}

/// Owns the scene state and the ordered list of renderers drawing it.
///
/// Renderers see the state through a [`ViewState`] borrow and are notified
/// of option changes and geometry/direction updates in list order.
pub struct View {
    id: ViewId,
    gpu: GpuContext,
    options: Options,
    geometry: Geometry,
    directions: Vec<Vec3>,
    framebuffer_size: (u32, u32),
    renderers: Vec<RendererHandle>,
}

impl View {
    pub fn new(gpu: GpuContext) -> Self {
        let id = ViewId::next();
        log::debug!("created {id}");
        Self {
            id,
            gpu,
            options: Options::new(),
            geometry: Geometry::default(),
            directions: Vec::new(),
            framebuffer_size: (1, 1),
            renderers: Vec::new(),
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[inline]
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    pub fn state(&self) -> ViewState<'_> {
        ViewState {
            id: self.id,
            options: &self.options,
            geometry: &self.geometry,
            directions: &self.directions,
        }
    }

    // ── framebuffer ───────────────────────────────────────────────────────

    pub fn set_framebuffer_size(&mut self, width: u32, height: u32) {
        self.framebuffer_size = (width, height);
    }

    #[inline]
    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer_size
    }

    /// Width over height; 1.0 while the height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.framebuffer_size;
        if h == 0 { 1.0 } else { w as f32 / h as f32 }
    }

    // ── renderers ─────────────────────────────────────────────────────────

    #[inline]
    pub fn renderers(&self) -> &[RendererHandle] {
        &self.renderers
    }

    /// Appends a renderer. It is drawn after the ones already present.
    pub fn add_renderer(&mut self, renderer: RendererHandle) -> Result<(), ViewError> {
        self.check_owner(&renderer)?;
        self.renderers.push(renderer);
        Ok(())
    }

    /// Removes `renderer`; returns whether it was present.
    pub fn remove_renderer(&mut self, renderer: &RendererHandle) -> bool {
        let before = self.renderers.len();
        self.renderers.retain(|r| !Rc::ptr_eq(r, renderer));
        self.renderers.len() != before
    }

    /// Replaces the renderer list. Nothing changes if any renderer is foreign.
    pub fn set_renderers(&mut self, renderers: Vec<RendererHandle>) -> Result<(), ViewError> {
        for renderer in &renderers {
            self.check_owner(renderer)?;
        }
        self.renderers = renderers;
        Ok(())
    }

    fn check_owner(&self, renderer: &RendererHandle) -> Result<(), ViewError> {
        let owner = renderer.try_borrow().map_err(|_| ViewError::RendererBusy)?.view_id();
        if owner != self.id {
            return Err(ViewError::ForeignRenderer {
                renderer: owner,
                view: self.id,
            });
        }
        Ok(())
    }

    // ── state changes ─────────────────────────────────────────────────────

    /// Applies `config` and tells every renderer which keys changed.
    ///
    /// Renderers are notified even when nothing changed. If any renderer is
    /// borrowed elsewhere nothing is applied, so a retry sees the same diff.
    pub fn update_options(&mut self, config: &Configuration) -> Result<ChangedOptions, ViewError> {
        let mut renderers = borrow_all(&self.renderers)?;
        let changed = self.options.apply_changes(config)?;
        if !changed.is_empty() {
            log::debug!("{}: options changed: {:?}", self.id, changed.as_slice());
        }
        for renderer in &mut renderers {
            renderer.on_options_changed(&changed);
        }
        Ok(changed)
    }

    /// Replaces geometry and directions, adopts the geometry's bounds as the
    /// bounding box and re-uploads everything.
    pub fn set_geometry(&mut self, geometry: Geometry, directions: Vec<Vec3>) -> Result<(), ViewError> {
        check_direction_count(&geometry, &directions)?;
        let bounds = (!geometry.is_empty()).then(|| (geometry.min(), geometry.max()));
        self.geometry = geometry;
        self.directions = directions;

        if let Some((min, max)) = bounds {
            let mut config = Configuration::new();
            config.set_bounding_box(min, max);
            self.update_options(&config)?;
        }
        self.update()
    }

    /// Replaces the directions only; renderers keep their geometry.
    pub fn update_directions(&mut self, directions: Vec<Vec3>) -> Result<(), ViewError> {
        check_direction_count(&self.geometry, &directions)?;
        self.directions = directions;
        self.update_renderers(true)
    }

    /// Re-uploads geometry and directions in every renderer.
    pub fn update(&mut self) -> Result<(), ViewError> {
        self.update_renderers(false)
    }

    /// Updates every renderer, even after one fails; returns the first error.
    fn update_renderers(&mut self, keep_geometry: bool) -> Result<(), ViewError> {
        let mut renderers = borrow_all(&self.renderers)?;
        let state = self.state();
        let mut first_error = None;
        for renderer in &mut renderers {
            if let Err(err) = renderer.update(&state, keep_geometry) {
                log::debug!("{}: renderer update failed: {err}", self.id);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    // ── drawing ───────────────────────────────────────────────────────────

    /// Draws a frame at the framebuffer aspect ratio.
    pub fn draw(&mut self) -> Result<(), ViewError> {
        self.draw_with_aspect(self.aspect_ratio())
    }

    /// Clears to the background color, then draws every renderer in order.
    ///
    /// Stops at the first renderer that fails.
    pub fn draw_with_aspect(&mut self, aspect_ratio: f32) -> Result<(), ViewError> {
        self.gpu.clear(self.options.background_color().to_array());

        let frame = FrameParams {
            aspect_ratio,
            matrices: CameraMatrices::from_options(&self.options, aspect_ratio),
        };
        let state = self.state();
        for renderer in &self.renderers {
            renderer
                .try_borrow_mut()
                .map_err(|_| ViewError::RendererBusy)?
                .draw(&state, &frame)?;
        }
        Ok(())
    }
}

/// Borrows every renderer, or none of them if one is borrowed elsewhere.
fn borrow_all(
    renderers: &[RendererHandle],
) -> Result<Vec<RefMut<'_, dyn Renderer + 'static>>, ViewError> {
    renderers
        .iter()
        .map(|r| r.try_borrow_mut().map_err(|_| ViewError::RendererBusy))
        .collect()
}

fn check_direction_count(geometry: &Geometry, directions: &[Vec3]) -> Result<(), ViewError> {
    let expected = geometry.positions().len();
    if directions.len() != expected {
        return Err(ViewError::DirectionCount {
            expected,
            found: directions.len(),
        });
    }
    Ok(())
}
