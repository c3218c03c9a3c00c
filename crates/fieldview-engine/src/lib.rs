//! fieldview engine.
//!
//! Vector-field visualization: a [`view::View`] owns typed options, the
//! sampling geometry and per-point directions, and draws them through an
//! ordered list of renderers sharing one GPU context.
//!
//! Layers:
//! - scene model: [`geometry`], [`options`], [`colormap`]
//! - drawing: [`view`], [`renderer`], [`gpu`]
//! - runtime: [`device`], [`window`], [`core`], [`time`], [`logging`]

pub mod colormap;
pub mod geometry;
pub mod gpu;
pub mod options;
pub mod renderer;
pub mod view;

pub mod core;
pub mod device;
pub mod logging;
pub mod time;
pub mod window;
