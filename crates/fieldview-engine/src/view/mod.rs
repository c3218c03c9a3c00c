//! The View: options, geometry, directions and an ordered renderer list
//! sharing one GPU context.

mod camera;
mod composer;
mod state;

pub use camera::CameraMatrices;
pub use composer::{View, ViewError};
pub use state::{FrameParams, ViewId, ViewState};
