//! dwplay Player
//!
//! Drives a script host once per frame and shows the result.
//!
//! Features:
//! - Wall-clock frame loop with a pluggable presenter
//! - Window presenter (winit + softbuffer, nearest-neighbour scaling)
//! - Headless fixed-step snapshot to PNG

mod app;
mod config;
mod frame_loop;
mod headless;
mod presenter;

pub use app::run_window;
pub use config::PlayerConfig;
pub use frame_loop::{FrameLoop, LoopState, Presenter};
pub use headless::run_snapshot;
pub use presenter::{scale_nearest, WindowPresenter};

/// Player error
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Window error: {0}")]
    Window(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Snapshot failed: {0}")]
    Snapshot(#[from] dwp_canvas::CanvasError),
}
