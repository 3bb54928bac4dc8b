//! Headless snapshot
//!
//! Steps the frame loop at a fixed rate without a window and saves the
//! final frame as PNG.

use std::path::Path;

use dwp_canvas::FrameView;
use dwp_js::ScriptHost;

use crate::config::PlayerConfig;
use crate::frame_loop::{FrameLoop, LoopState, Presenter};
use crate::PlayerError;

/// Discards frames; the canvas itself is the output
struct NullPresenter;

impl Presenter for NullPresenter {
    fn update(&mut self, _frame: &FrameView<'_>) -> Result<(), PlayerError> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), PlayerError> {
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        false
    }
}

/// Run frames at `t = 0, step, 2 * step, ...` up to and including `until`,
/// then write the canvas to `output`.
///
/// A script fault ends the run early; the image is still written. Returns
/// the number of completed frames.
pub fn run_snapshot(
    config: &PlayerConfig,
    host: ScriptHost,
    until: f64,
    output: &Path,
) -> Result<u64, PlayerError> {
    let step = config.step();
    // Absorbs rounding in `index * step` so `until` itself is reached
    let limit = until + step * 1e-6;

    let mut frames = FrameLoop::new(host);
    let mut index = 0u64;
    loop {
        let t = index as f64 * step;
        if t > limit || frames.tick_at(t, &mut NullPresenter) == LoopState::Stopped {
            break;
        }
        index += 1;
    }

    frames.host().canvas().borrow().save_png(output)?;
    tracing::info!(frames = frames.frames(), path = %output.display(), "Snapshot written");
    Ok(frames.frames())
}
