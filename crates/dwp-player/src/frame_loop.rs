//! Frame Loop
//!
//! Calls the script once per tick with the elapsed time, then hands the
//! finished frame to a presenter.

use std::time::Instant;

use dwp_canvas::FrameView;
use dwp_js::{ScriptError, ScriptHost};

use crate::PlayerError;

/// Where finished frames go.
///
/// Construction is initialization and `Drop` is cleanup.
pub trait Presenter {
    /// Take a copy of the frame for display
    fn update(&mut self, frame: &FrameView<'_>) -> Result<(), PlayerError>;

    /// Show the last updated frame
    fn present(&mut self) -> Result<(), PlayerError>;

    /// Whether the user asked to quit since the last poll
    fn poll_quit(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Drives one [`ScriptHost`]
#[derive(Debug)]
pub struct FrameLoop {
    host: ScriptHost,
    start: Option<Instant>,
    state: LoopState,
    frames: u64,
}

impl FrameLoop {
    pub fn new(host: ScriptHost) -> Self {
        Self {
            host,
            start: None,
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn host(&self) -> &ScriptHost {
        &self.host
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            tracing::debug!(frames = self.frames, "Frame loop stopped");
        }
        self.state = LoopState::Stopped;
    }

    /// Seconds since the first tick
    fn elapsed(&mut self) -> f64 {
        let now = Instant::now();
        let start = *self.start.get_or_insert(now);
        now.duration_since(start).as_secs_f64()
    }

    /// Run one frame at the current wall-clock time
    pub fn tick(&mut self, presenter: &mut dyn Presenter) -> LoopState {
        let t = self.elapsed();
        self.tick_at(t, presenter)
    }

    /// Run one frame at time `t`.
    ///
    /// A script fault is reported and stops the loop; the faulted frame is
    /// not presented.
    pub fn tick_at(&mut self, t: f64, presenter: &mut dyn Presenter) -> LoopState {
        if self.state == LoopState::Stopped {
            return self.state;
        }

        if let Err(error) = self.host.invoke(t) {
            report_fault(t, &error);
            self.stop();
            return self.state;
        }
        self.frames += 1;

        // The canvas borrow ends before the next invoke
        let shown = {
            let canvas = self.host.canvas().borrow();
            match canvas.frame() {
                Some(frame) => presenter.update(&frame).and_then(|()| presenter.present()),
                None => Ok(()),
            }
        };
        if let Err(error) = shown {
            tracing::warn!("Skipped frame {}: {}", self.frames, error);
        }

        if presenter.poll_quit() {
            self.stop();
        }
        self.state
    }

    /// Tick until the presenter asks to quit or the script faults
    pub fn run(&mut self, presenter: &mut dyn Presenter) {
        while self.tick(presenter) == LoopState::Running {}
    }
}

fn report_fault(t: f64, error: &ScriptError) {
    tracing::error!(target: "script", "{} (t = {:.3}s)", error, t);
    if let Some(stack) = error.stack() {
        tracing::error!(target: "script", "{}", stack.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what it was shown and quits after `quit_after` presents
    #[derive(Default)]
    struct Recorder {
        centers: Vec<u32>,
        presents: usize,
        quit_after: Option<usize>,
        fail_update: bool,
    }

    impl Presenter for Recorder {
        fn update(&mut self, frame: &FrameView<'_>) -> Result<(), PlayerError> {
            if self.fail_update {
                return Err(PlayerError::Surface("lost".to_string()));
            }
            self.centers.push(frame.pixel(frame.width() / 2, frame.height() / 2));
            Ok(())
        }

        fn present(&mut self) -> Result<(), PlayerError> {
            self.presents += 1;
            Ok(())
        }

        fn poll_quit(&mut self) -> bool {
            self.quit_after.is_some_and(|limit| self.presents >= limit)
        }
    }

    fn frame_loop(source: &str) -> FrameLoop {
        FrameLoop::new(ScriptHost::new(source, 10, 10).unwrap())
    }

    #[test]
    fn test_frames_reach_presenter() {
        let mut frames = frame_loop("c.width = 10; if (t >= 1) x.fillRect(0, 0, 10, 10)");
        let mut recorder = Recorder::default();

        assert_eq!(frames.tick_at(0.0, &mut recorder), LoopState::Running);
        assert_eq!(frames.tick_at(1.0, &mut recorder), LoopState::Running);
        assert_eq!(recorder.centers, [0xFFFFFFFF, 0xFF000000]);
        assert_eq!(frames.frames(), 2);
    }

    #[test]
    fn test_fault_stops_loop() {
        let mut frames = frame_loop("if (t > 0.5) throw new Error('done')");
        let mut recorder = Recorder::default();

        assert_eq!(frames.tick_at(0.25, &mut recorder), LoopState::Running);
        assert_eq!(frames.tick_at(0.75, &mut recorder), LoopState::Stopped);
        assert_eq!(recorder.presents, 1);

        // Stopped loops do not call the script again
        assert_eq!(frames.tick_at(0.0, &mut recorder), LoopState::Stopped);
        assert_eq!(frames.frames(), 1);
    }

    #[test]
    fn test_quit_signal_stops_run() {
        let mut frames = frame_loop("");
        let mut recorder = Recorder {
            quit_after: Some(3),
            ..Default::default()
        };
        frames.run(&mut recorder);
        assert_eq!(frames.state(), LoopState::Stopped);
        assert_eq!(recorder.presents, 3);
    }

    #[test]
    fn test_run_until_script_fault() {
        let mut frames = frame_loop("n = (n || 0) + 1; if (n > 4) throw 'enough'");
        frames.host().evaluate("var n").unwrap();
        let mut recorder = Recorder::default();
        frames.run(&mut recorder);
        assert!(!frames.is_running());
        assert_eq!(frames.frames(), 4);
    }

    #[test]
    fn test_present_failure_skips_frame() {
        let mut frames = frame_loop("");
        let mut recorder = Recorder {
            fail_update: true,
            ..Default::default()
        };
        assert_eq!(frames.tick_at(0.0, &mut recorder), LoopState::Running);
        assert_eq!(recorder.presents, 0);
    }

    #[test]
    fn test_wall_clock_starts_at_zero() {
        let mut frames = frame_loop("");
        assert_eq!(frames.elapsed(), 0.0);
        assert!(frames.elapsed() >= 0.0);
    }
}
