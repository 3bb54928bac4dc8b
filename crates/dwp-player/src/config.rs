//! Player configuration

use std::path::PathBuf;

/// Settings for one player run
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Script file
    pub script: PathBuf,
    /// Canvas size in pixels
    pub width: u32,
    pub height: u32,
    /// The window shows the canvas at `1 / scale` of its size
    pub scale: u32,
    pub title: String,
    /// Render headless up to this time (seconds) instead of opening a window
    pub snapshot: Option<f64>,
    /// PNG written by a headless run
    pub output: Option<PathBuf>,
    /// Fixed step rate for headless runs
    pub fps: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::new(),
            width: 1920,
            height: 1080,
            scale: 2,
            title: "Dwitter Player".to_string(),
            snapshot: None,
            output: None,
            fps: 60,
        }
    }
}

impl PlayerConfig {
    /// Initial window size in logical pixels
    pub fn window_size(&self) -> (u32, u32) {
        let scale = self.scale.max(1);
        ((self.width / scale).max(1), (self.height / scale).max(1))
    }

    /// Seconds between headless frames
    pub fn step(&self) -> f64 {
        1.0 / f64::from(self.fps.max(1))
    }
}
