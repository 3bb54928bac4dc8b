//! Player Application
//!
//! Window and event loop around the frame loop.

use std::sync::Arc;

use dwp_js::ScriptHost;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::PlayerConfig;
use crate::frame_loop::{FrameLoop, LoopState};
use crate::presenter::WindowPresenter;
use crate::PlayerError;

/// Open a window and play `host` until the user quits or the script faults
pub fn run_window(config: &PlayerConfig, host: ScriptHost) -> Result<(), PlayerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayerApp::new(config, FrameLoop::new(host));
    event_loop.run_app(&mut app)?;

    tracing::info!(frames = app.frames.frames(), "Player closed");
    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Player state for the event loop
struct PlayerApp {
    /// Presenter owns the window and surface
    presenter: Option<WindowPresenter>,
    frames: FrameLoop,
    title: String,
    /// Initial window size
    width: u32,
    height: u32,
    /// Startup failure reported after the loop exits
    error: Option<PlayerError>,
}

impl PlayerApp {
    fn new(config: &PlayerConfig, frames: FrameLoop) -> Self {
        let (width, height) = config.window_size();
        Self {
            presenter: None,
            frames,
            title: config.title.clone(),
            width,
            height,
            error: None,
        }
    }

    fn create_presenter(&self, event_loop: &ActiveEventLoop) -> Result<WindowPresenter, PlayerError> {
        let attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(self.width, self.height));
        let window = event_loop
            .create_window(attrs)
            .map_err(|e| PlayerError::Window(e.to_string()))?;
        WindowPresenter::new(Arc::new(window))
    }

    fn handle_key(&mut self, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        if let PhysicalKey::Code(KeyCode::KeyQ | KeyCode::Escape) = event.physical_key {
            self.request_quit();
        }
    }

    fn request_quit(&mut self) {
        if let Some(presenter) = &mut self.presenter {
            presenter.request_quit();
        }
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_some() {
            return;
        }

        match self.create_presenter(event_loop) {
            Ok(presenter) => {
                tracing::debug!(width = self.width, height = self.height, "Window created");
                presenter.window().request_redraw();
                self.presenter = Some(presenter);
            }
            Err(error) => {
                self.error = Some(error);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.request_quit();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event);
            }
            WindowEvent::RedrawRequested => {
                let Some(presenter) = &mut self.presenter else { return };
                if self.frames.tick(presenter) == LoopState::Stopped {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.frames.is_running() {
            event_loop.exit();
            return;
        }
        if let Some(presenter) = &self.presenter {
            presenter.window().request_redraw();
        }
    }
}
