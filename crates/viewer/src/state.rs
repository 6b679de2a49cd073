//! Per-frame viewer state: camera, light, post-process parameters and the renderer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use engine_core::{Interval, LightState, PostProcessParams, Time};
use input::{InputEdgeState, InputState, MouseButton};
use renderer::{Camera, FrameOutcome, Renderer};
use winit::window::{CursorGrabMode, Window};

use crate::config::ViewerConfig;
use crate::controls::apply_controls;

/// Seconds between debug readout lines.
const DEBUG_READOUT_PERIOD: f32 = 0.5;

pub struct ViewerState {
    pub(crate) renderer: Renderer,
    pub(crate) camera: Camera,
    pub(crate) input: InputState,
    edges: InputEdgeState,
    time: Time,

    params: PostProcessParams,
    light: LightState,

    debug_readout: bool,
    readout_interval: Interval,

    screenshot_dir: PathBuf,
    screenshot_requested: bool,

    pub(crate) running: bool,
}

impl ViewerState {
    pub async fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self> {
        let renderer = Renderer::new(window, config.renderer_settings()).await?;

        let mut camera = Camera::default();
        camera.speed = config.camera_speed;
        camera.sensitivity = config.mouse_sensitivity;
        let (width, height) = renderer.dimensions();
        camera.set_aspect(width, height);

        let mut state = Self {
            renderer,
            camera,
            input: InputState::new(),
            edges: InputEdgeState::new(),
            time: Time::new(),
            params: PostProcessParams::default(),
            light: LightState::default(),
            debug_readout: false,
            readout_interval: Interval::new(DEBUG_READOUT_PERIOD),
            screenshot_dir: config.screenshot_dir.clone(),
            screenshot_requested: false,
            running: true,
        };
        state.set_capture(true);
        Ok(state)
    }

    /// Grab and hide the cursor, or release it.
    pub(crate) fn set_capture(&mut self, captured: bool) {
        let window = &self.renderer.window;
        if captured {
            if let Err(e) = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
            {
                log::warn!("Could not grab cursor: {}", e);
            }
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.input.set_cursor_locked(captured);
    }

    /// Consume this frame's input and advance the light.
    pub(crate) fn update(&mut self) {
        self.time.update();
        let dt = self.time.delta_seconds();
        self.input.begin_frame();

        let actions = apply_controls(&self.input, &mut self.edges, dt, &mut self.params, &mut self.light);
        if actions.toggle_capture {
            let captured = !self.input.is_cursor_locked();
            self.set_capture(captured);
        } else if !self.input.is_cursor_locked() && self.input.is_mouse_pressed(MouseButton::Left) {
            self.set_capture(true);
        }
        if actions.toggle_debug {
            self.debug_readout = !self.debug_readout;
        }
        if actions.screenshot {
            self.screenshot_requested = true;
        }

        if self.input.is_cursor_locked() {
            let delta = self.input.mouse_delta();
            if delta != glam::Vec2::ZERO {
                self.camera.process_mouse(delta.x, delta.y);
            }
        }
        self.camera.process_movement(self.input.get_movement_input(), dt);
        let scroll = self.input.scroll();
        if scroll != 0.0 {
            self.camera.process_scroll(scroll);
        }

        self.light.advance(dt);

        if self.debug_readout && self.readout_interval.tick(dt) {
            self.log_readout();
        }

        self.input.end_frame();
    }

    fn log_readout(&self) {
        let (light, params) = (&self.light, &self.params);
        log::info!(
            "animate={} radius={:.2} speed={:.2} height={:.2} | contrast={:.2} brightness={:.2} exposure={:.2} saturation={:.2} vignette={:.2} softness={:.2}",
            light.animate,
            light.radius,
            light.speed,
            light.height,
            params.contrast,
            params.brightness,
            params.exposure,
            params.saturation,
            params.vignette,
            params.vignette_softness,
        );
    }

    /// Apply any queued resize, then draw. Errors here end the event loop.
    pub(crate) fn render(&mut self) -> Result<()> {
        if let Some((width, height)) = self.renderer.apply_pending_resize()? {
            self.camera.set_aspect(width, height);
        }

        let screenshot = self
            .screenshot_requested
            .then(|| renderer::timestamped_path(&self.screenshot_dir));

        match self.renderer.render(&self.camera, &self.light, &self.params, screenshot)? {
            FrameOutcome::Presented => self.screenshot_requested = false,
            // Keep the request for the next frame that reaches the screen.
            FrameOutcome::Skipped => {}
        }
        Ok(())
    }
}
