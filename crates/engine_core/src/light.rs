//! Point light placement: a continuous orbit or a snapped compass direction.

use glam::Vec3;
use std::f32::consts::TAU;

/// Which placement mode drives the light. Exactly one is active at a time;
/// the inactive mode keeps its state so toggling back resumes where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    Orbit,
    Snap,
}

/// Number of equally spaced compass directions in snap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapSteps {
    Four,
    Eight,
}

impl SnapSteps {
    pub fn count(self) -> u32 {
        match self {
            SnapSteps::Four => 4,
            SnapSteps::Eight => 8,
        }
    }
}

/// A scalar light parameter ramped by held keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightParam {
    Radius,
    Speed,
    Height,
}

impl LightParam {
    pub fn range(self) -> (f32, f32) {
        match self {
            LightParam::Radius => (0.2, f32::INFINITY),
            LightParam::Speed => (0.0, f32::INFINITY),
            LightParam::Height => (f32::NEG_INFINITY, f32::INFINITY),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    pub mode: LightMode,
    /// Orbit angle in radians, accumulated while animated.
    pub orbit_angle: f32,
    pub animate: bool,
    pub snap_steps: SnapSteps,
    /// Always `< snap_steps.count()`.
    pub snap_index: u32,
    pub radius: f32,
    /// Radians per second.
    pub speed: f32,
    pub height: f32,
    pub color: Vec3,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            mode: LightMode::Snap,
            orbit_angle: 0.0,
            animate: true,
            snap_steps: SnapSteps::Eight,
            snap_index: 0,
            radius: 2.0,
            speed: 1.0,
            height: 2.0,
            color: Vec3::ONE,
        }
    }
}

impl LightState {
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LightMode::Orbit => LightMode::Snap,
            LightMode::Snap => LightMode::Orbit,
        };
        log::debug!("Light mode: {:?}", self.mode);
    }

    pub fn toggle_animation(&mut self) {
        self.animate = !self.animate;
    }

    /// Switch the number of snap directions, wrapping the current index into range.
    pub fn set_snap_steps(&mut self, steps: SnapSteps) {
        self.snap_steps = steps;
        self.snap_index %= steps.count();
    }

    /// Step the snap index by one direction (`forward` = +1, otherwise -1), wrapping.
    pub fn step_snap(&mut self, forward: bool) {
        let n = self.snap_steps.count();
        self.snap_index = if forward {
            (self.snap_index + 1) % n
        } else {
            (self.snap_index + n - 1) % n
        };
    }

    pub fn get(&self, param: LightParam) -> f32 {
        match param {
            LightParam::Radius => self.radius,
            LightParam::Speed => self.speed,
            LightParam::Height => self.height,
        }
    }

    /// Add `delta` to a scalar parameter, clamped to its range.
    pub fn adjust(&mut self, param: LightParam, delta: f32) {
        let (lo, hi) = param.range();
        let value = (self.get(param) + delta).clamp(lo, hi);
        match param {
            LightParam::Radius => self.radius = value,
            LightParam::Speed => self.speed = value,
            LightParam::Height => self.height = value,
        }
    }

    /// Advance the orbit by one frame. Only an animated orbit moves.
    pub fn advance(&mut self, dt: f32) {
        if self.mode == LightMode::Orbit && self.animate {
            self.orbit_angle += self.speed * dt;
        }
    }

    /// Current angle around the Y axis for the active mode.
    pub fn angle(&self) -> f32 {
        match self.mode {
            LightMode::Orbit => self.orbit_angle,
            LightMode::Snap => self.snap_index as f32 * (TAU / self.snap_steps.count() as f32),
        }
    }

    /// World-space light position.
    pub fn position(&self) -> Vec3 {
        let (sin, cos) = self.angle().sin_cos();
        Vec3::new(cos * self.radius, self.height, sin * self.radius)
    }
}
