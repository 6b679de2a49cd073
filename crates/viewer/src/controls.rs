//! Key bindings for the light and post-process parameters.
//!
//! Held keys ramp a parameter at a fixed rate per second; the remaining
//! bindings fire once on the frame the key goes down.

use engine_core::{LightParam, LightState, PostParam, PostProcessParams, SnapSteps};
use input::{InputEdgeState, InputState, KeyCode};

/// Parameter driven by a ramp binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampTarget {
    Post(PostParam),
    Light(LightParam),
}

/// A pair of held keys moving one parameter down or up at `rate` units per second.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    pub decrease: KeyCode,
    pub increase: KeyCode,
    pub target: RampTarget,
    pub rate: f32,
}

const fn ramp(decrease: KeyCode, increase: KeyCode, target: RampTarget, rate: f32) -> Ramp {
    Ramp {
        decrease,
        increase,
        target,
        rate,
    }
}

pub const RAMPS: [Ramp; 11] = [
    ramp(KeyCode::BracketLeft, KeyCode::BracketRight, RampTarget::Post(PostParam::Brightness), 0.8),
    ramp(KeyCode::Semicolon, KeyCode::Quote, RampTarget::Post(PostParam::Contrast), 1.5),
    ramp(KeyCode::KeyO, KeyCode::KeyP, RampTarget::Post(PostParam::Exposure), 1.5),
    ramp(KeyCode::Comma, KeyCode::Period, RampTarget::Post(PostParam::Saturation), 1.5),
    ramp(KeyCode::KeyV, KeyCode::KeyB, RampTarget::Post(PostParam::Vignette), 1.0),
    ramp(KeyCode::KeyG, KeyCode::KeyH, RampTarget::Post(PostParam::VignetteSoftness), 0.8),
    ramp(KeyCode::KeyX, KeyCode::KeyC, RampTarget::Post(PostParam::BloomThreshold), 1.0),
    ramp(KeyCode::KeyR, KeyCode::KeyF, RampTarget::Post(PostParam::BloomStrength), 1.0),
    ramp(KeyCode::KeyJ, KeyCode::KeyK, RampTarget::Light(LightParam::Radius), 1.5),
    ramp(KeyCode::KeyU, KeyCode::KeyI, RampTarget::Light(LightParam::Speed), 2.0),
    ramp(KeyCode::KeyN, KeyCode::KeyM, RampTarget::Light(LightParam::Height), 2.0),
];

/// One-shot actions bound to a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Bloom,
    LightAnimation,
    LightMode,
    SnapSteps(SnapSteps),
    SnapStep { forward: bool },
    DebugReadout,
    Capture,
    Screenshot,
}

pub const TOGGLES: [(KeyCode, Toggle); 10] = [
    (KeyCode::KeyZ, Toggle::Bloom),
    (KeyCode::KeyL, Toggle::LightAnimation),
    (KeyCode::KeyT, Toggle::LightMode),
    (KeyCode::Digit4, Toggle::SnapSteps(SnapSteps::Four)),
    (KeyCode::Digit8, Toggle::SnapSteps(SnapSteps::Eight)),
    (KeyCode::ArrowLeft, Toggle::SnapStep { forward: false }),
    (KeyCode::ArrowRight, Toggle::SnapStep { forward: true }),
    (KeyCode::KeyQ, Toggle::DebugReadout),
    (KeyCode::AltLeft, Toggle::Capture),
    (KeyCode::F12, Toggle::Screenshot),
];

/// Requests that need state outside the parameter blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlActions {
    pub toggle_debug: bool,
    pub toggle_capture: bool,
    pub screenshot: bool,
}

fn adjust(target: RampTarget, delta: f32, params: &mut PostProcessParams, light: &mut LightState) {
    match target {
        RampTarget::Post(param) => params.adjust(param, delta),
        RampTarget::Light(param) => light.adjust(param, delta),
    }
}

/// Apply this frame's held and newly pressed keys. The decrease key of a
/// pair is applied before the increase key, each step clamped.
pub fn apply_controls(
    input: &InputState,
    edges: &mut InputEdgeState,
    dt: f32,
    params: &mut PostProcessParams,
    light: &mut LightState,
) -> ControlActions {
    for ramp in &RAMPS {
        let step = ramp.rate * dt;
        if input.is_key_held(ramp.decrease) {
            adjust(ramp.target, -step, params, light);
        }
        if input.is_key_held(ramp.increase) {
            adjust(ramp.target, step, params, light);
        }
    }

    let mut actions = ControlActions::default();
    for (key, toggle) in TOGGLES {
        // Every key is polled each frame so its previous level stays current.
        if !edges.just_pressed(input, key) {
            continue;
        }
        match toggle {
            Toggle::Bloom => params.toggle_bloom(),
            Toggle::LightAnimation => light.toggle_animation(),
            Toggle::LightMode => light.toggle_mode(),
            Toggle::SnapSteps(steps) => light.set_snap_steps(steps),
            Toggle::SnapStep { forward } => light.step_snap(forward),
            Toggle::DebugReadout => actions.toggle_debug = true,
            Toggle::Capture => actions.toggle_capture = true,
            Toggle::Screenshot => actions.screenshot = true,
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::LightMode;
    use input::ElementState;

    fn press(input: &mut InputState, key: KeyCode) {
        input.process_keyboard(key, ElementState::Pressed);
    }

    fn release(input: &mut InputState, key: KeyCode) {
        input.process_keyboard(key, ElementState::Released);
    }

    fn run_frames(input: &InputState, frames: usize, dt: f32) -> (PostProcessParams, LightState) {
        let mut edges = InputEdgeState::new();
        let mut params = PostProcessParams::default();
        let mut light = LightState::default();
        for _ in 0..frames {
            apply_controls(input, &mut edges, dt, &mut params, &mut light);
        }
        (params, light)
    }

    #[test]
    fn no_key_is_bound_twice() {
        let mut keys: Vec<KeyCode> = RAMPS.iter().flat_map(|r| [r.decrease, r.increase]).collect();
        keys.extend(TOGGLES.iter().map(|(k, _)| *k));
        let count = keys.len();
        keys.sort_by_key(|k| format!("{k:?}"));
        keys.dedup();
        assert_eq!(keys.len(), count);
    }

    #[test]
    fn held_key_ramps_at_rate() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyP);
        let (params, _) = run_frames(&input, 10, 0.1);
        assert!((params.exposure - 1.5).abs() < 1e-4);
    }

    /// Holding every decrease key for a long time pins each parameter at its lower bound.
    #[test]
    fn decrease_keys_stop_at_lower_bounds() {
        let mut input = InputState::new();
        for ramp in &RAMPS {
            press(&mut input, ramp.decrease);
        }
        let (params, light) = run_frames(&input, 600, 0.05);
        assert_eq!(params.contrast, 0.0);
        assert_eq!(params.saturation, 0.0);
        assert_eq!(params.vignette, 0.0);
        assert_eq!(params.vignette_softness, 0.05);
        assert_eq!(params.bloom_threshold, 0.0);
        assert_eq!(params.bloom_strength, 0.0);
        assert_eq!(light.radius, 0.2);
        assert_eq!(light.speed, 0.0);
        // Unbounded parameters keep going.
        assert!(params.brightness < -20.0);
        assert!(params.exposure < -40.0);
        assert!(light.height < -50.0);
    }

    #[test]
    fn increase_keys_stop_at_upper_bounds() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyB);
        press(&mut input, KeyCode::KeyH);
        let (params, _) = run_frames(&input, 600, 0.05);
        assert_eq!(params.vignette, 1.0);
        assert_eq!(params.vignette_softness, 0.9);
    }

    #[test]
    fn opposing_keys_cancel_away_from_bounds() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyJ);
        press(&mut input, KeyCode::KeyK);
        let (_, light) = run_frames(&input, 30, 0.016);
        assert!((light.radius - LightState::default().radius).abs() < 1e-4);
    }

    /// At a lower bound the decrease clamps first, so the increase still lands once.
    #[test]
    fn opposing_keys_at_bound_settle_one_step_up() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyV);
        press(&mut input, KeyCode::KeyB);
        let (params, _) = run_frames(&input, 10, 0.1);
        assert!((params.vignette - 0.1).abs() < 1e-4);
    }

    #[test]
    fn held_toggle_fires_once() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyZ);
        let (params, _) = run_frames(&input, 20, 0.016);
        assert!(!params.bloom_enabled);
    }

    #[test]
    fn toggle_fires_again_after_release() {
        let mut input = InputState::new();
        let mut edges = InputEdgeState::new();
        let mut params = PostProcessParams::default();
        let mut light = LightState::default();

        press(&mut input, KeyCode::KeyT);
        apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        assert_eq!(light.mode, LightMode::Orbit);

        release(&mut input, KeyCode::KeyT);
        apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        press(&mut input, KeyCode::KeyT);
        apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        assert_eq!(light.mode, LightMode::Snap);
    }

    #[test]
    fn arrows_step_snap_index_once_per_press() {
        let mut input = InputState::new();
        let mut edges = InputEdgeState::new();
        let mut params = PostProcessParams::default();
        let mut light = LightState::default();

        press(&mut input, KeyCode::ArrowLeft);
        for _ in 0..5 {
            apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        }
        assert_eq!(light.snap_index, 7);

        release(&mut input, KeyCode::ArrowLeft);
        press(&mut input, KeyCode::Digit4);
        apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        assert_eq!(light.snap_steps, SnapSteps::Four);
        assert_eq!(light.snap_index, 3);
    }

    #[test]
    fn app_level_keys_surface_as_actions() {
        let mut input = InputState::new();
        let mut edges = InputEdgeState::new();
        let mut params = PostProcessParams::default();
        let mut light = LightState::default();

        press(&mut input, KeyCode::KeyQ);
        press(&mut input, KeyCode::AltLeft);
        press(&mut input, KeyCode::F12);
        let first = apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        assert_eq!(
            first,
            ControlActions {
                toggle_debug: true,
                toggle_capture: true,
                screenshot: true,
            }
        );
        let held = apply_controls(&input, &mut edges, 0.016, &mut params, &mut light);
        assert_eq!(held, ControlActions::default());
    }
}
