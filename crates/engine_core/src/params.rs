//! Post-process parameters: mutated by input handling at the start of a frame,
//! read once per frame by the composite pass.

/// Colour-grading and bloom settings for the composite pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessParams {
    /// Added to every channel after exposure. 0 = no change.
    pub brightness: f32,
    /// Scale around mid-grey 0.5. 1 = no change.
    pub contrast: f32,
    /// Photographic stops: +1 doubles, -1 halves. 0 = no change.
    pub exposure: f32,
    /// 0 = greyscale, 1 = unchanged, >1 = oversaturated.
    pub saturation: f32,
    /// Vignette darkening strength, 0 = off.
    pub vignette: f32,
    /// Width of the vignette falloff band measured inward from the corner distance.
    pub vignette_softness: f32,
    pub bloom_enabled: bool,
    /// Luma cutoff for the bright pass.
    pub bloom_threshold: f32,
    /// Multiplier applied to the blurred bloom before it is added.
    pub bloom_strength: f32,
}

impl Default for PostProcessParams {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            exposure: 0.0,
            saturation: 1.0,
            vignette: 0.0,
            vignette_softness: 0.35,
            bloom_enabled: true,
            bloom_threshold: 1.0,
            bloom_strength: 0.8,
        }
    }
}

/// A continuously adjustable post-process parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostParam {
    Brightness,
    Contrast,
    Exposure,
    Saturation,
    Vignette,
    VignetteSoftness,
    BloomThreshold,
    BloomStrength,
}

impl PostParam {
    pub const ALL: [PostParam; 8] = [
        PostParam::Brightness,
        PostParam::Contrast,
        PostParam::Exposure,
        PostParam::Saturation,
        PostParam::Vignette,
        PostParam::VignetteSoftness,
        PostParam::BloomThreshold,
        PostParam::BloomStrength,
    ];

    /// Inclusive valid range. Unbounded sides use infinities.
    pub fn range(self) -> (f32, f32) {
        match self {
            PostParam::Brightness | PostParam::Exposure => (f32::NEG_INFINITY, f32::INFINITY),
            PostParam::Contrast
            | PostParam::Saturation
            | PostParam::BloomThreshold
            | PostParam::BloomStrength => (0.0, f32::INFINITY),
            PostParam::Vignette => (0.0, 1.0),
            PostParam::VignetteSoftness => (0.05, 0.9),
        }
    }
}

impl PostProcessParams {
    /// Settings under which the composite pass leaves the scene colour untouched.
    pub fn neutral() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            exposure: 0.0,
            saturation: 1.0,
            vignette: 0.0,
            bloom_enabled: false,
            ..Default::default()
        }
    }

    pub fn get(&self, param: PostParam) -> f32 {
        match param {
            PostParam::Brightness => self.brightness,
            PostParam::Contrast => self.contrast,
            PostParam::Exposure => self.exposure,
            PostParam::Saturation => self.saturation,
            PostParam::Vignette => self.vignette,
            PostParam::VignetteSoftness => self.vignette_softness,
            PostParam::BloomThreshold => self.bloom_threshold,
            PostParam::BloomStrength => self.bloom_strength,
        }
    }

    fn slot(&mut self, param: PostParam) -> &mut f32 {
        match param {
            PostParam::Brightness => &mut self.brightness,
            PostParam::Contrast => &mut self.contrast,
            PostParam::Exposure => &mut self.exposure,
            PostParam::Saturation => &mut self.saturation,
            PostParam::Vignette => &mut self.vignette,
            PostParam::VignetteSoftness => &mut self.vignette_softness,
            PostParam::BloomThreshold => &mut self.bloom_threshold,
            PostParam::BloomStrength => &mut self.bloom_strength,
        }
    }

    /// Set a parameter, clamped to its range.
    pub fn set(&mut self, param: PostParam, value: f32) {
        let (lo, hi) = param.range();
        *self.slot(param) = value.clamp(lo, hi);
    }

    /// Add `delta` to a parameter, clamped to its range.
    pub fn adjust(&mut self, param: PostParam, delta: f32) {
        let value = self.get(param) + delta;
        self.set(param, value);
    }

    pub fn toggle_bloom(&mut self) {
        self.bloom_enabled = !self.bloom_enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_inside_ranges() {
        let params = PostProcessParams::default();
        for param in PostParam::ALL {
            let (lo, hi) = param.range();
            let v = params.get(param);
            assert!(v >= lo && v <= hi, "{param:?} default {v} outside [{lo}, {hi}]");
        }
    }

    /// Ramping far past either end for many frames never escapes the range.
    #[test]
    fn ramped_parameters_stay_clamped() {
        let dt = 1.0 / 60.0;
        for param in PostParam::ALL {
            let (lo, hi) = param.range();
            let mut params = PostProcessParams::default();
            for _ in 0..10_000 {
                params.adjust(param, -5.0 * dt);
                let v = params.get(param);
                assert!(v >= lo && v <= hi, "{param:?} = {v} escaped below");
            }
            for _ in 0..10_000 {
                params.adjust(param, 5.0 * dt);
                let v = params.get(param);
                assert!(v >= lo && v <= hi, "{param:?} = {v} escaped above");
            }
        }
    }

    #[test]
    fn vignette_softness_pins_to_bounds() {
        let mut params = PostProcessParams::default();
        for _ in 0..1000 {
            params.adjust(PostParam::VignetteSoftness, -0.8 / 30.0);
        }
        assert_eq!(params.vignette_softness, 0.05);
        for _ in 0..1000 {
            params.adjust(PostParam::VignetteSoftness, 0.8 / 30.0);
        }
        assert_eq!(params.vignette_softness, 0.9);
    }

    #[test]
    fn brightness_and_exposure_are_unbounded() {
        let mut params = PostProcessParams::default();
        params.adjust(PostParam::Brightness, -12.0);
        params.adjust(PostParam::Exposure, 40.0);
        assert_eq!(params.brightness, -12.0);
        assert_eq!(params.exposure, 40.0);
    }

    #[test]
    fn neutral_disables_bloom_and_grading() {
        let n = PostProcessParams::neutral();
        assert!(!n.bloom_enabled);
        assert_eq!((n.brightness, n.contrast, n.exposure, n.saturation, n.vignette), (0.0, 1.0, 0.0, 1.0, 0.0));
    }
}
