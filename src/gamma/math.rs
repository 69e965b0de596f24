//! Gamma ramp computation
//!
//! Pure functions converting between a power-law gamma value and the 256-entry,
//! three-channel lookup table that display drivers consume.

/// Number of entries per channel in a hardware gamma ramp
pub const RAMP_SIZE: usize = 256;

/// Lowest gamma value accepted when writing a ramp
pub const MIN_GAMMA: f64 = 0.4;
/// Highest gamma value accepted when writing a ramp
pub const MAX_GAMMA: f64 = 2.8;
/// Neutral gamma (identity ramp)
pub const DEFAULT_GAMMA: f64 = 1.0;

/// Lowest value reported when estimating gamma from a ramp
pub const MIN_DISPLAY_GAMMA: f64 = 0.5;
/// Highest value reported when estimating gamma from a ramp
pub const MAX_DISPLAY_GAMMA: f64 = 2.0;

/// Index of the sample used to invert a ramp
const MIDPOINT_INDEX: usize = 128;

/// Hardware gamma ramp: one 256-entry table of 16-bit levels per color channel
///
/// Layout matches the `WORD[3][256]` buffer expected by `GetDeviceGammaRamp` and
/// `SetDeviceGammaRamp`, so a reference can be handed to the OS directly.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaRamp {
    /// Red channel
    pub red: [u16; RAMP_SIZE],
    /// Green channel
    pub green: [u16; RAMP_SIZE],
    /// Blue channel
    pub blue: [u16; RAMP_SIZE],
}

impl GammaRamp {
    /// Build a ramp with the same table on all three channels
    pub fn uniform(table: [u16; RAMP_SIZE]) -> Self {
        Self {
            red: table,
            green: table,
            blue: table,
        }
    }

    /// The identity ramp (gamma 1.0)
    pub fn identity() -> Self {
        compute_ramp(DEFAULT_GAMMA)
    }
}

impl Default for GammaRamp {
    fn default() -> Self {
        Self::uniform([0; RAMP_SIZE])
    }
}

/// Clamp a gamma value into the writable range
///
/// Non-finite input is treated as the neutral value rather than propagating NaN
/// into a hardware table.
pub fn clamp_gamma(gamma: f64) -> f64 {
    if gamma.is_finite() {
        gamma.clamp(MIN_GAMMA, MAX_GAMMA)
    } else {
        DEFAULT_GAMMA
    }
}

/// Round a gamma value to two decimals
pub fn round_gamma(gamma: f64) -> f64 {
    (gamma * 100.0).round() / 100.0
}

/// Compute the gamma ramp for a gamma value
///
/// The input is silently clamped to [`MIN_GAMMA`, `MAX_GAMMA`]. Entry `i` is
/// `round((i / 255) ^ (1 / gamma) * 65535)`, identical on all three channels.
pub fn compute_ramp(gamma: f64) -> GammaRamp {
    let gamma = clamp_gamma(gamma);
    let exponent = 1.0 / gamma;

    let mut table = [0u16; RAMP_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        #[expect(
            clippy::cast_precision_loss,
            reason = "i is at most 255 and exactly representable as f64"
        )]
        let normalized = i as f64 / 255.0;
        let corrected = normalized.powf(exponent);

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "value is rounded and clamped to the u16 range before the cast"
        )]
        let level = (corrected * 65535.0).round().clamp(0.0, 65535.0) as u16;
        *entry = level;
    }

    GammaRamp::uniform(table)
}

/// Estimate the gamma value a ramp was built from
///
/// Reads only the midpoint sample of the red channel. A clipped midpoint (0 or
/// full scale) cannot be inverted and reports [`DEFAULT_GAMMA`]. The result is
/// clamped to the narrower display range [`MIN_DISPLAY_GAMMA`, `MAX_DISPLAY_GAMMA`]
/// and rounded to two decimals.
pub fn estimate_gamma(ramp: &GammaRamp) -> f64 {
    let midpoint = f64::from(ramp.red[MIDPOINT_INDEX]) / 65535.0;
    if midpoint <= 0.0 || midpoint >= 1.0 {
        return DEFAULT_GAMMA;
    }

    let gamma = 0.5_f64.ln() / midpoint.ln();
    round_gamma(gamma.clamp(MIN_DISPLAY_GAMMA, MAX_DISPLAY_GAMMA))
}
