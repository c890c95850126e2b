//! # Volume Taper
//!
//! Maps the raw volume knob position onto the output level sent to the player.
//!
//! A linear potentiometer feels wrong on a radio: most of the travel is either
//! too quiet to hear or too loud to tolerate. The curve below splits the knob
//! into three regions:
//!
//! - **[90, 100]**: passed through linearly for fine control near full scale
//! - **[~30, 90)**: compressed with a `x^0.15` taper so the usable range spans
//!   most of the knob travel
//! - **[0, ~30)**: hard mute, which keeps amplifier hiss and crackle away at
//!   near-zero settings
//!
//! The exponent and both thresholds are fixed properties of the console.

/// Linear pass-through starts at this percentage.
pub const LINEAR_THRESHOLD: f64 = 90.0;

/// Taper exponent applied below [`LINEAR_THRESHOLD`].
pub const TAPER_EXPONENT: f64 = 0.15;

/// Tapered output below this level is forced to silence.
pub const MUTE_THRESHOLD: f64 = 30.0;

/// Convert a normalized knob reading (0.0 to 1.0) to an output level (0 to 100).
///
/// Out-of-range readings are clamped first, so a noisy ADC can never produce
/// a NaN or a level above 100.
///
/// # Example
/// ```
/// use ghost_radio_lib::volume::compute_volume;
///
/// assert_eq!(compute_volume(1.0), 100.0);
/// assert_eq!(compute_volume(0.0), 0.0);
/// assert!(compute_volume(0.5) > 80.0);
/// ```
pub fn compute_volume(raw: f64) -> f64 {
    let linear = raw.clamp(0.0, 1.0) * 100.0;

    if linear >= LINEAR_THRESHOLD {
        return linear;
    }

    // 0.0.powf(0.15) is 0.0, so a closed knob lands in the mute region
    let scaled = (linear / LINEAR_THRESHOLD).powf(TAPER_EXPONENT) * LINEAR_THRESHOLD;
    if scaled < MUTE_THRESHOLD {
        0.0
    } else {
        scaled
    }
}

/// Convert an output level to the integer percentage the player accepts.
///
/// Truncates toward zero, the same way the level was always handed to the
/// media engine.
pub fn to_percent(level: f64) -> u8 {
    if level.is_nan() {
        return 0;
    }
    level.clamp(0.0, 100.0) as u8
}
