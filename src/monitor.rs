//! Monitors, video modes, and gamma.
//!
//! Monitor handles are generational arena keys: disconnecting a monitor
//! removes its slot, so a stored handle from before the disconnect is
//! detected and rejected instead of dangling.

use crate::error::{Error, ErrorKind, Result};

slotmap::new_key_type! {
    /// Handle to a connected monitor. Weak by construction; it never owns
    /// the monitor and goes stale when the monitor disconnects.
    pub struct MonitorId;
}

/// An immutable video mode snapshot.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VideoMode {
    pub width: u32,
    pub height: u32,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    /// In Hz.
    pub refresh_rate: u32,
}

/// Size of the per-channel gamma lookup tables on every shipped backend.
pub const GAMMA_RAMP_SIZE: usize = 256;

/// A hardware gamma lookup table, one entry set per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GammaRamp {
    pub red: Vec<u16>,
    pub green: Vec<u16>,
    pub blue: Vec<u16>,
}

impl GammaRamp {
    /// Builds the ramp equivalent to applying `pow(x, 1/gamma)`, the helper
    /// behind the exponent-based gamma setter.
    pub fn from_exponent(gamma: f32) -> Result<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(Error::new(
                ErrorKind::InvalidValue,
                format!("invalid gamma exponent {gamma}"),
            ));
        }

        let mut red = Vec::with_capacity(GAMMA_RAMP_SIZE);
        for i in 0..GAMMA_RAMP_SIZE {
            let value = (i as f32 / (GAMMA_RAMP_SIZE - 1) as f32).powf(1.0 / gamma);
            let value = (value * 65535.0 + 0.5).min(65535.0);
            red.push(value as u16);
        }

        Ok(Self { green: red.clone(), blue: red.clone(), red })
    }

    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.red.len() != self.green.len() || self.red.len() != self.blue.len() {
            return Err(Error::new(
                ErrorKind::InvalidValue,
                "gamma ramp channels differ in length",
            ));
        }
        if self.red.len() != GAMMA_RAMP_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidValue,
                format!(
                    "gamma ramp size {} is not supported, expected {GAMMA_RAMP_SIZE}",
                    self.red.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Everything a platform backend reports about one display.
#[derive(Clone, Debug)]
pub(crate) struct MonitorDesc {
    /// Backend-stable identifier, used to correlate hot-plug events.
    pub native_id: u32,
    pub name: String,
    pub position: (i32, i32),
    /// Physical size in millimetres.
    pub physical_size: (u32, u32),
    pub modes: Vec<VideoMode>,
    /// Index into `modes`.
    pub current_mode: usize,
}

#[derive(Debug)]
pub(crate) struct Monitor {
    pub native_id: u32,
    pub name: String,
    pub position: (i32, i32),
    pub physical_size: (u32, u32),
    pub modes: Vec<VideoMode>,
    pub current_mode: usize,
    pub gamma_ramp: GammaRamp,
}

impl Monitor {
    pub fn new(desc: MonitorDesc) -> Self {
        // Identity ramp until the application installs one.
        let identity: Vec<u16> = (0..GAMMA_RAMP_SIZE)
            .map(|i| (i * 65535 / (GAMMA_RAMP_SIZE - 1)) as u16)
            .collect();
        Self {
            native_id: desc.native_id,
            name: desc.name,
            position: desc.position,
            physical_size: desc.physical_size,
            modes: desc.modes,
            current_mode: desc.current_mode,
            gamma_ramp: GammaRamp {
                red: identity.clone(),
                green: identity.clone(),
                blue: identity,
            },
        }
    }
}

/// Picks the mode closest to the request, matched in three tiers: color
/// depth difference, then area difference, then refresh rate difference.
/// An unspecified refresh rate prefers the fastest candidate.
pub(crate) fn closest_video_mode(
    modes: &[VideoMode],
    width: u32,
    height: u32,
    refresh_rate: Option<u32>,
) -> Option<usize> {
    let mut best: Option<(usize, (u32, u64, u32))> = None;

    for (index, mode) in modes.iter().enumerate() {
        let color_diff = {
            let diff = i32::from(mode.red_bits) + i32::from(mode.green_bits)
                + i32::from(mode.blue_bits)
                - 24;
            diff.unsigned_abs()
        };

        let dw = i64::from(mode.width) - i64::from(width);
        let dh = i64::from(mode.height) - i64::from(height);
        let size_diff = (dw * dw + dh * dh) as u64;

        let rate_diff = match refresh_rate {
            Some(rate) => mode.refresh_rate.abs_diff(rate),
            None => u32::MAX - mode.refresh_rate,
        };

        let score = (color_diff, size_diff, rate_diff);
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
}
