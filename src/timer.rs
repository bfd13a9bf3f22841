//! Monotonic timer with an application-settable epoch.

use std::time::Instant;

use crate::error::{Error, ErrorKind, Result};

/// Upper bound accepted by [`Timer::set`]; roughly 584 years, the same
/// range a 64-bit nanosecond counter covers.
const MAX_TIME: f64 = 18_446_744_073.0;

#[derive(Debug)]
pub(crate) struct Timer {
    base: Instant,
    offset: f64,
}

impl Timer {
    pub fn new() -> Self {
        Self { base: Instant::now(), offset: 0.0 }
    }

    /// Seconds elapsed since initialization or the last [`Timer::set`].
    pub fn get(&self) -> f64 {
        self.offset + self.base.elapsed().as_secs_f64()
    }

    pub fn set(&mut self, time: f64) -> Result<()> {
        if !time.is_finite() || time < 0.0 || time > MAX_TIME {
            return Err(Error::new(
                ErrorKind::InvalidValue,
                format!("invalid time {time}"),
            ));
        }
        self.base = Instant::now();
        self.offset = time;
        Ok(())
    }
}
