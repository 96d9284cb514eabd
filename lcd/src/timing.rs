//! Blocking waits used by the LCD protocol.
//!
//! The engine waits through [embedded_hal::delay::DelayNs], so any HAL delay works;
//! [ThreadDelay] is the one to use on a regular OS.
use embedded_hal::delay::DelayNs;
use std::thread::sleep;
use std::time::Duration;

/// Delay backed by [std::thread::sleep].
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }
}

/// Timing of the bus protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timing {
    /// How long the enable line is held high for the LCD to latch a nibble.
    /// The HD44780 needs at least 450 ns.
    pub enable_pulse: Duration,
    /// Wait after the enable line goes low, covering the execution time of regular commands.
    pub settle: Duration,
    /// Execution time of the clear and return home commands.
    pub long_command: Duration,
    /// Wait before the first command, for the supply to settle.
    pub power_on: Duration,
    /// Wait after each nibble of the soft reset.
    pub reset: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            enable_pulse: Duration::from_micros(1),
            settle: Duration::from_micros(100),
            long_command: Duration::from_millis(3),
            power_on: Duration::from_millis(50),
            reset: Duration::from_millis(5),
        }
    }
}

/// Waits for `duration` with nanosecond resolution.
pub(crate) fn wait(delay: &mut impl DelayNs, duration: Duration) {
    let ns = duration.as_nanos();
    if ns <= u32::MAX as u128 {
        delay.delay_ns(ns as u32);
    } else {
        delay.delay_ms(duration.as_millis().min(u32::MAX as u128) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn default_timing_is_within_hardware_limits() {
        let timing = Timing::default();
        assert!(timing.enable_pulse >= Duration::from_nanos(500));
        assert!(timing.settle >= Duration::from_nanos(100));
        assert!(timing.long_command >= Duration::from_micros(1520));
    }

    #[test]
    fn thread_delay_waits() {
        let start = Instant::now();
        wait(&mut ThreadDelay, Duration::from_millis(2));
        assert!(start.elapsed() >= Duration::from_millis(2));
    }
}
