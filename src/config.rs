// Loop rate, serial defaults, watchdog window, runtime settings
use std::time::Duration;

// Receive loop frequency (the sender runs independently at 50Hz)
pub const LOOP_HZ: u64 = 100;

// Fastest loop the receiver will run
pub const MAX_LOOP_HZ: u64 = 1000;
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

// Bytes pulled from the link per tick
pub const BYTES_PER_TICK: usize = 1;

// No valid frame for this long and the link is reported stale
pub const STALE_AFTER: Duration = Duration::from_millis(250);

// Serial link to the handheld controller
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUDRATE: u32 = 115_200;

// Stick magnitude at or below this counts as centered
pub const DEADZONE: f32 = 0.1;

/// Settings for one runtime instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub loop_hz: u64,
    pub bytes_per_tick: usize,
    pub stale_after: Duration,
    /// Zero the motors when the link goes stale. Off by default: the
    /// controller protocol itself has no heartbeat.
    pub stop_on_stale: bool,
}

impl RuntimeConfig {
    /// Loop period, never shorter than 1ms
    pub fn tick_period(&self) -> Duration {
        let period = Duration::from_nanos(1_000_000_000 / self.loop_hz.max(1));
        period.max(MIN_TICK_PERIOD)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loop_hz: LOOP_HZ,
            bytes_per_tick: BYTES_PER_TICK,
            stale_after: STALE_AFTER,
            stop_on_stale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tick_period() {
        let config = RuntimeConfig::default();
        assert_eq!(config.tick_period(), Duration::from_millis(10));
        assert!(!config.stop_on_stale);
    }

    #[test]
    fn test_zero_hz_does_not_divide_by_zero() {
        let config = RuntimeConfig {
            loop_hz: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.tick_period(), Duration::from_millis(1000));
    }

    #[test]
    fn test_fast_rates_keep_a_nonzero_period() {
        for loop_hz in [MAX_LOOP_HZ, 2000, u64::MAX] {
            let config = RuntimeConfig {
                loop_hz,
                ..RuntimeConfig::default()
            };
            assert_eq!(config.tick_period(), Duration::from_millis(1));
        }

        let config = RuntimeConfig {
            loop_hz: 300,
            ..RuntimeConfig::default()
        };
        assert!(config.tick_period() > Duration::from_millis(3));
    }
}
