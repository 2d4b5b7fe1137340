// 100 Hz receive loop with link health
// Note: the controller protocol carries no heartbeat, so a dead link leaves the
// last mixed duties applied. Health is reported either way; zeroing the motors
// on a stale link only happens when `stop_on_stale` is set.

use std::future::Future;
use std::time::Instant;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::dispatcher::dispatch;
use crate::link::{ByteSource, LinkError, SerialLink};
use crate::messages::LinkHealth;
use crate::motor::{MotorError, MotorGuard, MotorOutput, SimulatedMotors};
use crate::protocol::FrameDecoder;
use crate::state::ControllerState;

/// Error types that end the runtime
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Motor(#[from] MotorError),
}

/// Frame counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames that decoded to a packet
    pub accepted: u64,
    /// Frames with bad length, delimiters or checksum
    pub corrupted: u64,
    /// Intact frames with an unknown type or out-of-range id
    pub rejected: u64,
    /// Byte runs discarded for never reaching STOP
    pub overflows: u64,
    /// Failed reads from the link
    pub read_errors: u64,
}

pub struct Runtime<S: ByteSource, M: MotorOutput> {
    config: RuntimeConfig,
    link: S,
    decoder: FrameDecoder,
    state: ControllerState,
    motors: MotorGuard<M>,
    health: LinkHealth,
    last_frame_at: Option<Instant>,
    started_at: Instant,
    stats: LinkStats,
    read_failing: bool,
}

impl<S: ByteSource, M: MotorOutput> Runtime<S, M> {
    /// Take over the motors (zeroing them) and start with an empty state
    pub fn new(config: RuntimeConfig, link: S, motors: M) -> Result<Self, MotorError> {
        Ok(Self {
            config,
            link,
            decoder: FrameDecoder::new(),
            state: ControllerState::new(),
            motors: MotorGuard::acquire(motors)?,
            health: LinkHealth::Stale, // Start stale until first frame
            last_frame_at: None,
            started_at: Instant::now(),
            stats: LinkStats::default(),
            read_failing: false,
        })
    }

    /// Feed one byte through decoder and dispatcher
    pub fn on_byte(&mut self, byte: u8) {
        let Some(result) = self.decoder.feed(byte) else {
            self.stats.overflows = self.decoder.overflows();
            return;
        };

        match result {
            Ok(packet) => {
                self.stats.accepted += 1;
                self.last_frame_at = Some(Instant::now());
                if self.health != LinkHealth::Ok {
                    info!("Controller link up");
                    self.health = LinkHealth::Ok;
                }
                dispatch(packet, &mut self.state, &mut self.motors);
            }
            Err(e) => {
                if e.is_corruption() {
                    self.stats.corrupted += 1;
                } else {
                    self.stats.rejected += 1;
                }
                debug!("Dropped frame: {}", e);
            }
        }
    }

    /// One loop iteration: drain up to `bytes_per_tick` bytes, then check health
    pub fn poll(&mut self) {
        for _ in 0..self.config.bytes_per_tick {
            match self.link.poll_byte() {
                Ok(Some(byte)) => {
                    self.read_recovered();
                    self.on_byte(byte);
                }
                Ok(None) => {
                    self.read_recovered();
                    break;
                }
                Err(e) => {
                    self.stats.read_errors += 1;
                    // An unplugged port fails every tick; warn on the first one only
                    if self.read_failing {
                        debug!("Link read failed: {}", e);
                    } else {
                        warn!("Link read failed: {}", e);
                        self.read_failing = true;
                    }
                    break;
                }
            }
        }

        self.check_health(Instant::now());
    }

    fn read_recovered(&mut self) {
        if self.read_failing {
            info!(
                "Link reads recovered after {} failure(s)",
                self.stats.read_errors
            );
            self.read_failing = false;
        }
    }

    /// Mark the link stale once no frame has arrived for `stale_after`
    pub fn check_health(&mut self, now: Instant) {
        let since = self.last_frame_at.unwrap_or(self.started_at);
        let age = now.saturating_duration_since(since);

        if age <= self.config.stale_after || self.health == LinkHealth::Stale {
            return;
        }

        warn!("No valid frame for {:?}, controller link stale", age);
        self.health = LinkHealth::Stale;
        if self.config.stop_on_stale {
            info!("Stopping motors on stale link");
            if let Err(e) = self.motors.stop() {
                warn!("Failed to stop motors: {}", e);
            }
        }
    }

    pub fn health(&self) -> LinkHealth {
        self.health
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn motors(&mut self) -> &mut M {
        self.motors.get_mut()
    }

    /// Zero the motors and hand back the output
    pub fn shutdown(self) -> Result<M, MotorError> {
        info!("Runtime stopped: {:?}", self.stats);
        self.motors.release()
    }

    /// Poll at `loop_hz` until `shutdown` resolves, then stop the motors
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<M, MotorError>
    where
        F: Future<Output = ()>,
    {
        let mut tick = interval(self.config.tick_period());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Runtime started: {}Hz loop, {} byte(s) per tick, {}ms stale window",
            self.config.loop_hz,
            self.config.bytes_per_tick,
            self.config.stale_after.as_millis()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tick.tick() => self.poll(),
            }
        }

        self.shutdown()
    }
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Receive from the serial controller link until Ctrl+C.
///
/// Duties go to the simulation sink, which logs them; boards with PWM
/// channels build a `Runtime` around `PwmMotors` instead.
pub async fn run(config: RuntimeConfig, port: &str, baudrate: u32) -> Result<(), RuntimeError> {
    let link = SerialLink::open(port, baudrate)?;
    let runtime = Runtime::new(config, link, SimulatedMotors::new())?;
    runtime.run_until(ctrl_c()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MemoryLink;
    use crate::messages::{AxisId, MotorCommand};
    use crate::motor::RecordingMotors;
    use crate::protocol::{encode_axis, encode_emergency_stop};
    use std::time::Duration;

    fn runtime(bytes: &[u8], config: RuntimeConfig) -> Runtime<MemoryLink, RecordingMotors> {
        Runtime::new(config, MemoryLink::from(bytes), RecordingMotors::new()).unwrap()
    }

    #[test]
    fn test_one_byte_per_tick() {
        let frame = encode_emergency_stop();
        let mut rt = runtime(&frame, RuntimeConfig::default());

        for _ in 0..frame.len() - 1 {
            rt.poll();
        }
        assert_eq!(rt.stats().accepted, 0);

        rt.poll();
        assert_eq!(rt.stats().accepted, 1);
        assert_eq!(rt.health(), LinkHealth::Ok);
    }

    #[test]
    fn test_counts_drops() {
        let mut bytes = vec![0xAA, 0x00, 0x01, 0x40, 0x00, 0x00, 0x55]; // bad checksum
        bytes.extend_from_slice(&[0xAA, 0x09, 0xA3, 0x55]); // type 0x09, too short
        bytes.extend_from_slice(&[0xAA, 0x09, 0x00, 0xA3, 0x55]); // unknown type
        bytes.push(0xAA);
        bytes.extend_from_slice(&[0x11; 20]); // overflow

        let config = RuntimeConfig {
            bytes_per_tick: 64,
            ..RuntimeConfig::default()
        };
        let mut rt = runtime(&bytes, config);
        rt.poll();

        let stats = rt.stats();
        assert_eq!(stats.accepted, 0);
        assert_eq!(stats.corrupted, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.overflows, 1);
        // Acquire zeroed the motors; nothing else reached them
        assert_eq!(rt.motors().commands, vec![MotorCommand::STOP]);
    }

    #[test]
    fn test_stale_link_keeps_duties_by_default() {
        let mut bytes = encode_axis(AxisId::LeftTrigger, 1.0).to_vec();
        bytes.extend_from_slice(&encode_axis(AxisId::LeftY, 1.0));
        let config = RuntimeConfig {
            bytes_per_tick: 64,
            ..RuntimeConfig::default()
        };
        let mut rt = runtime(&bytes, config);
        rt.poll();
        let driving = rt.motors().last();

        rt.check_health(Instant::now() + Duration::from_secs(1));
        assert_eq!(rt.health(), LinkHealth::Stale);
        assert_eq!(rt.motors().last(), driving);
    }

    #[test]
    fn test_stale_link_stops_when_enabled() {
        let bytes = encode_axis(AxisId::LeftY, 1.0);
        let config = RuntimeConfig {
            bytes_per_tick: 64,
            stop_on_stale: true,
            ..RuntimeConfig::default()
        };
        let mut rt = runtime(&bytes, config);
        rt.poll();
        assert_ne!(rt.motors().last(), Some(MotorCommand::STOP));

        rt.check_health(Instant::now() + Duration::from_secs(1));
        assert_eq!(rt.motors().last(), Some(MotorCommand::STOP));

        // Only the transition stops; a second check adds nothing
        let sent = rt.motors().commands.len();
        rt.check_health(Instant::now() + Duration::from_secs(2));
        assert_eq!(rt.motors().commands.len(), sent);
    }

    /// Fails a fixed number of reads, then serves its bytes
    struct FlakyLink {
        failures: usize,
        bytes: MemoryLink,
    }

    impl ByteSource for FlakyLink {
        fn poll_byte(&mut self) -> crate::link::Result<Option<u8>> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(LinkError::Io(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )));
            }
            self.bytes.poll_byte()
        }
    }

    #[test]
    fn test_repeated_read_failures_flag_once_and_recover() {
        let link = FlakyLink {
            failures: 3,
            bytes: MemoryLink::from(&encode_emergency_stop()[..]),
        };
        let config = RuntimeConfig {
            bytes_per_tick: 64,
            ..RuntimeConfig::default()
        };
        let mut rt = Runtime::new(config, link, RecordingMotors::new()).unwrap();

        rt.poll();
        assert!(rt.read_failing);
        rt.poll();
        rt.poll();
        assert!(rt.read_failing);
        assert_eq!(rt.stats().read_errors, 3);

        // Next poll reads again and clears the failure state
        rt.poll();
        assert!(!rt.read_failing);
        assert_eq!(rt.stats().accepted, 1);
    }

    #[test]
    fn test_shutdown_zeroes_motors() {
        let bytes = encode_axis(AxisId::LeftX, -1.0);
        let config = RuntimeConfig {
            bytes_per_tick: 64,
            ..RuntimeConfig::default()
        };
        let mut rt = runtime(&bytes, config);
        rt.poll();

        let motors = rt.shutdown().unwrap();
        assert_eq!(motors.last(), Some(MotorCommand::STOP));
    }
}
