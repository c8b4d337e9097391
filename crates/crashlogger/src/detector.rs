//! Crash detection state machine.
//!
//! The detector consumes one orientation label per polling tick:
//!
//! ```text
//!            label != Normal, debounce elapsed
//!   ┌───────┐ ─────────────────────────────▶ ┌──────────┐
//!   │ Armed │                                │ Cooldown │
//!   └───────┘ ◀───────────────────────────── └──────────┘
//!            Normal for at least rearm_delay
//! ```
//!
//! Two delays govern it. The debounce window is the minimum spacing between
//! two detections, even if the label flickers back to `Normal` mid-motion.
//! The re-arm delay is how long the label must stay `Normal` before the
//! detector trusts it again. The re-arm delay is the shorter of the two.

use std::time::Duration;

use tracing::{debug, info};

use crate::event_log::{CrashEvent, EventLog};
use crate::orientation::OrientationLabel;
use crate::position::Fix;

/// Default minimum spacing between detections.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(3000);

/// Default settle time before re-arming.
pub const DEFAULT_REARM_DELAY: Duration = Duration::from_millis(500);

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    /// A new crash may be registered.
    #[default]
    Armed,
    /// A crash was registered; detection is suppressed.
    Cooldown,
}

impl std::fmt::Display for DetectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Armed => write!(f, "armed"),
            Self::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// Emitted when the detector registers a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashDetected {
    /// Orientation that triggered the detection.
    pub label: OrientationLabel,
    /// Monotonic time of the detection.
    pub at: Duration,
}

/// Timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Minimum time between two detections.
    pub debounce_window: Duration,
    /// Minimum uninterrupted `Normal` time before re-arming.
    pub rearm_delay: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            rearm_delay: DEFAULT_REARM_DELAY,
        }
    }
}

/// The crash state machine.
///
/// Transitions are total functions of state, label and elapsed time. Time is
/// monotonic and measured from power-up.
#[derive(Debug, Clone, Default)]
pub struct CrashDetector {
    config: DetectorConfig,
    state: DetectorState,
    last_crash_time: Option<Duration>,
    normal_since: Option<Duration>,
}

impl CrashDetector {
    /// Create an armed detector.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Time of the most recent detection.
    #[must_use]
    pub fn last_crash_time(&self) -> Option<Duration> {
        self.last_crash_time
    }

    /// Timing parameters in use.
    #[must_use]
    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// Advance the state machine by one tick.
    pub fn step(&mut self, label: OrientationLabel, now: Duration) -> Option<CrashDetected> {
        match self.state {
            DetectorState::Armed => {
                if label.is_normal() || !self.debounce_elapsed(now) {
                    return None;
                }
                self.state = DetectorState::Cooldown;
                self.last_crash_time = Some(now);
                self.normal_since = None;
                Some(CrashDetected { label, at: now })
            }
            DetectorState::Cooldown => {
                if !label.is_normal() {
                    self.normal_since = None;
                    return None;
                }
                let since = *self.normal_since.get_or_insert(now);
                if now.saturating_sub(since) >= self.config.rearm_delay {
                    debug!(now_ms = now.as_millis(), "orientation settled, re-arming");
                    self.state = DetectorState::Armed;
                    self.normal_since = None;
                }
                None
            }
        }
    }

    /// Advance by one tick and record any detection in `log`.
    ///
    /// The detector is the only writer of the event log. `fix` is copied into
    /// the stored event.
    pub fn observe(
        &mut self,
        label: OrientationLabel,
        now: Duration,
        fix: &Fix,
        log: &mut EventLog,
    ) -> Option<CrashEvent> {
        let detected = self.step(label, now)?;
        let event = log.append(detected.label, *fix);
        info!(
            id = event.id,
            label = %event.label,
            lat = fix.position.map(|p| p.lat),
            lon = fix.position.map(|p| p.lon),
            "crash recorded"
        );
        Some(event)
    }

    fn debounce_elapsed(&self, now: Duration) -> bool {
        self.last_crash_time
            .map_or(true, |last| now.saturating_sub(last) >= self.config.debounce_window)
    }
}
