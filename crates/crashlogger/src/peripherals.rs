//! External collaborators of the recorder.
//!
//! Sensor buses, positioning receivers, buzzers, message transports and the
//! operator display are thin wrappers around third-party protocols. The
//! recorder only sees the narrow traits defined here. Host implementations
//! replay scripted input and report actions through `tracing`.

use std::collections::VecDeque;
use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event_log::CrashEvent;
use crate::orientation::{OrientationLabel, RawAccel};
use crate::position::FixUpdate;
use crate::view::LogView;

/// Width of the operator display in characters.
pub const DISPLAY_COLUMNS: usize = 16;

/// Source of raw accelerometer readings.
pub trait Accelerometer: Send {
    /// Name of the sensor (for logging).
    fn name(&self) -> &'static str;

    /// Read one raw sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor did not deliver a sample this tick.
    fn read(&mut self) -> Result<RawAccel>;
}

/// Source of positioning field updates.
pub trait PositionSource: Send {
    /// Drain the updates received since the last call.
    fn poll(&mut self) -> Vec<FixUpdate>;
}

/// Audible alert.
#[async_trait]
pub trait Actuator: Send {
    /// Sound for `duration`. Completes when the pulse has ended.
    async fn pulse(&mut self, duration: Duration);
}

/// How a notification transport should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    /// Unformatted text.
    Plain,
    /// Markdown markup.
    #[default]
    Markdown,
}

impl std::fmt::Display for FormatHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Markdown => write!(f, "Markdown"),
        }
    }
}

/// Outbound notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport failed. Callers do not retry.
    async fn send(&self, recipient: &str, text: &str, format: FormatHint) -> Result<()>;
}

/// Two-line operator display.
pub trait StatusDisplay: Send {
    /// Replace the display contents.
    fn show(&mut self, lines: &DisplayLines);
}

/// The two lines shown on the operator display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayLines {
    /// Top line.
    pub top: String,
    /// Bottom line.
    pub bottom: String,
}

impl DisplayLines {
    /// Build display lines, truncated to the display width.
    #[must_use]
    pub fn new(top: impl AsRef<str>, bottom: impl AsRef<str>) -> Self {
        Self {
            top: fit(top.as_ref()),
            bottom: fit(bottom.as_ref()),
        }
    }

    /// Boot banner.
    #[must_use]
    pub fn boot() -> Self {
        Self::new("Crash Logger Boot", "")
    }

    /// Idle screen: the first digits of the last known coordinates.
    #[must_use]
    pub fn position(latitude: &str, longitude: &str) -> Self {
        Self::new(
            format!("Lat:{}", prefix(latitude, 6)),
            format!("Lon:{}", prefix(longitude, 6)),
        )
    }

    /// Crash screen.
    #[must_use]
    pub fn crash(label: OrientationLabel) -> Self {
        Self::new("CRASH!", label.as_str())
    }

    /// Retrieval address screen.
    #[must_use]
    pub fn address(addr: &str) -> Self {
        Self::new("IP:", addr)
    }
}

fn prefix(value: &str, chars: usize) -> &str {
    value
        .char_indices()
        .nth(chars)
        .map_or(value, |(end, _)| &value[..end])
}

fn fit(line: &str) -> String {
    prefix(line, DISPLAY_COLUMNS).to_string()
}

/// Compose the alert sent for a crash.
#[must_use]
pub fn alert_text(event: &CrashEvent, view: &LogView) -> String {
    let row = view.event_row(event);
    let mut msg = String::with_capacity(256);
    let _ = writeln!(msg, "🚨 *CRASH DETECTED* 🚨\n");
    let _ = writeln!(msg, "📍 Position: *{}*", row.position);
    let _ = writeln!(msg, "🌐 Latitude: {}", row.fix.latitude);
    let _ = writeln!(msg, "🌐 Longitude: {}", row.fix.longitude);
    let _ = writeln!(msg, "📅 Date: {}", row.fix.date);
    let _ = writeln!(msg, "⏰ Time: {}\n", row.fix.time);
    let _ = writeln!(msg, "🔗 Google Maps:");
    msg.push_str(&row.map_link);
    msg
}

// === Host implementations ===

/// Accelerometer that replays a fixed sequence of readings.
///
/// `None` entries, and every read after the script ends, report a failure.
#[derive(Debug, Default)]
pub struct ScriptedAccelerometer {
    readings: VecDeque<Option<RawAccel>>,
}

impl ScriptedAccelerometer {
    /// Create from a sequence of readings.
    #[must_use]
    pub fn new(readings: impl IntoIterator<Item = Option<RawAccel>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }

    /// Readings not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

impl Accelerometer for ScriptedAccelerometer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn read(&mut self) -> Result<RawAccel> {
        match self.readings.pop_front() {
            Some(Some(raw)) => Ok(raw),
            Some(None) => Err(Error::sensor_read("no data on the bus")),
            None => Err(Error::sensor_read("script exhausted")),
        }
    }
}

/// Positioning source that replays batches of updates, one batch per poll.
#[derive(Debug, Default)]
pub struct ScriptedPositionSource {
    batches: VecDeque<Vec<FixUpdate>>,
}

impl ScriptedPositionSource {
    /// Create from per-tick batches.
    #[must_use]
    pub fn new(batches: impl IntoIterator<Item = Vec<FixUpdate>>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
        }
    }
}

impl PositionSource for ScriptedPositionSource {
    fn poll(&mut self) -> Vec<FixUpdate> {
        self.batches.pop_front().unwrap_or_default()
    }
}

/// Buzzer that logs each pulse.
///
/// With `stall` set the pulse holds the caller for its full duration, as a
/// real buzzer driven by a blocking delay would.
#[derive(Debug, Clone)]
pub struct TracingBuzzer {
    frequency_hz: u32,
    stall: bool,
}

impl TracingBuzzer {
    /// Create a buzzer.
    #[must_use]
    pub fn new(frequency_hz: u32, stall: bool) -> Self {
        Self {
            frequency_hz,
            stall,
        }
    }
}

#[async_trait]
impl Actuator for TracingBuzzer {
    async fn pulse(&mut self, duration: Duration) {
        info!(
            frequency_hz = self.frequency_hz,
            duration_ms = duration.as_millis(),
            "buzzer on"
        );
        if self.stall {
            tokio::time::sleep(duration).await;
        }
        debug!("buzzer off");
    }
}

/// Notifier that logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, recipient: &str, text: &str, format: FormatHint) -> Result<()> {
        info!(recipient, %format, "notification:\n{text}");
        Ok(())
    }
}

/// Display that logs its contents when they change.
#[derive(Debug, Default)]
pub struct TracingDisplay {
    current: DisplayLines,
}

impl TracingDisplay {
    /// What the display currently shows.
    #[must_use]
    pub fn current(&self) -> &DisplayLines {
        &self.current
    }
}

impl StatusDisplay for TracingDisplay {
    fn show(&mut self, lines: &DisplayLines) {
        if &self.current != lines {
            debug!(top = %lines.top, bottom = %lines.bottom, "display");
            self.current = lines.clone();
        }
    }
}
