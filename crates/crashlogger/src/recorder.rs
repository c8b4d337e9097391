//! The polling loop.
//!
//! Each tick runs the components in a fixed order:
//!
//! 1. apply positioning updates to the [`PositionTracker`]
//! 2. read the accelerometer and classify the sample
//! 3. step the [`CrashDetector`], which appends to the [`EventLog`]
//! 4. on a crash: show it, pulse the buzzer, send a notification
//!
//! Everything runs on one task. The buzzer pulse stalls the loop for its
//! full length; the detector has already committed its transition by then.
//! Notification is bounded by a timeout and its outcome is only logged, so a
//! lost alert never loses the recorded event.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::detector::CrashDetector;
use crate::error::{Error, Result};
use crate::event_log::{CrashEvent, EventLog};
use crate::orientation::{AccelSample, OrientationClassifier, OrientationLabel};
use crate::peripherals::{
    alert_text, Accelerometer, Actuator, DisplayLines, FormatHint, Notifier, PositionSource,
    StatusDisplay,
};
use crate::position::PositionTracker;
use crate::retrieval::RetrievalServer;
use crate::view::{FixText, LogReport, LogView};

/// The external collaborators driven by the loop.
pub struct Peripherals {
    /// Orientation sensor.
    pub accelerometer: Box<dyn Accelerometer>,
    /// Positioning receiver.
    pub positioning: Box<dyn PositionSource>,
    /// Audible alert.
    pub buzzer: Box<dyn Actuator>,
    /// Message transport; `None` disables notifications.
    pub notifier: Option<Box<dyn Notifier>>,
    /// Operator display.
    pub display: Box<dyn StatusDisplay>,
}

impl std::fmt::Debug for Peripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peripherals")
            .field("accelerometer", &self.accelerometer.name())
            .field("notifier", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}

/// What to do when a crash is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSettings {
    /// Buzzer pulse length.
    pub pulse: Duration,
    /// Notification recipient id.
    pub recipient: String,
    /// Upper bound on one notification attempt.
    pub notify_timeout: Duration,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            pulse: Duration::from_millis(2000),
            recipient: String::new(),
            notify_timeout: Duration::from_millis(5000),
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Label used for this tick (the previous one if the sensor failed).
    pub label: OrientationLabel,
    /// Whether the accelerometer delivered a sample.
    pub sensor_ok: bool,
    /// The crash recorded on this tick, if any.
    pub crash: Option<CrashEvent>,
}

/// Owns all crash-detection state for the life of the process.
#[derive(Debug, Clone)]
pub struct Recorder {
    classifier: OrientationClassifier,
    scale_lsb_per_g: f32,
    tracker: PositionTracker,
    detector: CrashDetector,
    log: EventLog,
    view: LogView,
    alert: AlertSettings,
    poll_interval: Duration,
    last_label: OrientationLabel,
    sensor_ok: bool,
}

impl Recorder {
    /// Build a recorder from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not pass [`Config::validate`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: config.classifier(),
            scale_lsb_per_g: config.sensor.scale_lsb_per_g,
            tracker: PositionTracker::new(config.position.utc_offset_minutes),
            detector: CrashDetector::new(config.detector()),
            log: EventLog::new(config.log.capacity),
            view: LogView::new(config.view()),
            alert: AlertSettings {
                pulse: config.buzzer_pulse(),
                recipient: config.alert.recipient.clone(),
                notify_timeout: config.notify_timeout(),
            },
            poll_interval: config.poll_interval(),
            last_label: OrientationLabel::Normal,
            sensor_ok: true,
        })
    }

    /// The event log.
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// The position tracker.
    #[must_use]
    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// The crash detector.
    #[must_use]
    pub fn detector(&self) -> &CrashDetector {
        &self.detector
    }

    /// Interval between ticks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Build the report as of now.
    #[must_use]
    pub fn report(&self) -> LogReport {
        self.view
            .report(self.log.snapshot(), &self.tracker.current(), self.log.stats())
    }

    /// Run one polling tick at monotonic time `now`.
    pub async fn tick(&mut self, io: &mut Peripherals, now: Duration) -> TickOutcome {
        for update in io.positioning.poll() {
            self.tracker.apply(update);
        }
        let fix = self.tracker.current();

        let label = self.sample(io.accelerometer.as_mut());

        let text = FixText::new(&fix, self.view.config().coordinate_precision);
        io.display
            .show(&DisplayLines::position(&text.latitude, &text.longitude));

        let crash = self.detector.observe(label, now, &fix, &mut self.log);
        if let Some(event) = &crash {
            io.display.show(&DisplayLines::crash(event.label));
            io.buzzer.pulse(self.alert.pulse).await;
            if let Some(notifier) = io.notifier.as_deref() {
                self.notify(notifier, event).await;
            }
        }

        TickOutcome {
            label,
            sensor_ok: self.sensor_ok,
            crash,
        }
    }

    /// Read and classify one sample, falling back to the previous label.
    fn sample(&mut self, sensor: &mut dyn Accelerometer) -> OrientationLabel {
        match sensor.read() {
            Ok(raw) => {
                if !self.sensor_ok {
                    info!(sensor = sensor.name(), "accelerometer recovered");
                }
                self.sensor_ok = true;
                self.last_label = self
                    .classifier
                    .classify(AccelSample::from_raw(raw, self.scale_lsb_per_g));
            }
            Err(err) => {
                if self.sensor_ok {
                    warn!(
                        sensor = sensor.name(),
                        %err,
                        label = %self.last_label,
                        "accelerometer unavailable, reusing last orientation"
                    );
                }
                self.sensor_ok = false;
            }
        }
        self.last_label
    }

    async fn notify(&self, notifier: &dyn Notifier, event: &CrashEvent) {
        let text = alert_text(event, &self.view);
        let send = notifier.send(&self.alert.recipient, &text, FormatHint::Markdown);
        let result = match tokio::time::timeout(self.alert.notify_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "notification after {}ms",
                self.alert.notify_timeout.as_millis()
            ))),
        };
        match result {
            Ok(()) => debug!(id = event.id, "notification sent"),
            Err(err) => warn!(id = event.id, %err, "notification failed"),
        }
    }

    /// Run `ticks` ticks on a virtual clock, without waiting.
    ///
    /// Tick `i` happens `poll_interval` after tick `i - 1`, plus the buzzer
    /// pulse if tick `i - 1` recorded a crash. Returns the virtual time
    /// after the last tick.
    pub async fn replay(&mut self, io: &mut Peripherals, ticks: usize) -> Duration {
        let mut now = Duration::ZERO;
        for _ in 0..ticks {
            let outcome = self.tick(io, now).await;
            now += self.poll_interval;
            if outcome.crash.is_some() {
                now += self.alert.pulse;
            }
        }
        now
    }

    /// Run the polling loop in real time until `shutdown` completes.
    ///
    /// When `server` is given, retrieval requests are answered between ticks
    /// on the same task.
    pub async fn run<F>(&mut self, io: &mut Peripherals, server: Option<&RetrievalServer>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            poll_ms = self.poll_interval.as_millis(),
            capacity = self.log.capacity(),
            "polling loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick(io, start.elapsed()).await;
                }
                client = next_client(server) => {
                    if let (Some(server), Some((stream, peer))) = (server, client) {
                        server.serve(stream, peer, || self.report().to_html()).await;
                    }
                }
            }
        }

        info!(recorded = self.log.total_appended(), "polling loop stopped");
    }
}

async fn next_client(
    server: Option<&RetrievalServer>,
) -> Option<(tokio::net::TcpStream, std::net::SocketAddr)> {
    match server {
        Some(server) => server.accept().await,
        None => std::future::pending().await,
    }
}
