//! Read-only rendering of the event log.
//!
//! A [`LogView`] turns an event log snapshot and the current fix into a
//! [`LogReport`], a plain data model that the HTML, JSON and text renderers
//! consume. Rendering is pure: unchanged inputs give byte-identical output.

mod html;
mod text;

use serde::Serialize;

use crate::event_log::{CrashEvent, EventLogStats, Snapshot};
use crate::position::Fix;

/// Default map query template.
pub const DEFAULT_MAP_URL_TEMPLATE: &str = "https://maps.google.com/?q={lat},{lon}";

/// Default number of decimals for coordinates.
pub const DEFAULT_COORDINATE_PRECISION: usize = 6;

const DATE_SENTINEL: &str = "--/--/----";
const TIME_SENTINEL: &str = "--:--:--";

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    /// Map link template with `{lat}` and `{lon}` placeholders.
    pub map_url_template: String,
    /// Decimals used for latitude and longitude.
    pub coordinate_precision: usize,
    /// Page heading.
    pub title: String,
    /// Browser auto-refresh interval in seconds (0 disables it).
    pub refresh_secs: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            map_url_template: DEFAULT_MAP_URL_TEMPLATE.to_string(),
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            title: "Vehicle Crash Log".to_string(),
            refresh_secs: 5,
        }
    }
}

/// A fix formatted for display.
///
/// Fields that have never been validated are shown as fixed placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixText {
    /// Latitude with fixed precision.
    pub latitude: String,
    /// Longitude with fixed precision.
    pub longitude: String,
    /// Date as `DD/MM/YYYY`.
    pub date: String,
    /// Local time as `HH:MM:SS`.
    pub time: String,
}

impl FixText {
    /// Format `fix` with `precision` decimals for coordinates.
    #[must_use]
    pub fn new(fix: &Fix, precision: usize) -> Self {
        let (lat, lon) = fix.position.map_or((0.0, 0.0), |p| (p.lat, p.lon));
        Self {
            latitude: format!("{lat:.precision$}"),
            longitude: format!("{lon:.precision$}"),
            date: fix.date.map_or_else(
                || DATE_SENTINEL.to_string(),
                |d| d.format("%d/%m/%Y").to_string(),
            ),
            time: fix.time.map_or_else(
                || TIME_SENTINEL.to_string(),
                |t| t.format("%H:%M:%S").to_string(),
            ),
        }
    }

    /// Build the map link for this position.
    #[must_use]
    pub fn map_link(&self, template: &str) -> String {
        template
            .replace("{lat}", &self.latitude)
            .replace("{lon}", &self.longitude)
    }
}

/// One stored crash, formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    /// Serial id.
    pub id: u64,
    /// Orientation label.
    pub position: String,
    /// Fix at detection time.
    #[serde(flatten)]
    pub fix: FixText,
    /// Link to the position on a map.
    pub map_link: String,
}

/// Everything a retrieval consumer sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReport {
    /// Page heading.
    pub title: String,
    /// Auto-refresh interval in seconds.
    pub refresh_secs: u32,
    /// The latest known fix.
    pub last_fix: FixText,
    /// Stored crashes, oldest first.
    pub events: Vec<EventRow>,
    /// Log counters.
    pub stats: EventLogStats,
}

/// Builds reports from the event log and the current fix.
#[derive(Debug, Clone, Default)]
pub struct LogView {
    config: ViewConfig,
}

impl LogView {
    /// Create a view with the given options.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        Self { config }
    }

    /// Rendering options in use.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Format one crash event.
    #[must_use]
    pub fn event_row(&self, event: &CrashEvent) -> EventRow {
        let fix = FixText::new(&event.fix, self.config.coordinate_precision);
        EventRow {
            id: event.id,
            position: event.label.to_string(),
            map_link: fix.map_link(&self.config.map_url_template),
            fix,
        }
    }

    /// Build the report for a point-in-time view of the log.
    #[must_use]
    pub fn report(&self, snapshot: Snapshot<'_>, fix: &Fix, stats: EventLogStats) -> LogReport {
        LogReport {
            title: self.config.title.clone(),
            refresh_secs: self.config.refresh_secs,
            last_fix: FixText::new(fix, self.config.coordinate_precision),
            events: snapshot.iter().map(|e| self.event_row(e)).collect(),
            stats,
        }
    }
}

impl LogReport {
    /// Render as a self-contained HTML document.
    #[must_use]
    pub fn to_html(&self) -> String {
        html::render(self)
    }

    /// Render as plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        text::render(self)
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
