//! Recorded sensor traces.
//!
//! A trace is a JSON-lines file with one object per polling tick:
//!
//! ```text
//! {"accel": {"x": 0, "y": 0, "z": 16384}, "fixes": [{"time": "06:30:00", "valid": true}]}
//! {"accel": null}
//! ```
//!
//! `accel` holds raw sensor words; a missing or `null` value is a failed read.
//! `fixes` lists the positioning updates that arrived before the tick. Blank
//! lines and lines starting with `#` are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::orientation::RawAccel;
use crate::peripherals::{ScriptedAccelerometer, ScriptedPositionSource};
use crate::position::FixUpdate;

/// Input for one polling tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceTick {
    /// Raw accelerometer reading, or `None` if the read failed.
    #[serde(default)]
    pub accel: Option<RawAccel>,
    /// Positioning updates received before this tick.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixUpdate>,
}

/// A sequence of ticks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trace {
    ticks: Vec<TraceTick>,
}

impl Trace {
    /// Create a trace from ticks.
    #[must_use]
    pub fn new(ticks: Vec<TraceTick>) -> Self {
        Self { ticks }
    }

    /// Load a trace file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is not a valid tick.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::TraceRead {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Self::parse(&text, path)?;
        debug!(ticks = trace.len(), "loaded trace from {}", path.display());
        Ok(trace)
    }

    /// Parse trace text. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first line that is not a valid tick.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut ticks = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tick = serde_json::from_str(line).map_err(|source| Error::TraceParse {
                path: PathBuf::from(path),
                line: index + 1,
                source,
            })?;
            ticks.push(tick);
        }
        Ok(Self { ticks })
    }

    /// Number of ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether the trace has no ticks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// The ticks in order.
    #[must_use]
    pub fn ticks(&self) -> &[TraceTick] {
        &self.ticks
    }

    /// Split into the sensor and positioning sources that replay it.
    #[must_use]
    pub fn into_sources(self) -> (ScriptedAccelerometer, ScriptedPositionSource) {
        let (readings, batches): (Vec<_>, Vec<_>) =
            self.ticks.into_iter().map(|t| (t.accel, t.fixes)).unzip();
        (
            ScriptedAccelerometer::new(readings),
            ScriptedPositionSource::new(batches),
        )
    }
}
