//! `crashlogger` - Vehicle crash detection and logging
//!
//! This library classifies accelerometer samples into vehicle orientations,
//! turns sustained abnormal orientation into debounced crash events, keeps
//! the most recent events in a bounded log stamped with the latest position
//! fix, and renders that log for operators.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod event_log;
pub mod logging;
pub mod orientation;
pub mod peripherals;
pub mod position;
pub mod recorder;
pub mod retrieval;
pub mod trace;
pub mod view;

pub use config::Config;
pub use detector::{CrashDetector, DetectorConfig, DetectorState};
pub use error::{Error, Result};
pub use event_log::{CrashEvent, EventLog, EventLogStats};
pub use logging::init_logging;
pub use orientation::{AccelSample, OrientationClassifier, OrientationLabel, RawAccel};
pub use position::{Fix, FixField, FixUpdate, PositionTracker};
pub use recorder::{Peripherals, Recorder};
pub use retrieval::RetrievalServer;
pub use trace::Trace;
pub use view::{LogReport, LogView};
