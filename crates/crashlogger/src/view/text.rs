//! Plain-text table for terminals.

use std::fmt::Write;

use super::LogReport;

pub(super) fn render(report: &LogReport) -> String {
    let mut out = String::new();
    let fix = &report.last_fix;

    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(out, "{}", "=".repeat(report.title.len()));
    let _ = writeln!(
        out,
        "Last GPS: {}, {} | Time: {} | Date: {}",
        fix.latitude, fix.longitude, fix.time, fix.date
    );
    let _ = writeln!(
        out,
        "Stored:   {} of {} ({} recorded, {} evicted)",
        report.stats.stored,
        report.stats.capacity,
        report.stats.total_appended,
        report.stats.evicted
    );
    out.push('\n');

    if report.events.is_empty() {
        out.push_str("No crashes recorded.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>5}  {:<8} {:>12} {:>12}  {:<10} {:<8}  Map",
        "S.No", "Position", "Latitude", "Longitude", "Date", "Time"
    );
    for row in &report.events {
        let _ = writeln!(
            out,
            "{:>5}  {:<8} {:>12} {:>12}  {:<10} {:<8}  {}",
            row.id,
            row.position,
            row.fix.latitude,
            row.fix.longitude,
            row.fix.date,
            row.fix.time,
            row.map_link
        );
    }
    out
}
