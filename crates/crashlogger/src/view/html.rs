//! HTML document for the retrieval interface.

use std::fmt::Write;

use super::LogReport;

const STYLE: &str = "body{font-family:Arial,Helvetica,sans-serif;margin:10px}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #444;padding:6px;text-align:center}\
th{background:#eee}";

const COLUMNS: [&str; 7] = ["S.No", "Position", "Latitude", "Longitude", "Date", "Time", "Map"];

pub(super) fn render(report: &LogReport) -> String {
    let mut html = String::with_capacity(1024 + report.events.len() * 256);

    // Writing into a String cannot fail.
    let _ = write_document(&mut html, report);
    html
}

fn write_document(out: &mut String, report: &LogReport) -> std::fmt::Result {
    out.push_str("<!doctype html><html><head><meta charset='utf-8'>");
    if report.refresh_secs > 0 {
        write!(
            out,
            "<meta http-equiv='refresh' content='{}'>",
            report.refresh_secs
        )?;
    }
    write!(out, "<title>Crash Logs</title><style>{STYLE}</style></head><body>")?;
    write!(
        out,
        "<h2 style='text-align:center'>{}</h2>",
        escape(&report.title)
    )?;

    let fix = &report.last_fix;
    write!(
        out,
        "<p>Last GPS: {}, {} | Time: {} | Date: {}</p>",
        fix.latitude, fix.longitude, fix.time, fix.date
    )?;

    out.push_str("<table><tr>");
    for column in COLUMNS {
        write!(out, "<th>{column}</th>")?;
    }
    out.push_str("</tr>");

    for row in &report.events {
        write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><a href='{}' target='_blank'>Open</a></td></tr>",
            row.id,
            row.position,
            row.fix.latitude,
            row.fix.longitude,
            row.fix.date,
            row.fix.time,
            escape(&row.map_link),
        )?;
    }
    out.push_str("</table>");

    if report.refresh_secs > 0 {
        write!(
            out,
            "<p style='font-size:12px;color:#666'>Auto-refresh every {}s</p>",
            report.refresh_secs
        )?;
    }
    out.push_str("</body></html>");
    Ok(())
}

/// Escape text for use in element content and single-quoted attributes.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
