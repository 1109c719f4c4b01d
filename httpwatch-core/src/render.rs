//! Dashboard formatting. Pure string building; the only I/O lives in
//! [`redraw`].

use crate::alert::AlertLog;
use crate::stats::PeriodSnapshot;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Formats one render cycle: derived stats first, then volume counters,
/// per-method counters, per-status-class counters and the parse-error count;
/// then the top-N sections; then as many trailing alert lines as the
/// terminal still has room for. Empty input renders as zeroes, never fails.
pub fn render_report(
    snapshot: &PeriodSnapshot,
    current_rate: f64,
    interval_secs: u64,
    top_n: usize,
    alerts: &AlertLog,
    term: TerminalSize,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("httpwatch - last {interval_secs}s period\n"));
    out.push_str("================================\n");

    out.push_str(&format!("Current rate: {current_rate:.2} req/s\n"));
    out.push_str(&format!(
        "Requests/s: {:.2}\n",
        snapshot.requests_per_second(interval_secs)
    ));
    out.push_str(&format!("Average size: {} B\n", snapshot.average_size()));
    out.push('\n');

    out.push_str(&format!("Total requests: {}\n", snapshot.total_requests));
    out.push_str(&format!("Total bytes: {}\n", snapshot.total_bytes));

    let mut methods: Vec<_> = snapshot.methods.iter().collect();
    methods.sort_by_key(|(method, _)| *method);
    for (method, count) in methods {
        out.push_str(&format!("{method} requests: {count}\n"));
    }

    for (i, count) in snapshot.status_classes.iter().enumerate() {
        if *count > 0 {
            out.push_str(&format!("{}xx requests: {count}\n", i + 1));
        }
    }

    out.push_str(&format!("Parse errors: {}\n", snapshot.parse_errors));
    out.push('\n');

    out.push_str(&format!("Top {top_n} sections:\n"));
    for (name, count) in snapshot.top_sections(top_n) {
        out.push_str(&format!("  {name}: {count}\n"));
    }

    if !alerts.is_empty() {
        // Alerts get whatever rows remain below the stats blocks.
        let used = out.lines().count() + 2;
        let room = (term.rows as usize).saturating_sub(used);
        if room > 0 {
            out.push_str("\nAlerts:\n");
            for event in alerts.recent(room) {
                out.push_str(&clipped(&event.message, term.cols as usize));
                out.push('\n');
            }
        }
    }

    out
}

fn clipped(message: &str, cols: usize) -> String {
    message.chars().take(cols).collect()
}

/// Clears the terminal and repaints from the top-left corner.
pub fn redraw(output: &str) {
    print!("\x1b[2J\x1b[H");
    println!("{output}");
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertEvent, AlertLog};
    use std::collections::HashMap;

    fn empty_snapshot() -> PeriodSnapshot {
        PeriodSnapshot {
            total_requests: 0,
            total_bytes: 0,
            methods: HashMap::new(),
            status_classes: [0; 5],
            parse_errors: 0,
            sections: HashMap::new(),
        }
    }

    #[test]
    fn empty_inputs_render_as_zeroes() {
        let report = render_report(
            &empty_snapshot(),
            0.0,
            10,
            5,
            &AlertLog::new(8),
            TerminalSize::default(),
        );

        assert!(report.contains("Total requests: 0"));
        assert!(report.contains("Average size: 0 B"));
        assert!(report.contains("Parse errors: 0"));
        assert!(!report.contains("Alerts:"));
    }

    #[test]
    fn counters_appear_in_category_order() {
        let mut snapshot = empty_snapshot();
        snapshot.total_requests = 10;
        snapshot.total_bytes = 5120;
        snapshot.methods.insert("GET".into(), 10);
        snapshot.status_classes[1] = 10;
        snapshot.sections.insert("en".into(), 10);

        let report = render_report(
            &snapshot,
            1.0,
            10,
            5,
            &AlertLog::new(8),
            TerminalSize::default(),
        );

        assert!(report.contains("Total requests: 10"));
        assert!(report.contains("GET requests: 10"));
        assert!(report.contains("2xx requests: 10"));
        assert!(report.contains("  en: 10"));

        let rate_pos = report.find("Current rate").unwrap();
        let total_pos = report.find("Total requests").unwrap();
        let method_pos = report.find("GET requests").unwrap();
        let status_pos = report.find("2xx requests").unwrap();
        let errors_pos = report.find("Parse errors").unwrap();
        assert!(rate_pos < total_pos);
        assert!(total_pos < method_pos);
        assert!(method_pos < status_pos);
        assert!(status_pos < errors_pos);
    }

    #[test]
    fn alerts_trimmed_to_terminal_rows() {
        let mut alerts = AlertLog::new(64);
        for i in 0..30 {
            alerts.push(AlertEvent {
                message: format!("High traffic alert - hits = {i}.0"),
                at: chrono::Local::now(),
            });
        }

        let report = render_report(
            &empty_snapshot(),
            0.0,
            10,
            5,
            &alerts,
            TerminalSize { rows: 24, cols: 80 },
        );

        let shown = report
            .lines()
            .filter(|l| l.starts_with("High traffic alert"))
            .count();
        assert!(shown > 0);
        assert!(shown < 30);
        // Keeps the most recent events.
        assert!(report.contains("hits = 29.0"));
    }

    #[test]
    fn long_alert_lines_clipped_to_width() {
        let mut alerts = AlertLog::new(8);
        alerts.push(AlertEvent {
            message: "x".repeat(500),
            at: chrono::Local::now(),
        });

        let report = render_report(
            &empty_snapshot(),
            0.0,
            10,
            5,
            &alerts,
            TerminalSize { rows: 40, cols: 20 },
        );

        let longest = report.lines().map(str::len).max().unwrap_or(0);
        assert!(longest <= 32);
    }
}
