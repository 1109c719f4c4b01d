//! Per-render-period traffic aggregation.

use crate::parse::LogRecord;
use std::collections::HashMap;

/// Counters for one render period. Incremented by the parsing activity,
/// drained by the render activity via [`Aggregator::snapshot_and_reset`].
#[derive(Debug, Default)]
pub struct Aggregator {
    total_requests: u64,
    total_bytes: u64,
    methods: HashMap<String, u64>,
    // index 0 = 1xx .. index 4 = 5xx
    status_classes: [u64; 5],
    parse_errors: u64,
    sections: HashMap<String, u64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &LogRecord) {
        self.total_requests += 1;
        self.total_bytes += record.size;
        *self
            .methods
            .entry(record.request.method.clone())
            .or_insert(0) += 1;
        // The parser guarantees status in [100, 599].
        self.status_classes[(record.status / 100 - 1) as usize] += 1;
        *self
            .sections
            .entry(section(&record.request.uri).to_string())
            .or_insert(0) += 1;
    }

    pub fn record_parse_failure(&mut self) {
        self.parse_errors += 1;
    }

    /// Returns the period's counters and starts the next period empty.
    /// Not interleaved with `record`; the caller holds the shared-state lock.
    pub fn snapshot_and_reset(&mut self) -> PeriodSnapshot {
        PeriodSnapshot {
            total_requests: std::mem::take(&mut self.total_requests),
            total_bytes: std::mem::take(&mut self.total_bytes),
            methods: std::mem::take(&mut self.methods),
            status_classes: std::mem::take(&mut self.status_classes),
            parse_errors: std::mem::take(&mut self.parse_errors),
            sections: std::mem::take(&mut self.sections),
        }
    }
}

/// First slash-delimited URI path segment, query string stripped, case
/// preserved. The bare root path maps to `/`.
fn section(uri: &str) -> &str {
    let path = uri.split('?').next().unwrap_or(uri);
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.split('/').next() {
        Some("") | None => "/",
        Some(segment) => segment,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSnapshot {
    pub total_requests: u64,
    pub total_bytes: u64,
    pub methods: HashMap<String, u64>,
    pub status_classes: [u64; 5],
    pub parse_errors: u64,
    pub sections: HashMap<String, u64>,
}

impl PeriodSnapshot {
    /// Integer-division mean request size; zero requests means zero, not an
    /// error.
    pub fn average_size(&self) -> u64 {
        if self.total_requests == 0 {
            0
        } else {
            self.total_bytes / self.total_requests
        }
    }

    pub fn requests_per_second(&self, interval_secs: u64) -> f64 {
        if interval_secs == 0 {
            0.0
        } else {
            self.total_requests as f64 / interval_secs as f64
        }
    }

    /// Top `n` sections by descending hit count. Ties break by ascending
    /// section name so output is stable across renders.
    pub fn top_sections(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .sections
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}
