//! The monitoring pipeline.
//!
//! Three activities run concurrently over one piece of shared state:
//!
//! - parse: line source -> parser -> aggregator + meter
//! - alert: once a second, refresh the meter and step the alert machine
//! - render: every `render_interval` seconds, drain the aggregator and
//!   repaint the dashboard
//!
//! They are raced with `select!`, so the first one to fail takes the others
//! down with it at their next await point. Shared state sits behind a mutex
//! that is only ever held across straight-line, non-awaiting code.

use crate::alert::{ALERT_LOG_CAPACITY, AlertLog, AlertMonitor};
use crate::follow::LineFollower;
use crate::meter::{Meter, OrderingError};
use crate::parse::parse_log_line;
use crate::rate::Rate;
use crate::render::{TerminalSize, redraw, render_report};
use crate::stats::Aggregator;
use chrono::Local;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("log source terminated")]
    SourceTerminated,

    #[error("alert clock went backwards")]
    Clock(#[from] OrderingError),
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub alert: Rate,
    pub render_interval_secs: u64,
    pub top_n: usize,
    pub term: TerminalSize,
}

struct Shared {
    aggregator: Aggregator,
    meter: Meter,
    monitor: AlertMonitor,
    alerts: AlertLog,
    // Per-second moving average, refreshed by the alert tick.
    current_rate: f64,
}

/// Runs the pipeline until the line source dies or an invariant breaks.
/// Never returns `Ok` on its own; a clean shutdown is the caller's business
/// (racing this future against a signal handler).
pub async fn run(mut follower: LineFollower, cfg: PipelineConfig) -> Result<(), PipelineError> {
    let shared = Mutex::new(Shared {
        aggregator: Aggregator::new(),
        meter: Meter::new(cfg.alert.interval_secs),
        monitor: AlertMonitor::new(cfg.alert.hits as f64),
        alerts: AlertLog::new(ALERT_LOG_CAPACITY),
        current_rate: 0.0,
    });
    let start = Instant::now();

    tokio::select! {
        res = parse_task(&mut follower, &shared, start) => res,
        res = alert_task(&shared, start) => res,
        res = render_task(&shared, &cfg) => res,
    }
}

async fn parse_task(
    follower: &mut LineFollower,
    shared: &Mutex<Shared>,
    start: Instant,
) -> Result<(), PipelineError> {
    loop {
        let Some(line) = follower.next_line().await else {
            return Err(PipelineError::SourceTerminated);
        };
        let now = start.elapsed().as_secs();

        let mut state = shared.lock().expect("pipeline state poisoned");
        match parse_log_line(&line) {
            Ok(record) => {
                state.aggregator.record(&record);
                state.meter.increase(1, now)?;
            }
            Err(err) => {
                state.aggregator.record_parse_failure();
                tracing::debug!(error = %err, line, "skipped unparsable line");
            }
        }
    }
}

async fn alert_task(shared: &Mutex<Shared>, start: Instant) -> Result<(), PipelineError> {
    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The immediate first tick; nothing to evaluate yet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let now = start.elapsed().as_secs();

        let mut state = shared.lock().expect("pipeline state poisoned");
        // Zero-value refresh keeps the window sliding through quiet periods.
        state.meter.increase(0, now)?;
        let average = state.meter.average();
        state.current_rate = average;

        let hits = average * state.meter.window() as f64;
        if let Some(event) = state.monitor.observe(hits, Local::now()) {
            tracing::info!(message = %event.message, "alert transition");
            state.alerts.push(event);
        }
    }
}

async fn render_task(shared: &Mutex<Shared>, cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let mut ticker = time::interval(Duration::from_secs(cfg.render_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let report = {
            let mut state = shared.lock().expect("pipeline state poisoned");
            let snapshot = state.aggregator.snapshot_and_reset();
            render_report(
                &snapshot,
                state.current_rate,
                cfg.render_interval_secs,
                cfg.top_n,
                &state.alerts,
                cfg.term,
            )
        };
        redraw(&report);
    }
}
