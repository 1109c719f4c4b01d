//! Threshold alerting with hysteresis.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Alert history capacity. Deliberately generous and fixed: the renderer
/// decides how many of these actually fit on screen.
pub const ALERT_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Normal,
    Alerting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub message: String,
    pub at: DateTime<Local>,
}

/// Compares one observation per tick against a fixed threshold and flips
/// between [`AlertState::Normal`] and [`AlertState::Alerting`] only on a
/// strict crossing, so an observation sitting exactly on the threshold never
/// flaps the state.
#[derive(Debug)]
pub struct AlertMonitor {
    state: AlertState,
    threshold: f64,
}

impl AlertMonitor {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: AlertState::Normal,
            threshold,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Feeds one windowed hit-count observation. Returns the transition
    /// event if the state changed, `None` otherwise.
    pub fn observe(&mut self, hits: f64, at: DateTime<Local>) -> Option<AlertEvent> {
        match self.state {
            AlertState::Normal if hits > self.threshold => {
                self.state = AlertState::Alerting;
                Some(AlertEvent {
                    message: format!(
                        "High traffic alert - hits = {hits:.1}, triggered at {}",
                        at.format("%Y-%m-%d %H:%M:%S")
                    ),
                    at,
                })
            }
            AlertState::Alerting if hits < self.threshold => {
                self.state = AlertState::Normal;
                Some(AlertEvent {
                    message: format!(
                        "Traffic back to normal - hits = {hits:.1}, triggered at {}",
                        at.format("%Y-%m-%d %H:%M:%S")
                    ),
                    at,
                })
            }
            _ => None,
        }
    }
}

/// Bounded ring of the most recent alert events.
#[derive(Debug)]
pub struct AlertLog {
    events: VecDeque<AlertEvent>,
    capacity: usize,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: AlertEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The last `n` events, oldest of those first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AlertEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
