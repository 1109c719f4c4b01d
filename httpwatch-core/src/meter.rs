//! Fixed-memory sliding-window rate meter.
//!
//! One counter bucket per second over the configured window, indexed by
//! `second % window`. Buckets skipped between two writes are zeroed lazily on
//! the later write, so memory stays O(window) no matter how large the gap.

use thiserror::Error;

/// Raised when a timestamp goes backwards. Time is expected to come from a
/// single monotonic clock, so this is an invariant violation, not something
/// callers should recover from.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("timestamp {timestamp} is earlier than the last recorded second {last}")]
pub struct OrderingError {
    pub timestamp: u64,
    pub last: u64,
}

#[derive(Debug, Clone)]
pub struct Meter {
    buckets: Vec<u64>,
    last: Option<u64>,
}

impl Meter {
    pub fn new(window_secs: u64) -> Self {
        debug_assert!(window_secs > 0);
        Self {
            buckets: vec![0; window_secs as usize],
            last: None,
        }
    }

    pub fn window(&self) -> u64 {
        self.buckets.len() as u64
    }

    /// Adds `value` to the bucket for `timestamp` (whole seconds).
    ///
    /// Repeated writes within the same second accumulate. A later second
    /// first zeroes every bucket skipped since the previous write (a gap of a
    /// full window clears everything, including the target bucket). An
    /// earlier second fails.
    pub fn increase(&mut self, value: u64, timestamp: u64) -> Result<(), OrderingError> {
        let window = self.window();

        match self.last {
            Some(last) if timestamp < last => {
                return Err(OrderingError { timestamp, last });
            }
            Some(last) => {
                let gap = (timestamp - last).min(window);
                for step in 1..=gap {
                    self.buckets[((last + step) % window) as usize] = 0;
                }
            }
            None => {}
        }

        self.buckets[(timestamp % window) as usize] += value;
        self.last = Some(timestamp);
        Ok(())
    }

    /// Mean over all window buckets. Deliberately `sum / window` rather than
    /// `sum / elapsed`, so the rate is under-reported until a full window has
    /// passed since startup.
    pub fn average(&self) -> f64 {
        let sum: u64 = self.buckets.iter().sum();
        sum as f64 / self.buckets.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Offsets chosen to land on different ring positions.
    const STARTS: [u64; 6] = [100, 102, 103, 107, 109, 113];

    #[test]
    fn empty_meter() {
        assert_eq!(Meter::new(10).average(), 0.0);
    }

    #[test]
    fn one_update() {
        for now in STARTS {
            let mut meter = Meter::new(10);
            meter.increase(5, now).unwrap();
            assert_eq!(meter.average(), 0.5);
        }
    }

    #[test]
    fn same_second_accumulates() {
        for now in STARTS {
            let mut meter = Meter::new(10);
            meter.increase(5, now).unwrap();
            meter.increase(15, now).unwrap();
            assert_eq!(meter.average(), 2.0);
        }
    }

    #[test]
    fn adjacent_seconds() {
        for now in STARTS {
            let mut meter = Meter::new(10);
            meter.increase(5, now).unwrap();
            meter.increase(15, now + 1).unwrap();
            assert_eq!(meter.average(), 2.0);
        }
    }

    #[test]
    fn full_window() {
        for now in STARTS {
            let mut meter = Meter::new(10);
            for i in 0..10 {
                meter.increase(5, now + i).unwrap();
            }
            assert_eq!(meter.average(), 5.0);
        }
    }

    #[test]
    fn wraparound_evicts_oldest() {
        for now in STARTS {
            let mut meter = Meter::new(10);
            for i in 0..10 {
                meter.increase(5, now + i).unwrap();
            }
            meter.increase(10, now + 10).unwrap();
            assert_eq!(meter.average(), 5.5);
        }
    }

    #[test]
    fn skipping_clock_zeroes_gap() {
        for now in STARTS {
            let mut meter = Meter::new(10);
            for i in 0..10 {
                meter.increase(5, now + i).unwrap();
            }
            // [5,5,5,5,5,5,5,5,5,5] then a 6-second jump:
            // [0,0,0,0,0,10,5,5,5,5]
            meter.increase(10, now + 15).unwrap();
            assert_eq!(meter.average(), 3.0);
        }
    }

    #[test]
    fn gap_larger_than_window_clears_everything() {
        let mut meter = Meter::new(5);
        meter.increase(1, 0).unwrap();
        meter.increase(1, 1).unwrap();
        meter.increase(1, 2).unwrap();
        assert_eq!(meter.average(), 0.6);

        meter.increase(0, 10).unwrap();
        assert_eq!(meter.average(), 0.0);
    }

    #[test]
    fn backwards_timestamp_fails() {
        let mut meter = Meter::new(5);
        meter.increase(1, 3).unwrap();
        assert_eq!(
            meter.increase(1, 2),
            Err(OrderingError {
                timestamp: 2,
                last: 3
            })
        );
    }
}
