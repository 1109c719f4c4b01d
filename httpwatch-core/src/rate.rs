//! Alert threshold configuration, e.g. `10/s`, `100/10m`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("rate must look like <hits>/<interval><unit>, got '{0}'")]
    Malformed(String),

    #[error("unknown rate unit '{0}' (expected s, m, h or d)")]
    Unit(char),

    #[error("rate numbers must be positive in '{0}'")]
    Zero(String),
}

/// "Alert when more than `hits` requests arrive within the trailing
/// `interval_secs` seconds."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub hits: u64,
    pub interval_secs: u64,
}

impl FromStr for Rate {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hits_raw, interval_raw) = s
            .split_once('/')
            .ok_or_else(|| RateError::Malformed(s.to_string()))?;

        let hits: u64 = hits_raw
            .parse()
            .map_err(|_| RateError::Malformed(s.to_string()))?;

        let unit = interval_raw
            .chars()
            .last()
            .ok_or_else(|| RateError::Malformed(s.to_string()))?;
        let multiplier = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86400,
            other => return Err(RateError::Unit(other)),
        };

        // An omitted count before the unit means 1, so "1/m" is one per minute.
        let count_raw = &interval_raw[..interval_raw.len() - unit.len_utf8()];
        let count: u64 = if count_raw.is_empty() {
            1
        } else {
            count_raw
                .parse()
                .map_err(|_| RateError::Malformed(s.to_string()))?
        };

        let interval_secs = count * multiplier;
        if hits == 0 || interval_secs == 0 {
            return Err(RateError::Zero(s.to_string()));
        }

        Ok(Rate {
            hits,
            interval_secs,
        })
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.hits, self.interval_secs)
    }
}
