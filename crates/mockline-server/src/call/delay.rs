//! `*DELAY_RESPONSE_MILLI_SEC` values: a fixed millisecond count or a
//! `(start,end)` range drawn uniformly.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::time::Duration;

static RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\((?P<start>\d+),(?P<end>\d*)\)").ok());

/// Width used when a range has no usable end.
const DEFAULT_RANGE_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySpec {
    Fixed(u64),
    Range { start: u64, end: u64 },
}

impl DelaySpec {
    /// Parse a delay value. Returns `None` for values that are neither an
    /// integer nor a range, and for `0`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(ms) = value.parse::<i64>() {
            return u64::try_from(ms).ok().filter(|ms| *ms > 0).map(Self::Fixed);
        }

        let caps = RANGE.as_ref()?.captures(value)?;
        let start = caps
            .name("start")
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(1);
        let end = caps
            .name("end")
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .filter(|e| *e > start)
            .unwrap_or(start + DEFAULT_RANGE_MS);
        Some(Self::Range { start, end })
    }

    /// Pick the concrete duration for this call.
    pub fn resolve(&self) -> Duration {
        let ms = match *self {
            Self::Fixed(ms) => ms,
            Self::Range { start, end } => rand::thread_rng().gen_range(start..=end),
        };
        Duration::from_millis(ms)
    }
}
