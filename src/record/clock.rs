//! Simulated time: session gaps and time spent per item

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;

/// Probability that the next event continues the current session
const CONTINUOUS_SESSION_PROBABILITY: f64 = 0.9;

/// Source of the timestamp for a user's first event
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock pinned at `secs` since the Unix epoch; the epoch itself if
    /// `secs` is out of range.
    pub fn from_unix(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    First,
    Continuous,
    NewSession,
}

/// Gap inside a running session: 1-10 min + 1-59 s + 15-45 µs
pub fn continuous_gap<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    let minutes = rng.gen_range(1..=10);
    let seconds = rng.gen_range(1..=59);
    let micros = rng.gen_range(15..=45);
    Duration::minutes(minutes) + Duration::seconds(seconds) + Duration::microseconds(micros)
}

/// Gap between sessions: 1-30 d + 1-23 h + 1-59 min + 1-59 s + 15-45 µs
pub fn new_session_gap<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    let days = rng.gen_range(1..=30);
    let hours = rng.gen_range(1..=23);
    let minutes = rng.gen_range(1..=59);
    let seconds = rng.gen_range(1..=59);
    let micros = rng.gen_range(15..=45);
    Duration::days(days)
        + Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds)
        + Duration::microseconds(micros)
}

/// Submission time of the next event given the user's previous one
pub fn next_submission<R: Rng + ?Sized>(
    rng: &mut R,
    last: Option<DateTime<Utc>>,
    clock: &dyn Clock,
) -> (DateTime<Utc>, SessionKind) {
    match last {
        None => (clock.now(), SessionKind::First),
        Some(last) => {
            if rng.gen_bool(CONTINUOUS_SESSION_PROBABILITY) {
                (last + continuous_gap(rng), SessionKind::Continuous)
            } else {
                (last + new_session_gap(rng), SessionKind::NewSession)
            }
        }
    }
}

/// Seconds spent on one item: 0-15 min + 1-59 s
pub fn time_spent<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..=15u32) * 60 + rng.gen_range(1..=59u32)
}

/// Unix epoch seconds with microsecond precision
pub fn to_epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp_micros() as f64 / 1_000_000.0
}

pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round() as i64;
    let whole = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(whole, nanos)
}
