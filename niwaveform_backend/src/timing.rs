//! Timing records attached to waveforms.
//!
//! A [`Timing`] describes when the first sample of a waveform was taken (`t0`) and how far apart
//! the following samples are. Rate-clocked acquisitions produce [`SampleIntervalMode::Regular`]
//! timing; reads that carry no timing information leave the record at [`Timing::empty`].
//!
//! ## Timestamps
//!
//! The driver reports `t0` as a signed count of 100-ns ticks since `0001-01-01T00:00:00Z`.
//! [`timestamp_from_ticks`] and [`timestamp_to_ticks`] convert between that representation and
//! [`chrono::DateTime<Utc>`], so every timestamp handed to the caller is normalized to UTC.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::fmt;
use std::time::Duration;

/// Number of driver ticks in one second (one tick is 100 ns).
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// How the samples of a waveform are spaced in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleIntervalMode {
    /// No interval information: only `t0` (if any) is meaningful.
    #[default]
    None,
    /// Samples are evenly spaced by [`Timing::sample_interval`].
    Regular,
    /// Samples carry individual timestamps.
    Irregular,
}

impl fmt::Display for SampleIntervalMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SampleIntervalMode::None => "NONE",
                SampleIntervalMode::Regular => "REGULAR",
                SampleIntervalMode::Irregular => "IRREGULAR",
            }
        )
    }
}

/// Timing record of a waveform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timing {
    sample_interval_mode: SampleIntervalMode,
    t0: Option<DateTime<Utc>>,
    sample_interval: Option<Duration>,
}

impl Timing {
    /// A record with no start time and no interval.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A record carrying only a start time.
    pub fn create_with_no_interval(t0: DateTime<Utc>) -> Self {
        Self {
            sample_interval_mode: SampleIntervalMode::None,
            t0: Some(t0),
            sample_interval: None,
        }
    }

    /// A record for evenly spaced samples starting at `t0`.
    pub fn create_with_regular_interval(sample_interval: Duration, t0: DateTime<Utc>) -> Self {
        Self {
            sample_interval_mode: SampleIntervalMode::Regular,
            t0: Some(t0),
            sample_interval: Some(sample_interval),
        }
    }

    pub fn sample_interval_mode(&self) -> SampleIntervalMode {
        self.sample_interval_mode
    }

    pub fn t0(&self) -> Option<DateTime<Utc>> {
        self.t0
    }

    pub fn sample_interval(&self) -> Option<Duration> {
        self.sample_interval
    }

    pub fn is_empty(&self) -> bool {
        self.t0.is_none() && self.sample_interval.is_none()
    }

    /// Timestamp of the sample at `index`, available only for regular timing.
    pub fn timestamp_of(&self, index: usize) -> Option<DateTime<Utc>> {
        if self.sample_interval_mode != SampleIntervalMode::Regular {
            return None;
        }
        let t0 = self.t0?;
        let offset = self.sample_interval?.as_secs_f64() * index as f64;
        let offset = TimeDelta::from_std(Duration::from_secs_f64(offset)).ok()?;
        t0.checked_add_signed(offset)
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.t0, self.sample_interval) {
            (Some(t0), Some(dt)) => write!(
                f,
                "Timing({}, t0={}, dt={}s)",
                self.sample_interval_mode,
                t0.to_rfc3339(),
                dt.as_secs_f64()
            ),
            (Some(t0), None) => write!(f, "Timing({}, t0={})", self.sample_interval_mode, t0.to_rfc3339()),
            _ => write!(f, "Timing({})", self.sample_interval_mode),
        }
    }
}

fn ticks_epoch() -> Option<DateTime<Utc>> {
    Some(NaiveDate::from_ymd_opt(1, 1, 1)?.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Converts driver ticks (100 ns since `0001-01-01T00:00:00Z`) to a UTC timestamp.
///
/// Returns `None` when the tick count lies outside the range `chrono` can represent.
pub fn timestamp_from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let seconds = TimeDelta::try_seconds(ticks.div_euclid(TICKS_PER_SECOND))?;
    let nanos = TimeDelta::nanoseconds(ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK);
    ticks_epoch()?
        .checked_add_signed(seconds)?
        .checked_add_signed(nanos)
}

/// Converts a UTC timestamp to driver ticks, truncating below 100 ns.
pub fn timestamp_to_ticks(timestamp: DateTime<Utc>) -> i64 {
    let Some(epoch) = ticks_epoch() else {
        return 0;
    };
    let since = timestamp.signed_duration_since(epoch);
    since.num_seconds() * TICKS_PER_SECOND + i64::from(since.subsec_nanos()) / NANOS_PER_TICK
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ticks_round_trip_at_known_instant() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 15).unwrap() + TimeDelta::microseconds(250);
        let ticks = timestamp_to_ticks(t);
        assert_eq!(timestamp_from_ticks(ticks), Some(t));
    }

    #[test]
    fn epoch_is_tick_zero() {
        let epoch = timestamp_from_ticks(0).unwrap();
        assert_eq!(epoch.to_rfc3339(), "0001-01-01T00:00:00+00:00");
    }

    #[test]
    fn regular_timing_indexes_samples() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timing = Timing::create_with_regular_interval(Duration::from_millis(1), t0);
        assert_eq!(timing.sample_interval_mode(), SampleIntervalMode::Regular);
        assert_eq!(timing.timestamp_of(10), Some(t0 + TimeDelta::milliseconds(10)));
        assert_eq!(Timing::create_with_no_interval(t0).timestamp_of(1), None);
    }

    #[test]
    fn empty_timing_has_no_mode() {
        let timing = Timing::empty();
        assert!(timing.is_empty());
        assert_eq!(timing.sample_interval_mode(), SampleIntervalMode::None);
        assert_eq!(timing.to_string(), "Timing(NONE)");
    }
}
