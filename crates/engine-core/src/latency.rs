//! Single-threaded latency accumulator.
//!
//! Stress scenarios time round-trips (or any other interval) in
//! nanoseconds and feed the samples here. All arithmetic saturates so a
//! long-running stress scenario can never panic on overflow.

use std::time::{SystemTime, UNIX_EPOCH};

/// Min/avg/max/count accumulator over `u64` nanosecond samples.
///
/// Not thread-safe; each scenario thread that wants latency stats owns its
/// own tracker.
#[derive(Debug, Clone, Copy)]
pub struct LatencyTracker {
    min: u64,
    max: u64,
    sum: u64,
    count: u64,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        LatencyTracker {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
        }
    }
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample, in nanoseconds.
    pub fn record(&mut self, sample_ns: u64) {
        self.min = self.min.min(sample_ns);
        self.max = self.max.max(sample_ns);
        self.sum = self.sum.saturating_add(sample_ns);
        self.count = self.count.saturating_add(1);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` if no samples have been recorded yet.
    pub fn min_ns(&self) -> Option<u64> {
        (self.count > 0).then_some(self.min)
    }

    /// `None` if no samples have been recorded yet.
    pub fn max_ns(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max)
    }

    /// `0` when no samples have been recorded; never divides by zero.
    pub fn avg_ns(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }
}

/// Current monotonic-ish timestamp, in nanoseconds since the Unix epoch.
///
/// Mirrors the saturating wall-clock arithmetic used elsewhere in the
/// engine for timestamping (see the donor's `Order::current_timestamp_ns`);
/// `SystemTime` is not a true monotonic clock, so [`elapsed`] defends
/// against it running backwards.
pub fn now_ns() -> u64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    now.as_secs()
        .saturating_mul(1_000_000_000)
        .saturating_add(u64::from(now.subsec_nanos()))
}

/// Nanoseconds elapsed since `start`, as measured by [`now_ns`].
///
/// Returns `0` if the clock did not strictly advance, rather than
/// underflowing.
pub fn elapsed(start: u64) -> u64 {
    let now = now_ns();
    if now > start {
        now - start
    } else {
        0
    }
}

/// A scoped timer: captures a start timestamp on construction and records
/// the elapsed time into a [`LatencyTracker`] exactly once, on [`stop`](Self::stop).
pub struct ScopedTimer<'a> {
    tracker: &'a mut LatencyTracker,
    start: u64,
    stopped: bool,
}

impl<'a> ScopedTimer<'a> {
    pub fn start(tracker: &'a mut LatencyTracker) -> Self {
        ScopedTimer {
            tracker,
            start: now_ns(),
            stopped: false,
        }
    }

    /// Idempotent: calling `stop` more than once only records the first
    /// call's measurement.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let sample = elapsed(self.start);
        self.tracker.record(sample);
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_reports_none_and_zero_avg() {
        let t = LatencyTracker::new();
        assert_eq!(t.count(), 0);
        assert_eq!(t.min_ns(), None);
        assert_eq!(t.max_ns(), None);
        assert_eq!(t.avg_ns(), 0);
    }

    #[test]
    fn records_min_max_avg() {
        let mut t = LatencyTracker::new();
        for sample in [10u64, 30, 20] {
            t.record(sample);
        }
        assert_eq!(t.count(), 3);
        assert_eq!(t.min_ns(), Some(10));
        assert_eq!(t.max_ns(), Some(30));
        assert_eq!(t.avg_ns(), 20);
    }

    #[test]
    fn sum_and_count_saturate_instead_of_panicking() {
        let mut t = LatencyTracker::new();
        t.record(u64::MAX);
        t.record(u64::MAX);
        assert_eq!(t.max_ns(), Some(u64::MAX));
        assert_eq!(t.count(), 2);
        // sum saturated at u64::MAX, avg is well-defined and doesn't panic.
        assert_eq!(t.avg_ns(), u64::MAX / 2);
    }

    #[test]
    fn elapsed_is_zero_when_clock_does_not_advance() {
        let start = now_ns();
        assert_eq!(elapsed(start.saturating_add(1_000_000_000)), 0);
    }

    #[test]
    fn scoped_timer_records_exactly_once() {
        let mut tracker = LatencyTracker::new();
        {
            let mut timer = ScopedTimer::start(&mut tracker);
            timer.stop();
            timer.stop();
        }
        assert_eq!(tracker.count(), 1);
    }
}
