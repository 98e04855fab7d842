//! Booking policy knobs

use chrono::Duration;

/// Default session length cap in hours
pub const DEFAULT_MAX_DURATION_HOURS: i64 = 4;

/// Default student cancellation cutoff in hours before the start
pub const DEFAULT_CANCEL_CUTOFF_HOURS: i64 = 24;

/// Tunable limits applied when booking and cancelling sessions
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    /// Longest allowed session
    pub max_duration: Duration,
    /// Students may cancel for free only while more than this remains
    /// before the start
    pub cancel_cutoff: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_duration: Duration::hours(DEFAULT_MAX_DURATION_HOURS),
            cancel_cutoff: Duration::hours(DEFAULT_CANCEL_CUTOFF_HOURS),
        }
    }
}

impl BookingPolicy {
    /// Build a policy from hour counts (configuration input)
    pub fn from_hours(max_duration_hours: i64, cancel_cutoff_hours: i64) -> Self {
        Self {
            max_duration: Duration::hours(max_duration_hours),
            cancel_cutoff: Duration::hours(cancel_cutoff_hours),
        }
    }
}
