use chrono::{DateTime, Utc};

/// Minutes without a sample after which an assigned device counts as missing.
pub const MISSING_AFTER_MINUTES: i64 = 120;

/// Decide whether a location's device should be flagged as missing.
///
/// Unassigned locations and devices that never reported (no or zero timestamp) are always missing;
/// otherwise the device is missing once its last sample is more than
/// [`MISSING_AFTER_MINUTES`] older than `now`.
pub fn is_device_missing(is_device_assigned: bool, device_last_seen_at: Option<i64>, now: DateTime<Utc>) -> bool {
    let last_seen = match device_last_seen_at {
        Some(ms) if is_device_assigned && ms != 0 => ms,
        _ => return true,
    };

    let elapsed_ms = i128::from(now.timestamp_millis()) - i128::from(last_seen);
    elapsed_ms > i128::from(MISSING_AFTER_MINUTES) * 60_000
}
