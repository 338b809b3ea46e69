//! Cost calculation. Billing charges for at least one hour regardless of
//! the actual stay; the billed amount uses the unrounded duration, only the
//! final product is rounded to two decimals.

use chrono::{DateTime, FixedOffset};

pub const MIN_BILLABLE_HOURS: f64 = 1.0;

/// Wall-clock duration in hours between parking and leaving.
pub fn duration_hours(parked_at: DateTime<FixedOffset>, left_at: DateTime<FixedOffset>) -> f64 {
    let seconds = (left_at - parked_at).num_seconds();
    seconds.max(0) as f64 / 3600.0
}

pub fn billable_hours(hours: f64) -> f64 {
    hours.max(MIN_BILLABLE_HOURS)
}

pub fn parking_cost(hours: f64, hourly_rate: f64) -> f64 {
    round2(billable_hours(hours) * hourly_rate)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
