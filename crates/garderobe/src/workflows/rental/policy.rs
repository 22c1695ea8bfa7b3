use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::domain::Money;

const SECONDS_PER_DAY: i64 = 86_400;

/// Policy dials for the rental lifecycle. Defaults carry the production
/// values; deployments override through configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalConfig {
    /// Window between booking creation and the payment deadline.
    pub pay_window_minutes: i64,
    /// Cancelling more than this many days before pickup refunds in full.
    pub full_refund_lead_days: i64,
    /// Refund percentage inside the lead window (1..=lead days before pickup).
    pub partial_refund_percent: u32,
    /// Daily extension fee as a percentage of the garment's rental price.
    pub extension_daily_percent: u32,
    /// Backup-size surcharge as a percentage of the garment's rental price.
    pub backup_size_percent: u32,
}

impl Default for RentalConfig {
    fn default() -> Self {
        Self {
            pay_window_minutes: 30,
            full_refund_lead_days: 3,
            partial_refund_percent: 50,
            extension_daily_percent: 30,
            backup_size_percent: 10,
        }
    }
}

/// Whole days until pickup, rounded up. Pickup counts from midnight of the
/// pickup date; a cancellation at any time the day before yields 1.
pub fn days_until_pickup(pickup_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let pickup_midnight = pickup_date.and_time(NaiveTime::MIN);
    let seconds = (pickup_midnight - now.naive_utc()).num_seconds();
    (seconds + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY)
}

/// Refund percentage for a cancellation at `now`.
pub fn refund_percent(config: &RentalConfig, pickup_date: NaiveDate, now: DateTime<Utc>) -> u32 {
    let days = days_until_pickup(pickup_date, now);
    if days > config.full_refund_lead_days {
        100
    } else if days >= 1 {
        config.partial_refund_percent
    } else {
        0
    }
}

/// Refund amount for a cancellation at `now`, rounded half-up.
pub fn refund_amount(
    config: &RentalConfig,
    total_amount: Money,
    pickup_date: NaiveDate,
    now: DateTime<Utc>,
) -> Money {
    total_amount.percent(refund_percent(config, pickup_date, now))
}

/// Fee for extending a rental by `extra_days`.
pub fn extension_fee(config: &RentalConfig, rental_price: Money, extra_days: u32) -> Money {
    rental_price
        .percent(config.extension_daily_percent)
        .times(extra_days)
}

/// Backup-size surcharge recorded as the booking's service fee.
pub fn backup_size_fee(config: &RentalConfig, rental_price: Money) -> Money {
    rental_price.percent(config.backup_size_percent)
}
