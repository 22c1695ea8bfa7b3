use chrono::NaiveDate;

use super::domain::{BookingId, GarmentId};
use super::store::{StoreError, StoreSession};

/// Buffer-inclusive overlap test for one garment's calendar.
///
/// An active booking (anything not cancelled or completed) conflicts with the
/// candidate interval iff `existing.pickup_date <= candidate_buffer_end` and
/// `existing.buffer_end >= candidate_start`. Intervals are closed on both
/// ends; any overlap is a hard reject, there is no waitlist. Callers must run
/// this inside the same transaction as the write it guards.
pub(crate) fn has_conflict(
    session: &dyn StoreSession,
    garment_id: &GarmentId,
    candidate_start: NaiveDate,
    candidate_buffer_end: NaiveDate,
    exclude: Option<&BookingId>,
) -> Result<bool, StoreError> {
    let bookings = session.bookings_for_garment(garment_id)?;

    Ok(bookings.iter().any(|existing| {
        if exclude == Some(&existing.id) {
            return false;
        }
        if !existing.status.is_active() {
            return false;
        }
        existing.pickup_date <= candidate_buffer_end && existing.buffer_end >= candidate_start
    }))
}
