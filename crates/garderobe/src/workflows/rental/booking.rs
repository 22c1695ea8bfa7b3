use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Booking, BookingAction, BookingId, BookingStatus, CustodyStatus, DepositDisposition, GarmentId,
    HubChecklist, LedgerEntryType, Money, RenterId,
};
use super::engine::{
    apply_transition, fetch_booking, fetch_garment, next_booking_id, RentalEngine, RentalError,
};
use super::ledger::{credit, debit, ensure_wallet, lock_funds, unlock_funds};
use super::policy;
use super::schedule;
use super::store::RentalStore;

/// Checkout payload for a new booking. Delivery and laundry fees arrive
/// pre-quoted by the logistics collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub renter_id: RenterId,
    pub garment_id: GarmentId,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    /// Defaults to the pickup date when the renter leaves it blank.
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_fee: Money,
    #[serde(default)]
    pub laundry_fee: Money,
    /// Reserve a backup size against a surcharge.
    #[serde(default)]
    pub backup_size: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

enum PayOutcome {
    Paid(Booking),
    Expired,
}

impl<S> RentalEngine<S>
where
    S: RentalStore,
{
    /// Reserve a garment for a date range. The conflict check and the insert
    /// share one transaction, so two overlapping checkouts cannot both land.
    pub fn create_booking(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, RentalError> {
        if request.pickup_date > request.return_date {
            return Err(RentalError::InvalidDates);
        }
        if request.delivery_fee.minor() < 0 || request.laundry_fee.minor() < 0 {
            return Err(RentalError::InvalidAmount);
        }

        let booking = self.store.transact(&mut |session| {
            let mut garment = fetch_garment(session, &request.garment_id)?;

            // Overlap beats custody: a busy calendar reports the conflict even
            // while the garment sits reserved for the clashing booking.
            let buffer_end = garment.buffer_end(request.return_date);
            if schedule::has_conflict(
                session,
                &garment.id,
                request.pickup_date,
                buffer_end,
                None,
            )? {
                return Err(RentalError::ResourceConflict);
            }
            if !garment.custody.is_bookable() {
                return Err(RentalError::ResourceUnavailable {
                    status: garment.custody,
                });
            }

            let rental_fee = garment.rental_price;
            let service_fee = if request.backup_size {
                policy::backup_size_fee(&self.config, garment.rental_price)
            } else {
                Money::zero()
            };
            let total_amount =
                rental_fee + service_fee + request.delivery_fee + request.laundry_fee;

            let booking = Booking {
                id: next_booking_id(),
                renter_id: request.renter_id.clone(),
                garment_id: garment.id.clone(),
                status: BookingStatus::AwaitingPayment,
                pickup_date: request.pickup_date,
                return_date: request.return_date,
                buffer_end,
                event_date: request.event_date.unwrap_or(request.pickup_date),
                rental_fee,
                service_fee,
                delivery_fee: request.delivery_fee,
                laundry_fee: request.laundry_fee,
                extension_fee: Money::zero(),
                extended_days: 0,
                total_amount,
                hold_amount: garment.deposit_amount,
                deposit: DepositDisposition::None,
                pay_deadline: now + Duration::minutes(self.config.pay_window_minutes),
                paid_at: None,
                tracking_code: None,
                checklist: HubChecklist::empty(),
                hub_received_at: None,
                shipped_at: None,
                returned_at: None,
                qc_passed_at: None,
                notes: request.notes.clone(),
                created_at: now,
            };

            session.insert_booking(booking.clone())?;
            if garment.custody == CustodyStatus::Available {
                garment.custody = CustodyStatus::Reserved;
                session.update_garment(garment)?;
            }
            Ok(booking)
        })?;

        info!(
            booking = %booking.id.0,
            garment = %booking.garment_id.0,
            total = %booking.total_amount,
            "booking created, awaiting payment"
        );
        Ok(booking)
    }

    /// Settle a booking from the renter's wallet. Expired bookings are
    /// cancelled on the spot (committed) before the error surfaces, so the
    /// garment's slot frees up without a background job.
    pub fn pay_booking(&self, id: &BookingId, now: DateTime<Utc>) -> Result<Booking, RentalError> {
        let outcome = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            if booking.status != BookingStatus::AwaitingPayment {
                return Err(RentalError::InvalidState {
                    status: booking.status,
                });
            }

            if now > booking.pay_deadline {
                apply_transition(&mut booking, BookingAction::Cancel)?;
                release_garment(session, &booking)?;
                session.update_booking(booking)?;
                return Ok(PayOutcome::Expired);
            }

            let wallet = ensure_wallet(session, &booking.renter_id)?;
            debit(
                session,
                &wallet.id,
                LedgerEntryType::Payment,
                booking.total_amount,
                Some(&booking.id),
                now,
            )?;
            if booking.hold_amount.is_positive() {
                lock_funds(session, &wallet.id, booking.hold_amount, &booking.id, now)?;
                booking.deposit = DepositDisposition::Locked;
            }

            apply_transition(&mut booking, BookingAction::Pay)?;
            booking.paid_at = Some(now);
            session.update_booking(booking.clone())?;
            Ok(PayOutcome::Paid(booking))
        })?;

        match outcome {
            PayOutcome::Paid(booking) => {
                info!(booking = %booking.id.0, paid = %booking.total_amount, "booking paid");
                Ok(booking)
            }
            PayOutcome::Expired => {
                info!(booking = %id.0, "payment window elapsed, booking auto-cancelled");
                Err(RentalError::PaymentExpired)
            }
        }
    }

    /// Cancel a booking before shipment. Paid amounts are refunded on the
    /// lead-time schedule and a locked deposit is released exactly once.
    pub fn cancel_booking(
        &self,
        id: &BookingId,
        requester: &RenterId,
        now: DateTime<Utc>,
    ) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            apply_transition(&mut booking, BookingAction::Cancel)?;

            if booking.paid_at.is_some() {
                let refund =
                    policy::refund_amount(&self.config, booking.total_amount, booking.pickup_date, now);
                if refund.is_positive() {
                    let wallet = ensure_wallet(session, &booking.renter_id)?;
                    credit(
                        session,
                        &wallet.id,
                        LedgerEntryType::Refund,
                        refund,
                        Some(&booking.id),
                        now,
                    )?;
                }
                if booking.deposit == DepositDisposition::Locked
                    && booking.hold_amount.is_positive()
                {
                    let wallet = ensure_wallet(session, &booking.renter_id)?;
                    unlock_funds(session, &wallet.id, booking.hold_amount, &booking.id, now)?;
                    booking.deposit = DepositDisposition::Released;
                }
            }

            release_garment(session, &booking)?;
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(
            booking = %booking.id.0,
            requester = %requester.0,
            "booking cancelled"
        );
        Ok(booking)
    }

    /// Extend an out-on-rent booking by whole days. Rejected when a later
    /// booking on the same garment would overlap the widened interval.
    pub fn request_extend(&self, id: &BookingId, extra_days: u32) -> Result<Booking, RentalError> {
        if extra_days == 0 {
            return Err(RentalError::InvalidAmount);
        }

        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            if !matches!(
                booking.status,
                BookingStatus::PickedUp | BookingStatus::InUse
            ) {
                return Err(RentalError::InvalidState {
                    status: booking.status,
                });
            }

            let garment = fetch_garment(session, &booking.garment_id)?;
            let new_return = booking.return_date + Duration::days(extra_days as i64);
            let new_buffer_end = garment.buffer_end(new_return);

            if schedule::has_conflict(
                session,
                &garment.id,
                booking.pickup_date,
                new_buffer_end,
                Some(&booking.id),
            )? {
                return Err(RentalError::ExtensionConflict);
            }

            let fee = policy::extension_fee(&self.config, garment.rental_price, extra_days);
            booking.extension_fee += fee;
            booking.extended_days += extra_days;
            booking.return_date = new_return;
            booking.buffer_end = new_buffer_end;
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(
            booking = %booking.id.0,
            extra_days,
            fee = %booking.extension_fee,
            "rental extended"
        );
        Ok(booking)
    }
}

/// Frees the garment's slot after a cancellation, if it was still reserved.
fn release_garment(
    session: &mut dyn super::store::StoreSession,
    booking: &Booking,
) -> Result<(), RentalError> {
    let mut garment = fetch_garment(session, &booking.garment_id)?;
    if garment.custody == CustodyStatus::Reserved {
        garment.custody = CustodyStatus::Available;
        session.update_garment(garment)?;
    }
    Ok(())
}
