use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Booking, BookingAction, BookingId, BookingStatus, ClaimStatus, CustodyStatus, DamageClaim,
    DepositDisposition,
};
use super::engine::{
    apply_transition, fetch_booking, fetch_garment, next_claim_id, RentalEngine, RentalError,
};
use super::ledger::unlock_funds;
use super::store::RentalStore;

/// Terminal inspection decision for a returned garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcVerdict {
    Pass,
    Damage,
}

/// Inspector's findings backing a damage verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub description: String,
    pub estimated_cost: super::domain::Money,
}

impl<S> RentalEngine<S>
where
    S: RentalStore,
{
    /// Record the inspection verdict. A pass releases the deposit hold (at
    /// most once, gated on the disposition) and sends the garment into
    /// cleaning; damage freezes the hold behind a pending claim and parks the
    /// booking in dispute. Either way the garment goes to maintenance.
    pub fn submit_qc(
        &self,
        id: &BookingId,
        verdict: QcVerdict,
        report: Option<DamageReport>,
        now: DateTime<Utc>,
    ) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            if !matches!(
                booking.status,
                BookingStatus::ReturnedToHub | BookingStatus::QcChecking
            ) {
                return Err(RentalError::InvalidState {
                    status: booking.status,
                });
            }

            match verdict {
                QcVerdict::Pass => {
                    apply_transition(&mut booking, BookingAction::QcPass)?;
                    booking.qc_passed_at = Some(now);

                    if booking.hold_amount.is_positive()
                        && booking.deposit == DepositDisposition::Locked
                    {
                        let wallet = session
                            .wallet_for_renter(&booking.renter_id)?
                            .ok_or(RentalError::NotFound)?;
                        unlock_funds(session, &wallet.id, booking.hold_amount, &booking.id, now)?;
                        booking.deposit = DepositDisposition::Released;
                    }
                }
                QcVerdict::Damage => {
                    let report = report.as_ref().ok_or(RentalError::DamageReportRequired)?;
                    if report.description.trim().is_empty() {
                        return Err(RentalError::DamageReportRequired);
                    }
                    if report.estimated_cost.minor() < 0 {
                        return Err(RentalError::InvalidAmount);
                    }

                    apply_transition(&mut booking, BookingAction::QcDamage)?;
                    session.insert_claim(DamageClaim {
                        id: next_claim_id(),
                        booking_id: booking.id.clone(),
                        renter_id: booking.renter_id.clone(),
                        description: report.description.clone(),
                        estimated_cost: report.estimated_cost,
                        status: ClaimStatus::Pending,
                        created_at: now,
                    })?;
                }
            }

            let mut garment = fetch_garment(session, &booking.garment_id)?;
            garment.custody = CustodyStatus::Maintenance;
            session.update_garment(garment)?;
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(
            booking = %booking.id.0,
            status = booking.status.label(),
            "qc verdict recorded"
        );
        Ok(booking)
    }
}
