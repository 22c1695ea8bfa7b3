use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    Booking, BookingAction, BookingId, CustodyStatus, HubChecklist, HubIntakeItem,
};
use super::engine::{apply_transition, fetch_booking, fetch_garment, RentalEngine, RentalError};
use super::store::RentalStore;

impl<S> RentalEngine<S>
where
    S: RentalStore,
{
    /// Hub takes custody from the shop. The only gated transition: the full
    /// intake checklist must be supplied or the garment stays with the shop.
    pub fn hub_receive(
        &self,
        id: &BookingId,
        items: &[HubIntakeItem],
        now: DateTime<Utc>,
    ) -> Result<Booking, RentalError> {
        let items = items.to_vec();
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            if booking.status.after(BookingAction::HubReceive).is_none() {
                return Err(RentalError::InvalidTransition {
                    from: booking.status,
                    action: BookingAction::HubReceive.label(),
                });
            }

            let checklist = HubChecklist::from_items(&items);
            if !checklist.is_complete() {
                return Err(RentalError::ChecklistIncomplete {
                    missing: checklist.missing(),
                });
            }

            apply_transition(&mut booking, BookingAction::HubReceive)?;
            booking.checklist = checklist;
            booking.hub_received_at = Some(now);
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(booking = %booking.id.0, "garment received at hub");
        Ok(booking)
    }

    /// Hub dispatches the garment to the renter, optionally with a courier
    /// tracking code.
    pub fn hub_send(
        &self,
        id: &BookingId,
        tracking_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            apply_transition(&mut booking, BookingAction::HubSend)?;
            booking.tracking_code = tracking_code.clone();
            booking.shipped_at = Some(now);
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(booking = %booking.id.0, "garment dispatched to renter");
        Ok(booking)
    }

    /// Renter has the garment in hand; the physical item leaves the hub loop.
    pub fn confirm_pickup(&self, id: &BookingId) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            apply_transition(&mut booking, BookingAction::ConfirmPickup)?;

            let mut garment = fetch_garment(session, &booking.garment_id)?;
            garment.custody = CustodyStatus::Rented;
            session.update_garment(garment)?;
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(booking = %booking.id.0, "pickup confirmed");
        Ok(booking)
    }

    /// The rental enters its event window.
    pub fn mark_in_use(&self, id: &BookingId) -> Result<Booking, RentalError> {
        self.advance(id, BookingAction::MarkInUse)
    }

    /// Renter announces the return; the booking waits for the handover.
    pub fn open_return(&self, id: &BookingId) -> Result<Booking, RentalError> {
        self.advance(id, BookingAction::OpenReturn)
    }

    /// Garment handed back to the courier, on its way to the hub.
    pub fn confirm_return(&self, id: &BookingId, now: DateTime<Utc>) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            apply_transition(&mut booking, BookingAction::ConfirmReturn)?;
            booking.returned_at = Some(now);
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(booking = %booking.id.0, "return confirmed by renter");
        Ok(booking)
    }

    /// Hub takes the returned garment back into custody.
    pub fn hub_receive_return(&self, id: &BookingId) -> Result<Booking, RentalError> {
        self.advance(id, BookingAction::HubReceiveReturn)
    }

    /// Inspection starts; QC owns the booking until a verdict lands.
    pub fn start_qc(&self, id: &BookingId) -> Result<Booking, RentalError> {
        self.advance(id, BookingAction::StartQc)
    }

    /// Cleaning cycle finished, garment travels back to the shop.
    pub fn hub_cleaning_done(&self, id: &BookingId) -> Result<Booking, RentalError> {
        self.advance(id, BookingAction::CleaningDone)
    }

    /// Shop confirms the garment is back on the rack; the booking closes and
    /// the garment reopens for new bookings.
    pub fn hub_complete(&self, id: &BookingId) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            apply_transition(&mut booking, BookingAction::Complete)?;

            let mut garment = fetch_garment(session, &booking.garment_id)?;
            if garment.custody == CustodyStatus::Maintenance {
                garment.custody = CustodyStatus::Available;
                session.update_garment(garment)?;
            }
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(booking = %booking.id.0, "rental completed, garment back at shop");
        Ok(booking)
    }

    /// Unconditional single-step advance: a pure status write through the
    /// transition table.
    fn advance(&self, id: &BookingId, action: BookingAction) -> Result<Booking, RentalError> {
        let booking = self.store.transact(&mut |session| {
            let mut booking = fetch_booking(session, id)?;
            apply_transition(&mut booking, action)?;
            session.update_booking(booking.clone())?;
            Ok(booking)
        })?;

        info!(
            booking = %booking.id.0,
            status = booking.status.label(),
            "custody stage advanced"
        );
        Ok(booking)
    }
}
