use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{
    Booking, BookingId, ClaimId, DamageClaim, Garment, GarmentId, LedgerEntry, RenterId, Wallet,
    WalletId,
};
use super::engine::RentalError;
use super::store::{RentalStore, StoreError, StoreSession};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    garments: HashMap<GarmentId, Garment>,
    bookings: HashMap<BookingId, Booking>,
    wallets: HashMap<WalletId, Wallet>,
    entries: Vec<LedgerEntry>,
    claims: HashMap<ClaimId, DamageClaim>,
}

/// Reference store keeping everything under one mutex. A transaction works on
/// a cloned copy of the state and swaps it back on success, so failed
/// operations leave no partial writes and concurrent operations serialize.
#[derive(Debug, Default)]
pub struct InMemoryRentalStore {
    state: Mutex<MemoryState>,
}

struct MemorySession {
    state: MemoryState,
}

impl RentalStore for InMemoryRentalStore {
    fn transact<T>(
        &self,
        op: &mut dyn FnMut(&mut dyn StoreSession) -> Result<T, RentalError>,
    ) -> Result<T, RentalError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
            .map_err(RentalError::Store)?;

        let mut session = MemorySession {
            state: guard.clone(),
        };
        let outcome = op(&mut session)?;
        *guard = session.state;
        Ok(outcome)
    }
}

impl StoreSession for MemorySession {
    fn garment(&self, id: &GarmentId) -> Result<Option<Garment>, StoreError> {
        Ok(self.state.garments.get(id).cloned())
    }

    fn insert_garment(&mut self, garment: Garment) -> Result<(), StoreError> {
        if self.state.garments.contains_key(&garment.id) {
            return Err(StoreError::Conflict);
        }
        self.state.garments.insert(garment.id.clone(), garment);
        Ok(())
    }

    fn update_garment(&mut self, garment: Garment) -> Result<(), StoreError> {
        if !self.state.garments.contains_key(&garment.id) {
            return Err(StoreError::NotFound);
        }
        self.state.garments.insert(garment.id.clone(), garment);
        Ok(())
    }

    fn booking(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.state.bookings.get(id).cloned())
    }

    fn insert_booking(&mut self, booking: Booking) -> Result<(), StoreError> {
        if self.state.bookings.contains_key(&booking.id) {
            return Err(StoreError::Conflict);
        }
        self.state.bookings.insert(booking.id.clone(), booking);
        Ok(())
    }

    fn update_booking(&mut self, booking: Booking) -> Result<(), StoreError> {
        if !self.state.bookings.contains_key(&booking.id) {
            return Err(StoreError::NotFound);
        }
        self.state.bookings.insert(booking.id.clone(), booking);
        Ok(())
    }

    fn bookings_for_garment(&self, id: &GarmentId) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = self
            .state
            .bookings
            .values()
            .filter(|booking| &booking.garment_id == id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(bookings)
    }

    fn wallet_for_renter(&self, renter: &RenterId) -> Result<Option<Wallet>, StoreError> {
        Ok(self
            .state
            .wallets
            .values()
            .find(|wallet| &wallet.renter_id == renter)
            .cloned())
    }

    fn wallet(&self, id: &WalletId) -> Result<Option<Wallet>, StoreError> {
        Ok(self.state.wallets.get(id).cloned())
    }

    fn put_wallet(&mut self, wallet: Wallet) -> Result<(), StoreError> {
        self.state.wallets.insert(wallet.id.clone(), wallet);
        Ok(())
    }

    fn append_entry(&mut self, entry: LedgerEntry) -> Result<(), StoreError> {
        self.state.entries.push(entry);
        Ok(())
    }

    fn entries_for_wallet(&self, id: &WalletId) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .state
            .entries
            .iter()
            .filter(|entry| &entry.wallet_id == id)
            .cloned()
            .collect())
    }

    fn insert_claim(&mut self, claim: DamageClaim) -> Result<(), StoreError> {
        if self.state.claims.contains_key(&claim.id) {
            return Err(StoreError::Conflict);
        }
        self.state.claims.insert(claim.id.clone(), claim);
        Ok(())
    }

    fn claims_for_booking(&self, id: &BookingId) -> Result<Vec<DamageClaim>, StoreError> {
        let mut claims: Vec<DamageClaim> = self
            .state
            .claims
            .values()
            .filter(|claim| &claim.booking_id == id)
            .cloned()
            .collect();
        claims.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(claims)
    }
}
