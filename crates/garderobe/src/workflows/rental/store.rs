use super::domain::{
    Booking, BookingId, DamageClaim, Garment, GarmentId, LedgerEntry, RenterId, Wallet, WalletId,
};
use super::engine::RentalError;

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Typed accessors available inside one transaction. Reads observe earlier
/// writes of the same transaction; nothing is visible outside until commit.
pub trait StoreSession {
    fn garment(&self, id: &GarmentId) -> Result<Option<Garment>, StoreError>;
    fn insert_garment(&mut self, garment: Garment) -> Result<(), StoreError>;
    fn update_garment(&mut self, garment: Garment) -> Result<(), StoreError>;

    fn booking(&self, id: &BookingId) -> Result<Option<Booking>, StoreError>;
    fn insert_booking(&mut self, booking: Booking) -> Result<(), StoreError>;
    fn update_booking(&mut self, booking: Booking) -> Result<(), StoreError>;
    fn bookings_for_garment(&self, id: &GarmentId) -> Result<Vec<Booking>, StoreError>;

    fn wallet_for_renter(&self, renter: &RenterId) -> Result<Option<Wallet>, StoreError>;
    fn wallet(&self, id: &WalletId) -> Result<Option<Wallet>, StoreError>;
    fn put_wallet(&mut self, wallet: Wallet) -> Result<(), StoreError>;

    fn append_entry(&mut self, entry: LedgerEntry) -> Result<(), StoreError>;
    fn entries_for_wallet(&self, id: &WalletId) -> Result<Vec<LedgerEntry>, StoreError>;

    fn insert_claim(&mut self, claim: DamageClaim) -> Result<(), StoreError>;
    fn claims_for_booking(&self, id: &BookingId) -> Result<Vec<DamageClaim>, StoreError>;
}

/// Storage abstraction for the engine. `transact` runs the closure against a
/// session and commits only when it returns `Ok`; an `Err` leaves the store
/// untouched, so every operation fully commits or fully fails. Conflict
/// checks and the writes they guard share one serializable transaction.
pub trait RentalStore: Send + Sync {
    fn transact<T>(
        &self,
        op: &mut dyn FnMut(&mut dyn StoreSession) -> Result<T, RentalError>,
    ) -> Result<T, RentalError>;
}
