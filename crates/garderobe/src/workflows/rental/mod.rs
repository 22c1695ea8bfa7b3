//! Garment rental lifecycle: booking state machine, custodial wallet ledger,
//! hub fulfillment pipeline, and quality-control gating of deposit release.

mod booking;
pub mod domain;
pub mod engine;
mod fulfillment;
mod inspection;
pub mod ledger;
pub mod memory;
pub mod policy;
pub(crate) mod schedule;
pub mod statement;
pub mod store;

pub mod router;

#[cfg(test)]
mod tests;

pub use booking::BookingRequest;
pub use domain::{
    Booking, BookingAction, BookingId, BookingStatus, ClaimId, ClaimStatus, CustodyStatus,
    DamageClaim, DepositDisposition, EntryId, Garment, GarmentId, HubChecklist, HubIntakeItem,
    LedgerEntry, LedgerEntryType, Money, RenterId, Wallet, WalletId,
};
pub use engine::{GarmentIntake, RentalEngine, RentalError};
pub use inspection::{DamageReport, QcVerdict};
pub use ledger::WalletStatement;
pub use memory::InMemoryRentalStore;
pub use policy::RentalConfig;
pub use router::{rental_error_response, rental_router};
pub use statement::{statement_csv, StatementError};
pub use store::{RentalStore, StoreError, StoreSession};
