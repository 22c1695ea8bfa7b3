use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Booking, BookingAction, BookingId, BookingStatus, ClaimId, CustodyStatus, DamageClaim, EntryId,
    Garment, GarmentId, HubIntakeItem, Money, WalletId,
};
use super::policy::RentalConfig;
use super::store::{RentalStore, StoreError, StoreSession};

/// Business failures surfaced by the engine. None of these are retried by the
/// core; retrying without changed facts reproduces the same failure. Storage
/// faults travel separately through [`RentalError::Store`] and are the only
/// kind a caller may safely retry.
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    #[error("garment is not open for booking (custody: {})", .status.label())]
    ResourceUnavailable { status: CustodyStatus },
    #[error("garment is already booked over the requested dates")]
    ResourceConflict,
    #[error("a later booking on the same garment blocks the extension")]
    ExtensionConflict,
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },
    #[error("payment window elapsed; the booking has been cancelled")]
    PaymentExpired,
    #[error("cannot {action} a booking in status {}", .from.label())]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },
    #[error("operation not valid for booking status {}", .status.label())]
    InvalidState { status: BookingStatus },
    #[error("hub intake checklist incomplete")]
    ChecklistIncomplete { missing: Vec<HubIntakeItem> },
    #[error("a damage verdict requires a non-empty description")]
    DamageReportRequired,
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("pickup date must not fall after the return date")]
    InvalidDates,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static GARMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static WALLET_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CLAIM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bk-{id:06}"))
}

pub(crate) fn next_garment_id() -> GarmentId {
    let id = GARMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    GarmentId(format!("grm-{id:06}"))
}

pub(crate) fn next_wallet_id() -> WalletId {
    let id = WALLET_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    WalletId(format!("wal-{id:06}"))
}

pub(crate) fn next_entry_id() -> EntryId {
    let id = ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EntryId(format!("txn-{id:06}"))
}

pub(crate) fn next_claim_id() -> ClaimId {
    let id = CLAIM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ClaimId(format!("dmg-{id:06}"))
}

/// Catalog intake payload handed over by the partner/shop flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentIntake {
    pub shop_code: String,
    pub name: String,
    pub buffer_days: u32,
    pub rental_price: Money,
    pub deposit_amount: Money,
    /// Drafts are registered but not yet bookable.
    #[serde(default)]
    pub draft: bool,
}

/// The rental lifecycle engine. Every mutating operation runs as one
/// transaction against the injected store; callers supply `now` so behavior
/// stays deterministic under test.
pub struct RentalEngine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) config: RentalConfig,
}

impl<S> RentalEngine<S>
where
    S: RentalStore,
{
    pub fn new(store: Arc<S>, config: RentalConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RentalConfig {
        &self.config
    }

    /// Register a garment handed over by a shop.
    pub fn register_garment(&self, intake: GarmentIntake) -> Result<Garment, RentalError> {
        if !intake.rental_price.is_positive() || intake.deposit_amount.minor() < 0 {
            return Err(RentalError::InvalidAmount);
        }

        let garment = self.store.transact(&mut |session| {
            let garment = Garment {
                id: next_garment_id(),
                shop_code: intake.shop_code.clone(),
                name: intake.name.clone(),
                custody: if intake.draft {
                    CustodyStatus::Draft
                } else {
                    CustodyStatus::Available
                },
                buffer_days: intake.buffer_days,
                rental_price: intake.rental_price,
                deposit_amount: intake.deposit_amount,
            };
            session.insert_garment(garment.clone())?;
            Ok(garment)
        })?;

        info!(
            garment = %garment.id.0,
            shop = %garment.shop_code,
            custody = garment.custody.label(),
            "garment registered"
        );
        Ok(garment)
    }

    pub fn garment(&self, id: &GarmentId) -> Result<Garment, RentalError> {
        self.store
            .transact(&mut |session| fetch_garment(session, id))
    }

    pub fn booking(&self, id: &BookingId) -> Result<Booking, RentalError> {
        self.store
            .transact(&mut |session| fetch_booking(session, id))
    }

    pub fn damage_claims(&self, id: &BookingId) -> Result<Vec<DamageClaim>, RentalError> {
        self.store
            .transact(&mut |session| Ok(session.claims_for_booking(id)?))
    }
}

pub(crate) fn fetch_booking(
    session: &dyn StoreSession,
    id: &BookingId,
) -> Result<Booking, RentalError> {
    session.booking(id)?.ok_or(RentalError::NotFound)
}

pub(crate) fn fetch_garment(
    session: &dyn StoreSession,
    id: &GarmentId,
) -> Result<Garment, RentalError> {
    session.garment(id)?.ok_or(RentalError::NotFound)
}

/// Advances the booking through the transition table or rejects the pair.
/// Calling an already-applied transition again lands here with the advanced
/// status and is rejected instead of double-applied.
pub(crate) fn apply_transition(
    booking: &mut Booking,
    action: BookingAction,
) -> Result<(), RentalError> {
    let next = booking
        .status
        .after(action)
        .ok_or(RentalError::InvalidTransition {
            from: booking.status,
            action: action.label(),
        })?;
    booking.status = next;
    Ok(())
}
