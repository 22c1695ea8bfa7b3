use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{
    BookingId, LedgerEntry, LedgerEntryType, Money, RenterId, Wallet, WalletId,
};
use super::engine::{next_entry_id, next_wallet_id, RentalEngine, RentalError};
use super::store::{RentalStore, StoreSession};

/// Wallet snapshot plus its full entry history, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct WalletStatement {
    pub wallet: Wallet,
    pub entries: Vec<LedgerEntry>,
}

/// Fetches the renter's wallet, creating it with zero balances on first
/// reference.
pub(crate) fn ensure_wallet(
    session: &mut dyn StoreSession,
    renter: &RenterId,
) -> Result<Wallet, RentalError> {
    if let Some(wallet) = session.wallet_for_renter(renter)? {
        return Ok(wallet);
    }

    let wallet = Wallet {
        id: next_wallet_id(),
        renter_id: renter.clone(),
        available: Money::zero(),
        locked: Money::zero(),
    };
    session.put_wallet(wallet.clone())?;
    Ok(wallet)
}

fn record(
    session: &mut dyn StoreSession,
    wallet: &Wallet,
    entry_type: LedgerEntryType,
    amount: Money,
    reference: Option<&BookingId>,
    now: DateTime<Utc>,
) -> Result<(), RentalError> {
    session.append_entry(LedgerEntry {
        id: next_entry_id(),
        wallet_id: wallet.id.clone(),
        entry_type,
        amount,
        reference: reference.cloned(),
        created_at: now,
    })?;
    Ok(())
}

/// Adds to the available balance and appends the matching entry.
pub(crate) fn credit(
    session: &mut dyn StoreSession,
    wallet_id: &WalletId,
    entry_type: LedgerEntryType,
    amount: Money,
    reference: Option<&BookingId>,
    now: DateTime<Utc>,
) -> Result<Wallet, RentalError> {
    if !amount.is_positive() {
        return Err(RentalError::InvalidAmount);
    }

    let mut wallet = session.wallet(wallet_id)?.ok_or(RentalError::NotFound)?;
    wallet.available += amount;
    session.put_wallet(wallet.clone())?;
    record(session, &wallet, entry_type, amount, reference, now)?;
    Ok(wallet)
}

/// Removes from the available balance and appends the matching entry.
pub(crate) fn debit(
    session: &mut dyn StoreSession,
    wallet_id: &WalletId,
    entry_type: LedgerEntryType,
    amount: Money,
    reference: Option<&BookingId>,
    now: DateTime<Utc>,
) -> Result<Wallet, RentalError> {
    if !amount.is_positive() {
        return Err(RentalError::InvalidAmount);
    }

    let mut wallet = session.wallet(wallet_id)?.ok_or(RentalError::NotFound)?;
    if wallet.available < amount {
        return Err(RentalError::InsufficientFunds {
            required: amount,
            available: wallet.available,
        });
    }
    wallet.available -= amount;
    session.put_wallet(wallet.clone())?;
    record(session, &wallet, entry_type, amount, reference, now)?;
    Ok(wallet)
}

/// Moves funds from available to locked; the deposit hold.
pub(crate) fn lock_funds(
    session: &mut dyn StoreSession,
    wallet_id: &WalletId,
    amount: Money,
    reference: &BookingId,
    now: DateTime<Utc>,
) -> Result<Wallet, RentalError> {
    if !amount.is_positive() {
        return Err(RentalError::InvalidAmount);
    }

    let mut wallet = session.wallet(wallet_id)?.ok_or(RentalError::NotFound)?;
    if wallet.available < amount {
        return Err(RentalError::InsufficientFunds {
            required: amount,
            available: wallet.available,
        });
    }
    wallet.available -= amount;
    wallet.locked += amount;
    session.put_wallet(wallet.clone())?;
    record(
        session,
        &wallet,
        LedgerEntryType::Lock,
        amount,
        Some(reference),
        now,
    )?;
    Ok(wallet)
}

/// Moves funds back from locked to available. Callers gate this through the
/// booking's deposit disposition so it can run at most once per booking.
pub(crate) fn unlock_funds(
    session: &mut dyn StoreSession,
    wallet_id: &WalletId,
    amount: Money,
    reference: &BookingId,
    now: DateTime<Utc>,
) -> Result<Wallet, RentalError> {
    if !amount.is_positive() {
        return Err(RentalError::InvalidAmount);
    }

    let mut wallet = session.wallet(wallet_id)?.ok_or(RentalError::NotFound)?;
    if wallet.locked < amount {
        return Err(RentalError::InsufficientFunds {
            required: amount,
            available: wallet.locked,
        });
    }
    wallet.locked -= amount;
    wallet.available += amount;
    session.put_wallet(wallet.clone())?;
    record(
        session,
        &wallet,
        LedgerEntryType::Unlock,
        amount,
        Some(reference),
        now,
    )?;
    Ok(wallet)
}

impl<S> RentalEngine<S>
where
    S: RentalStore,
{
    /// Returns the renter's wallet, creating it lazily.
    pub fn get_or_create_wallet(&self, renter: &RenterId) -> Result<Wallet, RentalError> {
        self.store
            .transact(&mut |session| ensure_wallet(session, renter))
    }

    /// Settled top-up credited to the available balance.
    pub fn top_up(
        &self,
        renter: &RenterId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Wallet, RentalError> {
        let wallet = self.store.transact(&mut |session| {
            let wallet = ensure_wallet(session, renter)?;
            credit(session, &wallet.id, LedgerEntryType::TopUp, amount, None, now)
        })?;

        info!(wallet = %wallet.id.0, amount = %amount, "wallet topped up");
        Ok(wallet)
    }

    /// Settled withdrawal from the available balance.
    pub fn withdraw(
        &self,
        renter: &RenterId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Wallet, RentalError> {
        let wallet = self.store.transact(&mut |session| {
            let wallet = ensure_wallet(session, renter)?;
            debit(
                session,
                &wallet.id,
                LedgerEntryType::Withdraw,
                amount,
                None,
                now,
            )
        })?;

        info!(wallet = %wallet.id.0, amount = %amount, "wallet withdrawal");
        Ok(wallet)
    }

    /// Wallet snapshot plus its append-only entry history.
    pub fn wallet_statement(&self, renter: &RenterId) -> Result<WalletStatement, RentalError> {
        self.store.transact(&mut |session| {
            let wallet = ensure_wallet(session, renter)?;
            let entries = session.entries_for_wallet(&wallet.id)?;
            Ok(WalletStatement { wallet, entries })
        })
    }
}
