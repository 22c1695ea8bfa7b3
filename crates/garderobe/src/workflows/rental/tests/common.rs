use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::workflows::rental::{
    Booking, BookingId, BookingRequest, Garment, GarmentIntake, HubIntakeItem, InMemoryRentalStore,
    LedgerEntry, LedgerEntryType, Money, RentalConfig, RentalEngine, RenterId,
};

pub(super) fn engine() -> RentalEngine<InMemoryRentalStore> {
    RentalEngine::new(
        Arc::new(InMemoryRentalStore::default()),
        RentalConfig::default(),
    )
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn renter(tag: &str) -> RenterId {
    RenterId(format!("renter-{tag}"))
}

/// Registers the standard fixture garment: two buffer days, 200k rental,
/// 100k deposit.
pub(super) fn register_gown(engine: &RentalEngine<InMemoryRentalStore>) -> Garment {
    engine
        .register_garment(GarmentIntake {
            shop_code: "ATELIER-7".to_string(),
            name: "Midnight silk gown".to_string(),
            buffer_days: 2,
            rental_price: Money::from_minor(200_000),
            deposit_amount: Money::from_minor(100_000),
            draft: false,
        })
        .expect("garment registers")
}

/// Standard checkout request: 15k delivery + 25k laundry on top of the rental
/// fee, so the fixture total lands at 240k.
pub(super) fn booking_request(
    renter: &RenterId,
    garment: &Garment,
    pickup: NaiveDate,
    return_date: NaiveDate,
) -> BookingRequest {
    BookingRequest {
        renter_id: renter.clone(),
        garment_id: garment.id.clone(),
        pickup_date: pickup,
        return_date,
        event_date: None,
        delivery_fee: Money::from_minor(15_000),
        laundry_fee: Money::from_minor(25_000),
        backup_size: false,
        notes: None,
    }
}

pub(super) fn paid_booking(
    engine: &RentalEngine<InMemoryRentalStore>,
    renter: &RenterId,
    garment: &Garment,
    pickup: NaiveDate,
    return_date: NaiveDate,
    now: DateTime<Utc>,
) -> Booking {
    engine
        .top_up(renter, Money::from_minor(1_000_000), now)
        .expect("top up");
    let booking = engine
        .create_booking(booking_request(renter, garment, pickup, return_date), now)
        .expect("booking created");
    engine.pay_booking(&booking.id, now).expect("booking paid")
}

pub(super) fn full_checklist() -> Vec<HubIntakeItem> {
    HubIntakeItem::ordered().to_vec()
}

/// Walks a confirmed booking through the custody pipeline up to the hub
/// receiving the return, ready for QC.
pub(super) fn drive_to_hub_return(
    engine: &RentalEngine<InMemoryRentalStore>,
    id: &BookingId,
    now: DateTime<Utc>,
) -> Booking {
    engine
        .hub_receive(id, &full_checklist(), now)
        .expect("hub receive");
    engine
        .hub_send(id, Some("JNE-7781".to_string()), now)
        .expect("hub send");
    engine.confirm_pickup(id).expect("pickup");
    engine.mark_in_use(id).expect("in use");
    engine.open_return(id).expect("open return");
    engine.confirm_return(id, now).expect("confirm return");
    engine.hub_receive_return(id).expect("hub receives return")
}

/// Replays an entry stream into the balances it should produce. The wallet
/// must match exactly; any lost or duplicated entry shows up here.
pub(super) fn replay_balances(entries: &[LedgerEntry]) -> (Money, Money) {
    let mut available = Money::zero();
    let mut locked = Money::zero();

    for entry in entries {
        match entry.entry_type {
            LedgerEntryType::TopUp | LedgerEntryType::Refund => available += entry.amount,
            LedgerEntryType::Withdraw | LedgerEntryType::Payment => available -= entry.amount,
            LedgerEntryType::Lock => {
                available -= entry.amount;
                locked += entry.amount;
            }
            LedgerEntryType::Unlock => {
                locked -= entry.amount;
                available += entry.amount;
            }
        }
    }

    (available, locked)
}
