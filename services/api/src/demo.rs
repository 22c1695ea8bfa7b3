use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use garderobe::error::AppError;
use garderobe::workflows::rental::{
    statement_csv, Booking, BookingRequest, DamageReport, GarmentIntake, HubIntakeItem,
    InMemoryRentalStore, Money, QcVerdict, RentalConfig, RentalEngine, RenterId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pickup date (YYYY-MM-DD). Defaults to a week from today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) pickup: Option<NaiveDate>,
    /// Rental length in days.
    #[arg(long, default_value_t = 3)]
    pub(crate) rental_days: u16,
    /// Finish with a damage verdict instead of a clean QC pass.
    #[arg(long)]
    pub(crate) damage: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let engine = RentalEngine::new(
        Arc::new(InMemoryRentalStore::default()),
        RentalConfig::default(),
    );
    let now = Utc::now();
    let pickup = args
        .pickup
        .unwrap_or_else(|| now.date_naive() + Duration::days(7));
    let return_date = pickup + Duration::days(args.rental_days.max(1) as i64);
    let renter = RenterId("renter-demo".to_string());

    println!("Garderobe rental lifecycle demo");
    println!("===============================");

    let garment = engine.register_garment(GarmentIntake {
        shop_code: "ATELIER-7".to_string(),
        name: "Midnight silk gown".to_string(),
        buffer_days: 2,
        rental_price: Money::from_minor(200_000),
        deposit_amount: Money::from_minor(100_000),
        draft: false,
    })?;
    println!(
        "Registered garment {} ({}) at {} per rental, {} deposit",
        garment.id.0, garment.name, garment.rental_price, garment.deposit_amount
    );

    engine.top_up(&renter, Money::from_minor(1_000_000), now)?;
    print_wallet(&engine, &renter)?;

    let booking = engine.create_booking(
        BookingRequest {
            renter_id: renter.clone(),
            garment_id: garment.id.clone(),
            pickup_date: pickup,
            return_date,
            event_date: None,
            delivery_fee: Money::from_minor(15_000),
            laundry_fee: Money::from_minor(25_000),
            backup_size: false,
            notes: Some("Evening reception".to_string()),
        },
        now,
    )?;
    print_booking("Booking created", &booking);
    println!(
        "  fees: rental {} + delivery {} + laundry {} = {} (deposit hold {})",
        booking.rental_fee,
        booking.delivery_fee,
        booking.laundry_fee,
        booking.total_amount,
        booking.hold_amount
    );

    // An overlapping second checkout bounces off the scheduler.
    let clash = engine.create_booking(
        BookingRequest {
            renter_id: RenterId("renter-rival".to_string()),
            garment_id: garment.id.clone(),
            pickup_date: return_date,
            return_date: return_date + Duration::days(2),
            event_date: None,
            delivery_fee: Money::zero(),
            laundry_fee: Money::zero(),
            backup_size: false,
            notes: None,
        },
        now,
    );
    match clash {
        Err(err) => println!("Rival checkout rejected as expected: {err}"),
        Ok(other) => println!("Unexpected: rival booking {} accepted", other.id.0),
    }

    let booking = engine.pay_booking(&booking.id, now)?;
    print_booking("Booking paid", &booking);
    print_wallet(&engine, &renter)?;

    let booking = engine.hub_receive(&booking.id, &HubIntakeItem::ordered(), now)?;
    print_booking("Hub intake complete", &booking);
    let booking = engine.hub_send(&booking.id, Some("JNE-7781".to_string()), now)?;
    print_booking("Dispatched to renter", &booking);
    let booking = engine.confirm_pickup(&booking.id)?;
    print_booking("Picked up", &booking);
    engine.mark_in_use(&booking.id)?;
    engine.open_return(&booking.id)?;
    let booking = engine.confirm_return(&booking.id, now)?;
    print_booking("Return confirmed", &booking);
    let booking = engine.hub_receive_return(&booking.id)?;
    print_booking("Back at hub", &booking);
    let booking = engine.start_qc(&booking.id)?;
    print_booking("Quality control", &booking);

    let booking = if args.damage {
        let disputed = engine.submit_qc(
            &booking.id,
            QcVerdict::Damage,
            Some(DamageReport {
                description: "Wine stain across the bodice".to_string(),
                estimated_cost: Money::from_minor(90_000),
            }),
            now,
        )?;
        print_booking("Damage verdict", &disputed);
        for claim in engine.damage_claims(&disputed.id)? {
            println!(
                "  claim {}: {} (estimated {})",
                claim.id.0, claim.description, claim.estimated_cost
            );
        }
        disputed
    } else {
        let passed = engine.submit_qc(&booking.id, QcVerdict::Pass, None, now)?;
        print_booking("QC passed, deposit released", &passed);
        let cleaned = engine.hub_cleaning_done(&passed.id)?;
        print_booking("Cleaning done", &cleaned);
        let completed = engine.hub_complete(&cleaned.id)?;
        print_booking("Completed", &completed);
        completed
    };

    print_wallet(&engine, &renter)?;

    println!();
    println!("Ledger statement for {}", renter.0);
    let statement = engine.wallet_statement(&renter)?;
    match statement_csv(&statement.entries) {
        Ok(csv) => print!("{csv}"),
        Err(err) => println!("statement unavailable: {err}"),
    }

    let garment = engine.garment(&booking.garment_id)?;
    println!(
        "Garment {} finishes the demo in custody state '{}'",
        garment.id.0,
        garment.custody.label()
    );

    Ok(())
}

fn print_booking(step: &str, booking: &Booking) {
    println!(
        "{step}: {} is {}",
        booking.id.0,
        booking.status.label()
    );
}

fn print_wallet(
    engine: &RentalEngine<InMemoryRentalStore>,
    renter: &RenterId,
) -> Result<(), AppError> {
    let wallet = engine.get_or_create_wallet(renter)?;
    println!(
        "Wallet {}: available {}, locked {}",
        wallet.id.0, wallet.available, wallet.locked
    );
    Ok(())
}
