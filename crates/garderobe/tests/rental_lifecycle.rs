//! Integration specifications for the rental lifecycle engine.
//!
//! Scenarios exercise the public engine facade and the HTTP router end to
//! end: booking and payment, the hub custody pipeline, quality control, and
//! the wallet ledger invariants that must hold across any operation mix.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use garderobe::workflows::rental::{
        Booking, BookingRequest, Garment, GarmentIntake, HubIntakeItem, InMemoryRentalStore,
        LedgerEntry, LedgerEntryType, Money, RentalConfig, RentalEngine, RenterId,
    };

    pub(super) fn engine() -> Arc<RentalEngine<InMemoryRentalStore>> {
        Arc::new(RentalEngine::new(
            Arc::new(InMemoryRentalStore::default()),
            RentalConfig::default(),
        ))
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

    pub(super) fn request(
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
            .create_booking(request(renter, garment, pickup, return_date), now)
            .expect("booking created");
        engine.pay_booking(&booking.id, now).expect("booking paid")
    }

    pub(super) fn full_checklist() -> Vec<HubIntakeItem> {
        HubIntakeItem::ordered().to_vec()
    }

    pub(super) fn drive_to_hub_return(
        engine: &RentalEngine<InMemoryRentalStore>,
        booking: &Booking,
        now: DateTime<Utc>,
    ) {
        engine
            .hub_receive(&booking.id, &full_checklist(), now)
            .expect("hub receive");
        engine
            .hub_send(&booking.id, Some("JNE-7781".to_string()), now)
            .expect("hub send");
        engine.confirm_pickup(&booking.id).expect("pickup");
        engine.mark_in_use(&booking.id).expect("in use");
        engine.open_return(&booking.id).expect("open return");
        engine
            .confirm_return(&booking.id, now)
            .expect("confirm return");
        engine
            .hub_receive_return(&booking.id)
            .expect("hub receives return");
    }

    /// Replays the entry stream into the balances it implies.
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
}

mod properties {
    use super::common::*;
    use garderobe::workflows::rental::{
        BookingStatus, LedgerEntryType, Money, QcVerdict, RentalError,
    };

    #[test]
    fn active_bookings_never_overlap() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);

        // A spread of candidate windows; only temporally disjoint ones land.
        let windows = [
            (date(2025, 7, 1), date(2025, 7, 4)),
            (date(2025, 7, 2), date(2025, 7, 5)),
            (date(2025, 7, 6), date(2025, 7, 8)),
            (date(2025, 7, 7), date(2025, 7, 9)),
            (date(2025, 7, 11), date(2025, 7, 12)),
            (date(2025, 7, 12), date(2025, 7, 14)),
        ];

        let mut accepted = Vec::new();
        for (index, (pickup, return_date)) in windows.into_iter().enumerate() {
            let customer = renter(&format!("w{index}"));
            if let Ok(booking) =
                engine.create_booking(request(&customer, &garment, pickup, return_date), now)
            {
                accepted.push(booking);
            }
        }

        assert!(accepted.len() >= 2, "fixture should accept several windows");
        for a in &accepted {
            for b in &accepted {
                if a.id == b.id {
                    continue;
                }
                let overlap = a.pickup_date <= b.buffer_end && a.buffer_end >= b.pickup_date;
                assert!(
                    !overlap,
                    "bookings {:?} and {:?} overlap",
                    a.id, b.id
                );
            }
        }
    }

    #[test]
    fn wallet_balances_replay_from_the_ledger_after_any_mix() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);
        let customer = renter("mix");

        let booking = paid_booking(
            &engine,
            &customer,
            &garment,
            date(2025, 7, 1),
            date(2025, 7, 4),
            now,
        );
        engine
            .withdraw(&customer, Money::from_minor(50_000), now)
            .expect("withdraw");
        drive_to_hub_return(&engine, &booking, now);
        engine
            .submit_qc(&booking.id, QcVerdict::Pass, None, now)
            .expect("qc pass");
        engine
            .top_up(&customer, Money::from_minor(10_000), now)
            .expect("top up");

        let statement = engine.wallet_statement(&customer).expect("statement");
        let (available, locked) = replay_balances(&statement.entries);
        assert_eq!(statement.wallet.available, available);
        assert_eq!(statement.wallet.locked, locked);
        assert!(statement.wallet.available.minor() >= 0);
        assert!(statement.wallet.locked.minor() >= 0);
    }

    #[test]
    fn the_deposit_unlocks_at_most_once() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);
        let customer = renter("once");

        let booking = paid_booking(
            &engine,
            &customer,
            &garment,
            date(2025, 7, 1),
            date(2025, 7, 4),
            now,
        );
        drive_to_hub_return(&engine, &booking, now);
        engine
            .submit_qc(&booking.id, QcVerdict::Pass, None, now)
            .expect("qc pass");

        // Whatever gets retried afterwards, no second unlock can happen.
        let _ = engine.submit_qc(&booking.id, QcVerdict::Pass, None, now);
        let _ = engine.cancel_booking(&booking.id, &customer, now);

        let statement = engine.wallet_statement(&customer).expect("statement");
        let unlocks = statement
            .entries
            .iter()
            .filter(|entry| entry.entry_type == LedgerEntryType::Unlock)
            .count();
        assert_eq!(unlocks, 1);
    }

    #[test]
    fn transitions_are_monotonic_under_repeated_calls() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);

        let booking = paid_booking(
            &engine,
            &renter("mono"),
            &garment,
            date(2025, 7, 1),
            date(2025, 7, 4),
            now,
        );

        engine
            .hub_receive(&booking.id, &full_checklist(), now)
            .expect("hub receive");
        assert!(matches!(
            engine.hub_receive(&booking.id, &full_checklist(), now),
            Err(RentalError::InvalidTransition {
                from: BookingStatus::AtHub,
                ..
            })
        ));

        engine.hub_send(&booking.id, None, now).expect("send");
        assert!(matches!(
            engine.hub_send(&booking.id, None, now),
            Err(RentalError::InvalidTransition { .. })
        ));

        engine.confirm_pickup(&booking.id).expect("pickup");
        assert!(matches!(
            engine.confirm_pickup(&booking.id),
            Err(RentalError::InvalidTransition { .. })
        ));

        engine.open_return(&booking.id).expect("open return");
        assert!(matches!(
            engine.open_return(&booking.id),
            Err(RentalError::InvalidTransition { .. })
        ));
    }
}

mod lifecycle {
    use super::common::*;
    use chrono::Duration;
    use garderobe::workflows::rental::{
        BookingStatus, CustodyStatus, DepositDisposition, Money, QcVerdict, RentalError,
    };

    #[test]
    fn a_rental_travels_shop_to_shop() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);
        let customer = renter("happy");

        let booking = paid_booking(
            &engine,
            &customer,
            &garment,
            date(2025, 7, 1),
            date(2025, 7, 4),
            now,
        );
        drive_to_hub_return(&engine, &booking, now);
        engine
            .submit_qc(&booking.id, QcVerdict::Pass, None, now)
            .expect("qc pass");
        engine
            .hub_cleaning_done(&booking.id)
            .expect("cleaning done");
        let completed = engine.hub_complete(&booking.id).expect("complete");

        assert_eq!(completed.status, BookingStatus::Completed);
        assert_eq!(completed.deposit, DepositDisposition::Released);
        assert_eq!(
            engine.garment(&garment.id).expect("garment").custody,
            CustodyStatus::Available
        );

        // The renter paid exactly the fee total over the whole journey.
        let statement = engine.wallet_statement(&customer).expect("statement");
        assert_eq!(
            statement.wallet.available,
            Money::from_minor(1_000_000 - 240_000)
        );
        assert!(statement.wallet.locked.is_zero());
    }

    #[test]
    fn overlap_inside_the_buffer_is_rejected() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);

        // Pickup D1, return D1+3; with two buffer days the slot holds
        // through D1+5, so a D1+4 pickup must bounce.
        engine
            .create_booking(
                request(&renter("first"), &garment, date(2025, 7, 1), date(2025, 7, 4)),
                now,
            )
            .expect("first booking");

        let clash = engine.create_booking(
            request(&renter("second"), &garment, date(2025, 7, 5), date(2025, 7, 8)),
            now,
        );
        assert!(matches!(clash, Err(RentalError::ResourceConflict)));
    }

    #[test]
    fn refund_schedule_follows_the_lead_time() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);

        // Five days of lead time: the full 300k (with backup size) comes back.
        let customer = renter("full");
        engine
            .top_up(&customer, Money::from_minor(1_000_000), now)
            .expect("top up");
        let mut checkout = request(&customer, &garment, date(2025, 6, 6), date(2025, 6, 8));
        checkout.backup_size = true;
        checkout.delivery_fee = Money::from_minor(55_000);
        checkout.laundry_fee = Money::from_minor(25_000);
        let booking = engine.create_booking(checkout, now).expect("booking");
        assert_eq!(booking.total_amount, Money::from_minor(300_000));
        engine.pay_booking(&booking.id, now).expect("paid");
        engine
            .cancel_booking(&booking.id, &customer, now)
            .expect("cancel");
        let statement = engine.wallet_statement(&customer).expect("statement");
        assert_eq!(statement.wallet.available, Money::from_minor(1_000_000));

        // Two days of lead time on a fresh garment: half of 240k.
        let garment_b = register_gown(&engine);
        let near = renter("near");
        let booking = paid_booking(
            &engine,
            &near,
            &garment_b,
            date(2025, 6, 3),
            date(2025, 6, 5),
            now,
        );
        engine
            .cancel_booking(&booking.id, &near, now)
            .expect("cancel");
        let statement = engine.wallet_statement(&near).expect("statement");
        assert_eq!(
            statement.wallet.available,
            Money::from_minor(1_000_000 - 240_000 + 120_000)
        );
    }

    #[test]
    fn expired_payment_cancels_once_then_rejects_retries() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);
        let customer = renter("late");

        engine
            .top_up(&customer, Money::from_minor(500_000), now)
            .expect("top up");
        let booking = engine
            .create_booking(
                request(&customer, &garment, date(2025, 7, 1), date(2025, 7, 4)),
                now,
            )
            .expect("booking");

        let late = now + Duration::hours(1);
        assert!(matches!(
            engine.pay_booking(&booking.id, late),
            Err(RentalError::PaymentExpired)
        ));
        assert!(matches!(
            engine.pay_booking(&booking.id, late),
            Err(RentalError::InvalidState {
                status: BookingStatus::Cancelled
            })
        ));
        assert_eq!(
            engine.garment(&garment.id).expect("garment").custody,
            CustodyStatus::Available
        );
    }

    #[test]
    fn damage_path_holds_the_deposit_behind_a_claim() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);
        let customer = renter("dispute");

        let booking = paid_booking(
            &engine,
            &customer,
            &garment,
            date(2025, 7, 1),
            date(2025, 7, 4),
            now,
        );
        drive_to_hub_return(&engine, &booking, now);
        let disputed = engine
            .submit_qc(
                &booking.id,
                QcVerdict::Damage,
                Some(garderobe::workflows::rental::DamageReport {
                    description: "Wine stain across the bodice".to_string(),
                    estimated_cost: Money::from_minor(90_000),
                }),
                now,
            )
            .expect("damage verdict");

        assert_eq!(disputed.status, BookingStatus::Disputed);
        assert_eq!(disputed.deposit, DepositDisposition::Locked);
        let statement = engine.wallet_statement(&customer).expect("statement");
        assert_eq!(statement.wallet.locked, Money::from_minor(100_000));
        assert_eq!(engine.damage_claims(&booking.id).expect("claims").len(), 1);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use garderobe::workflows::rental::{rental_router, Money};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn booking_can_be_created_and_paid_over_http() {
        let engine = engine();
        let garment = register_gown(&engine);
        let customer = renter("http");
        engine
            .top_up(&customer, Money::from_minor(1_000_000), at_noon(2025, 6, 1))
            .expect("top up");

        let router = rental_router(engine.clone());
        let payload = json!({
            "renter_id": customer.0,
            "garment_id": garment.id.0,
            "pickup_date": "2025-07-01",
            "return_date": "2025-07-04",
            "delivery_fee": 15_000,
            "laundry_fee": 25_000,
        });

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/rentals/bookings")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let booking: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            booking.get("status").and_then(Value::as_str),
            Some("awaiting_payment")
        );
        let booking_id = booking
            .get("id")
            .and_then(Value::as_str)
            .expect("booking id")
            .to_string();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/rentals/bookings/{booking_id}/pay"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let paid: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(paid.get("status").and_then(Value::as_str), Some("confirmed"));
    }

    #[tokio::test]
    async fn incomplete_checklist_names_the_missing_items() {
        let engine = engine();
        let garment = register_gown(&engine);
        let now = at_noon(2025, 6, 1);
        let booking = paid_booking(
            &engine,
            &renter("hub"),
            &garment,
            date(2025, 7, 1),
            date(2025, 7, 4),
            now,
        );

        let router = rental_router(engine.clone());
        let payload = json!({
            "checklist": [
                "garment_matches_booking",
                "condition_photographed",
                "accessories_complete",
                "packaging_prepared",
            ],
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/rentals/hub/{}/receive", booking.id.0))
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let error: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            error.get("missing"),
            Some(&json!(["tag_sealed"])),
        );
    }

    #[tokio::test]
    async fn insufficient_funds_reports_the_shortfall() {
        let engine = engine();
        let garment = register_gown(&engine);
        let customer = renter("broke");
        let now = at_noon(2025, 6, 1);
        let booking = engine
            .create_booking(
                request(&customer, &garment, date(2025, 7, 1), date(2025, 7, 4)),
                now,
            )
            .expect("booking");

        let router = rental_router(engine.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/rentals/bookings/{}/pay", booking.id.0))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let error: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(error.get("required"), Some(&json!(240_000)));
        assert_eq!(error.get("available"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn wallet_statement_exports_csv() {
        let engine = engine();
        let customer = renter("csv");
        engine
            .top_up(&customer, Money::from_minor(500_000), at_noon(2025, 6, 1))
            .expect("top up");

        let router = rental_router(engine.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/v1/wallets/{}/statement", customer.0))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok()),
            Some("text/csv")
        );

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("entry_id,type,amount,reference,recorded_at")
        );
        let first = lines.next().expect("one entry");
        assert!(first.contains("topup"));
        assert!(first.contains("500000"));
    }

    #[tokio::test]
    async fn unknown_booking_is_a_404() {
        let engine = engine();
        let router = rental_router(engine);

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/rentals/bookings/bk-999999")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
