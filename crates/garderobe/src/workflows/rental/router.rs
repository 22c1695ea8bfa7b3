use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::booking::BookingRequest;
use super::domain::{BookingId, GarmentId, HubIntakeItem, Money, RenterId};
use super::engine::{GarmentIntake, RentalEngine, RentalError};
use super::inspection::{DamageReport, QcVerdict};
use super::statement::statement_csv;
use super::store::{RentalStore, StoreError};

/// Router builder exposing the rental lifecycle over HTTP. Collaborators
/// (checkout, account, partner/hub, QC) own authentication and authorization;
/// these endpoints assume validated primitive inputs.
pub fn rental_router<S>(engine: Arc<RentalEngine<S>>) -> Router
where
    S: RentalStore + 'static,
{
    Router::new()
        .route("/api/v1/garments", post(register_garment_handler::<S>))
        .route("/api/v1/garments/:garment_id", get(garment_handler::<S>))
        .route("/api/v1/rentals/bookings", post(create_booking_handler::<S>))
        .route(
            "/api/v1/rentals/bookings/:booking_id",
            get(booking_handler::<S>),
        )
        .route(
            "/api/v1/rentals/bookings/:booking_id/pay",
            post(pay_handler::<S>),
        )
        .route(
            "/api/v1/rentals/bookings/:booking_id/cancel",
            post(cancel_handler::<S>),
        )
        .route(
            "/api/v1/rentals/bookings/:booking_id/extend",
            post(extend_handler::<S>),
        )
        .route(
            "/api/v1/rentals/bookings/:booking_id/claims",
            get(claims_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/receive",
            post(hub_receive_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/send",
            post(hub_send_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/pickup",
            post(pickup_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/in-use",
            post(in_use_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/return/open",
            post(open_return_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/return/confirm",
            post(confirm_return_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/return/received",
            post(return_received_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/qc/start",
            post(start_qc_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/qc",
            post(submit_qc_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/cleaning-done",
            post(cleaning_done_handler::<S>),
        )
        .route(
            "/api/v1/rentals/hub/:booking_id/complete",
            post(complete_handler::<S>),
        )
        .route("/api/v1/wallets/:renter_id", get(wallet_handler::<S>))
        .route(
            "/api/v1/wallets/:renter_id/topup",
            post(topup_handler::<S>),
        )
        .route(
            "/api/v1/wallets/:renter_id/withdraw",
            post(withdraw_handler::<S>),
        )
        .route(
            "/api/v1/wallets/:renter_id/statement",
            get(statement_handler::<S>),
        )
        .with_state(engine)
}

/// Maps engine failures onto HTTP, attaching the structured context the
/// caller needs to render a message (missing items, shortfall).
pub fn rental_error_response(error: &RentalError) -> Response {
    let status = match error {
        RentalError::NotFound | RentalError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        RentalError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        RentalError::Store(StoreError::Conflict)
        | RentalError::ResourceConflict
        | RentalError::ExtensionConflict
        | RentalError::ResourceUnavailable { .. } => StatusCode::CONFLICT,
        RentalError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
        RentalError::PaymentExpired
        | RentalError::InvalidTransition { .. }
        | RentalError::InvalidState { .. }
        | RentalError::ChecklistIncomplete { .. }
        | RentalError::DamageReportRequired
        | RentalError::InvalidAmount
        | RentalError::InvalidDates => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = match error {
        RentalError::ChecklistIncomplete { missing } => json!({
            "error": error.to_string(),
            "missing": missing.iter().map(|item| item.label()).collect::<Vec<_>>(),
        }),
        RentalError::InsufficientFunds {
            required,
            available,
        } => json!({
            "error": error.to_string(),
            "required": required,
            "available": available,
        }),
        RentalError::InvalidTransition { from, action } => json!({
            "error": error.to_string(),
            "status": from.label(),
            "action": action,
        }),
        _ => json!({ "error": error.to_string() }),
    };

    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(
    result: Result<T, RentalError>,
    success: StatusCode,
) -> Response {
    match result {
        Ok(value) => (success, Json(value)).into_response(),
        Err(error) => rental_error_response(&error),
    }
}

#[derive(Debug, Deserialize)]
struct CancelRequest {
    requester_id: String,
}

#[derive(Debug, Deserialize)]
struct ExtendRequest {
    extra_days: u32,
}

#[derive(Debug, Deserialize)]
struct HubReceiveRequest {
    checklist: Vec<HubIntakeItem>,
}

#[derive(Debug, Default, Deserialize)]
struct HubSendRequest {
    #[serde(default)]
    tracking_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QcRequest {
    verdict: QcVerdict,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    estimated_cost: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct AmountRequest {
    amount: Money,
}

async fn register_garment_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Json(intake): Json<GarmentIntake>,
) -> Response {
    respond(engine.register_garment(intake), StatusCode::CREATED)
}

async fn garment_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(garment_id): Path<String>,
) -> Response {
    respond(engine.garment(&GarmentId(garment_id)), StatusCode::OK)
}

async fn create_booking_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Json(request): Json<BookingRequest>,
) -> Response {
    respond(engine.create_booking(request, Utc::now()), StatusCode::CREATED)
}

async fn booking_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.booking(&BookingId(booking_id)), StatusCode::OK)
}

async fn pay_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(
        engine.pay_booking(&BookingId(booking_id), Utc::now()),
        StatusCode::OK,
    )
}

async fn cancel_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Response {
    respond(
        engine.cancel_booking(
            &BookingId(booking_id),
            &RenterId(request.requester_id),
            Utc::now(),
        ),
        StatusCode::OK,
    )
}

async fn extend_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
    Json(request): Json<ExtendRequest>,
) -> Response {
    respond(
        engine.request_extend(&BookingId(booking_id), request.extra_days),
        StatusCode::OK,
    )
}

async fn claims_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.damage_claims(&BookingId(booking_id)), StatusCode::OK)
}

async fn hub_receive_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
    Json(request): Json<HubReceiveRequest>,
) -> Response {
    respond(
        engine.hub_receive(&BookingId(booking_id), &request.checklist, Utc::now()),
        StatusCode::OK,
    )
}

async fn hub_send_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
    request: Option<Json<HubSendRequest>>,
) -> Response {
    let tracking_code = request.and_then(|Json(body)| body.tracking_code);
    respond(
        engine.hub_send(&BookingId(booking_id), tracking_code, Utc::now()),
        StatusCode::OK,
    )
}

async fn pickup_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.confirm_pickup(&BookingId(booking_id)), StatusCode::OK)
}

async fn in_use_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.mark_in_use(&BookingId(booking_id)), StatusCode::OK)
}

async fn open_return_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.open_return(&BookingId(booking_id)), StatusCode::OK)
}

async fn confirm_return_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(
        engine.confirm_return(&BookingId(booking_id), Utc::now()),
        StatusCode::OK,
    )
}

async fn return_received_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(
        engine.hub_receive_return(&BookingId(booking_id)),
        StatusCode::OK,
    )
}

async fn start_qc_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.start_qc(&BookingId(booking_id)), StatusCode::OK)
}

async fn submit_qc_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
    Json(request): Json<QcRequest>,
) -> Response {
    let report = match request.verdict {
        QcVerdict::Pass => None,
        QcVerdict::Damage => Some(DamageReport {
            description: request.description.unwrap_or_default(),
            estimated_cost: request.estimated_cost.unwrap_or(Money::zero()),
        }),
    };
    respond(
        engine.submit_qc(&BookingId(booking_id), request.verdict, report, Utc::now()),
        StatusCode::OK,
    )
}

async fn cleaning_done_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(
        engine.hub_cleaning_done(&BookingId(booking_id)),
        StatusCode::OK,
    )
}

async fn complete_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(booking_id): Path<String>,
) -> Response {
    respond(engine.hub_complete(&BookingId(booking_id)), StatusCode::OK)
}

async fn wallet_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(renter_id): Path<String>,
) -> Response {
    respond(
        engine.get_or_create_wallet(&RenterId(renter_id)),
        StatusCode::OK,
    )
}

async fn topup_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(renter_id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Response {
    respond(
        engine.top_up(&RenterId(renter_id), request.amount, Utc::now()),
        StatusCode::OK,
    )
}

async fn withdraw_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(renter_id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Response {
    respond(
        engine.withdraw(&RenterId(renter_id), request.amount, Utc::now()),
        StatusCode::OK,
    )
}

async fn statement_handler<S: RentalStore + 'static>(
    State(engine): State<Arc<RentalEngine<S>>>,
    Path(renter_id): Path<String>,
) -> Response {
    let statement = match engine.wallet_statement(&RenterId(renter_id)) {
        Ok(statement) => statement,
        Err(error) => return rental_error_response(&error),
    };

    match statement_csv(&statement.entries) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            body,
        )
            .into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
