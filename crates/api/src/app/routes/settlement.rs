use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use racha_core::{EventId, ParticipantId, PaymentId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/events/:event_id/balances", get(get_balances))
        .route(
            "/events/:event_id/settlement/:participant_id",
            get(get_settlement_plan),
        )
        .route("/events/:event_id/payments", post(report_payment))
        .route(
            "/events/:event_id/payments/:payment_id/confirm",
            post(confirm_payment),
        )
        .route("/events/:event_id/close", post(close_event))
}

pub async fn get_balances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(event_id): Path<String>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.settlement.balances(caller.user_id(), event_id) {
        Ok(sheet) => Json(dto::BalanceSheetResponse::from(&sheet)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_settlement_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((event_id, participant_id)): Path<(String, String)>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let participant_id: ParticipantId = match errors::parse_id(&participant_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .settlement
        .settlement_plan(caller.user_id(), event_id, participant_id)
    {
        Ok(plan) => Json(dto::SettlementPlanResponse::from(&plan)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn report_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(event_id): Path<String>,
    payload: Result<Json<dto::ReportPaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.settlement.report_payment(
        caller.user_id(),
        event_id,
        body.participant_id,
        body.amount,
    ) {
        Ok(payment) => (StatusCode::CREATED, Json(dto::PaymentResponse::from(&payment))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn confirm_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((event_id, payment_id)): Path<(String, String)>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let payment_id: PaymentId = match errors::parse_id(&payment_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .settlement
        .confirm_payment(caller.user_id(), event_id, payment_id)
    {
        Ok(payment) => Json(dto::PaymentResponse::from(&payment)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Close the event. Closing twice answers with the current (closed) state.
pub async fn close_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(event_id): Path<String>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.settlement.close(caller.user_id(), event_id) {
        Ok(state) => Json(state).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
