use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post, put},
    Json, Router,
};

use racha_core::{EventId, ParticipantId};
use racha_infra::NewParticipant;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/events/:event_id/participants", post(add_participant))
        .route(
            "/events/:event_id/participants/:participant_id",
            delete(deactivate_participant),
        )
        .route(
            "/events/:event_id/participants/:participant_id/payment-address",
            put(set_payment_address),
        )
}

pub async fn add_participant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(event_id): Path<String>,
    payload: Result<Json<dto::AddParticipantRequest>, JsonRejection>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let input = NewParticipant {
        name: body.name,
        linked_user_id: body.linked_user_id,
        payment_address: body.payment_address,
    };

    match services.settlement.add_participant(caller.user_id(), event_id, input) {
        Ok(participant) => (
            StatusCode::CREATED,
            Json(dto::ParticipantResponse::from(&participant)),
        )
            .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn deactivate_participant(
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
        .deactivate_participant(caller.user_id(), event_id, participant_id)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn set_payment_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((event_id, participant_id)): Path<(String, String)>,
    payload: Result<Json<dto::PaymentAddressRequest>, JsonRejection>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let participant_id: ParticipantId = match errors::parse_id(&participant_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.settlement.set_payment_address(
        caller.user_id(),
        event_id,
        participant_id,
        body.payment_address,
    ) {
        Ok(participant) => Json(dto::ParticipantResponse::from(&participant)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
