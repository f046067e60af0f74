use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};

use racha_core::{EventId, ExpenseId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::CallerContext;

const IDEMPOTENCY_KEY: &str = "idempotency-key";

pub fn router() -> Router {
    Router::new()
        .route("/events/:event_id/expenses", post(record_expense))
        .route("/events/:event_id/expenses/:expense_id", put(edit_expense))
}

/// Record an expense. A repeated `Idempotency-Key` answers with the expense recorded
/// under it first.
pub async fn record_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<dto::ExpenseRequest>, JsonRejection>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match services
        .settlement
        .record_expense(caller.user_id(), event_id, body.into(), idempotency_key)
    {
        Ok(expense) => (StatusCode::CREATED, Json(dto::ExpenseResponse::from(&expense))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn edit_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((event_id, expense_id)): Path<(String, String)>,
    payload: Result<Json<dto::ExpenseRequest>, JsonRejection>,
) -> axum::response::Response {
    let event_id: EventId = match errors::parse_id(&event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let expense_id: ExpenseId = match errors::parse_id(&expense_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services
        .settlement
        .edit_expense(caller.user_id(), event_id, expense_id, body.into())
    {
        Ok(expense) => Json(dto::ExpenseResponse::from(&expense)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
