use core::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use racha_core::DomainError;
use racha_infra::DispatchError;

/// Map a service failure to its status code and `{"error": ...}` body.
///
/// Infrastructure failures are logged here and never leak detail to the caller.
pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    let status = match &err {
        DispatchError::Validation(_) | DispatchError::ClosedLedger => StatusCode::BAD_REQUEST,
        DispatchError::Unauthorized(_) => StatusCode::FORBIDDEN,
        DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::Concurrency(_) => StatusCode::CONFLICT,
        DispatchError::Deserialize(_) | DispatchError::Store(_) => {
            tracing::error!(error = ?err, "internal failure while serving request");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        }
    };

    json_error(status, err.to_string())
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    dispatch_error_to_response(err.into())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Parse a path identifier, answering 400 with the parse failure.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}

/// Unwrap a JSON body, answering malformed or invalid payloads with 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| json_error(StatusCode::BAD_REQUEST, rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use racha_core::EventId;
    use racha_infra::event_store::EventStoreError;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        let cases = [
            (DispatchError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DispatchError::ClosedLedger, StatusCode::BAD_REQUEST),
            (DispatchError::Unauthorized("no".into()), StatusCode::FORBIDDEN),
            (DispatchError::NotFound("participant".into()), StatusCode::NOT_FOUND),
            (DispatchError::Concurrency("raced".into()), StatusCode::CONFLICT),
            (
                DispatchError::Store(EventStoreError::Unavailable("lock poisoned".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(dispatch_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn invalid_path_id_is_bad_request() {
        let err = parse_id::<EventId>("nope").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
