//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::error::CoincastError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &CoincastError) -> StatusCode {
    match err {
        CoincastError::ConfigParse { .. }
        | CoincastError::ConfigMissing { .. }
        | CoincastError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
        // The upstream exchange failed us, not the client.
        CoincastError::Fetch { .. } | CoincastError::DataSource { .. } => StatusCode::BAD_GATEWAY,
        CoincastError::NoData { .. }
        | CoincastError::UnorderedData { .. }
        | CoincastError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CoincastError> for WebError {
    fn from(err: CoincastError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_map_to_bad_gateway() {
        let err = CoincastError::Fetch {
            symbol: "BTCUSDT".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(status_from_error(&err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn data_shape_errors_map_to_unprocessable() {
        let err = CoincastError::NoData {
            symbol: "BTCUSDT".into(),
        };
        assert_eq!(status_from_error(&err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn artifact_errors_map_to_internal() {
        let err = CoincastError::ArtifactMissing {
            path: "model/saved/best_model.json".into(),
        };
        assert_eq!(
            status_from_error(&err),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
