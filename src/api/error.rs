//! Mapping of [`Error`] onto HTTP responses.
//!
//! Every failure leaves as `{ "message": ... }`. Storage and configuration failures are
//! logged in full and reported to the client with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ProductNotFound { .. }
            | Self::CartItemNotFound { .. }
            | Self::SaleNotFound { .. }
            | Self::UserNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::InsufficientStock { .. }
            | Self::StockConflict { .. }
            | Self::EmptyCart
            | Self::InvalidPaymentMethod { .. }
            | Self::InvalidQuantity { .. }
            | Self::InvalidAmount { .. }
            | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::InsufficientStock {
                product: "Water 500ml".to_string(),
                available: 3,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::SaleNotFound { id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Unauthorized {
                message: "no identity".to_string(),
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Forbidden {
                message: "admin exists".to_string(),
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
