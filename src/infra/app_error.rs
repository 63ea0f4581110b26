use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::error::{ServiceError, StockShortfall};

/// Message returned for every failure whose details must stay server-side.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Oops! Something went wrong. We're working to fix the issue. Please try again later.";

/// Envelope for every response body: `{ "data": ..., "message": ... }`.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient stock for items")]
    InsufficientStock(Vec<StockShortfall>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => {
                AppError::BadRequest(format!("Invalid input data: {msg}"))
            }
            ServiceError::CartLimitExceeded { .. } => AppError::BadRequest(
                "Cart Limit Exceeded: Please remove items to proceed.".into(),
            ),
            ServiceError::InsufficientStock(details) => AppError::InsufficientStock(details),
            ServiceError::NoMatchingOrders => {
                AppError::BadRequest("No orders found for transaction".into())
            }
            ServiceError::IntegrityFailure { .. } => AppError::BadRequest(
                "Some of the submitted orders could not be settled".into(),
            ),
            ServiceError::NotFound => AppError::NotFound,
            ServiceError::StoreUnavailable(err) => AppError::Other(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, None),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, None),
            AppError::InsufficientStock(details) => {
                (StatusCode::BAD_REQUEST, Some(details.clone()))
            }
            AppError::Other(err) => {
                tracing::error!("Internal error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let message = match &self {
            AppError::Other(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        };

        let body = StdResponse::<Vec<StockShortfall>, String> {
            data: details,
            message: Some(message),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use uuid::Uuid;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn business_rejections_are_client_errors() {
        for err in [
            ServiceError::InvalidInput("quantity must be a positive integer".into()),
            ServiceError::CartLimitExceeded { limit: 20 },
            ServiceError::NoMatchingOrders,
            ServiceError::IntegrityFailure {
                expected: 3,
                written: 2,
            },
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn client_error_messages_are_shown_as_is() {
        let cases = [
            (
                ServiceError::InvalidInput("quantity must be a positive integer".into()),
                "Invalid input data: quantity must be a positive integer",
            ),
            (
                ServiceError::CartLimitExceeded { limit: 20 },
                "Cart Limit Exceeded: Please remove items to proceed.",
            ),
            (
                ServiceError::NoMatchingOrders,
                "No orders found for transaction",
            ),
        ];

        for (err, expected) in cases {
            let json = body_json(AppError::from(err).into_response()).await;
            assert_eq!(json["message"], expected);
        }
    }

    #[tokio::test]
    async fn insufficient_stock_carries_details() {
        let order_id = Uuid::new_v4();
        let response = AppError::from(ServiceError::InsufficientStock(vec![StockShortfall {
            order_id: Some(order_id),
            requested_quantity: 4,
            product_stock: 1,
        }]))
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Insufficient stock for items");
        assert_eq!(json["data"][0]["order_id"], order_id.to_string());
        assert_eq!(json["data"][0]["requested_quantity"], 4);
        assert_eq!(json["data"][0]["product_stock"], 1);
    }

    #[tokio::test]
    async fn integrity_failure_does_not_leak_counts() {
        let response = AppError::from(ServiceError::IntegrityFailure {
            expected: 3,
            written: 2,
        })
        .into_response();

        let json = body_json(response).await;
        let message = json["message"].as_str().unwrap();
        assert!(!message.contains('3'));
        assert!(!message.contains('2'));
    }

    #[tokio::test]
    async fn store_failures_are_generic_internal_errors() {
        let response = AppError::from(ServiceError::StoreUnavailable(anyhow!(
            "connection refused (os error 111) at 10.0.0.3:5432"
        )))
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn missing_line_is_not_found() {
        let response = AppError::from(ServiceError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
