use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::speculative::{Shortfall, SpeculativeError};

/// One line that could not be satisfied by the stock available to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockShortfall {
    /// Absent when the shortfall was detected before a line existed (cart admission).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    pub requested_quantity: i32,
    pub product_stock: i32,
}

impl From<Shortfall<Uuid>> for StockShortfall {
    fn from(shortfall: Shortfall<Uuid>) -> Self {
        Self {
            order_id: Some(shortfall.tag),
            requested_quantity: shortfall.requested,
            product_stock: shortfall.available,
        }
    }
}

/// Errors signaled by the cart admission and checkout core.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed identifiers, non-positive quantities, empty payment method or line set.
    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    /// The user already holds the maximum number of cart lines.
    #[error("Cart limit of {limit} lines exceeded")]
    CartLimitExceeded { limit: i64 },

    /// Requested quantities exceed the stock available for them.
    #[error("Insufficient stock for items")]
    InsufficientStock(Vec<StockShortfall>),

    /// None of the submitted lines were still in the caller's cart.
    #[error("No orders found for transaction")]
    NoMatchingOrders,

    /// The number of order/transaction links written did not match the submitted lines.
    #[error("Linked {written} order(s) to the transaction, expected {expected}")]
    IntegrityFailure { expected: usize, written: usize },

    /// The order line does not exist, belongs to someone else or is no longer in the cart.
    #[error("Order line not found")]
    NotFound,

    /// The store could not be reached or a statement failed.
    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        ServiceError::StoreUnavailable(err.into())
    }
}

impl<E> From<SpeculativeError<Uuid, E>> for ServiceError
where
    E: Into<ServiceError>,
{
    fn from(err: SpeculativeError<Uuid, E>) -> Self {
        match err {
            SpeculativeError::Oversold(shortfalls) => ServiceError::InsufficientStock(
                shortfalls.into_iter().map(StockShortfall::from).collect(),
            ),
            SpeculativeError::Resource(err) => err.into(),
        }
    }
}

/// Convenience type alias for core results.
pub type Result<T> = std::result::Result<T, ServiceError>;
