use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::{
    QueryableByName, Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// Products

/// Products are managed outside of this service; this is only used to seed stock.
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
}

// Orders (cart lines)

/// Lifecycle of an order line. Only the checkout moves a line to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStatus {
    InCart,
    Completed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::InCart => "IN_CART",
            PurchaseStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_CART" => Ok(PurchaseStatus::InCart),
            "COMPLETED" => Ok(PurchaseStatus::Completed),
            other => Err(format!("{other} is not a valid purchase status")),
        }
    }
}

pub const DEFAULT_PURCHASE_SOURCE: &str = "cart";

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub note: Option<String>,
    pub purchase_source: String,
    pub purchase_status: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub note: Option<String>,
    pub purchase_source: String,
    pub purchase_status: String,
    pub quantity: i32,
}

/// Every column a cart line update overwrites. A `None` note clears it.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateOrderEntity {
    pub note: Option<String>,
    pub purchase_source: String,
    pub purchase_status: String,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

// Transactions

#[derive(Queryable, QueryableByName, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionEntity {
    pub id: Uuid,
    pub discount: i64,
    pub pre_discount_amount: i64,
    pub final_amount: i64,
    pub invoice: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderTransactionEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub transaction_id: Uuid,
}

/// A settled transaction together with the order lines it fulfilled.
#[derive(Serialize, Debug, ToSchema)]
pub struct TransactionDetails {
    pub transaction: TransactionEntity,
    pub orders: Vec<OrderEntity>,
}
