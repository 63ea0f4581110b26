//! Cart admission: puts products into a user's cart subject to a cart-size
//! ceiling and the product's current stock.
//!
//! Both checks read without holding a lock across the following write, so a
//! concurrent checkout can still take the stock away. That is accepted here;
//! the checkout is the authoritative gate.

use anyhow::Context;
use chrono::Utc;
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    infra::db::DbPool,
    models::{
        CreateOrderEntity, DEFAULT_PURCHASE_SOURCE, OrderEntity, PurchaseStatus, UpdateOrderEntity,
    },
    schema::{orders, products},
    services::{
        error::{Result, ServiceError, StockShortfall},
        validation::{parse_id, require_positive_quantity},
    },
};

/// Maximum number of `IN_CART` lines a single user may hold.
pub const MAX_CART_LINES: i64 = 20;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddToCart {
    pub product_id: String,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Fields a cart line update overwrites. An omitted note clears it, an omitted
/// source or status falls back to `"cart"` and `IN_CART`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartLineFields {
    pub quantity: i32,
    pub note: Option<String>,
    pub purchase_source: Option<String>,
    pub purchase_status: Option<String>,
}

#[derive(Clone)]
pub struct CartAdmission {
    db_pool: DbPool,
    max_lines: i64,
}

impl CartAdmission {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            db_pool,
            max_lines: MAX_CART_LINES,
        }
    }

    /// Adds `quantity` of a product to the cart, or replaces the quantity of the
    /// line already holding that product.
    pub async fn add_to_cart(&self, user_id: Uuid, req: AddToCart) -> Result<OrderEntity> {
        let product_id = parse_id(&req.product_id, "product_id")?;
        let quantity = require_positive_quantity(req.quantity)?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let lines: i64 = orders::table
            .filter(orders::user_id.eq(user_id))
            .filter(orders::purchase_status.eq(PurchaseStatus::InCart.as_str()))
            .count()
            .get_result(conn)
            .await
            .context("Failed to count cart lines")?;

        if lines >= self.max_lines {
            return Err(ServiceError::CartLimitExceeded {
                limit: self.max_lines,
            });
        }

        let stock: i32 = products::table
            .find(product_id)
            .select(products::stock)
            .first(conn)
            .await
            .optional()
            .context("Failed to get product stock")?
            .ok_or_else(|| {
                ServiceError::InvalidInput("product_id does not refer to a known product".into())
            })?;

        if quantity > stock {
            return Err(ServiceError::InsufficientStock(vec![StockShortfall {
                order_id: None,
                requested_quantity: quantity,
                product_stock: stock,
            }]));
        }

        let new_line = CreateOrderEntity {
            id: Uuid::new_v4(),
            product_id,
            user_id,
            note: req.note,
            purchase_source: DEFAULT_PURCHASE_SOURCE.into(),
            purchase_status: PurchaseStatus::InCart.as_str().into(),
            quantity,
        };

        // A checkout may complete the existing line between the failed insert and
        // the overwrite. The product then has no `IN_CART` line and the insert is
        // retried once.
        let mut line = None;
        for _ in 0..2 {
            let inserted = diesel::insert_into(orders::table)
                .values(&new_line)
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await;

            match inserted {
                Ok(inserted) => {
                    line = Some(inserted);
                    break;
                }
                // The product is already in the cart: keep one line and overwrite its quantity.
                Err(err) if is_in_cart_conflict(&err) => {
                    line = overwrite_quantity(conn, user_id, product_id, quantity).await?;
                    if line.is_some() {
                        break;
                    }
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err)
                        .context("Failed to add cart line")
                        .into());
                }
            }
        }
        let line = line.ok_or_else(|| {
            anyhow::anyhow!("Cart line for product {product_id} kept changing during admission")
        })?;

        info!(
            order_id = %line.id,
            %user_id,
            %product_id,
            quantity,
            "Cart line admitted"
        );

        Ok(line)
    }

    /// Overwrites an `IN_CART` line owned by `user_id`.
    ///
    /// The requested quantity is re-checked against the product's stock, the
    /// cart-size ceiling is not (an update never adds a line).
    pub async fn update_cart_line(
        &self,
        user_id: Uuid,
        line_id: &str,
        fields: CartLineFields,
    ) -> Result<OrderEntity> {
        let line_id = parse_id(line_id, "order_id")?;
        let quantity = require_positive_quantity(fields.quantity)?;
        match fields.purchase_status.as_deref().map(str::parse::<PurchaseStatus>) {
            None | Some(Ok(PurchaseStatus::InCart)) => {}
            Some(Ok(PurchaseStatus::Completed)) => {
                return Err(ServiceError::InvalidInput(
                    "orders can only be completed through checkout".into(),
                ));
            }
            Some(Err(msg)) => return Err(ServiceError::InvalidInput(msg)),
        }

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let stock: i32 = orders::table
            .inner_join(products::table)
            .filter(orders::id.eq(line_id))
            .filter(orders::user_id.eq(user_id))
            .filter(orders::purchase_status.eq(PurchaseStatus::InCart.as_str()))
            .select(products::stock)
            .first(conn)
            .await
            .optional()
            .context("Failed to get product stock")?
            .ok_or(ServiceError::NotFound)?;

        if quantity > stock {
            return Err(ServiceError::InsufficientStock(vec![StockShortfall {
                order_id: Some(line_id),
                requested_quantity: quantity,
                product_stock: stock,
            }]));
        }

        let line = diesel::update(orders::table.find(line_id))
            .filter(orders::user_id.eq(user_id))
            .filter(orders::purchase_status.eq(PurchaseStatus::InCart.as_str()))
            .set(UpdateOrderEntity {
                note: fields.note,
                purchase_source: fields
                    .purchase_source
                    .unwrap_or_else(|| DEFAULT_PURCHASE_SOURCE.into()),
                purchase_status: PurchaseStatus::InCart.as_str().into(),
                quantity,
                updated_at: Utc::now(),
            })
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update cart line")?
            .ok_or(ServiceError::NotFound)?;

        info!(order_id = %line.id, %user_id, quantity, "Cart line updated");

        Ok(line)
    }

    /// Lists the user's `IN_CART` lines, oldest first.
    pub async fn list_cart_lines(&self, user_id: Uuid) -> Result<Vec<OrderEntity>> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let lines = orders::table
            .filter(orders::user_id.eq(user_id))
            .filter(orders::purchase_status.eq(PurchaseStatus::InCart.as_str()))
            .order_by(orders::created_at.asc())
            .select(OrderEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get cart lines")?;

        Ok(lines)
    }

    /// Fetches one of the user's lines in any status. `Ok(None)` when it does not exist.
    pub async fn get_cart_line(
        &self,
        user_id: Uuid,
        line_id: &str,
    ) -> Result<Option<OrderEntity>> {
        let line_id = parse_id(line_id, "order_id")?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let line = orders::table
            .find(line_id)
            .filter(orders::user_id.eq(user_id))
            .select(OrderEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get cart line")?;

        Ok(line)
    }
}

/// Name of the partial unique index allowing one `IN_CART` line per user and product.
const IN_CART_LINE_CONSTRAINT: &str = "orders_in_cart_user_product_key";

fn is_in_cart_conflict(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(IN_CART_LINE_CONSTRAINT)
    )
}

/// `Ok(None)` when the user no longer has an `IN_CART` line for the product.
async fn overwrite_quantity(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<Option<OrderEntity>> {
    let line = diesel::update(orders::table)
        .filter(orders::user_id.eq(user_id))
        .filter(orders::product_id.eq(product_id))
        .filter(orders::purchase_status.eq(PurchaseStatus::InCart.as_str()))
        .set((
            orders::quantity.eq(quantity),
            orders::updated_at.eq(diesel::dsl::now),
        ))
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to update existing cart line")?;

    Ok(line)
}
