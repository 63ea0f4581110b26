//! Checkout: turns a set of cart lines into one purchase transaction.
//!
//! The whole checkout is a single database transaction. Lines are claimed,
//! the transaction row is computed and inserted, lines are linked to it and
//! stock is decremented per line. If any decrement oversold its product the
//! database transaction is rolled back, taking every other write with it.

use std::future::Future;

use anyhow::Context;
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::Error as DieselError,
    sql_types::{Array, Text, Uuid as SqlUuid},
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    infra::db::DbPool,
    models::{
        CreateOrderTransactionEntity, OrderEntity, PurchaseStatus, TransactionDetails,
        TransactionEntity,
    },
    schema::{order_transactions, orders, products, transactions},
    services::{
        error::{Result, ServiceError},
        speculative::{Claim, QuantityBounded, decrement_then_validate},
        validation::{parse_id, parse_line_ids, require_non_empty},
    },
};

/// Invoice reference stored on every transaction until invoicing exists.
pub const PLACEHOLDER_INVOICE: &str =
    "https://www.invoicesimple.com/wp-content/uploads/2018/06/Sample-Invoice-printable.png";

/// Sums `quantity * price` over the claimed lines and inserts the transaction
/// in the same statement, so the aggregate is never read back into memory.
const INSERT_TRANSACTION_SQL: &str = "
INSERT INTO transactions (id, discount, pre_discount_amount, final_amount, invoice, payment_method)
SELECT $1, 0, totals.amount, totals.amount, $2, $3
FROM (
    SELECT COALESCE(SUM(orders.quantity::BIGINT * products.price), 0)::BIGINT AS amount
    FROM orders
    JOIN products ON products.id = orders.product_id
    WHERE orders.user_id = $4
      AND orders.purchase_status = 'COMPLETED'
      AND orders.id = ANY($5)
) AS totals
RETURNING id, discount, pre_discount_amount, final_amount, invoice, payment_method, created_at, updated_at";

/// `products.stock` seen as a quantity-bounded counter. Each decrement is one
/// `UPDATE .. RETURNING stock`, so the database serializes concurrent writers
/// on the product row.
struct ProductStock<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl QuantityBounded for ProductStock<'_> {
    type Key = Uuid;
    type Error = DieselError;

    fn decrement(
        &mut self,
        product_id: &Uuid,
        quantity: i32,
    ) -> impl Future<Output = std::result::Result<i32, DieselError>> + Send {
        let product_id = *product_id;
        async move {
            diesel::update(products::table.find(product_id))
                .set((
                    products::stock.eq(products::stock - quantity),
                    products::updated_at.eq(diesel::dsl::now),
                ))
                .returning(products::stock)
                .get_result(&mut *self.conn)
                .await
        }
    }
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    db_pool: DbPool,
}

impl CheckoutOrchestrator {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }

    /// Settles `line_ids` for `user_id` paying with `payment_method`.
    ///
    /// All-or-nothing: on any error no write from this call is visible.
    pub async fn checkout(
        &self,
        user_id: Uuid,
        payment_method: &str,
        line_ids: &[String],
    ) -> Result<TransactionEntity> {
        let payment_method = require_non_empty(payment_method, "payment_method")?.to_string();
        let line_ids = parse_line_ids(line_ids)?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let transaction = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let claimed = claim_lines(conn, user_id, &line_ids).await?;
                    let transaction = insert_transaction(conn, user_id, &claimed, &payment_method)
                        .await?;
                    link_lines(conn, transaction.id, &claimed, line_ids.len()).await?;
                    decrement_stock(conn, user_id, &claimed).await?;

                    info!(
                        transaction_id = %transaction.id,
                        %user_id,
                        lines = claimed.len(),
                        final_amount = transaction.final_amount,
                        "Checkout committed"
                    );

                    Ok::<TransactionEntity, ServiceError>(transaction)
                })
            })
            .await?;

        Ok(transaction)
    }

    /// Fetches a transaction and the caller's lines it fulfilled.
    /// `Ok(None)` when no such transaction fulfilled any of the caller's lines.
    pub async fn get_transaction(
        &self,
        user_id: Uuid,
        transaction_id: &str,
    ) -> Result<Option<TransactionDetails>> {
        let transaction_id = parse_id(transaction_id, "transaction_id")?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let orders: Vec<OrderEntity> = order_transactions::table
            .inner_join(orders::table)
            .filter(order_transactions::transaction_id.eq(transaction_id))
            .filter(orders::user_id.eq(user_id))
            .select(OrderEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get transaction orders")?;

        if orders.is_empty() {
            return Ok(None);
        }

        let transaction = transactions::table
            .find(transaction_id)
            .select(TransactionEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get transaction")?;

        Ok(transaction.map(|transaction| TransactionDetails {
            transaction,
            orders,
        }))
    }
}

/// Flips the caller's `IN_CART` lines among `line_ids` to `COMPLETED`.
/// Row locks taken here also stop a second checkout of the same lines.
async fn claim_lines(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    line_ids: &[Uuid],
) -> Result<Vec<OrderEntity>> {
    let claimed: Vec<OrderEntity> = diesel::update(orders::table)
        .filter(orders::id.eq_any(line_ids))
        .filter(orders::user_id.eq(user_id))
        .filter(orders::purchase_status.eq(PurchaseStatus::InCart.as_str()))
        .set((
            orders::purchase_status.eq(PurchaseStatus::Completed.as_str()),
            orders::updated_at.eq(diesel::dsl::now),
        ))
        .returning(OrderEntity::as_returning())
        .get_results(conn)
        .await
        .context("Failed to claim cart lines")?;

    if claimed.is_empty() {
        warn!(%user_id, submitted = line_ids.len(), "No cart lines matched checkout");
        return Err(ServiceError::NoMatchingOrders);
    }

    Ok(claimed)
}

async fn insert_transaction(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    claimed: &[OrderEntity],
    payment_method: &str,
) -> Result<TransactionEntity> {
    let claimed_ids: Vec<Uuid> = claimed.iter().map(|line| line.id).collect();

    let transaction = diesel::sql_query(INSERT_TRANSACTION_SQL)
        .bind::<SqlUuid, _>(Uuid::new_v4())
        .bind::<Text, _>(PLACEHOLDER_INVOICE)
        .bind::<Text, _>(payment_method)
        .bind::<SqlUuid, _>(user_id)
        .bind::<Array<SqlUuid>, _>(claimed_ids)
        .get_result::<TransactionEntity>(conn)
        .await
        .context("Failed to create transaction")?;

    Ok(transaction)
}

/// Writes one link per claimed line. Anything other than one link per
/// submitted id means part of the submission was stale or foreign.
async fn link_lines(
    conn: &mut AsyncPgConnection,
    transaction_id: Uuid,
    claimed: &[OrderEntity],
    submitted: usize,
) -> Result<()> {
    let links: Vec<CreateOrderTransactionEntity> = claimed
        .iter()
        .map(|line| CreateOrderTransactionEntity {
            id: Uuid::new_v4(),
            order_id: line.id,
            transaction_id,
        })
        .collect();

    let written = diesel::insert_into(order_transactions::table)
        .values(links)
        .execute(conn)
        .await
        .context("Failed to link orders to transaction")?;

    if written != submitted {
        warn!(
            %transaction_id,
            written,
            expected = submitted,
            "Unexpected order link count, rolling back checkout"
        );
        return Err(ServiceError::IntegrityFailure {
            expected: submitted,
            written,
        });
    }

    Ok(())
}

async fn decrement_stock(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    claimed: &[OrderEntity],
) -> Result<()> {
    let mut claims: Vec<Claim<Uuid, Uuid>> = claimed
        .iter()
        .map(|line| Claim {
            tag: line.id,
            key: line.product_id,
            quantity: line.quantity,
        })
        .collect();
    // Lock product rows in a stable order so overlapping checkouts cannot deadlock.
    claims.sort_by_key(|claim| claim.key);

    let result = decrement_then_validate(&mut ProductStock { conn }, claims).await;

    if let Err(err) = &result {
        warn!(%user_id, "Checkout rolled back: {}", err);
    }

    Ok(result?)
}
