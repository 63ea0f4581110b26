//! Shared PostgreSQL fixture for integration tests.
//!
//! One container is started per test binary and migrated once. Each test
//! gets its own pool and isolates itself by using fresh users and products,
//! so tests can run in parallel without truncating tables.
#![allow(dead_code)]

use std::sync::Arc;

use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use isyana_orderservice::{
    MIGRATIONS,
    infra::{
        config::DatabaseConfig,
        db::{self, DbPool},
    },
    models::CreateProductEntity,
    schema::{order_transactions, orders, products, transactions},
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Held for the whole test binary so the container is not dropped.
struct ContainerInfo {
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            db::run_migrations_blocking(MIGRATIONS, &connection_string)
                .await
                .unwrap();

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// A fresh pool for the calling test's runtime.
pub async fn test_pool() -> DbPool {
    let info = container_info().await;

    db::create_pool(&DatabaseConfig {
        url: info.connection_string.clone(),
        max_connections: 5,
    })
    .await
    .unwrap()
}

pub async fn seed_product(pool: &DbPool, price: i64, stock: i32) -> Uuid {
    let conn = &mut pool.get().await.unwrap();
    let id = Uuid::new_v4();

    diesel::insert_into(products::table)
        .values(CreateProductEntity {
            id,
            name: format!("product-{id}"),
            price,
            stock,
        })
        .execute(conn)
        .await
        .unwrap();

    id
}

pub async fn product_stock(pool: &DbPool, product_id: Uuid) -> i32 {
    let conn = &mut pool.get().await.unwrap();

    products::table
        .find(product_id)
        .select(products::stock)
        .first(conn)
        .await
        .unwrap()
}

pub async fn order_status(pool: &DbPool, order_id: Uuid) -> String {
    let conn = &mut pool.get().await.unwrap();

    orders::table
        .find(order_id)
        .select(orders::purchase_status)
        .first(conn)
        .await
        .unwrap()
}

pub async fn in_cart_rows(pool: &DbPool, user_id: Uuid, product_id: Uuid) -> i64 {
    let conn = &mut pool.get().await.unwrap();

    orders::table
        .filter(orders::user_id.eq(user_id))
        .filter(orders::product_id.eq(product_id))
        .filter(orders::purchase_status.eq("IN_CART"))
        .count()
        .get_result(conn)
        .await
        .unwrap()
}

pub async fn links_for_orders(pool: &DbPool, order_ids: &[Uuid]) -> i64 {
    let conn = &mut pool.get().await.unwrap();

    order_transactions::table
        .filter(order_transactions::order_id.eq_any(order_ids))
        .count()
        .get_result(conn)
        .await
        .unwrap()
}

pub async fn transactions_paid_with(pool: &DbPool, payment_method: &str) -> i64 {
    let conn = &mut pool.get().await.unwrap();

    transactions::table
        .filter(transactions::payment_method.eq(payment_method))
        .count()
        .get_result(conn)
        .await
        .unwrap()
}

/// A payment method no other test uses, so transaction rows can be counted per test.
pub fn unique_payment_method() -> String {
    format!("card-{}", Uuid::new_v4())
}
