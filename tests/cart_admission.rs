//! Cart admission against a real PostgreSQL.
//!
//! ```bash
//! cargo test --test cart_admission
//! ```

mod common;

use isyana_orderservice::services::{
    cart::{AddToCart, CartAdmission, CartLineFields, MAX_CART_LINES},
    error::ServiceError,
};
use uuid::Uuid;

use common::{in_cart_rows, seed_product, test_pool};

fn add(product_id: Uuid, quantity: i32) -> AddToCart {
    AddToCart {
        product_id: product_id.to_string(),
        quantity,
        note: None,
    }
}

fn fields(quantity: i32) -> CartLineFields {
    CartLineFields {
        quantity,
        note: None,
        purchase_source: None,
        purchase_status: None,
    }
}

#[tokio::test]
async fn add_to_cart_creates_in_cart_line() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 1_500, 10).await;

    let line = carts
        .add_to_cart(
            user_id,
            AddToCart {
                product_id: product_id.to_string(),
                quantity: 2,
                note: Some("gift wrap".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(line.user_id, user_id);
    assert_eq!(line.product_id, product_id);
    assert_eq!(line.quantity, 2);
    assert_eq!(line.note.as_deref(), Some("gift wrap"));
    assert_eq!(line.purchase_source, "cart");
    assert_eq!(line.purchase_status, "IN_CART");
}

#[tokio::test]
async fn re_adding_a_product_updates_quantity_in_place() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 900, 10).await;

    let first = carts.add_to_cart(user_id, add(product_id, 2)).await.unwrap();
    let second = carts.add_to_cart(user_id, add(product_id, 5)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 5);
    assert_eq!(in_cart_rows(&pool, user_id, product_id).await, 1);
}

#[tokio::test]
async fn twentieth_line_is_admitted_and_twenty_first_is_rejected() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();

    for _ in 0..MAX_CART_LINES {
        let product_id = seed_product(&pool, 100, 5).await;
        carts.add_to_cart(user_id, add(product_id, 1)).await.unwrap();
    }
    assert_eq!(
        carts.list_cart_lines(user_id).await.unwrap().len() as i64,
        MAX_CART_LINES
    );

    let product_id = seed_product(&pool, 100, 5).await;
    let err = carts
        .add_to_cart(user_id, add(product_id, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::CartLimitExceeded { limit: 20 }));
    assert_eq!(in_cart_rows(&pool, user_id, product_id).await, 0);
}

#[tokio::test]
async fn quantity_above_stock_is_rejected_and_line_is_kept() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 700, 5).await;

    let line = carts.add_to_cart(user_id, add(product_id, 3)).await.unwrap();

    let err = carts
        .add_to_cart(user_id, add(product_id, 10))
        .await
        .unwrap_err();
    match err {
        ServiceError::InsufficientStock(details) => {
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].order_id, None);
            assert_eq!(details[0].requested_quantity, 10);
            assert_eq!(details[0].product_stock, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    let kept = carts
        .get_cart_line(user_id, &line.id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.quantity, 3);
}

#[tokio::test]
async fn malformed_input_is_rejected_before_touching_the_store() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 100, 5).await;

    let err = carts
        .add_to_cart(
            user_id,
            AddToCart {
                product_id: "product-1".into(),
                quantity: 1,
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    for quantity in [0, -1] {
        let err = carts
            .add_to_cart(user_id, add(product_id, quantity))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    assert_eq!(in_cart_rows(&pool, user_id, product_id).await, 0);
}

#[tokio::test]
async fn unknown_product_is_invalid_input() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());

    let err = carts
        .add_to_cart(Uuid::new_v4(), add(Uuid::new_v4(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn update_overwrites_fields_and_rechecks_stock() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 100, 4).await;
    let line = carts.add_to_cart(user_id, add(product_id, 1)).await.unwrap();
    let line_id = line.id.to_string();

    let updated = carts
        .update_cart_line(
            user_id,
            &line_id,
            CartLineFields {
                quantity: 4,
                note: Some("leave at door".into()),
                purchase_source: Some("buy_now".into()),
                purchase_status: Some("IN_CART".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, line.id);
    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.note.as_deref(), Some("leave at door"));
    assert_eq!(updated.purchase_source, "buy_now");

    let err = carts
        .update_cart_line(user_id, &line_id, fields(5))
        .await
        .unwrap_err();
    match err {
        ServiceError::InsufficientStock(details) => {
            assert_eq!(details[0].order_id, Some(line.id));
            assert_eq!(details[0].product_stock, 4);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
}

#[tokio::test]
async fn update_clears_omitted_note_and_resets_source() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 100, 4).await;
    let line = carts
        .add_to_cart(
            user_id,
            AddToCart {
                product_id: product_id.to_string(),
                quantity: 1,
                note: Some("gift".into()),
            },
        )
        .await
        .unwrap();
    let line_id = line.id.to_string();

    carts
        .update_cart_line(
            user_id,
            &line_id,
            CartLineFields {
                purchase_source: Some("buy_now".into()),
                ..fields(2)
            },
        )
        .await
        .unwrap();

    let updated = carts
        .update_cart_line(user_id, &line_id, fields(3))
        .await
        .unwrap();

    assert_eq!(updated.note, None);
    assert_eq!(updated.purchase_source, "cart");
    assert_eq!(updated.purchase_status, "IN_CART");
    assert_eq!(updated.quantity, 3);
}

#[tokio::test]
async fn update_cannot_complete_a_line() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let user_id = Uuid::new_v4();
    let product_id = seed_product(&pool, 100, 4).await;
    let line = carts.add_to_cart(user_id, add(product_id, 1)).await.unwrap();

    for status in ["COMPLETED", "SHIPPED"] {
        let err = carts
            .update_cart_line(
                user_id,
                &line.id.to_string(),
                CartLineFields {
                    purchase_status: Some(status.into()),
                    ..fields(1)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}

#[tokio::test]
async fn update_of_foreign_or_missing_line_is_not_found() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let owner = Uuid::new_v4();
    let product_id = seed_product(&pool, 100, 4).await;
    let line = carts.add_to_cart(owner, add(product_id, 1)).await.unwrap();

    let err = carts
        .update_cart_line(Uuid::new_v4(), &line.id.to_string(), fields(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    let err = carts
        .update_cart_line(owner, &Uuid::new_v4().to_string(), fields(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    let err = carts
        .update_cart_line(owner, "42", fields(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn reads_are_scoped_to_the_user_and_absence_is_not_an_error() {
    let pool = test_pool().await;
    let carts = CartAdmission::new(pool.clone());
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let product_id = seed_product(&pool, 100, 4).await;
    let line = carts.add_to_cart(owner, add(product_id, 1)).await.unwrap();

    let lines = carts.list_cart_lines(owner).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id, line.id);

    assert!(carts.list_cart_lines(stranger).await.unwrap().is_empty());
    assert!(
        carts
            .get_cart_line(stranger, &line.id.to_string())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        carts
            .get_cart_line(owner, &Uuid::new_v4().to_string())
            .await
            .unwrap()
            .is_none()
    );
}
