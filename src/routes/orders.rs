use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware,
    },
    models::OrderEntity,
    services::cart::{AddToCart, CartLineFields},
};

/// Cart routes. Every route requires the caller's verified user id.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(add_to_cart))
            .routes(utoipa_axum::routes!(list_cart_lines))
            .routes(utoipa_axum::routes!(get_cart_line))
            .routes(utoipa_axum::routes!(update_cart_line))
            .route_layer(axum::middleware::from_fn(middleware::user_identity)),
    )
}

/// Add a product to the caller's cart, or replace its quantity if already there.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    params(("x-user-id" = Uuid, Header, description = "Verified user id")),
    request_body = AddToCart,
    responses(
        (status = 201, description = "Added to cart successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<AddToCart>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.carts.add_to_cart(user_id, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(order),
            message: Some("Added to cart successfully"),
        },
    ))
}

/// Fetch the caller's cart lines.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    params(("x-user-id" = Uuid, Header, description = "Verified user id")),
    responses(
        (status = 200, description = "List cart lines", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn list_cart_lines(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.carts.list_cart_lines(user_id).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get cart lines successfully"),
    })
}

/// Fetch one of the caller's order lines. `data` is null when it does not exist.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    params(
        ("id" = String, Path, description = "Order line ID to fetch"),
        ("x-user-id" = Uuid, Header, description = "Verified user id")
    ),
    responses(
        (status = 200, description = "Get order line successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn get_cart_line(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.carts.get_cart_line(user_id, &id).await?;

    Ok(StdResponse {
        data: order,
        message: Some("Get order line successfully"),
    })
}

/// Overwrite a line that is still in the caller's cart.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Orders"],
    params(
        ("id" = String, Path, description = "Order line ID to update"),
        ("x-user-id" = Uuid, Header, description = "Verified user id")
    ),
    request_body = CartLineFields,
    responses(
        (status = 200, description = "Updated order line successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn update_cart_line(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<CartLineFields>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.carts.update_cart_line(user_id, &id, body).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Updated order line successfully"),
    })
}
