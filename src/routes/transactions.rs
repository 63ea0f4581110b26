use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware,
    },
    models::{TransactionDetails, TransactionEntity},
    services::error::StockShortfall,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/transactions",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_transaction))
            .routes(utoipa_axum::routes!(get_transaction))
            .route_layer(axum::middleware::from_fn(middleware::user_identity)),
    )
}

#[derive(Deserialize, ToSchema)]
struct CreateTransactionReq {
    payment_method: String,
    order_id: Vec<String>,
}

/// Check out the given cart lines as a single transaction.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Transactions"],
    params(("x-user-id" = Uuid, Header, description = "Verified user id")),
    request_body = CreateTransactionReq,
    responses(
        (status = 201, description = "Created transaction successfully", body = StdResponse<TransactionEntity, String>),
        (status = 400, description = "Rejected; for insufficient stock `data` lists the offending lines", body = StdResponse<Vec<StockShortfall>, String>)
    )
)]
async fn create_transaction(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<CreateTransactionReq>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .checkout
        .checkout(user_id, &body.payment_method, &body.order_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(transaction),
            message: Some("Created transaction successfully"),
        },
    ))
}

/// Fetch a transaction together with the caller's lines it fulfilled.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Transactions"],
    params(
        ("id" = String, Path, description = "Transaction ID to fetch"),
        ("x-user-id" = Uuid, Header, description = "Verified user id")
    ),
    responses(
        (status = 200, description = "Get transaction successfully", body = StdResponse<TransactionDetails, String>)
    )
)]
async fn get_transaction(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.checkout.get_transaction(user_id, &id).await?;

    Ok(StdResponse {
        data: details,
        message: Some("Get transaction successfully"),
    })
}
