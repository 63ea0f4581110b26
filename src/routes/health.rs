use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;

use crate::infra::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(health))
}

/// Reports whether the service can reach its database.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is healthy", body = StdResponse<String, String>)
    )
)]
async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    diesel::sql_query("SELECT 1")
        .execute(conn)
        .await
        .context("Database is not reachable")?;

    Ok(StdResponse {
        data: Some("ok"),
        message: Some("Service is healthy"),
    })
}
