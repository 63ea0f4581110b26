use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

use crate::infra::{app_state::AppState, swagger};

pub mod infra;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

/// Migrations embedded into the binary which helps with streamlining image building process
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the application router with every route, the Swagger UI and shared state.
pub fn create_app(state: AppState) -> Router {
    let routes = routes::health::routes_with_openapi()
        .merge(routes::orders::routes_with_openapi())
        .merge(routes::transactions::routes_with_openapi());

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Isyana OrderService API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi);

    Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .with_state(state)
}
