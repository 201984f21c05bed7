use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SYSTEM AUTH ROUTES (PUBLIC)
        // ========================================
        .route(
            "/api/system/auth/login",
            post(system::handlers::auth::login),
        )
        // System auth routes (protected)
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_user)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // BUSINESS ROUTES (protected)
        // ========================================
        // A001 Product specification handlers
        .route(
            "/api/product_specification/search",
            get(handlers::a001_product_specification::search)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/product_specification",
            post(handlers::a001_product_specification::save)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/product_specification/:id",
            get(handlers::a001_product_specification::get_by_id)
                .delete(handlers::a001_product_specification::delete)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/product_specification/:id/export-sheet",
            post(handlers::a001_product_specification::export_sheet)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
}
