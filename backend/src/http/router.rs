//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::routes::{accounts, cars, comments, dealers, engagement, profile};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Unsupported methods on a known path answer 405 with a JSON body.
fn json_405(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(handlers::method_not_allowed)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Catalogue
        .route(cars::LIST_CARS, json_405(get(handlers::list_cars)))
        .route(cars::CAR_DETAIL, json_405(get(handlers::car_detail)))
        // Comments
        .route(
            comments::CAR_COMMENTS,
            json_405(get(handlers::list_comments).post(handlers::create_comment)),
        )
        .route(
            comments::CAR_COMMENT_DETAIL,
            json_405(
                get(handlers::get_comment)
                    .put(handlers::update_comment)
                    .patch(handlers::update_comment)
                    .delete(handlers::delete_comment),
            ),
        )
        // Favorites and likes
        .route(engagement::TOGGLE_FAVORITE, json_405(post(handlers::toggle_favorite)))
        .route(engagement::TOGGLE_COMMENT_LIKE, json_405(post(handlers::toggle_comment_like)))
        // Accounts
        .route(accounts::REGISTER, json_405(post(handlers::register)))
        .route(accounts::LOGIN, json_405(post(handlers::login)))
        .route(
            accounts::LOGOUT,
            json_405(post(handlers::logout).delete(handlers::logout)),
        )
        .route(profile::USER_PROFILE, json_405(get(handlers::user_profile)));

    let legacy = Router::new()
        .route(cars::LEGACY_GET_CARS, get(handlers::legacy_get_cars))
        .route(accounts::LEGACY_REGISTRATION, json_405(post(handlers::register)))
        .route(accounts::LEGACY_REGISTER, json_405(post(handlers::register)))
        .route(accounts::LEGACY_LOGIN, json_405(post(handlers::login)))
        .route(
            accounts::LEGACY_LOGOUT,
            json_405(post(handlers::logout).delete(handlers::logout)),
        )
        .route(dealers::GET_DEALERS, get(handlers::get_dealers))
        .route(dealers::GET_DEALERS_BY_STATE, get(handlers::get_dealers_by_state))
        .route(dealers::DEALER_DETAILS, get(handlers::dealer_details))
        .route(dealers::DEALER_REVIEWS, get(handlers::dealer_reviews))
        .route(dealers::ADD_REVIEW, json_405(post(handlers::add_review)));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api)
        .merge(legacy)
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
