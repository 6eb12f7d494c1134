//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::time::Duration;

use super::auth::{clear_session_cookie, session_cookie, Auth};
use super::dto::{
    parse_json_body, CatalogueQuery, CommentBody, HealthResponse, LoginRequest, RegisterRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    AuthResponse, CarDetailResponse, CarId, CarListResponse, CommentId, CommentResponse,
    CommentTreeResponse, FavoriteToggle, LikeToggle, ProfileResponse,
};
use crate::routes::accounts::StatusResponse;
use crate::routes::cars::LegacyCarModelsResponse;
use crate::routes::comments::CommentDeleted;
use crate::routes::dealers::{DealerResponse, DealerReviewsResponse, DealersResponse, LegacyStatus};
use crate::services::{self, accounts, catalogue, comments, dealers, profile, seed};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Path ids that are not integers do not name anything.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Not found".to_string()))
}

async fn ensure_catalogue(state: &AppState) -> Result<(), AppError> {
    seed::ensure_catalogue(state.repository.as_ref(), &state.catalogue_checked).await?;
    Ok(())
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// =============================================================================
// Catalogue
// =============================================================================

/// GET /api/cars/
pub async fn list_cars(
    State(state): State<AppState>,
    auth: Auth,
    Query(query): Query<CatalogueQuery>,
) -> HandlerResult<CarListResponse> {
    ensure_catalogue(&state).await?;
    let viewer = auth.user.as_ref().map(|u| u.id);
    let response = catalogue::list_cars(state.repository.as_ref(), &query, viewer).await?;
    Ok(Json(response))
}

/// GET /api/cars/{car_id}/
pub async fn car_detail(
    State(state): State<AppState>,
    auth: Auth,
    Path(car_id): Path<String>,
) -> HandlerResult<CarDetailResponse> {
    let car_id = CarId::new(parse_id(&car_id)?);
    ensure_catalogue(&state).await?;
    let viewer = auth.user.as_ref().map(|u| u.id);
    let response = catalogue::car_detail(state.repository.as_ref(), car_id, viewer).await?;
    Ok(Json(response))
}

/// GET /djangoapp/get_cars
pub async fn legacy_get_cars(State(state): State<AppState>) -> HandlerResult<LegacyCarModelsResponse> {
    ensure_catalogue(&state).await?;
    Ok(Json(catalogue::legacy_car_models(state.repository.as_ref()).await?))
}

// =============================================================================
// Comments
// =============================================================================

/// GET /api/cars/{car_id}/comments/
pub async fn list_comments(
    State(state): State<AppState>,
    auth: Auth,
    Path(car_id): Path<String>,
) -> HandlerResult<CommentTreeResponse> {
    let car_id = CarId::new(parse_id(&car_id)?);
    ensure_catalogue(&state).await?;
    let response = comments::list_comments(state.repository.as_ref(), car_id, auth.viewer()).await?;
    Ok(Json(response))
}

/// POST /api/cars/{car_id}/comments/
pub async fn create_comment(
    State(state): State<AppState>,
    auth: Auth,
    Path(car_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let car_id = CarId::new(parse_id(&car_id)?);
    ensure_catalogue(&state).await?;
    let repo = state.repository.as_ref();

    comments::ensure_car_exists(repo, car_id).await?;
    let user = auth.require()?;
    let body: CommentBody = parse_json_body(&body)?;
    let parent_id = body.parent_comment_id()?;

    let comment =
        comments::create_comment(repo, car_id, user, body.content.as_deref(), parent_id).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}

fn comment_path(ids: &(String, String)) -> Result<(CarId, CommentId), AppError> {
    Ok((
        CarId::new(parse_id(&ids.0)?),
        CommentId::new(parse_id(&ids.1)?),
    ))
}

/// GET /api/cars/{car_id}/comments/{comment_id}/
pub async fn get_comment(
    State(state): State<AppState>,
    auth: Auth,
    Path(ids): Path<(String, String)>,
) -> HandlerResult<CommentResponse> {
    let (car_id, comment_id) = comment_path(&ids)?;
    let comment =
        comments::comment_detail(state.repository.as_ref(), car_id, comment_id, auth.viewer())
            .await?;
    Ok(Json(CommentResponse { comment }))
}

/// PUT|PATCH /api/cars/{car_id}/comments/{comment_id}/
pub async fn update_comment(
    State(state): State<AppState>,
    auth: Auth,
    Path(ids): Path<(String, String)>,
    body: Bytes,
) -> HandlerResult<CommentResponse> {
    let (car_id, comment_id) = comment_path(&ids)?;
    let repo = state.repository.as_ref();

    let record = comments::find_comment(repo, car_id, comment_id).await?;
    let viewer = auth.require()?.viewer();
    comments::authorize_edit(&record, viewer, "edit")?;
    let body: CommentBody = parse_json_body(&body)?;

    let comment = comments::update_comment(repo, record, viewer, body.content.as_deref()).await?;
    Ok(Json(CommentResponse { comment }))
}

/// DELETE /api/cars/{car_id}/comments/{comment_id}/
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: Auth,
    Path(ids): Path<(String, String)>,
) -> HandlerResult<CommentDeleted> {
    let (car_id, comment_id) = comment_path(&ids)?;
    let repo = state.repository.as_ref();

    let record = comments::find_comment(repo, car_id, comment_id).await?;
    let viewer = auth.require()?.viewer();
    Ok(Json(comments::delete_comment(repo, &record, viewer).await?))
}

// =============================================================================
// Favorites and likes
// =============================================================================

/// POST /api/cars/{car_id}/favorite/
pub async fn toggle_favorite(
    State(state): State<AppState>,
    auth: Auth,
    Path(car_id): Path<String>,
) -> HandlerResult<FavoriteToggle> {
    let car_id = CarId::new(parse_id(&car_id)?);
    let user = auth.require()?;
    let toggle = services::toggle_favorite(state.repository.as_ref(), user.id, car_id).await?;
    Ok(Json(toggle))
}

/// POST /api/comments/{comment_id}/like/
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    auth: Auth,
    Path(comment_id): Path<String>,
) -> HandlerResult<LikeToggle> {
    let comment_id = CommentId::new(parse_id(&comment_id)?);
    let user = auth.require()?;
    let toggle =
        services::toggle_comment_like(state.repository.as_ref(), user.id, comment_id).await?;
    Ok(Json(toggle))
}

// =============================================================================
// Accounts
// =============================================================================

fn with_session_cookie(status: StatusCode, auth: AuthResponse, max_age: Duration) -> Response {
    let cookie = session_cookie(&auth.token, max_age);
    (status, [(header::SET_COOKIE, cookie)], Json(auth)).into_response()
}

/// POST /api/register/
pub async fn register(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let request: RegisterRequest = parse_json_body(&body)?;
    let auth = accounts::register(state.repository.as_ref(), &request, state.session_ttl).await?;
    Ok(with_session_cookie(StatusCode::CREATED, auth, state.session_ttl))
}

/// POST /api/login/
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let request: LoginRequest = parse_json_body(&body)?;
    let auth = accounts::login(state.repository.as_ref(), &request, state.session_ttl).await?;
    Ok(with_session_cookie(StatusCode::OK, auth, state.session_ttl))
}

/// POST|DELETE /api/logout/
pub async fn logout(State(state): State<AppState>, auth: Auth) -> Result<Response, AppError> {
    let status: StatusResponse =
        accounts::logout(state.repository.as_ref(), auth.token.as_deref()).await?;
    Ok(([(header::SET_COOKIE, clear_session_cookie())], Json(status)).into_response())
}

/// GET /api/user/profile/
pub async fn user_profile(State(state): State<AppState>, auth: Auth) -> HandlerResult<ProfileResponse> {
    let user = auth.require()?;
    Ok(Json(profile::user_profile(state.repository.as_ref(), user).await?))
}

// =============================================================================
// Legacy dealer proxy
// =============================================================================

/// GET /djangoapp/get_dealers
pub async fn get_dealers(State(state): State<AppState>) -> HandlerResult<DealersResponse> {
    Ok(Json(dealers::get_dealers(state.dealers.as_ref(), None).await?))
}

/// GET /djangoapp/get_dealers/{state}
pub async fn get_dealers_by_state(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> HandlerResult<DealersResponse> {
    Ok(Json(
        dealers::get_dealers(state.dealers.as_ref(), Some(&region)).await?,
    ))
}

/// GET /djangoapp/dealer/{dealer_id}
pub async fn dealer_details(
    State(state): State<AppState>,
    Path(dealer_id): Path<String>,
) -> HandlerResult<DealerResponse> {
    let dealer_id = parse_id(&dealer_id)?;
    Ok(Json(
        dealers::dealer_details(state.dealers.as_ref(), dealer_id).await?,
    ))
}

/// GET /djangoapp/reviews/dealer/{dealer_id}
pub async fn dealer_reviews(
    State(state): State<AppState>,
    Path(dealer_id): Path<String>,
) -> HandlerResult<DealerReviewsResponse> {
    let dealer_id = parse_id(&dealer_id)?;
    Ok(Json(
        dealers::dealer_reviews(state.dealers.as_ref(), dealer_id).await?,
    ))
}

fn legacy_response(status: LegacyStatus) -> Response {
    let code = StatusCode::from_u16(status.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(status)).into_response()
}

/// POST /djangoapp/add_review
pub async fn add_review(State(state): State<AppState>, auth: Auth, body: Bytes) -> Response {
    if auth.user.is_none() {
        return legacy_response(LegacyStatus::new(403, "Unauthorized"));
    }
    let review: Value = match parse_json_body(&body) {
        Ok(review) => review,
        Err(_) => return legacy_response(LegacyStatus::new(400, "Invalid payload")),
    };
    legacy_response(dealers::add_review(state.dealers.as_ref(), &review).await)
}
