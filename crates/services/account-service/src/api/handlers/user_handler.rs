//! User handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use validator::Validate;

use common::AppResult;
use domain::UserResponse;

use super::account_handler::AccountResponse;
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;

/// User registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/:id", get(get_user))
        .route("/:id/accounts", get(list_user_accounts))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .create_user(&payload.username, &payload.email)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// List the accounts owned by a user
pub async fn list_user_accounts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<AccountResponse>>> {
    let accounts = state.account_service.list_accounts(id).await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}
