//! Account handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use common::AppResult;
use domain::{AccountView, CreateAccount};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;

/// Account creation request.
///
/// `account_number` may be omitted or blank to have one generated.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(range(min = 1, message = "User id must be positive"))]
    pub user_id: i64,
    #[validate(length(max = 20, message = "Account number must be at most 20 characters"))]
    pub account_number: Option<String>,
    /// Decimal string such as `"500.00"`; JSON numbers are rejected
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub balance: Option<Decimal>,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}

impl From<CreateAccountRequest> for CreateAccount {
    fn from(request: CreateAccountRequest) -> Self {
        Self {
            user_id: request.user_id,
            account_number: request.account_number,
            balance: request.balance,
            currency: request.currency,
        }
    }
}

/// Account with its owner's username
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub account_number: String,
    /// Serialized as a decimal string to keep exact precision
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub username: String,
}

impl From<AccountView> for AccountResponse {
    fn from(view: AccountView) -> Self {
        Self {
            id: view.id,
            account_number: view.account_number,
            balance: view.balance,
            currency: view.currency,
            created_at: view.created_at,
            user_id: view.user_id,
            username: view.username,
        }
    }
}

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_account))
        .route("/:account_number/balance", get(get_balance))
}

/// Open an account for an existing user
pub async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let account = state
        .account_service
        .create_account(payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Balance snapshot for an account number
pub async fn get_balance(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.account_service.get_balance(&account_number).await?;
    Ok(Json(AccountResponse::from(account)))
}
