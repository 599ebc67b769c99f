//! Account provisioning endpoint for the identity service.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Account, AccountId, RegisterAccount, Role};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterAccountRequest {
    pub role: Role,
    pub name: String,
    pub company_name: Option<String>,
    pub email: String,
    pub credential_hash: String,
}

/// An account without its credential hash.
#[derive(Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub role: Role,
    pub name: String,
    pub company_name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
            name: account.name,
            company_name: account.company_name,
            email: account.email,
            created_at: account.created_at,
        }
    }
}

/// POST /accounts — register an account.
#[tracing::instrument(skip(state, payload))]
pub async fn register<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(req) = payload?;
    let account = state
        .accounts
        .register(RegisterAccount {
            role: req.role,
            name: req.name,
            company_name: req.company_name,
            email: req.email,
            credential_hash: req.credential_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}
