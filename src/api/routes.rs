//! API Routes
//!
//! HTTP endpoint definitions. Field validation for inbound payloads (name
//! shape, email pattern, description bound) lives here, in front of the
//! facade; every invariant-preserving rule stays below it.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, DomainError, TransferRecord, TransferStatus, MAX_DESCRIPTION_LEN};
use crate::error::AppError;
use crate::wallet::WalletFacade;

pub type WalletState = Arc<WalletFacade>;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    /// Decimal string; the configured default applies when omitted
    #[serde(default)]
    pub initial_balance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            balance: account.balance.value(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account_id: Uuid,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender_id: String,
    pub recipient_id: String,
    /// Decimal string, e.g. "30.00"
    pub amount: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: Decimal,
    pub sender_balance: Decimal,
    pub recipient_balance: Decimal,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferSummary {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: Decimal,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TransferRecord> for TransferSummary {
    fn from(record: TransferRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            recipient_id: record.recipient_id,
            amount: record.amount.value(),
            status: record.status,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub account_id: Uuid,
    pub entries: Vec<TransferSummary>,
}

// =========================================================================
// Validation helpers
// =========================================================================

/// Basic address shape: non-empty local part, domain with a dot.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<WalletState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts", get(list_accounts))
        .route("/accounts/:account_id/balance", get(get_balance))
        .route("/accounts/:account_id/history", get(get_history))
        .route("/transfers", post(transfer))
}

// =========================================================================
// POST /accounts
// =========================================================================

async fn create_account(
    State(wallet): State<WalletState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("name must not be empty".to_string()));
    }
    if !is_valid_email(&request.email) {
        return Err(AppError::InvalidRequest(format!(
            "invalid email address: {}",
            request.email
        )));
    }

    let initial_balance = request
        .initial_balance
        .as_deref()
        .map(|raw| {
            raw.parse::<Decimal>()
                .map_err(|_| AppError::InvalidRequest(format!("invalid initial balance: {raw}")))
        })
        .transpose()?;

    let account = wallet
        .create_account(name, &request.email, initial_balance)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

// =========================================================================
// GET /accounts
// =========================================================================

async fn list_accounts(
    State(wallet): State<WalletState>,
) -> Result<Json<AccountListResponse>, AppError> {
    let accounts: Vec<AccountResponse> = wallet
        .list_accounts()
        .await?
        .into_iter()
        .map(AccountResponse::from)
        .collect();
    let total = accounts.len();

    Ok(Json(AccountListResponse { accounts, total }))
}

// =========================================================================
// GET /accounts/:account_id/balance
// =========================================================================

async fn get_balance(
    State(wallet): State<WalletState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = wallet.get_balance(&account_id).await?;

    Ok(Json(BalanceResponse {
        account_id: account.id,
        balance: account.balance.value(),
    }))
}

// =========================================================================
// GET /accounts/:account_id/history
// =========================================================================

async fn get_history(
    State(wallet): State<WalletState>,
    Path(account_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let records = wallet.get_history(&account_id, query.limit).await?;
    // The facade has already established the account exists
    let account_id = Uuid::parse_str(&account_id)
        .map_err(|_| DomainError::InvalidIdentifier(account_id.clone()))?;

    Ok(Json(HistoryResponse {
        account_id,
        entries: records.into_iter().map(TransferSummary::from).collect(),
    }))
}

// =========================================================================
// POST /transfers
// =========================================================================

async fn transfer(
    State(wallet): State<WalletState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    if let Some(description) = &request.description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::InvalidRequest(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
    }

    let amount: Decimal = request
        .amount
        .parse()
        .map_err(|_| DomainError::InvalidAmount(format!("not a number: {}", request.amount)))?;

    let outcome = wallet
        .transfer(
            &request.sender_id,
            &request.recipient_id,
            amount,
            request.description,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transfer_id: outcome.record.id,
            sender_id: outcome.record.sender_id,
            recipient_id: outcome.record.recipient_id,
            amount: outcome.record.amount.value(),
            sender_balance: outcome.sender_balance,
            recipient_balance: outcome.recipient_balance,
            status: outcome.record.status,
            created_at: outcome.record.created_at,
        }),
    ))
}
