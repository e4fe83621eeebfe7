//! Account API endpoints

use api_types::{
    account::{AccountNew, AccountView, Balance},
    transaction::TransactionView,
};
use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
};
use engine::Account;

use crate::{ServerError, parse_id, server::ServerState, transactions::transaction_view};

pub(crate) fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        user_id: account.user_id,
        id_number: account.id_number,
        balance: account.balance.to_string(),
        balance_minor: account.balance.minor(),
        created_at: account.created_at,
    }
}

/// Handle requests for opening a new account. The body is a form with
/// `user_id`.
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Form<AccountNew>, FormRejection>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let Form(payload) = payload?;
    let user_id = parse_id(payload.user_id.trim(), "user")?;

    let account = state
        .deadline(state.engine.create_account(user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.deadline(state.engine.accounts()).await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id_number): Path<String>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .deadline(state.engine.account_by_id_number(&id_number))
        .await?;
    Ok(Json(account_view(account)))
}

pub async fn balance(
    State(state): State<ServerState>,
    Path(id_number): Path<String>,
) -> Result<Json<Balance>, ServerError> {
    let balance = state
        .deadline(state.engine.account_balance(&id_number))
        .await?;
    Ok(Json(Balance {
        balance: balance.to_string(),
        balance_minor: balance.minor(),
    }))
}

/// Handle requests for an account's ledger, oldest first.
pub async fn transactions(
    State(state): State<ServerState>,
    Path(id_number): Path<String>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let ledger = state
        .stream_deadline(state.engine.account_transactions(&id_number))
        .await?;
    Ok(Json(ledger.into_iter().map(transaction_view).collect()))
}
