use api_types::transaction::TransactionView;
use axum::{
    Json,
    extract::{Path, State},
};
use engine::Transaction;

use crate::{ServerError, parse_id, server::ServerState};

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        amount: tx.amount.to_string(),
        amount_minor: tx.amount.minor(),
        tx_type: tx.kind.as_str().to_string(),
        detail: tx.detail,
        created_at: tx.created_at,
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionView>, ServerError> {
    let id = parse_id(&id, "transaction")?;
    let tx = state.deadline(state.engine.transaction(id)).await?;
    Ok(Json(transaction_view(tx)))
}
