use crate::{EngineError, ResultEngine, Transaction, transactions};
use sea_orm::prelude::*;

use super::Engine;

impl Engine {
    /// Look up one ledger row by its id.
    pub async fn transaction(&self, id: i64) -> ResultEngine<Transaction> {
        transactions::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {id}")))
            .and_then(Transaction::try_from)
    }
}
