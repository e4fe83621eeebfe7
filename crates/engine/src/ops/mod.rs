use std::future::Future;

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr,
    IsolationLevel, TransactionTrait,
};

use crate::{EngineError, ResultEngine, util::is_serialization_failure};

mod accounts;
mod transactions;
mod users;

/// How many times a serializable unit is attempted before a conflict is
/// reported to the caller.
const SERIALIZABLE_ATTEMPTS: u32 = 3;

/// Run a block inside a DB transaction, committing on success and rolling back
/// on error.
///
/// The `serializable` form opens the transaction with serializable isolation
/// and read-write access (see [`Engine::begin_serializable`]).
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
    ($self:expr, serializable |$tx:ident| $body:expr) => {{
        let $tx = $self.begin_serializable().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point for every user, account and transaction operation.
///
/// The engine keeps no state besides the connection pool: every operation is
/// a single store transaction, and concurrent operations are isolated by the
/// store alone.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Begin a read-write transaction with serializable isolation.
    ///
    /// SQLite transactions are serializable already and reject explicit
    /// isolation settings, so they are opened with the defaults.
    async fn begin_serializable(&self) -> Result<DatabaseTransaction, DbErr> {
        match self.database.get_database_backend() {
            DatabaseBackend::Sqlite => self.database.begin().await,
            _ => {
                self.database
                    .begin_with_config(
                        Some(IsolationLevel::Serializable),
                        Some(AccessMode::ReadWrite),
                    )
                    .await
            }
        }
    }
}

/// Run `op` again when the store aborts it with a serialization conflict.
///
/// Every attempt must open its own transaction; nothing else is retried.
pub(crate) async fn retry_on_conflict<T, F, Fut>(label: &str, mut op: F) -> ResultEngine<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ResultEngine<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(EngineError::Database(err))
                if attempt < SERIALIZABLE_ATTEMPTS && is_serialization_failure(&err) =>
            {
                tracing::debug!(attempt, "{label}: serialization conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use sea_orm::RuntimeErr;

    use super::*;

    #[tokio::test]
    async fn serializable_transaction_opens_on_sqlite() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        let tx = engine.begin_serializable().await.unwrap();
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry_on_conflict("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, EngineError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_does_not_repeat_domain_errors() {
        let calls = AtomicU32::new(0);
        let result: ResultEngine<()> = retry_on_conflict("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::InsufficientBalance("x".to_string()))
        })
        .await;
        assert!(matches!(result, Err(EngineError::InsufficientBalance(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_does_not_repeat_other_store_errors() {
        let calls = AtomicU32::new(0);
        let result: ResultEngine<()> = retry_on_conflict("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Database(DbErr::Exec(RuntimeErr::Internal(
                "disk full".to_string(),
            ))))
        })
        .await;
        assert!(matches!(result, Err(EngineError::Database(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
