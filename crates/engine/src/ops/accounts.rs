use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Account, DepositCmd, EngineError, Money, Receipt, ResultEngine, Transaction, TransactionKind,
    WithdrawCmd,
    accounts::{self, generate_id_number},
    transactions, users,
};

use super::{Engine, retry_on_conflict, with_tx};

/// Attempts at drawing an `id_number` that is not taken yet.
const ID_NUMBER_ATTEMPTS: usize = 8;

impl Engine {
    /// Open a new account with a zero balance for an existing user.
    pub async fn create_account(&self, user_id: i64) -> ResultEngine<Account> {
        let created_at = Utc::now();
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            let id_number = unused_id_number(&db_tx).await?;
            let model = accounts::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                id_number: ActiveValue::Set(id_number),
                balance_minor: ActiveValue::Set(0),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;

            tracing::debug!(user_id, id_number = %model.id_number, "opened account");
            Ok(Account::from(model))
        })
    }

    pub async fn account_by_id_number(&self, id_number: &str) -> ResultEngine<Account> {
        find_by_id_number(&self.database, id_number)
            .await?
            .map(Account::from)
            .ok_or_else(|| EngineError::AccountNotFound(id_number.to_string()))
    }

    pub async fn account_balance(&self, id_number: &str) -> ResultEngine<Money> {
        Ok(self.account_by_id_number(id_number).await?.balance)
    }

    pub async fn accounts(&self) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Ledger of one account, oldest first.
    ///
    /// An unknown `id_number` fails with [`EngineError::AccountNotFound`]
    /// instead of returning an empty list.
    pub async fn account_transactions(&self, id_number: &str) -> ResultEngine<Vec<Transaction>> {
        let account = find_by_id_number(&self.database, id_number)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(id_number.to_string()))?;

        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account.id))
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Take `amount` out of the account identified by `id_number`.
    ///
    /// The balance check and the debit are a single conditional update, so
    /// two concurrent withdrawals can never both pass the check against the
    /// same balance.
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<Receipt> {
        let amount = cmd.amount.ensure_positive()?;
        retry_on_conflict("withdraw", || self.try_withdraw(&cmd, amount)).await
    }

    async fn try_withdraw(&self, cmd: &WithdrawCmd, amount: Money) -> ResultEngine<Receipt> {
        let created_at = Utc::now();
        with_tx!(self, serializable |db_tx| {
            let updated = accounts::Entity::update_many()
                .col_expr(
                    accounts::Column::BalanceMinor,
                    Expr::col(accounts::Column::BalanceMinor).sub(amount.minor()),
                )
                .filter(accounts::Column::IdNumber.eq(cmd.id_number.as_str()))
                .filter(accounts::Column::BalanceMinor.gte(amount.minor()))
                .exec(&db_tx)
                .await?;

            let account = find_by_id_number(&db_tx, &cmd.id_number)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(cmd.id_number.clone()))?;
            if updated.rows_affected == 0 {
                return Err(EngineError::InsufficientBalance(format!(
                    "account {} holds {}, requested {amount}",
                    account.id_number,
                    Money::new(account.balance_minor)
                )));
            }

            let row = transactions::ActiveModel::record(
                account.id,
                TransactionKind::Withdraw,
                amount,
                &cmd.detail,
                created_at,
            )
            .insert(&db_tx)
            .await?;

            Ok(Receipt {
                transaction_id: row.id,
                balance: Money::new(account.balance_minor),
            })
        })
    }

    /// Add `amount` to the account with internal id `cmd.account_id`.
    pub async fn deposit(&self, cmd: DepositCmd) -> ResultEngine<Receipt> {
        let amount = cmd.amount.ensure_positive()?;
        retry_on_conflict("deposit", || self.try_deposit(&cmd, amount)).await
    }

    async fn try_deposit(&self, cmd: &DepositCmd, amount: Money) -> ResultEngine<Receipt> {
        let created_at = Utc::now();
        with_tx!(self, serializable |db_tx| {
            let updated = accounts::Entity::update_many()
                .col_expr(
                    accounts::Column::BalanceMinor,
                    Expr::col(accounts::Column::BalanceMinor).add(amount.minor()),
                )
                .filter(accounts::Column::Id.eq(cmd.account_id))
                .filter(accounts::Column::BalanceMinor.lte(i64::MAX - amount.minor()))
                .exec(&db_tx)
                .await?;

            let account = accounts::Entity::find_by_id(cmd.account_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(cmd.account_id.to_string()))?;
            if updated.rows_affected == 0 {
                return Err(EngineError::InvalidAmount(format!(
                    "depositing {amount} would overflow the balance of account {}",
                    account.id_number
                )));
            }

            let row = transactions::ActiveModel::record(
                account.id,
                TransactionKind::Deposit,
                amount,
                &cmd.detail,
                created_at,
            )
            .insert(&db_tx)
            .await?;

            Ok(Receipt {
                transaction_id: row.id,
                balance: Money::new(account.balance_minor),
            })
        })
    }
}

async fn find_by_id_number<C: ConnectionTrait>(
    db: &C,
    id_number: &str,
) -> ResultEngine<Option<accounts::Model>> {
    Ok(accounts::Entity::find()
        .filter(accounts::Column::IdNumber.eq(id_number))
        .one(db)
        .await?)
}

/// Draw random ID numbers until one is free in the current transaction.
///
/// The check runs before the insert: on Postgres a failed insert would abort
/// the whole transaction.
async fn unused_id_number(db_tx: &DatabaseTransaction) -> ResultEngine<String> {
    for _ in 0..ID_NUMBER_ATTEMPTS {
        let candidate = generate_id_number(&mut rand::thread_rng());
        if find_by_id_number(db_tx, &candidate).await?.is_none() {
            return Ok(candidate);
        }
        tracing::debug!(%candidate, "account id number already taken");
    }
    Err(EngineError::Database(DbErr::Custom(format!(
        "no free account id number after {ID_NUMBER_ATTEMPTS} attempts"
    ))))
}
