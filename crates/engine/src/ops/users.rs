use chrono::Utc;
use sea_orm::{ActiveValue, DbErr, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, EngineError, ResultEngine, User, UserCmd, accounts,
    password::hash_password,
    users,
    util::{is_unique_violation, normalize_required_text},
};

use super::{Engine, with_tx};

/// Validated user fields, with the password already hashed.
struct UserFields {
    username: String,
    email: String,
    password_hash: String,
}

impl UserFields {
    /// Validate `cmd` and hash its password on the blocking thread pool.
    async fn hashed(cmd: &UserCmd) -> ResultEngine<Self> {
        let username = normalize_required_text(&cmd.username, "username")?;
        let email = normalize_required_text(&cmd.email, "email")?;
        if cmd.password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let password = cmd.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|err| EngineError::PasswordHash(err.to_string()))??;
        Ok(Self {
            username,
            email,
            password_hash,
        })
    }
}

/// The unique index on `users.email` is the authoritative guard; a violation
/// is the same domain error as the pre-check.
fn map_email_conflict(err: DbErr, email: &str) -> EngineError {
    if is_unique_violation(&err) {
        EngineError::EmailExists(email.to_string())
    } else {
        EngineError::Database(err)
    }
}

impl Engine {
    /// Register a new user.
    ///
    /// The password is hashed off the async workers before the store
    /// transaction starts; the plaintext is never persisted.
    pub async fn create_user(&self, cmd: UserCmd) -> ResultEngine<User> {
        let fields = UserFields::hashed(&cmd).await?;
        let created_at = Utc::now();
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(fields.email.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::EmailExists(fields.email));
            }

            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(fields.username),
                email: ActiveValue::Set(fields.email.clone()),
                password: ActiveValue::Set(fields.password_hash),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| map_email_conflict(err, &fields.email))?;

            tracing::debug!(user_id = model.id, "created user");
            Ok(User::from(model))
        })
    }

    /// Overwrite username, email and password of an existing user.
    ///
    /// The password is re-hashed even when it did not change. There is no
    /// email pre-check here: only the store's unique index rejects a taken
    /// email.
    pub async fn update_user(&self, id: i64, cmd: UserCmd) -> ResultEngine<()> {
        let fields = UserFields::hashed(&cmd).await?;
        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {id}")))?;

            let mut active: users::ActiveModel = model.into();
            active.username = ActiveValue::Set(fields.username);
            active.email = ActiveValue::Set(fields.email.clone());
            active.password = ActiveValue::Set(fields.password_hash);
            active
                .update(&db_tx)
                .await
                .map_err(|err| map_email_conflict(err, &fields.email))?;
            Ok(())
        })
    }

    pub async fn user(&self, id: i64) -> ResultEngine<User> {
        users::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {id}")))
    }

    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    /// Accounts owned by `user_id`. An unknown user simply owns nothing.
    pub async fn user_accounts(&self, user_id: i64) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Stored password hash of a user, for credential checks with
    /// [`verify_password`](crate::verify_password).
    pub async fn password_hash(&self, id: i64) -> ResultEngine<String> {
        users::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(|model| model.password)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {id}")))
    }
}
