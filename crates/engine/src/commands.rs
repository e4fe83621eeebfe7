//! Command structs for engine operations.
//!
//! These types group parameters for write operations (signup, profile update,
//! withdraw/deposit), keeping call sites readable and avoiding long argument
//! lists.

use crate::Money;

/// User fields accepted by signup and by profile updates.
///
/// `password` is plaintext here and is hashed by the engine before it reaches
/// the store.
#[derive(Clone)]
pub struct UserCmd {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl UserCmd {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for UserCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCmd")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Withdraw money from the account identified by its ID number.
#[derive(Clone, Debug)]
pub struct WithdrawCmd {
    pub id_number: String,
    pub amount: Money,
    pub detail: String,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(id_number: impl Into<String>, amount: Money) -> Self {
        Self {
            id_number: id_number.into(),
            amount,
            detail: String::new(),
        }
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Deposit money into the account identified by its internal id.
#[derive(Clone, Debug)]
pub struct DepositCmd {
    pub account_id: i64,
    pub amount: Money,
    pub detail: String,
}

impl DepositCmd {
    #[must_use]
    pub fn new(account_id: i64, amount: Money) -> Self {
        Self {
            account_id,
            amount,
            detail: String::new(),
        }
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}
