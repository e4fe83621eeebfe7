//! Request and response bodies of the bank HTTP API.
//!
//! Amounts travel twice: as a display string with two decimals (`"12.34"`)
//! and as integer minor units (`1234`). Clients doing arithmetic should use
//! the minor units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Plain acknowledgement, e.g. after an update.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

pub mod user {
    use super::*;

    /// Payload of `POST /users` and `PUT /users/{id}`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub username: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i64,
        pub username: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod account {
    use super::*;

    /// Form payload of `POST /accounts`.
    ///
    /// `user_id` stays a string so a malformed id is reported as a bad
    /// request instead of a form rejection.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub user_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub user_id: i64,
        pub id_number: String,
        pub balance: String,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Balance {
        pub balance: String,
        pub balance_minor: i64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub account_id: i64,
        pub amount: String,
        pub amount_minor: i64,
        /// `DEPOSIT` or `WITHDRAW`.
        pub tx_type: String,
        pub detail: String,
        pub created_at: DateTime<Utc>,
    }
}
