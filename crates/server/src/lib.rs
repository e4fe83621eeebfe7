use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::{EngineError, ErrorKind};

use api_types::ErrorBody;
pub use server::{
    ServerConfig, ServerState, Timeouts, TlsFiles, router, run, run_with_listener,
};

mod accounts;
mod server;
mod transactions;
mod users;

pub mod types {
    pub use api_types::{ErrorBody, Message};

    pub mod user {
        pub use api_types::user::{UserNew, UserView};
    }

    pub mod account {
        pub use api_types::account::{AccountNew, AccountView, Balance};
    }

    pub mod transaction {
        pub use api_types::transaction::TransactionView;
    }
}

pub enum ServerError {
    Engine(EngineError),
    /// Malformed request: bad body, form or path parameter.
    Generic(String),
    /// The store operation did not finish before its deadline.
    Timeout,
}

/// Only invalid input is a client error; every other engine failure,
/// domain or store, is reported as 500.
fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound
        | ErrorKind::EmailExists
        | ErrorKind::InsufficientBalance
        | ErrorKind::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err.kind() {
        ErrorKind::StoreFailure => {
            tracing::error!("store failure: {err}");
            "internal server error".to_string()
        }
        _ => err.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Timeout => {
                tracing::warn!("request deadline exceeded");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "request timed out".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<FormRejection> for ServerError {
    fn from(value: FormRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

/// Parse a numeric path id, reporting `Invalid <what> id` on failure.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::Generic(format!("Invalid {what} id")))
}
