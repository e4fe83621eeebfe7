//! Internal helpers for input validation and store error interpretation.
//!
//! These utilities are **not** part of the public API.

use sea_orm::{DbErr, RuntimeErr, SqlErr};

use crate::{EngineError, ResultEngine};

/// SQLSTATE reported by Postgres when a serializable transaction conflicts.
const SERIALIZATION_FAILURE: &str = "40001";

/// Trim `value` and reject it if nothing is left.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == SERIALIZATION_FAILURE),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(normalize_required_text("  u1 ", "username").unwrap(), "u1");
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            normalize_required_text("   ", "email").unwrap_err(),
            EngineError::InvalidInput("email must not be empty".to_string())
        );
    }

    #[test]
    fn custom_errors_are_not_retried() {
        assert!(!is_serialization_failure(&DbErr::Custom("40001".to_string())));
        assert!(!is_unique_violation(&DbErr::RecordNotInserted));
    }
}
