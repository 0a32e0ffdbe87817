use thiserror::Error;

use super::store::StoreError;

/// Login failures collapse to this single message so callers cannot tell an
/// unknown email from a wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Generic rejection for missing, malformed, tampered or expired tokens.
pub const UNAUTHORIZED: &str = "Unauthorized.";

pub const EMAIL_EXISTS: &str = "Email already exists.";

/// Closed error set for account operations.
///
/// Handlers branch on the kind; the HTTP layer owns the status mapping and
/// never sees internal detail beyond the `Storage` source chain it logs.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("User not found.")]
    NotFound,
    #[error("Internal server error.")]
    Storage(#[source] anyhow::Error),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AccountError::Conflict(EMAIL_EXISTS),
            StoreError::NotFound => AccountError::NotFound,
            StoreError::Backend(err) => AccountError::Storage(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_message_hides_detail() {
        let err = AccountError::Storage(anyhow::anyhow!("disk on fire at /var/uploads"));
        assert_eq!(err.to_string(), "Internal server error.");
    }

    #[test]
    fn store_errors_map_to_domain_kinds() {
        assert!(matches!(
            AccountError::from(StoreError::DuplicateEmail),
            AccountError::Conflict(EMAIL_EXISTS)
        ));
        assert!(matches!(
            AccountError::from(StoreError::NotFound),
            AccountError::NotFound
        ));
        assert!(matches!(
            AccountError::from(StoreError::Backend(anyhow::anyhow!("boom"))),
            AccountError::Storage(_)
        ));
    }
}
