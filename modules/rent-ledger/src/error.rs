use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by ledger, tenant, account, and report operations
///
/// Any error aborts the enclosing transaction, so a caller never observes a
/// partial write.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(Uuid),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Ledger entry not found: {0}")]
    EntryNotFound(Uuid),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Active tenant already exists: {0}")]
    DuplicateTenant(String),

    #[error("CSV export failed: {0}")]
    Export(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    /// True for the id-did-not-resolve family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::TenantNotFound(_)
                | LedgerError::AccountNotFound(_)
                | LedgerError::EntryNotFound(_)
        )
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        LedgerError::Export(err.to_string())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family() {
        assert!(LedgerError::TenantNotFound(Uuid::new_v4()).is_not_found());
        assert!(LedgerError::AccountNotFound(Uuid::new_v4()).is_not_found());
        assert!(LedgerError::EntryNotFound(Uuid::new_v4()).is_not_found());
        assert!(!LedgerError::InvalidState("x".to_string()).is_not_found());
    }

    #[test]
    fn test_error_display_names_the_id() {
        let id = Uuid::new_v4();
        let err = LedgerError::EntryNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
