//! Account registry
//!
//! Accounts are referenced, never owned, by ledger rows and tenant
//! collections. Deleting one nulls every reference first, in the same
//! transaction, so no ledger row is ever lost with it.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::repos::account_repo::{self, Account};
use crate::repos::{collection_repo, due_repo, tenant_repo};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountRequest {
    pub name: String,
    #[serde(default)]
    pub mode: String,
}

impl AccountRequest {
    /// Trimmed `(name, mode)`; an empty name is rejected
    fn normalized(&self) -> LedgerResult<(String, String)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidState("account name is required".to_string()));
        }
        Ok((name.to_string(), self.mode.trim().to_string()))
    }
}

pub async fn create_account(pool: &PgPool, request: &AccountRequest) -> LedgerResult<Account> {
    let (name, mode) = request.normalized()?;
    let mut tx = pool.begin().await?;

    if account_repo::name_exists_tx(&mut tx, &name, None).await? {
        return Err(LedgerError::DuplicateAccount(name));
    }
    let account = account_repo::insert_tx(&mut tx, Uuid::new_v4(), &name, &mode)
        .await
        .map_err(|e| map_unique_violation(e, &name))?;

    tx.commit().await?;

    tracing::info!(account_id = %account.id, name = %account.name, "Account created");
    Ok(account)
}

pub async fn update_account(
    pool: &PgPool,
    account_id: Uuid,
    request: &AccountRequest,
) -> LedgerResult<Account> {
    let (name, mode) = request.normalized()?;
    let mut tx = pool.begin().await?;

    account_repo::find_by_id_tx(&mut tx, account_id)
        .await?
        .ok_or(LedgerError::AccountNotFound(account_id))?;
    if account_repo::name_exists_tx(&mut tx, &name, Some(account_id)).await? {
        return Err(LedgerError::DuplicateAccount(name));
    }
    let account = account_repo::update_tx(&mut tx, account_id, &name, &mode)
        .await
        .map_err(|e| map_unique_violation(e, &name))?
        .ok_or(LedgerError::AccountNotFound(account_id))?;

    tx.commit().await?;

    tracing::info!(account_id = %account.id, name = %account.name, "Account updated");
    Ok(account)
}

pub async fn list_accounts(pool: &PgPool) -> LedgerResult<Vec<Account>> {
    Ok(account_repo::list_ordered_by_name(pool).await?)
}

/// Null every reference to the account, then delete it
pub async fn delete_account(pool: &PgPool, account_id: Uuid) -> LedgerResult<()> {
    let mut tx = pool.begin().await?;

    account_repo::find_by_id_tx(&mut tx, account_id)
        .await?
        .ok_or(LedgerError::AccountNotFound(account_id))?;

    let due_refs = due_repo::clear_account_references_tx(&mut tx, account_id).await?;
    let collection_refs = collection_repo::clear_account_references_tx(&mut tx, account_id).await?;
    let tenant_refs = tenant_repo::clear_account_references_tx(&mut tx, account_id).await?;

    if !account_repo::delete_tx(&mut tx, account_id).await? {
        return Err(LedgerError::AccountNotFound(account_id));
    }
    tx.commit().await?;

    tracing::info!(
        account_id = %account_id,
        due_refs,
        collection_refs,
        tenant_refs,
        "Account deleted"
    );
    Ok(())
}

/// A racing insert can still trip `idx_accounts_name_ci`
fn map_unique_violation(err: sqlx::Error, name: &str) -> LedgerError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return LedgerError::DuplicateAccount(name.to_string());
        }
    }
    LedgerError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_trimmed() {
        let request = AccountRequest {
            name: "  HDFC Savings ".to_string(),
            mode: " BANK\n".to_string(),
        };
        let (name, mode) = request.normalized().unwrap();
        assert_eq!(name, "HDFC Savings");
        assert_eq!(mode, "BANK");
    }

    #[test]
    fn test_blank_name_rejected() {
        let request = AccountRequest {
            name: "   ".to_string(),
            mode: "CASH".to_string(),
        };
        assert!(matches!(request.normalized(), Err(LedgerError::InvalidState(_))));
    }

    #[test]
    fn test_non_database_error_passes_through() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, "Cash");
        assert!(matches!(err, LedgerError::Database(sqlx::Error::RowNotFound)));
    }
}
