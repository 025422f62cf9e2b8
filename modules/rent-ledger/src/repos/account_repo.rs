//! Repository for payment accounts (bank, cash, UPI, ...)

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Named payment channel referenced by ledger rows and tenant collections
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Find an account by id
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, name, mode, created_at, updated_at
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Find an account by id within a transaction
pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, name, mode, created_at, updated_at
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// All accounts ordered by name
pub async fn list_ordered_by_name(pool: &PgPool) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, name, mode, created_at, updated_at
        FROM accounts
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Check whether a name is taken (case-insensitive), optionally ignoring one account
pub async fn name_exists_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    excluding: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM accounts
            WHERE lower(name) = lower($1)
              AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(name)
    .bind(excluding)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    name: &str,
    mode: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, name, mode)
        VALUES ($1, $2, $3)
        RETURNING id, name, mode, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(mode)
    .fetch_one(&mut **tx)
    .await
}

/// Rename an account; returns None if the id does not exist
pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    name: &str,
    mode: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET name = $2, mode = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, mode, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(mode)
    .fetch_optional(&mut **tx)
    .await
}

/// Delete an account row. References must already be cleared.
pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}
