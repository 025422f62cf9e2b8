//! Repository for the collection mirror
//!
//! A collection entry shares its primary key with the due entry it mirrors.
//! Only the ledger engine writes here; the one standalone write is
//! [`delete`], used to correct a mistaken collection in reports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::repos::due_repo::{DueEntry, LedgerView};

/// Collection mirror entry
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct CollectionEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub billing_month: NaiveDate,
    pub collected_amount: Decimal,
    pub collected_at: DateTime<Utc>,
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Collection row joined with tenant and account metadata for the CSV export
#[derive(Debug, Clone, FromRow)]
pub struct CollectionExportRow {
    pub id: Uuid,
    pub tenant_name: String,
    pub room_number: String,
    pub billing_month: NaiveDate,
    pub collected_amount: Decimal,
    pub collected_at: DateTime<Utc>,
    pub account_name: Option<String>,
    pub account_mode: Option<String>,
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<CollectionEntry>, sqlx::Error> {
    sqlx::query_as::<_, CollectionEntry>(
        r#"
        SELECT id, tenant_id, billing_month, collected_amount, collected_at,
               account_id, created_at, updated_at
        FROM collection_entries
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<CollectionEntry>, sqlx::Error> {
    sqlx::query_as::<_, CollectionEntry>(
        r#"
        SELECT id, tenant_id, billing_month, collected_amount, collected_at,
               account_id, created_at, updated_at
        FROM collection_entries
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Create or refresh the mirror of a due entry
pub async fn upsert_from_due_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &DueEntry,
    collected_at: DateTime<Utc>,
) -> Result<CollectionEntry, sqlx::Error> {
    sqlx::query_as::<_, CollectionEntry>(
        r#"
        INSERT INTO collection_entries (
            id, tenant_id, billing_month, collected_amount, collected_at, account_id
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id)
        DO UPDATE SET
            tenant_id = EXCLUDED.tenant_id,
            billing_month = EXCLUDED.billing_month,
            collected_amount = EXCLUDED.collected_amount,
            collected_at = EXCLUDED.collected_at,
            account_id = EXCLUDED.account_id,
            updated_at = NOW()
        RETURNING id, tenant_id, billing_month, collected_amount, collected_at,
                  account_id, created_at, updated_at
        "#,
    )
    .bind(entry.id)
    .bind(entry.tenant_id)
    .bind(entry.billing_month)
    .bind(entry.paid_amount)
    .bind(collected_at)
    .bind(entry.account_id)
    .fetch_one(&mut **tx)
    .await
}

/// Delete a mirror row inside a transaction; false if there was none
pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM collection_entries WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a mirror row; false if there was none
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM collection_entries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Collections with `collected_at` in `[from, to)`, newest first
pub async fn list_views_between(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<LedgerView>, sqlx::Error> {
    sqlx::query_as::<_, LedgerView>(
        r#"
        SELECT
            c.id,
            c.tenant_id,
            t.full_name AS tenant_name,
            t.room_number,
            c.billing_month,
            c.collected_at AS transaction_at,
            d.due_amount,
            c.collected_amount AS paid_amount,
            d.status,
            c.account_id,
            a.name AS account_name
        FROM collection_entries c
        INNER JOIN due_entries d ON d.id = c.id
        INNER JOIN tenants t ON t.id = c.tenant_id
        LEFT JOIN accounts a ON a.id = c.account_id
        WHERE c.collected_at >= $1 AND c.collected_at < $2
        ORDER BY c.collected_at DESC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Export rows for collections in `[from, to)`, optionally for one account
pub async fn list_export_rows_between(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    account_id: Option<Uuid>,
) -> Result<Vec<CollectionExportRow>, sqlx::Error> {
    sqlx::query_as::<_, CollectionExportRow>(
        r#"
        SELECT
            c.id,
            t.full_name AS tenant_name,
            t.room_number,
            c.billing_month,
            c.collected_amount,
            c.collected_at,
            a.name AS account_name,
            a.mode AS account_mode
        FROM collection_entries c
        INNER JOIN tenants t ON t.id = c.tenant_id
        LEFT JOIN accounts a ON a.id = c.account_id
        WHERE c.collected_at >= $1 AND c.collected_at < $2
          AND ($3::uuid IS NULL OR c.account_id = $3)
        ORDER BY c.collected_at DESC
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(account_id)
    .fetch_all(pool)
    .await
}

/// Sum of collected amounts with `collected_at` in `[from, to)`
pub async fn sum_collected_between(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(collected_amount), 0)
        FROM collection_entries
        WHERE collected_at >= $1 AND collected_at < $2
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await
}

pub async fn clear_account_references_tx(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE collection_entries SET account_id = NULL WHERE account_id = $1")
        .bind(account_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}
