//! Repository for the due ledger
//!
//! One row per (tenant, billing month), enforced by
//! `uq_due_entries_tenant_month`. Writes happen inside engine transactions;
//! the reads that feed listings join tenant and account metadata into
//! [`LedgerView`] rows.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::status::DueStatus;

/// Due ledger entry
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct DueEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub billing_month: NaiveDate,
    pub due_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: DueStatus,
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger row joined with tenant and account metadata
///
/// Used for both due listings (transaction time = last update) and collected
/// listings (transaction time = collected_at).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerView {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub room_number: String,
    pub billing_month: NaiveDate,
    pub transaction_at: DateTime<Utc>,
    pub due_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: DueStatus,
    pub account_id: Option<Uuid>,
    pub account_name: Option<String>,
}

/// Load and row-lock a due entry by id
pub async fn find_by_id_for_update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<DueEntry>, sqlx::Error> {
    sqlx::query_as::<_, DueEntry>(
        r#"
        SELECT id, tenant_id, billing_month, due_amount, paid_amount, status,
               account_id, created_at, updated_at
        FROM due_entries
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn find_by_tenant_month(
    pool: &PgPool,
    tenant_id: Uuid,
    billing_month: NaiveDate,
) -> Result<Option<DueEntry>, sqlx::Error> {
    sqlx::query_as::<_, DueEntry>(
        r#"
        SELECT id, tenant_id, billing_month, due_amount, paid_amount, status,
               account_id, created_at, updated_at
        FROM due_entries
        WHERE tenant_id = $1 AND billing_month = $2
        "#,
    )
    .bind(tenant_id)
    .bind(billing_month)
    .fetch_optional(pool)
    .await
}

/// Insert or overwrite the entry for (tenant, billing month)
///
/// The unique constraint makes concurrent upserts on the same key serialize:
/// the loser waits on the winner's row lock and then applies its own update.
pub async fn upsert_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    billing_month: NaiveDate,
    due_amount: Decimal,
    paid_amount: Decimal,
    status: DueStatus,
    account_id: Option<Uuid>,
) -> Result<DueEntry, sqlx::Error> {
    sqlx::query_as::<_, DueEntry>(
        r#"
        INSERT INTO due_entries (
            id, tenant_id, billing_month, due_amount, paid_amount, status, account_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (tenant_id, billing_month)
        DO UPDATE SET
            due_amount = EXCLUDED.due_amount,
            paid_amount = EXCLUDED.paid_amount,
            status = EXCLUDED.status,
            account_id = EXCLUDED.account_id,
            updated_at = NOW()
        RETURNING id, tenant_id, billing_month, due_amount, paid_amount, status,
                  account_id, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(billing_month)
    .bind(due_amount)
    .bind(paid_amount)
    .bind(status)
    .bind(account_id)
    .fetch_one(&mut **tx)
    .await
}

/// Overwrite amounts, status, and account of an existing entry
pub async fn update_amounts_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    due_amount: Decimal,
    paid_amount: Decimal,
    status: DueStatus,
    account_id: Option<Uuid>,
) -> Result<DueEntry, sqlx::Error> {
    sqlx::query_as::<_, DueEntry>(
        r#"
        UPDATE due_entries
        SET due_amount = $2,
            paid_amount = $3,
            status = $4,
            account_id = $5,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, tenant_id, billing_month, due_amount, paid_amount, status,
                  account_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(due_amount)
    .bind(paid_amount)
    .bind(status)
    .bind(account_id)
    .fetch_one(&mut **tx)
    .await
}

/// Create a scheduler-generated obligation unless one already exists
///
/// Returns false when the (tenant, billing month) row was already present,
/// including when a concurrent pass inserted it first.
pub async fn insert_generated_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    billing_month: NaiveDate,
    due_amount: Decimal,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO due_entries (id, tenant_id, billing_month, due_amount, paid_amount, status)
        VALUES ($1, $2, $3, $4, 0, 'DUE')
        ON CONFLICT (tenant_id, billing_month) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(billing_month)
    .bind(due_amount)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Ledger view of a single entry
pub async fn find_view_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<LedgerView>, sqlx::Error> {
    sqlx::query_as::<_, LedgerView>(
        r#"
        SELECT
            d.id,
            d.tenant_id,
            t.full_name AS tenant_name,
            t.room_number,
            d.billing_month,
            d.updated_at AS transaction_at,
            d.due_amount,
            d.paid_amount,
            d.status,
            d.account_id,
            a.name AS account_name
        FROM due_entries d
        INNER JOIN tenants t ON t.id = d.tenant_id
        LEFT JOIN accounts a ON a.id = d.account_id
        WHERE d.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Outstanding (DUE or PARTIAL, non-zero) entries billed inside `[start, end]`
pub async fn list_outstanding_views(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<LedgerView>, sqlx::Error> {
    sqlx::query_as::<_, LedgerView>(
        r#"
        SELECT
            d.id,
            d.tenant_id,
            t.full_name AS tenant_name,
            t.room_number,
            d.billing_month,
            d.updated_at AS transaction_at,
            d.due_amount,
            d.paid_amount,
            d.status,
            d.account_id,
            a.name AS account_name
        FROM due_entries d
        INNER JOIN tenants t ON t.id = d.tenant_id
        LEFT JOIN accounts a ON a.id = d.account_id
        WHERE d.status IN ('DUE', 'PARTIAL')
          AND d.due_amount > 0
          AND d.billing_month BETWEEN $1 AND $2
        ORDER BY d.billing_month DESC, t.full_name ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Sum of due amounts billed inside `[start, end]`
pub async fn sum_due_between(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(due_amount), 0)
        FROM due_entries
        WHERE billing_month BETWEEN $1 AND $2
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
}

pub async fn clear_account_references_tx(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE due_entries SET account_id = NULL WHERE account_id = $1")
        .bind(account_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}
