//! Repository for tenant records
//!
//! The tenant row carries the cached balance (`rent_due_amount`,
//! `payment_status`) written back by the ledger engine and the scheduler
//! cursor `last_due_generated_for`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::status::PaymentStatus;

macro_rules! tenant_columns {
    () => {
        r#"
        id, full_name, room_number, joining_date, active, daily_accommodation,
        rent, deposit, rent_paid_amount, deposit_paid_amount, rent_due_amount,
        payment_status, last_due_generated_for,
        daily_collection_amount, daily_collection_transaction_date,
        daily_collection_account_id, daily_stay_days,
        joining_collection_account_id, checkout_date, created_at, updated_at
        "#
    };
}

/// Tenant model
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: Uuid,
    pub full_name: String,
    pub room_number: String,
    pub joining_date: Option<NaiveDate>,
    pub active: bool,
    pub daily_accommodation: bool,
    pub rent: Decimal,
    pub deposit: Decimal,
    pub rent_paid_amount: Decimal,
    pub deposit_paid_amount: Decimal,
    pub rent_due_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub last_due_generated_for: Option<NaiveDate>,
    pub daily_collection_amount: Decimal,
    pub daily_collection_transaction_date: Option<NaiveDate>,
    pub daily_collection_account_id: Option<Uuid>,
    pub daily_stay_days: Option<i32>,
    pub joining_collection_account_id: Option<Uuid>,
    pub checkout_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized, persistable tenant fields (everything but identity, cursor, and audit columns)
#[derive(Debug, Clone, PartialEq)]
pub struct TenantFields {
    pub full_name: String,
    pub room_number: String,
    pub joining_date: Option<NaiveDate>,
    pub active: bool,
    pub daily_accommodation: bool,
    pub rent: Decimal,
    pub deposit: Decimal,
    pub rent_paid_amount: Decimal,
    pub deposit_paid_amount: Decimal,
    pub rent_due_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub daily_collection_amount: Decimal,
    pub daily_collection_transaction_date: Option<NaiveDate>,
    pub daily_collection_account_id: Option<Uuid>,
    pub daily_stay_days: Option<i32>,
    pub joining_collection_account_id: Option<Uuid>,
    pub checkout_date: Option<NaiveDate>,
}

/// A daily-accommodation payment as it appears in the collection export
#[derive(Debug, Clone, FromRow)]
pub struct DailyCollectionRow {
    pub tenant_id: Uuid,
    pub full_name: String,
    pub room_number: String,
    pub daily_collection_amount: Decimal,
    pub daily_collection_transaction_date: NaiveDate,
    pub account_name: Option<String>,
    pub account_mode: Option<String>,
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!("SELECT ", tenant_columns!(), " FROM tenants WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Load and row-lock a tenant for the rest of the transaction
pub async fn find_by_id_for_update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        "SELECT ",
        tenant_columns!(),
        " FROM tenants WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Active tenants billed monthly, newest first
pub async fn list_active_monthly(pool: &PgPool) -> Result<Vec<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        "SELECT ",
        tenant_columns!(),
        r#"
        FROM tenants
        WHERE active = TRUE AND daily_accommodation = FALSE
        ORDER BY created_at DESC
        "#
    ))
    .fetch_all(pool)
    .await
}

/// Active daily-accommodation tenants, newest first
pub async fn list_active_daily(pool: &PgPool) -> Result<Vec<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        "SELECT ",
        tenant_columns!(),
        r#"
        FROM tenants
        WHERE active = TRUE AND daily_accommodation = TRUE
        ORDER BY created_at DESC
        "#
    ))
    .fetch_all(pool)
    .await
}

/// Monthly tenants whose joining date falls inside `[start, end]`
pub async fn list_monthly_joined_between(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        "SELECT ",
        tenant_columns!(),
        r#"
        FROM tenants
        WHERE joining_date BETWEEN $1 AND $2
          AND daily_accommodation = FALSE
        ORDER BY joining_date ASC
        "#
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Daily collections with a positive amount dated inside `[start, end]`
pub async fn list_daily_collections_between(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
    account_id: Option<Uuid>,
) -> Result<Vec<DailyCollectionRow>, sqlx::Error> {
    sqlx::query_as::<_, DailyCollectionRow>(
        r#"
        SELECT
            t.id AS tenant_id,
            t.full_name,
            t.room_number,
            t.daily_collection_amount,
            t.daily_collection_transaction_date,
            a.name AS account_name,
            a.mode AS account_mode
        FROM tenants t
        LEFT JOIN accounts a ON a.id = t.daily_collection_account_id
        WHERE t.daily_accommodation = TRUE
          AND t.daily_collection_amount > 0
          AND t.daily_collection_transaction_date BETWEEN $1 AND $2
          AND ($3::uuid IS NULL OR t.daily_collection_account_id = $3)
        ORDER BY t.daily_collection_transaction_date DESC, t.created_at DESC
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(account_id)
    .fetch_all(pool)
    .await
}

/// Check whether an active tenant already uses a name (case-insensitive)
pub async fn active_name_exists_tx(
    tx: &mut Transaction<'_, Postgres>,
    full_name: &str,
    excluding: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM tenants
            WHERE active = TRUE
              AND lower(full_name) = lower($1)
              AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(full_name)
    .bind(excluding)
    .fetch_one(&mut **tx)
    .await
}

pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tenants WHERE active = TRUE")
        .fetch_one(pool)
        .await
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    fields: &TenantFields,
) -> Result<Tenant, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        r#"
        INSERT INTO tenants (
            id, full_name, room_number, joining_date, active, daily_accommodation,
            rent, deposit, rent_paid_amount, deposit_paid_amount, rent_due_amount,
            payment_status, daily_collection_amount, daily_collection_transaction_date,
            daily_collection_account_id, daily_stay_days, joining_collection_account_id,
            checkout_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING "#,
        tenant_columns!()
    ))
    .bind(id)
    .bind(&fields.full_name)
    .bind(&fields.room_number)
    .bind(fields.joining_date)
    .bind(fields.active)
    .bind(fields.daily_accommodation)
    .bind(fields.rent)
    .bind(fields.deposit)
    .bind(fields.rent_paid_amount)
    .bind(fields.deposit_paid_amount)
    .bind(fields.rent_due_amount)
    .bind(fields.payment_status)
    .bind(fields.daily_collection_amount)
    .bind(fields.daily_collection_transaction_date)
    .bind(fields.daily_collection_account_id)
    .bind(fields.daily_stay_days)
    .bind(fields.joining_collection_account_id)
    .bind(fields.checkout_date)
    .fetch_one(&mut **tx)
    .await
}

/// Overwrite a tenant's fields; returns None if the id does not exist
pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    fields: &TenantFields,
) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        r#"
        UPDATE tenants SET
            full_name = $2,
            room_number = $3,
            joining_date = $4,
            active = $5,
            daily_accommodation = $6,
            rent = $7,
            deposit = $8,
            rent_paid_amount = $9,
            deposit_paid_amount = $10,
            rent_due_amount = $11,
            payment_status = $12,
            daily_collection_amount = $13,
            daily_collection_transaction_date = $14,
            daily_collection_account_id = $15,
            daily_stay_days = $16,
            joining_collection_account_id = $17,
            checkout_date = $18,
            updated_at = NOW()
        WHERE id = $1
        RETURNING "#,
        tenant_columns!()
    ))
    .bind(id)
    .bind(&fields.full_name)
    .bind(&fields.room_number)
    .bind(fields.joining_date)
    .bind(fields.active)
    .bind(fields.daily_accommodation)
    .bind(fields.rent)
    .bind(fields.deposit)
    .bind(fields.rent_paid_amount)
    .bind(fields.deposit_paid_amount)
    .bind(fields.rent_due_amount)
    .bind(fields.payment_status)
    .bind(fields.daily_collection_amount)
    .bind(fields.daily_collection_transaction_date)
    .bind(fields.daily_collection_account_id)
    .bind(fields.daily_stay_days)
    .bind(fields.joining_collection_account_id)
    .bind(fields.checkout_date)
    .fetch_optional(&mut **tx)
    .await
}

/// Write back the cached balance derived from a ledger entry
pub async fn update_balance_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    rent_due_amount: Decimal,
    payment_status: PaymentStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE tenants
        SET rent_due_amount = $2, payment_status = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(rent_due_amount)
    .bind(payment_status)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Advance the scheduler cursor
pub async fn set_last_due_generated_for_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    due_date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE tenants
        SET last_due_generated_for = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(due_date)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Mark a tenant inactive, optionally stamping a checkout date
pub async fn deactivate_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    checkout_date: Option<NaiveDate>,
) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        r#"
        UPDATE tenants
        SET active = FALSE,
            checkout_date = COALESCE($2, checkout_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING "#,
        tenant_columns!()
    ))
    .bind(id)
    .bind(checkout_date)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn clear_daily_collection_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Tenant, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(concat!(
        r#"
        UPDATE tenants
        SET daily_collection_amount = 0,
            daily_collection_transaction_date = NULL,
            daily_collection_account_id = NULL,
            updated_at = NOW()
        WHERE id = $1
        RETURNING "#,
        tenant_columns!()
    ))
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

/// Null out both tenant-level references to an account
pub async fn clear_account_references_tx(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let daily = sqlx::query(
        "UPDATE tenants SET daily_collection_account_id = NULL WHERE daily_collection_account_id = $1",
    )
    .bind(account_id)
    .execute(&mut **tx)
    .await?;

    let joining = sqlx::query(
        "UPDATE tenants SET joining_collection_account_id = NULL WHERE joining_collection_account_id = $1",
    )
    .bind(account_id)
    .execute(&mut **tx)
    .await?;

    Ok(daily.rows_affected() + joining.rows_affected())
}
