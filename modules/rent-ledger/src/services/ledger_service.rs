//! Ledger reconciliation engine
//!
//! Every operation runs in one transaction spanning the due entry, its
//! collection mirror, and the tenant's cached balance. Lock order is always
//! tenant row, then due entry row, so writers on the same tenant serialize
//! without deadlocking.
//!
//! Mirror rule: after any due/paid change the collection entry exists iff
//! `paid_amount > 0`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::billing::{billing_month, start_of_day_utc};
use crate::error::{LedgerError, LedgerResult};
use crate::repos::collection_repo::{self, CollectionEntry};
use crate::repos::due_repo::{self, DueEntry, LedgerView};
use crate::repos::{account_repo, tenant_repo};
use crate::status::{derive_status, tenant_balance, DueStatus};

/// Manual rent entry for a tenant and month
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertDueRequest {
    pub tenant_id: Uuid,
    /// Any day of the billing month; normalized to the 1st
    pub billing_month: NaiveDate,
    pub due_amount: Decimal,
    pub paid_amount: Decimal,
    pub account_id: Option<Uuid>,
}

/// Correction of an existing ledger entry
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDueRequest {
    pub due_amount: Decimal,
    pub paid_amount: Decimal,
    pub account_id: Option<Uuid>,
    /// Date the payment was received; stamps the collection entry
    pub transaction_date: Option<NaiveDate>,
}

/// Create or overwrite the entry for (tenant, billing month)
pub async fn upsert_due(
    pool: &PgPool,
    request: &UpsertDueRequest,
    now: DateTime<Utc>,
) -> LedgerResult<LedgerView> {
    let mut tx = pool.begin().await?;

    let tenant = tenant_repo::find_by_id_for_update_tx(&mut tx, request.tenant_id)
        .await?
        .ok_or(LedgerError::TenantNotFound(request.tenant_id))?;
    let account_id = resolve_account_tx(&mut tx, request.account_id).await?;

    let (due, paid) = normalize_amounts(request.due_amount, request.paid_amount);
    let entry = write_entry_tx(
        &mut tx,
        tenant.id,
        billing_month(request.billing_month),
        due,
        paid,
        account_id,
        now,
    )
    .await?;
    sync_tenant_balance_tx(&mut tx, &entry).await?;

    let view = view_tx(&mut tx, entry.id).await?;
    tx.commit().await?;

    tracing::info!(
        entry_id = %entry.id,
        tenant_id = %entry.tenant_id,
        billing_month = %entry.billing_month,
        status = %entry.status,
        "Due entry upserted"
    );

    Ok(view)
}

/// Overwrite amounts and account of an entry by id
pub async fn update_due(
    pool: &PgPool,
    entry_id: Uuid,
    request: &UpdateDueRequest,
    now: DateTime<Utc>,
) -> LedgerResult<LedgerView> {
    let mut tx = pool.begin().await?;

    let existing = lock_entry_tx(&mut tx, entry_id).await?;
    let account_id = resolve_account_tx(&mut tx, request.account_id).await?;

    let (due, paid) = normalize_amounts(request.due_amount, request.paid_amount);
    let entry = due_repo::update_amounts_tx(
        &mut tx,
        existing.id,
        due,
        paid,
        derive_status(due, paid),
        account_id,
    )
    .await?;
    sync_collection_tx(&mut tx, &entry, request.transaction_date, now).await?;
    sync_tenant_balance_tx(&mut tx, &entry).await?;

    let view = view_tx(&mut tx, entry.id).await?;
    tx.commit().await?;

    tracing::info!(
        entry_id = %entry.id,
        tenant_id = %entry.tenant_id,
        status = %entry.status,
        "Due entry updated"
    );

    Ok(view)
}

/// Zero the due amount of an entry, keeping the row for history
///
/// The collection mirror is left as is.
pub async fn delete_due(pool: &PgPool, entry_id: Uuid) -> LedgerResult<()> {
    let mut tx = pool.begin().await?;

    let existing = lock_entry_tx(&mut tx, entry_id).await?;
    let due = Decimal::ZERO;
    let entry = due_repo::update_amounts_tx(
        &mut tx,
        existing.id,
        due,
        existing.paid_amount,
        derive_status(due, existing.paid_amount),
        existing.account_id,
    )
    .await?;
    sync_tenant_balance_tx(&mut tx, &entry).await?;

    tx.commit().await?;

    tracing::info!(entry_id = %entry.id, tenant_id = %entry.tenant_id, "Due entry zeroed");
    Ok(())
}

/// Remove the collection entry only; a no-op when there is none
///
/// Leaves the due entry and tenant balance untouched. Used to correct
/// collection reports, not to reverse a payment.
pub async fn delete_collected(pool: &PgPool, entry_id: Uuid) -> LedgerResult<()> {
    let removed = collection_repo::delete(pool, entry_id).await?;
    if removed {
        tracing::info!(entry_id = %entry_id, "Collection entry deleted");
    } else {
        tracing::debug!(entry_id = %entry_id, "No collection entry to delete");
    }
    Ok(())
}

/// Settle an entry in full
///
/// Always PAID, including an entry whose due amount was zeroed.
pub async fn mark_paid(pool: &PgPool, entry_id: Uuid, now: DateTime<Utc>) -> LedgerResult<LedgerView> {
    let mut tx = pool.begin().await?;

    let existing = lock_entry_tx(&mut tx, entry_id).await?;
    let paid = existing.due_amount.max(Decimal::ZERO);
    let entry = due_repo::update_amounts_tx(
        &mut tx,
        existing.id,
        existing.due_amount,
        paid,
        DueStatus::Paid,
        existing.account_id,
    )
    .await?;
    sync_collection_tx(&mut tx, &entry, None, now).await?;
    sync_tenant_balance_tx(&mut tx, &entry).await?;

    let view = view_tx(&mut tx, entry.id).await?;
    tx.commit().await?;

    tracing::info!(entry_id = %entry.id, tenant_id = %entry.tenant_id, "Due entry marked paid");
    Ok(view)
}

/// Upsert the (tenant, month) row and its mirror; shared with the joining sync
///
/// Callers must already hold the tenant row lock and pass normalized amounts.
pub(crate) async fn write_entry_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    month: NaiveDate,
    due: Decimal,
    paid: Decimal,
    account_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> LedgerResult<DueEntry> {
    let entry = due_repo::upsert_tx(
        tx,
        tenant_id,
        month,
        due,
        paid,
        derive_status(due, paid),
        account_id,
    )
    .await?;
    sync_collection_tx(tx, &entry, None, now).await?;
    Ok(entry)
}

/// Bring the collection mirror in line with a due entry
async fn sync_collection_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &DueEntry,
    transaction_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> LedgerResult<Option<CollectionEntry>> {
    if entry.paid_amount <= Decimal::ZERO {
        if collection_repo::delete_tx(tx, entry.id).await? {
            tracing::debug!(entry_id = %entry.id, "Collection entry removed, nothing paid");
        }
        return Ok(None);
    }

    let existing = collection_repo::find_by_id_tx(tx, entry.id).await?;
    let collected_at = resolve_collected_at(
        transaction_date,
        existing.map(|c| c.collected_at),
        now,
    );
    let collection = collection_repo::upsert_from_due_tx(tx, entry, collected_at).await?;
    Ok(Some(collection))
}

async fn sync_tenant_balance_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &DueEntry,
) -> LedgerResult<()> {
    let (balance, status) = tenant_balance(entry.due_amount, entry.paid_amount);
    tenant_repo::update_balance_tx(tx, entry.tenant_id, balance, status).await?;
    Ok(())
}

/// Lock tenant then entry for an id-keyed operation
async fn lock_entry_tx(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> LedgerResult<DueEntry> {
    let tenant_id = sqlx::query_scalar::<_, Uuid>("SELECT tenant_id FROM due_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(LedgerError::EntryNotFound(entry_id))?;

    tenant_repo::find_by_id_for_update_tx(tx, tenant_id)
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))?;

    due_repo::find_by_id_for_update_tx(tx, entry_id)
        .await?
        .ok_or(LedgerError::EntryNotFound(entry_id))
}

pub(crate) async fn resolve_account_tx(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Option<Uuid>,
) -> LedgerResult<Option<Uuid>> {
    match account_id {
        None => Ok(None),
        Some(id) => account_repo::find_by_id_tx(tx, id)
            .await?
            .map(|account| Some(account.id))
            .ok_or(LedgerError::AccountNotFound(id)),
    }
}

async fn view_tx(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> LedgerResult<LedgerView> {
    due_repo::find_view_tx(tx, entry_id)
        .await?
        .ok_or(LedgerError::EntryNotFound(entry_id))
}

/// Negative amounts are floored at zero; over-payment is kept
fn normalize_amounts(due: Decimal, paid: Decimal) -> (Decimal, Decimal) {
    (due.max(Decimal::ZERO), paid.max(Decimal::ZERO))
}

/// Timestamp to stamp on a collection entry
///
/// A supplied transaction date always wins. Otherwise an existing entry keeps
/// its timestamp and a new one gets `now`.
fn resolve_collected_at(
    transaction_date: Option<NaiveDate>,
    existing: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match (transaction_date, existing) {
        (Some(date), _) => start_of_day_utc(date),
        (None, Some(collected_at)) => collected_at,
        (None, None) => now,
    }
}
