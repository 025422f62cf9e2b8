//! Tenant directory
//!
//! Tenant create/update normalizes the financial fields silently (never an
//! error) and, for monthly tenants with a joining date, writes the joining
//! month's combined rent + deposit obligation through the ledger engine's
//! entry-write path in the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::billing::billing_month;
use crate::error::{LedgerError, LedgerResult};
use crate::repos::tenant_repo::{self, Tenant, TenantFields};
use crate::services::ledger_service::{resolve_account_tx, write_entry_tx};
use crate::status::PaymentStatus;

/// Tenant fields as supplied by a caller, before normalization
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TenantDraft {
    pub full_name: String,
    pub room_number: String,
    pub joining_date: Option<NaiveDate>,
    pub active: bool,
    pub daily_accommodation: bool,
    pub rent: Decimal,
    pub deposit: Decimal,
    pub rent_paid_amount: Decimal,
    pub deposit_paid_amount: Decimal,
    pub daily_collection_amount: Decimal,
    pub daily_collection_transaction_date: Option<NaiveDate>,
    pub daily_collection_account_id: Option<Uuid>,
    pub daily_stay_days: Option<i32>,
    pub joining_collection_account_id: Option<Uuid>,
    pub checkout_date: Option<NaiveDate>,
}

impl Default for TenantDraft {
    fn default() -> Self {
        TenantDraft {
            full_name: String::new(),
            room_number: String::new(),
            joining_date: None,
            active: true,
            daily_accommodation: false,
            rent: Decimal::ZERO,
            deposit: Decimal::ZERO,
            rent_paid_amount: Decimal::ZERO,
            deposit_paid_amount: Decimal::ZERO,
            daily_collection_amount: Decimal::ZERO,
            daily_collection_transaction_date: None,
            daily_collection_account_id: None,
            daily_stay_days: None,
            joining_collection_account_id: None,
            checkout_date: None,
        }
    }
}

/// Combined joining-month obligation of a monthly tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoiningObligation {
    pub billing_month: NaiveDate,
    pub due_amount: Decimal,
    pub paid_amount: Decimal,
}

pub async fn create_tenant(
    pool: &PgPool,
    draft: &TenantDraft,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> LedgerResult<Tenant> {
    let mut tx = pool.begin().await?;

    resolve_accounts_tx(&mut tx, draft).await?;
    let fields = normalize_fields(draft, today);
    check_identity_tx(&mut tx, &fields, None).await?;

    let tenant = tenant_repo::insert_tx(&mut tx, Uuid::new_v4(), &fields).await?;
    sync_joining_ledger_tx(&mut tx, &tenant, now).await?;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant.id,
        daily = tenant.daily_accommodation,
        "Tenant created"
    );
    Ok(tenant)
}

pub async fn update_tenant(
    pool: &PgPool,
    tenant_id: Uuid,
    draft: &TenantDraft,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> LedgerResult<Tenant> {
    let mut tx = pool.begin().await?;

    tenant_repo::find_by_id_for_update_tx(&mut tx, tenant_id)
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))?;

    resolve_accounts_tx(&mut tx, draft).await?;
    let fields = normalize_fields(draft, today);
    check_identity_tx(&mut tx, &fields, Some(tenant_id)).await?;

    let tenant = tenant_repo::update_tx(&mut tx, tenant_id, &fields)
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))?;
    sync_joining_ledger_tx(&mut tx, &tenant, now).await?;

    tx.commit().await?;

    tracing::info!(tenant_id = %tenant.id, "Tenant updated");
    Ok(tenant)
}

/// Mark a tenant as moved out today
pub async fn checkout_tenant(pool: &PgPool, tenant_id: Uuid, today: NaiveDate) -> LedgerResult<Tenant> {
    let mut tx = pool.begin().await?;
    let tenant = tenant_repo::deactivate_tx(&mut tx, tenant_id, Some(today))
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))?;
    tx.commit().await?;

    tracing::info!(tenant_id = %tenant_id, checkout_date = %today, "Tenant checked out");
    Ok(tenant)
}

/// Soft delete; ledger rows are kept
pub async fn deactivate_tenant(pool: &PgPool, tenant_id: Uuid) -> LedgerResult<()> {
    let mut tx = pool.begin().await?;
    tenant_repo::deactivate_tx(&mut tx, tenant_id, None)
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))?;
    tx.commit().await?;

    tracing::info!(tenant_id = %tenant_id, "Tenant deactivated");
    Ok(())
}

/// Zero a daily tenant's collection and drop its date and account
pub async fn clear_daily_collection(pool: &PgPool, tenant_id: Uuid) -> LedgerResult<Tenant> {
    let mut tx = pool.begin().await?;

    let tenant = tenant_repo::find_by_id_for_update_tx(&mut tx, tenant_id)
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))?;
    if !tenant.daily_accommodation {
        return Err(LedgerError::InvalidState(format!(
            "daily collection can only be cleared for daily accommodation tenants ({})",
            tenant_id
        )));
    }

    let tenant = tenant_repo::clear_daily_collection_tx(&mut tx, tenant_id).await?;
    tx.commit().await?;

    tracing::info!(tenant_id = %tenant_id, "Daily collection cleared");
    Ok(tenant)
}

pub async fn find_tenant(pool: &PgPool, tenant_id: Uuid) -> LedgerResult<Tenant> {
    tenant_repo::find_by_id(pool, tenant_id)
        .await?
        .ok_or(LedgerError::TenantNotFound(tenant_id))
}

pub async fn list_active_monthly_tenants(pool: &PgPool) -> LedgerResult<Vec<Tenant>> {
    Ok(tenant_repo::list_active_monthly(pool).await?)
}

pub async fn list_active_daily_tenants(pool: &PgPool) -> LedgerResult<Vec<Tenant>> {
    Ok(tenant_repo::list_active_daily(pool).await?)
}

/// Reject unknown collection accounts before anything is written
async fn resolve_accounts_tx(tx: &mut Transaction<'_, Postgres>, draft: &TenantDraft) -> LedgerResult<()> {
    resolve_account_tx(tx, draft.daily_collection_account_id).await?;
    resolve_account_tx(tx, draft.joining_collection_account_id).await?;
    Ok(())
}

async fn check_identity_tx(
    tx: &mut Transaction<'_, Postgres>,
    fields: &TenantFields,
    excluding: Option<Uuid>,
) -> LedgerResult<()> {
    if fields.full_name.is_empty() {
        return Err(LedgerError::InvalidState("tenant full name is required".to_string()));
    }
    if fields.active && tenant_repo::active_name_exists_tx(tx, &fields.full_name, excluding).await? {
        return Err(LedgerError::DuplicateTenant(fields.full_name.clone()));
    }
    Ok(())
}

/// Write the joining month's row and mirror; the cached balance is left alone
async fn sync_joining_ledger_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &Tenant,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    let Some(obligation) = joining_obligation(tenant) else {
        return Ok(());
    };

    let entry = write_entry_tx(
        tx,
        tenant.id,
        obligation.billing_month,
        obligation.due_amount,
        obligation.paid_amount,
        tenant.joining_collection_account_id,
        now,
    )
    .await?;

    tracing::debug!(
        tenant_id = %tenant.id,
        entry_id = %entry.id,
        billing_month = %entry.billing_month,
        "Joining ledger synced"
    );
    Ok(())
}

/// Joining-month obligation, or None for daily tenants and unknown joining dates
pub fn joining_obligation(tenant: &Tenant) -> Option<JoiningObligation> {
    if tenant.daily_accommodation {
        return None;
    }
    let joining_date = tenant.joining_date?;

    let due_amount = tenant.rent + tenant.deposit;
    let paid_amount = (tenant.rent_paid_amount + tenant.deposit_paid_amount)
        .min(due_amount)
        .max(Decimal::ZERO);

    Some(JoiningObligation {
        billing_month: billing_month(joining_date),
        due_amount,
        paid_amount,
    })
}

/// Apply identity trimming and the daily/monthly financial rules
pub fn normalize_fields(draft: &TenantDraft, today: NaiveDate) -> TenantFields {
    let full_name = draft.full_name.trim().to_string();
    let room_number = draft.room_number.trim().to_string();
    let checkout_date = if draft.active { None } else { draft.checkout_date };

    if draft.daily_accommodation {
        let amount = draft.daily_collection_amount.max(Decimal::ZERO);
        let (transaction_date, account_id) = if amount > Decimal::ZERO {
            let date = draft
                .daily_collection_transaction_date
                .or(draft.joining_date)
                .unwrap_or(today);
            (Some(date), draft.daily_collection_account_id)
        } else {
            (None, None)
        };

        return TenantFields {
            full_name,
            room_number,
            joining_date: draft.joining_date,
            active: draft.active,
            daily_accommodation: true,
            rent: draft.rent.max(Decimal::ZERO),
            deposit: Decimal::ZERO,
            rent_paid_amount: Decimal::ZERO,
            deposit_paid_amount: Decimal::ZERO,
            rent_due_amount: Decimal::ZERO,
            payment_status: PaymentStatus::OnTime,
            daily_collection_amount: amount,
            daily_collection_transaction_date: transaction_date,
            daily_collection_account_id: account_id,
            daily_stay_days: Some(draft.daily_stay_days.unwrap_or(1).max(1)),
            joining_collection_account_id: None,
            checkout_date,
        };
    }

    let rent = draft.rent.max(Decimal::ZERO);
    let deposit = draft.deposit.max(Decimal::ZERO);
    let rent_paid = draft.rent_paid_amount.min(rent).max(Decimal::ZERO);
    let deposit_paid = draft.deposit_paid_amount.min(deposit).max(Decimal::ZERO);
    let rent_due = rent - rent_paid;

    let joining_account = if rent_paid + deposit_paid > Decimal::ZERO {
        draft.joining_collection_account_id
    } else {
        None
    };
    let payment_status = if rent_due == Decimal::ZERO {
        PaymentStatus::OnTime
    } else if rent_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Due
    };

    TenantFields {
        full_name,
        room_number,
        joining_date: draft.joining_date,
        active: draft.active,
        daily_accommodation: false,
        rent,
        deposit,
        rent_paid_amount: rent_paid,
        deposit_paid_amount: deposit_paid,
        rent_due_amount: rent_due,
        payment_status,
        daily_collection_amount: Decimal::ZERO,
        daily_collection_transaction_date: None,
        daily_collection_account_id: None,
        daily_stay_days: None,
        joining_collection_account_id: joining_account,
        checkout_date,
    }
}
