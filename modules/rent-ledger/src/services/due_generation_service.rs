//! Due generation scheduler
//!
//! Runs inline before every due listing. For each active monthly tenant it
//! creates at most one obligation for the current month, anchored to the
//! tenant's anniversary day, and advances the tenant's cursor. Historical
//! months are never backfilled.
//!
//! Each tenant is handled in its own transaction with the tenant row locked.
//! The insert uses `ON CONFLICT DO NOTHING`, so a concurrent pass (or a manual
//! upsert) for the same (tenant, month) leaves exactly one row.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use crate::billing::{billing_month, scheduled_due_date};
use crate::error::LedgerResult;
use crate::repos::{due_repo, tenant_repo};

/// Outcome of one scheduler pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Active monthly tenants considered
    pub examined: usize,
    /// New due entries inserted
    pub created: usize,
    /// Tenants that were due but already had a row for the month
    pub already_present: usize,
    /// Cursor updates written
    pub cursors_advanced: usize,
}

/// Generate the current month's obligations for every eligible tenant
pub async fn generate_due_entries(pool: &PgPool, today: NaiveDate) -> LedgerResult<GenerationReport> {
    let tenants = tenant_repo::list_active_monthly(pool).await?;
    let current_month = billing_month(today);
    let mut report = GenerationReport::default();

    for candidate in tenants {
        report.examined += 1;

        let Some(joining_date) = candidate.joining_date else {
            continue;
        };
        if scheduled_due_date(joining_date, candidate.last_due_generated_for, today).is_none() {
            continue;
        }

        let mut tx = pool.begin().await?;

        // Re-read under lock: another pass may have advanced the cursor
        let Some(tenant) = tenant_repo::find_by_id_for_update_tx(&mut tx, candidate.id).await? else {
            continue;
        };
        if !tenant.active || tenant.daily_accommodation {
            continue;
        }
        let Some(joining_date) = tenant.joining_date else {
            continue;
        };
        let Some(due_date) = scheduled_due_date(joining_date, tenant.last_due_generated_for, today)
        else {
            continue;
        };

        let created =
            due_repo::insert_generated_tx(&mut tx, tenant.id, current_month, tenant.rent).await?;
        if created {
            report.created += 1;
            tracing::info!(
                tenant_id = %tenant.id,
                billing_month = %current_month,
                due_date = %due_date,
                due_amount = %tenant.rent,
                "Generated monthly due entry"
            );
        } else {
            report.already_present += 1;
            tracing::debug!(
                tenant_id = %tenant.id,
                billing_month = %current_month,
                "Due entry already present for month"
            );
        }

        if tenant.last_due_generated_for != Some(due_date) {
            tenant_repo::set_last_due_generated_for_tx(&mut tx, tenant.id, due_date).await?;
            report.cursors_advanced += 1;
        }

        tx.commit().await?;
    }

    if report.created > 0 {
        tracing::info!(
            examined = report.examined,
            created = report.created,
            cursors_advanced = report.cursors_advanced,
            "Due generation pass complete"
        );
    }

    Ok(report)
}
