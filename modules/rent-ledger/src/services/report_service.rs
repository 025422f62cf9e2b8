//! Reporting aggregator
//!
//! Read-side views over the due ledger, the collection mirror and the
//! daily-accommodation fields on tenants. All ranges are whole months, see
//! [`ReportRange::resolve`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::billing::ReportRange;
use crate::error::{LedgerError, LedgerResult};
use crate::repos::due_repo::{self, LedgerView};
use crate::repos::tenant_repo::{self, Tenant};
use crate::repos::{account_repo, collection_repo};
use crate::services::csv_export::{self, ExportRow};
use crate::services::due_generation_service::generate_due_entries;

/// Dashboard totals for a reporting range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_rent_collection: Decimal,
    pub total_due_amount: Decimal,
    /// Same figure as `total_due_amount`; kept as its own field for clients
    pub total_pending_collection: Decimal,
    /// Currently active tenants, not range-filtered
    pub active_tenants: i64,
}

/// Paid and outstanding joining-month figures for one tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoiningFigures {
    pub paid: Decimal,
    pub outstanding: Decimal,
}

impl From<&Tenant> for JoiningFigures {
    fn from(tenant: &Tenant) -> Self {
        let deposit_outstanding = (tenant.deposit - tenant.deposit_paid_amount).max(Decimal::ZERO);
        JoiningFigures {
            paid: tenant.rent_paid_amount + tenant.deposit_paid_amount,
            outstanding: tenant.rent_due_amount + deposit_outstanding,
        }
    }
}

/// Outstanding ledger entries billed in the range
///
/// Runs a scheduler pass first so the current month's obligations exist.
pub async fn list_due(
    pool: &PgPool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> LedgerResult<Vec<LedgerView>> {
    generate_due_entries(pool, today).await?;

    let range = ReportRange::resolve(from, to, today);
    let rows = due_repo::list_outstanding_views(pool, range.start, range.end).await?;
    tracing::debug!(start = %range.start, end = %range.end, rows = rows.len(), "Listed due entries");
    Ok(rows)
}

/// Collections received in the range, newest first
pub async fn list_collected(
    pool: &PgPool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> LedgerResult<Vec<LedgerView>> {
    let range = ReportRange::resolve(from, to, today);
    let (window_start, window_end) = range.timestamp_window();
    Ok(collection_repo::list_views_between(pool, window_start, window_end).await?)
}

pub async fn dashboard(
    pool: &PgPool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> LedgerResult<DashboardSummary> {
    let range = ReportRange::resolve(from, to, today);
    let (window_start, window_end) = range.timestamp_window();

    let collected = collection_repo::sum_collected_between(pool, window_start, window_end).await?;
    let due = due_repo::sum_due_between(pool, range.start, range.end).await?;
    let joining = tenant_repo::list_monthly_joined_between(pool, range.start, range.end).await?;
    let active = tenant_repo::count_active(pool).await?;

    let summary = summarize(collected, due, joining.iter().map(JoiningFigures::from), active);
    tracing::debug!(
        start = %range.start,
        end = %range.end,
        total_rent_collection = %summary.total_rent_collection,
        total_due_amount = %summary.total_due_amount,
        "Computed dashboard summary"
    );
    Ok(summary)
}

/// CSV of regular and daily collections in the range
///
/// With `account_id`, only collections booked to that account are included.
pub async fn export_csv(
    pool: &PgPool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    account_id: Option<Uuid>,
    today: NaiveDate,
) -> LedgerResult<Vec<u8>> {
    if let Some(id) = account_id {
        account_repo::find_by_id(pool, id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
    }

    let range = ReportRange::resolve(from, to, today);
    let (window_start, window_end) = range.timestamp_window();

    let regular =
        collection_repo::list_export_rows_between(pool, window_start, window_end, account_id).await?;
    let daily =
        tenant_repo::list_daily_collections_between(pool, range.start, range.end, account_id).await?;

    let rows: Vec<ExportRow> = regular
        .into_iter()
        .map(ExportRow::from)
        .chain(daily.into_iter().map(ExportRow::from))
        .collect();
    let row_count = rows.len();

    let bytes = csv_export::render_csv(rows)?;
    tracing::info!(
        start = %range.start,
        end = %range.end,
        rows = row_count,
        "Exported collection report"
    );
    Ok(bytes)
}

/// Dashboard arithmetic over pre-aggregated figures
///
/// Ledger over-collection in the range never makes the due figure negative.
/// The joining month may also exist as a synced ledger row, in which case it
/// contributes through both terms.
pub fn summarize(
    collected: Decimal,
    due: Decimal,
    joining: impl IntoIterator<Item = JoiningFigures>,
    active_tenants: i64,
) -> DashboardSummary {
    let (joining_paid, joining_outstanding) = joining
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(paid, outstanding), figures| {
            (paid + figures.paid, outstanding + figures.outstanding)
        });

    let ledger_pending = (due - collected).max(Decimal::ZERO);
    let total_due = ledger_pending + joining_outstanding;

    DashboardSummary {
        total_rent_collection: collected + joining_paid,
        total_due_amount: total_due,
        total_pending_collection: total_due,
        active_tenants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payment_leaves_difference_due() {
        let summary = summarize(Decimal::from(2000), Decimal::from(5000), [], 3);
        assert_eq!(summary.total_due_amount, Decimal::from(3000));
        assert_eq!(summary.total_pending_collection, Decimal::from(3000));
        assert_eq!(summary.total_rent_collection, Decimal::from(2000));
        assert_eq!(summary.active_tenants, 3);
    }

    #[test]
    fn test_over_collection_floors_due_at_zero() {
        let summary = summarize(Decimal::from(6000), Decimal::from(5000), [], 1);
        assert_eq!(summary.total_due_amount, Decimal::ZERO);
        assert_eq!(summary.total_rent_collection, Decimal::from(6000));
    }

    #[test]
    fn test_joining_figures_are_added() {
        let joining = [
            JoiningFigures {
                paid: Decimal::from(7000),
                outstanding: Decimal::from(3000),
            },
            JoiningFigures {
                paid: Decimal::ZERO,
                outstanding: Decimal::from(12000),
            },
        ];
        let summary = summarize(Decimal::from(1000), Decimal::from(4000), joining, 5);
        assert_eq!(summary.total_rent_collection, Decimal::from(8000));
        assert_eq!(summary.total_due_amount, Decimal::from(18000));
    }

    #[test]
    fn test_joining_over_collection_does_not_offset_ledger_due() {
        let joining = [JoiningFigures {
            paid: Decimal::from(10000),
            outstanding: Decimal::ZERO,
        }];
        let summary = summarize(Decimal::ZERO, Decimal::from(5000), joining, 1);
        assert_eq!(summary.total_due_amount, Decimal::from(5000));
    }
}
