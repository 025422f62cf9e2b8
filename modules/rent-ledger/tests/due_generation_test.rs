//! Scheduler integration tests
//!
//! The scheduler considers every active monthly tenant in the database, so
//! assertions look only at the rows of tenants created by each test.
//!
//! Run with: cargo test -p rent-ledger --test due_generation_test -- --ignored

mod common;

use chrono::Utc;
use common::*;
use rent_ledger::generate_due_entries;
use rent_ledger::repos::{due_repo, tenant_repo};
use rent_ledger::services::ledger_service::{self, UpsertDueRequest};
use rent_ledger::services::{report_service, tenant_service};
use rent_ledger::DueStatus;
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore] // Run explicitly with: cargo test --test due_generation_test -- --ignored
async fn test_long_unbilled_tenant_gets_one_current_entry() {
    let pool = get_test_pool().await;
    let today = date(2026, 10, 19);
    let tenant = setup_joined_tenant(&pool, date(2025, 8, 5), 6000, 0).await;
    // Joining month row only
    assert_eq!(count_due_rows(&pool, tenant.id).await, 1);

    generate_due_entries(&pool, today).await.expect("pass failed");

    assert_eq!(count_due_rows(&pool, tenant.id).await, 2);
    let entry = due_repo::find_by_tenant_month(&pool, tenant.id, date(2026, 10, 1))
        .await
        .unwrap()
        .expect("current month not generated");
    assert_eq!(entry.due_amount, amount(6000));
    assert_eq!(entry.paid_amount, amount(0));
    assert_eq!(entry.status, DueStatus::Due);
    assert!(entry.account_id.is_none());

    let reloaded = tenant_repo::find_by_id(&pool, tenant.id).await.unwrap().unwrap();
    assert_eq!(reloaded.last_due_generated_for, Some(date(2026, 10, 4)));

    cleanup_test_tenant(&pool, tenant.id).await;
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_second_pass_is_a_no_op() {
    let pool = get_test_pool().await;
    let today = date(2026, 10, 19);
    let tenant = setup_joined_tenant(&pool, date(2026, 6, 10), 4500, 0).await;

    generate_due_entries(&pool, today).await.unwrap();
    let rows_after_first = count_due_rows(&pool, tenant.id).await;
    let cursor_after_first = tenant_repo::find_by_id(&pool, tenant.id)
        .await
        .unwrap()
        .unwrap()
        .last_due_generated_for;

    generate_due_entries(&pool, today).await.unwrap();
    assert_eq!(count_due_rows(&pool, tenant.id).await, rows_after_first);
    let cursor_after_second = tenant_repo::find_by_id(&pool, tenant.id)
        .await
        .unwrap()
        .unwrap()
        .last_due_generated_for;
    assert_eq!(cursor_after_first, cursor_after_second);

    cleanup_test_tenant(&pool, tenant.id).await;
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_before_anniversary_nothing_generated() {
    let pool = get_test_pool().await;
    let tenant = setup_joined_tenant(&pool, date(2026, 10, 2), 4500, 9000).await;

    // First anniversary eve is Nov 1
    generate_due_entries(&pool, date(2026, 10, 19)).await.unwrap();
    assert_eq!(count_due_rows(&pool, tenant.id).await, 1);

    generate_due_entries(&pool, date(2026, 11, 1)).await.unwrap();
    let entry = due_repo::find_by_tenant_month(&pool, tenant.id, date(2026, 11, 1))
        .await
        .unwrap()
        .expect("November entry expected");
    assert_eq!(entry.due_amount, amount(4500));

    cleanup_test_tenant(&pool, tenant.id).await;
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_inactive_and_daily_tenants_skipped() {
    let pool = get_test_pool().await;
    let today = date(2026, 10, 19);
    let checked_out = setup_joined_tenant(&pool, date(2025, 1, 3), 5000, 0).await;
    tenant_service::checkout_tenant(&pool, checked_out.id, today).await.unwrap();

    let daily = create_tenant(
        &pool,
        &tenant_service::TenantDraft {
            full_name: unique_name("Daily Guest"),
            room_number: "D-1".to_string(),
            joining_date: Some(date(2025, 1, 3)),
            daily_accommodation: true,
            rent: amount(700),
            ..Default::default()
        },
    )
    .await;

    generate_due_entries(&pool, today).await.unwrap();
    // Joining row only for the checked-out tenant, nothing for the daily one
    assert_eq!(count_due_rows(&pool, checked_out.id).await, 1);
    assert_eq!(count_due_rows(&pool, daily.id).await, 0);

    cleanup_test_tenant(&pool, checked_out.id).await;
    cleanup_test_tenant(&pool, daily.id).await;
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_manual_entry_wins_over_generation() {
    let pool = get_test_pool().await;
    let today = date(2026, 10, 19);
    let tenant = setup_joined_tenant(&pool, date(2026, 3, 8), 5000, 0).await;

    let manual = UpsertDueRequest {
        tenant_id: tenant.id,
        billing_month: date(2026, 10, 1),
        due_amount: amount(5200),
        paid_amount: amount(5200),
        account_id: None,
    };
    let (upserted, generated) = tokio::join!(
        ledger_service::upsert_due(&pool, &manual, Utc::now()),
        generate_due_entries(&pool, today),
    );
    upserted.expect("upsert failed");
    generated.expect("pass failed");

    let october: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM due_entries WHERE tenant_id = $1 AND billing_month = $2",
    )
    .bind(tenant.id)
    .bind(date(2026, 10, 1))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(october, 1);

    cleanup_test_tenant(&pool, tenant.id).await;
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_list_due_triggers_generation() {
    let pool = get_test_pool().await;
    let today = date(2026, 10, 19);
    let tenant = setup_joined_tenant(&pool, date(2026, 7, 12), 3900, 0).await;

    let rows = report_service::list_due(&pool, None, None, today).await.unwrap();
    let mine: Vec<_> = rows.iter().filter(|r| r.tenant_id == tenant.id).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].billing_month, date(2026, 10, 1));
    assert_eq!(mine[0].status, DueStatus::Due);

    cleanup_test_tenant(&pool, tenant.id).await;
}
