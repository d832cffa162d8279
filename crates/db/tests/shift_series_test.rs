//! Integration tests for shift series creation and cancellation.
//!
//! Requires a running `PostgreSQL` database with migrations applied.

mod common;

use carebase_core::roster::{RecurrenceEnd, RecurrenceRule, RepeatUnit, ShiftStatus};
use carebase_db::{
    ShiftRepository,
    entities::sea_orm_active_enums::{self, UserRole},
    repositories::{CreateShiftInput, ShiftFilter, ShiftRepoError},
};
use uuid::Uuid;

use common::{at, connect, create_client, create_tenant, create_user};

fn input(tenant_id: Uuid, client_id: Option<Uuid>, assigned_user_id: Option<Uuid>) -> CreateShiftInput {
    CreateShiftInput {
        tenant_id,
        title: "Personal care".to_string(),
        client_id,
        assigned_user_id,
        start_time: at(2025, 3, 3, 9, 0),
        end_time: at(2025, 3, 3, 12, 0),
        notes: None,
        created_by: None,
    }
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_weekly_series_is_stored_in_order() {
    let db = connect().await;
    let tenant = create_tenant(&db).await;
    let client = create_client(&db, tenant.id).await;
    let worker = create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let repo = ShiftRepository::new(db.clone());

    let rule = RecurrenceRule {
        frequency: RepeatUnit::Weekly,
        end: RecurrenceEnd::AfterOccurrences { count: 3 },
    };
    let created = repo
        .create_series(input(tenant.id, Some(client.id), Some(worker.id)), rule)
        .await
        .expect("Failed to create series");

    let starts: Vec<_> = created.shifts.iter().map(|s| s.start_time).collect();
    assert_eq!(
        starts,
        vec![at(2025, 3, 3, 9, 0), at(2025, 3, 10, 9, 0), at(2025, 3, 17, 9, 0)]
    );
    assert!(created.shifts.iter().all(|s| s.series_id == Some(created.series_id)));
    assert!(created.shifts.iter().all(|s| s.status == sea_orm_active_enums::ShiftStatus::Assigned));

    let listed = repo
        .list(
            tenant.id,
            ShiftFilter {
                series_id: Some(created.series_id),
                ..ShiftFilter::default()
            },
        )
        .await
        .expect("list failed");
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_series_for_foreign_client_stores_nothing() {
    let db = connect().await;
    let tenant = create_tenant(&db).await;
    let other = create_tenant(&db).await;
    let foreign_client = create_client(&db, other.id).await;
    let repo = ShiftRepository::new(db.clone());

    let rule = RecurrenceRule {
        frequency: RepeatUnit::Daily,
        end: RecurrenceEnd::AfterOccurrences { count: 5 },
    };
    let result = repo
        .create_series(input(tenant.id, Some(foreign_client.id), None), rule)
        .await;
    assert!(matches!(result, Err(ShiftRepoError::ClientNotFound(_))));

    let listed = repo.list(tenant.id, ShiftFilter::default()).await.expect("list failed");
    assert!(listed.is_empty());
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_cancel_series_from_midpoint() {
    let db = connect().await;
    let tenant = create_tenant(&db).await;
    let repo = ShiftRepository::new(db.clone());

    let rule = RecurrenceRule {
        frequency: RepeatUnit::Weekly,
        end: RecurrenceEnd::AfterOccurrences { count: 4 },
    };
    let created = repo
        .create_series(input(tenant.id, None, None), rule)
        .await
        .expect("Failed to create series");

    let cancelled = repo
        .cancel_series(tenant.id, created.series_id, Some(at(2025, 3, 10, 0, 0)))
        .await
        .expect("cancel failed");
    assert_eq!(cancelled, 3);

    let first = repo
        .find(tenant.id, created.shifts[0].id)
        .await
        .expect("find failed")
        .expect("first shift exists");
    assert_eq!(ShiftStatus::from(first.status), ShiftStatus::Unassigned);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_request_then_approve() {
    let db = connect().await;
    let tenant = create_tenant(&db).await;
    let worker = create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let repo = ShiftRepository::new(db.clone());

    let shift = repo
        .create_one(input(tenant.id, None, None))
        .await
        .expect("Failed to create shift");

    let requested = repo
        .transition(tenant.id, shift.id, ShiftStatus::Requested, worker.id)
        .await
        .expect("request failed");
    assert_eq!(requested.assigned_user_id, Some(worker.id));

    let approved = repo
        .transition(tenant.id, shift.id, ShiftStatus::Assigned, Uuid::now_v7())
        .await
        .expect("approve failed");
    assert_eq!(approved.assigned_user_id, Some(worker.id));
    assert_eq!(approved.status, sea_orm_active_enums::ShiftStatus::Assigned);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_concurrent_requests_for_one_shift() {
    let db = connect().await;
    let tenant = create_tenant(&db).await;
    let first = create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let second = create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let repo = ShiftRepository::new(db.clone());

    let shift = repo
        .create_one(input(tenant.id, None, None))
        .await
        .expect("Failed to create shift");

    let still_open =
        |s: &carebase_db::entities::shifts::Model| s.status == sea_orm_active_enums::ShiftStatus::Unassigned;
    let (a, b) = tokio::join!(
        repo.transition_if(tenant.id, shift.id, ShiftStatus::Requested, first.id, still_open),
        repo.transition_if(tenant.id, shift.id, ShiftStatus::Requested, second.id, still_open),
    );

    let (winner, loser) = match (a, b) {
        (Ok(_), Err(e)) => (first.id, e),
        (Err(e), Ok(_)) => (second.id, e),
        (a, b) => panic!("exactly one request must win: {a:?} / {b:?}"),
    };
    assert!(matches!(loser, ShiftRepoError::NotPermitted(ShiftStatus::Requested)));

    let stored = repo
        .find(tenant.id, shift.id)
        .await
        .expect("find failed")
        .expect("shift exists");
    assert_eq!(stored.assigned_user_id, Some(winner));
    assert_eq!(stored.status, sea_orm_active_enums::ShiftStatus::Requested);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_refused_transition_leaves_shift_unchanged() {
    let db = connect().await;
    let tenant = create_tenant(&db).await;
    let worker = create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let repo = ShiftRepository::new(db.clone());

    let shift = repo
        .create_one(input(tenant.id, None, None))
        .await
        .expect("Failed to create shift");

    let err = repo
        .transition_if(tenant.id, shift.id, ShiftStatus::Requested, worker.id, |_| false)
        .await
        .expect_err("refused move must fail");
    assert!(matches!(err, ShiftRepoError::NotPermitted(_)));

    let stored = repo
        .find(tenant.id, shift.id)
        .await
        .expect("find failed")
        .expect("shift exists");
    assert_eq!(stored.status, sea_orm_active_enums::ShiftStatus::Unassigned);
    assert_eq!(stored.assigned_user_id, None);
}
