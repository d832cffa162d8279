//! Integration tests for case notes, care plans and medication records.

mod common;

use chrono::NaiveDate;
use serde_json::json;

use carebase_core::records::{CarePlanStatus, CaseNoteCategory, RecordError};
use carebase_db::{
    CarePlanRepository, CaseNoteRepository, MedicationRepository,
    entities::sea_orm_active_enums::{self, UserRole},
    repositories::{
        CarePlanError, CaseNoteError, CreateCarePlanInput, CreateCaseNoteInput,
        RecordMedicationInput, UpdateCarePlanInput, UpdateCaseNoteInput,
    },
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_case_note_tags_archive_and_visibility() {
    let db = common::connect().await;
    let tenant = common::create_tenant(&db).await;
    let other = common::create_tenant(&db).await;
    let author = common::create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let client = common::create_client(&db, tenant.id).await;
    let repo = CaseNoteRepository::new(db.clone());

    let note = repo
        .create(CreateCaseNoteInput {
            tenant_id: tenant.id,
            client_id: client.id,
            author_id: author.id,
            shift_id: None,
            title: "Morning visit".to_string(),
            body: "Breakfast and medication prompt.".to_string(),
            category: CaseNoteCategory::Progress,
            tags: vec![" Meals ".to_string(), "meals".to_string(), String::new()],
        })
        .await
        .expect("Failed to create note");
    assert_eq!(note.tags, json!(["meals"]));

    assert!(repo.find(other.id, note.id).await.unwrap().is_none());

    let updated = repo
        .update(
            tenant.id,
            note.id,
            UpdateCaseNoteInput {
                title: Some("Morning visit (edited)".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update note");
    assert_eq!(updated.title, "Morning visit (edited)");

    let archived = repo.archive(tenant.id, note.id).await.unwrap();
    assert!(archived.archived_at.is_some());
    let again = repo.archive(tenant.id, note.id).await.unwrap();
    assert_eq!(again.archived_at, archived.archived_at);

    let err = repo
        .update(tenant.id, note.id, UpdateCaseNoteInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CaseNoteError::Record(RecordError::Archived)));

    let visible = repo.list_for_client(tenant.id, client.id, false).await.unwrap();
    assert!(visible.is_empty());
    let all = repo.list_for_client(tenant.id, client.id, true).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_case_note_rejects_client_from_other_tenant() {
    let db = common::connect().await;
    let tenant = common::create_tenant(&db).await;
    let other = common::create_tenant(&db).await;
    let author = common::create_user(&db, tenant.id, UserRole::Coordinator).await;
    let foreign_client = common::create_client(&db, other.id).await;

    let err = CaseNoteRepository::new(db.clone())
        .create(CreateCaseNoteInput {
            tenant_id: tenant.id,
            client_id: foreign_client.id,
            author_id: author.id,
            shift_id: None,
            title: "Note".to_string(),
            body: "Body".to_string(),
            category: CaseNoteCategory::General,
            tags: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CaseNoteError::ClientNotFound(id) if id == foreign_client.id));
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_care_plan_lifecycle() {
    let db = common::connect().await;
    let tenant = common::create_tenant(&db).await;
    let author = common::create_user(&db, tenant.id, UserRole::Coordinator).await;
    let client = common::create_client(&db, tenant.id).await;
    let repo = CarePlanRepository::new(db.clone());

    let plan = repo
        .create(CreateCarePlanInput {
            tenant_id: tenant.id,
            client_id: client.id,
            author_id: author.id,
            title: "2025 support plan".to_string(),
            summary: None,
            goals: vec!["Cook two meals a week".to_string()],
            start_date: date(2025, 7, 1),
            review_date: Some(date(2026, 1, 1)),
        })
        .await
        .expect("Failed to create plan");
    assert_eq!(plan.status, sea_orm_active_enums::CarePlanStatus::Draft);

    let err = repo
        .update(
            tenant.id,
            plan.id,
            UpdateCarePlanInput {
                review_date: Some(Some(date(2025, 6, 1))),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CarePlanError::Record(RecordError::ReviewBeforeStart { .. })
    ));

    let active = repo
        .set_status(tenant.id, plan.id, CarePlanStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.status, sea_orm_active_enums::CarePlanStatus::Active);

    repo.set_status(tenant.id, plan.id, CarePlanStatus::Archived)
        .await
        .unwrap();
    let err = repo
        .set_status(tenant.id, plan.id, CarePlanStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CarePlanError::Record(RecordError::InvalidTransition { .. })
    ));

    let plans = repo.list_for_client(tenant.id, client.id).await.unwrap();
    assert_eq!(plans.len(), 1);
}

#[tokio::test]
#[ignore = "requires a migrated PostgreSQL database"]
async fn test_medication_records_listed_newest_first() {
    let db = common::connect().await;
    let tenant = common::create_tenant(&db).await;
    let worker = common::create_user(&db, tenant.id, UserRole::SupportWorker).await;
    let client = common::create_client(&db, tenant.id).await;
    let repo = MedicationRepository::new(db.clone());

    for hour in [8, 20] {
        repo.record(RecordMedicationInput {
            tenant_id: tenant.id,
            client_id: client.id,
            recorded_by: worker.id,
            medication_name: "Paracetamol".to_string(),
            dosage: "500mg".to_string(),
            route: Some("oral".to_string()),
            administered_at: common::at(2025, 3, 10, hour, 0),
            notes: None,
        })
        .await
        .expect("Failed to record medication");
    }

    let records = repo.list_for_client(tenant.id, client.id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].administered_at > records[1].administered_at);
}
