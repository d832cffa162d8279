//! Shift repository for rostering.
//!
//! Shifts are never physically deleted; they end in `completed` or
//! `cancelled`. A recurring request is written in a single transaction so a
//! failure never leaves part of a series behind.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use carebase_core::roster::{
    self, BookedShift, RecurrenceError, RecurrenceRule, ShiftError, ShiftLifecycle, TimeRange,
};
use carebase_shared::types::ShiftId;

use crate::entities::{sea_orm_active_enums::ShiftStatus, shifts, users};

use super::client::client_in_tenant;

/// Error types for shift operations.
#[derive(Debug, thiserror::Error)]
pub enum ShiftRepoError {
    /// Shift not found in the tenant.
    #[error("Shift not found: {0}")]
    NotFound(Uuid),

    /// Referenced client not found in the tenant.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Referenced staff member not found or inactive.
    #[error("Staff member not found: {0}")]
    AssigneeNotFound(Uuid),

    /// The target status needs an assigned staff member.
    #[error("Shift must have an assigned staff member")]
    AssigneeRequired,

    /// The caller may not make this move on this shift.
    #[error("Not allowed to move this shift to {0}")]
    NotPermitted(roster::ShiftStatus),

    /// The shift is already on an invoice.
    #[error("Shift has been invoiced and can no longer change")]
    AlreadyInvoiced,

    /// Recurrence rule rejected.
    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    /// Lifecycle rule rejected.
    #[error(transparent)]
    Lifecycle(#[from] ShiftError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a shift, or the first shift of a series.
#[derive(Debug, Clone)]
pub struct CreateShiftInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Short description.
    pub title: String,
    /// Client receiving support.
    pub client_id: Option<Uuid>,
    /// Staff member rostered on.
    pub assigned_user_id: Option<Uuid>,
    /// Start (wall clock).
    pub start_time: NaiveDateTime,
    /// End (wall clock).
    pub end_time: NaiveDateTime,
    /// Free-text notes.
    pub notes: Option<String>,
    /// User creating the shift.
    pub created_by: Option<Uuid>,
}

/// Partial shift update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateShiftInput {
    /// Short description.
    pub title: Option<String>,
    /// Client, or `Some(None)` to clear.
    pub client_id: Option<Option<Uuid>>,
    /// Assignee, or `Some(None)` to unassign.
    pub assigned_user_id: Option<Option<Uuid>>,
    /// Start.
    pub start_time: Option<NaiveDateTime>,
    /// End.
    pub end_time: Option<NaiveDateTime>,
    /// Notes, or `Some(None)` to clear.
    pub notes: Option<Option<String>>,
}

/// Filter options for listing shifts.
#[derive(Debug, Clone, Default)]
pub struct ShiftFilter {
    /// Shifts ending after this instant.
    pub from: Option<NaiveDateTime>,
    /// Shifts starting before this instant.
    pub to: Option<NaiveDateTime>,
    /// Assigned staff member.
    pub assigned_user_id: Option<Uuid>,
    /// Client.
    pub client_id: Option<Uuid>,
    /// Status.
    pub status: Option<ShiftStatus>,
    /// Series.
    pub series_id: Option<Uuid>,
}

/// Shifts created from one recurrence request.
#[derive(Debug, Clone)]
pub struct CreatedSeries {
    /// Identifier shared by every shift.
    pub series_id: Uuid,
    /// Stored shifts in start order.
    pub shifts: Vec<shifts::Model>,
}

/// Shift repository.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    db: DatabaseConnection,
}

impl ShiftRepository {
    /// Creates a new shift repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a single shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the time range is invalid, the client or assignee
    /// is not in the tenant, or the insert fails.
    pub async fn create_one(&self, input: CreateShiftInput) -> Result<shifts::Model, ShiftRepoError> {
        roster::validate_time_range(input.start_time, input.end_time)?;
        self.check_references(input.tenant_id, input.client_id, input.assigned_user_id)
            .await?;

        let shift = new_shift(&input, input.start_time, input.end_time, None)
            .insert(&self.db)
            .await?;

        tracing::debug!(tenant_id = %input.tenant_id, shift_id = %shift.id, "Shift created");
        Ok(shift)
    }

    /// Expands a recurrence rule and stores every occurrence.
    ///
    /// The input's start and end define the first shift; its length is the
    /// length of every occurrence.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule is rejected, a reference is not in the
    /// tenant, or any insert fails. Nothing is stored on error.
    pub async fn create_series(
        &self,
        input: CreateShiftInput,
        rule: RecurrenceRule,
    ) -> Result<CreatedSeries, ShiftRepoError> {
        let series = roster::generate(input.start_time, input.end_time - input.start_time, rule)?;
        self.check_references(input.tenant_id, input.client_id, input.assigned_user_id)
            .await?;

        let series_id = series.series_id.into_inner();
        let txn = self.db.begin().await?;

        let mut created = Vec::with_capacity(series.len());
        for occurrence in &series.occurrences {
            let shift = new_shift(&input, occurrence.start, occurrence.end, Some(series_id))
                .insert(&txn)
                .await?;
            created.push(shift);
        }

        txn.commit().await?;

        tracing::info!(
            tenant_id = %input.tenant_id,
            series_id = %series_id,
            occurrences = created.len(),
            frequency = rule.frequency.as_str(),
            "Shift series created"
        );

        Ok(CreatedSeries {
            series_id,
            shifts: created,
        })
    }

    /// Finds a shift within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<shifts::Model>, DbErr> {
        shifts::Entity::find_by_id(id)
            .filter(shifts::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
    }

    /// Lists shifts in start order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, tenant_id: Uuid, filter: ShiftFilter) -> Result<Vec<shifts::Model>, DbErr> {
        let mut query = shifts::Entity::find().filter(shifts::Column::TenantId.eq(tenant_id));

        if let Some(from) = filter.from {
            query = query.filter(shifts::Column::EndTime.gt(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(shifts::Column::StartTime.lt(to));
        }
        if let Some(user_id) = filter.assigned_user_id {
            query = query.filter(shifts::Column::AssignedUserId.eq(user_id));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(shifts::Column::ClientId.eq(client_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(shifts::Column::Status.eq(status));
        }
        if let Some(series_id) = filter.series_id {
            query = query.filter(shifts::Column::SeriesId.eq(series_id));
        }

        query
            .order_by_asc(shifts::Column::StartTime)
            .order_by_asc(shifts::Column::Id)
            .all(&self.db)
            .await
    }

    /// Applies a partial update.
    ///
    /// Changing the assignee moves the status to `assigned` or `unassigned`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shift is missing or invoiced, the new time
    /// range is invalid, the assignee is locked or not in the tenant.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateShiftInput,
    ) -> Result<shifts::Model, ShiftRepoError> {
        let existing = self
            .find(tenant_id, id)
            .await?
            .ok_or(ShiftRepoError::NotFound(id))?;

        if existing.invoice_id.is_some() {
            return Err(ShiftRepoError::AlreadyInvoiced);
        }

        let current: roster::ShiftStatus = existing.status.into();
        if current.is_terminal() {
            return Err(ShiftError::AssignmentLocked(current).into());
        }

        let start = input.start_time.unwrap_or(existing.start_time);
        let end = input.end_time.unwrap_or(existing.end_time);
        roster::validate_time_range(start, end)?;

        let client_id = input.client_id.flatten();
        let assignee = input.assigned_user_id.flatten();
        self.check_references(tenant_id, client_id, assignee).await?;

        let mut shift: shifts::ActiveModel = existing.into();

        if let Some(assigned_user_id) = input.assigned_user_id {
            let status = ShiftLifecycle::status_for_assignment(current, assigned_user_id.is_some())?;
            shift.assigned_user_id = Set(assigned_user_id);
            shift.status = Set(status.into());
        }
        if let Some(title) = input.title {
            shift.title = Set(title);
        }
        if let Some(client_id) = input.client_id {
            shift.client_id = Set(client_id);
        }
        if let Some(notes) = input.notes {
            shift.notes = Set(notes);
        }
        shift.start_time = Set(start);
        shift.end_time = Set(end);
        shift.updated_at = Set(Utc::now().into());

        Ok(shift.update(&self.db).await?)
    }

    /// Moves a shift to a new status.
    ///
    /// `requested` records `requested_by` as the assignee; `unassigned`
    /// clears the assignee; `assigned` needs one already set.
    ///
    /// # Errors
    ///
    /// Returns an error if the shift is missing, invoiced, or the move is not
    /// allowed.
    pub async fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: roster::ShiftStatus,
        requested_by: Uuid,
    ) -> Result<shifts::Model, ShiftRepoError> {
        self.transition_if(tenant_id, id, to, requested_by, |_| true)
            .await
    }

    /// Like [`Self::transition`], but first asks `permit` whether the caller
    /// may move the shift as it currently stands.
    ///
    /// The row stays locked from the read until the update commits, so two
    /// concurrent requests for the same shift are applied one after the other
    /// and the second sees the first one's result.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftRepoError::NotPermitted`] if `permit` refuses, otherwise
    /// as [`Self::transition`].
    pub async fn transition_if<F>(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: roster::ShiftStatus,
        requested_by: Uuid,
        permit: F,
    ) -> Result<shifts::Model, ShiftRepoError>
    where
        F: FnOnce(&shifts::Model) -> bool + Send,
    {
        let txn = self.db.begin().await?;

        let existing = shifts::Entity::find_by_id(id)
            .filter(shifts::Column::TenantId.eq(tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ShiftRepoError::NotFound(id))?;

        if !permit(&existing) {
            return Err(ShiftRepoError::NotPermitted(to));
        }
        if existing.invoice_id.is_some() {
            return Err(ShiftRepoError::AlreadyInvoiced);
        }

        let from: roster::ShiftStatus = existing.status.into();
        let status = ShiftLifecycle::transition(from, to)?;
        let assignee = assignee_after(status, existing.assigned_user_id, requested_by)?;

        let mut shift: shifts::ActiveModel = existing.into();
        shift.status = Set(status.into());
        shift.assigned_user_id = Set(assignee);
        shift.updated_at = Set(Utc::now().into());

        let shift = shift.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(tenant_id = %tenant_id, shift_id = %id, from = %from, to = %status, "Shift status changed");
        Ok(shift)
    }

    /// Cancels the non-terminal, unbilled shifts of a series starting at or
    /// after `from`, or all of them without a bound. Returns the number cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn cancel_series(
        &self,
        tenant_id: Uuid,
        series_id: Uuid,
        from: Option<NaiveDateTime>,
    ) -> Result<u64, DbErr> {
        let mut update = shifts::Entity::update_many()
            .col_expr(shifts::Column::Status, ShiftStatus::Cancelled.as_enum())
            .col_expr(shifts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(shifts::Column::TenantId.eq(tenant_id))
            .filter(shifts::Column::SeriesId.eq(series_id))
            .filter(shifts::Column::InvoiceId.is_null())
            .filter(shifts::Column::Status.is_not_in([ShiftStatus::Completed, ShiftStatus::Cancelled]));
        if let Some(from) = from {
            update = update.filter(shifts::Column::StartTime.gte(from));
        }

        let result = update.exec(&self.db).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            series_id = %series_id,
            cancelled = result.rows_affected,
            "Shift series cancelled"
        );
        Ok(result.rows_affected)
    }

    /// Returns true if any shift belongs to the series.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn series_exists(&self, tenant_id: Uuid, series_id: Uuid) -> Result<bool, DbErr> {
        let count = shifts::Entity::find()
            .filter(shifts::Column::TenantId.eq(tenant_id))
            .filter(shifts::Column::SeriesId.eq(series_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Shifts on a staff member's roster overlapping `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn booked_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<BookedShift>, DbErr> {
        let rows = shifts::Entity::find()
            .filter(shifts::Column::TenantId.eq(tenant_id))
            .filter(shifts::Column::AssignedUserId.eq(user_id))
            .filter(shifts::Column::Status.ne(ShiftStatus::Cancelled))
            .filter(shifts::Column::StartTime.lt(to))
            .filter(shifts::Column::EndTime.gt(from))
            .order_by_asc(shifts::Column::StartTime)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(booked).collect())
    }

    /// Completed shifts for a client, not yet invoiced, starting within the
    /// period (inclusive dates).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn completed_unbilled_for_client(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<shifts::Model>, DbErr> {
        unbilled_query(tenant_id, client_id, period_start, period_end)
            .all(&self.db)
            .await
    }

    async fn check_references(
        &self,
        tenant_id: Uuid,
        client_id: Option<Uuid>,
        assigned_user_id: Option<Uuid>,
    ) -> Result<(), ShiftRepoError> {
        if let Some(client_id) = client_id {
            if !client_in_tenant(&self.db, tenant_id, client_id).await? {
                return Err(ShiftRepoError::ClientNotFound(client_id));
            }
        }
        if let Some(user_id) = assigned_user_id {
            if !active_staff_in_tenant(&self.db, tenant_id, user_id).await? {
                return Err(ShiftRepoError::AssigneeNotFound(user_id));
            }
        }
        Ok(())
    }
}

/// Query for completed, uninvoiced shifts of a client starting in the period.
pub(crate) fn unbilled_query(
    tenant_id: Uuid,
    client_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Select<shifts::Entity> {
    let (from, until) = period_bounds(period_start, period_end);

    let mut query = shifts::Entity::find()
        .filter(shifts::Column::TenantId.eq(tenant_id))
        .filter(shifts::Column::ClientId.eq(client_id))
        .filter(shifts::Column::Status.eq(ShiftStatus::Completed))
        .filter(shifts::Column::InvoiceId.is_null())
        .filter(shifts::Column::StartTime.gte(from));
    if let Some(until) = until {
        query = query.filter(shifts::Column::StartTime.lt(until));
    }
    query.order_by_asc(shifts::Column::StartTime)
}

/// Converts an inclusive date period into `[from, until)` timestamps.
fn period_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, Option<NaiveDateTime>) {
    (
        start.and_time(NaiveTime::MIN),
        end.succ_opt().map(|day| day.and_time(NaiveTime::MIN)),
    )
}

/// Assignee after moving to `status`.
fn assignee_after(
    status: roster::ShiftStatus,
    current: Option<Uuid>,
    requested_by: Uuid,
) -> Result<Option<Uuid>, ShiftRepoError> {
    match status {
        roster::ShiftStatus::Requested => Ok(Some(requested_by)),
        roster::ShiftStatus::Unassigned => Ok(None),
        roster::ShiftStatus::Assigned if current.is_none() => Err(ShiftRepoError::AssigneeRequired),
        _ => Ok(current),
    }
}

fn booked(shift: shifts::Model) -> BookedShift {
    BookedShift {
        id: ShiftId::from_uuid(shift.id),
        range: TimeRange {
            start: shift.start_time,
            end: shift.end_time,
        },
        status: shift.status.into(),
    }
}

fn new_shift(
    input: &CreateShiftInput,
    start: NaiveDateTime,
    end: NaiveDateTime,
    series_id: Option<Uuid>,
) -> shifts::ActiveModel {
    let now = Utc::now().into();
    let status = ShiftLifecycle::initial_status(input.assigned_user_id.is_some());

    shifts::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(input.tenant_id),
        assigned_user_id: Set(input.assigned_user_id),
        client_id: Set(input.client_id),
        title: Set(input.title.clone()),
        start_time: Set(start),
        end_time: Set(end),
        status: Set(status.into()),
        series_id: Set(series_id),
        invoice_id: Set(None),
        notes: Set(input.notes.clone()),
        created_by: Set(input.created_by),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

async fn active_staff_in_tenant<C>(db: &C, tenant_id: Uuid, user_id: Uuid) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let count = users::Entity::find_by_id(user_id)
        .filter(users::Column::TenantId.eq(tenant_id))
        .filter(users::Column::IsActive.eq(true))
        .count(db)
        .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_bounds_include_whole_last_day() {
        let (from, until) = period_bounds(date(2025, 3, 1), date(2025, 3, 31));
        assert_eq!(from, date(2025, 3, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(until, Some(date(2025, 4, 1).and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_period_bounds_open_at_max_date() {
        let (_, until) = period_bounds(date(2025, 1, 1), NaiveDate::MAX);
        assert_eq!(until, None);
    }

    #[rstest]
    #[case(roster::ShiftStatus::Requested, None, Some(2))]
    #[case(roster::ShiftStatus::Requested, Some(1), Some(2))]
    #[case(roster::ShiftStatus::Unassigned, Some(1), None)]
    #[case(roster::ShiftStatus::Assigned, Some(1), Some(1))]
    #[case(roster::ShiftStatus::InProgress, Some(1), Some(1))]
    #[case(roster::ShiftStatus::Cancelled, None, None)]
    fn test_assignee_after(
        #[case] status: roster::ShiftStatus,
        #[case] current: Option<u128>,
        #[case] expected: Option<u128>,
    ) {
        let result = assignee_after(status, current.map(Uuid::from_u128), Uuid::from_u128(2)).unwrap();
        assert_eq!(result, expected.map(Uuid::from_u128));
    }

    #[test]
    fn test_assigning_without_assignee_is_rejected() {
        let result = assignee_after(roster::ShiftStatus::Assigned, None, Uuid::from_u128(2));
        assert!(matches!(result, Err(ShiftRepoError::AssigneeRequired)));
    }

    #[test]
    fn test_new_shift_status_follows_assignee() {
        let start = date(2025, 3, 3).and_hms_opt(9, 0, 0).unwrap();
        let mut input = CreateShiftInput {
            tenant_id: Uuid::now_v7(),
            title: "Community access".to_string(),
            client_id: None,
            assigned_user_id: None,
            start_time: start,
            end_time: start + chrono::TimeDelta::hours(3),
            notes: None,
            created_by: None,
        };

        let unassigned = new_shift(&input, input.start_time, input.end_time, None);
        assert_eq!(unassigned.status.as_ref(), &ShiftStatus::Unassigned);

        input.assigned_user_id = Some(Uuid::now_v7());
        let assigned = new_shift(&input, input.start_time, input.end_time, None);
        assert_eq!(assigned.status.as_ref(), &ShiftStatus::Assigned);
    }
}
