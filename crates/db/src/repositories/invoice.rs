//! Invoice repository.
//!
//! Invoices are built from a client's completed, uninvoiced shifts. Pricing is
//! done by `carebase_core::billing`; this module loads the inputs, stores the
//! result and stamps the billed shifts, all in one transaction.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use carebase_core::billing::{
    self, BillableShift, BillingError, InvoiceTotals, PricedLine, RateCard, RateCardEntry,
};
use carebase_shared::types::{Money, PageRequest, PageResponse, ShiftId};

use crate::entities::{
    invoice_line_items, invoices, public_holidays, rate_card_items,
    sea_orm_active_enums::{self, InvoiceStatus, RateBand},
    shifts, tenants,
};

use super::client::client_in_tenant;
use super::shift::unbilled_query;

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found in the tenant.
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// Client not found in the tenant.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Billing period ends before it starts.
    #[error("Billing period end {end} is before its start {start}")]
    InvalidPeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Pricing or status rule rejected.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for invoicing a client's completed shifts.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Client being invoiced.
    pub client_id: Uuid,
    /// First day of the billing period.
    pub period_start: NaiveDate,
    /// Last day of the billing period (inclusive).
    pub period_end: NaiveDate,
    /// User creating the invoice.
    pub created_by: Uuid,
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Client.
    pub client_id: Option<Uuid>,
    /// Status.
    pub status: Option<InvoiceStatus>,
}

/// An invoice with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithLines {
    /// Invoice header.
    #[serde(flatten)]
    pub invoice: invoices::Model,
    /// Total hours billed.
    pub total_hours: Decimal,
    /// Lines in service order.
    pub lines: Vec<invoice_line_items::Model>,
}

impl InvoiceWithLines {
    fn new(invoice: invoices::Model, lines: Vec<invoice_line_items::Model>) -> Self {
        Self {
            total_hours: lines.iter().map(|line| line.hours).sum(),
            invoice,
            lines,
        }
    }
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the tenant's rate card.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn rate_card(&self, tenant_id: Uuid) -> Result<RateCard, DbErr> {
        load_rate_card(&self.db, tenant_id).await
    }

    /// Sets the price of a band, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn set_rate(
        &self,
        tenant_id: Uuid,
        band: billing::RateBand,
        entry: RateCardEntry,
    ) -> Result<rate_card_items::Model, DbErr> {
        let band: RateBand = band.into();
        let now = Utc::now().into();

        let existing = rate_card_items::Entity::find()
            .filter(rate_card_items::Column::TenantId.eq(tenant_id))
            .filter(rate_card_items::Column::RateBand.eq(band))
            .one(&self.db)
            .await?;

        match existing {
            Some(item) => {
                let mut item: rate_card_items::ActiveModel = item.into();
                item.support_item_number = Set(entry.support_item_number);
                item.description = Set(entry.description);
                item.hourly_rate = Set(entry.hourly_rate.amount());
                item.updated_at = Set(now);
                item.update(&self.db).await
            }
            None => {
                rate_card_items::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    tenant_id: Set(tenant_id),
                    rate_band: Set(band),
                    support_item_number: Set(entry.support_item_number),
                    description: Set(entry.description),
                    hourly_rate: Set(entry.hourly_rate.amount()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await
            }
        }
    }

    /// Adds a public holiday. Returns `None` if the date is already a holiday.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn add_holiday(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        name: &str,
    ) -> Result<Option<public_holidays::Model>, DbErr> {
        let exists = public_holidays::Entity::find()
            .filter(public_holidays::Column::TenantId.eq(tenant_id))
            .filter(public_holidays::Column::HolidayDate.eq(date))
            .count(&self.db)
            .await?
            > 0;
        if exists {
            return Ok(None);
        }

        public_holidays::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id),
            holiday_date: Set(date),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map(Some)
    }

    /// Invoices every completed, uninvoiced shift of a client starting within
    /// the period.
    ///
    /// The billed shifts are locked for the duration of the transaction and
    /// stamped with the new invoice; a concurrent request sees them as billed.
    ///
    /// # Errors
    ///
    /// - `ClientNotFound` if the client is not in the tenant
    /// - `Billing(NothingToBill)` if no shift qualifies
    /// - `Billing(MissingRate)` if a shift falls in an unpriced band
    pub async fn create_from_shifts(
        &self,
        input: CreateInvoiceInput,
    ) -> Result<InvoiceWithLines, InvoiceError> {
        if input.period_end < input.period_start {
            return Err(InvoiceError::InvalidPeriod {
                start: input.period_start,
                end: input.period_end,
            });
        }

        let txn = self.db.begin().await?;

        if !client_in_tenant(&txn, input.tenant_id, input.client_id).await? {
            return Err(InvoiceError::ClientNotFound(input.client_id));
        }

        // Serialises invoice numbering per tenant.
        tenants::Entity::find_by_id(input.tenant_id)
            .lock_exclusive()
            .one(&txn)
            .await?;

        let shifts = unbilled_query(
            input.tenant_id,
            input.client_id,
            input.period_start,
            input.period_end,
        )
        .lock_exclusive()
        .all(&txn)
        .await?;

        let billable: Vec<BillableShift> = shifts
            .iter()
            .map(|shift| BillableShift {
                shift_id: ShiftId::from_uuid(shift.id),
                start: shift.start_time,
                end: shift.end_time,
            })
            .collect();

        let card = load_rate_card(&txn, input.tenant_id).await?;
        let holidays = load_holidays(&txn, input.tenant_id, input.period_start, input.period_end).await?;
        let priced = billing::price_shifts(&billable, &card, &holidays)?;
        let totals = InvoiceTotals::from_lines(&priced);

        let number = billing::invoice_number(next_sequence(&txn, input.tenant_id).await?);
        let now = Utc::now().into();

        let invoice = invoices::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(input.tenant_id),
            client_id: Set(input.client_id),
            invoice_number: Set(number),
            period_start: Set(input.period_start),
            period_end: Set(input.period_end),
            status: Set(InvoiceStatus::Draft),
            subtotal: Set(totals.subtotal.amount()),
            created_by: Set(Some(input.created_by)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(priced.len());
        for line in &priced {
            let stored = line_item(input.tenant_id, invoice.id, line).insert(&txn).await?;
            lines.push(stored);
        }

        let shift_ids: Vec<Uuid> = shifts.iter().map(|shift| shift.id).collect();
        shifts::Entity::update_many()
            .col_expr(shifts::Column::InvoiceId, Expr::value(invoice.id))
            .col_expr(shifts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(shifts::Column::TenantId.eq(input.tenant_id))
            .filter(shifts::Column::Id.is_in(shift_ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            tenant_id = %input.tenant_id,
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            lines = totals.line_count,
            subtotal = %totals.subtotal,
            "Invoice created"
        );

        Ok(InvoiceWithLines::new(invoice, lines))
    }

    /// Finds an invoice with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_lines(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<InvoiceWithLines>, DbErr> {
        let Some(invoice) = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let lines = invoice_line_items::Entity::find()
            .filter(invoice_line_items::Column::TenantId.eq(tenant_id))
            .filter(invoice_line_items::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_line_items::Column::ServiceDate)
            .order_by_asc(invoice_line_items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(Some(InvoiceWithLines::new(invoice, lines)))
    }

    /// Lists invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: InvoiceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<invoices::Model>, DbErr> {
        let mut query = invoices::Entity::find().filter(invoices::Column::TenantId.eq(tenant_id));

        if let Some(client_id) = filter.client_id {
            query = query.filter(invoices::Column::ClientId.eq(client_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(invoices::Column::CreatedAt)
            .order_by_desc(invoices::Column::InvoiceNumber)
            .paginate(&self.db, page.page_size());

        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.page_index()).await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Moves an invoice to a new status. Voiding releases its shifts so they
    /// can be invoiced again.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing or the move is not allowed.
    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: billing::InvoiceStatus,
    ) -> Result<invoices::Model, InvoiceError> {
        let txn = self.db.begin().await?;

        let existing = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::TenantId.eq(tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let from: billing::InvoiceStatus = existing.status.into();
        let status = from.transition(to)?;

        let mut invoice: invoices::ActiveModel = existing.into();
        invoice.status = Set(status.into());
        invoice.updated_at = Set(Utc::now().into());
        let invoice = invoice.update(&txn).await?;

        if status.releases_shifts() {
            let released = shifts::Entity::update_many()
                .col_expr(shifts::Column::InvoiceId, Expr::value(Option::<Uuid>::None))
                .col_expr(shifts::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(shifts::Column::TenantId.eq(tenant_id))
                .filter(shifts::Column::InvoiceId.eq(id))
                .exec(&txn)
                .await?;
            tracing::info!(tenant_id = %tenant_id, invoice_id = %id, released = released.rows_affected, "Invoice shifts released");
        }

        txn.commit().await?;

        tracing::info!(tenant_id = %tenant_id, invoice_id = %id, from = %from, to = %status, "Invoice status changed");
        Ok(invoice)
    }
}

async fn load_rate_card<C>(db: &C, tenant_id: Uuid) -> Result<RateCard, DbErr>
where
    C: ConnectionTrait,
{
    let items = rate_card_items::Entity::find()
        .filter(rate_card_items::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;

    Ok(items
        .into_iter()
        .map(|item| {
            (
                billing::RateBand::from(item.rate_band),
                RateCardEntry {
                    support_item_number: item.support_item_number,
                    description: item.description,
                    hourly_rate: Money::new(item.hourly_rate),
                },
            )
        })
        .collect())
}

async fn load_holidays<C>(
    db: &C,
    tenant_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BTreeSet<NaiveDate>, DbErr>
where
    C: ConnectionTrait,
{
    let holidays = public_holidays::Entity::find()
        .filter(public_holidays::Column::TenantId.eq(tenant_id))
        .filter(public_holidays::Column::HolidayDate.between(from, to))
        .all(db)
        .await?;

    Ok(holidays.into_iter().map(|holiday| holiday.holiday_date).collect())
}

/// Next invoice sequence for the tenant.
///
/// Padding stops at six digits, so `INV-1000000` sorts below `INV-999999` as a
/// string; the greatest parsed sequence wins instead.
async fn next_sequence<C>(db: &C, tenant_id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let numbers: Vec<String> = invoices::Entity::find()
        .select_only()
        .column(invoices::Column::InvoiceNumber)
        .filter(invoices::Column::TenantId.eq(tenant_id))
        .into_tuple()
        .all(db)
        .await?;

    Ok(next_after(numbers.iter().map(String::as_str)))
}

fn next_after<'a>(numbers: impl IntoIterator<Item = &'a str>) -> u64 {
    numbers
        .into_iter()
        .filter_map(billing::parse_invoice_sequence)
        .max()
        .map_or(1, |seq| seq + 1)
}

fn line_item(tenant_id: Uuid, invoice_id: Uuid, line: &PricedLine) -> invoice_line_items::ActiveModel {
    invoice_line_items::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(tenant_id),
        invoice_id: Set(invoice_id),
        shift_id: Set(line.shift_id.into_inner()),
        support_item_number: Set(line.support_item_number.clone()),
        description: Set(line.description.clone()),
        service_date: Set(line.service_date),
        rate_band: Set(sea_orm_active_enums::RateBand::from(line.rate_band)),
        hours: Set(line.hours),
        unit_price: Set(line.unit_price.amount()),
        line_total: Set(line.line_total.amount()),
        created_at: Set(Utc::now().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_invoice_is_number_one() {
        let none: [&str; 0] = [];
        assert_eq!(next_after(none), 1);
        assert_eq!(billing::invoice_number(next_after(none)), "INV-000001");
    }

    #[test]
    fn test_sequence_continues_from_latest() {
        assert_eq!(next_after(["INV-000040", "INV-000041"]), 42);
    }

    #[test]
    fn test_sequence_grows_past_six_digits() {
        assert_eq!(next_after(["INV-999998", "INV-999999"]), 1_000_000);
        assert_eq!(billing::invoice_number(1_000_000), "INV-1000000");

        // String order would pick INV-999999 here.
        let next = next_after(["INV-1000000", "INV-999999"]);
        assert_eq!(next, 1_000_001);
        assert_eq!(billing::invoice_number(next), "INV-1000001");
    }

    #[test]
    fn test_unparseable_numbers_are_ignored() {
        assert_eq!(next_after(["legacy-7"]), 1);
        assert_eq!(next_after(["legacy-7", "INV-000003"]), 4);
    }

    #[test]
    fn test_line_item_copies_priced_values() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let line = PricedLine {
            shift_id: ShiftId::new(),
            service_date: start.date(),
            rate_band: billing::RateBand::Saturday,
            support_item_number: "01_013_0107_1_1".to_string(),
            description: "Assistance - Saturday".to_string(),
            hours: dec!(3.00),
            unit_price: Money::new(dec!(98.83)),
            line_total: Money::new(dec!(296.49)),
        };

        let invoice_id = Uuid::now_v7();
        let item = line_item(Uuid::now_v7(), invoice_id, &line);

        assert_eq!(item.invoice_id.as_ref(), &invoice_id);
        assert_eq!(item.shift_id.as_ref(), &line.shift_id.into_inner());
        assert_eq!(item.rate_band.as_ref(), &RateBand::Saturday);
        assert_eq!(item.line_total.as_ref(), &dec!(296.49));
    }
}
