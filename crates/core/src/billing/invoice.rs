//! Invoice status, numbering and totals.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carebase_shared::types::Money;

use super::error::BillingError;
use super::pricing::PricedLine;

/// Status of an invoice.
///
/// Draft → Issued → Paid. Draft and Issued invoices may be voided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being prepared; lines may still change.
    Draft,
    /// Sent to the plan manager or participant.
    Issued,
    /// Payment received.
    Paid,
    /// Cancelled.
    Void,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "issued" => Some(Self::Issued),
            "paid" => Some(Self::Paid),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    /// Validates a status change.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidTransition` when the move is not allowed.
    pub fn transition(self, to: Self) -> Result<Self, BillingError> {
        match (self, to) {
            (Self::Draft, Self::Issued | Self::Void) | (Self::Issued, Self::Paid | Self::Void) => {
                Ok(to)
            }
            _ => Err(BillingError::InvalidTransition { from: self, to }),
        }
    }

    /// Returns true once the invoice no longer holds its shifts.
    ///
    /// Shifts on a void invoice become billable again.
    #[must_use]
    pub const fn releases_shifts(&self) -> bool {
        matches!(self, Self::Void)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats the tenant-scoped invoice number, e.g. `INV-000042`.
#[must_use]
pub fn invoice_number(sequence: u64) -> String {
    format!("INV-{sequence:06}")
}

/// Parses the sequence back out of an invoice number.
#[must_use]
pub fn parse_invoice_sequence(number: &str) -> Option<u64> {
    number.strip_prefix("INV-")?.parse().ok()
}

/// Totals across an invoice's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Sum of hours.
    pub total_hours: Decimal,
    /// Number of lines.
    pub line_count: usize,
}

impl InvoiceTotals {
    /// Sums priced lines.
    #[must_use]
    pub fn from_lines(lines: &[PricedLine]) -> Self {
        Self {
            subtotal: lines.iter().map(|line| line.line_total).sum(),
            total_hours: lines.iter().map(|line| line.hours).sum(),
            line_count: lines.len(),
        }
    }
}
