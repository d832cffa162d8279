//! Billing error types.

use thiserror::Error;

use super::band::RateBand;
use super::invoice::InvoiceStatus;

/// Errors produced while pricing shifts or changing invoice status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// The tenant's rate card has no price for the band.
    #[error("No rate configured for band {0}")]
    MissingRate(RateBand),

    /// Shift end is not after its start.
    #[error("Shift duration must be positive")]
    InvalidDuration,

    /// No shifts were supplied for the invoice.
    #[error("Invoice has no billable shifts")]
    NothingToBill,

    /// Attempted an invalid invoice status transition.
    #[error("Invalid invoice status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: InvoiceStatus,
        /// The attempted target status.
        to: InvoiceStatus,
    },
}
