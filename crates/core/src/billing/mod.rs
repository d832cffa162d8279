//! NDIS invoicing: rate bands, shift pricing and invoice totals.

pub mod band;
pub mod error;
pub mod invoice;
pub mod pricing;

#[cfg(test)]
mod tests;

pub use band::{RateBand, classify};
pub use error::BillingError;
pub use invoice::{InvoiceStatus, InvoiceTotals, invoice_number, parse_invoice_sequence};
pub use pricing::{
    BillableShift, PricedLine, RateCard, RateCardEntry, billable_hours, price_shift, price_shifts,
};
