//! Core business logic for Carebase.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `roster` - Recurring shift generation, shift lifecycle and clash checks
//! - `billing` - NDIS rate bands, shift pricing and invoice totals
//! - `records` - Case note and care plan rules
//! - `auth` - Password hashing and staff roles

pub mod auth;
pub mod billing;
pub mod records;
pub mod roster;
