//! Modvault Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Modvault components:
//! - `storefront` - Public mod store API (catalog, cart, checkout, locker, forum)
//! - `admin` - Back-office API (users, roles, mods, tickets, settings, analytics)
//! - `cli` - Command-line tools for migrations, seeding and bootstrapping admins
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing, deal eligibility, checkout sequencing and
//! menu filtering are computed here so both binaries apply identical rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, money and status enums
//! - [`pricing`] - Cart totals and savings
//! - [`deals`] - Promotional deal eligibility
//! - [`checkout`] - Checkout step progression
//! - [`permissions`] - Permission catalog and admin menu filter
//! - [`validation`] - Schema-style input validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod deals;
pub mod permissions;
pub mod pricing;
pub mod types;
pub mod validation;

pub use types::*;
