//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `checkout` - Payment confirmation and order fulfilment
//! - `stripe` - Stripe REST client and webhook verification

pub mod auth;
pub mod checkout;
pub mod stripe;
