//! Domain models for the storefront.
//!
//! Most of these derive `sqlx::FromRow` and are read straight out of queries;
//! the `postgres` feature of `modvault-core` supplies the column codecs for
//! IDs, emails and enums.

pub mod catalog;
pub mod forum;
pub mod order;
pub mod session;
pub mod subscription;
pub mod ticket;
pub mod user;

pub use catalog::{Mod, ModPage, ModQuery, ModSort};
pub use forum::{ForumPost, ForumThread, ThreadPage};
pub use order::{Download, LockerEntry, Order};
pub use session::{CurrentUser, keys as session_keys};
pub use subscription::{Subscription, SubscriptionTier};
pub use ticket::SupportTicket;
pub use user::{LoginContext, User};
