//! Domain models for admin.
//!
//! Row types derive `sqlx::FromRow`; request bodies and query strings derive
//! `Deserialize`. Shared inputs such as `ModInput` and `RoleInput` come from
//! `modvault_core::validation`.

pub mod analytics;
pub mod catalog;
pub mod role;
pub mod session;
pub mod ticket;
pub mod user;

pub use analytics::{Analytics, TopMod};
pub use catalog::{AdminMod, ModFilter, ModPage};
pub use role::{Role, RoleDetail, RoleRef};
pub use session::{CurrentAdmin, keys as session_keys};
pub use ticket::{
    AdminTicket, ReplyInput, TicketDetail, TicketFilter, TicketPage, TicketReply, TicketUpdate,
};
pub use user::{RoleAssignment, UserDetail, UserFilter, UserPage, UserSort, UserSummary, UserUpdate};

use serde::{Deserialize, Deserializer};

/// Tell an absent field (`None`) apart from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
