//! Tiered Access & Content-Visibility Quota Engine
//!
//! Decides, for any visitor, which published articles they may see
//! today and which moderation actions they may take:
//!
//! - [`role`] resolves a principal to a single ordered tier and derives
//!   capability checks from it.
//! - [`ban_gate`] denies requests from banned network origins before
//!   any other logic runs.
//! - [`quota`] tracks the per-day allowance of authenticated regular
//!   users against server-side view records.
//! - [`guest`] tracks the per-day allowance of anonymous visitors in a
//!   client-persisted slot.
//! - [`visibility`] composes role and the applicable ledger into the
//!   final visible set.

pub mod ban_gate;
pub mod error;
pub mod guest;
pub mod quota;
pub mod role;
pub mod visibility;

pub use ban_gate::{ban_gate, extract_origin, is_origin_banned, BanCheck};
pub use error::AccessError;
pub use guest::{CookieGuestStore, GuestStore, MemoryGuestStore};
pub use quota::{DailyAllowance, RecordOutcome};
pub use role::Role;
pub use visibility::Visibility;
