//! Domain models for the family balance service.
//!
//! # Core Concepts
//!
//! - [`Family`]: a household of two parties with a current cycle counter.
//! - [`SurveySubmission`]: one member's answers for a cycle; balances are
//!   always recomputed from stored answers, never stored themselves.
//! - [`balance_core::Task`]: generated rebalancing work, persisted per family
//!   and mutated only through completion toggles and comments.
//! - [`MeetingNotes`]: the family meeting outcome that seeds the next cycle.
//! - [`CycleRecord`]: the balance snapshot taken when a cycle completes.
//! - [`CoupleCheckIn`]: relationship ratings and strategy progress.

mod checkin;
mod cycle;
mod family;
mod meeting;
mod survey;
mod task;

pub use checkin::*;
pub use cycle::*;
pub use family::*;
pub use meeting::*;
pub use survey::*;
pub use task::*;
