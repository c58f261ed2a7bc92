//! Household workload balancing.
//!
//! Scores how two parties split four categories of household and parental
//! work from survey answers, and turns the imbalance into a small set of
//! concrete weekly tasks. Everything in this crate is pure and synchronous;
//! persistence and transport live in the `family-balance` crate.

pub mod balance;
pub mod catalog;
pub mod category;
pub mod effectiveness;
pub mod error;
pub mod generator;
pub mod impact;
pub mod party;
pub mod task;
pub mod templates;
pub mod weighting;

pub use balance::{
    assess_signal, compute_category_balance, Answers, BalanceSignal, CategoryBalance, CycleSnapshot,
};
pub use catalog::{Question, QuestionCatalog};
pub use category::Category;
pub use effectiveness::analyze_effectiveness;
pub use error::CatalogError;
pub use generator::{generate_next_cycle_tasks, CycleInput, CyclePlan, GeneratorConfig, PlanMode};
pub use impact::{analyze_task_impact, ImpactInsight, InsightKind};
pub use party::{Party, PartyNames};
pub use task::{Comment, EffectivenessRecord, SubTask, Task, TaskType};
pub use weighting::{calculate_weighted_balance, FamilyPriorities, WeightedBalance};
