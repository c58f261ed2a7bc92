use balance_core::{CyclePlan, CycleSnapshot, EffectivenessRecord, ImpactInsight};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed cycle: the balances measured at completion and how they moved
/// since the previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub snapshot: CycleSnapshot,
    pub impact: Vec<ImpactInsight>,
    pub completed_at: DateTime<Utc>,
}

/// Result of completing a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleTransition {
    pub completed: CycleRecord,
    pub effectiveness: Vec<EffectivenessRecord>,
    pub next_plan: CyclePlan,
}
