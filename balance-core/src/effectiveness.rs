//! Retrospective effectiveness of completed tasks.

use std::collections::{BTreeMap, BTreeSet};

use crate::balance::{mean_imbalance, CycleSnapshot};
use crate::category::Category;
use crate::task::{EffectivenessRecord, Task};

/// Score assigned to a task kind that has no comparable cycle pair yet.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Measure how often each kind of completed task preceded a drop in
/// imbalance.
///
/// Tasks are grouped by [`Task::effectiveness_key`], and each distinct cycle
/// a group appears in is one sample. The sample compares the mean imbalance
/// of the categories the group's tasks targeted in that cycle (all categories
/// for a task without one) between that cycle's snapshot and the next
/// cycle's. Samples with a missing snapshot are not comparable. Incomplete
/// tasks are ignored.
pub fn analyze_effectiveness(tasks: &[Task], history: &[CycleSnapshot]) -> Vec<EffectivenessRecord> {
    let mut groups: BTreeMap<&str, BTreeMap<u32, BTreeSet<Option<Category>>>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| t.completed) {
        groups
            .entry(task.effectiveness_key())
            .or_default()
            .entry(task.cycle)
            .or_default()
            .insert(task.category);
    }

    groups
        .into_iter()
        .map(|(key, cycles)| {
            let (mut improved, mut comparable) = (0u32, 0u32);
            for (cycle, categories) in &cycles {
                let before = snapshot(history, *cycle).and_then(|s| measure(s, categories));
                let after = cycle
                    .checked_add(1)
                    .and_then(|next| snapshot(history, next))
                    .and_then(|s| measure(s, categories));

                if let (Some(before), Some(after)) = (before, after) {
                    comparable += 1;
                    if after < before {
                        improved += 1;
                    }
                }
            }

            let effectiveness_score = if comparable == 0 {
                NEUTRAL_SCORE
            } else {
                f64::from(improved) / f64::from(comparable)
            };
            EffectivenessRecord {
                task_type: key.to_string(),
                effectiveness_score,
                sample_size: comparable,
            }
        })
        .collect()
}

fn snapshot(history: &[CycleSnapshot], cycle: u32) -> Option<&CycleSnapshot> {
    history.iter().find(|s| s.cycle == cycle)
}

/// Mean imbalance over the targeted categories. `None` when the snapshot
/// lacks one of them.
fn measure(snapshot: &CycleSnapshot, categories: &BTreeSet<Option<Category>>) -> Option<f64> {
    let values = categories
        .iter()
        .map(|category| match category {
            Some(category) => snapshot.imbalance_of(*category).map(f64::from),
            None if snapshot.balances.is_empty() => None,
            None => Some(mean_imbalance(&snapshot.balances)),
        })
        .collect::<Option<Vec<f64>>>()?;

    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
