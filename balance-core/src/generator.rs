//! Next-cycle task generation.
//!
//! One deterministic pass: expand category imbalances into focus areas,
//! prioritize them (imbalance, novelty, past effectiveness), select a
//! party-balanced subset, and materialize templated tasks.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::balance::{
    assess_signal, compute_category_balance, legacy_default_balances, Answers, BalanceSignal,
    CategoryBalance,
};
use crate::catalog::QuestionCatalog;
use crate::category::Category;
use crate::party::{Party, PartyNames};
use crate::task::{EffectivenessRecord, SubTask, Task, TaskType};
use crate::templates::{self, FocusArea, InsightTemplate};

/// Boost for focus areas that the previous cycle did not cover.
pub const NOVELTY_BOOST: i32 = 20;
/// Boost for focus areas with a history of reducing imbalance.
pub const EFFECTIVE_BOOST: i32 = 15;
/// Penalty for focus areas that historically did not help.
pub const INEFFECTIVE_PENALTY: i32 = -10;

const EFFECTIVE_THRESHOLD: f64 = 0.7;
const INEFFECTIVE_THRESHOLD: f64 = 0.3;
const TOP_AREAS: usize = 4;
const MIN_AREAS_PER_PARTY: usize = 2;

const MEETING_FOCUS_AREA: &str = "Family Meeting Decision";
const GOAL_FOCUS_AREA: &str = "Family Goals";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Upper bound on tasks created from meeting action items.
    pub max_meeting_tasks: usize,
    /// Substitute placeholder imbalances when no answer carries signal,
    /// instead of falling back to generic check-in tasks.
    pub legacy_default_balances: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_meeting_tasks: 2,
            legacy_default_balances: false,
        }
    }
}

/// Everything the generator reads for one cycle transition.
#[derive(Debug, Clone, Copy)]
pub struct CycleInput<'a> {
    /// The cycle the tasks are generated for.
    pub cycle_number: u32,
    pub prior_tasks: &'a [Task],
    pub answers: &'a Answers,
    pub catalog: &'a QuestionCatalog,
    pub effectiveness: &'a [EffectivenessRecord],
    pub meeting_action_items: &'a [String],
    pub meeting_goals: &'a [String],
    pub party_names: &'a PartyNames,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Tasks derived from measured imbalance.
    Normal,
    /// Not enough data; generic check-in tasks only.
    Fallback,
}

/// The tasks generated for one cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CyclePlan {
    pub cycle: u32,
    pub mode: PlanMode,
    pub tasks: Vec<Task>,
}

/// A focus area competing for a slot in the next cycle.
#[derive(Debug, Clone, Copy)]
pub struct PriorityArea {
    pub focus_area: &'static FocusArea,
    pub assign_to: Party,
    pub imbalance: i32,
    pub priority_boost: i32,
    pub balance: CategoryBalance,
}

impl PriorityArea {
    pub fn category(&self) -> Category {
        self.focus_area.category
    }

    pub fn score(&self) -> i32 {
        self.imbalance + self.priority_boost
    }
}

/// Produce the next cycle's tasks. Never fails: missing data degrades to a
/// [`PlanMode::Fallback`] plan with one generic task per party.
pub fn generate_next_cycle_tasks(input: &CycleInput<'_>, config: &GeneratorConfig) -> CyclePlan {
    let cycle = input.cycle_number;

    if input.answers.is_empty() || input.catalog.is_empty() {
        tracing::debug!(cycle, "no answers or catalog, generating fallback tasks");
        return fallback_plan(cycle, input.party_names);
    }

    let mut balances = compute_category_balance(input.answers, input.catalog);
    if assess_signal(&balances) == BalanceSignal::Insufficient {
        if config.legacy_default_balances {
            tracing::debug!(cycle, "no usable answers, substituting legacy default balances");
            balances = legacy_default_balances();
        } else {
            tracing::debug!(cycle, "no usable answers, generating fallback tasks");
            return fallback_plan(cycle, input.party_names);
        }
    }

    let previous_focus_areas: HashSet<&str> = input
        .prior_tasks
        .iter()
        .filter(|t| cycle.checked_sub(1) == Some(t.cycle))
        .filter_map(|t| t.focus_area.as_deref())
        .collect();

    let areas = prioritize_focus_areas(&balances, &previous_focus_areas, input.effectiveness);
    let selected = select_balanced(areas);

    let mut tasks = meeting_tasks(
        cycle,
        input.meeting_action_items,
        config.max_meeting_tasks,
        input.party_names,
    );

    for (slot, party) in [(1, Party::A), (2, Party::B)] {
        if let Some(area) = selected.iter().find(|a| a.assign_to == party) {
            tasks.push(survey_task(
                format!("{}-{}", cycle, slot),
                cycle,
                area,
                input.party_names,
            ));
        }
        let party_areas: Vec<&PriorityArea> =
            selected.iter().filter(|a| a.assign_to == party).collect();
        tasks.push(insight_task(
            format!("{}-ai-{}", cycle, slot),
            cycle,
            party,
            party_areas.first().copied(),
            input.party_names,
        ));
    }

    if let Some(goal) = goal_task(cycle, input.meeting_goals) {
        tasks.push(goal);
    }

    CyclePlan {
        cycle,
        mode: PlanMode::Normal,
        tasks,
    }
}

/// Steps 1–3 of prioritization: expand categories into focus areas, order by
/// imbalance, then apply novelty and effectiveness boosts and re-order by the
/// combined score. Both sorts are stable.
pub fn prioritize_focus_areas(
    balances: &[CategoryBalance],
    previous_focus_areas: &HashSet<&str>,
    effectiveness: &[EffectivenessRecord],
) -> Vec<PriorityArea> {
    let mut areas: Vec<PriorityArea> = balances
        .iter()
        .flat_map(|balance| {
            templates::focus_areas(balance.category).map(move |focus_area| PriorityArea {
                focus_area,
                assign_to: balance.assign_to(),
                imbalance: balance.imbalance as i32,
                priority_boost: 0,
                balance: *balance,
            })
        })
        .collect();

    areas.sort_by(|x, y| y.imbalance.cmp(&x.imbalance));

    for area in &mut areas {
        area.priority_boost = if previous_focus_areas.contains(area.focus_area.name) {
            0
        } else {
            NOVELTY_BOOST
        };

        let matching = effectiveness
            .iter()
            .filter(|r| record_matches(r, area.focus_area));
        let (mut effective, mut ineffective) = (false, false);
        for record in matching {
            effective |= record.effectiveness_score > EFFECTIVE_THRESHOLD;
            ineffective |= record.effectiveness_score < INEFFECTIVE_THRESHOLD;
        }
        if effective {
            tracing::debug!(focus_area = area.focus_area.name, "boosting proven focus area");
            area.priority_boost += EFFECTIVE_BOOST;
        }
        if ineffective {
            tracing::debug!(focus_area = area.focus_area.name, "penalizing ineffective focus area");
            area.priority_boost += INEFFECTIVE_PENALTY;
        }
    }

    areas.sort_by(|x, y| y.score().cmp(&x.score()));
    areas
}

fn record_matches(record: &EffectivenessRecord, area: &FocusArea) -> bool {
    record.task_type == area.name
        || record.task_type == area.category.display_name()
        || record.task_type == area.category.as_str()
}

/// Step 4: keep the top areas overall, then keep scanning so each party ends
/// up with at least two selected areas when enough candidates exist.
pub fn select_balanced(areas: Vec<PriorityArea>) -> Vec<PriorityArea> {
    let mut per_party = [0usize; 2];
    let mut selected = Vec::new();

    for (i, area) in areas.into_iter().enumerate() {
        let slot = match area.assign_to {
            Party::A => 0,
            Party::B => 1,
        };
        if i < TOP_AREAS || per_party[slot] < MIN_AREAS_PER_PARTY {
            per_party[slot] += 1;
            selected.push(area);
        }
    }

    selected
}

fn sub_tasks(task_id: &str, rows: Vec<(String, String)>) -> Vec<SubTask> {
    rows.into_iter()
        .enumerate()
        .map(|(i, (title, description))| SubTask {
            id: format!("{}-{}", task_id, i + 1),
            title,
            description,
            completed: false,
            completed_at: None,
        })
        .collect()
}

fn new_task(
    id: String,
    cycle: u32,
    title: String,
    description: String,
    assigned_to: Party,
    task_type: TaskType,
) -> Task {
    Task {
        id,
        cycle,
        title,
        description,
        assigned_to,
        task_type,
        focus_area: None,
        category: None,
        insight: None,
        completed: false,
        completed_at: None,
        sub_tasks: Vec::new(),
        comments: Vec::new(),
    }
}

fn render_insight(area: &PriorityArea, names: &PartyNames) -> String {
    match area.focus_area.insight {
        InsightTemplate::Share { lead, subject } => {
            let doing_more = area.assign_to.other();
            format!(
                "{} {} is handling {}% of {}.",
                lead,
                names.name(doing_more),
                area.balance.percent(doing_more),
                subject
            )
        }
        InsightTemplate::Gap { subject } => format!(
            "Survey results show a {}% imbalance in {}.",
            area.balance.imbalance, subject
        ),
        InsightTemplate::Fixed(text) => text.to_string(),
    }
}

fn survey_task(id: String, cycle: u32, area: &PriorityArea, names: &PartyNames) -> Task {
    let name = area.focus_area.name;
    let title = if cycle > 1 {
        format!("Week {}: {}", cycle, name)
    } else {
        name.to_string()
    };
    let description = format!(
        "{} (Based on your family's survey data)",
        area.focus_area.description
    );

    let mut task = new_task(
        id,
        cycle,
        title,
        description,
        area.assign_to,
        TaskType::SurveyBased,
    );
    task.sub_tasks = sub_tasks(&task.id, templates::focus_area_sub_tasks(name));
    task.focus_area = Some(name.to_string());
    task.category = Some(area.category());
    task.insight = Some(render_insight(area, names));
    task
}

fn insight_task(
    id: String,
    cycle: u32,
    party: Party,
    top_area: Option<&PriorityArea>,
    names: &PartyNames,
) -> Task {
    let name = names.name(party);

    let (title, description, insight, rows) = match top_area {
        Some(area) if area.category().is_invisible() => (
            format!("{}'s Invisible Work Challenge", name),
            format!(
                "Address the imbalance in {} based on family survey data",
                area.category().display_name().to_lowercase()
            ),
            format!(
                "Our analysis shows a significant imbalance in {}. {} could take on more \
                 responsibility in this area to create better balance.",
                area.category(),
                name
            ),
            templates::INVISIBLE_WORK_SUB_TASKS,
        ),
        Some(area) => {
            let other = party.other();
            (
                format!("{}'s Balance Challenge", name),
                format!(
                    "Create better balance in {} with your partner",
                    area.category().display_name().to_lowercase()
                ),
                format!(
                    "Our analysis shows {} is handling {}% of tasks in {}, creating an \
                     opportunity for more balanced sharing.",
                    names.name(other),
                    area.balance.percent(other),
                    area.category()
                ),
                templates::VISIBLE_WORK_SUB_TASKS,
            )
        }
        None => check_in_text(name),
    };

    let mut task = new_task(
        id,
        cycle,
        format!("Week {}: {}", cycle, title),
        description,
        party,
        TaskType::Ai,
    );
    task.sub_tasks = sub_tasks(&task.id, templates::owned(&rows));
    task.category = top_area.map(|a| a.category());
    task.insight = Some(insight);
    task
}

fn check_in_text(name: &str) -> (String, String, String, [templates::SubTaskTemplate; 3]) {
    (
        format!("{}'s Family Check-in", name),
        "Have a conversation about how responsibilities are currently shared".to_string(),
        "Our analysis shows that maintaining open communication about workload is key to a \
         balanced family life."
            .to_string(),
        templates::CHECK_IN_SUB_TASKS,
    )
}

fn meeting_tasks(cycle: u32, items: &[String], limit: usize, names: &PartyNames) -> Vec<Task> {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if items.len() > limit {
        tracing::debug!(
            cycle,
            dropped = items.len() - limit,
            "more meeting action items than task slots"
        );
    }

    items
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, item)| {
            let assigned_to = names.mentioned_in(item).unwrap_or(if i % 2 == 0 {
                Party::B
            } else {
                Party::A
            });
            let mut task = new_task(
                format!("{}-meeting-{}", cycle, i + 1),
                cycle,
                format!("Week {}: Meeting Action Item", cycle),
                item.to_string(),
                assigned_to,
                TaskType::Meeting,
            );
            task.sub_tasks = sub_tasks(&task.id, templates::owned(&templates::MEETING_ACTION_SUB_TASKS));
            task.focus_area = Some(MEETING_FOCUS_AREA.to_string());
            task
        })
        .collect()
}

fn goal_task(cycle: u32, goals: &[String]) -> Option<Task> {
    let goals: Vec<&str> = goals
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .collect();
    if goals.is_empty() {
        return None;
    }

    let assigned_to = if cycle % 2 == 1 { Party::A } else { Party::B };
    let mut task = new_task(
        format!("{}-goal-1", cycle),
        cycle,
        format!("Week {}: Family Goals", cycle),
        format!(
            "Track progress toward this week's family goals: {}",
            goals.join("; ")
        ),
        assigned_to,
        TaskType::Goal,
    );
    let rows = goals
        .iter()
        .enumerate()
        .map(|(i, goal)| (format!("Goal {}", i + 1), goal.to_string()))
        .collect();
    task.sub_tasks = sub_tasks(&task.id, rows);
    task.focus_area = Some(GOAL_FOCUS_AREA.to_string());
    Some(task)
}

fn fallback_plan(cycle: u32, names: &PartyNames) -> CyclePlan {
    let tasks = Party::BOTH
        .into_iter()
        .enumerate()
        .map(|(i, party)| {
            let (title, description, insight, rows) = check_in_text(names.name(party));
            let mut task = new_task(
                format!("{}-default-{}", cycle, i + 1),
                cycle,
                format!("Week {}: {}", cycle, title),
                description,
                party,
                TaskType::Ai,
            );
            task.sub_tasks = sub_tasks(&task.id, templates::owned(&rows));
            task.insight = Some(insight);
            task
        })
        .collect();

    CyclePlan {
        cycle,
        mode: PlanMode::Fallback,
        tasks,
    }
}
