use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::party::Party;

/// An assignable piece of rebalancing work for one cycle.
///
/// Tasks are created at the start of a cycle, then mutated by household
/// members (completion, comments). They are never deleted; history
/// accumulates across cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Cycle-scoped id such as `3-1` or `3-meeting-2`.
    pub id: String,
    pub cycle: u32,
    pub title: String,
    pub description: String,
    pub assigned_to: Party,
    pub task_type: TaskType,
    /// The focus area the task remediates, when it was derived from one.
    pub focus_area: Option<String>,
    pub category: Option<Category>,
    /// Explanation of the data behind the recommendation.
    pub insight: Option<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Task {
    /// Key used to group this task when measuring effectiveness.
    pub fn effectiveness_key(&self) -> &str {
        self.focus_area
            .as_deref()
            .unwrap_or_else(|| self.task_type.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Where a task came from.
///
/// - `Ai`: insight-framed challenge built from the party's top priority area
/// - `SurveyBased`: templated task for a specific focus area
/// - `Relationship`: couple-focused task
/// - `Meeting`: action item agreed in the family meeting
/// - `Goal`: tracking task for the family's goals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Ai,
    SurveyBased,
    Relationship,
    Meeting,
    Goal,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::SurveyBased => "survey_based",
            Self::Relationship => "relationship",
            Self::Meeting => "meeting",
            Self::Goal => "goal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ai" => Some(Self::Ai),
            "survey_based" => Some(Self::SurveyBased),
            "relationship" => Some(Self::Relationship),
            "meeting" => Some(Self::Meeting),
            "goal" => Some(Self::Goal),
            _ => None,
        }
    }
}

/// Retrospective measure of how often a kind of task preceded a drop in
/// imbalance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectivenessRecord {
    /// Focus area, category display name, or task type name.
    pub task_type: String,
    /// Fraction of comparable cycles in which imbalance decreased, 0..=1.
    pub effectiveness_score: f64,
    pub sample_size: u32,
}
