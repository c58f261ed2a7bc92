use balance_core::{
    Answers, CycleInput, EffectivenessRecord, PartyNames, QuestionCatalog, Task,
};
use serde::{Deserialize, Serialize};

/// Input for marking a task or subtask complete or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionInput {
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentInput {
    pub author: String,
    pub text: String,
}

/// Self-contained generation request, used by the preview endpoint and the
/// `plan` CLI command. The question catalog comes from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub cycle_number: u32,
    #[serde(default)]
    pub prior_tasks: Vec<Task>,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub effectiveness: Vec<EffectivenessRecord>,
    #[serde(default)]
    pub meeting_action_items: Vec<String>,
    #[serde(default)]
    pub meeting_goals: Vec<String>,
    #[serde(default)]
    pub party_names: PartyNames,
}

impl PlanRequest {
    pub fn cycle_input<'a>(&'a self, catalog: &'a QuestionCatalog) -> CycleInput<'a> {
        CycleInput {
            cycle_number: self.cycle_number,
            prior_tasks: &self.prior_tasks,
            answers: &self.answers,
            catalog,
            effectiveness: &self.effectiveness,
            meeting_action_items: &self.meeting_action_items,
            meeting_goals: &self.meeting_goals,
            party_names: &self.party_names,
        }
    }
}
