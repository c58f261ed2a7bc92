use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text outcome of a family meeting, one item per line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingNotes {
    pub cycle: u32,
    pub action_items: String,
    pub next_cycle_goals: String,
    pub updated_at: DateTime<Utc>,
}

impl MeetingNotes {
    pub fn action_item_lines(&self) -> Vec<String> {
        note_lines(&self.action_items)
    }

    pub fn goal_lines(&self) -> Vec<String> {
        note_lines(&self.next_cycle_goals)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingNotesInput {
    #[serde(default)]
    pub action_items: String,
    #[serde(default)]
    pub next_cycle_goals: String,
}

/// Split notes into items, dropping blank lines and list markers such as
/// `-`, `*`, `•` or `1.`.
pub fn note_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('*'))
        .or_else(|| line.strip_prefix('•'))
    {
        return rest.trim();
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..]
            .strip_prefix('.')
            .or_else(|| line[digits..].strip_prefix(')'))
        {
            return rest.trim();
        }
    }
    line
}
