//! Reference tables for task generation: focus areas per category and the
//! subtask templates attached to generated tasks.

use crate::category::Category;

/// A `(title, description)` pair.
pub type SubTaskTemplate = (&'static str, &'static str);

/// How a focus area explains the data behind its recommendation.
#[derive(Debug, Clone, Copy)]
pub enum InsightTemplate {
    /// "<lead> <other party> is handling <their share>% of <subject>."
    Share {
        lead: &'static str,
        subject: &'static str,
    },
    /// "Survey results show a <imbalance>% imbalance in <subject>."
    Gap { subject: &'static str },
    Fixed(&'static str),
}

/// A sub-topic within a category, used to build a concrete task.
#[derive(Debug, Clone, Copy)]
pub struct FocusArea {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub insight: InsightTemplate,
}

const FOCUS_AREAS: [FocusArea; 12] = [
    FocusArea {
        name: "Meal Planning",
        category: Category::VisibleHousehold,
        description: "Take charge of planning family meals for the week",
        insight: InsightTemplate::Share {
            lead: "Survey data shows",
            subject: "meal planning tasks",
        },
    },
    FocusArea {
        name: "Cleaning Coordination",
        category: Category::VisibleHousehold,
        description: "Manage household cleaning responsibilities",
        insight: InsightTemplate::Fixed(
            "Your family's data indicates an imbalance in household maintenance tasks.",
        ),
    },
    FocusArea {
        name: "Home Maintenance",
        category: Category::VisibleHousehold,
        description: "Handle household repairs and upkeep",
        insight: InsightTemplate::Fixed(
            "Survey results show that visible household tasks like repairs need better balance.",
        ),
    },
    FocusArea {
        name: "Family Calendar",
        category: Category::InvisibleHousehold,
        description: "Manage the family's schedule and appointments",
        insight: InsightTemplate::Share {
            lead: "Data shows",
            subject: "calendar management",
        },
    },
    FocusArea {
        name: "Financial Planning",
        category: Category::InvisibleHousehold,
        description: "Take the lead on family budget and financial decisions",
        insight: InsightTemplate::Fixed(
            "Your surveys indicate an imbalance in who handles financial planning.",
        ),
    },
    FocusArea {
        name: "Household Supplies",
        category: Category::InvisibleHousehold,
        description: "Monitor and restock household necessities",
        insight: InsightTemplate::Fixed(
            "Data indicates one partner is handling most of the invisible household management.",
        ),
    },
    FocusArea {
        name: "Homework Support",
        category: Category::VisibleParental,
        description: "Take a more active role in children's schoolwork",
        insight: InsightTemplate::Gap {
            subject: "who helps with children's educational needs",
        },
    },
    FocusArea {
        name: "Morning Routines",
        category: Category::VisibleParental,
        description: "Help children prepare for school in the mornings",
        insight: InsightTemplate::Fixed(
            "Data indicates morning routines are managed predominantly by one parent.",
        ),
    },
    FocusArea {
        name: "Bedtime Routines",
        category: Category::VisibleParental,
        description: "Take the lead on nighttime rituals and sleep schedules",
        insight: InsightTemplate::Fixed(
            "Surveys show an imbalance in who manages children's bedtime routines.",
        ),
    },
    FocusArea {
        name: "Emotional Support",
        category: Category::InvisibleParental,
        description: "Provide more emotional guidance for the children",
        insight: InsightTemplate::Share {
            lead: "Family data shows",
            subject: "emotional support tasks",
        },
    },
    FocusArea {
        name: "School Communication",
        category: Category::InvisibleParental,
        description: "Manage interactions with teachers and school staff",
        insight: InsightTemplate::Fixed(
            "Survey results indicate an imbalance in communication with schools.",
        ),
    },
    FocusArea {
        name: "Social Planning",
        category: Category::InvisibleParental,
        description: "Arrange playdates and social activities",
        insight: InsightTemplate::Fixed(
            "Data shows social planning is primarily handled by one parent.",
        ),
    },
];

/// The three focus areas of a category, in table order.
pub fn focus_areas(category: Category) -> impl Iterator<Item = &'static FocusArea> {
    FOCUS_AREAS.iter().filter(move |f| f.category == category)
}

/// Subtasks for a focus-area task. Areas without a dedicated template get
/// the generic assess / plan / implement steps.
pub fn focus_area_sub_tasks(name: &str) -> Vec<(String, String)> {
    let table: Option<[SubTaskTemplate; 3]> = match name {
        "Meal Planning" => Some([
            ("Create weekly menu", "Plan meals for each day of the week"),
            ("Make shopping list", "List all ingredients needed for the menu"),
            ("Coordinate with family", "Get input on meal preferences"),
        ]),
        "Family Calendar" => Some([
            ("Review upcoming events", "Look at the family's schedule for the next two weeks"),
            ("Update shared calendar", "Make sure all events are properly recorded"),
            ("Communicate schedule", "Make sure everyone knows what's happening"),
        ]),
        "Emotional Support" => Some([
            ("Have one-on-one talks", "Check in with each child individually"),
            ("Notice emotional needs", "Pay attention to cues that children need support"),
            ("Validate feelings", "Acknowledge emotions without dismissing them"),
        ]),
        "Homework Support" => Some([
            ("Create study space", "Set up a quiet area for homework"),
            ("Review assignments", "Know what homework is due and when"),
            ("Provide assistance", "Be available to help with questions"),
        ]),
        "School Communication" => Some([
            ("Check school messages", "Review emails and notices from school"),
            ("Respond to teachers", "Reply to any communications from staff"),
            ("Share info with family", "Keep everyone informed about school news"),
        ]),
        _ => None,
    };

    match table {
        Some(rows) => owned(&rows),
        None => vec![
            (
                "Assess current situation".to_string(),
                format!("Evaluate how {} is currently handled", name),
            ),
            (
                "Make an action plan".to_string(),
                "Develop a strategy for taking more responsibility".to_string(),
            ),
            (
                "Implement changes".to_string(),
                "Put your plan into action consistently".to_string(),
            ),
        ],
    }
}

pub const INVISIBLE_WORK_SUB_TASKS: [SubTaskTemplate; 3] = [
    ("Identify invisible work", "Notice tasks that often go unrecognized or unappreciated"),
    ("Take initiative", "Proactively handle a task that's usually done by your partner"),
    ("Create a system", "Develop a way to ensure this task remains balanced"),
];

pub const VISIBLE_WORK_SUB_TASKS: [SubTaskTemplate; 3] = [
    ("Observe current patterns", "Notice how visible tasks are currently divided"),
    ("Schedule shared work", "Plan time to work alongside your partner on tasks"),
    ("Trade responsibilities", "Switch who does which tasks occasionally"),
];

pub const CHECK_IN_SUB_TASKS: [SubTaskTemplate; 3] = [
    ("Schedule a discussion", "Set aside time to talk about family balance"),
    ("Express appreciation", "Acknowledge the work your partner does"),
    ("Plan adjustments", "Identify ways to improve balance going forward"),
];

pub const MEETING_ACTION_SUB_TASKS: [SubTaskTemplate; 3] = [
    ("Make a plan", "Plan how to accomplish this action item"),
    ("Execute the plan", "Carry out the action item as discussed"),
    ("Report back to family", "Share your progress with the family"),
];

pub fn owned(rows: &[SubTaskTemplate]) -> Vec<(String, String)> {
    rows.iter()
        .map(|(t, d)| (t.to_string(), d.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_three_focus_areas() {
        for category in Category::ALL {
            assert_eq!(focus_areas(category).count(), 3);
        }
    }

    #[test]
    fn unknown_area_gets_generic_steps() {
        let steps = focus_area_sub_tasks("Garden Care");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].0, "Assess current situation");
        assert!(steps[0].1.contains("Garden Care"));
        assert_eq!(steps[2].0, "Implement changes");
    }

    #[test]
    fn templated_area_gets_its_own_steps() {
        let steps = focus_area_sub_tasks("Meal Planning");
        assert_eq!(steps[0].0, "Create weekly menu");
    }
}
