//! Before/after comparison of a completed cycle.

use serde::{Deserialize, Serialize};

use crate::balance::CategoryBalance;
use crate::category::Category;
use crate::task::Task;

/// Minimum improvement, in percentage points, credited to completed tasks.
pub const SUCCESS_THRESHOLD: i32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImpactInsight {
    pub category: Category,
    /// Reduction of party A's distance from an even split.
    pub improvement: i32,
    pub kind: InsightKind,
    pub message: String,
    /// Titles of the completed tasks in this category.
    pub tasks: Vec<String>,
}

/// Explain how balance moved per category between two snapshots, relative to
/// the tasks completed in between.
pub fn analyze_task_impact(
    previous: &[CategoryBalance],
    current: &[CategoryBalance],
    tasks: &[Task],
) -> Vec<ImpactInsight> {
    let mut insights = Vec::new();

    for before in previous {
        let Some(after) = current.iter().find(|b| b.category == before.category) else {
            continue;
        };
        let improvement = before.deviation() as i32 - after.deviation() as i32;
        let related: Vec<String> = tasks
            .iter()
            .filter(|t| t.completed && t.category == Some(before.category))
            .map(|t| t.title.clone())
            .collect();

        let (kind, message) = if !related.is_empty() && improvement > SUCCESS_THRESHOLD {
            (
                InsightKind::Success,
                format!(
                    "Tasks focused on {} helped improve balance by {}%.",
                    before.category, improvement
                ),
            )
        } else if !related.is_empty() && improvement <= 0 {
            (
                InsightKind::Warning,
                format!(
                    "Despite completing tasks in {}, balance has not improved. \
                     Consider trying different approaches.",
                    before.category
                ),
            )
        } else if related.is_empty() && improvement > 0 {
            (
                InsightKind::Info,
                format!(
                    "Balance in {} improved by {}% without dedicated tasks.",
                    before.category, improvement
                ),
            )
        } else {
            continue;
        };

        insights.push(ImpactInsight {
            category: before.category,
            improvement,
            kind,
            message,
            tasks: related,
        });
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::Party;
    use crate::task::TaskType;

    fn balance(category: Category, a: u32) -> CategoryBalance {
        CategoryBalance {
            category,
            party_a_percent: a,
            party_b_percent: 100 - a,
            imbalance: a.abs_diff(100 - a),
            answered: 4,
        }
    }

    fn done(title: &str, category: Category) -> Task {
        Task {
            id: "1-1".to_string(),
            cycle: 1,
            title: title.to_string(),
            description: String::new(),
            assigned_to: Party::B,
            task_type: TaskType::SurveyBased,
            focus_area: None,
            category: Some(category),
            insight: None,
            completed: true,
            completed_at: None,
            sub_tasks: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn classifies_each_category() {
        let previous = vec![
            balance(Category::VisibleHousehold, 80),
            balance(Category::InvisibleHousehold, 70),
            balance(Category::VisibleParental, 60),
            balance(Category::InvisibleParental, 50),
        ];
        let current = vec![
            balance(Category::VisibleHousehold, 60),
            balance(Category::InvisibleHousehold, 75),
            balance(Category::VisibleParental, 55),
            balance(Category::InvisibleParental, 50),
        ];
        let tasks = vec![
            done("Meal Planning", Category::VisibleHousehold),
            done("Family Calendar", Category::InvisibleHousehold),
        ];

        let insights = analyze_task_impact(&previous, &current, &tasks);
        assert_eq!(insights.len(), 3);

        assert_eq!(insights[0].kind, InsightKind::Success);
        assert_eq!(insights[0].improvement, 20);
        assert_eq!(insights[0].tasks, vec!["Meal Planning".to_string()]);

        assert_eq!(insights[1].kind, InsightKind::Warning);
        assert_eq!(insights[2].kind, InsightKind::Info);
        assert_eq!(insights[2].category, Category::VisibleParental);
    }

    #[test]
    fn small_gains_with_tasks_are_not_reported() {
        let previous = vec![balance(Category::VisibleHousehold, 62)];
        let current = vec![balance(Category::VisibleHousehold, 60)];
        let tasks = vec![done("Meal Planning", Category::VisibleHousehold)];
        assert!(analyze_task_impact(&previous, &current, &tasks).is_empty());
    }
}
