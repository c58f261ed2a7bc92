//! Weighted balance scoring.
//!
//! Not every chore costs the same. A question's weight grows with how often
//! the task recurs, how invisible it is, how much emotional labor it carries,
//! how strongly it affects relationships and child development, and whether
//! the family named its category as a priority. Weighted scores complement the
//! plain answer-count split from [`crate::balance`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Question, QuestionCatalog};
use crate::category::Category;
use crate::party::Party;

const DEFAULT_BASE_WEIGHT: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    /// Several times a week.
    Several,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Daily => 1.5,
            Self::Several => 1.3,
            Self::Weekly => 1.2,
            Self::Monthly => 1.0,
            Self::Quarterly => 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Invisibility {
    /// Highly visible.
    Highly,
    Partially,
    Mostly,
    Completely,
}

impl Invisibility {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Highly => 1.0,
            Self::Partially => 1.2,
            Self::Mostly => 1.35,
            Self::Completely => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalLabor {
    Minimal,
    Low,
    Moderate,
    High,
    Extreme,
}

impl EmotionalLabor {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Minimal => 1.0,
            Self::Low => 1.1,
            Self::Moderate => 1.2,
            Self::High => 1.3,
            Self::Extreme => 1.4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResearchImpact {
    High,
    Medium,
    Standard,
}

impl ResearchImpact {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::High => 1.3,
            Self::Medium => 1.15,
            Self::Standard => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChildDevelopment {
    High,
    Moderate,
    Limited,
}

impl ChildDevelopment {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::High => 1.25,
            Self::Moderate => 1.15,
            Self::Limited => 1.0,
        }
    }
}

/// Weight attributes of a single question. Absent attributes contribute a
/// multiplier of 1.0; an absent base weight counts as 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestionWeighting {
    #[serde(default)]
    pub base_weight: Option<f64>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub invisibility: Option<Invisibility>,
    #[serde(default)]
    pub emotional_labor: Option<EmotionalLabor>,
    #[serde(default)]
    pub research_impact: Option<ResearchImpact>,
    #[serde(default)]
    pub child_development: Option<ChildDevelopment>,
}

/// Categories the family ranked as most important to rebalance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyPriorities {
    pub highest: Option<Category>,
    pub secondary: Option<Category>,
    pub tertiary: Option<Category>,
}

impl FamilyPriorities {
    fn question_multiplier(&self, category: Category) -> f64 {
        if self.highest == Some(category) {
            1.5
        } else if self.secondary == Some(category) {
            1.3
        } else if self.tertiary == Some(category) {
            1.1
        } else {
            1.0
        }
    }

    fn category_weight(&self, category: Category) -> f64 {
        if self.highest == Some(category) {
            1.5
        } else if self.secondary == Some(category) {
            1.3
        } else if self.tertiary == Some(category) {
            1.1
        } else {
            default_category_weight(category)
        }
    }
}

fn default_category_weight(category: Category) -> f64 {
    match category {
        Category::VisibleHousehold => 1.0,
        Category::InvisibleHousehold => 1.2,
        Category::VisibleParental => 1.1,
        Category::InvisibleParental => 1.5,
    }
}

/// Total weight of a question after applying every multiplier.
pub fn question_weight(question: &Question, priorities: &FamilyPriorities) -> f64 {
    let w = &question.weighting;
    w.base_weight.unwrap_or(DEFAULT_BASE_WEIGHT)
        * w.frequency.map_or(1.0, |f| f.multiplier())
        * w.invisibility.map_or(1.0, |i| i.multiplier())
        * w.emotional_labor.map_or(1.0, |e| e.multiplier())
        * w.research_impact.map_or(1.0, |r| r.multiplier())
        * w.child_development.map_or(1.0, |c| c.multiplier())
        * priorities.question_multiplier(question.category)
}

/// Weighted split for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedCategoryBalance {
    pub category: Category,
    pub party_a_percent: f64,
    pub party_b_percent: f64,
    /// `|a - b|`, reduced when fewer than half of the category's questions
    /// were answered.
    pub imbalance: f64,
    pub question_count: u32,
    pub possible_questions: u32,
    pub coverage: f64,
}

/// Weighted split across all categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverallBalance {
    pub party_a_percent: f64,
    pub party_b_percent: f64,
    pub imbalance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedBalance {
    /// Only categories with at least one weighted answer appear.
    pub categories: Vec<WeightedCategoryBalance>,
    pub overall: OverallBalance,
}

#[derive(Default)]
struct Tally<'a> {
    a: f64,
    b: f64,
    /// Distinct questions answered, whoever answered them.
    questions: BTreeSet<&'a str>,
}

/// Compute weighted per-category and overall balance.
///
/// Unlike the plain scorer, only questions present in the catalog count,
/// since an unknown question has no weight.
pub fn calculate_weighted_balance(
    catalog: &QuestionCatalog,
    answers: &BTreeMap<String, String>,
    priorities: &FamilyPriorities,
) -> WeightedBalance {
    let mut tallies: BTreeMap<Category, Tally> = BTreeMap::new();

    for (key, value) in answers {
        let Some(party) = Party::from_label(value) else {
            continue;
        };
        let Some(question) = catalog.lookup_answer(key) else {
            continue;
        };

        let weight = question_weight(question, priorities);
        let tally = tallies.entry(question.category).or_default();
        tally.questions.insert(question.id.as_str());
        match party {
            Party::A => tally.a += weight,
            Party::B => tally.b += weight,
        }
    }

    let mut categories = Vec::new();
    for category in Category::ALL {
        let Some(tally) = tallies.get(&category) else {
            continue;
        };
        let total = tally.a + tally.b;
        if total <= 0.0 {
            continue;
        }

        let a = tally.a / total * 100.0;
        let b = tally.b / total * 100.0;
        let answered = tally.questions.len() as u32;
        let possible = catalog.count_in(category);
        let coverage = if possible > 0 {
            f64::from(answered) / f64::from(possible)
        } else {
            1.0
        };
        let coverage_factor = if coverage >= 0.5 { 1.0 } else { 0.5 + coverage };

        categories.push(WeightedCategoryBalance {
            category,
            party_a_percent: a,
            party_b_percent: b,
            imbalance: (a - b).abs() * coverage_factor,
            question_count: answered,
            possible_questions: possible,
            coverage,
        });
    }

    let overall = overall_balance(&categories, priorities);
    WeightedBalance {
        categories,
        overall,
    }
}

fn overall_balance(
    categories: &[WeightedCategoryBalance],
    priorities: &FamilyPriorities,
) -> OverallBalance {
    let mut total_weight = 0.0;
    let mut weighted_a = 0.0;
    let mut weighted_b = 0.0;

    for c in categories {
        let combined = priorities.category_weight(c.category) * f64::from(c.question_count);
        weighted_a += c.party_a_percent * combined;
        weighted_b += c.party_b_percent * combined;
        total_weight += combined;
    }

    if total_weight > 0.0 {
        OverallBalance {
            party_a_percent: weighted_a / total_weight,
            party_b_percent: weighted_b / total_weight,
            imbalance: ((weighted_a - weighted_b) / total_weight).abs(),
        }
    } else {
        OverallBalance {
            party_a_percent: 50.0,
            party_b_percent: 50.0,
            imbalance: 0.0,
        }
    }
}
