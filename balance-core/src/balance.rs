//! Plain answer-count balance scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::QuestionCatalog;
use crate::category::Category;
use crate::party::Party;

/// Survey answers: answer key → party label.
///
/// Keys are question ids, optionally prefixed by member or round
/// (`member-7-q12`); see [`question_key`].
pub type Answers = BTreeMap<String, String>;

/// How the two parties split one category's answered tasks.
///
/// Percentages are whole percentage points and always sum to 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBalance {
    pub category: Category,
    pub party_a_percent: u32,
    pub party_b_percent: u32,
    /// `|a - b|` in percentage points.
    pub imbalance: u32,
    /// Number of answers counted for this category.
    pub answered: u32,
}

impl CategoryBalance {
    pub fn neutral(category: Category) -> Self {
        Self {
            category,
            party_a_percent: 50,
            party_b_percent: 50,
            imbalance: 0,
            answered: 0,
        }
    }

    fn from_counts(category: Category, a: u32, b: u32) -> Self {
        let total = a + b;
        if total == 0 {
            return Self::neutral(category);
        }

        // The party with more answers gets its share rounded half-up and the
        // other party the remainder, so the pair always sums to 100.
        let major = a.max(b);
        let major_percent = (major * 100 + total / 2) / total;
        let (party_a_percent, party_b_percent) = if a >= b {
            (major_percent, 100 - major_percent)
        } else {
            (100 - major_percent, major_percent)
        };

        Self {
            category,
            party_a_percent,
            party_b_percent,
            imbalance: party_a_percent.abs_diff(party_b_percent),
            answered: total,
        }
    }

    pub fn percent(&self, party: Party) -> u32 {
        match party {
            Party::A => self.party_a_percent,
            Party::B => self.party_b_percent,
        }
    }

    /// The party doing less of this category, who should take on the
    /// remediation task. An even split assigns to [`Party::A`].
    pub fn assign_to(&self) -> Party {
        if self.party_a_percent > self.party_b_percent {
            Party::B
        } else {
            Party::A
        }
    }

    /// Distance of party A's share from an even split.
    pub fn deviation(&self) -> u32 {
        self.party_a_percent.abs_diff(50)
    }
}

/// The four category balances recorded when a cycle completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleSnapshot {
    pub cycle: u32,
    pub balances: Vec<CategoryBalance>,
}

impl CycleSnapshot {
    pub fn imbalance_of(&self, category: Category) -> Option<u32> {
        self.balances
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.imbalance)
    }
}

/// Whether a balance result is backed by any answers at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSignal {
    Measured,
    /// No category received a single recognizable answer.
    Insufficient,
}

/// The last `-`-separated segment of an answer key, where an ordinal
/// question id such as `q12` sits. Catalogued ids may contain `-` themselves;
/// see [`QuestionCatalog::lookup_answer`].
pub fn question_key(key: &str) -> &str {
    key.rsplit('-').next().unwrap_or(key)
}

/// Split each category's answers between the two parties.
///
/// Always returns the four categories in [`Category::ALL`] order. Answers
/// whose value is not a party label are skipped; answers whose question is
/// neither catalogued nor classifiable by ordinal are dropped. Categories
/// without answers come back as an even 50/50 split.
pub fn compute_category_balance(answers: &Answers, catalog: &QuestionCatalog) -> Vec<CategoryBalance> {
    let mut counts: BTreeMap<Category, (u32, u32)> = BTreeMap::new();

    for (key, value) in answers {
        let Some(party) = Party::from_label(value) else {
            continue;
        };
        let Some(category) = catalog.classify_answer(key) else {
            continue;
        };

        let entry = counts.entry(category).or_default();
        match party {
            Party::A => entry.0 += 1,
            Party::B => entry.1 += 1,
        }
    }

    Category::ALL
        .into_iter()
        .map(|category| {
            let (a, b) = counts.get(&category).copied().unwrap_or_default();
            CategoryBalance::from_counts(category, a, b)
        })
        .collect()
}

pub fn assess_signal(balances: &[CategoryBalance]) -> BalanceSignal {
    if balances.iter().any(|b| b.answered > 0) {
        BalanceSignal::Measured
    } else {
        BalanceSignal::Insufficient
    }
}

/// Mean imbalance across the given categories, 0 when empty.
pub fn mean_imbalance(balances: &[CategoryBalance]) -> f64 {
    if balances.is_empty() {
        return 0.0;
    }
    let sum: u32 = balances.iter().map(|b| b.imbalance).sum();
    f64::from(sum) / balances.len() as f64
}

/// Placeholder imbalances used by older releases when a household had no
/// survey data yet. Only used when explicitly enabled in the generator config.
pub fn legacy_default_balances() -> Vec<CategoryBalance> {
    let make = |category, a: u32| CategoryBalance {
        category,
        party_a_percent: a,
        party_b_percent: 100 - a,
        imbalance: a.abs_diff(100 - a),
        answered: 0,
    };
    vec![
        make(Category::InvisibleHousehold, 75),
        make(Category::InvisibleParental, 70),
        make(Category::VisibleHousehold, 60),
        make(Category::VisibleParental, 55),
    ]
}
