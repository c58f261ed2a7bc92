use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A couple's relationship check-in for one cycle, recorded per member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupleCheckIn {
    pub id: Uuid,
    pub family_id: Uuid,
    pub cycle: u32,
    pub member: String,
    pub ratings: CheckInRatings,
    pub strategies: BTreeMap<Strategy, StrategyProgress>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Five relationship-health ratings on a 1–5 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInRatings {
    pub satisfaction: u8,
    pub communication: u8,
    pub emotional_connection: u8,
    pub workload_balance: u8,
    pub appreciation: u8,
}

impl Default for CheckInRatings {
    fn default() -> Self {
        Self {
            satisfaction: 3,
            communication: 3,
            emotional_connection: 3,
            workload_balance: 3,
            appreciation: 3,
        }
    }
}

impl CheckInRatings {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("satisfaction", self.satisfaction),
            ("communication", self.communication),
            ("emotional_connection", self.emotional_connection),
            ("workload_balance", self.workload_balance),
            ("appreciation", self.appreciation),
        ];
        for (field, value) in fields {
            check_range(field, value, 1, 5)?;
        }
        Ok(())
    }

    pub fn average(&self) -> f64 {
        let sum = u32::from(self.satisfaction)
            + u32::from(self.communication)
            + u32::from(self.emotional_connection)
            + u32::from(self.workload_balance)
            + u32::from(self.appreciation);
        f64::from(sum) / 5.0
    }
}

/// Relationship-strengthening practices a couple can track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DailyCheckins,
    DivideConquer,
    DateNights,
    GratitudeAffirmation,
    UnifiedCalendar,
    ProblemSolving,
    SelfCare,
    ProfessionalDevelopment,
    CelebrateMilestones,
    FuturePlanning,
}

impl Strategy {
    pub const ALL: [Strategy; 10] = [
        Strategy::DailyCheckins,
        Strategy::DivideConquer,
        Strategy::DateNights,
        Strategy::GratitudeAffirmation,
        Strategy::UnifiedCalendar,
        Strategy::ProblemSolving,
        Strategy::SelfCare,
        Strategy::ProfessionalDevelopment,
        Strategy::CelebrateMilestones,
        Strategy::FuturePlanning,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::DailyCheckins => "Daily Check-ins",
            Self::DivideConquer => "Divide and Conquer",
            Self::DateNights => "Date Nights",
            Self::GratitudeAffirmation => "Gratitude and Affirmation",
            Self::UnifiedCalendar => "Unified Family Calendar",
            Self::ProblemSolving => "Collaborative Problem Solving",
            Self::SelfCare => "Self-Care Support",
            Self::ProfessionalDevelopment => "Professional Development Support",
            Self::CelebrateMilestones => "Celebrate Milestones",
            Self::FuturePlanning => "Future Planning",
        }
    }

    /// Every strategy with its label, for rendering a check-in form.
    pub fn options() -> Vec<StrategyOption> {
        Self::ALL
            .iter()
            .map(|&strategy| StrategyOption {
                strategy,
                label: strategy.label().to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyOption {
    pub strategy: Strategy,
    pub label: String,
}

/// Progress on one strategy.
///
/// `implementation` is a 0–100 percentage; `effectiveness` is 0 (not yet
/// rated) to 5.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyProgress {
    pub implementation: u8,
    pub effectiveness: u8,
    #[serde(default)]
    pub notes: String,
}

impl StrategyProgress {
    pub fn set_implementation(&mut self, percent: u8) -> Result<(), DomainError> {
        check_range("implementation", percent, 0, 100)?;
        self.implementation = percent;
        Ok(())
    }

    pub fn set_effectiveness(&mut self, rating: u8) -> Result<(), DomainError> {
        check_range("effectiveness", rating, 0, 5)?;
        self.effectiveness = rating;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_range("implementation", self.implementation, 0, 100)?;
        check_range("effectiveness", self.effectiveness, 0, 5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInInput {
    pub member: String,
    /// Defaults to the family's current cycle.
    pub cycle: Option<u32>,
    #[serde(default)]
    pub ratings: CheckInRatings,
    #[serde(default)]
    pub strategies: BTreeMap<Strategy, StrategyProgress>,
    pub notes: Option<String>,
}

impl CheckInInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.member.trim().is_empty() {
            return Err(DomainError::Missing("member"));
        }
        self.ratings.validate()?;
        self.strategies.values().try_for_each(StrategyProgress::validate)
    }
}

fn check_range(field: &'static str, value: u8, min: u8, max: u8) -> Result<(), DomainError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::OutOfRange {
            field,
            min: u32::from(min),
            max: u32::from(max),
            value: u32::from(value),
        })
    }
}
