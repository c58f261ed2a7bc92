use std::collections::BTreeMap;

use balance_core::{Answers, BalanceSignal, CategoryBalance, FamilyPriorities};
use serde::{Deserialize, Serialize};

/// One member's answers for a cycle, keyed by question id.
///
/// Values are party labels (`A`, `B`, `PartyA`, ...). Values that are not a
/// party label are stored but never counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySubmission {
    pub member: String,
    /// Defaults to the family's current cycle.
    pub cycle: Option<u32>,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyReceipt {
    pub cycle: u32,
    pub recorded: usize,
}

/// Category balances for one cycle, with whether they carry any signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    pub cycle: u32,
    pub signal: BalanceSignal,
    pub balances: Vec<CategoryBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancePreviewInput {
    pub answers: Answers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CycleQuery {
    pub cycle: Option<u32>,
}

/// Query for weighted scoring. Priorities are category keys or display names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeightedQuery {
    pub cycle: Option<u32>,
    pub highest: Option<String>,
    pub secondary: Option<String>,
    pub tertiary: Option<String>,
}

impl WeightedQuery {
    pub fn priorities(&self) -> FamilyPriorities {
        let parse = |s: &Option<String>| s.as_deref().and_then(balance_core::Category::parse);
        FamilyPriorities {
            highest: parse(&self.highest),
            secondary: parse(&self.secondary),
            tertiary: parse(&self.tertiary),
        }
    }
}
