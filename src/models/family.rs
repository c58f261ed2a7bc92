use balance_core::PartyNames;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A household of two responsible parties.
///
/// `current_cycle` starts at 1 and only moves forward, one step per
/// completed cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub party_a_name: String,
    pub party_b_name: String,
    pub current_cycle: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Family {
    pub fn party_names(&self) -> PartyNames {
        PartyNames::new(self.party_a_name.clone(), self.party_b_name.clone())
    }
}

/// Input for creating a family. Party names default to "Party A" / "Party B".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFamilyInput {
    pub name: String,
    pub party_a_name: Option<String>,
    pub party_b_name: Option<String>,
}
