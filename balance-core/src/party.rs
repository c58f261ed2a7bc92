use serde::{Deserialize, Serialize};

/// One of the two responsible parties in a household.
///
/// Every survey answer attributes a task to exactly one party, and every
/// generated task is assigned to exactly one party. Display names live in
/// [`PartyNames`]; the scoring and generation logic only ever needs to know
/// "this side" and "the other side".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    A,
    B,
}

impl Party {
    pub const BOTH: [Party; 2] = [Party::A, Party::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "party_a",
            Self::B => "party_b",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "party_a" => Some(Self::A),
            "party_b" => Some(Self::B),
            _ => None,
        }
    }

    /// Parse a survey answer value.
    ///
    /// Accepts `A`, `B`, `PartyA`, `PartyB`, `party_a`, `party_b` and
    /// `party a` / `party b`, ignoring case. Anything else (including
    /// "Both" or an empty string) is not a party answer.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "a" | "partya" => Some(Self::A),
            "b" | "partyb" => Some(Self::B),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Display names for the two parties, used only in generated task text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartyNames {
    pub a: String,
    pub b: String,
}

impl PartyNames {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn name(&self, party: Party) -> &str {
        match party {
            Party::A => &self.a,
            Party::B => &self.b,
        }
    }

    /// Find which party a free-text line refers to, by display name first and
    /// then by generic label. Returns `None` when neither or both are named.
    pub fn mentioned_in(&self, text: &str) -> Option<Party> {
        let lower = text.to_lowercase();
        let mentions = |party: Party| {
            let name = self.name(party).to_lowercase();
            (!name.is_empty() && lower.contains(&name))
                || lower.contains(&format!("party {}", party_letter(party)))
        };

        match (mentions(Party::A), mentions(Party::B)) {
            (true, false) => Some(Party::A),
            (false, true) => Some(Party::B),
            _ => None,
        }
    }
}

impl Default for PartyNames {
    fn default() -> Self {
        Self::new("Party A", "Party B")
    }
}

fn party_letter(party: Party) -> char {
    match party {
        Party::A => 'a',
        Party::B => 'b',
    }
}
