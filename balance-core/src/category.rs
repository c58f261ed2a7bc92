use std::fmt;

use serde::{Deserialize, Serialize};

/// The four fixed task domains: visible/invisible × household/parental.
///
/// Declaration order is the canonical output order for per-category results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    VisibleHousehold,
    InvisibleHousehold,
    VisibleParental,
    InvisibleParental,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::VisibleHousehold,
        Category::InvisibleHousehold,
        Category::VisibleParental,
        Category::InvisibleParental,
    ];

    /// Number of consecutive question ordinals assigned to each category by
    /// the numeric-range fallback.
    pub const ORDINAL_SPAN: u32 = 20;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VisibleHousehold => "visible_household",
            Self::InvisibleHousehold => "invisible_household",
            Self::VisibleParental => "visible_parental",
            Self::InvisibleParental => "invisible_parental",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "visible_household" => Some(Self::VisibleHousehold),
            "invisible_household" => Some(Self::InvisibleHousehold),
            "visible_parental" => Some(Self::VisibleParental),
            "invisible_parental" => Some(Self::InvisibleParental),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::VisibleHousehold => "Visible Household Tasks",
            Self::InvisibleHousehold => "Invisible Household Tasks",
            Self::VisibleParental => "Visible Parental Tasks",
            Self::InvisibleParental => "Invisible Parental Tasks",
        }
    }

    /// Parse either the snake_case key or the display name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_str(s).or_else(|| Self::ALL.into_iter().find(|c| c.display_name() == s))
    }

    /// Numeric-range fallback: ordinals 1–20, 21–40, 41–60 and 61–80 map to
    /// the four categories in declaration order.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        if ordinal == 0 {
            return None;
        }
        let index = (ordinal - 1) / Self::ORDINAL_SPAN;
        Self::ALL.get(index as usize).copied()
    }

    pub fn is_invisible(&self) -> bool {
        matches!(self, Self::InvisibleHousehold | Self::InvisibleParental)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
