//! Record trait - common interface for all stored record types

use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::EntityPrefix;
use crate::entities::history::HistoryEntry;

/// Common trait for all records kept in the document
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Prefix used when the store assigns an identifier
    const PREFIX: EntityPrefix;

    /// Collection name as it appears in the document and in error messages
    const COLLECTION: &'static str;

    /// Get the record's identifier
    fn id(&self) -> &str;

    /// Replace the record's identifier
    fn set_id(&mut self, id: String);

    /// Name shown when another record refers to this one
    fn display_name(&self) -> &str;
}

/// Records that carry an append-only audit log
pub trait Audited: Record {
    /// Event text of the entry appended on creation
    const CREATED_EVENT: &'static str;

    fn history(&self) -> &[HistoryEntry];

    fn history_mut(&mut self) -> &mut Vec<HistoryEntry>;
}

/// Five-level ordinal rating used for both probability and impact
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Rating {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl Rating {
    /// Ordinal value, 1 (very low) through 5 (very high)
    pub fn ordinal(&self) -> u8 {
        match self {
            Rating::VeryLow => 1,
            Rating::Low => 2,
            Rating::Medium => 3,
            Rating::High => 4,
            Rating::VeryHigh => 5,
        }
    }

    pub fn from_ordinal(n: u8) -> Option<Self> {
        match n {
            1 => Some(Rating::VeryLow),
            2 => Some(Rating::Low),
            3 => Some(Rating::Medium),
            4 => Some(Rating::High),
            5 => Some(Rating::VeryHigh),
            _ => None,
        }
    }

    /// Human-readable label used in history and tables
    pub fn label(&self) -> &'static str {
        match self {
            Rating::VeryLow => "Very Low",
            Rating::Low => "Low",
            Rating::Medium => "Medium",
            Rating::High => "High",
            Rating::VeryHigh => "Very High",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    /// Accepts the serialized name (`very_high`), the label (`Very High`) or
    /// the ordinal digit (`5`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "very_low" | "1" => Ok(Rating::VeryLow),
            "low" | "2" => Ok(Rating::Low),
            "medium" | "3" => Ok(Rating::Medium),
            "high" | "4" => Ok(Rating::High),
            "very_high" | "5" => Ok(Rating::VeryHigh),
            _ => Err(format!("Unknown rating: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_parse_forms() {
        assert_eq!("very_high".parse::<Rating>().unwrap(), Rating::VeryHigh);
        assert_eq!("Very High".parse::<Rating>().unwrap(), Rating::VeryHigh);
        assert_eq!("very-low".parse::<Rating>().unwrap(), Rating::VeryLow);
        assert_eq!("3".parse::<Rating>().unwrap(), Rating::Medium);
        assert!("6".parse::<Rating>().is_err());
    }

    #[test]
    fn test_rating_ordinals_roundtrip() {
        for n in 1..=5 {
            assert_eq!(Rating::from_ordinal(n).unwrap().ordinal(), n);
        }
        assert_eq!(Rating::from_ordinal(0), None);
    }

    #[test]
    fn test_rating_serializes_snake_case() {
        let json = serde_json::to_string(&Rating::VeryHigh).unwrap();
        assert_eq!(json, "\"very_high\"");
    }
}
