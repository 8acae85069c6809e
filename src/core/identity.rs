//! Identifier assignment for stored records
//!
//! Identifiers are opaque strings. Reference collections use sequential codes
//! (`COL001`, `COL002`, ...) while risks and projects use a prefix plus a ULID
//! (`RSK-01J...`), matching how each collection was historically keyed.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Collection identifier prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityPrefix {
    /// Company
    Emp,
    /// Internal staff member
    Col,
    /// Stakeholder group
    StkGrp,
    /// External stakeholder
    Stk,
    /// General category
    Cat,
    /// Risk category
    Rcat,
    /// Risk
    Rsk,
    /// Remediation project
    Prj,
}

/// How identifiers are generated for a prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStyle {
    /// `PREFIX` followed by a zero-padded counter
    Sequential { width: usize },
    /// `PREFIX-` followed by a ULID
    Ulid,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Emp => "EMP",
            EntityPrefix::Col => "COL",
            EntityPrefix::StkGrp => "STKGRP",
            EntityPrefix::Stk => "STK",
            EntityPrefix::Cat => "CAT",
            EntityPrefix::Rcat => "RCAT",
            EntityPrefix::Rsk => "RSK",
            EntityPrefix::Prj => "PRJ",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Emp,
            EntityPrefix::Col,
            EntityPrefix::StkGrp,
            EntityPrefix::Stk,
            EntityPrefix::Cat,
            EntityPrefix::Rcat,
            EntityPrefix::Rsk,
            EntityPrefix::Prj,
        ]
    }

    pub fn id_style(&self) -> IdStyle {
        match self {
            EntityPrefix::Rsk | EntityPrefix::Prj => IdStyle::Ulid,
            _ => IdStyle::Sequential { width: 3 },
        }
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EMP" => Ok(EntityPrefix::Emp),
            "COL" => Ok(EntityPrefix::Col),
            "STKGRP" => Ok(EntityPrefix::StkGrp),
            "STK" => Ok(EntityPrefix::Stk),
            "CAT" => Ok(EntityPrefix::Cat),
            "RCAT" => Ok(EntityPrefix::Rcat),
            "RSK" => Ok(EntityPrefix::Rsk),
            "PRJ" => Ok(EntityPrefix::Prj),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// Generate a fresh identifier for `prefix`, given the identifiers already in
/// the collection.
///
/// Sequential codes continue after the highest numeric suffix found among
/// existing ids carrying the same prefix; ids that don't follow the pattern
/// are ignored. Once the counter is exhausted the ULID style is used instead.
pub fn generate_id<'a>(prefix: EntityPrefix, existing: impl IntoIterator<Item = &'a str>) -> String {
    match prefix.id_style() {
        IdStyle::Ulid => format!("{}-{}", prefix, Ulid::new()),
        IdStyle::Sequential { width } => {
            let highest = existing
                .into_iter()
                .filter_map(|id| sequence_number(prefix, id))
                .max()
                .unwrap_or(0);
            match highest.checked_add(1) {
                Some(next) => format!("{}{:0width$}", prefix, next, width = width),
                None => {
                    tracing::warn!(%prefix, "sequential ids exhausted, falling back to ULID");
                    format!("{}-{}", prefix, Ulid::new())
                }
            }
        }
    }
}

/// Extract the counter from a sequential id (`COL012` -> 12)
pub fn sequence_number(prefix: EntityPrefix, id: &str) -> Option<u32> {
    let digits = id.strip_prefix(prefix.as_str())?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Errors that can occur when parsing identifier prefixes
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}' (valid: EMP, COL, STKGRP, STK, CAT, RCAT, RSK, PRJ)")]
    InvalidPrefix(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_id_continues_after_highest() {
        let existing = ["COL001", "COL007", "COL003"];
        let id = generate_id(EntityPrefix::Col, existing.iter().copied());
        assert_eq!(id, "COL008");
    }

    #[test]
    fn test_sequential_id_falls_back_when_counter_exhausted() {
        let existing = ["EMP001", "EMP4294967295"];
        let id = generate_id(EntityPrefix::Emp, existing.iter().copied());
        assert!(id.starts_with("EMP-"));
        assert_eq!(id.len(), 30); // EMP- (4) + ULID (26)
        assert!(!existing.contains(&id.as_str()));
    }

    #[test]
    fn test_sequential_id_starts_at_one() {
        let id = generate_id(EntityPrefix::Emp, std::iter::empty());
        assert_eq!(id, "EMP001");
    }

    #[test]
    fn test_sequential_id_ignores_foreign_ids() {
        // STKGRP001 must not be read as an STK code
        let existing = ["STKGRP001", "STK004", "custom-id"];
        let id = generate_id(EntityPrefix::Stk, existing.iter().copied());
        assert_eq!(id, "STK005");
    }

    #[test]
    fn test_ulid_id_generation() {
        let id = generate_id(EntityPrefix::Rsk, std::iter::empty());
        assert!(id.starts_with("RSK-"));
        assert_eq!(id.len(), 30); // RSK- (4) + ULID (26)

        let other = generate_id(EntityPrefix::Rsk, std::iter::empty());
        assert_ne!(id, other);
    }

    #[test]
    fn test_sequence_number() {
        assert_eq!(sequence_number(EntityPrefix::Col, "COL012"), Some(12));
        assert_eq!(sequence_number(EntityPrefix::Col, "COL"), None);
        assert_eq!(sequence_number(EntityPrefix::Col, "COL-1"), None);
        assert_eq!(sequence_number(EntityPrefix::Col, "EMP001"), None);
    }

    #[test]
    fn test_all_prefixes_parse() {
        for prefix in EntityPrefix::all() {
            let parsed: EntityPrefix = prefix.as_str().parse().unwrap();
            assert_eq!(parsed, *prefix);
        }
        assert!(matches!(
            "XXX".parse::<EntityPrefix>(),
            Err(IdParseError::InvalidPrefix(_))
        ));
    }
}
