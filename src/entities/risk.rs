//! Risk entity - a tracked hazard with probability/impact ratings

use serde::{Deserialize, Serialize};

use crate::core::entity::{Audited, Rating, Record};
use crate::core::identity::EntityPrefix;
use crate::entities::history::HistoryEntry;

/// Risk lifecycle status.
///
/// The earlier taxonomy `{Open, Mitigating, Closed}` maps onto the same
/// variants; `InProgress` and `Mitigated` come from the later revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum RiskStatus {
    #[default]
    Open,
    InProgress,
    Mitigating,
    Mitigated,
    Closed,
}

impl RiskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RiskStatus::Open => "Open",
            RiskStatus::InProgress => "In Progress",
            RiskStatus::Mitigating => "Mitigating",
            RiskStatus::Mitigated => "Mitigated",
            RiskStatus::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "open" => Ok(RiskStatus::Open),
            "in_progress" => Ok(RiskStatus::InProgress),
            "mitigating" => Ok(RiskStatus::Mitigating),
            "mitigated" => Ok(RiskStatus::Mitigated),
            "closed" => Ok(RiskStatus::Closed),
            _ => Err(format!("Unknown risk status: {}", s)),
        }
    }
}

/// Risk level derived from probability and impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Canonical assessment: ordinal sum (2..=10), `>= 8` high, `>= 5` medium
    pub fn assess(probability: Rating, impact: Rating) -> Self {
        match probability.ordinal() + impact.ordinal() {
            8..=u8::MAX => RiskLevel::High,
            5..=7 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A risk record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub company_id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Staff member analysing the risk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_category_id: Option<String>,

    #[serde(default)]
    pub probability: Rating,

    #[serde(default)]
    pub impact: Rating,

    #[serde(default)]
    pub status: RiskStatus,

    /// Denormalized level string, written by the caller and never recomputed
    #[serde(default)]
    pub risk_level: String,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Risk {
    /// Create an open risk with its level assessed from the ratings
    pub fn new(
        company_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        probability: Rating,
        impact: Rating,
    ) -> Self {
        Self {
            id: String::new(),
            company_id: company_id.into(),
            title: title.into(),
            description: description.into(),
            analyst_id: None,
            category_id: None,
            risk_category_id: None,
            probability,
            impact,
            status: RiskStatus::Open,
            risk_level: RiskLevel::assess(probability, impact).to_string(),
            history: Vec::new(),
        }
    }

    /// Level computed from the current ratings (may differ from `risk_level`)
    pub fn assessed_level(&self) -> RiskLevel {
        RiskLevel::assess(self.probability, self.impact)
    }
}

impl Record for Risk {
    const PREFIX: EntityPrefix = EntityPrefix::Rsk;
    const COLLECTION: &'static str = "risks";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

impl Audited for Risk {
    const CREATED_EVENT: &'static str = "Risk created";

    fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Vec<HistoryEntry> {
        &mut self.history
    }
}

/// Partial update for a risk.
///
/// For the optional references, an empty string clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RiskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_category_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<Rating>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Rating>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RiskStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
}

impl RiskPatch {
    pub fn is_empty(&self) -> bool {
        *self == RiskPatch::default()
    }

    pub fn apply(self, risk: &mut Risk) {
        if let Some(company_id) = self.company_id {
            risk.company_id = company_id;
        }
        if let Some(title) = self.title {
            risk.title = title;
        }
        if let Some(description) = self.description {
            risk.description = description;
        }
        if let Some(analyst_id) = self.analyst_id {
            risk.analyst_id = non_empty(analyst_id);
        }
        if let Some(category_id) = self.category_id {
            risk.category_id = non_empty(category_id);
        }
        if let Some(risk_category_id) = self.risk_category_id {
            risk.risk_category_id = non_empty(risk_category_id);
        }
        if let Some(probability) = self.probability {
            risk.probability = probability;
        }
        if let Some(impact) = self.impact {
            risk.impact = impact;
        }
        if let Some(status) = self.status {
            risk.status = status;
        }
        if let Some(risk_level) = self.risk_level {
            risk.risk_level = risk_level;
        }
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assess_sum_thresholds() {
        // 1 + 1 = 2
        assert_eq!(RiskLevel::assess(Rating::VeryLow, Rating::VeryLow), RiskLevel::Low);
        // 2 + 2 = 4
        assert_eq!(RiskLevel::assess(Rating::Low, Rating::Low), RiskLevel::Low);
        // 3 + 2 = 5
        assert_eq!(RiskLevel::assess(Rating::Medium, Rating::Low), RiskLevel::Medium);
        // 4 + 3 = 7
        assert_eq!(RiskLevel::assess(Rating::High, Rating::Medium), RiskLevel::Medium);
        // 4 + 4 = 8
        assert_eq!(RiskLevel::assess(Rating::High, Rating::High), RiskLevel::High);
        assert_eq!(RiskLevel::assess(Rating::VeryHigh, Rating::VeryHigh), RiskLevel::High);
    }

    #[test]
    fn test_new_risk_defaults() {
        let risk = Risk::new("EMP001", "Cold room failure", "Temperature rise", Rating::Medium, Rating::High);
        assert_eq!(risk.status, RiskStatus::Open);
        assert_eq!(risk.risk_level, "Medium");
        assert!(risk.history.is_empty());
        assert!(risk.id.is_empty());
    }

    #[test]
    fn test_status_parse_accepts_labels() {
        assert_eq!("In Progress".parse::<RiskStatus>().unwrap(), RiskStatus::InProgress);
        assert_eq!("in-progress".parse::<RiskStatus>().unwrap(), RiskStatus::InProgress);
        assert_eq!("CLOSED".parse::<RiskStatus>().unwrap(), RiskStatus::Closed);
        assert!("archived".parse::<RiskStatus>().is_err());
    }

    #[test]
    fn test_patch_clears_reference_with_empty_string() {
        let mut risk = Risk::new("EMP001", "t", "d", Rating::Low, Rating::Low);
        risk.analyst_id = Some("COL001".to_string());

        RiskPatch {
            analyst_id: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut risk);

        assert_eq!(risk.analyst_id, None);
    }

    #[test]
    fn test_risk_json_uses_camel_case() {
        let risk = Risk::new("EMP001", "t", "d", Rating::Low, Rating::High);
        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["companyId"], "EMP001");
        assert_eq!(json["riskLevel"], "Medium");
        assert_eq!(json["impact"], "high");
        assert!(json.get("analystId").is_none());
    }
}
