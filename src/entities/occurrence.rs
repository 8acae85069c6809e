//! Occurrence reports - a risk materializing, recorded into its history

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::changes::{Lookup, NameLookup};

/// A report that a risk has materialized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Occurrence {
    /// Day the risk materialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_on: Option<NaiveDate>,

    /// Expected date for the actions to be delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,

    /// Staff id or free-form name of whoever reports and owns the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,

    /// What is blocked or went wrong
    pub impediment: String,

    /// Actions taken or planned
    #[serde(default)]
    pub actions: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stakeholder_group_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stakeholder_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment: Option<Investment>,
}

/// Money needed to respond to an occurrence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Investment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<InvestmentItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceCost>,

    /// Approved budget; the estimate is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentItem {
    pub description: String,
    pub quantity: f64,
    pub unit_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCost {
    pub description: String,
    pub value: f64,
}

impl Investment {
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.quantity * i.unit_value).sum()
    }

    pub fn services_total(&self) -> f64 {
        self.services.iter().map(|s| s.value).sum()
    }

    pub fn estimated_total(&self) -> f64 {
        self.items_total() + self.services_total()
    }

    pub fn budget_or_estimate(&self) -> f64 {
        self.budget.unwrap_or_else(|| self.estimated_total())
    }
}

impl Occurrence {
    /// Render the history event text, resolving stakeholder ids to names
    pub fn describe(&self, names: &dyn NameLookup) -> String {
        let mut parts = Vec::new();

        match self.occurred_on {
            Some(day) => parts.push(format!("Occurrence on {}: {}", day, self.impediment.trim())),
            None => parts.push(format!("Occurrence: {}", self.impediment.trim())),
        }

        if !self.actions.trim().is_empty() {
            parts.push(format!("Actions: {}", self.actions.trim()));
        }

        if let Some(day) = self.delivery_date {
            parts.push(format!("Delivery: {}", day));
        }

        let stakeholders = self.stakeholder_summary(names);
        if !stakeholders.is_empty() {
            parts.push(format!("Stakeholders: {}", stakeholders));
        }

        if let Some(ref investment) = self.investment {
            let mut text = format!(
                "Investment: {:.2} (items {:.2}, services {:.2})",
                investment.budget_or_estimate(),
                investment.items_total(),
                investment.services_total()
            );
            if let Some(ref description) = investment.description {
                if !description.trim().is_empty() {
                    text.push_str(&format!(" - {}", description.trim()));
                }
            }
            parts.push(text);
        }

        parts.join(" | ")
    }

    /// Groups first, then people; unknown ids are kept verbatim
    pub fn stakeholder_summary(&self, names: &dyn NameLookup) -> String {
        let groups = self
            .stakeholder_group_ids
            .iter()
            .map(|id| names.name_of(Lookup::StakeholderGroup, id).unwrap_or(id.as_str()).to_string());
        let people = self
            .stakeholder_ids
            .iter()
            .map(|id| names.name_of(Lookup::ExternalStakeholder, id).unwrap_or(id.as_str()).to_string());
        groups.chain(people).collect::<Vec<_>>().join(", ")
    }

    /// History author: the responsible's name when it resolves to staff
    pub fn author(&self, names: &dyn NameLookup) -> Option<String> {
        let responsible = self.responsible.as_deref()?.trim();
        if responsible.is_empty() {
            return None;
        }
        Some(
            names
                .name_of(Lookup::Staff, responsible)
                .unwrap_or(responsible)
                .to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::changes::NoLookup;

    #[test]
    fn test_investment_totals() {
        let investment = Investment {
            description: None,
            items: vec![InvestmentItem {
                description: "Sensor".to_string(),
                quantity: 2.0,
                unit_value: 150.0,
            }],
            services: vec![ServiceCost {
                description: "Install".to_string(),
                value: 200.0,
            }],
            budget: None,
        };
        assert_eq!(investment.items_total(), 300.0);
        assert_eq!(investment.services_total(), 200.0);
        assert_eq!(investment.budget_or_estimate(), 500.0);

        let capped = Investment {
            budget: Some(450.0),
            ..investment
        };
        assert_eq!(capped.budget_or_estimate(), 450.0);
    }

    #[test]
    fn test_describe_without_lookup_keeps_ids() {
        let occurrence = Occurrence {
            impediment: "Compressor stopped".to_string(),
            actions: "Called maintenance".to_string(),
            stakeholder_group_ids: vec!["STKGRP001".to_string()],
            stakeholder_ids: vec!["STK002".to_string()],
            ..Default::default()
        };
        let text = occurrence.describe(&NoLookup);
        assert_eq!(
            text,
            "Occurrence: Compressor stopped | Actions: Called maintenance | Stakeholders: STKGRP001, STK002"
        );
    }

    #[test]
    fn test_author_falls_back_to_raw_value() {
        let occurrence = Occurrence {
            responsible: Some("Maria".to_string()),
            ..Default::default()
        };
        assert_eq!(occurrence.author(&NoLookup).as_deref(), Some("Maria"));
        assert_eq!(Occurrence::default().author(&NoLookup), None);
    }
}
