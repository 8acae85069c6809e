//! Change-to-history translation
//!
//! Each audited record type has a table of tracked fields. Comparing the
//! previous and updated record against that table yields one clause per
//! changed field; the clauses are joined into a single history event.

use crate::entities::project::Project;
use crate::entities::risk::Risk;

/// Collections a tracked field may point into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Company,
    Staff,
    StakeholderGroup,
    ExternalStakeholder,
    Category,
    RiskCategory,
    Risk,
}

/// Resolves identifiers to display names
pub trait NameLookup {
    fn name_of(&self, kind: Lookup, id: &str) -> Option<&str>;
}

/// Lookup that never resolves, leaving identifiers as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl NameLookup for NoLookup {
    fn name_of(&self, _kind: Lookup, _id: &str) -> Option<&str> {
        None
    }
}

/// How a changed field is written into the clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// `Label: old → new`
    Arrow,
    /// `Label changed`
    Changed,
}

/// A field whose changes are recorded in history
pub struct TrackedField<T> {
    pub label: &'static str,
    pub value: fn(&T) -> Option<String>,
    pub lookup: Option<Lookup>,
    pub render: Render,
}

const NONE: &str = "None";

fn text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub const RISK_FIELDS: &[TrackedField<Risk>] = &[
    TrackedField {
        label: "Status",
        value: |r: &Risk| Some(r.status.label().to_string()),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Probability",
        value: |r: &Risk| Some(r.probability.label().to_string()),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Impact",
        value: |r: &Risk| Some(r.impact.label().to_string()),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Risk level",
        value: |r: &Risk| text(&r.risk_level),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Title",
        value: |r: &Risk| text(&r.title),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Description",
        value: |r: &Risk| text(&r.description),
        lookup: None,
        render: Render::Changed,
    },
    TrackedField {
        label: "Analyst",
        value: |r: &Risk| r.analyst_id.clone(),
        lookup: Some(Lookup::Staff),
        render: Render::Arrow,
    },
    TrackedField {
        label: "Company",
        value: |r: &Risk| text(&r.company_id),
        lookup: Some(Lookup::Company),
        render: Render::Arrow,
    },
    TrackedField {
        label: "Category",
        value: |r: &Risk| r.category_id.clone(),
        lookup: Some(Lookup::Category),
        render: Render::Arrow,
    },
    TrackedField {
        label: "Risk category",
        value: |r: &Risk| r.risk_category_id.clone(),
        lookup: Some(Lookup::RiskCategory),
        render: Render::Arrow,
    },
];

pub const PROJECT_FIELDS: &[TrackedField<Project>] = &[
    TrackedField {
        label: "Stage",
        value: |p: &Project| Some(p.stage.label().to_string()),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Title",
        value: |p: &Project| text(&p.title),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Deadline",
        value: |p: &Project| p.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
        lookup: None,
        render: Render::Arrow,
    },
    TrackedField {
        label: "Owner",
        value: |p: &Project| p.owner_id.clone(),
        lookup: Some(Lookup::Staff),
        render: Render::Arrow,
    },
    TrackedField {
        label: "Risk",
        value: |p: &Project| p.risk_id.clone(),
        lookup: Some(Lookup::Risk),
        render: Render::Arrow,
    },
    TrackedField {
        label: "Scope",
        value: |p: &Project| serde_json::to_string(&p.scope).ok(),
        lookup: None,
        render: Render::Changed,
    },
];

/// Compare two versions of a record and describe what changed.
///
/// Returns `None` when no tracked field differs.
pub fn narrate<T>(
    fields: &[TrackedField<T>],
    before: &T,
    after: &T,
    names: &dyn NameLookup,
) -> Option<String> {
    let clauses: Vec<String> = fields
        .iter()
        .filter_map(|field| {
            let old = (field.value)(before);
            let new = (field.value)(after);
            if old == new {
                return None;
            }
            Some(match field.render {
                Render::Changed => format!("{} changed", field.label),
                Render::Arrow => format!(
                    "{}: {} → {}",
                    field.label,
                    display(old.as_deref(), field.lookup, names),
                    display(new.as_deref(), field.lookup, names)
                ),
            })
        })
        .collect();

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" | "))
    }
}

fn display<'a>(value: Option<&'a str>, lookup: Option<Lookup>, names: &'a dyn NameLookup) -> &'a str {
    match (value, lookup) {
        (None, _) => NONE,
        (Some(id), Some(kind)) => names.name_of(kind, id).unwrap_or(id),
        (Some(raw), None) => raw,
    }
}
