//! Stakeholders: groups that oversee risks and the external people in them

use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityPrefix;
use crate::entities::risk::non_empty;

/// A named collection of staff and external stakeholders.
///
/// Member lists behave as sets: no duplicates, first-insertion order kept.
/// A closed group's membership is frozen by convention; callers check
/// [`StakeholderGroup::closed`] before adding members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderGroup {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub member_staff_ids: Vec<String>,

    #[serde(default)]
    pub member_external_ids: Vec<String>,

    #[serde(default)]
    pub closed: bool,
}

impl StakeholderGroup {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description,
            member_staff_ids: Vec::new(),
            member_external_ids: Vec::new(),
            closed: false,
        }
    }

    /// Union new members into both sets. Returns true if anything was added.
    pub fn add_members<S: AsRef<str>>(&mut self, staff_ids: &[S], external_ids: &[S]) -> bool {
        let added_staff = union_into(&mut self.member_staff_ids, staff_ids);
        let added_external = union_into(&mut self.member_external_ids, external_ids);
        added_staff || added_external
    }

    /// Remove duplicate members that may have been written by other tools
    pub fn normalize(&mut self) {
        let staff = std::mem::take(&mut self.member_staff_ids);
        union_into(&mut self.member_staff_ids, &staff);
        let external = std::mem::take(&mut self.member_external_ids);
        union_into(&mut self.member_external_ids, &external);
    }

    pub fn member_count(&self) -> usize {
        self.member_staff_ids.len() + self.member_external_ids.len()
    }
}

fn union_into<S: AsRef<str>>(set: &mut Vec<String>, ids: &[S]) -> bool {
    let mut added = false;
    for id in ids {
        let id = id.as_ref();
        if !set.iter().any(|existing| existing == id) {
            set.push(id.to_string());
            added = true;
        }
    }
    added
}

impl Record for StakeholderGroup {
    const PREFIX: EntityPrefix = EntityPrefix::StkGrp;
    const COLLECTION: &'static str = "stakeholderGroups";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// A person outside the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalStakeholder {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ExternalStakeholder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            sector: None,
            email: None,
            phone: None,
        }
    }
}

impl Record for ExternalStakeholder {
    const PREFIX: EntityPrefix = EntityPrefix::Stk;
    const COLLECTION: &'static str = "externalStakeholders";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Partial update for an external stakeholder; empty strings clear the optional fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalStakeholderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ExternalStakeholderPatch {
    pub fn apply(self, person: &mut ExternalStakeholder) {
        if let Some(name) = self.name {
            person.name = name;
        }
        if let Some(sector) = self.sector {
            person.sector = non_empty(sector);
        }
        if let Some(email) = self.email {
            person.email = non_empty(email);
        }
        if let Some(phone) = self.phone {
            person.phone = non_empty(phone);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_members_is_set_union() {
        let mut group = StakeholderGroup::new("Risk Committee", None);
        group.member_staff_ids.push("A".to_string());

        let changed = group.add_members(&["A", "B"], &[]);
        assert!(changed);
        assert_eq!(group.member_staff_ids, vec!["A", "B"]);

        let changed = group.add_members(&["B"], &["X", "X"]);
        assert!(changed);
        assert_eq!(group.member_staff_ids, vec!["A", "B"]);
        assert_eq!(group.member_external_ids, vec!["X"]);

        assert!(!group.add_members::<&str>(&["A"], &["X"]));
    }

    #[test]
    fn test_normalize_removes_duplicates() {
        let mut group = StakeholderGroup::new("G", None);
        group.member_staff_ids = vec!["A".into(), "B".into(), "A".into()];
        group.normalize();
        assert_eq!(group.member_staff_ids, vec!["A", "B"]);
    }

    #[test]
    fn test_external_patch_clears_empty_fields() {
        let mut person = ExternalStakeholder::new("IT Manager");
        person.sector = Some("IT".to_string());
        person.email = Some("it@fornecedor.com".to_string());

        ExternalStakeholderPatch {
            sector: Some(String::new()),
            phone: Some("+55 65 3333-0000".to_string()),
            ..Default::default()
        }
        .apply(&mut person);

        assert_eq!(person.name, "IT Manager");
        assert_eq!(person.sector, None);
        assert_eq!(person.email.as_deref(), Some("it@fornecedor.com"));
        assert_eq!(person.phone.as_deref(), Some("+55 65 3333-0000"));
    }

    #[test]
    fn test_new_group_defaults() {
        let json = r#"{"name":"Board"}"#;
        let group: StakeholderGroup = serde_json::from_str(json).unwrap();
        assert!(!group.closed);
        assert!(group.member_staff_ids.is_empty());
        assert!(group.member_external_ids.is_empty());
    }
}
