//! Staff entity - people inside the organization

use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityPrefix;
use crate::entities::risk::non_empty;

/// An internal staff member (analysts, project owners, responsibles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub email: String,

    /// Company the person works for (not enforced)
    #[serde(default)]
    pub company_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Staff {
    pub fn new(name: impl Into<String>, email: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            email: email.into(),
            company_id: company_id.into(),
            department: None,
        }
    }
}

impl Record for Staff {
    const PREFIX: EntityPrefix = EntityPrefix::Col;
    const COLLECTION: &'static str = "staff";

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

/// Partial update for a staff member; an empty `department` clears it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StaffPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl StaffPatch {
    pub fn apply(self, staff: &mut Staff) {
        if let Some(name) = self.name {
            staff.name = name;
        }
        if let Some(email) = self.email {
            staff.email = email;
        }
        if let Some(company_id) = self.company_id {
            staff.company_id = company_id;
        }
        if let Some(department) = self.department {
            staff.department = non_empty(department);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_overwrites_only_present_fields() {
        let mut staff = Staff::new("Carlos", "carlos@empresa.com", "EMP001");
        StaffPatch {
            email: Some("c@empresa.com".to_string()),
            department: Some("Quality".to_string()),
            ..Default::default()
        }
        .apply(&mut staff);

        assert_eq!(staff.name, "Carlos");
        assert_eq!(staff.email, "c@empresa.com");
        assert_eq!(staff.company_id, "EMP001");
        assert_eq!(staff.department.as_deref(), Some("Quality"));
    }

    #[test]
    fn test_empty_department_clears() {
        let mut staff = Staff::new("Ana", "ana@empresa.com", "EMP002");
        staff.department = Some("Quality".to_string());
        StaffPatch {
            department: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut staff);

        assert_eq!(staff.department, None);
        let json = serde_json::to_value(&staff).unwrap();
        assert!(json.get("department").is_none());
    }

    #[test]
    fn test_patch_rejects_unknown_keys() {
        let err = serde_json::from_str::<StaffPatch>(r#"{"name":"x","salary":10}"#);
        assert!(err.is_err());
    }
}
