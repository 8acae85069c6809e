//! Free-form taxonomies: general categories and risk categories

use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityPrefix;

/// General-purpose category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Category specific to risks (operational, supply, regulatory...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCategory {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description,
        }
    }
}

impl RiskCategory {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description,
        }
    }
}

impl Record for Category {
    const PREFIX: EntityPrefix = EntityPrefix::Cat;
    const COLLECTION: &'static str = "categories";

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

impl Record for RiskCategory {
    const PREFIX: EntityPrefix = EntityPrefix::Rcat;
    const COLLECTION: &'static str = "riskCategories";

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
