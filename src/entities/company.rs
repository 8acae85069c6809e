//! Company entity - the organizational unit risks and staff belong to

use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityPrefix;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

impl Company {
    /// Create a company without an identifier; the store assigns one
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
        }
    }
}

impl Record for Company {
    const PREFIX: EntityPrefix = EntityPrefix::Emp;
    const COLLECTION: &'static str = "companies";

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
