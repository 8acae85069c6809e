//! The persisted document and the backends that hold it
//!
//! Every collection lives in a single [`Document`]. A [`DocumentBackend`]
//! loads and saves the whole document at once; the store never touches
//! partial state.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::changes::{Lookup, NameLookup};
use crate::core::entity::{Rating, Record};
use crate::core::store::StoreError;
use crate::entities::{
    Category, Company, ExternalStakeholder, HistoryEntry, Project, Risk, RiskCategory, RiskStatus,
    Scope, Settings, Stage, Staff, StakeholderGroup,
};

/// All collections, in the on-disk layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub companies: Vec<Company>,

    #[serde(default)]
    pub staff: Vec<Staff>,

    #[serde(default)]
    pub stakeholder_groups: Vec<StakeholderGroup>,

    #[serde(default)]
    pub external_stakeholders: Vec<ExternalStakeholder>,

    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub risk_categories: Vec<RiskCategory>,

    #[serde(default)]
    pub risks: Vec<Risk>,

    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default)]
    pub config: Settings,
}

/// A record type together with the collection that stores it
pub trait Stored: Record {
    fn collection(doc: &Document) -> &Vec<Self>;
    fn collection_mut(doc: &mut Document) -> &mut Vec<Self>;
}

macro_rules! stored_in {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn collection(doc: &Document) -> &Vec<Self> {
                &doc.$field
            }

            fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
                &mut doc.$field
            }
        }
    };
}

stored_in!(Company, companies);
stored_in!(Staff, staff);
stored_in!(StakeholderGroup, stakeholder_groups);
stored_in!(ExternalStakeholder, external_stakeholders);
stored_in!(Category, categories);
stored_in!(RiskCategory, risk_categories);
stored_in!(Risk, risks);
stored_in!(Project, projects);

fn name_in<'a, T: Record>(records: &'a [T], id: &str) -> Option<&'a str> {
    records
        .iter()
        .find(|r| r.id() == id)
        .map(|r| r.display_name())
}

impl NameLookup for Document {
    fn name_of(&self, kind: Lookup, id: &str) -> Option<&str> {
        match kind {
            Lookup::Company => name_in(&self.companies, id),
            Lookup::Staff => name_in(&self.staff, id),
            Lookup::StakeholderGroup => name_in(&self.stakeholder_groups, id),
            Lookup::ExternalStakeholder => name_in(&self.external_stakeholders, id),
            Lookup::Category => name_in(&self.categories, id),
            Lookup::RiskCategory => name_in(&self.risk_categories, id),
            Lookup::Risk => name_in(&self.risks, id),
        }
    }
}

impl Document {
    /// Find a record by id in its collection
    pub fn find<T: Stored>(&self, id: &str) -> Option<&T> {
        T::collection(self).iter().find(|r| r.id() == id)
    }

    pub fn find_mut<T: Stored>(&mut self, id: &str) -> Option<&mut T> {
        T::collection_mut(self).iter_mut().find(|r| r.id() == id)
    }

    /// The dataset written when no document exists yet
    pub fn demo() -> Self {
        let now = Utc::now();
        let seeded = |event: &str| vec![HistoryEntry::system(event)];

        let risk = |id: &str,
                    company: &str,
                    title: &str,
                    description: &str,
                    analyst: &str,
                    probability: Rating,
                    impact: Rating,
                    status: RiskStatus,
                    history: Vec<HistoryEntry>| {
            let mut risk = Risk::new(company, title, description, probability, impact);
            risk.id = id.to_string();
            risk.analyst_id = Some(analyst.to_string());
            risk.status = status;
            risk.history = history;
            risk
        };

        let project = |id: &str,
                       title: &str,
                       risk_id: Option<&str>,
                       stage: Stage,
                       days: i64,
                       owner: &str,
                       scope: [&str; 3],
                       event: &str| {
            let mut project = Project::new(title);
            project.id = id.to_string();
            project.risk_id = risk_id.map(str::to_string);
            project.stage = stage;
            project.deadline = Some(now + Duration::days(days));
            project.owner_id = Some(owner.to_string());
            project.scope = Scope {
                objective: Some(scope[0].to_string()),
                deliverables: Some(scope[1].to_string()),
                resources: Some(scope[2].to_string()),
            };
            project.history = seeded(event);
            if stage == Stage::Done {
                project.closed_at = Some(now);
            }
            project
        };

        let mut committee = StakeholderGroup::new(
            "Risk Committee",
            Some("Main group following up on risks".to_string()),
        );
        committee.id = "STKGRP001".to_string();
        committee.add_members(&["COL001"], &["STK001", "STK002"]);
        committee.closed = true;

        Self {
            companies: vec![
                company("EMP001", "Matriz Lucas do Rio Verde"),
                company("EMP002", "Filial Sinop"),
            ],
            staff: vec![
                staff("COL001", "Carlos", "carlos@empresa.com", "EMP001"),
                staff("COL002", "Ana", "ana@empresa.com", "EMP002"),
            ],
            stakeholder_groups: vec![committee],
            external_stakeholders: vec![
                external("STK001", "Quality Manager", "Quality", "qualidade@empresa.com", "(65) 9000-0001"),
                external("STK002", "IT Manager", "IT", "ti@empresa.com", "(65) 9000-0002"),
            ],
            categories: Vec::new(),
            risk_categories: Vec::new(),
            risks: vec![
                risk(
                    "RSK001",
                    "EMP001",
                    "Cold room refrigeration failure",
                    "Temperature rise affecting meat quality.",
                    "COL001",
                    Rating::Medium,
                    Rating::High,
                    RiskStatus::Open,
                    seeded("Risk created (seed)"),
                ),
                risk(
                    "RSK002",
                    "EMP002",
                    "Packaging supply shortage",
                    "Interruption caused by a late packaging supplier.",
                    "COL002",
                    Rating::Low,
                    Rating::Medium,
                    RiskStatus::Closed,
                    vec![
                        HistoryEntry::system("Risk created (seed)"),
                        HistoryEntry::system("Risk closed"),
                    ],
                ),
                risk(
                    "RSK003",
                    "EMP001",
                    "Key employee absence",
                    "Prolonged absence affecting a critical operation.",
                    "COL001",
                    Rating::High,
                    Rating::Medium,
                    RiskStatus::Mitigating,
                    vec![
                        HistoryEntry::system("Risk created (seed)"),
                        HistoryEntry::system("Mitigation plan started"),
                    ],
                ),
                risk(
                    "RSK004",
                    "EMP002",
                    "IT network failure",
                    "Network instability may affect integrations and ERPs.",
                    "COL002",
                    Rating::Medium,
                    Rating::Low,
                    RiskStatus::Open,
                    seeded("Risk created (seed)"),
                ),
                risk(
                    "RSK005",
                    "EMP001",
                    "Sanitary non-compliance",
                    "Possible fine after a non-compliant inspection.",
                    "COL001",
                    Rating::High,
                    Rating::High,
                    RiskStatus::Open,
                    seeded("Risk created (seed)"),
                ),
            ],
            projects: vec![
                project(
                    "PRJ001",
                    "Refrigeration contingency plan",
                    Some("RSK001"),
                    Stage::Planning,
                    7,
                    "COL001",
                    [
                        "Preventive maintenance and redundant sensors",
                        "Maintenance checklist; sensor installation",
                        "Maintenance team; budget",
                    ],
                    "Project created (seed)",
                ),
                project(
                    "PRJ002",
                    "Alternative packaging plan",
                    Some("RSK002"),
                    Stage::Execution,
                    3,
                    "COL002",
                    [
                        "Qualify a backup supplier",
                        "Signed contract; trial batch received",
                        "Purchasing; legal",
                    ],
                    "Project created (seed)",
                ),
                project(
                    "PRJ003",
                    "Cross-training for critical role",
                    Some("RSK003"),
                    Stage::Done,
                    -2,
                    "COL001",
                    [
                        "Coverage by a trained team",
                        "Updated skills matrix",
                        "HR; operations",
                    ],
                    "Project created (seed)",
                ),
                project(
                    "PRJ004",
                    "Internal process audit",
                    None,
                    Stage::Backlog,
                    14,
                    "COL002",
                    [
                        "Map operational risks without a direct link",
                        "Audit report",
                        "Quality team",
                    ],
                    "Project created (seed - no linked risk)",
                ),
            ],
            config: Settings::default(),
        }
    }

    /// Additional demo records, merged by id into an existing document
    pub fn demo_extras() -> Self {
        let now = Utc::now();
        let seeded = || vec![HistoryEntry::system("Risk created (demo)")];

        let mut risks = Vec::new();
        for (id, company, title, description, analyst, probability, impact, status) in [
            (
                "RSK010",
                "EMP003",
                "Power supply interruption",
                "Power outage may stop production.",
                "COL004",
                Rating::High,
                Rating::High,
                RiskStatus::Open,
            ),
            (
                "RSK011",
                "EMP004",
                "Road logistics risk",
                "Delays caused by highway problems.",
                "COL003",
                Rating::Medium,
                Rating::Medium,
                RiskStatus::Mitigating,
            ),
            (
                "RSK012",
                "EMP001",
                "IoT sensor failure",
                "Sensors stop reporting data.",
                "COL001",
                Rating::Low,
                Rating::Medium,
                RiskStatus::Open,
            ),
        ] {
            let mut risk = Risk::new(company, title, description, probability, impact);
            risk.id = id.to_string();
            risk.analyst_id = Some(analyst.to_string());
            risk.status = status;
            risk.history = seeded();
            risks.push(risk);
        }

        let mut projects = Vec::new();
        for (id, title, risk_id, stage, days, owner, objective) in [
            ("PRJ200", "Power backup", "RSK010", Stage::Planning, 20, "COL004", "Install a generator"),
            ("PRJ201", "Alternative logistics plan", "RSK011", Stage::Execution, 10, "COL003", "Alternative routes"),
            ("PRJ202", "Sensor audit", "RSK012", Stage::Backlog, 40, "COL001", "Audit the IoT network"),
        ] {
            let mut project = Project::new(title);
            project.id = id.to_string();
            project.risk_id = Some(risk_id.to_string());
            project.stage = stage;
            project.deadline = Some(now + Duration::days(days));
            project.owner_id = Some(owner.to_string());
            project.scope.objective = Some(objective.to_string());
            project.history = vec![HistoryEntry::system("Project created (demo)")];
            projects.push(project);
        }

        Self {
            companies: vec![
                company("EMP003", "Unidade Várzea Grande"),
                company("EMP004", "Unidade Rondonópolis"),
            ],
            staff: vec![
                staff("COL003", "Yago", "yago@empresa.com", "EMP001"),
                staff("COL004", "Marina", "marina@empresa.com", "EMP003"),
            ],
            risks,
            projects,
            ..Default::default()
        }
    }

    /// Append every record of `other` whose id is not already present.
    ///
    /// Returns the number of records added.
    pub fn merge_missing(&mut self, other: Document) -> usize {
        merge_into(&mut self.companies, other.companies)
            + merge_into(&mut self.staff, other.staff)
            + merge_into(&mut self.stakeholder_groups, other.stakeholder_groups)
            + merge_into(&mut self.external_stakeholders, other.external_stakeholders)
            + merge_into(&mut self.categories, other.categories)
            + merge_into(&mut self.risk_categories, other.risk_categories)
            + merge_into(&mut self.risks, other.risks)
            + merge_into(&mut self.projects, other.projects)
    }
}

fn merge_into<T: Record>(target: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let mut added = 0;
    for record in incoming {
        if !target.iter().any(|r| r.id() == record.id()) {
            target.push(record);
            added += 1;
        }
    }
    added
}

fn company(id: &str, name: &str) -> Company {
    let mut company = Company::new(name);
    company.id = id.to_string();
    company
}

fn staff(id: &str, name: &str, email: &str, company_id: &str) -> Staff {
    let mut staff = Staff::new(name, email, company_id);
    staff.id = id.to_string();
    staff
}

fn external(id: &str, name: &str, sector: &str, email: &str, phone: &str) -> ExternalStakeholder {
    let mut stakeholder = ExternalStakeholder::new(name);
    stakeholder.id = id.to_string();
    stakeholder.sector = Some(sector.to_string());
    stakeholder.email = Some(email.to_string());
    stakeholder.phone = Some(phone.to_string());
    stakeholder
}

/// Where the document lives between operations
pub trait DocumentBackend: Send + Sync {
    /// Read the whole document
    fn load(&self) -> Result<Document, StoreError>;

    /// Replace the whole document
    fn save(&self, doc: &Document) -> Result<(), StoreError>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Pretty-printed JSON file, overwritten on every save
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    seed: bool,
}

impl JsonFileBackend {
    /// Backend that writes the demo dataset when the file is absent
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: true,
        }
    }

    /// Backend that treats an absent file as an empty document
    pub fn without_seed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentBackend for JsonFileBackend {
    fn load(&self) -> Result<Document, StoreError> {
        if !self.path.exists() {
            if !self.seed {
                return Ok(Document::default());
            }
            tracing::info!(path = %self.path.display(), "seeding demo document");
            let doc = Document::demo();
            self.save(&doc)?;
            return Ok(doc);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let content = serde_json::to_string_pretty(doc).map_err(StoreError::Serialize)?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Document kept in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryBackend {
    doc: Mutex<Document>,
}

impl MemoryBackend {
    pub fn new(doc: Document) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }
}

impl DocumentBackend for MemoryBackend {
    fn load(&self) -> Result<Document, StoreError> {
        self.doc
            .lock()
            .map(|doc| doc.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let mut stored = self.doc.lock().map_err(|_| StoreError::Poisoned)?;
        *stored = doc.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RiskLevel;
    use tempfile::tempdir;

    #[test]
    fn test_demo_dataset_shape() {
        let doc = Document::demo();
        assert_eq!(doc.companies.len(), 2);
        assert_eq!(doc.staff.len(), 2);
        assert_eq!(doc.stakeholder_groups.len(), 1);
        assert!(doc.stakeholder_groups[0].closed);
        assert_eq!(doc.external_stakeholders.len(), 2);
        assert_eq!(doc.risks.len(), 5);
        assert_eq!(doc.projects.len(), 4);
        assert!(doc.risks.iter().all(|r| !r.history.is_empty()));
        assert!(doc.projects.iter().all(|p| !p.history.is_empty()));
    }

    #[test]
    fn test_demo_risk_levels_use_sum() {
        let doc = Document::demo();
        let rsk005 = doc.find::<Risk>("RSK005").unwrap();
        assert_eq!(rsk005.risk_level, RiskLevel::High.as_str());
        let rsk004 = doc.find::<Risk>("RSK004").unwrap();
        assert_eq!(rsk004.risk_level, RiskLevel::Medium.as_str());
    }

    #[test]
    fn test_name_lookup() {
        let doc = Document::demo();
        assert_eq!(doc.name_of(Lookup::Staff, "COL002"), Some("Ana"));
        assert_eq!(doc.name_of(Lookup::Company, "EMP001"), Some("Matriz Lucas do Rio Verde"));
        assert_eq!(doc.name_of(Lookup::Risk, "RSK004"), Some("IT network failure"));
        assert_eq!(doc.name_of(Lookup::Staff, "COL999"), None);
    }

    #[test]
    fn test_missing_keys_default() {
        let doc: Document = serde_json::from_str(r#"{"companies": [{"id": "EMP001", "name": "A"}]}"#).unwrap();
        assert_eq!(doc.companies.len(), 1);
        assert!(doc.risks.is_empty());
        assert_eq!(doc.config.project_archive_minutes, 1);
    }

    #[test]
    fn test_merge_missing_skips_existing_ids() {
        let mut doc = Document::demo();
        let added = doc.merge_missing(Document::demo_extras());
        assert_eq!(added, 10);
        assert_eq!(doc.merge_missing(Document::demo_extras()), 0);
        assert_eq!(doc.companies.len(), 4);
    }

    #[test]
    fn test_json_backend_seeds_absent_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("db.json");
        let backend = JsonFileBackend::new(&path);

        let doc = backend.load().unwrap();
        assert_eq!(doc.risks.len(), 5);
        assert!(path.exists());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"stakeholderGroups\""));
        assert!(content.contains("\n  "), "document should be pretty-printed");
    }

    #[test]
    fn test_json_backend_without_seed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let backend = JsonFileBackend::without_seed(&path);

        assert_eq!(backend.load().unwrap(), Document::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_json_backend_reports_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
