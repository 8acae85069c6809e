//! Entity store - all reads and writes go through here
//!
//! Each operation runs one cycle: lock, load the whole document, mutate,
//! save the whole document, unlock. The lock serializes writers within the
//! process; separate processes still race on the file (last writer wins).

use chrono::{DateTime, Duration, Utc};
use miette::Diagnostic;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use crate::core::changes::{narrate, PROJECT_FIELDS, RISK_FIELDS};
use crate::core::document::{Document, DocumentBackend, JsonFileBackend, MemoryBackend, Stored};
use crate::core::entity::{Audited, Record};
use crate::core::identity::generate_id;
use crate::entities::history::SYSTEM_AUTHOR;
use crate::entities::{
    Category, Company, ExternalStakeholder, ExternalStakeholderPatch, HistoryEntry, Occurrence,
    Project, ProjectPatch, Risk, RiskCategory, RiskPatch, RiskStatus, Settings, SettingsPatch,
    Stage, Staff, StaffPatch, StakeholderGroup,
};

/// Errors raised by the store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("Failed to access {}", path.display())]
    #[diagnostic(code(riskreg::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", path.display())]
    #[diagnostic(
        code(riskreg::store::parse),
        help("fix the JSON by hand or restore the file from a backup")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize document: {0}")]
    #[diagnostic(code(riskreg::store::serialize))]
    Serialize(#[source] serde_json::Error),

    #[error("'{id}' already exists in {collection}")]
    #[diagnostic(code(riskreg::store::duplicate_id))]
    DuplicateId { collection: &'static str, id: String },

    #[error("Store lock poisoned by a panicked writer")]
    #[diagnostic(code(riskreg::store::poisoned))]
    Poisoned,
}

/// Aggregate counts shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub open_risk_count: usize,
    pub execution_project_count: usize,
    pub company_count: usize,
    pub staff_count: usize,
}

/// The entity store
pub struct Store {
    backend: Box<dyn DocumentBackend>,
    lock: Mutex<()>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.describe())
            .finish()
    }
}

impl Store {
    pub fn new(backend: impl DocumentBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            lock: Mutex::new(()),
        }
    }

    /// Store backed by a JSON file, seeded with demo data when absent
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }

    pub fn in_memory(doc: Document) -> Self {
        Self::new(MemoryBackend::new(doc))
    }

    fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let doc = self.backend.load()?;
        Ok(f(&doc))
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut doc = self.backend.load()?;
        let result = f(&mut doc)?;
        self.backend.save(&doc)?;
        Ok(result)
    }

    fn list<T: Stored>(&self) -> Result<Vec<T>, StoreError> {
        self.read(|doc| T::collection(doc).clone())
    }

    fn get<T: Stored>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.read(|doc| doc.find::<T>(id).cloned())
    }

    fn insert<T: Stored>(&self, record: T) -> Result<T, StoreError> {
        self.write(|doc| insert_into(doc, record))
    }

    fn insert_audited<T: Stored + Audited>(&self, mut record: T) -> Result<T, StoreError> {
        record.history_mut().push(HistoryEntry::system(T::CREATED_EVENT));
        self.insert(record)
    }

    fn remove<T: Stored>(&self, id: &str) -> Result<bool, StoreError> {
        self.write(|doc| {
            let records = T::collection_mut(doc);
            let before = records.len();
            records.retain(|r| r.id() != id);
            let removed = records.len() != before;
            if removed {
                tracing::info!(collection = T::COLLECTION, id, "deleted record");
            }
            Ok(removed)
        })
    }

    fn modify<T: Stored>(
        &self,
        id: &str,
        f: impl FnOnce(&mut T),
    ) -> Result<Option<T>, StoreError> {
        self.write(|doc| {
            Ok(doc.find_mut::<T>(id).map(|record| {
                f(record);
                record.clone()
            }))
        })
    }

    /// The whole document, for rendering names alongside records
    pub fn document(&self) -> Result<Document, StoreError> {
        self.read(Document::clone)
    }

    // ----- companies -----

    pub fn companies(&self) -> Result<Vec<Company>, StoreError> {
        self.list()
    }

    pub fn company(&self, id: &str) -> Result<Option<Company>, StoreError> {
        self.get(id)
    }

    pub fn add_company(&self, company: Company) -> Result<Company, StoreError> {
        self.insert(company)
    }

    pub fn delete_company(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<Company>(id)
    }

    // ----- staff -----

    pub fn staff(&self) -> Result<Vec<Staff>, StoreError> {
        self.list()
    }

    pub fn staff_member(&self, id: &str) -> Result<Option<Staff>, StoreError> {
        self.get(id)
    }

    pub fn add_staff(&self, staff: Staff) -> Result<Staff, StoreError> {
        self.insert(staff)
    }

    pub fn update_staff(&self, id: &str, patch: StaffPatch) -> Result<Option<Staff>, StoreError> {
        self.modify(id, |staff: &mut Staff| patch.apply(staff))
    }

    pub fn delete_staff(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<Staff>(id)
    }

    // ----- stakeholder groups -----

    pub fn stakeholder_groups(&self) -> Result<Vec<StakeholderGroup>, StoreError> {
        self.list()
    }

    pub fn stakeholder_group(&self, id: &str) -> Result<Option<StakeholderGroup>, StoreError> {
        self.get(id)
    }

    pub fn add_stakeholder_group(
        &self,
        mut group: StakeholderGroup,
    ) -> Result<StakeholderGroup, StoreError> {
        group.normalize();
        self.insert(group)
    }

    /// Union new members into the group's sets, keeping first-insertion order.
    ///
    /// Closed groups are not checked here.
    pub fn add_group_members(
        &self,
        id: &str,
        staff_ids: &[String],
        external_ids: &[String],
    ) -> Result<Option<StakeholderGroup>, StoreError> {
        self.modify(id, |group: &mut StakeholderGroup| {
            group.add_members(staff_ids, external_ids);
        })
    }

    pub fn close_group(&self, id: &str) -> Result<Option<StakeholderGroup>, StoreError> {
        self.modify(id, |group: &mut StakeholderGroup| group.closed = true)
    }

    pub fn open_group(&self, id: &str) -> Result<Option<StakeholderGroup>, StoreError> {
        self.modify(id, |group: &mut StakeholderGroup| group.closed = false)
    }

    pub fn delete_stakeholder_group(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<StakeholderGroup>(id)
    }

    // ----- external stakeholders -----

    pub fn external_stakeholders(&self) -> Result<Vec<ExternalStakeholder>, StoreError> {
        self.list()
    }

    pub fn external_stakeholder(
        &self,
        id: &str,
    ) -> Result<Option<ExternalStakeholder>, StoreError> {
        self.get(id)
    }

    pub fn add_external_stakeholder(
        &self,
        stakeholder: ExternalStakeholder,
    ) -> Result<ExternalStakeholder, StoreError> {
        self.insert(stakeholder)
    }

    pub fn update_external_stakeholder(
        &self,
        id: &str,
        patch: ExternalStakeholderPatch,
    ) -> Result<Option<ExternalStakeholder>, StoreError> {
        self.modify(id, |person: &mut ExternalStakeholder| patch.apply(person))
    }

    pub fn delete_external_stakeholder(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<ExternalStakeholder>(id)
    }

    // ----- categories -----

    pub fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.list()
    }

    pub fn add_category(&self, category: Category) -> Result<Category, StoreError> {
        self.insert(category)
    }

    pub fn delete_category(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<Category>(id)
    }

    pub fn risk_categories(&self) -> Result<Vec<RiskCategory>, StoreError> {
        self.list()
    }

    pub fn add_risk_category(&self, category: RiskCategory) -> Result<RiskCategory, StoreError> {
        self.insert(category)
    }

    pub fn delete_risk_category(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<RiskCategory>(id)
    }

    // ----- risks -----

    pub fn risks(&self) -> Result<Vec<Risk>, StoreError> {
        self.list()
    }

    pub fn risk(&self, id: &str) -> Result<Option<Risk>, StoreError> {
        self.get(id)
    }

    /// Store a new risk; a "Risk created" entry is appended after any
    /// history the caller supplied
    pub fn add_risk(&self, risk: Risk) -> Result<Risk, StoreError> {
        self.insert_audited(risk)
    }

    /// Merge the patch and record one history entry describing the change
    pub fn update_risk(&self, id: &str, patch: RiskPatch) -> Result<Option<Risk>, StoreError> {
        self.write(|doc| {
            let Some(previous) = doc.find::<Risk>(id).cloned() else {
                return Ok(None);
            };
            let mut next = previous.clone();
            patch.apply(&mut next);

            if let Some(event) = narrate(RISK_FIELDS, &previous, &next, &*doc) {
                tracing::debug!(id, event = %event, "risk changed");
                next.history.push(HistoryEntry::system(event));
            }

            if let Some(slot) = doc.find_mut::<Risk>(id) {
                *slot = next.clone();
            }
            Ok(Some(next))
        })
    }

    /// Append an occurrence report to a risk's history
    pub fn record_occurrence(
        &self,
        risk_id: &str,
        occurrence: Occurrence,
    ) -> Result<Option<Risk>, StoreError> {
        self.write(|doc| {
            let event = occurrence.describe(&*doc);
            let author = occurrence
                .author(&*doc)
                .unwrap_or_else(|| SYSTEM_AUTHOR.to_string());

            Ok(doc.find_mut::<Risk>(risk_id).map(|risk| {
                risk.history.push(HistoryEntry::new(event, author));
                risk.clone()
            }))
        })
    }

    pub fn delete_risk(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<Risk>(id)
    }

    /// Create a backlog project remediating the given risk.
    ///
    /// Both records are written in the same save.
    pub fn generate_project_from_risk(&self, risk_id: &str) -> Result<Option<Project>, StoreError> {
        self.write(|doc| {
            let Some(risk) = doc.find::<Risk>(risk_id) else {
                return Ok(None);
            };

            let mut project = Project::new(risk.title.clone());
            project.id = generate_id(Project::PREFIX, doc.projects.iter().map(|p| p.id.as_str()));
            project.risk_id = Some(risk.id.clone());
            project.stage = Stage::Backlog;
            project.scope.objective = Some(risk.description.clone());
            project
                .history
                .push(HistoryEntry::system(format!("Generated from risk {}", risk_id)));

            if let Some(risk) = doc.find_mut::<Risk>(risk_id) {
                risk.history
                    .push(HistoryEntry::system(format!("Project {} generated", project.id)));
            }
            doc.projects.push(project.clone());

            tracing::info!(risk_id, project_id = %project.id, "generated project from risk");
            Ok(Some(project))
        })
    }

    // ----- projects -----

    /// Projects that have not been soft-deleted
    pub fn projects(&self) -> Result<Vec<Project>, StoreError> {
        self.read(|doc| doc.projects.iter().filter(|p| !p.deleted).cloned().collect())
    }

    /// Every project, soft-deleted ones included
    pub fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.list()
    }

    pub fn project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.get(id)
    }

    pub fn add_project(&self, mut project: Project) -> Result<Project, StoreError> {
        if project.stage == Stage::Done && project.closed_at.is_none() {
            project.closed_at = Some(Utc::now());
        }
        self.insert_audited(project)
    }

    /// Merge the patch and record one history entry describing the change.
    ///
    /// Entering `done` stamps `closedAt`; leaving it clears the stamp.
    pub fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, StoreError> {
        self.write(|doc| {
            let Some(previous) = doc.find::<Project>(id).cloned() else {
                return Ok(None);
            };
            let mut next = previous.clone();
            patch.apply(&mut next);

            match (previous.stage == Stage::Done, next.stage == Stage::Done) {
                (false, true) => next.closed_at = Some(Utc::now()),
                (true, false) => next.closed_at = None,
                _ => {}
            }

            if let Some(event) = narrate(PROJECT_FIELDS, &previous, &next, &*doc) {
                tracing::debug!(id, event = %event, "project changed");
                next.history.push(HistoryEntry::system(event));
            }

            if let Some(slot) = doc.find_mut::<Project>(id) {
                *slot = next.clone();
            }
            Ok(Some(next))
        })
    }

    /// Soft delete: the project is flagged and hidden from [`Store::projects`]
    pub fn delete_project(&self, id: &str) -> Result<bool, StoreError> {
        self.write(|doc| {
            Ok(match doc.find_mut::<Project>(id) {
                Some(project) if !project.deleted => {
                    project.deleted = true;
                    tracing::info!(id, "soft-deleted project");
                    true
                }
                _ => false,
            })
        })
    }

    /// Remove the project record entirely
    pub fn purge_project(&self, id: &str) -> Result<bool, StoreError> {
        self.remove::<Project>(id)
    }

    /// Archive done projects closed at least `projectArchiveMinutes` before `now`.
    ///
    /// Returns the projects archived by this sweep.
    pub fn archive_sweep(&self, now: DateTime<Utc>) -> Result<Vec<Project>, StoreError> {
        self.write(|doc| {
            let threshold = Duration::minutes(i64::from(doc.config.project_archive_minutes));
            let mut archived = Vec::new();

            for project in doc.projects.iter_mut() {
                if project.deleted || project.archived {
                    continue;
                }
                let due = project
                    .closure_time()
                    .is_some_and(|closed| now.signed_duration_since(closed) >= threshold);
                if !due {
                    continue;
                }
                project.archived = true;
                project.history.push(HistoryEntry::system("Project archived"));
                archived.push(project.clone());
            }

            if !archived.is_empty() {
                tracing::info!(count = archived.len(), "archived closed projects");
            }
            Ok(archived)
        })
    }

    // ----- settings -----

    pub fn settings(&self) -> Result<Settings, StoreError> {
        self.read(|doc| doc.config.clone())
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        self.write(|doc| {
            patch.apply(&mut doc.config);
            Ok(doc.config.clone())
        })
    }

    // ----- reports -----

    pub fn dashboard(&self) -> Result<Dashboard, StoreError> {
        self.read(|doc| Dashboard {
            open_risk_count: doc
                .risks
                .iter()
                .filter(|r| r.status == RiskStatus::Open)
                .count(),
            execution_project_count: doc
                .projects
                .iter()
                .filter(|p| !p.deleted && p.stage == Stage::Execution)
                .count(),
            company_count: doc.companies.len(),
            staff_count: doc.staff.len(),
        })
    }

    /// Merge the extended demo dataset, skipping ids already present.
    ///
    /// Returns how many records were added.
    pub fn add_demo_data(&self) -> Result<usize, StoreError> {
        self.write(|doc| Ok(doc.merge_missing(Document::demo_extras())))
    }
}

fn insert_into<T: Stored>(doc: &mut Document, mut record: T) -> Result<T, StoreError> {
    let records = T::collection_mut(doc);
    if record.id().is_empty() {
        let id = generate_id(T::PREFIX, records.iter().map(|r| r.id()));
        record.set_id(id);
    } else if records.iter().any(|r| r.id() == record.id()) {
        return Err(StoreError::DuplicateId {
            collection: T::COLLECTION,
            id: record.id().to_string(),
        });
    }

    tracing::info!(collection = T::COLLECTION, id = record.id(), "added record");
    records.push(record.clone());
    Ok(record)
}
