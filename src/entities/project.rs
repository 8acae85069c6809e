//! Project entity - a remediation effort moving through a fixed workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Audited, Record};
use crate::core::identity::EntityPrefix;
use crate::entities::history::HistoryEntry;
use crate::entities::risk::non_empty;

/// Workflow stage: backlog → planning → execution → done
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Stage {
    #[default]
    Backlog,
    Planning,
    Execution,
    Done,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Backlog => "Backlog",
            Stage::Planning => "Planning",
            Stage::Execution => "Execution",
            Stage::Done => "Done",
        }
    }

    /// The following stage in the workflow, if any
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Backlog => Some(Stage::Planning),
            Stage::Planning => Some(Stage::Execution),
            Stage::Execution => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backlog" => Ok(Stage::Backlog),
            "planning" => Ok(Stage::Planning),
            "execution" => Ok(Stage::Execution),
            "done" => Ok(Stage::Done),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Project scope, replaced wholesale on update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<String>,
}

/// A named step of the execution checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStage {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
}

impl ExecutionStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Percentage of completed tasks, 0 when there are none
    pub fn progress(&self) -> u8 {
        if self.tasks.is_empty() {
            return 0;
        }
        let done = self.tasks.iter().filter(|t| t.completed).count();
        ((done * 100) / self.tasks.len()) as u8
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A remediation project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,

    pub title: String,

    /// Risk this project remediates (not enforced)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_id: Option<String>,

    #[serde(default)]
    pub stage: Stage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default)]
    pub scope: Scope,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub archived: bool,

    /// Soft-delete marker; deleted projects are hidden from default listings
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,

    /// Whether a project charter (TAP) document has been attached
    #[serde(default, skip_serializing_if = "is_false")]
    pub tap_attached: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<ExecutionStage>,

    /// When the project last entered `done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            risk_id: None,
            stage: Stage::Backlog,
            deadline: None,
            owner_id: None,
            scope: Scope::default(),
            history: Vec::new(),
            archived: false,
            deleted: false,
            tap_attached: false,
            stages: Vec::new(),
            closed_at: None,
        }
    }

    /// Moment the project was closed, for archiving.
    ///
    /// Records written before `closedAt` existed fall back to their most
    /// recent history entry.
    pub fn closure_time(&self) -> Option<DateTime<Utc>> {
        if self.stage != Stage::Done {
            return None;
        }
        self.closed_at
            .or_else(|| self.history.last().map(|h| h.timestamp))
    }

    /// Overall checklist progress across all execution stages
    pub fn progress(&self) -> u8 {
        let tasks: Vec<&Task> = self.stages.iter().flat_map(|s| s.tasks.iter()).collect();
        if tasks.is_empty() {
            return 0;
        }
        let done = tasks.iter().filter(|t| t.completed).count();
        ((done * 100) / tasks.len()) as u8
    }
}

impl Record for Project {
    const PREFIX: EntityPrefix = EntityPrefix::Prj;
    const COLLECTION: &'static str = "projects";

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

impl Audited for Project {
    const CREATED_EVENT: &'static str = "Project created";

    fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Vec<HistoryEntry> {
        &mut self.history
    }
}

/// Partial update for a project.
///
/// `scope` and `stages` replace the stored values wholesale. For the optional
/// references, an empty string clears the field; `clear_deadline` removes the
/// deadline and takes precedence over `deadline`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub clear_deadline: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_attached: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<ExecutionStage>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProjectPatch::default()
    }

    pub fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(risk_id) = self.risk_id {
            project.risk_id = non_empty(risk_id);
        }
        if let Some(stage) = self.stage {
            project.stage = stage;
        }
        if self.clear_deadline {
            project.deadline = None;
        } else if self.deadline.is_some() {
            project.deadline = self.deadline;
        }
        if let Some(owner_id) = self.owner_id {
            project.owner_id = non_empty(owner_id);
        }
        if let Some(scope) = self.scope {
            project.scope = scope;
        }
        if let Some(archived) = self.archived {
            project.archived = archived;
        }
        if let Some(tap_attached) = self.tap_attached {
            project.tap_attached = tap_attached;
        }
        if let Some(stages) = self.stages {
            project.stages = stages;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_workflow_order() {
        assert_eq!(Stage::Backlog.next(), Some(Stage::Planning));
        assert_eq!(Stage::Planning.next(), Some(Stage::Execution));
        assert_eq!(Stage::Execution.next(), Some(Stage::Done));
        assert_eq!(Stage::Done.next(), None);
        assert!(Stage::Backlog < Stage::Done);
    }

    #[test]
    fn test_flags_omitted_when_false() {
        let project = Project::new("Contingency plan");
        let json = serde_json::to_value(&project).unwrap();
        assert!(json.get("archived").is_none());
        assert!(json.get("deleted").is_none());
        assert!(json.get("tapAttached").is_none());
        assert!(json.get("stages").is_none());
        assert_eq!(json["stage"], "backlog");
    }

    #[test]
    fn test_scope_replaced_wholesale() {
        let mut project = Project::new("p");
        project.scope = Scope {
            objective: Some("a".to_string()),
            deliverables: Some("b".to_string()),
            resources: None,
        };

        ProjectPatch {
            scope: Some(Scope {
                objective: Some("c".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
        .apply(&mut project);

        assert_eq!(project.scope.objective.as_deref(), Some("c"));
        assert_eq!(project.scope.deliverables, None);
    }

    #[test]
    fn test_deadline_can_be_cleared() {
        let mut project = Project::new("p");
        project.deadline = Some(Utc::now());

        let patch: ProjectPatch = serde_json::from_str(r#"{"clearDeadline": true}"#).unwrap();
        assert!(!patch.is_empty());
        patch.apply(&mut project);
        assert_eq!(project.deadline, None);

        ProjectPatch {
            deadline: Some(Utc::now()),
            ..Default::default()
        }
        .apply(&mut project);
        assert!(project.deadline.is_some());
    }

    #[test]
    fn test_progress() {
        let mut stage = ExecutionStage::new("Install");
        assert_eq!(stage.progress(), 0);
        stage.tasks.push(Task {
            title: "Buy".to_string(),
            completed: true,
            responsible: None,
        });
        stage.tasks.push(Task {
            title: "Mount".to_string(),
            completed: false,
            responsible: None,
        });
        assert_eq!(stage.progress(), 50);

        let mut project = Project::new("p");
        project.stages.push(stage);
        project.stages.push(ExecutionStage::new("Empty"));
        assert_eq!(project.progress(), 50);
    }

    #[test]
    fn test_closure_time_only_when_done() {
        let mut project = Project::new("p");
        project.history.push(HistoryEntry::system("Project created"));
        assert_eq!(project.closure_time(), None);

        project.stage = Stage::Done;
        assert_eq!(project.closure_time(), Some(project.history[0].timestamp));

        let closed = Utc::now();
        project.closed_at = Some(closed);
        assert_eq!(project.closure_time(), Some(closed));
    }
}
