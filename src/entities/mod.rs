//! Record type definitions
//!
//! The register keeps the following collections:
//!
//! **Organization:**
//! - [`Company`] - companies and branches
//! - [`Staff`] - internal people (analysts, owners, responsibles)
//! - [`StakeholderGroup`] / [`ExternalStakeholder`] - oversight groups
//!
//! **Taxonomies:**
//! - [`Category`] / [`RiskCategory`] - free-form classification
//!
//! **Tracking:**
//! - [`Risk`] - hazards with probability/impact and a status lifecycle
//! - [`Project`] - remediation efforts through backlog → done
//!
//! Both tracked types carry an append-only [`HistoryEntry`] log.

pub mod category;
pub mod company;
pub mod history;
pub mod occurrence;
pub mod project;
pub mod risk;
pub mod settings;
pub mod staff;
pub mod stakeholder;

pub use category::{Category, RiskCategory};
pub use company::Company;
pub use history::HistoryEntry;
pub use occurrence::{Investment, Occurrence};
pub use project::{Project, ProjectPatch, Scope, Stage};
pub use risk::{Risk, RiskLevel, RiskPatch, RiskStatus};
pub use settings::{Settings, SettingsPatch};
pub use staff::{Staff, StaffPatch};
pub use stakeholder::{ExternalStakeholder, ExternalStakeholderPatch, StakeholderGroup};
