//! Core module - storage, identity and change tracking

pub mod changes;
pub mod config;
pub mod document;
pub mod entity;
pub mod identity;
pub mod store;
pub mod workspace;

pub use changes::{narrate, Lookup, NameLookup, NoLookup};
pub use config::Config;
pub use document::{Document, DocumentBackend, JsonFileBackend, MemoryBackend};
pub use entity::{Audited, Rating, Record};
pub use identity::{EntityPrefix, IdParseError};
pub use store::{Dashboard, Store, StoreError};
pub use workspace::{Workspace, WorkspaceError};
