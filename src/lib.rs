pub mod catalog;
pub mod config;
pub mod error;
pub mod pattern;
pub mod planner;
pub mod version;

pub use catalog::{DirectoryCatalog, DirectoryRole, FileRecord};
pub use config::{BackupConfig, DirectoryDescriptor, JobContext};
pub use error::Error;
pub use planner::{Action, ActionKind, ArchivePlanner};
pub use version::VersionSet;
