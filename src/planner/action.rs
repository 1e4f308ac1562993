use std::fmt;
use std::path::Path;

use crate::catalog::{DirectoryCatalog, FileRecord};

/// Execution order of the final plan: all compressions, then all copies,
/// then all deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionKind {
    Compress,
    Copy,
    Delete,
}

/// One planned unit of work, handed to an external executor. Each variant
/// carries exactly the operands its kind requires; a mismatched combination
/// is unrepresentable. Actions borrow from the planner's catalogs and never
/// copy or mutate the underlying records.
#[derive(Debug)]
pub enum Action<'a> {
    /// Compress a source directory into a new archive in the primary
    /// directory.
    Compress {
        source: &'a DirectoryCatalog,
        primary_path: &'a Path,
    },
    /// Copy a primary file to a destination directory.
    Copy {
        file: &'a FileRecord,
        destination: &'a DirectoryCatalog,
    },
    /// Delete a stale version from the directory it was cataloged in.
    Delete { file: &'a FileRecord },
}

impl Action<'_> {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Compress { .. } => ActionKind::Compress,
            Action::Copy { .. } => ActionKind::Copy,
            Action::Delete { .. } => ActionKind::Delete,
        }
    }

    /// One-line human-readable summary for logging.
    pub fn description(&self) -> String {
        match self {
            Action::Compress {
                source,
                primary_path,
            } => format!(
                "Compress {} into {}",
                source.path().display(),
                primary_path.display()
            ),
            Action::Copy { file, destination } => format!(
                "Copy {} to {}",
                file.path.display(),
                destination.path().display()
            ),
            Action::Delete { file } => format!("Delete {}", file.path.display()),
        }
    }
}

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
