use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::version;

/// Which behaviors a catalog applies: the primary archive directory, a
/// user source directory, or a replication destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    Primary,
    Source,
    Destination,
}

/// Point-in-time snapshot of one discovered file. Built once during a
/// catalog scan and never modified afterwards; the `latest_version` flag is
/// derived from the catalog's version index before the catalog is handed
/// out.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    pub len: u64,
    pub modified: DateTime<Local>,
    pub created: Option<DateTime<Local>>,
    /// Filtered out by include/exclude patterns, or an in-progress writer
    /// temp file. Ignored records never enter the version index.
    pub ignored: bool,
    /// Present iff the name follows the versioned naming scheme.
    pub base_name: Option<String>,
    /// Present iff versioned; always in 1..=9999.
    pub version_number: Option<u32>,
    /// This record holds the highest version of its base name within its
    /// catalog.
    pub latest_version: bool,
    /// Priority inherited from the owning directory descriptor.
    pub source_priority: i32,
}

impl FileRecord {
    pub fn new(
        path: PathBuf,
        len: u64,
        modified: DateTime<Local>,
        created: Option<DateTime<Local>>,
        ignored: bool,
        source_priority: i32,
    ) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (base_name, version_number) = if version::is_versioned(&file_name) {
            (
                Some(version::base_name(&file_name).to_string()),
                Some(version::version_number(&file_name) as u32),
            )
        } else {
            (None, None)
        };

        Self {
            path,
            file_name,
            len,
            modified,
            created,
            ignored,
            base_name,
            version_number,
            latest_version: false,
            source_priority,
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.version_number.is_some()
    }

    /// Whole days elapsed since the last write, measured against the job's
    /// clock.
    pub fn age_days(&self, now: DateTime<Local>) -> i64 {
        (now - self.modified).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_versioning_metadata_derived_from_name() {
        let rec = FileRecord::new(
            PathBuf::from("/primary/Docs-0003.zip"),
            100,
            Local::now(),
            None,
            false,
            0,
        );
        assert!(rec.is_versioned());
        assert_eq!(rec.base_name.as_deref(), Some("Docs"));
        assert_eq!(rec.version_number, Some(3));
        assert!(!rec.latest_version);

        let rec = FileRecord::new(
            PathBuf::from("/primary/Notes.zip"),
            100,
            Local::now(),
            None,
            false,
            0,
        );
        assert!(!rec.is_versioned());
        assert!(rec.base_name.is_none());
        assert!(rec.version_number.is_none());
    }

    #[test]
    fn test_age_days() {
        let now = Local::now();
        let rec = FileRecord::new(
            PathBuf::from("/d/Docs-0001.zip"),
            1,
            now - Duration::days(40),
            None,
            false,
            0,
        );
        assert_eq!(rec.age_days(now), 40);
        assert!(rec.age_days(now) > 30);
    }
}
