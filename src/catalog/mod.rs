mod file_record;

pub use file_record::{DirectoryRole, FileRecord};

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::config::DirectoryDescriptor;
use crate::error::Error;
use crate::pattern::{self, FilePattern};
use crate::version::VersionSet;

/// Two timestamps within this many seconds count as the same write; absorbs
/// filesystem timestamp-resolution differences across volumes.
pub const STALENESS_TOLERANCE_SECS: i64 = 2;

/// Writer temp suffixes used by the compression/copy executors to mark
/// in-progress output. Never valid archive content.
const IN_PROGRESS_SUFFIXES: [&str; 2] = [".compressing", ".copying"];

/// Point-in-time, filtered inventory of one directory's top-level files,
/// plus (for Primary and Destination roles) the per-base-name version
/// index. Catalogs are rebuilt from scratch between planning stages, never
/// mutated in place.
#[derive(Debug)]
pub struct DirectoryCatalog {
    role: DirectoryRole,
    path: PathBuf,
    enabled: bool,
    available: bool,
    priority: i32,
    includes: Vec<FilePattern>,
    excludes: Vec<FilePattern>,
    retain_maximum_versions: usize,
    retain_younger_than_days: i64,
    descriptor: Option<DirectoryDescriptor>,
    files: Vec<FileRecord>,
    versions: BTreeMap<String, VersionSet>,
}

impl DirectoryCatalog {
    /// Catalog the primary archive directory. The primary is the source of
    /// truth and is assumed always present; a missing path is fatal. It
    /// carries no include/exclude filters and no retention settings.
    pub fn primary(path: &Path) -> Result<Self, Error> {
        if !path.is_dir() {
            return Err(Error::MissingPrimaryDirectory(path.to_path_buf()));
        }
        let mut catalog = Self {
            role: DirectoryRole::Primary,
            path: path.to_path_buf(),
            enabled: true,
            available: true,
            priority: 0,
            includes: Vec::new(),
            excludes: Vec::new(),
            retain_maximum_versions: usize::MAX,
            retain_younger_than_days: 0,
            descriptor: None,
            files: Vec::new(),
            versions: BTreeMap::new(),
        };
        catalog.scan()?;
        Ok(catalog)
    }

    /// Catalog a configured source directory. Source directories are never
    /// inventoried for versioned content.
    pub fn source(descriptor: &DirectoryDescriptor) -> Result<Self, Error> {
        Self::from_descriptor(DirectoryRole::Source, descriptor)
    }

    /// Catalog a configured destination directory.
    pub fn destination(descriptor: &DirectoryDescriptor) -> Result<Self, Error> {
        Self::from_descriptor(DirectoryRole::Destination, descriptor)
    }

    fn from_descriptor(
        role: DirectoryRole,
        descriptor: &DirectoryDescriptor,
    ) -> Result<Self, Error> {
        let mut catalog = Self {
            role,
            path: descriptor.path.clone(),
            enabled: descriptor.enabled,
            available: descriptor.is_available(),
            priority: descriptor.priority,
            includes: pattern::compile_patterns(&descriptor.include)?,
            excludes: pattern::compile_patterns(&descriptor.exclude)?,
            retain_maximum_versions: descriptor.retain_maximum_versions,
            retain_younger_than_days: descriptor.retain_younger_than_days,
            descriptor: Some(descriptor.clone()),
            files: Vec::new(),
            versions: BTreeMap::new(),
        };
        if catalog.is_enabled_and_available() {
            catalog.scan()?;
        } else {
            // Disconnected removable volume or disabled entry: empty
            // catalog, planning proceeds without it.
            debug!(
                "Skipping scan of {} ({}): disabled or unavailable",
                catalog.path.display(),
                role_label(role),
            );
        }
        Ok(catalog)
    }

    /// Build a catalog from a pre-built inventory instead of a filesystem
    /// scan. Records are re-filtered exactly as a scan would filter them.
    pub fn from_records(
        role: DirectoryRole,
        path: &Path,
        records: Vec<FileRecord>,
    ) -> Result<Self, Error> {
        let mut catalog = Self {
            role,
            path: path.to_path_buf(),
            enabled: true,
            available: true,
            priority: 0,
            includes: Vec::new(),
            excludes: Vec::new(),
            retain_maximum_versions: usize::MAX,
            retain_younger_than_days: 0,
            descriptor: None,
            files: Vec::new(),
            versions: BTreeMap::new(),
        };
        catalog.adopt(records)?;
        Ok(catalog)
    }

    /// As [`from_records`](Self::from_records), with the descriptor's
    /// filters, retention settings, and priority applied.
    pub fn from_descriptor_records(
        role: DirectoryRole,
        descriptor: &DirectoryDescriptor,
        records: Vec<FileRecord>,
    ) -> Result<Self, Error> {
        let mut catalog = Self {
            role,
            path: descriptor.path.clone(),
            enabled: descriptor.enabled,
            available: true,
            priority: descriptor.priority,
            includes: pattern::compile_patterns(&descriptor.include)?,
            excludes: pattern::compile_patterns(&descriptor.exclude)?,
            retain_maximum_versions: descriptor.retain_maximum_versions,
            retain_younger_than_days: descriptor.retain_younger_than_days,
            descriptor: Some(descriptor.clone()),
            files: Vec::new(),
            versions: BTreeMap::new(),
        };
        catalog.adopt(records)?;
        Ok(catalog)
    }

    /// Enumerate top-level files only. Nested content is never inventoried,
    /// regardless of role.
    fn scan(&mut self) -> Result<(), Error> {
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    error!("Error getting metadata for {}: {}", path.display(), err);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(t) => DateTime::<Local>::from(t),
                Err(err) => {
                    error!(
                        "Error reading modification time for {}: {}",
                        path.display(),
                        err
                    );
                    continue;
                }
            };
            let created = metadata.created().ok().map(DateTime::<Local>::from);

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let ignored = !self.selects(&file_name) || is_in_progress(&file_name);

            records.push(FileRecord::new(
                path,
                metadata.len(),
                modified,
                created,
                ignored,
                self.priority,
            ));
        }

        self.adopt(records)
    }

    fn adopt(&mut self, mut records: Vec<FileRecord>) -> Result<(), Error> {
        for record in &mut records {
            record.ignored = !self.selects(&record.file_name) || is_in_progress(&record.file_name);
            record.latest_version = false;
            record.source_priority = self.priority;
        }
        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        self.files = records;
        self.build_version_index()?;
        debug!(
            "Cataloged {} ({}): {} files, {} ignored, {} version sets",
            self.path.display(),
            role_label(self.role),
            self.files.iter().filter(|r| !r.ignored).count(),
            self.files.iter().filter(|r| r.ignored).count(),
            self.versions.len(),
        );
        Ok(())
    }

    /// Index every non-ignored versioned record by base name (Primary and
    /// Destination only), then flag the records holding each base name's
    /// latest version. Matching is by name suffix, so duplicate-latest
    /// anomalies stay representable; they are surfaced, not resolved.
    fn build_version_index(&mut self) -> Result<(), Error> {
        if self.role == DirectoryRole::Source {
            return Ok(());
        }

        for record in self.files.iter().filter(|r| !r.ignored && r.is_versioned()) {
            if let Some(base) = &record.base_name {
                self.versions
                    .entry(base.clone())
                    .or_insert_with(|| VersionSet::new(base))
                    .insert(&record.file_name);
            }
        }

        for set in self.versions.values() {
            let latest = match set.latest_file_name() {
                Some(name) => name,
                None => continue,
            };

            let matches: Vec<usize> = self
                .files
                .iter()
                .enumerate()
                .filter(|(_, r)| r.file_name.ends_with(latest))
                .map(|(idx, _)| idx)
                .collect();

            // The record that fed the index must still be findable; if not,
            // the scan and the index disagree and that is a bug, not data.
            if matches.is_empty() {
                return Err(Error::VersionIndexInconsistency {
                    directory: self.path.clone(),
                    file_name: latest.to_string(),
                });
            }
            if matches.len() > 1 {
                warn!(
                    "Duplicate latest-version anomaly in {}: {} records end with '{}' (base '{}')",
                    self.path.display(),
                    matches.len(),
                    latest,
                    set.base_name(),
                );
            }
            for idx in matches {
                self.files[idx].latest_version = true;
            }
        }
        Ok(())
    }

    pub fn role(&self) -> DirectoryRole {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_enabled_and_available(&self) -> bool {
        self.enabled && self.available
    }

    pub fn descriptor(&self) -> Option<&DirectoryDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn retain_maximum_versions(&self) -> usize {
        self.retain_maximum_versions
    }

    pub fn retain_younger_than_days(&self) -> i64 {
        self.retain_younger_than_days
    }

    /// Non-ignored records, ascending by file name.
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(|r| !r.ignored)
    }

    pub fn ignored_files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(|r| r.ignored)
    }

    pub fn versioned_files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files().filter(|r| r.is_versioned())
    }

    pub fn unversioned_files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files().filter(|r| !r.is_versioned())
    }

    pub fn version_sets(&self) -> impl Iterator<Item = &VersionSet> {
        self.versions.values()
    }

    pub fn version_set(&self, base_name: &str) -> Option<&VersionSet> {
        self.versions.get(base_name)
    }

    /// Latest version number held here for a base name, 0 when none.
    pub fn latest_version_number(&self, base_name: &str) -> u32 {
        self.version_set(base_name)
            .map(VersionSet::latest_version_number)
            .unwrap_or(0)
    }

    /// Exact-name lookup among non-ignored records.
    pub fn record(&self, file_name: &str) -> Option<&FileRecord> {
        self.files().find(|r| r.file_name == file_name)
    }

    /// True iff a record with that exact name exists and its last-write
    /// time is within the staleness tolerance of `reference`.
    pub fn has_up_to_date_copy(&self, file_name: &str, reference: DateTime<Local>) -> bool {
        self.record(file_name)
            .map(|r| (r.modified - reference).num_seconds().abs() < STALENESS_TOLERANCE_SECS)
            .unwrap_or(false)
    }

    pub fn is_absent(&self, file_name: &str) -> bool {
        self.record(file_name).is_none()
    }

    pub fn is_absent_or_stale(&self, file_name: &str, reference: DateTime<Local>) -> bool {
        !self.has_up_to_date_copy(file_name, reference)
    }

    /// Would this catalog accept a foreign record if it were copied here?
    /// Re-applies the include/exclude matchers to the record's name.
    pub fn wants_file(&self, record: &FileRecord) -> bool {
        self.selects(&record.file_name)
    }

    fn selects(&self, file_name: &str) -> bool {
        pattern::selects(file_name, &self.includes, &self.excludes)
    }
}

fn is_in_progress(file_name: &str) -> bool {
    let lowered = file_name.to_ascii_lowercase();
    IN_PROGRESS_SUFFIXES
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
}

fn role_label(role: DirectoryRole) -> &'static str {
    match role {
        DirectoryRole::Primary => "primary",
        DirectoryRole::Source => "source",
        DirectoryRole::Destination => "destination",
    }
}
