use chrono::{DateTime, Local, Timelike};
use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level job configuration: one primary archive directory, the source
/// directories archived into it, and the destination directories archives
/// are replicated to.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    pub primary_path: PathBuf,
    #[serde(default)]
    pub sources: Vec<DirectoryDescriptor>,
    #[serde(default)]
    pub destinations: Vec<DirectoryDescriptor>,
}

/// One configured source or destination directory. The primary directory is
/// a bare path and never carries a descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryDescriptor {
    pub path: PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Sort order among directories of the same role; lower runs first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Maximum number of versions kept per base name. Omitted = unlimited.
    #[serde(default = "default_retain_maximum_versions")]
    pub retain_maximum_versions: usize,
    /// Minimum age in days before a version may be deleted, overriding the
    /// count quota.
    #[serde(default)]
    pub retain_younger_than_days: i64,
    /// Volume is slow (e.g. network or USB); only processed when the job
    /// asks for slow volumes.
    #[serde(default)]
    pub slow_volume: bool,
    /// Only processed during test runs.
    #[serde(default)]
    pub test_only: bool,
    /// Optional processing time window, local hours.
    #[serde(default)]
    pub process_window: Option<ProcessWindow>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProcessWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ProcessWindow {
    /// Inclusive window check; a window that wraps midnight
    /// (start > end) covers the hours outside (end, start).
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..=self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour <= self.end_hour
        }
    }
}

/// Per-run flags the job driver passes down; descriptors decide for
/// themselves whether they take part in the run.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub include_slow_volumes: bool,
    pub test_run: bool,
    pub now: DateTime<Local>,
}

impl JobContext {
    pub fn new(include_slow_volumes: bool, test_run: bool) -> Self {
        Self {
            include_slow_volumes,
            test_run,
            now: Local::now(),
        }
    }
}

impl DirectoryDescriptor {
    /// Enabled and reachable right now. Removable volumes that are
    /// disconnected simply report unavailable; that is not an error.
    pub fn is_available(&self) -> bool {
        self.enabled && self.path.is_dir()
    }

    /// Whether this directory takes part in the given run: slow volumes
    /// only when asked for, test-only directories only during test runs,
    /// and the processing window (if any) must cover the job's clock.
    pub fn is_to_be_processed(&self, job: &JobContext) -> bool {
        self.enabled
            && (!self.slow_volume || job.include_slow_volumes)
            && (!self.test_only || job.test_run)
            && self
                .process_window
                .map_or(true, |w| w.contains(job.now.hour()))
    }
}

fn default_enabled() -> bool {
    true
}

fn default_retain_maximum_versions() -> usize {
    usize::MAX
}

pub fn load_configuration() -> Result<BackupConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<BackupConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn descriptor(path: &str) -> DirectoryDescriptor {
        DirectoryDescriptor {
            path: PathBuf::from(path),
            enabled: true,
            priority: 0,
            include: vec![],
            exclude: vec![],
            retain_maximum_versions: usize::MAX,
            retain_younger_than_days: 0,
            slow_volume: false,
            test_only: false,
            process_window: None,
        }
    }

    fn job_at_hour(hour: u32) -> JobContext {
        JobContext {
            include_slow_volumes: false,
            test_run: false,
            now: Local.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_disabled_descriptor_is_unavailable() {
        let mut d = descriptor("/");
        assert!(d.is_available());
        d.enabled = false;
        assert!(!d.is_available());
    }

    #[test]
    fn test_missing_path_is_unavailable() {
        let d = descriptor("/no/such/directory/backup-warden-test");
        assert!(!d.is_available());
    }

    #[test]
    fn test_slow_volume_gating() {
        let mut d = descriptor("/");
        d.slow_volume = true;
        let mut job = job_at_hour(12);
        assert!(!d.is_to_be_processed(&job));
        job.include_slow_volumes = true;
        assert!(d.is_to_be_processed(&job));
    }

    #[test]
    fn test_test_only_gating() {
        let mut d = descriptor("/");
        d.test_only = true;
        let mut job = job_at_hour(12);
        assert!(!d.is_to_be_processed(&job));
        job.test_run = true;
        assert!(d.is_to_be_processed(&job));

        // A test run widens the set: normal directories still qualify
        let normal = descriptor("/");
        assert!(normal.is_to_be_processed(&job));
    }

    #[test]
    fn test_process_window() {
        let mut d = descriptor("/");
        d.process_window = Some(ProcessWindow {
            start_hour: 22,
            end_hour: 4,
        });
        assert!(d.is_to_be_processed(&job_at_hour(23)));
        assert!(d.is_to_be_processed(&job_at_hour(2)));
        assert!(!d.is_to_be_processed(&job_at_hour(12)));

        d.process_window = Some(ProcessWindow {
            start_hour: 9,
            end_hour: 17,
        });
        assert!(d.is_to_be_processed(&job_at_hour(9)));
        assert!(!d.is_to_be_processed(&job_at_hour(18)));
    }
}
