mod action;

pub use action::{Action, ActionKind};

use tracing::{debug, info, warn};

use crate::catalog::DirectoryCatalog;
use crate::config::{BackupConfig, JobContext};
use crate::error::Error;

/// Computes the ordered action list that brings every destination into the
/// desired state. Stateless across invocations: each planner owns the
/// catalogs it was built from and re-derives everything from them; nothing
/// is carried over from a previous run. Rebuild the planner after the
/// executor has run a stage.
pub struct ArchivePlanner {
    primary: DirectoryCatalog,
    sources: Vec<DirectoryCatalog>,
    destinations: Vec<DirectoryCatalog>,
}

impl ArchivePlanner {
    /// Scan every configured directory and build a planner over the
    /// resulting catalogs. A missing primary directory is fatal; missing or
    /// disabled sources and destinations yield empty catalogs and degrade
    /// the plan instead of failing it.
    pub fn from_config(config: &BackupConfig) -> Result<Self, Error> {
        let primary = DirectoryCatalog::primary(&config.primary_path)?;
        let sources = config
            .sources
            .iter()
            .map(DirectoryCatalog::source)
            .collect::<Result<Vec<_>, _>>()?;
        let destinations = config
            .destinations
            .iter()
            .map(DirectoryCatalog::destination)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(primary, sources, destinations))
    }

    pub fn new(
        primary: DirectoryCatalog,
        mut sources: Vec<DirectoryCatalog>,
        mut destinations: Vec<DirectoryCatalog>,
    ) -> Self {
        // Lower priority runs first; stable, so config order breaks ties.
        sources.sort_by_key(DirectoryCatalog::priority);
        destinations.sort_by_key(DirectoryCatalog::priority);
        Self {
            primary,
            sources,
            destinations,
        }
    }

    pub fn primary(&self) -> &DirectoryCatalog {
        &self.primary
    }

    pub fn sources(&self) -> &[DirectoryCatalog] {
        &self.sources
    }

    pub fn destinations(&self) -> &[DirectoryCatalog] {
        &self.destinations
    }

    /// Source directories eligible for compression this run. The planner
    /// does not emit Compress actions yet; the compression pass lives in
    /// the executor, which consumes this list.
    pub fn compression_candidates(&self, job: &JobContext) -> Vec<&DirectoryCatalog> {
        self.sources
            .iter()
            .filter(|c| c.is_enabled_and_available())
            .filter(|c| c.descriptor().is_some_and(|d| d.is_to_be_processed(job)))
            .collect()
    }

    /// Compute the full ordered action list for the current catalog state.
    /// Output is grouped by kind in execution order: Compress, Copy,
    /// Delete; within a kind, construction order is preserved.
    pub fn plan(&self, job: &JobContext) -> Vec<Action<'_>> {
        let mut actions: Vec<Action<'_>> = Vec::new();

        let candidates = self.compression_candidates(job);
        debug!(
            "{} source directories eligible for compression",
            candidates.len()
        );

        self.plan_versioned_copies(&mut actions);
        self.plan_unversioned_copies(&mut actions);
        self.plan_deletions(job, &mut actions);

        actions.sort_by_key(Action::kind);

        info!(
            "Planned {} actions ({} copies, {} deletes) across {} destinations",
            actions.len(),
            actions
                .iter()
                .filter(|a| a.kind() == ActionKind::Copy)
                .count(),
            actions
                .iter()
                .filter(|a| a.kind() == ActionKind::Delete)
                .count(),
            self.destinations.len(),
        );
        actions
    }

    /// A versioned primary file goes to every destination that wants it,
    /// holds nothing newer for its base name, and is missing that exact
    /// name. A destination already at an equal-or-later version is left
    /// untouched; skipped older versions are never back-filled.
    fn plan_versioned_copies<'a>(&'a self, actions: &mut Vec<Action<'a>>) {
        for file in self.primary.versioned_files() {
            let (base, number) = match (&file.base_name, file.version_number) {
                (Some(base), Some(number)) => (base, number),
                _ => continue,
            };
            for destination in self.qualifying_destinations() {
                if !destination.wants_file(file) {
                    continue;
                }
                if number > destination.latest_version_number(base)
                    && destination.is_absent(&file.file_name)
                {
                    actions.push(Action::Copy { file, destination });
                }
            }
        }
    }

    /// Unversioned primary files are copied wherever they are missing or
    /// stale, judged against the primary copy's last-write time.
    fn plan_unversioned_copies<'a>(&'a self, actions: &mut Vec<Action<'a>>) {
        for file in self.primary.unversioned_files() {
            for destination in self.qualifying_destinations() {
                if destination.wants_file(file)
                    && destination.is_absent_or_stale(&file.file_name, file.modified)
                {
                    actions.push(Action::Copy { file, destination });
                }
            }
        }
    }

    /// Count-based retention with an age override: the oldest versions in
    /// excess of the quota are deleted, but never while younger than the
    /// destination's minimum age. A version that is both over quota and too
    /// young stays in place until it ages out.
    fn plan_deletions<'a>(&'a self, job: &JobContext, actions: &mut Vec<Action<'a>>) {
        for destination in self.qualifying_destinations() {
            let quota = destination.retain_maximum_versions();
            let minimum_age_days = destination.retain_younger_than_days();

            for set in destination.version_sets() {
                let excess = set.len().saturating_sub(quota);
                if excess == 0 {
                    continue;
                }
                for file_name in set.file_names().take(excess) {
                    match destination.record(file_name) {
                        Some(record) if record.age_days(job.now) > minimum_age_days => {
                            actions.push(Action::Delete { file: record });
                        }
                        Some(record) => {
                            debug!(
                                "Retaining over-quota version {} in {}: {} days old, minimum {}",
                                record.file_name,
                                destination.path().display(),
                                record.age_days(job.now),
                                minimum_age_days,
                            );
                        }
                        None => {
                            // Deletes are only ever planned for records the
                            // catalog physically holds.
                            warn!(
                                "Version index of {} lists '{}' with no matching record; skipping delete",
                                destination.path().display(),
                                file_name,
                            );
                        }
                    }
                }
            }
        }
    }

    fn qualifying_destinations(&self) -> impl Iterator<Item = &DirectoryCatalog> {
        self.destinations
            .iter()
            .filter(|c| c.is_enabled_and_available())
    }
}
