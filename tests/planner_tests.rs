use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, TimeZone};

use backup_warden::catalog::{DirectoryCatalog, DirectoryRole, FileRecord};
use backup_warden::config::{DirectoryDescriptor, JobContext};
use backup_warden::planner::{Action, ActionKind, ArchivePlanner};

fn job_now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn job() -> JobContext {
    JobContext {
        include_slow_volumes: false,
        test_run: false,
        now: job_now(),
    }
}

fn record(dir: &str, name: &str, age_days: i64) -> FileRecord {
    FileRecord::new(
        PathBuf::from(format!("{}/{}", dir, name)),
        100,
        job_now() - Duration::days(age_days),
        None,
        false,
        0,
    )
}

fn descriptor(path: &str) -> DirectoryDescriptor {
    DirectoryDescriptor {
        path: PathBuf::from(path),
        enabled: true,
        priority: 0,
        include: vec!["*.zip".to_string()],
        exclude: vec![],
        retain_maximum_versions: usize::MAX,
        retain_younger_than_days: 0,
        slow_volume: false,
        test_only: false,
        process_window: None,
    }
}

fn primary(names: &[&str]) -> DirectoryCatalog {
    let records = names.iter().map(|n| record("/primary", n, 1)).collect();
    DirectoryCatalog::from_records(DirectoryRole::Primary, Path::new("/primary"), records).unwrap()
}

fn destination(desc: &DirectoryDescriptor, files: &[(&str, i64)]) -> DirectoryCatalog {
    let records = files
        .iter()
        .map(|(name, age)| record(desc.path.to_str().unwrap(), name, *age))
        .collect();
    DirectoryCatalog::from_descriptor_records(DirectoryRole::Destination, desc, records).unwrap()
}

fn copy_targets<'a>(actions: &[Action<'a>]) -> Vec<&'a str> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Copy { file, .. } => Some(file.file_name.as_str()),
            _ => None,
        })
        .collect()
}

fn delete_targets<'a>(actions: &[Action<'a>]) -> Vec<&'a str> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Delete { file } => Some(file.file_name.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_empty_destination_receives_all_newer_versions() {
    // Destination latest is 0, so both versions pass the newer-than test
    // and both are absent: two Copy actions, oldest first.
    let planner = ArchivePlanner::new(
        primary(&["Docs-0001.zip", "Docs-0002.zip"]),
        vec![],
        vec![destination(&descriptor("/dest"), &[])],
    );

    let actions = planner.plan(&job());
    assert_eq!(actions.len(), 2);
    assert_eq!(copy_targets(&actions), vec!["Docs-0001.zip", "Docs-0002.zip"]);
}

#[test]
fn test_no_backfill_of_older_versions() {
    // Destination already holds 0005; 0003 is individually absent but
    // older than the destination's latest, so it is not offered.
    let planner = ArchivePlanner::new(
        primary(&["Base-0003.zip"]),
        vec![],
        vec![destination(&descriptor("/dest"), &[("Base-0005.zip", 10)])],
    );

    assert!(planner.plan(&job()).is_empty());
}

#[test]
fn test_newer_version_is_copied_over_existing_latest() {
    let planner = ArchivePlanner::new(
        primary(&["Base-0006.zip"]),
        vec![],
        vec![destination(&descriptor("/dest"), &[("Base-0005.zip", 10)])],
    );

    let actions = planner.plan(&job());
    assert_eq!(copy_targets(&actions), vec!["Base-0006.zip"]);
}

#[test]
fn test_exact_name_presence_suppresses_copy() {
    let planner = ArchivePlanner::new(
        primary(&["Base-0005.zip"]),
        vec![],
        vec![destination(&descriptor("/dest"), &[("Base-0005.zip", 10)])],
    );

    assert!(planner.plan(&job()).is_empty());
}

#[test]
fn test_include_exclude_precedence_in_planning() {
    let mut desc = descriptor("/dest");
    desc.exclude = vec!["Temp*.*".to_string()];

    let planner = ArchivePlanner::new(
        primary(&["Data.zip", "TempData.zip", "Data.txt"]),
        vec![],
        vec![destination(&desc, &[])],
    );

    let actions = planner.plan(&job());
    assert_eq!(copy_targets(&actions), vec!["Data.zip"]);
}

#[test]
fn test_unversioned_copy_on_absence_and_staleness() {
    let primary_catalog = primary(&["Data.zip", "Other.zip"]);

    // "Data.zip" exists at the destination with the same write time as the
    // primary copy; "Other.zip" is absent.
    let dest = destination(&descriptor("/dest"), &[("Data.zip", 1)]);
    let planner = ArchivePlanner::new(primary_catalog, vec![], vec![dest]);

    let actions = planner.plan(&job());
    assert_eq!(copy_targets(&actions), vec!["Other.zip"]);
}

#[test]
fn test_unversioned_stale_copy_is_recopied() {
    // Destination copy is 10 days older than the primary's: stale.
    let dest = destination(&descriptor("/dest"), &[("Data.zip", 11)]);
    let planner = ArchivePlanner::new(primary(&["Data.zip"]), vec![], vec![dest]);

    let actions = planner.plan(&job());
    assert_eq!(copy_targets(&actions), vec!["Data.zip"]);
}

#[test]
fn test_retention_age_overrides_count_quota() {
    // Quota of 2 with three versions aged {40, 20, 5} days and a 30-day
    // minimum: only the 40-day version is deletable. The 20-day version is
    // over quota but too young, so it stays.
    let mut desc = descriptor("/dest");
    desc.retain_maximum_versions = 2;
    desc.retain_younger_than_days = 30;

    let dest = destination(
        &desc,
        &[
            ("Docs-0001.zip", 40),
            ("Docs-0002.zip", 20),
            ("Docs-0003.zip", 5),
        ],
    );
    let planner = ArchivePlanner::new(primary(&[]), vec![], vec![dest]);

    let actions = planner.plan(&job());
    assert_eq!(delete_targets(&actions), vec!["Docs-0001.zip"]);
}

#[test]
fn test_retention_all_young_deletes_nothing() {
    let mut desc = descriptor("/dest");
    desc.retain_maximum_versions = 1;
    desc.retain_younger_than_days = 30;

    let dest = destination(
        &desc,
        &[
            ("Docs-0001.zip", 20),
            ("Docs-0002.zip", 10),
            ("Docs-0003.zip", 5),
        ],
    );
    let planner = ArchivePlanner::new(primary(&[]), vec![], vec![dest]);

    assert!(planner.plan(&job()).is_empty());
}

#[test]
fn test_retention_without_age_floor_deletes_oldest_excess() {
    let mut desc = descriptor("/dest");
    desc.retain_maximum_versions = 1;

    let dest = destination(
        &desc,
        &[
            ("Docs-0001.zip", 40),
            ("Docs-0002.zip", 20),
            ("Docs-0003.zip", 5),
        ],
    );
    let planner = ArchivePlanner::new(primary(&[]), vec![], vec![dest]);

    let actions = planner.plan(&job());
    assert_eq!(
        delete_targets(&actions),
        vec!["Docs-0001.zip", "Docs-0002.zip"]
    );
}

#[test]
fn test_output_grouped_copy_before_delete() {
    let mut desc = descriptor("/dest");
    desc.retain_maximum_versions = 1;

    let dest = destination(
        &desc,
        &[("Docs-0001.zip", 40), ("Docs-0002.zip", 20)],
    );
    let planner = ArchivePlanner::new(primary(&["Docs-0003.zip"]), vec![], vec![dest]);

    let actions = planner.plan(&job());
    let kinds: Vec<ActionKind> = actions.iter().map(Action::kind).collect();
    assert_eq!(kinds, vec![ActionKind::Copy, ActionKind::Delete]);
    assert_eq!(copy_targets(&actions), vec!["Docs-0003.zip"]);
    assert_eq!(delete_targets(&actions), vec!["Docs-0001.zip"]);
}

#[test]
fn test_plan_is_idempotent_for_unchanged_state() {
    let build = || {
        let mut desc = descriptor("/dest");
        desc.retain_maximum_versions = 1;
        ArchivePlanner::new(
            primary(&["Docs-0004.zip", "Notes.zip"]),
            vec![],
            vec![destination(
                &desc,
                &[("Docs-0001.zip", 40), ("Docs-0002.zip", 35)],
            )],
        )
    };

    let planner_a = build();
    let planner_b = build();
    let job = job();

    let descriptions = |planner: &ArchivePlanner| -> Vec<String> {
        planner.plan(&job).iter().map(Action::description).collect()
    };
    assert_eq!(descriptions(&planner_a), descriptions(&planner_b));
    // And twice against the same planner
    assert_eq!(descriptions(&planner_a), descriptions(&planner_a));
}

#[test]
fn test_destinations_ordered_by_priority() {
    let mut first = descriptor("/fast");
    first.priority = 1;
    let mut second = descriptor("/slow");
    second.priority = 5;

    // Passed in reverse order; priority decides.
    let planner = ArchivePlanner::new(
        primary(&["Docs-0001.zip"]),
        vec![],
        vec![destination(&second, &[]), destination(&first, &[])],
    );

    let actions = planner.plan(&job());
    let dests: Vec<String> = actions
        .iter()
        .filter_map(|a| match a {
            Action::Copy { destination, .. } => {
                Some(destination.path().to_string_lossy().into_owned())
            }
            _ => None,
        })
        .collect();
    assert_eq!(dests, vec!["/fast".to_string(), "/slow".to_string()]);
}

#[test]
fn test_compression_candidates_respect_descriptor_gating() {
    let tmp = tempfile::tempdir().unwrap();
    let mut fast = descriptor(tmp.path().to_str().unwrap());
    fast.include = vec![];
    let mut slow = fast.clone();
    slow.slow_volume = true;

    let planner = ArchivePlanner::new(
        primary(&[]),
        vec![
            DirectoryCatalog::source(&fast).unwrap(),
            DirectoryCatalog::source(&slow).unwrap(),
        ],
        vec![],
    );

    let normal_run = job();
    assert_eq!(planner.compression_candidates(&normal_run).len(), 1);

    let slow_run = JobContext {
        include_slow_volumes: true,
        ..job()
    };
    assert_eq!(planner.compression_candidates(&slow_run).len(), 2);

    // No Compress actions are emitted by the planner itself
    assert!(planner.plan(&slow_run).is_empty());
}
