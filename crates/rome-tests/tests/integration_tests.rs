//! End to end tests for rome
//!
//! These drive a full mirror run (walker, both pools, the build tag
//! transform) against real directory trees.

#![cfg(unix)]

use rome_build::{BuildTagTransformer, DirectoryCleaner};
use rome_config::RomeConfig;
use rome_engine::{Mirror, MirrorConfig, MirrorReport, SkipRules};
use rome_tests::test_utils::{
    scenario_tree, snapshot, symlink, wide_tree, write_files, CountingCopy, EntrySnapshot,
    SlowTransform,
};
use rome_types::{BuildTarget, Clean, Error, ErrorKind, QueueCapacity, Transform, WorkerCount};
use rstest::rstest;
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn target() -> BuildTarget {
    BuildTarget::new("ent", "7.9.0.0")
}

fn snapshot_of(files: &[(&str, &str)]) -> BTreeMap<PathBuf, EntrySnapshot> {
    files
        .iter()
        .map(|(name, content)| {
            (
                PathBuf::from(name),
                EntrySnapshot::File(content.as_bytes().to_vec()),
            )
        })
        .collect()
}

fn default_skip() -> SkipRules {
    SkipRules::new(&RomeConfig::default().skip).unwrap()
}

async fn mirror(
    source: &Path,
    destination: &Path,
    transform: Arc<dyn Transform>,
    workers: usize,
    capacity: usize,
) -> MirrorReport {
    let config = MirrorConfig::new(source, destination, target())
        .with_file_pool(
            WorkerCount::new(workers).unwrap(),
            QueueCapacity::new(capacity).unwrap(),
        )
        .with_link_pool(
            WorkerCount::new(workers).unwrap(),
            QueueCapacity::new(capacity).unwrap(),
        )
        .with_skip_rules(default_skip());

    Mirror::new(config, transform).run().await.unwrap()
}

#[tokio::test]
async fn test_scenario_tree_mirror() {
    let source = scenario_tree();
    let destination = TempDir::new().unwrap();

    let config = MirrorConfig::new(source.path(), destination.path(), target())
        .with_skip_rules(default_skip());
    let mirror = Mirror::new(config, Arc::new(BuildTagTransformer::default()));
    let progress = mirror.progress();
    let report = mirror.run().await.unwrap();

    assert!(report.is_success());
    assert_eq!(progress.get(), 3);
    assert_eq!(report.stats.entries, 3);
    assert_eq!(report.stats.files_built, 2);
    assert_eq!(report.stats.links_created, 1);
    assert_eq!(report.stats.directories_skipped, 1);

    let built = destination.path();
    assert_eq!(fs::read_to_string(built.join("a.txt")).unwrap(), "a");
    assert_eq!(fs::read_to_string(built.join("sub/b.txt")).unwrap(), "b");
    assert_eq!(
        fs::read_link(built.join("sub/link")).unwrap(),
        PathBuf::from("../a.txt")
    );
    assert!(!built.join("node_modules").exists());
}

#[rstest]
#[case(1, 1)]
#[case(3, 2)]
#[case(40, 100)]
#[tokio::test]
async fn test_pool_sizes_build_identical_trees(#[case] workers: usize, #[case] capacity: usize) {
    let source = wide_tree(6, 8);
    let reference = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();

    let transform: Arc<dyn Transform> = Arc::new(BuildTagTransformer::default());
    let baseline = mirror(source.path(), reference.path(), Arc::clone(&transform), 1, 1).await;
    let report = mirror(source.path(), destination.path(), transform, workers, capacity).await;

    assert!(baseline.is_success());
    assert!(report.is_success());
    assert_eq!(report.stats.entries, 6 * 8 + 6);
    assert_eq!(snapshot(reference.path()), snapshot(destination.path()));
}

#[tokio::test]
async fn test_version_tag_is_stamped() {
    let source = wide_tree(1, 1);
    let destination = TempDir::new().unwrap();

    let report = mirror(
        source.path(),
        destination.path(),
        Arc::new(BuildTagTransformer::default()),
        2,
        4,
    )
    .await;

    assert!(report.is_success());
    let content = fs::read_to_string(destination.path().join("dir0/nested/file0.txt")).unwrap();
    assert_eq!(content, "dir0/nested/file0.txt 7.9.0.0");
}

#[tokio::test]
async fn test_flavor_blocks_follow_target() {
    let source = TempDir::new().unwrap();
    write_files(
        source.path(),
        &[(
            "lib/edition.php",
            "<?php\n\
             // BEGIN SUGARCRM flav=pro ONLY\n\
             $pro = true;\n\
             // END SUGARCRM ONLY\n\
             // BEGIN SUGARCRM flav=ult ONLY\n\
             $ult = true;\n\
             // END SUGARCRM ONLY\n\
             $flavor = '@_SUGAR_FLAV';\n",
        )],
    );
    let destination = TempDir::new().unwrap();

    let report = mirror(
        source.path(),
        destination.path(),
        Arc::new(BuildTagTransformer::default()),
        4,
        4,
    )
    .await;

    assert!(report.is_success());
    let built = fs::read_to_string(destination.path().join("lib/edition.php")).unwrap();
    assert_eq!(built, "<?php\n$pro = true;\n$flavor = 'ent';\n");
}

#[tokio::test]
async fn test_symlinks_are_recreated_not_followed() {
    let source = TempDir::new().unwrap();
    write_files(source.path(), &[("real/data.txt", "data")]);
    symlink(source.path(), "to_dir", "real");
    symlink(source.path(), "dangling", "does/not/exist");
    symlink(source.path(), "absolute", "/etc/hostname");
    let destination = TempDir::new().unwrap();

    let transform = Arc::new(CountingCopy::default());
    let report = mirror(source.path(), destination.path(), transform.clone(), 2, 2).await;

    assert!(report.is_success());
    assert_eq!(transform.calls(), 1);
    assert_eq!(report.stats.links_created, 3);

    let built = snapshot(destination.path());
    assert_eq!(
        built.get(Path::new("to_dir")),
        Some(&EntrySnapshot::Link(PathBuf::from("real")))
    );
    assert_eq!(
        built.get(Path::new("dangling")),
        Some(&EntrySnapshot::Link(PathBuf::from("does/not/exist")))
    );
    assert_eq!(
        built.get(Path::new("absolute")),
        Some(&EntrySnapshot::Link(PathBuf::from("/etc/hostname")))
    );
    // The linked directory is not walked through the link
    assert!(!built.contains_key(Path::new("to_dir/data.txt")));
}

#[tokio::test]
async fn test_clean_removes_previous_build() {
    let source = scenario_tree();
    let destination = TempDir::new().unwrap();
    write_files(
        destination.path(),
        &[("stale.txt", "old"), ("old_dir/stale.txt", "old")],
    );

    DirectoryCleaner::new().clean(destination.path()).await.unwrap();
    let report = mirror(
        source.path(),
        destination.path(),
        Arc::new(CountingCopy::default()),
        4,
        4,
    )
    .await;

    assert!(report.is_success());
    let built = snapshot(destination.path());
    assert!(!built.contains_key(Path::new("stale.txt")));
    assert!(!destination.path().join("old_dir").exists());
    assert_eq!(built.len(), 3);
}

#[tokio::test]
async fn test_without_clean_stale_files_survive() {
    let source = scenario_tree();
    let destination = TempDir::new().unwrap();
    write_files(destination.path(), &[("stale.txt", "old")]);

    let report = mirror(
        source.path(),
        destination.path(),
        Arc::new(CountingCopy::default()),
        2,
        2,
    )
    .await;

    assert!(report.is_success());
    assert!(destination.path().join("stale.txt").exists());
}

#[tokio::test]
async fn test_rebuild_over_stale_links_stays_inside_destination() {
    let source = scenario_tree();
    let outside = TempDir::new().unwrap();
    write_files(
        outside.path(),
        &[("victim.txt", "untouched"), ("dir/keep.txt", "untouched")],
    );
    let destination = TempDir::new().unwrap();
    // an earlier build left links where the source now has a file and a directory
    symlink(
        destination.path(),
        "a.txt",
        outside.path().join("victim.txt").to_str().unwrap(),
    );
    symlink(
        destination.path(),
        "sub",
        outside.path().join("dir").to_str().unwrap(),
    );

    let report = mirror(
        source.path(),
        destination.path(),
        Arc::new(BuildTagTransformer::default()),
        4,
        4,
    )
    .await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(
        snapshot(outside.path()),
        snapshot_of(&[("victim.txt", "untouched"), ("dir/keep.txt", "untouched")])
    );
    let built = snapshot(destination.path());
    assert_eq!(
        built.get(Path::new("a.txt")),
        Some(&EntrySnapshot::File(b"a".to_vec()))
    );
    assert_eq!(
        built.get(Path::new("sub/link")),
        Some(&EntrySnapshot::Link(PathBuf::from("../a.txt")))
    );
    assert!(fs::symlink_metadata(destination.path().join("sub"))
        .unwrap()
        .is_dir());
}

#[tokio::test]
async fn test_second_build_without_clean_succeeds() {
    let source = scenario_tree();
    write_files(source.path(), &[("readonly.txt", "r")]);
    fs::set_permissions(
        source.path().join("readonly.txt"),
        fs::Permissions::from_mode(0o444),
    )
    .unwrap();
    let destination = TempDir::new().unwrap();
    let transform: Arc<dyn Transform> = Arc::new(BuildTagTransformer::default());

    let first = mirror(source.path(), destination.path(), Arc::clone(&transform), 2, 2).await;
    let second = mirror(source.path(), destination.path(), transform, 2, 2).await;

    assert!(first.is_success());
    assert!(second.is_success(), "{:?}", second.failures);
    assert_eq!(second.stats.links_created, 1);
    assert_eq!(second.stats.files_built, 3);
}

#[tokio::test]
async fn test_unreadable_subtree_is_reported_and_walk_continues() {
    let source = scenario_tree();
    write_files(source.path(), &[("locked/secret.txt", "secret")]);
    let locked = source.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not apply to root
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!(
            "skipping test_unreadable_subtree_is_reported_and_walk_continues: \
             mode 000 directories are readable by this user"
        );
        return;
    }

    let destination = TempDir::new().unwrap();
    let report = mirror(
        source.path(),
        destination.path(),
        Arc::new(CountingCopy::default()),
        2,
        2,
    )
    .await;

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(report.has_failures());
    assert!(report
        .failures
        .iter()
        .any(|failure| failure.kind() == ErrorKind::Walk));
    assert!(!report.cancelled);
    assert_eq!(report.stats.files_built, 2);
    assert!(destination.path().join("a.txt").is_file());
    assert!(destination.path().join("sub/b.txt").is_file());
    assert!(!destination.path().join("locked/secret.txt").exists());
}

#[tokio::test]
async fn test_cancel_stops_a_running_build() {
    let source = wide_tree(20, 10);
    let destination = TempDir::new().unwrap();
    let transform = Arc::new(SlowTransform::new(Duration::from_millis(20)));

    let config = MirrorConfig::new(source.path(), destination.path(), target()).with_file_pool(
        WorkerCount::new(1).unwrap(),
        QueueCapacity::new(1).unwrap(),
    );
    let mirror = Mirror::new(config, transform.clone());
    let cancel = mirror.cancel_handle();
    let running = tokio::spawn(mirror.run());

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(10), running)
        .await
        .expect("cancelled build did not stop")
        .unwrap()
        .unwrap();

    assert!(report.cancelled);
    assert!(!report.is_success());
    assert!(transform.calls() < 200);
    assert!(report.stats.files_built <= transform.calls());
}

#[tokio::test]
async fn test_missing_source_builds_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let destination = temp_dir.path().join("out");
    let config = MirrorConfig::new(temp_dir.path().join("missing"), &destination, target());

    let error = Mirror::new(config, Arc::new(CountingCopy::default()))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(error, Error::SourceNotFound { .. }));
    assert_eq!(error.kind(), ErrorKind::Startup);
    assert!(!destination.exists());
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn relative_file() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-c]{1,2}", 1..4).prop_map(|parts| {
            let mut path = parts.join("/");
            path.push_str(".txt");
            path
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_every_source_file_is_built(
            files in prop::collection::btree_set(relative_file(), 1..12),
            workers in 1usize..6,
        ) {
            let source = TempDir::new().unwrap();
            for file in &files {
                write_files(source.path(), &[(file.as_str(), file.as_str())]);
            }
            let destination = TempDir::new().unwrap();

            let runtime = tokio::runtime::Runtime::new().unwrap();
            let report = runtime.block_on(mirror(
                source.path(),
                destination.path(),
                Arc::new(CountingCopy::default()),
                workers,
                1,
            ));

            prop_assert!(report.is_success());
            prop_assert_eq!(snapshot(source.path()), snapshot(destination.path()));
        }
    }
}
