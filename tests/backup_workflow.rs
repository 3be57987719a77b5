//! End-to-end backup workflow tests against throwaway local repositories.
//!
//! These tests drive the real engine and the real git binary; everything
//! that would normally live on github.com is a repository on the local
//! filesystem. They share the process working directory, so they are
//! serialized.

mod common;

use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use githubbackup::{Archiver, BackupEngine, ScopedDir};

#[tokio::test]
#[serial]
async fn fresh_backup_clones_and_tracks_all_branches() {
    let fixture = TempDir::new().unwrap();
    let source = fixture.path().join("source-r1");
    common::init_source_repo(&source, &["feature-a", "feature-b"]);

    let dest = TempDir::new().unwrap();
    let engine = BackupEngine::new(common::public_credentials(), dest.path().to_path_buf());
    let repos = vec![common::local_descriptor("r1", &source)];

    let summary = engine.run(&repos).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.cloned, 1);
    assert_eq!(summary.failed, 0);

    let copy = dest.path().join("r1");
    assert!(copy.join(".git").exists());
    assert_eq!(
        common::local_branches(&copy),
        vec!["feature-a", "feature-b", "main"]
    );
}

#[tokio::test]
#[serial]
async fn second_run_converges_to_the_same_state() {
    let fixture = TempDir::new().unwrap();
    let source = fixture.path().join("source-r1");
    common::init_source_repo(&source, &["feature-a"]);

    let dest = TempDir::new().unwrap();
    let engine = BackupEngine::new(common::public_credentials(), dest.path().to_path_buf());
    let repos = vec![common::local_descriptor("r1", &source)];

    let first = engine.run(&repos).await;
    assert_eq!(first.cloned, 1);

    let copy = dest.path().join("r1");
    let head_after_first = common::head_commit(&copy);
    let branches_after_first = common::local_branches(&copy);

    let second = engine.run(&repos).await;
    assert_eq!(second.updated, 1);
    assert_eq!(second.failed, 0);

    assert_eq!(common::head_commit(&copy), head_after_first);
    assert_eq!(common::local_branches(&copy), branches_after_first);
}

#[tokio::test]
#[serial]
async fn local_changes_are_stashed_before_pulling_updates() {
    let fixture = TempDir::new().unwrap();
    let source = fixture.path().join("source-r1");
    common::init_source_repo(&source, &[]);

    let dest = TempDir::new().unwrap();
    let engine = BackupEngine::new(common::public_credentials(), dest.path().to_path_buf());
    let repos = vec![common::local_descriptor("r1", &source)];

    assert_eq!(engine.run(&repos).await.cloned, 1);

    let copy = dest.path().join("r1");
    // Stashing real changes needs an identity in the working copy
    common::git(&copy, &["config", "user.name", "Test"]);
    common::git(&copy, &["config", "user.email", "test@example.com"]);
    std::fs::write(copy.join("README.md"), "local edit\n").unwrap();

    common::commit_new_file(&source, "CHANGES.md", "upstream\n");

    let summary = engine.run(&repos).await;
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 0);

    // The pull landed and the local edit was shelved out of the way
    assert_eq!(common::head_commit(&copy), common::head_commit(&source));
    assert_eq!(
        std::fs::read_to_string(copy.join("CHANGES.md")).unwrap(),
        "upstream\n"
    );
    assert_eq!(
        std::fs::read_to_string(copy.join("README.md")).unwrap(),
        "fixture\n"
    );
}

#[tokio::test]
#[serial]
async fn one_broken_repository_does_not_block_the_rest() {
    let fixture = TempDir::new().unwrap();
    let source = fixture.path().join("source-good");
    common::init_source_repo(&source, &[]);

    let dest = TempDir::new().unwrap();
    let engine = BackupEngine::new(common::public_credentials(), dest.path().to_path_buf());

    let broken =
        common::local_descriptor("broken", fixture.path().join("no-such-repo").as_path());
    let good = common::local_descriptor("good", &source);
    let summary = engine.run(&[broken, good]).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.cloned, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].repo, "broken");
    assert!(dest.path().join("good").join(".git").exists());
    assert!(!dest.path().join("broken").exists());
}

#[tokio::test]
#[serial]
async fn backup_logs_per_repository_progress() {
    let fixture = TempDir::new().unwrap();
    let source = fixture.path().join("source-r1");
    common::init_source_repo(&source, &[]);

    let dest = TempDir::new().unwrap();
    let engine = BackupEngine::new(common::public_credentials(), dest.path().to_path_buf());
    let repos = vec![common::local_descriptor("r1", &source)];

    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .finish();

    let summary = engine.run(&repos).with_subscriber(subscriber).await;
    assert_eq!(summary.cloned, 1);

    let logs = buffer.contents();
    let started = logs
        .find("Backing up repository r1")
        .expect("missing start log line");
    let finished = logs
        .find("Finished copying repo r1")
        .expect("missing finish log line");
    assert!(started < finished);
}

#[tokio::test]
#[serial]
async fn run_with_archival_produces_one_matching_artifact() {
    let fixture = TempDir::new().unwrap();
    let source = fixture.path().join("source-r1");
    common::init_source_repo(&source, &[]);

    let dest = assert_fs::TempDir::new().unwrap();
    let engine = BackupEngine::new(common::public_credentials(), dest.path().to_path_buf());
    let repos = vec![common::local_descriptor("r1", &source)];
    assert_eq!(engine.run(&repos).await.cloned, 1);

    dest.child("r1/README.md").assert(predicate::path::exists());

    let scratch = TempDir::new().unwrap();
    let archive_dir = TempDir::new().unwrap();
    let archiver = Archiver::new(archive_dir.path());

    let stored = {
        let _cwd = ScopedDir::enter(scratch.path()).unwrap();
        archiver.run(dest.path()).expect("archiving should succeed")
    };

    // Exactly one artifact, named after the run timestamp
    let artifacts: Vec<_> = std::fs::read_dir(archive_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].starts_with("githubbackup_"));
    assert!(artifacts[0].ends_with(".tar.gz"));

    // Extracted contents equal the destination at the moment of archiving
    let out = TempDir::new().unwrap();
    let file = std::fs::File::open(&stored).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(out.path()).unwrap();

    let root = out.path().join(dest.path().file_name().unwrap());
    assert_eq!(
        std::fs::read_to_string(root.join("r1").join("README.md")).unwrap(),
        "fixture\n"
    );
}

/// Shared in-memory writer so a test can assert on emitted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
