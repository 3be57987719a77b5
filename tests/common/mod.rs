//! Common test fixtures: throwaway git repositories served from the local
//! filesystem, plus descriptor helpers.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use githubbackup::github::RepoDescriptor;
use githubbackup::Credentials;

/// Run a git subcommand in `cwd`, panicking with stderr on failure. A test
/// identity is injected so commit-creating commands work in bare
/// environments.
pub fn git(cwd: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run a git subcommand in `cwd` and return its trimmed stdout.
pub fn git_stdout(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a source repository at `dir` with one commit on `main` plus the
/// given extra branches.
pub fn init_source_repo(dir: &Path, extra_branches: &[&str]) {
    std::fs::create_dir_all(dir).expect("failed to create source repo dir");

    git(dir, &["init"]);
    // Pin the initial branch name regardless of the host git configuration
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    std::fs::write(dir.join("README.md"), "fixture\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", "initial commit"]);

    for branch in extra_branches {
        git(dir, &["branch", branch]);
    }
}

/// Add a commit with one new file to a source repository.
pub fn commit_new_file(dir: &Path, file_name: &str, content: &str) {
    std::fs::write(dir.join(file_name), content).unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", &format!("add {file_name}")]);
}

/// Descriptor for a repository cloned straight from a local path.
pub fn local_descriptor(name: &str, source: &Path) -> RepoDescriptor {
    RepoDescriptor {
        name: name.to_string(),
        clone_url: source.to_string_lossy().into_owned(),
        private: false,
        default_branch: Some("main".to_string()),
    }
}

/// Credentials for a public-only run.
pub fn public_credentials() -> Credentials {
    Credentials {
        username: "tester".to_string(),
        password: None,
    }
}

/// Sorted local branch names of a working copy.
pub fn local_branches(repo: &Path) -> Vec<String> {
    let mut branches: Vec<String> =
        git_stdout(repo, &["for-each-ref", "--format=%(refname:short)", "refs/heads"])
            .lines()
            .map(String::from)
            .collect();
    branches.sort();
    branches
}

/// Commit the working copy's HEAD currently points at.
pub fn head_commit(repo: &Path) -> String {
    git_stdout(repo, &["rev-parse", "HEAD"])
}
