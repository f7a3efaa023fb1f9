//! Full pass over a real git repository and the JSON pull request store.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use backport_core::{
    BotConfig, Driver, DriverError, GitHistory, GitPusher, JsonPullRequestStore,
    PullRequestDoc, ReconciliationState, StateLabel, StoreReadiness,
};

fn run_git(repo_dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn make_git_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init", "-q"]);
    run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["commit", "--allow-empty", "-q", "-m", "initial"]);
    dir
}

fn commit_on(repo: &Path, branch: &str, file: &str, message: &str) -> String {
    run_git(repo, &["checkout", "-q", "-B", branch, "master"]);
    std::fs::write(repo.join(file), file).unwrap();
    run_git(repo, &["add", file]);
    run_git(repo, &["commit", "-q", "-m", message]);
    let hash = run_git(repo, &["rev-parse", "HEAD"]);
    run_git(repo, &["checkout", "-q", "master"]);
    hash
}

#[tokio::test]
async fn backport_is_resolved_and_pushed_through_git() {
    let repo = make_git_repo();
    let original = commit_on(
        repo.path(),
        "mainline",
        "fix.txt",
        "JDK-1: An issue\n\nReviewed-by: alice",
    );
    commit_on(repo.path(), "pr-1", "fix.txt", "backport wip");
    let master_before = run_git(repo.path(), &["rev-parse", "master"]);

    let store_dir = tempfile::tempdir().unwrap();
    let store = JsonPullRequestStore::new(store_dir.path()).unwrap();
    let mut doc = PullRequestDoc::new("1", &format!("Backport {original}"), "duke", "pr-1");
    doc.approvers = vec!["bob".to_string()];
    store.save(&doc).unwrap();

    let config = BotConfig::default();
    let driver = Driver::new(
        &config,
        Arc::new(GitHistory::new(repo.path())),
        Arc::new(GitPusher::new(repo.path())),
        Arc::new(StoreReadiness::new(store.clone())),
    );
    let pr = store.open("1", &config.bot_login).unwrap();

    let state = driver.poll(&pr).await.unwrap();
    assert_eq!(state.label(), StateLabel::Resolved);
    assert_eq!(store.load("1").unwrap().title, "JDK-1: An issue");

    let mut doc = store.load("1").unwrap();
    doc.ready = true;
    store.save(&doc).unwrap();
    store.add_user_comment("1", "duke", "/integrate").unwrap();

    let state = driver.poll(&pr).await.unwrap();
    let ReconciliationState::Integrated { pushed } = state else {
        panic!("expected Integrated");
    };

    assert_eq!(run_git(repo.path(), &["rev-parse", "master"]), pushed.as_str());
    assert_eq!(run_git(repo.path(), &["rev-parse", "master^"]), master_before);
    assert_eq!(
        run_git(repo.path(), &["log", "-1", "--format=%B", "master"]),
        format!("JDK-1: An issue\n\nReviewed-by: bob\nBackport-of: {original}")
    );

    let comments = store.load("1").unwrap().comments;
    let bot: Vec<_> = comments
        .iter()
        .filter(|c| c.author == config.bot_login)
        .collect();
    assert_eq!(bot.len(), 3);
    assert!(bot[2].body.contains(&format!("Pushed as commit {pushed}.")));

    // Nothing moves once integrated.
    driver.poll(&pr).await.unwrap();
    assert_eq!(run_git(repo.path(), &["rev-parse", "master"]), pushed.as_str());
    assert_eq!(store.load("1").unwrap().comments.len(), comments.len());
}

#[tokio::test]
async fn unknown_hash_in_real_repo_is_reported() {
    let repo = make_git_repo();
    let store_dir = tempfile::tempdir().unwrap();
    let store = JsonPullRequestStore::new(store_dir.path()).unwrap();
    let title = "Backport 0123456789abcdef0123456789abcdef01234567";
    store
        .save(&PullRequestDoc::new("2", title, "duke", "master"))
        .unwrap();

    let config = BotConfig::default();
    let driver = Driver::new(
        &config,
        Arc::new(GitHistory::new(repo.path())),
        Arc::new(GitPusher::new(repo.path())),
        Arc::new(StoreReadiness::new(store.clone())),
    );
    let pr = store.open("2", &config.bot_login).unwrap();

    for _ in 0..2 {
        let state = driver.poll(&pr).await.unwrap();
        assert_eq!(state.label(), StateLabel::Error);
    }
    let doc = store.load("2").unwrap();
    assert_eq!(doc.comments.len(), 1);
    assert_eq!(doc.title, title);
}

#[tokio::test]
async fn mirror_that_is_not_a_repository_posts_nothing() {
    let not_a_repo = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    let store = JsonPullRequestStore::new(store_dir.path()).unwrap();
    let title = "Backport 0123456789abcdef0123456789abcdef01234567";
    store
        .save(&PullRequestDoc::new("3", title, "duke", "master"))
        .unwrap();

    let config = BotConfig::default();
    let driver = Driver::new(
        &config,
        Arc::new(GitHistory::new(not_a_repo.path())),
        Arc::new(GitPusher::new(not_a_repo.path())),
        Arc::new(StoreReadiness::new(store.clone())),
    );
    let pr = store.open("3", &config.bot_login).unwrap();

    let err = driver.poll(&pr).await.unwrap_err();
    assert!(matches!(err, DriverError::History(_)));
    let doc = store.load("3").unwrap();
    assert!(doc.comments.is_empty());
    assert_eq!(doc.title, title);
}
