//! Git-backed collaborators over a local repository mirror.
//!
//! [`GitHistory`] answers lookups across every ref; [`GitPusher`] lands a
//! PR by committing its head tree onto the target branch with the
//! synthesized message. Both fail, rather than report "absent", when the
//! configured directory is not a repository.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::hash::CommitHash;
use crate::forge::{
    Commit, CommitHistory, CommitPusher, HistoryError, HistoryResult, PushError, PushResult,
    PushTarget,
};

/// Output of a finished git invocation.
struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

async fn git(repo: &Path, args: &[&str]) -> std::io::Result<GitOutput> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await?;
    Ok(GitOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Check whether a directory is inside a git work tree or bare repository.
pub async fn is_git_repo(dir: &Path) -> bool {
    git(dir, &["rev-parse", "--git-dir"])
        .await
        .map(|o| o.success)
        .unwrap_or(false)
}

/// Repository history read through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo: PathBuf,
}

impl GitHistory {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    async fn run(&self, args: &[&str]) -> HistoryResult<String> {
        let output = git(&self.repo, args).await?;
        if !output.success {
            return Err(HistoryError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl CommitHistory for GitHistory {
    async fn lookup(&self, hash: &CommitHash) -> HistoryResult<Option<Commit>> {
        // Only a missing object inside a real repository means "absent".
        if !is_git_repo(&self.repo).await {
            return Err(HistoryError::Git(format!(
                "{} is not a git repository",
                self.repo.display()
            )));
        }

        let object = format!("{}^{{commit}}", hash.as_str());
        let exists = git(&self.repo, &["cat-file", "-e", &object]).await?;
        if !exists.success {
            debug!(hash = %hash, "object not present in mirror");
            return Ok(None);
        }

        // Dangling objects are not part of any branch or tag.
        let refs = self
            .run(&["for-each-ref", "--contains", hash.as_str(), "--format=%(refname)"])
            .await?;
        if refs.trim().is_empty() {
            debug!(hash = %hash, "commit not reachable from any ref");
            return Ok(None);
        }

        let message = self
            .run(&["log", "-1", "--format=%B", hash.as_str()])
            .await?;
        Ok(Some(Commit {
            hash: hash.clone(),
            message: message.trim_end_matches('\n').to_string(),
        }))
    }
}

/// Lands PRs by committing their head tree onto the target branch.
#[derive(Debug, Clone)]
pub struct GitPusher {
    repo: PathBuf,
}

impl GitPusher {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    async fn run(&self, args: &[&str]) -> PushResult<String> {
        let output = git(&self.repo, args).await?;
        if !output.success {
            return Err(PushError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr
            )));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// `Some(tip)` when the branch tip is already this PR's commit: same
    /// tree as the head, same message. A pass that pushed and then failed
    /// to report it lands here on the next poll.
    async fn landed_at_tip(
        &self,
        tip: &str,
        tree: &str,
        message: &str,
    ) -> PushResult<Option<CommitHash>> {
        let tip_tree = self
            .run(&["rev-parse", "--verify", &format!("{tip}^{{tree}}")])
            .await?;
        if tip_tree != tree {
            return Ok(None);
        }
        let tip_message = self.run(&["log", "-1", "--format=%B", tip]).await?;
        if tip_message.trim_end() != message.trim_end() {
            return Ok(None);
        }
        CommitHash::parse(tip)
            .map(Some)
            .map_err(|e| PushError::Git(e.to_string()))
    }
}

#[async_trait]
impl CommitPusher for GitPusher {
    async fn push(&self, target: &PushTarget, message: &str) -> PushResult<CommitHash> {
        let tree = self
            .run(&["rev-parse", "--verify", &format!("{}^{{tree}}", target.head)])
            .await?;
        let branch = format!("refs/heads/{}", target.target_branch);
        let parent = self.run(&["rev-parse", "--verify", &branch]).await?;

        if let Some(landed) = self.landed_at_tip(&parent, &tree, message).await? {
            debug!(pr_id = %target.pr_id, pushed = %landed, "backport already on target branch");
            return Ok(landed);
        }

        let created = self
            .run(&["commit-tree", &tree, "-p", &parent, "-m", message])
            .await?;

        // Compare-and-swap against the parent we built on.
        let update = git(&self.repo, &["update-ref", &branch, &created, &parent]).await?;
        if !update.success {
            return Err(PushError::Rejected {
                pr_id: target.pr_id.clone(),
                reason: update.stderr,
            });
        }

        CommitHash::parse(&created).map_err(|e| PushError::Git(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
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

    fn commit_file(repo: &Path, name: &str, message: &str) -> CommitHash {
        std::fs::write(repo.join(name), name).unwrap();
        run_git(repo, &["add", name]);
        run_git(repo, &["commit", "-q", "-m", message]);
        CommitHash::parse(&run_git(repo, &["rev-parse", "HEAD"])).unwrap()
    }

    #[tokio::test]
    async fn lookup_returns_full_message() {
        let repo = make_git_repo();
        let hash = commit_file(
            repo.path(),
            "a.txt",
            "JDK-1: An issue\n\nReviewed-by: alice",
        );

        let commit = GitHistory::new(repo.path())
            .lookup(&hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commit.hash, hash);
        assert_eq!(commit.message, "JDK-1: An issue\n\nReviewed-by: alice");
    }

    #[tokio::test]
    async fn lookup_of_unknown_hash_is_none() {
        let repo = make_git_repo();
        let missing = CommitHash::parse("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert!(GitHistory::new(repo.path())
            .lookup(&missing)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn lookup_ignores_unreachable_commits() {
        let repo = make_git_repo();
        run_git(repo.path(), &["checkout", "-q", "-b", "scratch"]);
        let hash = commit_file(repo.path(), "b.txt", "JDK-2: Scratch");
        run_git(repo.path(), &["checkout", "-q", "master"]);
        run_git(repo.path(), &["branch", "-q", "-D", "scratch"]);

        assert!(GitHistory::new(repo.path())
            .lookup(&hash)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn lookup_outside_repo_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let hash = CommitHash::parse("0123456789abcdef0123456789abcdef01234567").unwrap();
        let err = GitHistory::new(dir.path()).lookup(&hash).await.unwrap_err();
        assert!(matches!(err, HistoryError::Git(ref msg) if msg.contains("not a git repository")));
        assert!(!is_git_repo(dir.path()).await);
    }

    #[tokio::test]
    async fn lookup_in_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let hash = CommitHash::parse("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert!(GitHistory::new(dir.path().join("gone"))
            .lookup(&hash)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn push_commits_head_tree_onto_target() {
        let repo = make_git_repo();
        run_git(repo.path(), &["checkout", "-q", "-b", "pr-1"]);
        commit_file(repo.path(), "fix.txt", "wip");
        run_git(repo.path(), &["checkout", "-q", "master"]);
        let before = run_git(repo.path(), &["rev-parse", "master"]);

        let target = PushTarget {
            pr_id: "1".to_string(),
            head: "pr-1".to_string(),
            target_branch: "master".to_string(),
        };
        let message = "JDK-1: An issue\n\nReviewed-by: bob\nBackport-of: 0123456789abcdef0123456789abcdef01234567";
        let pushed = GitPusher::new(repo.path()).push(&target, message).await.unwrap();

        assert_eq!(run_git(repo.path(), &["rev-parse", "master"]), pushed.as_str());
        assert_eq!(run_git(repo.path(), &["rev-parse", "master^"]), before);
        assert_eq!(run_git(repo.path(), &["log", "-1", "--format=%B", "master"]), message);
        assert_eq!(
            run_git(repo.path(), &["rev-parse", "master^{tree}"]),
            run_git(repo.path(), &["rev-parse", "pr-1^{tree}"])
        );
        assert!(is_git_repo(repo.path()).await);
    }

    #[tokio::test]
    async fn repeated_push_reuses_landed_commit() {
        let repo = make_git_repo();
        run_git(repo.path(), &["checkout", "-q", "-b", "pr-1"]);
        commit_file(repo.path(), "fix.txt", "wip");
        run_git(repo.path(), &["checkout", "-q", "master"]);

        let target = PushTarget {
            pr_id: "1".to_string(),
            head: "pr-1".to_string(),
            target_branch: "master".to_string(),
        };
        let message = "JDK-1: An issue\n\nReviewed-by: bob\nBackport-of: 0123456789abcdef0123456789abcdef01234567";
        let pusher = GitPusher::new(repo.path());
        let first = pusher.push(&target, message).await.unwrap();
        let second = pusher.push(&target, message).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(run_git(repo.path(), &["rev-parse", "master"]), first.as_str());
        assert_eq!(run_git(repo.path(), &["rev-list", "--count", "master"]), "2");
    }

    #[tokio::test]
    async fn different_message_at_tip_is_pushed_anew() {
        let repo = make_git_repo();
        run_git(repo.path(), &["checkout", "-q", "-b", "pr-1"]);
        commit_file(repo.path(), "fix.txt", "wip");
        run_git(repo.path(), &["checkout", "-q", "master"]);

        let target = PushTarget {
            pr_id: "1".to_string(),
            head: "pr-1".to_string(),
            target_branch: "master".to_string(),
        };
        let pusher = GitPusher::new(repo.path());
        let first = pusher.push(&target, "JDK-1: An issue\n\nReviewed-by: bob").await.unwrap();
        let second = pusher
            .push(&target, "JDK-1: An issue\n\nReviewed-by: bob, carol")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(run_git(repo.path(), &["rev-parse", "master^"]), first.as_str());
    }

    #[tokio::test]
    async fn push_to_missing_branch_fails() {
        let repo = make_git_repo();
        let target = PushTarget {
            pr_id: "1".to_string(),
            head: "master".to_string(),
            target_branch: "release/99".to_string(),
        };
        let err = GitPusher::new(repo.path()).push(&target, "x").await.unwrap_err();
        assert!(matches!(err, PushError::Git(_)));
    }
}
