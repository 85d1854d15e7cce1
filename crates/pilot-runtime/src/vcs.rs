//! git actions on an agent's working directory: status for the preview, the
//! WIP checkpoint commit, diff display and worktree cleanup on kill.

use std::path::{Path, PathBuf};
use std::process::Command;

use pilot_core::vcs::{
    GitStatus, is_protected_branch, looks_like_secret, parse_worktree_list, worktree_location,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("git io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("refusing to commit on protected branch {0}")]
    ProtectedBranch(String),

    #[error("nothing to commit")]
    NothingToCommit,
}

/// Runs `git -C DIR ...`. Enables mock injection for testing.
pub trait GitRunner: Send + Sync {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError>;
}

impl<T: GitRunner + ?Sized> GitRunner for &T {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        (**self).run(dir, args)
    }
}

#[derive(Debug, Default)]
pub struct GitExecutor;

impl GitRunner for GitExecutor {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        tracing::debug!(dir = %dir.display(), ?args, "git");
        let output = Command::new("git").arg("-C").arg(dir).args(args).output()?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ─── Status ───────────────────────────────────────────────────────

/// Branch and change counts, or `None` outside a repository.
pub fn status(runner: &impl GitRunner, dir: &Path) -> Option<GitStatus> {
    match runner.run(dir, &["status", "--porcelain=v2", "--branch"]) {
        Ok(out) => Some(GitStatus::parse_porcelain_v2(&out)),
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "no git status");
            None
        }
    }
}

// ─── WIP commit ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub branch: String,
    /// Staged files that looked like credentials and were unstaged.
    pub unstaged_secrets: Vec<String>,
    /// Push failure; the commit itself stands.
    pub push_error: Option<String>,
}

impl CommitReport {
    pub fn summary(&self) -> String {
        let mut msg = format!("committed WIP on {}", self.branch);
        match &self.push_error {
            None => msg.push_str(", pushed"),
            Some(e) => msg.push_str(&format!(", push failed: {e}")),
        }
        if !self.unstaged_secrets.is_empty() {
            msg.push_str(&format!(
                "; warning: left out {}",
                self.unstaged_secrets.join(", ")
            ));
        }
        msg
    }
}

/// Stage everything except likely secrets, commit a WIP checkpoint and push
/// it. Protected branches are refused before anything is staged.
pub fn commit_wip(runner: &impl GitRunner, dir: &Path) -> Result<CommitReport, GitError> {
    let branch = runner
        .run(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?
        .trim()
        .to_string();
    if is_protected_branch(&branch) {
        return Err(GitError::ProtectedBranch(branch));
    }

    runner.run(dir, &["add", "-A"])?;
    // -z keeps non-ASCII paths unquoted so the secret patterns see real names.
    let staged = runner.run(dir, &["diff", "--cached", "--name-only", "-z"])?;
    let (secrets, keep): (Vec<&str>, Vec<&str>) = staged
        .split('\0')
        .filter(|f| !f.trim().is_empty())
        .partition(|f| looks_like_secret(f));

    for &file in &secrets {
        tracing::warn!(file, "unstaging file that looks like a secret");
        if let Err(e) = runner.run(dir, &["reset", "-q", "HEAD", "--", file]) {
            if let Err(reset) = runner.run(dir, &["reset", "-q"]) {
                tracing::warn!(error = %reset, "could not unstage everything");
            }
            return Err(e);
        }
    }
    if keep.is_empty() {
        return Err(GitError::NothingToCommit);
    }

    let message = format!(
        "WIP: pilot checkpoint {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    );
    runner.run(dir, &["commit", "-q", "-m", &message])?;

    let push_error = match runner.run(dir, &["push", "-q", "-u", "origin", "HEAD"]) {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "push failed");
            Some(e.to_string())
        }
    };

    Ok(CommitReport {
        branch,
        unstaged_secrets: secrets.into_iter().map(String::from).collect(),
        push_error,
    })
}

// ─── Worktree cleanup ─────────────────────────────────────────────

/// Remove the worktree `path` lives in, if it follows the `*-worktree/*`
/// layout and its repository still lists it. Returns the removed worktree.
pub fn remove_worktree_for(
    runner: &impl GitRunner,
    path: &str,
) -> Result<Option<PathBuf>, GitError> {
    let Some(loc) = worktree_location(path) else {
        return Ok(None);
    };
    let porcelain = runner.run(&loc.repo_root, &["worktree", "list", "--porcelain"])?;
    let listed = parse_worktree_list(&porcelain);
    if !listed.iter().any(|p| p == &loc.worktree) {
        tracing::debug!(worktree = %loc.worktree.display(), "not a registered worktree");
        return Ok(None);
    }

    let worktree = loc.worktree.to_string_lossy().into_owned();
    runner.run(&loc.repo_root, &["worktree", "remove", "--force", &worktree])?;
    if let Err(e) = runner.run(&loc.repo_root, &["worktree", "prune"]) {
        tracing::warn!(error = %e, "worktree prune failed");
    }
    Ok(Some(loc.worktree))
}

// ─── Interactive views ────────────────────────────────────────────

/// Colorized diff against HEAD in a pager, attached to the terminal.
pub fn show_diff(dir: &Path) -> std::io::Result<()> {
    let status = Command::new("sh")
        .args(["-c", "git -c color.ui=always diff HEAD | ${PAGER:-less -R}"])
        .current_dir(dir)
        .status()?;
    if !status.success() {
        tracing::debug!(code = ?status.code(), "diff pager exited with failure");
    }
    Ok(())
}

/// Run the configured editor command (e.g. `nvim -c Git`) in `dir`.
pub fn open_status_view(command_line: &str, dir: &Path) -> anyhow::Result<()> {
    let argv = shell_words::split(command_line)?;
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("empty VCS status command"))?;
    Command::new(program).args(args).current_dir(dir).status()?;
    Ok(())
}
