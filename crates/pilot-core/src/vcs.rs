//! Pure helpers for git output: status summary, worktree conventions and the
//! secret-file guard used before WIP commits.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};

// ─── Status ───────────────────────────────────────────────────────

/// Summary of `git status --porcelain=v2 --branch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    /// Branch name, or `detached`.
    pub branch: String,
    pub staged: usize,
    pub modified: usize,
    pub untracked: usize,
    /// `(ahead, behind)`, only when an upstream is configured.
    pub upstream: Option<(usize, usize)>,
}

impl GitStatus {
    /// Parse porcelain v2 output. Unknown lines are ignored.
    pub fn parse_porcelain_v2(output: &str) -> Self {
        let mut status = GitStatus::default();
        let mut has_upstream = false;
        let mut ab = (0, 0);

        for line in output.lines() {
            if let Some(head) = line.strip_prefix("# branch.head ") {
                status.branch = if head == "(detached)" {
                    "detached".to_string()
                } else {
                    head.to_string()
                };
            } else if line.starts_with("# branch.upstream ") {
                has_upstream = true;
            } else if let Some(rest) = line.strip_prefix("# branch.ab ") {
                let mut parts = rest.split_whitespace();
                let ahead = parts.next().and_then(|a| a.trim_start_matches('+').parse().ok());
                let behind = parts.next().and_then(|b| b.trim_start_matches('-').parse().ok());
                ab = (ahead.unwrap_or(0), behind.unwrap_or(0));
            } else if line.starts_with("? ") {
                status.untracked += 1;
            } else if let Some(rest) = line
                .strip_prefix("1 ")
                .or_else(|| line.strip_prefix("2 "))
                .or_else(|| line.strip_prefix("u "))
            {
                let mut xy = rest.chars();
                if xy.next().is_some_and(|x| x != '.') {
                    status.staged += 1;
                }
                if xy.next().is_some_and(|y| y != '.') {
                    status.modified += 1;
                }
            }
        }

        if has_upstream {
            status.upstream = Some(ab);
        }
        status
    }

    /// `+staged ~modified ?untracked`
    pub fn counts_label(&self) -> String {
        format!("+{} ~{} ?{}", self.staged, self.modified, self.untracked)
    }

    /// `↑ahead ↓behind`, empty without an upstream.
    pub fn upstream_label(&self) -> String {
        match self.upstream {
            Some((ahead, behind)) => format!("↑{ahead} ↓{behind}"),
            None => String::new(),
        }
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![self.branch.clone(), self.counts_label()];
        let upstream = self.upstream_label();
        if !upstream.is_empty() {
            parts.push(upstream);
        }
        parts.join("  ")
    }
}

// ─── Branch guard ─────────────────────────────────────────────────

const PROTECTED_BRANCHES: &[&str] = &["main", "master"];

pub fn is_protected_branch(branch: &str) -> bool {
    PROTECTED_BRANCHES.contains(&branch.trim())
}

// ─── Secret guard ─────────────────────────────────────────────────

const SECRET_GLOBS: &[&str] = &[
    ".env",
    ".env.*",
    "*.pem",
    "*.key",
    "*.p12",
    "*.pfx",
    "id_rsa*",
    "id_ed25519*",
    "*credentials*",
    "*secret*",
];

static SECRET_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    SECRET_GLOBS
        .iter()
        .filter_map(|g| Pattern::new(g).ok())
        .collect()
});

/// True when the file name of `path` looks like it holds credentials.
pub fn looks_like_secret(path: &str) -> bool {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    let opts = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    SECRET_PATTERNS
        .iter()
        .any(|p| p.matches_with(name, opts))
}

// ─── Worktrees ────────────────────────────────────────────────────

/// Suffix of the directory that holds a repository's extra checkouts.
pub const WORKTREE_DIR_SUFFIX: &str = "-worktree";

/// A checkout following the `<repo>-worktree/<name>` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeLocation {
    pub repo_root: PathBuf,
    pub worktree: PathBuf,
}

/// Match `path` against `*-worktree/*`; `/src/app-worktree/feat/sub` yields
/// repo `/src/app` and worktree `/src/app-worktree/feat`.
pub fn worktree_location(path: &str) -> Option<WorktreeLocation> {
    let path = Path::new(path);
    let components: Vec<_> = path.components().collect();
    for (i, component) in components.iter().enumerate() {
        let name = component.as_os_str().to_str()?;
        let Some(repo_name) = name.strip_suffix(WORKTREE_DIR_SUFFIX) else {
            continue;
        };
        if repo_name.is_empty() || i + 1 >= components.len() {
            continue;
        }
        let parent: PathBuf = components[..i].iter().collect();
        let container: PathBuf = components[..=i].iter().collect();
        return Some(WorktreeLocation {
            repo_root: parent.join(repo_name),
            worktree: container.join(components[i + 1]),
        });
    }
    None
}

/// Paths listed by `git worktree list --porcelain`.
pub fn parse_worktree_list(output: &str) -> Vec<PathBuf> {
    output
        .lines()
        .filter_map(|l| l.strip_prefix("worktree "))
        .map(PathBuf::from)
        .collect()
}
