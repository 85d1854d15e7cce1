//! Pane record as read from tmux, plus status and age helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Status ───────────────────────────────────────────────────────

/// Value of the `@pilot-status` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneStatus {
    Working,
    Watching,
    Waiting,
    Paused,
    Done,
}

impl PaneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Watching => "watching",
            Self::Waiting => "waiting",
            Self::Paused => "paused",
            Self::Done => "done",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Working => "●",
            Self::Watching => "◎",
            Self::Waiting => "◷",
            Self::Paused => "‖",
            Self::Done => "✓",
        }
    }
}

impl fmt::Display for PaneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Ok(Self::Working),
            "watching" => Ok(Self::Watching),
            "waiting" => Ok(Self::Waiting),
            "paused" => Ok(Self::Paused),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Icon shown when the needs-help flag is set; outranks any status.
pub const NEEDS_HELP_ICON: &str = "!";

// ─── Pane record ──────────────────────────────────────────────────

/// One tmux pane joined with its pilot tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaneRecord {
    /// `session:window.pane`
    pub target: String,
    pub session_name: String,
    pub window_index: String,
    pub window_name: String,
    pub pane_title: String,
    pub current_cmd: String,
    /// Shell pid (`#{pane_pid}`).
    pub pane_pid: Option<u32>,
    /// Epoch seconds of the last window activity.
    pub last_activity: Option<i64>,
    /// `#{pane_current_path}`, before any workdir override.
    pub current_path: String,
    pub workdir: Option<String>,
    pub agent: Option<String>,
    pub description: Option<String>,
    pub status: Option<PaneStatus>,
    pub needs_help: bool,
    pub host: Option<String>,
    pub mode: Option<String>,
    pub owner: Option<String>,
    pub tier: Option<String>,
    pub trust: Option<String>,
}

impl PaneRecord {
    /// Directory to show and act on: the workdir tag wins over the process cwd.
    pub fn effective_path(&self) -> &str {
        self.workdir.as_deref().unwrap_or(&self.current_path)
    }

    pub fn status_icon(&self) -> &'static str {
        if self.needs_help {
            NEEDS_HELP_ICON
        } else {
            self.status.map(PaneStatus::icon).unwrap_or(" ")
        }
    }

    /// `index:name` label for the window column.
    pub fn window_label(&self) -> String {
        format!("{}:{}", self.window_index, self.window_name)
    }
}

// ─── Age ──────────────────────────────────────────────────────────

/// Bucketed age for an elapsed number of seconds.
pub fn format_age(elapsed_secs: i64) -> String {
    let s = elapsed_secs.max(0);
    if s < 60 {
        "active".to_string()
    } else if s < 3600 {
        format!("{}m ago", s / 60)
    } else if s < 86400 {
        format!("{}h ago", s / 3600)
    } else {
        format!("{}d ago", s / 86400)
    }
}

/// Compact duration for process uptime, e.g. `3d4h`, `2h13m`, `5m`, `42s`.
pub fn format_uptime(secs: i64) -> String {
    let s = secs.max(0);
    let (d, h, m) = (s / 86400, (s % 86400) / 3600, (s % 3600) / 60);
    if d > 0 {
        format!("{d}d{h}h")
    } else if h > 0 {
        format!("{h}h{m}m")
    } else if m > 0 {
        format!("{m}m")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets() {
        assert_eq!(format_age(0), "active");
        assert_eq!(format_age(59), "active");
        assert_eq!(format_age(60), "1m ago");
        assert_eq!(format_age(3599), "59m ago");
        assert_eq!(format_age(7200), "2h ago");
        assert_eq!(format_age(86400 * 3), "3d ago");
        assert_eq!(format_age(-5), "active");
    }

    #[test]
    fn uptime_formats() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(300), "5m");
        assert_eq!(format_uptime(2 * 3600 + 13 * 60), "2h13m");
        assert_eq!(format_uptime(3 * 86400 + 4 * 3600), "3d4h");
    }

    #[test]
    fn workdir_overrides_current_path() {
        let mut pane = PaneRecord {
            current_path: "/repo".into(),
            ..Default::default()
        };
        assert_eq!(pane.effective_path(), "/repo");
        pane.workdir = Some("/repo-worktree/feat".into());
        assert_eq!(pane.effective_path(), "/repo-worktree/feat");
    }

    #[test]
    fn needs_help_outranks_status() {
        let mut pane = PaneRecord {
            status: Some(PaneStatus::Working),
            ..Default::default()
        };
        assert_eq!(pane.status_icon(), "●");
        pane.needs_help = true;
        assert_eq!(pane.status_icon(), NEEDS_HELP_ICON);
        pane.status = None;
        pane.needs_help = false;
        assert_eq!(pane.status_icon(), " ");
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in ["working", "watching", "waiting", "paused", "done"] {
            assert_eq!(s.parse::<PaneStatus>().map(|p| p.as_str()), Ok(s));
        }
        assert!("busy".parse::<PaneStatus>().is_err());
    }
}
