//! Preview renderer: an 8-line header about the highlighted pane followed by
//! the tail of its scrollback. Every lookup degrades to a blank field.

use std::path::Path;

use pilot_core::deck::lookup_row;
use pilot_core::pane::{NEEDS_HELP_ICON, PaneStatus, format_age, format_uptime};
use pilot_core::tags;
use pilot_core::vcs::GitStatus;
use pilot_tmux::pane_info::split_fields;
use pilot_tmux::{TmuxCommandRunner, capture_pane, display, process_start_time};

use crate::config::Config;
use crate::vcs::{self, GitExecutor, GitRunner};

pub const HEADER_LINES: usize = 8;

const PREVIEW_FORMAT: &str = "#{pane_title}\x1f#{window_name}\x1f#{window_activity}\x1f#{pane_current_command}\x1f#{pane_pid}\x1f#{@pilot-agent}\x1f#{@pilot-desc}\x1f#{@pilot-status}\x1f#{@pilot-needs-help}\x1f#{@pilot-host}\x1f#{@pilot-mode}\x1f#{@pilot-owner}";
const PREVIEW_FIELDS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewInfo {
    pub target: String,
    pub workdir: String,
    pub title: String,
    pub window: String,
    pub command: String,
    pub pid: Option<u32>,
    pub agent: String,
    pub desc: String,
    pub status: Option<PaneStatus>,
    pub needs_help: bool,
    pub host: String,
    pub mode: String,
    pub owner: String,
    pub age: String,
    pub uptime: String,
    pub git: Option<GitStatus>,
}

impl PreviewInfo {
    /// Fill the tmux-derived fields from a `PREVIEW_FORMAT` expansion.
    fn apply_display(&mut self, raw: &str, now: i64) -> Option<u32> {
        let mut f = split_fields(raw);
        f.resize(PREVIEW_FIELDS, String::new());
        self.title = f[0].clone();
        self.window = f[1].clone();
        self.age = f[2]
            .trim()
            .parse::<i64>()
            .map(|t| format_age(now - t))
            .unwrap_or_default();
        self.command = f[3].clone();
        self.pid = f[4].trim().parse().ok();
        self.agent = f[5].clone();
        self.desc = f[6].clone();
        self.status = f[7].parse().ok();
        self.needs_help = tags::flag_is_set(&f[8]);
        self.host = f[9].clone();
        self.mode = f[10].clone();
        self.owner = f[11].clone();
        self.pid
    }
}

/// Collect everything shown in the header. `start_time` maps a pid to its
/// start in epoch seconds.
pub fn gather(
    tmux: &impl TmuxCommandRunner,
    git: &impl GitRunner,
    target: &str,
    workdir: &str,
    now: i64,
    start_time: impl Fn(u32) -> Option<i64>,
) -> PreviewInfo {
    let mut info = PreviewInfo {
        target: target.to_string(),
        workdir: workdir.to_string(),
        ..Default::default()
    };

    match display(tmux, target, PREVIEW_FORMAT) {
        Ok(raw) => {
            if let Some(started) = info.apply_display(&raw, now).and_then(&start_time) {
                info.uptime = format_uptime(now - started);
            }
        }
        Err(e) => tracing::debug!(pane = target, error = %e, "display-message failed"),
    }

    if info.host.is_empty() && !workdir.is_empty() && Path::new(workdir).is_dir() {
        info.git = vcs::status(git, Path::new(workdir));
    }
    info
}

/// The fixed header block, always exactly [`HEADER_LINES`] lines.
pub fn format_header(info: &PreviewInfo) -> Vec<String> {
    let icon = if info.needs_help {
        NEEDS_HELP_ICON
    } else {
        info.status.map(PaneStatus::icon).unwrap_or(" ")
    };
    let status = info.status.map(|s| s.as_str()).unwrap_or("");
    let help = if info.needs_help { "  NEEDS HELP" } else { "" };
    let pid = info.pid.map(|p| p.to_string()).unwrap_or_default();
    let git = info.git.as_ref().map(GitStatus::summary).unwrap_or_default();
    let host = if info.host.is_empty() {
        String::new()
    } else {
        format!("{} ({})", info.host, info.mode)
    };

    vec![
        format!("{icon} {}  {}", info.target, info.window),
        format!("title   {}", info.title),
        format!("agent   {:<12} status {status}{help}", info.agent),
        format!("desc    {}", info.desc),
        format!("dir     {}", info.workdir),
        format!("git     {git}"),
        format!(
            "age     {:<12} uptime {:<8} cmd {} {pid}",
            info.age, info.uptime, info.command
        ),
        format!("host    {host:<24} owner {}", info.owner),
    ]
    .into_iter()
    .map(|l| l.trim_end().to_string())
    .collect()
}

/// Full preview text for row `index` of the row index file contents.
pub fn render(
    tmux: &impl TmuxCommandRunner,
    git: &impl GitRunner,
    index_file: &str,
    index: usize,
    lines: u32,
    now: i64,
    start_time: impl Fn(u32) -> Option<i64>,
) -> String {
    let Some((target, workdir)) = lookup_row(index_file, index) else {
        return format!("no row {index}");
    };
    let info = gather(tmux, git, &target, &workdir, now, start_time);
    let mut out = format_header(&info);
    match capture_pane(tmux, &target, lines, true) {
        Ok(captured) => {
            let skip = captured.len().saturating_sub(lines as usize);
            out.extend(captured.into_iter().skip(skip));
        }
        Err(e) => tracing::debug!(pane = %target, error = %e, "capture failed"),
    }
    out.join("\n")
}

/// `pilot preview INDEX --data FILE`.
pub fn cmd_preview(config: &Config, index: usize, data: &str) -> anyhow::Result<()> {
    let index_file = std::fs::read_to_string(data).unwrap_or_default();
    let now = chrono::Utc::now().timestamp();
    let text = render(
        &config.tmux(),
        &GitExecutor,
        &index_file,
        index,
        config.preview_lines,
        now,
        |pid| process_start_time(pid).map(|t| t.timestamp()),
    );
    println!("{text}");
    Ok(())
}
