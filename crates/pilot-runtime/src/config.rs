//! Resolved runtime settings: CLI flags with environment fallbacks and the
//! filesystem defaults filled in.

use std::path::{Path, PathBuf};
use std::process::Command;

use pilot_tmux::TmuxExecutor;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmux_bin: String,
    pub fzf_bin: String,
    pub hosts_file: PathBuf,
    pub ssh_config: PathBuf,
    pub vcs_status_cmd: String,
    pub preview_lines: u32,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let home = std::env::var("HOME").unwrap_or_default();
        let cache_home = std::env::var("XDG_CACHE_HOME").ok().filter(|v| !v.is_empty());
        Self {
            tmux_bin: cli.tmux_bin.clone(),
            fzf_bin: cli.fzf_bin.clone(),
            hosts_file: cli
                .hosts_file
                .as_deref()
                .map(|p| expand_home(p, &home))
                .unwrap_or_else(|| default_hosts_file(cache_home.as_deref(), &home)),
            ssh_config: cli
                .ssh_config
                .as_deref()
                .map(|p| expand_home(p, &home))
                .unwrap_or_else(|| Path::new(&home).join(".ssh/config")),
            vcs_status_cmd: cli.vcs_status_cmd.clone(),
            preview_lines: cli.preview_lines,
        }
    }

    pub fn tmux(&self) -> TmuxExecutor {
        TmuxExecutor::new(&self.tmux_bin)
    }

    /// Hand the resolved settings to child `pilot` processes started by fzf
    /// (preview, reload), which do not see our command line.
    pub fn export_to(&self, cmd: &mut Command) {
        cmd.env("PILOT_TMUX_BIN", &self.tmux_bin)
            .env("PILOT_FZF_BIN", &self.fzf_bin)
            .env("PILOT_HOSTS_FILE", &self.hosts_file)
            .env("PILOT_SSH_CONFIG", &self.ssh_config)
            .env("PILOT_VCS_STATUS_CMD", &self.vcs_status_cmd)
            .env("PILOT_PREVIEW_LINES", self.preview_lines.to_string());
    }
}

fn default_hosts_file(cache_home: Option<&str>, home: &str) -> PathBuf {
    let base = match cache_home {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(home).join(".cache"),
    };
    base.join("tmux-pilot").join("hosts")
}

/// Expand a leading `~` against `home`.
pub fn expand_home(path: &str, home: &str) -> PathBuf {
    if path == "~" {
        return PathBuf::from(home);
    }
    match path.strip_prefix("~/") {
        Some(rest) if !home.is_empty() => Path::new(home).join(rest),
        _ => PathBuf::from(path),
    }
}
