//! Launch command construction for the three execution modes, and the
//! validation that happens before any session is created.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::agent::Agent;
use crate::error::PilotError;

/// Directories prepended to PATH: panes started by tmux or over ssh do not
/// read the operator's interactive shell rc files.
pub const PATH_PREFIX: &str = r#"export PATH="$HOME/.local/bin:$HOME/.cargo/bin:$HOME/bin:/opt/homebrew/bin:/usr/local/bin:$PATH""#;

/// Keeps the pane alive after the agent exits so it can be resumed in place.
const KEEP_SHELL: &str = r#"exec "${SHELL:-/bin/sh}""#;

// ─── Execution mode ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecMode {
    Local,
    /// Local pane running an interactive ssh session to the host.
    LocalSsh,
    /// Session created on the remote host's tmux server.
    RemoteTmux,
}

impl ExecMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::LocalSsh => "local-ssh",
            Self::RemoteTmux => "remote-tmux",
        }
    }

    pub fn is_remote(self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecMode {
    type Err = PilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "local-ssh" => Ok(Self::LocalSsh),
            "remote-tmux" => Ok(Self::RemoteTmux),
            other => Err(PilotError::InvalidMode(other.to_string())),
        }
    }
}

// ─── Request validation ───────────────────────────────────────────

/// Raw spawn arguments as they arrive from the CLI or the deck.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnArgs {
    pub agent: Option<String>,
    pub prompt: Option<String>,
    pub directory: Option<String>,
    pub session_name: Option<String>,
    pub host: Option<String>,
    pub mode: Option<String>,
    pub owner: Option<String>,
    pub tier: Option<String>,
    pub trust: Option<String>,
}

/// Spawn arguments after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPlan {
    pub agent: Agent,
    pub prompt: String,
    pub directory: String,
    pub session_name: Option<String>,
    /// `Some` exactly when `mode` is remote.
    pub host: Option<String>,
    pub mode: ExecMode,
    pub owner: Option<String>,
    pub tier: Option<String>,
    pub trust: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SpawnArgs {
    /// Check every precondition. Pure: nothing has been touched when this
    /// returns an error.
    pub fn validate(self) -> Result<SpawnPlan, PilotError> {
        let agent: Agent = non_empty(self.agent)
            .ok_or(PilotError::MissingArgument("agent"))?
            .parse()?;
        let prompt = non_empty(self.prompt).ok_or(PilotError::MissingArgument("prompt"))?;
        let directory =
            non_empty(self.directory).ok_or(PilotError::MissingArgument("directory"))?;
        let host = non_empty(self.host);
        // ssh would read a leading dash as an option.
        if let Some(h) = host.as_deref().filter(|h| h.starts_with('-')) {
            return Err(PilotError::InvalidHost(h.to_string()));
        }
        let mode = match (non_empty(self.mode), &host) {
            (None, None) => ExecMode::Local,
            (None, Some(_)) => ExecMode::LocalSsh,
            (Some(raw), host) => {
                let mode: ExecMode = raw.parse()?;
                if host.is_none() {
                    return Err(PilotError::ModeRequiresHost(mode.as_str()));
                }
                mode
            }
        };
        Ok(SpawnPlan {
            agent,
            prompt,
            directory,
            session_name: non_empty(self.session_name),
            host,
            mode,
            owner: non_empty(self.owner),
            tier: non_empty(self.tier),
            trust: non_empty(self.trust),
        })
    }
}

// ─── Command strings ──────────────────────────────────────────────

/// Shell command line run inside the agent's pane.
pub fn agent_shell_command(agent: Agent, prompt: &str) -> String {
    let argv = shell_words::join(agent.launch_args(prompt));
    format!("{PATH_PREFIX}; {argv}; {KEEP_SHELL}")
}

/// Command for a local pane that hops to `host` and runs the agent there.
pub fn local_ssh_command(host: &str, directory: &str, agent: Agent, prompt: &str) -> String {
    let remote = format!(
        "cd {} && {}",
        quote_remote_path(directory),
        agent_shell_command(agent, prompt)
    );
    shell_words::join(["ssh", "-t", host, remote.as_str()])
}

/// Quote a remote path while keeping a leading `~/` expandable.
pub fn quote_remote_path(path: &str) -> String {
    if path == "~" {
        return "~".to_string();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("~/{}", shell_words::quote(rest)),
        None => shell_words::quote(path).into_owned(),
    }
}
