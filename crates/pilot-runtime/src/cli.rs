//! CLI definition using clap derive.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pilot", about = "Launch and manage AI coding agents in tmux", version)]
pub struct Cli {
    /// tmux binary
    #[arg(long, global = true, env = "PILOT_TMUX_BIN", default_value = "tmux")]
    pub tmux_bin: String,

    /// fzf binary used by the deck
    #[arg(long, global = true, env = "PILOT_FZF_BIN", default_value = "fzf")]
    pub fzf_bin: String,

    /// Known-hosts cache (default: $XDG_CACHE_HOME/tmux-pilot/hosts)
    #[arg(long, global = true, env = "PILOT_HOSTS_FILE")]
    pub hosts_file: Option<String>,

    /// ssh client config scanned for Host entries (default: ~/.ssh/config)
    #[arg(long, global = true, env = "PILOT_SSH_CONFIG")]
    pub ssh_config: Option<String>,

    /// Editor command showing VCS status, run in the pane's directory
    #[arg(long, global = true, env = "PILOT_VCS_STATUS_CMD", default_value = "nvim -c Git")]
    pub vcs_status_cmd: String,

    /// Scrollback lines shown under the preview header
    #[arg(long, global = true, env = "PILOT_PREVIEW_LINES", default_value_t = 40)]
    pub preview_lines: u32,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive agent deck (default)
    Deck,
    /// Print deck rows and rewrite the row index file (fzf reload)
    Rows(DataOpts),
    /// Render the preview for one deck row
    Preview(PreviewOpts),
    /// Spawn an agent in a new tmux session
    Spawn(SpawnOpts),
    /// List agent panes
    Ls(LsOpts),
    /// Quit the agent in a pane, keeping its shell
    Pause(TargetOpts),
    /// Relaunch a paused agent in its pane
    Resume(TargetOpts),
    /// Kill a pane and remove its worktree
    Kill(TargetOpts),
    /// Print recent pane output
    Capture(CaptureOpts),
    /// Send a key name or text to a pane
    Send(SendOpts),
    /// Scan agent panes for permission prompts and lifecycle events
    Monitor(MonitorOpts),
    /// Move every pane owned by OLD to NEW
    TransferOwnership(TransferOpts),
    /// Set status tags on the current pane
    Tag(TagOpts),
    /// Handle a Claude hook event (JSON on stdin)
    Hook(HookOpts),
    /// Install `pilot hook` into Claude settings.json
    SetupHooks(SetupHooksOpts),
    /// Print known remote hosts
    Hosts,
}

#[derive(Args)]
pub struct DataOpts {
    /// Row index file shared with the running deck
    #[arg(long)]
    pub data: String,
}

#[derive(Args)]
pub struct PreviewOpts {
    /// Row index as printed in the first selector field
    pub index: usize,

    #[arg(long)]
    pub data: String,
}

#[derive(Args, Default)]
pub struct SpawnOpts {
    #[arg(long, short)]
    pub agent: Option<String>,

    #[arg(long, short)]
    pub prompt: Option<String>,

    #[arg(long, short)]
    pub directory: Option<String>,

    /// Session name override
    #[arg(long, short)]
    pub session: Option<String>,

    /// Remote host
    #[arg(long)]
    pub host: Option<String>,

    /// local-ssh | remote-tmux
    #[arg(long)]
    pub mode: Option<String>,

    /// Owning pane (default: $TMUX_PANE)
    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub tier: Option<String>,

    #[arg(long)]
    pub trust: Option<String>,
}

#[derive(Args, Default)]
pub struct LsOpts {
    /// Include panes with no agent
    #[arg(long)]
    pub all: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TargetOpts {
    /// tmux target (session:window.pane or %id)
    pub target: String,
}

#[derive(Args)]
pub struct CaptureOpts {
    pub target: String,

    #[arg(long, short = 'n', default_value_t = 20)]
    pub lines: u32,
}

#[derive(Args)]
pub struct SendOpts {
    pub target: String,

    /// Key name (Enter, C-c, ...) or text
    pub keys: String,
}

#[derive(Args)]
pub struct MonitorOpts {
    /// Scrollback lines inspected per pane
    #[arg(long, default_value_t = 50)]
    pub lines: u32,
}

#[derive(Args)]
pub struct TransferOpts {
    pub old_owner: String,
    pub new_owner: String,
}

#[derive(Args)]
pub struct TagOpts {
    /// Pane to tag (default: $TMUX_PANE)
    #[arg(long, short)]
    pub target: Option<String>,

    /// working | watching | waiting | paused | done
    #[arg(long)]
    pub status: Option<String>,

    /// Flag the pane as needing help
    #[arg(long, conflicts_with = "clear_help")]
    pub needs_help: bool,

    #[arg(long)]
    pub clear_help: bool,

    #[arg(long)]
    pub workdir: Option<String>,

    #[arg(long)]
    pub desc: Option<String>,
}

#[derive(Args)]
pub struct HookOpts {
    /// Hook event name (default: `hook_event_name` from the payload)
    pub event: Option<String>,

    #[arg(long, short)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct SetupHooksOpts {
    /// Settings scope: "user" (~/.claude) or "project" (./.claude)
    #[arg(long, default_value = "user")]
    pub scope: String,

    /// pilot binary invoked by the hooks (default: this executable)
    #[arg(long)]
    pub pilot_bin: Option<String>,
}
