//! `pilot` / `pilot deck`: the interactive agent deck.
//!
//! Each round refreshes (or reuses) the listing, writes the row index file,
//! hands the rows to the selector and runs the action bound to the key that
//! ended the selection. Rows are mapped back to panes through the index file
//! only.

use std::path::Path;

use pilot_core::Agent;
use pilot_core::deck::{Listing, lookup_row};
use pilot_core::launch::SpawnArgs;
use pilot_core::naming::suggest_session_name;
use pilot_core::proctree::ProcessTable;
use pilot_core::tags;
use pilot_tmux::{
    TmuxCommandRunner, display, list_panes, scan_process_table, select_target, send_keys,
    set_pane_option, unset_pane_option,
};

use crate::cmd_control::{self, PaneFacts, pane_facts};
use crate::config::Config;
use crate::hosts::HostRegistry;
use crate::selector::{DeckView, Fzf, Selector};
use crate::spawn::{SessionServer, spawn, with_default_owner};
use crate::vcs::{self, GitExecutor, GitRunner};

/// Columns lost to the fzf pointer and margins.
const SELECTOR_MARGIN: usize = 4;
const FALLBACK_WIDTH: usize = 120;

const KEY_LEGEND: &str = "enter attach  ^d diff  ^g commit  ^x kill  ^p pause  ^u resume  ^n new  ^e desc  ^y approve  ^o vcs  ^r reload";

// ─── Actions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckAction {
    Attach,
    Diff,
    Commit,
    Kill,
    Pause,
    Resume,
    Spawn,
    EditDescription,
    Approve,
    VcsView,
}

pub const EXPECT_KEYS: &[&str] = &[
    "ctrl-d", "ctrl-g", "ctrl-x", "ctrl-p", "ctrl-u", "ctrl-n", "ctrl-e", "ctrl-y", "ctrl-o",
];

impl DeckAction {
    /// Enter arrives as an empty key.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "" | "enter" => Self::Attach,
            "ctrl-d" => Self::Diff,
            "ctrl-g" => Self::Commit,
            "ctrl-x" => Self::Kill,
            "ctrl-p" => Self::Pause,
            "ctrl-u" => Self::Resume,
            "ctrl-n" => Self::Spawn,
            "ctrl-e" => Self::EditDescription,
            "ctrl-y" => Self::Approve,
            "ctrl-o" => Self::VcsView,
            _ => return None,
        })
    }
}

/// What the loop does after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Show the message, keep the current listing.
    Stay(String),
    /// Show the message, refresh the listing.
    Refresh(String),
    Exit,
}

/// Everything an action may touch.
pub struct Deck<'a, T, G, S> {
    pub tmux: T,
    pub git: G,
    pub selector: S,
    pub hosts: HostRegistry,
    pub config: &'a Config,
}

impl<T, G, S> Deck<'_, T, G, S>
where
    T: TmuxCommandRunner,
    G: GitRunner,
    S: Selector,
{
    /// Run `action` on `row` (`(target, workdir)` from the index file). Never
    /// fails: every error becomes the one-line message of the next round.
    pub fn perform(&self, action: DeckAction, row: Option<(String, String)>) -> Step {
        let Some((target, workdir)) = row else {
            return match action {
                DeckAction::Spawn => self.spawn_interactive(None),
                _ => Step::Stay("no pane selected".into()),
            };
        };
        match self.perform_on(action, &target, &workdir) {
            Ok(step) => step,
            Err(e) => {
                tracing::warn!(pane = %target, ?action, error = %e, "deck action failed");
                Step::Stay(format!("{target}: {e:#}"))
            }
        }
    }

    fn perform_on(
        &self,
        action: DeckAction,
        target: &str,
        workdir: &str,
    ) -> anyhow::Result<Step> {
        match action {
            DeckAction::Attach => {
                select_target(&self.tmux, target)?;
                Ok(Step::Exit)
            }
            DeckAction::Diff => {
                let dir = self.local_dir(target, workdir)?;
                vcs::show_diff(Path::new(&dir))?;
                Ok(Step::Stay(String::new()))
            }
            DeckAction::Commit => {
                let dir = self.local_dir(target, workdir)?;
                let report = vcs::commit_wip(&self.git, Path::new(&dir))?;
                Ok(Step::Stay(report.summary()))
            }
            DeckAction::Kill => {
                let facts = self.facts(target, workdir);
                let msg = cmd_control::kill(
                    &self.tmux,
                    &self.git,
                    target,
                    &facts.workdir,
                    facts.host.is_some(),
                )?;
                Ok(Step::Refresh(msg))
            }
            DeckAction::Pause => Ok(Step::Stay(cmd_control::pause(&self.tmux, target)?)),
            DeckAction::Resume => Ok(Step::Stay(cmd_control::resume(&self.tmux, target)?)),
            DeckAction::EditDescription => self.edit_description(target),
            DeckAction::Approve => {
                send_keys(&self.tmux, target, "Enter", None)?;
                Ok(Step::Stay(format!("approved {target}")))
            }
            DeckAction::VcsView => {
                let dir = self.local_dir(target, workdir)?;
                vcs::open_status_view(&self.config.vcs_status_cmd, Path::new(&dir))?;
                Ok(Step::Stay(String::new()))
            }
            DeckAction::Spawn => Ok(self.spawn_interactive(Some(workdir.to_string()))),
        }
    }

    /// Fresh facts, falling back to the row's workdir if the pane cannot be
    /// read.
    fn facts(&self, target: &str, workdir: &str) -> PaneFacts {
        pane_facts(&self.tmux, target).unwrap_or_else(|e| {
            tracing::debug!(pane = target, error = %e, "using row workdir");
            PaneFacts {
                workdir: workdir.to_string(),
                ..Default::default()
            }
        })
    }

    /// Working directory for git actions; remote panes have none here.
    fn local_dir(&self, target: &str, workdir: &str) -> anyhow::Result<String> {
        let facts = self.facts(target, workdir);
        if let Some(host) = facts.host {
            anyhow::bail!("runs on {host}; git actions are local only");
        }
        if facts.workdir.is_empty() {
            anyhow::bail!("no working directory");
        }
        Ok(facts.workdir)
    }

    fn edit_description(&self, target: &str) -> anyhow::Result<Step> {
        let current = display(&self.tmux, target, &format!("#{{{}}}", tags::DESC))
            .unwrap_or_default();
        let Some(text) = self.selector.input("description", current.trim())? else {
            return Ok(Step::Stay(String::new()));
        };
        let desc = tags::description_from(&text);
        if desc.is_empty() {
            unset_pane_option(&self.tmux, target, tags::DESC)?;
            Ok(Step::Stay(format!("cleared description of {target}")))
        } else {
            set_pane_option(&self.tmux, target, tags::DESC, &desc)?;
            Ok(Step::Stay(format!("{target}: {desc}")))
        }
    }

    fn spawn_interactive(&self, default_dir: Option<String>) -> Step {
        let default_dir = default_dir
            .filter(|d| !d.is_empty())
            .or_else(|| std::env::current_dir().ok().map(|d| d.to_string_lossy().into_owned()))
            .unwrap_or_default();
        let args = match prompt_spawn(&self.selector, self.hosts.known_hosts(), &default_dir) {
            Ok(Some(args)) => args,
            Ok(None) => return Step::Stay("spawn cancelled".into()),
            Err(e) => return Step::Stay(format!("spawn: {e:#}")),
        };
        let args = with_default_owner(args, std::env::var("TMUX_PANE").ok());
        match spawn(args, |plan| SessionServer::for_plan(plan, self.config), &self.hosts) {
            Ok(outcome) => {
                let msg = match outcome.attach_hint() {
                    Some(hint) => format!("spawned {} (attach: {hint})", outcome.session),
                    None => format!("spawned {}", outcome.session),
                };
                Step::Refresh(msg)
            }
            Err(e) => Step::Stay(format!("spawn failed: {e}")),
        }
    }
}

/// Ask for the spawn fields one at a time. `None` as soon as any prompt is
/// cancelled.
pub fn prompt_spawn(
    selector: &impl Selector,
    known_hosts: Vec<String>,
    default_dir: &str,
) -> anyhow::Result<Option<SpawnArgs>> {
    let agents: Vec<String> = Agent::ALL.iter().map(|a| a.as_str().to_string()).collect();
    let Some(agent) = selector.choose("agent", &agents, false)? else {
        return Ok(None);
    };
    let Some(prompt) = selector.input("prompt", "")?.filter(|p| !p.trim().is_empty()) else {
        return Ok(None);
    };
    let Some(directory) = selector.input("directory", default_dir)? else {
        return Ok(None);
    };

    let hosts: Vec<String> = std::iter::once("local".to_string())
        .chain(known_hosts)
        .collect();
    let Some(host) = selector.choose("host", &hosts, true)? else {
        return Ok(None);
    };
    let host = Some(host).filter(|h| h != "local");
    let mode = match host {
        Some(_) => {
            let modes = ["local-ssh".to_string(), "remote-tmux".to_string()];
            let Some(mode) = selector.choose("mode", &modes, false)? else {
                return Ok(None);
            };
            Some(mode)
        }
        None => None,
    };

    let suggestion = agent
        .parse::<Agent>()
        .ok()
        .and_then(|a| suggest_session_name(&prompt, a))
        .unwrap_or_default();
    let Some(session_name) = selector.input("session", &suggestion)? else {
        return Ok(None);
    };

    Ok(Some(SpawnArgs {
        agent: Some(agent),
        prompt: Some(prompt),
        directory: Some(directory),
        session_name: Some(session_name),
        host,
        mode,
        ..Default::default()
    }))
}

// ─── Listing ──────────────────────────────────────────────────────

/// One refresh: every pane plus one process snapshot.
pub fn refresh(tmux: &impl TmuxCommandRunner) -> anyhow::Result<Listing> {
    let panes = match list_panes(tmux) {
        Ok(panes) => panes,
        Err(e) if e.is_no_server() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let processes = scan_process_table();
    let width = crossterm::terminal::size()
        .map(|(w, _)| usize::from(w))
        .unwrap_or(FALLBACK_WIDTH)
        .saturating_sub(SELECTOR_MARGIN);
    Ok(Listing::build(panes, &processes, chrono::Utc::now().timestamp(), width))
}

/// Refresh, or keep `previous` when tmux cannot be listed. The failure is
/// appended to `message` so the deck keeps running.
pub fn refresh_or_keep(
    tmux: &impl TmuxCommandRunner,
    previous: Listing,
    message: &mut String,
) -> Listing {
    match refresh(tmux) {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!(error = %e, "refresh failed, keeping previous listing");
            if !message.is_empty() {
                message.push_str("; ");
            }
            message.push_str(&format!("refresh failed: {e:#}"));
            previous
        }
    }
}

/// Status message, key legend and column header.
pub fn deck_header(listing: &Listing, message: &str) -> String {
    let mut lines = Vec::new();
    if !message.is_empty() {
        lines.push(message.to_string());
    }
    if listing.is_empty() {
        lines.push("no tmux panes; ctrl-n spawns an agent".to_string());
    }
    lines.push(KEY_LEGEND.to_string());
    lines.push(listing.header());
    lines.join("\n")
}

fn self_command(exe: &Path, args: &[&str]) -> String {
    let exe = exe.to_string_lossy();
    let mut words = vec![exe.as_ref()];
    words.extend_from_slice(args);
    shell_words::join(words)
}

/// Selector `{1}` placeholders must stay unquoted.
fn preview_command(exe: &Path, data: &str) -> String {
    let exe = shell_words::quote(&exe.to_string_lossy()).into_owned();
    format!("{exe} preview {{1}} --data {}", shell_words::quote(data))
}

// ─── Commands ─────────────────────────────────────────────────────

pub fn cmd_deck(config: &Config) -> anyhow::Result<()> {
    let index = tempfile::NamedTempFile::new()?;
    let data = index.path().to_string_lossy().into_owned();
    let exe = std::env::current_exe()?;
    let preview_cmd = preview_command(&exe, &data);
    let reload_cmd = self_command(&exe, &["rows", "--data", &data]);

    let deck = Deck {
        tmux: config.tmux(),
        git: GitExecutor,
        selector: Fzf::new(config),
        hosts: HostRegistry::new(&config.hosts_file, &config.ssh_config),
        config,
    };

    let mut message = String::new();
    let empty = Listing::build(Vec::new(), &ProcessTable::default(), 0, FALLBACK_WIDTH);
    let mut listing = refresh_or_keep(&deck.tmux, empty, &mut message);
    loop {
        std::fs::write(index.path(), listing.index_file())?;
        let lines = listing.selector_lines();
        let header = deck_header(&listing, &message);
        let view = DeckView {
            lines: &lines,
            header: &header,
            preview_cmd: &preview_cmd,
            reload_cmd: &reload_cmd,
            expect: EXPECT_KEYS,
        };
        let Some(pick) = deck.selector.pick(&view)? else {
            return Ok(());
        };

        let Some(action) = DeckAction::from_key(&pick.key) else {
            message = format!("unbound key {}", pick.key);
            continue;
        };
        // A reload inside the selector may have rewritten the file.
        let rows = std::fs::read_to_string(index.path()).unwrap_or_default();
        let row = pick.index.and_then(|i| lookup_row(&rows, i));
        tracing::debug!(?action, ?row, "deck action");

        match deck.perform(action, row) {
            Step::Exit => return Ok(()),
            Step::Stay(msg) => message = msg,
            Step::Refresh(msg) => {
                message = msg;
                listing = refresh_or_keep(&deck.tmux, listing, &mut message);
            }
        }
    }
}

/// `pilot rows --data FILE`: rewrite the row index and print fresh rows.
pub fn cmd_rows(config: &Config, data: &str) -> anyhow::Result<()> {
    let listing = refresh(&config.tmux())?;
    std::fs::write(data, listing.index_file())?;
    print!("{}", listing.selector_lines());
    Ok(())
}
