//! `pilot ls`: flat listing of agent panes, newest activity first.

use pilot_core::deck::{DeckEntry, Listing, short_path};
use pilot_core::layout::fit;
use pilot_core::proctree::{ProcessTable, format_cpu, format_mem};
use pilot_core::{Agent, PaneRecord};
use pilot_tmux::{TmuxCommandRunner, list_panes, scan_process_table};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LsEntry {
    pub target: String,
    pub agent: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub dir: String,
    pub age: String,
    pub cpu: Option<f64>,
    pub mem_kb: Option<u64>,
    pub host: Option<String>,
    pub owner: Option<String>,
}

/// The agent tag, or the agent recognised from the foreground command.
fn agent_of(pane: &PaneRecord) -> Option<String> {
    pane.agent
        .clone()
        .filter(|a| !a.is_empty())
        .or_else(|| Agent::from_command(&pane.current_cmd).map(|a| a.as_str().to_string()))
}

impl LsEntry {
    fn from_entry(entry: DeckEntry) -> Self {
        let agent = agent_of(&entry.pane);
        let dir = entry.workdir().to_string();
        let pane = entry.pane;
        Self {
            target: pane.target,
            agent,
            description: pane.description,
            status: pane.status.map(|s| s.as_str().to_string()),
            dir,
            age: entry.age,
            cpu: entry.usage.map(|u| u.cpu),
            mem_kb: entry.usage.map(|u| u.rss_kb),
            host: pane.host,
            owner: pane.owner,
        }
    }
}

/// Rank `panes` and keep the agent panes (every pane with `all`).
pub fn collect(
    panes: Vec<PaneRecord>,
    processes: &ProcessTable,
    now: i64,
    all: bool,
) -> Vec<LsEntry> {
    Listing::build(panes, processes, now, 0)
        .entries
        .into_iter()
        .map(LsEntry::from_entry)
        .filter(|e| all || e.agent.is_some())
        .collect()
}

pub fn format_table(entries: &[LsEntry]) -> String {
    if entries.is_empty() {
        return "no agent panes".to_string();
    }
    let mut lines = vec![format!(
        "{} {} {} {} {} {:>5} {:>6} HOST",
        fit("TARGET", 16),
        fit("AGENT", 11),
        fit("DESC", 30),
        fit("DIR", 22),
        fit("AGE", 8),
        "CPU",
        "MEM"
    )];
    for e in entries {
        let cpu = e.cpu.map(format_cpu).unwrap_or_else(|| "?".into());
        let mem = e.mem_kb.map(format_mem).unwrap_or_else(|| "?".into());
        let line = format!(
            "{} {} {} {} {} {cpu:>5} {mem:>6} {}",
            fit(&e.target, 16),
            fit(e.agent.as_deref().unwrap_or("-"), 11),
            fit(e.description.as_deref().unwrap_or(""), 30),
            fit(&short_path(&e.dir), 22),
            fit(&e.age, 8),
            e.host.as_deref().unwrap_or("")
        );
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

pub fn cmd_ls(tmux: &impl TmuxCommandRunner, all: bool, json: bool) -> anyhow::Result<()> {
    let panes = match list_panes(tmux) {
        Ok(panes) => panes,
        Err(e) if e.is_no_server() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let entries = collect(panes, &scan_process_table(), chrono::Utc::now().timestamp(), all);
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", format_table(&entries));
    }
    Ok(())
}
