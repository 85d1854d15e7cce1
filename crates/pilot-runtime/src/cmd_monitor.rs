//! `pilot monitor`: scan the recent output of every agent-tagged pane for
//! permission prompts and lifecycle events.

use pilot_core::monitor::{PaneReport, format_report};
use pilot_tmux::{TmuxCommandRunner, capture_pane, list_panes};

pub fn scan(tmux: &impl TmuxCommandRunner, lines: u32) -> anyhow::Result<Vec<PaneReport>> {
    let panes = match list_panes(tmux) {
        Ok(panes) => panes,
        Err(e) if e.is_no_server() => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reports = Vec::new();
    for pane in panes {
        let Some(agent) = pane.agent.as_deref().filter(|a| !a.is_empty()) else {
            continue;
        };
        let text = match capture_pane(tmux, &pane.target, lines, false) {
            Ok(captured) => captured.join("\n"),
            Err(e) => {
                tracing::warn!(pane = %pane.target, error = %e, "capture failed, skipping");
                continue;
            }
        };
        reports.push(PaneReport::from_capture(&pane.target, agent, &text));
    }
    Ok(reports)
}

pub fn cmd_monitor(tmux: &impl TmuxCommandRunner, lines: u32) -> anyhow::Result<()> {
    if lines == 0 {
        anyhow::bail!("lines must be >= 1");
    }
    println!("{}", format_report(&scan(tmux, lines)?));
    Ok(())
}
