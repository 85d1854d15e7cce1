//! Out-of-band status reporting: `pilot tag` for scripts and `pilot hook`
//! for Claude hook events. Both only write pane tags; the deck reads them
//! back on its next refresh.

use std::io::Read;

use pilot_core::pane::PaneStatus;
use pilot_core::tags;
use pilot_tmux::{TmuxCommandRunner, set_pane_option, unset_pane_option};
use serde::Deserialize;

use crate::cli::TagOpts;

/// Tag changes for one pane. `None` leaves a tag untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUpdate {
    pub status: Option<PaneStatus>,
    pub needs_help: Option<bool>,
    pub workdir: Option<String>,
    pub desc: Option<String>,
}

impl TagUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the update. Returns the tag names touched.
    pub fn apply(
        &self,
        tmux: &impl TmuxCommandRunner,
        target: &str,
    ) -> anyhow::Result<Vec<&'static str>> {
        let mut touched = Vec::new();
        if let Some(status) = self.status {
            set_pane_option(tmux, target, tags::STATUS, status.as_str())?;
            touched.push(tags::STATUS);
        }
        match self.needs_help {
            Some(true) => {
                set_pane_option(tmux, target, tags::NEEDS_HELP, "1")?;
                touched.push(tags::NEEDS_HELP);
            }
            Some(false) => {
                unset_pane_option(tmux, target, tags::NEEDS_HELP)?;
                touched.push(tags::NEEDS_HELP);
            }
            None => {}
        }
        if let Some(dir) = self.workdir.as_deref().filter(|d| !d.is_empty()) {
            set_pane_option(tmux, target, tags::WORKDIR, dir)?;
            touched.push(tags::WORKDIR);
        }
        if let Some(desc) = &self.desc {
            let desc = tags::description_from(desc);
            if desc.is_empty() {
                unset_pane_option(tmux, target, tags::DESC)?;
            } else {
                set_pane_option(tmux, target, tags::DESC, &desc)?;
            }
            touched.push(tags::DESC);
        }
        Ok(touched)
    }
}

fn resolve_target(explicit: Option<String>) -> Option<String> {
    explicit
        .or_else(|| std::env::var("TMUX_PANE").ok())
        .filter(|t| !t.trim().is_empty())
}

// ─── pilot tag ────────────────────────────────────────────────────

pub fn tag_update_from_opts(opts: &TagOpts) -> anyhow::Result<TagUpdate> {
    let status = opts
        .status
        .as_deref()
        .map(str::parse::<PaneStatus>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let needs_help = match (opts.needs_help, opts.clear_help) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    Ok(TagUpdate {
        status,
        needs_help,
        workdir: opts.workdir.clone(),
        desc: opts.desc.clone(),
    })
}

pub fn cmd_tag(tmux: &impl TmuxCommandRunner, opts: TagOpts) -> anyhow::Result<()> {
    let update = tag_update_from_opts(&opts)?;
    let target = resolve_target(opts.target)
        .ok_or_else(|| anyhow::anyhow!("no target: pass --target or run inside tmux"))?;
    crate::cmd_control::validate_target(&target)?;
    if update.is_empty() {
        anyhow::bail!("nothing to tag");
    }
    let touched = update.apply(tmux, &target)?;
    tracing::debug!(pane = %target, ?touched, "tagged");
    Ok(())
}

// ─── pilot hook ───────────────────────────────────────────────────

/// The part of a Claude hook payload we use.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HookPayload {
    pub hook_event_name: Option<String>,
    pub cwd: Option<String>,
}

/// Tag changes for a hook event. Unknown events change nothing.
pub fn update_for_event(event: &str, payload: &HookPayload) -> TagUpdate {
    let mut update = match event {
        "PreToolUse" | "PostToolUse" | "UserPromptSubmit" => TagUpdate {
            status: Some(PaneStatus::Working),
            needs_help: Some(false),
            ..Default::default()
        },
        "Notification" => TagUpdate {
            status: Some(PaneStatus::Waiting),
            needs_help: Some(true),
            ..Default::default()
        },
        "Stop" | "SubagentStop" => TagUpdate {
            status: Some(PaneStatus::Done),
            needs_help: Some(false),
            ..Default::default()
        },
        _ => return TagUpdate::default(),
    };
    update.workdir = payload.cwd.clone().filter(|c| !c.is_empty());
    update
}

/// Hooks run inside the agent: log and succeed rather than fail the agent's
/// tool call.
pub fn cmd_hook(tmux: &impl TmuxCommandRunner, event: Option<String>, target: Option<String>) {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        tracing::warn!(error = %e, "cannot read hook payload");
    }
    let payload: HookPayload = if input.trim().is_empty() {
        HookPayload::default()
    } else {
        serde_json::from_str(&input).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed hook payload");
            HookPayload::default()
        })
    };

    let Some(event) = event.or_else(|| payload.hook_event_name.clone()) else {
        tracing::warn!("hook event name missing");
        return;
    };
    let Some(target) = resolve_target(target) else {
        tracing::debug!(event = %event, "not inside tmux, ignoring hook");
        return;
    };
    let update = update_for_event(&event, &payload);
    if update.is_empty() {
        tracing::debug!(event = %event, "unhandled hook event");
        return;
    }
    if let Err(e) = update.apply(tmux, &target) {
        tracing::warn!(pane = %target, event = %event, error = %e, "hook tagging failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_tmux::TmuxError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl TmuxCommandRunner for Recorder {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|s| s.to_string()).collect());
            Ok(String::new())
        }
    }

    fn payload(json: &str) -> HookPayload {
        serde_json::from_str(json).expect("payload")
    }

    #[test]
    fn notification_asks_for_help() {
        let update = update_for_event("Notification", &HookPayload::default());
        assert_eq!(update.status, Some(PaneStatus::Waiting));
        assert_eq!(update.needs_help, Some(true));
    }

    #[test]
    fn tool_use_clears_help_and_records_cwd() {
        let p = payload(r#"{"hook_event_name":"PreToolUse","cwd":"/src/app-worktree/x","tool_name":"Bash"}"#);
        let update = update_for_event("PreToolUse", &p);
        assert_eq!(update.status, Some(PaneStatus::Working));
        assert_eq!(update.needs_help, Some(false));
        assert_eq!(update.workdir.as_deref(), Some("/src/app-worktree/x"));
    }

    #[test]
    fn stop_marks_done() {
        assert_eq!(
            update_for_event("SubagentStop", &HookPayload::default()).status,
            Some(PaneStatus::Done)
        );
        assert!(update_for_event("PreCompact", &HookPayload::default()).is_empty());
    }

    #[test]
    fn apply_writes_pane_options() {
        let tmux = Recorder::default();
        let update = TagUpdate {
            status: Some(PaneStatus::Waiting),
            needs_help: Some(true),
            workdir: Some("/src/app".into()),
            desc: None,
        };
        let touched = update.apply(&tmux, "%3").expect("apply");
        assert_eq!(touched, [tags::STATUS, tags::NEEDS_HELP, tags::WORKDIR]);
        let calls = tmux.calls.lock().expect("lock").clone();
        assert_eq!(calls[0], ["set-option", "-p", "-t", "%3", "@pilot-status", "waiting"]);
        assert_eq!(calls[1], ["set-option", "-p", "-t", "%3", "@pilot-needs-help", "1"]);
    }

    #[test]
    fn clearing_help_unsets_the_option() {
        let tmux = Recorder::default();
        let update = TagUpdate { needs_help: Some(false), ..Default::default() };
        update.apply(&tmux, "%3").expect("apply");
        let calls = tmux.calls.lock().expect("lock").clone();
        assert_eq!(calls[0], ["set-option", "-p", "-u", "-t", "%3", "@pilot-needs-help"]);
    }

    #[test]
    fn tag_opts_validate_status() {
        let opts = TagOpts {
            target: Some("%1".into()),
            status: Some("sleeping".into()),
            needs_help: false,
            clear_help: false,
            workdir: None,
            desc: None,
        };
        assert!(tag_update_from_opts(&opts).is_err());

        let opts = TagOpts { status: Some("Done".into()), clear_help: true, ..opts };
        let update = tag_update_from_opts(&opts).expect("valid");
        assert_eq!(update.status, Some(PaneStatus::Done));
        assert_eq!(update.needs_help, Some(false));
    }
}
