//! Per-pane actions shared by the deck and the `pilot pause|resume|kill|
//! capture|send|transfer-ownership` commands.

use std::sync::LazyLock;

use pilot_core::pane::PaneStatus;
use pilot_core::{Agent, PilotError, tags};
use pilot_tmux::pane_info::split_fields;
use pilot_tmux::{
    TmuxCommandRunner, capture_pane, display, kill_pane, list_panes, send_keys, send_sequence,
    set_pane_option,
};
use regex::Regex;

use crate::vcs::{self, GitRunner};

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.:%@$-]+$").expect("target regex pattern is valid")
});

/// Reject anything that is not a plain tmux target.
pub fn validate_target(target: &str) -> Result<(), PilotError> {
    if TARGET_RE.is_match(target) {
        Ok(())
    } else {
        Err(PilotError::InvalidTarget(target.to_string()))
    }
}

// ─── Pane lookups ─────────────────────────────────────────────────

/// Facts about one pane needed by the actions, read fresh from tmux.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneFacts {
    pub agent: Option<Agent>,
    pub workdir: String,
    pub host: Option<String>,
}

const FACTS_FORMAT: &str =
    "#{@pilot-agent}\x1f#{pane_current_command}\x1f#{@pilot-workdir}\x1f#{pane_current_path}\x1f#{@pilot-host}";

pub fn pane_facts(tmux: &impl TmuxCommandRunner, target: &str) -> anyhow::Result<PaneFacts> {
    let raw = display(tmux, target, FACTS_FORMAT)?;
    let mut f = split_fields(&raw);
    f.resize(5, String::new());
    let agent = f[0]
        .parse::<Agent>()
        .ok()
        .or_else(|| Agent::from_command(&f[1]));
    let workdir = if f[2].trim().is_empty() { &f[3] } else { &f[2] };
    Ok(PaneFacts {
        agent,
        workdir: workdir.trim().to_string(),
        host: Some(f[4].trim().to_string()).filter(|h| !h.is_empty()),
    })
}

fn set_status(tmux: &impl TmuxCommandRunner, target: &str, status: PaneStatus) {
    if let Err(e) = set_pane_option(tmux, target, tags::STATUS, status.as_str()) {
        tracing::warn!(pane = target, error = %e, "could not update status tag");
    }
}

// ─── Actions ──────────────────────────────────────────────────────

pub fn pause(tmux: &impl TmuxCommandRunner, target: &str) -> anyhow::Result<String> {
    let facts = pane_facts(tmux, target)?;
    let agent = facts
        .agent
        .ok_or_else(|| anyhow::anyhow!("no known agent in {target}"))?;
    send_sequence(tmux, target, &agent.pause_keys())?;
    set_status(tmux, target, PaneStatus::Paused);
    Ok(format!("paused {agent} in {target}"))
}

pub fn resume(tmux: &impl TmuxCommandRunner, target: &str) -> anyhow::Result<String> {
    let facts = pane_facts(tmux, target)?;
    let agent = facts
        .agent
        .ok_or_else(|| anyhow::anyhow!("no known agent in {target}"))?;
    send_sequence(tmux, target, &agent.resume_keys())?;
    set_status(tmux, target, PaneStatus::Working);
    Ok(format!("resumed {agent} in {target}"))
}

/// Kill the pane, then remove the worktree its directory belongs to.
/// Remote panes keep their directories; the path is not on this machine.
pub fn kill(
    tmux: &impl TmuxCommandRunner,
    git: &impl GitRunner,
    target: &str,
    workdir: &str,
    remote: bool,
) -> anyhow::Result<String> {
    kill_pane(tmux, target)?;
    if remote || workdir.is_empty() {
        return Ok(format!("killed {target}"));
    }
    match vcs::remove_worktree_for(git, workdir) {
        Ok(Some(wt)) => Ok(format!("killed {target}, removed worktree {}", wt.display())),
        Ok(None) => Ok(format!("killed {target}")),
        Err(e) => Ok(format!("killed {target}; worktree cleanup failed: {e}")),
    }
}

/// Re-tag every pane owned by `old` as owned by `new`. Returns the count.
pub fn transfer_ownership(
    tmux: &impl TmuxCommandRunner,
    old: &str,
    new: &str,
) -> anyhow::Result<usize> {
    let mut moved = 0;
    for pane in list_panes(tmux)? {
        if pane.owner.as_deref() != Some(old) {
            continue;
        }
        set_pane_option(tmux, &pane.target, tags::OWNER, new)?;
        moved += 1;
    }
    Ok(moved)
}

// ─── Commands ─────────────────────────────────────────────────────

pub fn cmd_pause(tmux: &impl TmuxCommandRunner, target: &str) -> anyhow::Result<()> {
    validate_target(target)?;
    println!("{}", pause(tmux, target)?);
    Ok(())
}

pub fn cmd_resume(tmux: &impl TmuxCommandRunner, target: &str) -> anyhow::Result<()> {
    validate_target(target)?;
    println!("{}", resume(tmux, target)?);
    Ok(())
}

pub fn cmd_kill(
    tmux: &impl TmuxCommandRunner,
    git: &impl GitRunner,
    target: &str,
) -> anyhow::Result<()> {
    validate_target(target)?;
    let facts = pane_facts(tmux, target)?;
    if facts.workdir.is_empty() {
        anyhow::bail!("could not determine the working directory of {target}");
    }
    println!("{}", kill(tmux, git, target, &facts.workdir, facts.host.is_some())?);
    Ok(())
}

pub fn cmd_capture(tmux: &impl TmuxCommandRunner, target: &str, lines: u32) -> anyhow::Result<()> {
    validate_target(target)?;
    if lines == 0 {
        anyhow::bail!("lines must be >= 1");
    }
    for line in capture_pane(tmux, target, lines, false)? {
        println!("{line}");
    }
    Ok(())
}

pub fn cmd_send(tmux: &impl TmuxCommandRunner, target: &str, keys: &str) -> anyhow::Result<()> {
    validate_target(target)?;
    if keys.is_empty() {
        anyhow::bail!("keys must not be empty");
    }
    let agent = pane_facts(tmux, target)?.agent;
    send_keys(tmux, target, keys, agent)?;
    println!("sent keys to {target}");
    Ok(())
}

pub fn cmd_transfer_ownership(
    tmux: &impl TmuxCommandRunner,
    old: &str,
    new: &str,
) -> anyhow::Result<()> {
    validate_target(old)?;
    validate_target(new)?;
    let moved = transfer_ownership(tmux, old, new)?;
    println!("transferred {moved} pane(s) from {old} to {new}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::GitError;
    use pilot_tmux::TmuxError;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    type Reply = fn(&[&str]) -> Result<String, TmuxError>;

    struct MockTmux {
        reply: Reply,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl MockTmux {
        fn new(reply: Reply) -> Self {
            Self { reply, calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl TmuxCommandRunner for MockTmux {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|s| s.to_string()).collect());
            (self.reply)(args)
        }
    }

    #[derive(Default)]
    struct MockGit {
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    }

    impl GitRunner for MockGit {
        fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
            self.calls
                .lock()
                .expect("lock")
                .push((dir.to_path_buf(), args.iter().map(|s| s.to_string()).collect()));
            match args {
                ["worktree", "list", ..] => {
                    Ok("worktree /src/app\n\nworktree /src/app-worktree/login\n".into())
                }
                _ => Ok(String::new()),
            }
        }
    }

    fn claude_pane(args: &[&str]) -> Result<String, TmuxError> {
        match args {
            ["display-message", ..] => Ok("claude\x1fnode\x1f\x1f/src/app-worktree/login\x1f\n".into()),
            _ => Ok(String::new()),
        }
    }

    #[test]
    fn target_validation() {
        for ok in ["work:1.0", "%12", "claude-fix-42", "a_b:0", "$3", "@4"] {
            assert!(validate_target(ok).is_ok(), "{ok}");
        }
        for bad in ["", "a b", "x;rm -rf /", "t'q", "a\nb"] {
            assert!(validate_target(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn facts_prefer_tags() {
        let tmux = MockTmux::new(|_| Ok("aider\x1fpython3\x1f/repo/x\x1f/home/u\x1fdevbox\n".into()));
        let facts = pane_facts(&tmux, "s:0.0").expect("facts");
        assert_eq!(facts.agent, Some(Agent::Aider));
        assert_eq!(facts.workdir, "/repo/x");
        assert_eq!(facts.host.as_deref(), Some("devbox"));
    }

    #[test]
    fn facts_fall_back_to_command() {
        let tmux = MockTmux::new(|_| Ok("\x1fcodex\x1f\x1f/home/u\x1f\n".into()));
        let facts = pane_facts(&tmux, "s:0.0").expect("facts");
        assert_eq!(facts.agent, Some(Agent::Codex));
        assert_eq!(facts.workdir, "/home/u");
        assert_eq!(facts.host, None);
    }

    #[test]
    fn pause_sends_agent_sequence_and_tags() {
        let tmux = MockTmux::new(claude_pane);
        let msg = pause(&tmux, "w:0.0").expect("paused");
        assert!(msg.contains("claude"));
        let calls = tmux.calls();
        assert_eq!(calls[1], vec!["send-keys", "-t", "w:0.0", "Escape"]);
        assert_eq!(calls[2], vec!["send-keys", "-t", "w:0.0", "-l", "--", "/exit"]);
        assert_eq!(
            calls.last().expect("tag"),
            &vec!["set-option", "-p", "-t", "w:0.0", "@pilot-status", "paused"]
        );
    }

    #[test]
    fn resume_types_resume_command() {
        let tmux = MockTmux::new(claude_pane);
        resume(&tmux, "w:0.0").expect("resumed");
        assert!(
            tmux.calls()
                .iter()
                .any(|c| c == &vec!["send-keys", "-t", "w:0.0", "-l", "--", "claude --continue"])
        );
    }

    #[test]
    fn pause_without_agent_fails() {
        let tmux = MockTmux::new(|_| Ok("\x1fzsh\x1f\x1f/\x1f\n".into()));
        assert!(pause(&tmux, "w:0.0").is_err());
        assert_eq!(tmux.calls().len(), 1);
    }

    #[test]
    fn kill_worktree_pane_removes_worktree_at_repo_root() {
        let tmux = MockTmux::new(claude_pane);
        let git = MockGit::default();
        let msg = kill(&tmux, &git, "w:0.0", "/src/app-worktree/login", false).expect("killed");
        assert!(msg.contains("removed worktree /src/app-worktree/login"));
        assert_eq!(tmux.calls()[0], vec!["kill-pane", "-t", "w:0.0"]);
        let git_calls = git.calls.lock().expect("lock").clone();
        assert!(git_calls.iter().all(|(dir, _)| dir == Path::new("/src/app")));
        assert!(git_calls.iter().any(|(_, a)| a[..2] == ["worktree", "remove"]));
    }

    #[test]
    fn kill_plain_pane_only_kills() {
        let tmux = MockTmux::new(claude_pane);
        let git = MockGit::default();
        kill(&tmux, &git, "w:0.0", "/src/app", false).expect("killed");
        assert_eq!(tmux.calls().len(), 1);
        assert!(git.calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn kill_remote_pane_skips_cleanup() {
        let tmux = MockTmux::new(claude_pane);
        let git = MockGit::default();
        kill(&tmux, &git, "w:0.0", "/src/app-worktree/login", true).expect("killed");
        assert!(git.calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn transfer_retags_owned_panes() {
        let tmux = MockTmux::new(|args| match args {
            ["list-panes", ..] => {
                let row = |t: &str, owner: &str| {
                    let mut f = vec![t, "s", "0", "w", "", "claude", "1", "2", "/x"];
                    f.extend(["", "claude", "", "", "", "", "", owner]);
                    f.join("\x1f")
                };
                Ok(format!("{}\n{}\n{}\n", row("a:0.0", "%1"), row("b:0.0", "%2"), row("c:0.0", "%1")))
            }
            _ => Ok(String::new()),
        });
        assert_eq!(transfer_ownership(&tmux, "%1", "%9").expect("ok"), 2);
        let sets: Vec<_> = tmux.calls().into_iter().filter(|c| c[0] == "set-option").collect();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0], vec!["set-option", "-p", "-t", "a:0.0", "@pilot-owner", "%9"]);
        assert_eq!(sets[1][3], "c:0.0");
    }

    #[test]
    fn capture_rejects_zero_lines() {
        let tmux = MockTmux::new(|_| Ok(String::new()));
        assert!(cmd_capture(&tmux, "a:0", 0).is_err());
        assert!(tmux.calls().is_empty());
    }

    #[test]
    fn send_rejects_bad_target() {
        let tmux = MockTmux::new(|_| Ok(String::new()));
        assert!(cmd_send(&tmux, "a;b", "Enter").is_err());
        assert!(tmux.calls().is_empty());
    }
}
