//! Session, pane and option commands.

use std::collections::HashSet;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Names of every live session on the runner's server. A server that is not
/// running has no sessions.
pub fn list_session_names(runner: &impl TmuxCommandRunner) -> Result<HashSet<String>, TmuxError> {
    match runner.run(&["list-sessions", "-F", "#{session_name}"]) {
        Ok(out) => Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.is_no_server() => Ok(HashSet::new()),
        Err(e) => Err(e),
    }
}

/// Create a detached session running `command` through the default shell.
pub fn new_session(
    runner: &impl TmuxCommandRunner,
    name: &str,
    directory: Option<&str>,
    command: &str,
) -> Result<(), TmuxError> {
    let mut args = vec!["new-session", "-d", "-s", name];
    if let Some(dir) = directory {
        args.extend(["-c", dir]);
    }
    args.push(command);
    runner.run(&args)?;
    Ok(())
}

/// Set a pane-scoped user option.
pub fn set_pane_option(
    runner: &impl TmuxCommandRunner,
    target: &str,
    key: &str,
    value: &str,
) -> Result<(), TmuxError> {
    runner.run(&["set-option", "-p", "-t", target, key, value])?;
    Ok(())
}

pub fn unset_pane_option(
    runner: &impl TmuxCommandRunner,
    target: &str,
    key: &str,
) -> Result<(), TmuxError> {
    runner.run(&["set-option", "-p", "-u", "-t", target, key])?;
    Ok(())
}

/// Expand `format` against `target` (`display-message -p`).
pub fn display(
    runner: &impl TmuxCommandRunner,
    target: &str,
    format: &str,
) -> Result<String, TmuxError> {
    let out = runner.run(&["display-message", "-p", "-t", target, format])?;
    Ok(out.trim_end_matches(['\n', '\r']).to_string())
}

pub fn kill_pane(runner: &impl TmuxCommandRunner, target: &str) -> Result<(), TmuxError> {
    runner.run(&["kill-pane", "-t", target])?;
    Ok(())
}

/// Bring `target` to the front: switch the attached client, or select the
/// window and pane when there is no client to switch (not inside tmux).
pub fn select_target(runner: &impl TmuxCommandRunner, target: &str) -> Result<(), TmuxError> {
    if let Err(e) = runner.run(&["switch-client", "-t", target]) {
        tracing::debug!(error = %e, pane = target, "switch-client failed, selecting window");
        runner.run(&["select-window", "-t", target])?;
        runner.run(&["select-pane", "-t", target])?;
    }
    Ok(())
}
