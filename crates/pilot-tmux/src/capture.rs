//! Pane capture.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Capture the last `lines` lines of scrollback from `target`.
///
/// With `ansi` the escape sequences for colours and attributes are kept
/// (`capture-pane -e`). Trailing blank lines below the cursor are dropped.
pub fn capture_pane(
    runner: &impl TmuxCommandRunner,
    target: &str,
    lines: u32,
    ansi: bool,
) -> Result<Vec<String>, TmuxError> {
    let start_line = format!("-{lines}");
    let mut args = vec!["capture-pane", "-p", "-J"];
    if ansi {
        args.push("-e");
    }
    args.extend(["-S", start_line.as_str(), "-t", target]);
    let output = runner.run(&args)?;

    let mut captured: Vec<String> = output.lines().map(String::from).collect();
    while captured.last().is_some_and(|l| l.trim().is_empty()) {
        captured.pop();
    }
    Ok(captured)
}
