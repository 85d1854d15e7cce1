//! `list-panes` format string and parser producing [`PaneRecord`]s.

use pilot_core::pane::PaneRecord;
use pilot_core::tags;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Field separator. Pane titles and paths may contain tabs; 0x1F never does.
pub const FIELD_SEP: char = '\x1f';

/// tmux before 3.5 escapes 0x1F in format output as a literal `\037`.
const ESCAPED_SEP: &str = "\\037";

/// `list-panes -a -F` format, fields joined by [`FIELD_SEP`]. Tag fields come
/// last so older panes without them still parse.
pub const LIST_PANES_FORMAT: &str = "#{session_name}:#{window_index}.#{pane_index}\x1f#{session_name}\x1f#{window_index}\x1f#{window_name}\x1f#{pane_title}\x1f#{pane_current_command}\x1f#{pane_pid}\x1f#{window_activity}\x1f#{pane_current_path}\x1f#{@pilot-workdir}\x1f#{@pilot-agent}\x1f#{@pilot-desc}\x1f#{@pilot-status}\x1f#{@pilot-needs-help}\x1f#{@pilot-host}\x1f#{@pilot-mode}\x1f#{@pilot-owner}\x1f#{@pilot-tier}\x1f#{@pilot-trust}";

/// Fields every line must carry: everything up to the current path.
const REQUIRED_FIELDS: usize = 9;
const TOTAL_FIELDS: usize = 19;

/// Execute `tmux list-panes -a` and parse the output.
pub fn list_panes(runner: &impl TmuxCommandRunner) -> Result<Vec<PaneRecord>, TmuxError> {
    let output = runner.run(&["list-panes", "-a", "-F", LIST_PANES_FORMAT])?;
    Ok(parse_list_panes_output(&output))
}

/// Parse the raw output of `tmux list-panes -a -F <FORMAT>`. Malformed lines
/// (a newline inside a window name splits one pane over two) are skipped.
pub fn parse_list_panes_output(output: &str) -> Vec<PaneRecord> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match parse_line(line, idx + 1) {
            Ok(pane) => Some(pane),
            Err(e) => {
                tracing::warn!(error = %e, "skipping list-panes line");
                None
            }
        })
        .collect()
}

/// Split one format line. The pre-3.5 `\037` escape is decoded only when the
/// line has no real separator, so a title containing that text stays inside
/// its own field.
pub fn split_fields(line: &str) -> Vec<String> {
    if line.contains(FIELD_SEP) {
        line.split(FIELD_SEP).map(String::from).collect()
    } else {
        line.split(ESCAPED_SEP).map(String::from).collect()
    }
}

fn parse_line(line: &str, line_num: usize) -> Result<PaneRecord, TmuxError> {
    let mut parts = split_fields(line);
    if parts.len() < REQUIRED_FIELDS {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!(
                "expected at least {REQUIRED_FIELDS} fields, got {}",
                parts.len()
            ),
        });
    }
    parts.resize(TOTAL_FIELDS, String::new());

    let opt = |s: &str| -> Option<String> {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    Ok(PaneRecord {
        target: parts[0].clone(),
        session_name: parts[1].clone(),
        window_index: parts[2].clone(),
        window_name: parts[3].clone(),
        pane_title: parts[4].clone(),
        current_cmd: parts[5].clone(),
        pane_pid: parts[6].trim().parse().ok(),
        last_activity: parts[7].trim().parse().ok(),
        current_path: parts[8].clone(),
        workdir: opt(&parts[9]),
        agent: opt(&parts[10]),
        description: opt(&parts[11]),
        status: parts[12].parse().ok(),
        needs_help: tags::flag_is_set(&parts[13]),
        host: opt(&parts[14]),
        mode: opt(&parts[15]),
        owner: opt(&parts[16]),
        tier: opt(&parts[17]),
        trust: opt(&parts[18]),
    })
}
