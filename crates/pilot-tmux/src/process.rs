//! `ps` scans: the full process table for tree aggregation and the start
//! time of a single process for uptime display.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use pilot_core::{ProcessEntry, ProcessTable};

/// `ps -o lstart=` format after whitespace is collapsed,
/// e.g. `Mon Mar  4 09:12:33 2024` becomes `Mon Mar 4 09:12:33 2024`.
const LSTART_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// `ps` pinned to the C locale: `lstart` prints localized day and month
/// names otherwise.
fn ps_command(args: &[&str]) -> std::process::Command {
    let mut cmd = std::process::Command::new("ps");
    cmd.args(args).env("LC_ALL", "C");
    cmd
}

/// Scan all running processes using `ps -axo pid=,ppid=,rss=,%cpu=`.
///
/// Called once per refresh; returns an empty table on failure (non-fatal).
pub fn scan_process_table() -> ProcessTable {
    let output = match ps_command(&["-axo", "pid=,ppid=,rss=,%cpu="]).output() {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            tracing::warn!(status = ?o.status.code(), "ps exited with failure");
            return ProcessTable::default();
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to run ps");
            return ProcessTable::default();
        }
    };
    parse_ps_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `pid ppid rss cpu` lines; malformed lines are skipped.
pub fn parse_ps_output(output: &str) -> ProcessTable {
    output.lines().filter_map(parse_ps_line).collect()
}

fn parse_ps_line(line: &str) -> Option<(u32, ProcessEntry)> {
    let mut fields = line.split_whitespace();
    let pid: u32 = fields.next()?.parse().ok()?;
    let ppid: u32 = fields.next()?.parse().ok()?;
    let rss_kb: u64 = fields.next()?.parse().ok()?;
    // Some locales print the cpu column with a decimal comma.
    let cpu: f64 = fields.next()?.replace(',', ".").parse().ok()?;
    Some((pid, ProcessEntry { ppid, rss_kb, cpu }))
}

/// Start time of `pid`, or `None` when the process is gone or `ps` fails.
pub fn process_start_time(pid: u32) -> Option<DateTime<Local>> {
    let output = ps_command(&["-o", "lstart=", "-p", &pid.to_string()])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_lstart(&String::from_utf8_lossy(&output.stdout))
}

fn parse_lstart(raw: &str) -> Option<DateTime<Local>> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(&normalized, LSTART_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}
