//! Fuzzy selector (fzf) wrapper: the deck picker, free-text input and
//! single choice from a list.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::config::Config;

/// fzf exit status when the user aborts with Esc or Ctrl-C.
const EXIT_CANCELLED: i32 = 130;

/// What the deck asks the selector to show.
pub struct DeckView<'a> {
    /// `INDEX\tDISPLAY` lines.
    pub lines: &'a str,
    pub header: &'a str,
    pub preview_cmd: &'a str,
    pub reload_cmd: &'a str,
    pub expect: &'a [&'a str],
}

/// Key pressed and the row index it was pressed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    /// Empty for Enter.
    pub key: String,
    pub index: Option<usize>,
}

pub trait Selector {
    /// `None` when cancelled.
    fn pick(&self, view: &DeckView<'_>) -> anyhow::Result<Option<Pick>>;
    /// Editable text prefilled with `default`. `None` when cancelled.
    fn input(&self, prompt: &str, default: &str) -> anyhow::Result<Option<String>>;
    /// One of `items`, or (with `allow_new`) whatever was typed.
    fn choose(
        &self,
        prompt: &str,
        items: &[String],
        allow_new: bool,
    ) -> anyhow::Result<Option<String>>;
}

pub struct Fzf {
    config: Config,
}

impl Fzf {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Run fzf with `input` on stdin. `None` when cancelled.
    fn run(&self, args: &[String], input: &str) -> anyhow::Result<Option<String>> {
        let mut cmd = Command::new(&self.config.fzf_bin);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        self.config.export_to(&mut cmd);
        tracing::debug!(?args, "fzf");

        let mut child = cmd
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to spawn {}: {e}", self.config.fzf_bin))?;
        if let Some(ref mut stdin) = child.stdin {
            // fzf may exit before reading everything; a broken pipe is fine.
            let _ = stdin.write_all(input.as_bytes());
        }
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| anyhow::anyhow!("fzf failed: {e}"))?;
        match output.status.code() {
            Some(0) | Some(1) => Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned())),
            Some(EXIT_CANCELLED) | None => Ok(None),
            Some(code) => anyhow::bail!("fzf exited with status {code}"),
        }
    }
}

impl Selector for Fzf {
    fn pick(&self, view: &DeckView<'_>) -> anyhow::Result<Option<Pick>> {
        let args = vec![
            "--ansi".to_string(),
            "--no-multi".to_string(),
            "--no-sort".to_string(),
            "--layout=reverse".to_string(),
            "--delimiter=\t".to_string(),
            "--with-nth=2..".to_string(),
            format!("--expect={}", view.expect.join(",")),
            format!("--header={}", view.header),
            format!("--preview={}", view.preview_cmd),
            "--preview-window=down,60%".to_string(),
            format!("--bind=ctrl-r:reload({})", view.reload_cmd),
        ];
        Ok(self
            .run(&args, view.lines)?
            .and_then(|out| parse_pick_output(&out)))
    }

    fn input(&self, prompt: &str, default: &str) -> anyhow::Result<Option<String>> {
        let args = vec![
            "--print-query".to_string(),
            "--layout=reverse".to_string(),
            "--no-info".to_string(),
            format!("--prompt={prompt}> "),
            format!("--query={default}"),
        ];
        Ok(self.run(&args, "")?.map(|out| parse_query_output(&out)))
    }

    fn choose(
        &self,
        prompt: &str,
        items: &[String],
        allow_new: bool,
    ) -> anyhow::Result<Option<String>> {
        let args = vec![
            "--print-query".to_string(),
            "--layout=reverse".to_string(),
            "--no-multi".to_string(),
            format!("--prompt={prompt}> "),
        ];
        let input: String = items.iter().map(|i| format!("{i}\n")).collect();
        Ok(self
            .run(&args, &input)?
            .and_then(|out| parse_choice_output(&out, allow_new)))
    }
}

/// `--expect` output: key line, then the selected `INDEX\tDISPLAY` line.
pub fn parse_pick_output(out: &str) -> Option<Pick> {
    if out.is_empty() {
        return None;
    }
    let mut lines = out.lines();
    let key = lines.next().unwrap_or_default().trim().to_string();
    let index = lines
        .next()
        .and_then(|l| l.split('\t').next())
        .and_then(|f| f.trim().parse().ok());
    Some(Pick { key, index })
}

/// `--print-query` output: the first line is the query.
pub fn parse_query_output(out: &str) -> String {
    out.lines().next().unwrap_or_default().trim().to_string()
}

/// `--print-query` output with a list: query line, then the selection.
pub fn parse_choice_output(out: &str, allow_new: bool) -> Option<String> {
    let mut lines = out.lines();
    let query = lines.next().unwrap_or_default().trim();
    match lines.next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(selected) => Some(selected.to_string()),
        None if allow_new && !query.is_empty() => Some(query.to_string()),
        None => None,
    }
}
