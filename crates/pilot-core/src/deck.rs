//! Deck listing: joins pane records with process-tree usage, ranks them by
//! recency and lays them out as aligned rows.
//!
//! The row index file is the only way a selection is mapped back to a pane:
//! line `i` holds `target\tworkdir` for row `i`.

use crate::layout::{self, ColumnSpec, Layout};
use crate::pane::{PaneRecord, format_age};
use crate::proctree::{ProcessTable, TreeUsage, format_cpu, format_mem};

pub const DECK_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::fixed("status", 1),
    ColumnSpec::proportional("session", 8, 3),
    ColumnSpec::proportional("window", 6, 2),
    ColumnSpec::proportional("dir", 8, 4),
    ColumnSpec::fixed("age", 8),
    ColumnSpec::fixed("cpu", 5),
    ColumnSpec::fixed("mem", 6),
];

const HEADER_CELLS: &[&str] = &["", "SESSION", "WINDOW", "DIR", "AGE", "CPU", "MEM"];

/// One ranked deck row.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckEntry {
    pub pane: PaneRecord,
    pub age: String,
    pub usage: Option<TreeUsage>,
}

impl DeckEntry {
    pub fn target(&self) -> &str {
        &self.pane.target
    }

    pub fn workdir(&self) -> &str {
        self.pane.effective_path()
    }

    fn cpu_label(&self) -> String {
        self.usage.map(|u| format_cpu(u.cpu)).unwrap_or_else(|| "?".into())
    }

    fn mem_label(&self) -> String {
        self.usage
            .map(|u| format_mem(u.rss_kb))
            .unwrap_or_else(|| "?".into())
    }
}

/// A full refresh: ranked entries and the layout they are rendered with.
#[derive(Debug, Clone)]
pub struct Listing {
    pub entries: Vec<DeckEntry>,
    pub layout: Layout,
}

impl Listing {
    /// Rank `panes` by last activity (newest first) and attach usage from the
    /// one `processes` snapshot of this refresh.
    pub fn build(
        panes: Vec<PaneRecord>,
        processes: &ProcessTable,
        now: i64,
        width: usize,
    ) -> Self {
        let mut entries: Vec<DeckEntry> = panes
            .into_iter()
            .map(|pane| DeckEntry {
                age: pane
                    .last_activity
                    .map(|t| format_age(now - t))
                    .unwrap_or_else(|| "?".into()),
                usage: pane.pane_pid.map(|pid| processes.tree_usage(pid)),
                pane,
            })
            .collect();
        entries.sort_by(|a, b| b.pane.last_activity.cmp(&a.pane.last_activity));

        Self {
            entries,
            layout: layout::compute(width, DECK_COLUMNS),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn header(&self) -> String {
        self.layout.render(HEADER_CELLS)
    }

    /// Display lines, in rank order.
    pub fn rows(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                let window = e.pane.window_label();
                let dir = short_path(e.workdir());
                let cpu = e.cpu_label();
                let mem = e.mem_label();
                let cells = [
                    e.pane.status_icon(),
                    e.pane.session_name.as_str(),
                    window.as_str(),
                    dir.as_str(),
                    e.age.as_str(),
                    cpu.as_str(),
                    mem.as_str(),
                ];
                let cells: Vec<String> = cells.iter().map(|c| single_line(c)).collect();
                let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
                self.layout.render(&refs)
            })
            .collect()
    }

    /// Selector input: `INDEX\tDISPLAY` per row.
    pub fn selector_lines(&self) -> String {
        self.rows()
            .iter()
            .enumerate()
            .map(|(i, row)| format!("{i}\t{row}\n"))
            .collect()
    }

    /// Contents of the row index file.
    pub fn index_file(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}\t{}\n", single_line(e.target()), single_line(e.workdir())))
            .collect()
    }
}

/// Row `index` of a row index file as `(target, workdir)`.
pub fn lookup_row(index_file: &str, index: usize) -> Option<(String, String)> {
    let line = index_file.lines().nth(index)?;
    let (target, workdir) = line.split_once('\t').unwrap_or((line, ""));
    if target.is_empty() {
        return None;
    }
    Some((target.to_string(), workdir.to_string()))
}

/// Tabs and newlines would break the row format.
fn single_line(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

/// Last two path segments with `$HOME` collapsed to `~`.
pub fn short_path(path: &str) -> String {
    let home = std::env::var("HOME").unwrap_or_default();
    short_path_with_home(path, &home)
}

fn short_path_with_home(path: &str, home: &str) -> String {
    let collapsed = match path.strip_prefix(home) {
        Some(rest) if !home.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            format!("~{rest}")
        }
        _ => path.to_string(),
    };

    let trimmed = collapsed.trim_end_matches('/');
    let segments: Vec<&str> = trimmed
        .rsplit('/')
        .take(2)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.len() {
        0 => collapsed,
        1 => segments[0].to_string(),
        _ => format!("{}/{}", segments[1], segments[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proctree::ProcessEntry;

    fn pane(target: &str, activity: i64, pid: Option<u32>) -> PaneRecord {
        PaneRecord {
            target: target.into(),
            session_name: target.split(':').next().unwrap_or("").into(),
            window_index: "0".into(),
            window_name: "zsh".into(),
            pane_pid: pid,
            last_activity: Some(activity),
            current_path: "/home/u/src/app".into(),
            ..Default::default()
        }
    }

    #[test]
    fn sorted_by_recency_descending() {
        let panes = vec![pane("a:0.0", 100, None), pane("b:0.0", 300, None), pane("c:0.0", 200, None)];
        let listing = Listing::build(panes, &ProcessTable::default(), 400, 120);
        let order: Vec<_> = listing
            .entries
            .iter()
            .map(|e| e.pane.last_activity.unwrap_or_default())
            .collect();
        assert_eq!(order, vec![300, 200, 100]);
    }

    #[test]
    fn usage_comes_from_shared_snapshot() {
        let table: ProcessTable = [
            (10, ProcessEntry { ppid: 1, rss_kb: 2048, cpu: 1.5 }),
            (11, ProcessEntry { ppid: 10, rss_kb: 1024, cpu: 2.0 }),
        ]
        .into_iter()
        .collect();
        let listing = Listing::build(vec![pane("a:0.0", 0, Some(10))], &table, 30, 120);
        let rows = listing.rows();
        assert!(rows[0].contains("3M"));
        assert!(rows[0].contains("3%"));
        assert!(rows[0].contains("active"));
    }

    #[test]
    fn missing_pid_shows_question_marks() {
        let listing = Listing::build(vec![pane("a:0.0", 0, None)], &ProcessTable::default(), 0, 120);
        assert!(listing.rows()[0].contains('?'));
    }

    #[test]
    fn workdir_tag_used_in_index_file() {
        let mut p = pane("a:0.0", 0, None);
        p.workdir = Some("/src/app-worktree/feat".into());
        let listing = Listing::build(vec![p], &ProcessTable::default(), 0, 120);
        assert_eq!(listing.index_file(), "a:0.0\t/src/app-worktree/feat\n");
        assert!(listing.rows()[0].contains("app-worktree/feat"));
    }

    #[test]
    fn selector_lines_carry_row_index() {
        let panes = vec![pane("a:0.0", 1, None), pane("b:0.0", 2, None)];
        let listing = Listing::build(panes, &ProcessTable::default(), 10, 120);
        let lines = listing.selector_lines();
        let mut it = lines.lines();
        assert!(it.next().is_some_and(|l| l.starts_with("0\t")));
        assert!(it.next().is_some_and(|l| l.starts_with("1\t")));
    }

    #[test]
    fn lookup_by_index() {
        let file = "a:0.0\t/x\nb:1.0\t/y\n";
        assert_eq!(lookup_row(file, 1), Some(("b:1.0".into(), "/y".into())));
        assert_eq!(lookup_row(file, 2), None);
    }

    #[test]
    fn tabs_in_titles_are_flattened() {
        let mut p = pane("a:0.0", 0, None);
        p.window_name = "evil\tname".into();
        let listing = Listing::build(vec![p], &ProcessTable::default(), 0, 120);
        assert!(!listing.rows()[0].contains('\t'));
    }

    #[test]
    fn header_matches_layout() {
        let listing = Listing::build(vec![], &ProcessTable::default(), 0, 100);
        assert!(listing.header().contains("SESSION"));
        assert!(listing.header().trim_end().ends_with("MEM"));
    }

    #[test]
    fn short_path_variants() {
        assert_eq!(short_path_with_home("/some/deep/repo/subdir", "/h"), "repo/subdir");
        assert_eq!(short_path_with_home("/h/projects/app", "/h"), "projects/app");
        assert_eq!(short_path_with_home("/h/app", "/h"), "~/app");
        assert_eq!(short_path_with_home("/only", "/h"), "only");
        assert_eq!(short_path_with_home("/hx/app", "/h"), "hx/app");
    }
}
