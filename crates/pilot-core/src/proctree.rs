//! Process-tree aggregation over a single `ps` snapshot.
//!
//! An agent's footprint is spread across the pane shell, the agent and
//! whatever it spawns (compilers, test runners), so usage is summed over the
//! whole descendant set of the pane pid.

use std::collections::{HashMap, HashSet};

/// One row of the process table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessEntry {
    pub ppid: u32,
    /// Resident set size in KiB.
    pub rss_kb: u64,
    pub cpu: f64,
}

/// Summed usage of a process subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreeUsage {
    pub rss_kb: u64,
    pub cpu: f64,
}

/// Point-in-time process table with a parent → children index.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    entries: HashMap<u32, ProcessEntry>,
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessTable {
    pub fn new(entries: HashMap<u32, ProcessEntry>) -> Self {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for (&pid, entry) in &entries {
            if pid != entry.ppid {
                children.entry(entry.ppid).or_default().push(pid);
            }
        }
        Self { entries, children }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessEntry> {
        self.entries.get(&pid)
    }

    /// `root` plus every transitive child. Worklist expansion with a visited
    /// set, so parent loops in a racy snapshot terminate.
    pub fn descendants(&self, root: u32) -> HashSet<u32> {
        let mut seen = HashSet::from([root]);
        let mut pending = vec![root];
        while let Some(pid) = pending.pop() {
            for &child in self.children.get(&pid).into_iter().flatten() {
                if seen.insert(child) {
                    pending.push(child);
                }
            }
        }
        seen
    }

    /// Sum rss and cpu over the subtree rooted at `root`. A root that already
    /// exited contributes nothing.
    pub fn tree_usage(&self, root: u32) -> TreeUsage {
        self.descendants(root)
            .into_iter()
            .filter_map(|pid| self.entries.get(&pid))
            .fold(TreeUsage::default(), |acc, e| TreeUsage {
                rss_kb: acc.rss_kb + e.rss_kb,
                cpu: acc.cpu + e.cpu,
            })
    }
}

impl FromIterator<(u32, ProcessEntry)> for ProcessTable {
    fn from_iter<I: IntoIterator<Item = (u32, ProcessEntry)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// `K` / `M` / `G` memory string from KiB; one decimal only for gigabytes.
pub fn format_mem(kb: u64) -> String {
    if kb >= 1024 * 1024 {
        format!("{:.1}G", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{}M", kb / 1024)
    } else {
        format!("{kb}K")
    }
}

/// Integer CPU percent.
pub fn format_cpu(cpu: f64) -> String {
    format!("{}%", cpu.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(u32, u32, u64, f64)]) -> ProcessTable {
        rows.iter()
            .map(|&(pid, ppid, rss_kb, cpu)| (pid, ProcessEntry { ppid, rss_kb, cpu }))
            .collect()
    }

    fn sample() -> ProcessTable {
        table(&[(1, 0, 100, 5.0), (2, 1, 50, 3.0), (3, 2, 20, 1.0)])
    }

    #[test]
    fn whole_tree_from_root() {
        let usage = sample().tree_usage(1);
        assert_eq!(usage.rss_kb, 170);
        assert_eq!(format_cpu(usage.cpu), "9%");
    }

    #[test]
    fn leaf_only() {
        let usage = sample().tree_usage(3);
        assert_eq!(usage.rss_kb, 20);
        assert_eq!(format_cpu(usage.cpu), "1%");
    }

    #[test]
    fn missing_root_is_zero() {
        let usage = sample().tree_usage(999);
        assert_eq!(usage, TreeUsage::default());
        assert_eq!(format_cpu(usage.cpu), "0%");
    }

    #[test]
    fn parent_cycle_terminates() {
        let t = table(&[(10, 11, 5, 0.0), (11, 10, 7, 0.0)]);
        assert_eq!(t.tree_usage(10).rss_kb, 12);
    }

    #[test]
    fn self_parented_process_counted_once() {
        let t = table(&[(0, 0, 4, 0.0), (1, 0, 6, 0.0)]);
        assert_eq!(t.tree_usage(0).rss_kb, 10);
    }

    #[test]
    fn siblings_outside_subtree_ignored() {
        let t = table(&[(1, 0, 1, 0.0), (2, 1, 2, 0.0), (3, 1, 4, 0.0), (4, 0, 8, 0.0)]);
        assert_eq!(t.descendants(1), HashSet::from([1, 2, 3]));
        assert_eq!(t.tree_usage(1).rss_kb, 7);
    }

    #[test]
    fn mem_scaling() {
        assert_eq!(format_mem(512), "512K");
        assert_eq!(format_mem(2048), "2M");
        assert_eq!(format_mem(1536 * 1024), "1.5G");
    }
}
