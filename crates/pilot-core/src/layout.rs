//! Column layout: named widths from a total width and a fixed manifest,
//! independent of rendering.

/// How a column claims space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    Fixed,
    /// Share of the space left after fixed columns.
    Proportional(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// Width for fixed columns, floor for proportional ones.
    pub min: usize,
    pub sizing: Sizing,
}

impl ColumnSpec {
    pub const fn fixed(name: &'static str, width: usize) -> Self {
        Self {
            name,
            min: width,
            sizing: Sizing::Fixed,
        }
    }

    pub const fn proportional(name: &'static str, min: usize, weight: usize) -> Self {
        Self {
            name,
            min,
            sizing: Sizing::Proportional(weight),
        }
    }
}

/// Spaces between adjacent columns.
pub const COLUMN_GAP: usize = 2;

/// Computed widths, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    columns: Vec<(&'static str, usize)>,
}

impl Layout {
    pub fn width(&self, name: &str) -> usize {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    pub fn columns(&self) -> &[(&'static str, usize)] {
        &self.columns
    }

    /// Total rendered width including gaps.
    pub fn total(&self) -> usize {
        let gaps = COLUMN_GAP * self.columns.len().saturating_sub(1);
        self.columns.iter().map(|(_, w)| w).sum::<usize>() + gaps
    }

    /// Pad/truncate each cell to its column and join with gaps. Missing cells
    /// render blank.
    pub fn render(&self, cells: &[&str]) -> String {
        let gap = " ".repeat(COLUMN_GAP);
        self.columns
            .iter()
            .enumerate()
            .map(|(i, (_, w))| fit(cells.get(i).copied().unwrap_or(""), *w))
            .collect::<Vec<_>>()
            .join(&gap)
            .trim_end()
            .to_string()
    }
}

/// Lay out `manifest` into `total_width` columns.
///
/// Fixed columns always get their width. Whatever remains after fixed widths
/// and gaps is split between proportional columns by weight, never below each
/// column's floor; rounding leftovers go to the last proportional column.
pub fn compute(total_width: usize, manifest: &[ColumnSpec]) -> Layout {
    let gaps = COLUMN_GAP * manifest.len().saturating_sub(1);
    let fixed: usize = manifest
        .iter()
        .filter(|c| c.sizing == Sizing::Fixed)
        .map(|c| c.min)
        .sum();
    let weight_total: usize = manifest
        .iter()
        .map(|c| match c.sizing {
            Sizing::Proportional(w) => w,
            Sizing::Fixed => 0,
        })
        .sum();
    let remaining = total_width.saturating_sub(fixed + gaps);

    let mut columns: Vec<(&'static str, usize)> = manifest
        .iter()
        .map(|c| match c.sizing {
            Sizing::Fixed => (c.name, c.min),
            Sizing::Proportional(w) if weight_total > 0 => {
                (c.name, (remaining * w / weight_total).max(c.min))
            }
            Sizing::Proportional(_) => (c.name, c.min),
        })
        .collect();

    let used: usize = columns
        .iter()
        .zip(manifest)
        .filter(|(_, c)| c.sizing != Sizing::Fixed)
        .map(|((_, w), _)| *w)
        .sum();
    if used < remaining {
        if let Some(last) = manifest
            .iter()
            .rposition(|c| matches!(c.sizing, Sizing::Proportional(_)))
        {
            columns[last].1 += remaining - used;
        }
    }

    Layout { columns }
}

/// Truncate to `width` chars (with a trailing `…` when cut) and left-pad with
/// spaces to exactly `width`.
pub fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{text}{}", " ".repeat(width - len));
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &[ColumnSpec] = &[
        ColumnSpec::fixed("status", 1),
        ColumnSpec::proportional("name", 4, 1),
        ColumnSpec::proportional("dir", 4, 3),
        ColumnSpec::fixed("age", 8),
    ];

    #[test]
    fn fixed_columns_keep_width() {
        let layout = compute(100, MANIFEST);
        assert_eq!(layout.width("status"), 1);
        assert_eq!(layout.width("age"), 8);
    }

    #[test]
    fn remainder_split_by_weight_and_fills_width() {
        // 100 - (1 + 8) - 3 gaps * 2 = 85 → 21 / 63 + 1 leftover
        let layout = compute(100, MANIFEST);
        assert_eq!(layout.width("name"), 21);
        assert_eq!(layout.width("dir"), 64);
        assert_eq!(layout.total(), 100);
    }

    #[test]
    fn narrow_terminal_uses_floors() {
        let layout = compute(10, MANIFEST);
        assert_eq!(layout.width("name"), 4);
        assert_eq!(layout.width("dir"), 4);
    }

    #[test]
    fn unknown_column_is_zero() {
        assert_eq!(compute(80, MANIFEST).width("nope"), 0);
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("äöü", 3), "äöü");
        assert_eq!(fit("x", 0), "");
    }

    #[test]
    fn render_aligns_cells() {
        let layout = compute(30, MANIFEST);
        let line = layout.render(&["!", "sess", "/tmp", "active"]);
        assert!(line.starts_with("!  sess"));
        assert!(line.ends_with("active"));
    }
}
