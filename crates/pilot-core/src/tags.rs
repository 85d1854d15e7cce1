//! Pane-scoped tmux user options that make up the out-of-band tag protocol.
//!
//! External hooks may set any of these on a pane; the deck reads them back on
//! every refresh.

pub const AGENT: &str = "@pilot-agent";
pub const DESC: &str = "@pilot-desc";
pub const WORKDIR: &str = "@pilot-workdir";
pub const STATUS: &str = "@pilot-status";
pub const NEEDS_HELP: &str = "@pilot-needs-help";
pub const HOST: &str = "@pilot-host";
pub const MODE: &str = "@pilot-mode";
pub const OWNER: &str = "@pilot-owner";
pub const TIER: &str = "@pilot-tier";
pub const TRUST: &str = "@pilot-trust";

/// Maximum stored description length.
pub const DESC_MAX_CHARS: usize = 80;

/// First [`DESC_MAX_CHARS`] characters of `text` on a single line.
pub fn description_from(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(DESC_MAX_CHARS)
        .collect()
}

/// A needs-help tag counts when it is set to anything but empty or `0`.
pub fn flag_is_set(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
}
