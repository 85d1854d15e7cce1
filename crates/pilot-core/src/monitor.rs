//! Pane-output monitoring: permission prompts, risk classification and
//! lifecycle events, all computed from captured pane text.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};

use crate::pane::PaneStatus;

// ─── Risk ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Risk {
    Safe,
    Low,
    High,
}

impl Risk {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::High => "high",
        }
    }

    /// What an operator should do with a prompt of this risk.
    pub fn suggestion(self) -> &'static str {
        match self {
            Self::Safe => "approve",
            Self::Low => "review",
            Self::High => "escalate",
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SAFE_TOOLS: &[&str] = &["Read", "Glob", "Grep", "WebSearch", "WebFetch"];
const LOW_RISK_TOOLS: &[&str] = &["Edit", "Write", "NotebookEdit"];

static SAFE_BASH: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"^git\s+(status|diff|log|branch|show)",
        r"^git\s+(fetch|rev-parse|rev-list|remote)",
        r"^(cat|head|tail|less|wc|file|ls)\b",
        r"^(find|fd)\b",
        r"^(grep|rg|ag|ack)\b",
        r"^(bazel|bazelw|\./bazelw)\s+(build|test|query|info)",
        r"^(gradle|gradlew|\./gradlew)\s+(build|test|check)\b",
        r"^(buildifier|ktfmt)\b",
        r"^(python3?|node)\s+.+\.(py|js|ts|bzl)$",
        r"^(npm|yarn|pnpm)\s+(run\s+)?(build|test|lint)\b",
        r"^(cargo|go|make)\s+(build|test|check)\b",
        r"^gh\s+(issue|pr)\s+(view|list|diff)\b",
        r"^(pwd|whoami|date|uname|which|type|printenv|env)\b",
    ])
    .expect("SAFE_BASH regex set is valid")
});

static LOW_RISK_BASH: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"^git\s+(add|commit|stash|checkout|switch|branch)\b",
        r"^git\s+worktree\s+(add|remove)\b",
        r"^(bazel|bazelw|\./bazelw)\s+run\b",
        r"^(gradle|gradlew|\./gradlew)\b",
        r"^(mkdir|cp|mv|touch|chmod)\b",
        r"^(npm|yarn|pnpm)\s+install\b",
        r"^(pip|uv)\s+install\b",
        r"^(cargo|go)\s+(install|get)\b",
    ])
    .expect("LOW_RISK_BASH regex set is valid")
});

static HIGH_RISK_BASH: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"^git\s+push\b",
        r"^git\s+(reset|rebase|merge|cherry-pick)\b",
        r"git\s+.*--force",
        r"git\s+.*--no-verify",
        r"^gh\s+pr\s+(create|merge|close|edit)\b",
        r"^gh\s+issue\s+(close|delete|edit)\b",
        r"^(rm|rmdir|unlink)\b",
        r"^(sudo|doas)\b",
        r"^(curl|wget)\s+.+(POST|PUT|DELETE|PATCH)",
        r"^docker\s+(rm|rmi|system\s+prune)\b",
    ])
    .expect("HIGH_RISK_BASH regex set is valid")
});

/// Chaining or substitution turns a harmless prefix into anything.
static CHAINING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&&|\|\||[;|]|\$\(|`").expect("CHAINING regex is valid"));

/// Risk of letting `tool` perform `action`. Unknown tools and commands are high.
pub fn classify_risk(tool: &str, action: &str) -> Risk {
    if SAFE_TOOLS.contains(&tool) {
        Risk::Safe
    } else if LOW_RISK_TOOLS.contains(&tool) {
        Risk::Low
    } else if tool == "Bash" {
        classify_bash(action)
    } else {
        Risk::High
    }
}

fn classify_bash(command: &str) -> Risk {
    let cmd = command.trim();
    if HIGH_RISK_BASH.is_match(cmd) || CHAINING.is_match(cmd) {
        Risk::High
    } else if SAFE_BASH.is_match(cmd) {
        Risk::Safe
    } else if LOW_RISK_BASH.is_match(cmd) {
        Risk::Low
    } else {
        Risk::High
    }
}

// ─── Prompt detection ─────────────────────────────────────────────

/// A permission prompt found in pane output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPrompt {
    pub raw: String,
    pub tool: String,
    pub action: String,
    pub risk: Risk,
}

static BASH_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Allow Bash[^\n]*\n(?:[^\n]*\n)*?\s*\$\s+(.+)")
        .expect("BASH_PROMPT regex is valid")
});

static TOOL_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)Allow (Edit|Write|Read|Glob|Grep|NotebookEdit|WebFetch|WebSearch)(?:\s+to)?\s+(.+?)(?:\?|$)",
    )
    .expect("TOOL_PROMPT regex is valid")
});

static GENERIC_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Do you want to (?:allow|proceed|continue)").expect("GENERIC_PROMPT regex is valid")
});

/// Scan captured pane text for permission prompts. The generic yes/no match
/// is only used when no tool-specific prompt was found.
pub fn detect_prompts(text: &str) -> Vec<DetectedPrompt> {
    let mut prompts = Vec::new();

    for caps in BASH_PROMPT.captures_iter(text) {
        let cmd = caps[1].trim().to_string();
        prompts.push(DetectedPrompt {
            raw: caps[0].trim().to_string(),
            tool: "Bash".to_string(),
            risk: classify_risk("Bash", &cmd),
            action: cmd,
        });
    }

    for caps in TOOL_PROMPT.captures_iter(text) {
        let tool = caps[1].to_string();
        let action = caps[2].trim().to_string();
        prompts.push(DetectedPrompt {
            raw: caps[0].trim().to_string(),
            risk: classify_risk(&tool, &action),
            tool,
            action,
        });
    }

    if prompts.is_empty() {
        for m in GENERIC_PROMPT.find_iter(text) {
            prompts.push(DetectedPrompt {
                raw: m.as_str().to_string(),
                tool: "unknown".to_string(),
                action: m.as_str().to_string(),
                risk: Risk::High,
            });
        }
    }

    prompts
}

// ─── Lifecycle events ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PrCreated,
    Finished,
    ContextLow,
    ContextExhausted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrCreated => "pr_created",
            Self::Finished => "finished",
            Self::ContextLow => "context_low",
            Self::ContextExhausted => "context_exhausted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    pub detail: String,
}

/// Remaining-context percentage below which `context_low` fires.
const CONTEXT_LOW_THRESHOLD: u32 = 15;

static EVENT_PATTERNS: LazyLock<Vec<(EventKind, Regex)>> = LazyLock::new(|| {
    [
        (EventKind::PrCreated, r"https?://github\.com/\S+/pull/\d+"),
        (EventKind::Finished, r"═+\s*Work Complete\s*═+"),
        (
            EventKind::ContextLow,
            r"Context left until auto-compact:\s*(\d+)%",
        ),
        (EventKind::ContextExhausted, r"(?i)auto-compact"),
    ]
    .into_iter()
    .map(|(kind, re)| (kind, Regex::new(re).expect("event regex is valid")))
    .collect()
});

/// First occurrence of each lifecycle event kind in `text`.
pub fn detect_events(text: &str) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    let mut seen = HashSet::new();

    for (kind, re) in EVENT_PATTERNS.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        if !seen.insert(*kind) {
            continue;
        }
        let detail = if *kind == EventKind::ContextLow {
            match caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                Some(pct) if pct < CONTEXT_LOW_THRESHOLD => format!("{pct}% remaining"),
                _ => continue,
            }
        } else {
            caps[0].to_string()
        };
        events.push(LifecycleEvent {
            kind: *kind,
            detail,
        });
    }

    events
}

/// `waiting` with open prompts, `done` after a finished event, else `working`.
pub fn infer_status(prompts: &[DetectedPrompt], events: &[LifecycleEvent]) -> PaneStatus {
    if !prompts.is_empty() {
        PaneStatus::Waiting
    } else if events.iter().any(|e| e.kind == EventKind::Finished) {
        PaneStatus::Done
    } else {
        PaneStatus::Working
    }
}

// ─── Report ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneReport {
    pub target: String,
    pub agent: String,
    pub status: PaneStatus,
    pub prompts: Vec<DetectedPrompt>,
    pub events: Vec<LifecycleEvent>,
}

impl PaneReport {
    pub fn from_capture(target: &str, agent: &str, text: &str) -> Self {
        let prompts = detect_prompts(text);
        let events = detect_events(text);
        Self {
            target: target.to_string(),
            agent: agent.to_string(),
            status: infer_status(&prompts, &events),
            prompts,
            events,
        }
    }

    fn is_actionable(&self) -> bool {
        !self.prompts.is_empty() || !self.events.is_empty()
    }
}

/// Compact summary when nothing needs attention. Otherwise a detailed block
/// for every pane, followed by a count of the quiet ones.
pub fn format_report(reports: &[PaneReport]) -> String {
    if reports.is_empty() {
        return "No agent panes found.".to_string();
    }

    let actionable: Vec<&PaneReport> = reports.iter().filter(|r| r.is_actionable()).collect();

    if actionable.is_empty() {
        let working = reports
            .iter()
            .filter(|r| r.status == PaneStatus::Working)
            .count();
        let done = reports
            .iter()
            .filter(|r| r.status == PaneStatus::Done)
            .count();
        let mut parts = Vec::new();
        if working > 0 {
            parts.push(format!("{working} working"));
        }
        if done > 0 {
            parts.push(format!("{done} done"));
        }
        if parts.is_empty() {
            parts.push("all idle".to_string());
        }
        return format!(
            "{} agent(s): {}. 0 prompts, 0 events.",
            reports.len(),
            parts.join(", ")
        );
    }

    let mut lines = Vec::new();
    for r in reports {
        let agent = if r.agent.is_empty() { "?" } else { &r.agent };
        lines.push(format!("=== {} ({agent}) ===", r.target));
        lines.push(format!("status: {}", r.status));
        for ev in &r.events {
            lines.push(format!("event: {}: {}", ev.kind.as_str(), ev.detail));
        }
        for p in &r.prompts {
            lines.push("prompt:".to_string());
            lines.push(format!("  raw: {:?}", p.raw));
            lines.push(format!("  tool: {}", p.tool));
            lines.push(format!("  action: {}", p.action));
            lines.push(format!("  risk: {}", p.risk));
            lines.push(format!("  suggestion: {}", p.risk.suggestion()));
        }
        lines.push(String::new());
    }

    let quiet = reports.len() - actionable.len();
    if quiet > 0 {
        lines.push(format!("({quiet} other agent(s) working quietly)"));
    }

    lines.join("\n")
}
