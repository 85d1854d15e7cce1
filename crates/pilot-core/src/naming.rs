//! Session naming: derive a short tmux-safe session name from a free-text
//! prompt and resolve collisions against live sessions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::agent::Agent;
use crate::error::PilotError;

/// Width of the session column in the deck.
pub const MAX_SESSION_NAME_LEN: usize = 17;

/// Highest numeric suffix tried before giving up.
pub const MAX_COLLISION_SUFFIX: u32 = 99;

const ACTION_VERBS: &[&str] = &[
    "fix",
    "review",
    "implement",
    "add",
    "update",
    "refactor",
    "remove",
    "delete",
    "debug",
    "test",
    "create",
    "build",
    "migrate",
    "upgrade",
    "optimize",
    "document",
    "improve",
    "rewrite",
    "move",
    "rename",
    "replace",
    "clean",
    "setup",
    "configure",
];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[a-z][a-z0-9+.-]*://|www\.)\S*").expect("URL_RE regex pattern is valid")
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("NUMBER_RE regex pattern is valid"));

/// Suggest a session name for `prompt`.
///
/// Priority: `agent-verb-number`, `agent-verb-kw1-kw2`, `agent-number`,
/// then `agent-` plus the first three raw tokens. Returns `None` when nothing
/// usable survives sanitizing.
pub fn suggest_session_name(prompt: &str, agent: Agent) -> Option<String> {
    let lowered = prompt.to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, " ");
    let words: Vec<&str> = without_urls
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let verb = words.iter().copied().find(|w| ACTION_VERBS.contains(w));
    let number = NUMBER_RE.find_iter(prompt).last().map(|m| m.as_str());
    let keywords: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| w.chars().count() >= 2)
        .filter(|w| w.chars().all(char::is_alphabetic))
        .filter(|w| !ACTION_VERBS.contains(w))
        .take(2)
        .collect();

    let prefix = agent.as_str();
    let raw = match (verb, number) {
        (Some(verb), Some(number)) => format!("{prefix}-{verb}-{number}"),
        (Some(verb), None) if !keywords.is_empty() => {
            format!("{prefix}-{verb}-{}", keywords.join("-"))
        }
        (_, Some(number)) => format!("{prefix}-{number}"),
        _ => {
            let tokens: Vec<&str> = prompt.split_whitespace().take(3).collect();
            if tokens.is_empty() {
                return None;
            }
            format!("{prefix}-{}", tokens.join("-"))
        }
    };

    sanitize_session_name(&raw)
}

/// Keep `[A-Za-z0-9_-]`, truncate to [`MAX_SESSION_NAME_LEN`].
///
/// Empty and purely numeric results are rejected.
pub fn sanitize_session_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_SESSION_NAME_LEN)
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c.is_ascii_digit()) {
        None
    } else {
        Some(cleaned)
    }
}

/// Return `candidate` if free, otherwise the first free `base-N` for
/// N in 2..=[`MAX_COLLISION_SUFFIX`], with `base` shortened so the result
/// still fits the name budget.
pub fn resolve_collision(candidate: &str, taken: &HashSet<String>) -> Result<String, PilotError> {
    if !taken.contains(candidate) {
        return Ok(candidate.to_string());
    }
    for n in 2..=MAX_COLLISION_SUFFIX {
        let suffix = format!("-{n}");
        let keep = MAX_SESSION_NAME_LEN.saturating_sub(suffix.len());
        let base: String = candidate.chars().take(keep).collect();
        let next = format!("{base}{suffix}");
        if !taken.contains(&next) {
            return Ok(next);
        }
    }
    Err(PilotError::CollisionExhausted {
        base: candidate.to_string(),
        max: MAX_COLLISION_SUFFIX,
    })
}
