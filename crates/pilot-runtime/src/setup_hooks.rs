//! Generate and merge Claude hook configuration that calls `pilot hook`.

use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::cli::SetupHooksOpts;

/// Hook events that map to pane tags.
const HOOK_TYPES: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "UserPromptSubmit",
    "Notification",
    "Stop",
    "SubagentStop",
];

/// Resolve the settings.json path based on scope.
pub fn settings_path(scope: &str) -> anyhow::Result<PathBuf> {
    match scope {
        "project" => Ok(PathBuf::from(".claude/settings.json")),
        "user" => {
            let home = std::env::var("HOME")
                .map_err(|_| anyhow::anyhow!("HOME not set; cannot resolve user scope"))?;
            Ok(PathBuf::from(home).join(".claude/settings.json"))
        }
        _ => anyhow::bail!("invalid scope: {scope:?} (expected \"project\" or \"user\")"),
    }
}

/// The binary the hooks call: `--pilot-bin`, else this executable.
pub fn resolve_pilot_bin(explicit: Option<&str>) -> anyhow::Result<String> {
    match explicit {
        Some(path) => Ok(path.to_string()),
        None => Ok(std::env::current_exe()?.to_string_lossy().into_owned()),
    }
}

fn hook_command(pilot_bin: &str, hook_type: &str) -> String {
    format!("{} hook {hook_type}", shell_words::quote(pilot_bin))
}

/// Whether a hook entry runs one of our commands.
fn is_pilot_entry(entry: &Value, hook_type: &str) -> bool {
    let suffix = format!(" hook {hook_type}");
    entry["hooks"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|h| h["command"].as_str())
        .any(|cmd| cmd.ends_with(&suffix))
}

/// Merge our hook entries into `settings`, replacing earlier pilot entries
/// and keeping everything else.
pub fn merge_hooks(settings: &mut Value, pilot_bin: &str) -> anyhow::Result<()> {
    let obj = settings
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("settings.json is not a JSON object"))?;
    let hooks = obj
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("\"hooks\" in settings.json is not an object"))?;

    for hook_type in HOOK_TYPES {
        let entries = hooks
            .entry(*hook_type)
            .or_insert_with(|| Value::Array(Vec::new()));
        let Some(list) = entries.as_array_mut() else {
            anyhow::bail!("hooks.{hook_type} in settings.json is not an array");
        };
        list.retain(|entry| !is_pilot_entry(entry, hook_type));
        list.push(json!({
            "matcher": "",
            "hooks": [{
                "type": "command",
                "command": hook_command(pilot_bin, hook_type),
            }],
        }));
    }
    Ok(())
}

/// Apply hook configuration to the settings file (merge, not overwrite).
pub fn apply_hooks(opts: &SetupHooksOpts) -> anyhow::Result<PathBuf> {
    let path = settings_path(&opts.scope)?;
    let pilot_bin = resolve_pilot_bin(opts.pilot_bin.as_deref())?;

    let mut settings: Value = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        json!({})
    };
    merge_hooks(&mut settings, &pilot_bin)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let output = serde_json::to_string_pretty(&settings)?;
    std::fs::write(&path, format!("{output}\n"))?;

    Ok(path)
}

// ─── Tests ────────────────────────────────────────────────────────
