//! Agent profile table: the single source of truth for launch, pause and
//! resume behaviour per agent kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PilotError;

// ─── Agent ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Claude,
    Gemini,
    Aider,
    Codex,
    Goose,
    Interpreter,
}

impl Agent {
    pub const ALL: [Self; 6] = [
        Self::Claude,
        Self::Gemini,
        Self::Aider,
        Self::Codex,
        Self::Goose,
        Self::Interpreter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Aider => "aider",
            Self::Codex => "codex",
            Self::Goose => "goose",
            Self::Interpreter => "interpreter",
        }
    }

    /// Argument vector that starts this agent on `prompt`.
    pub fn launch_args(self, prompt: &str) -> Vec<String> {
        let prompt = prompt.to_string();
        match self {
            Self::Claude => vec!["claude".into(), prompt],
            Self::Gemini => vec!["gemini".into(), "-i".into(), prompt],
            Self::Aider => vec!["aider".into(), "--message".into(), prompt],
            Self::Codex => vec!["codex".into(), prompt],
            // goose mangles quotes and `$` when the prompt arrives as a plain
            // argument; hand it over as a positional parameter of a sub-shell.
            Self::Goose => vec![
                "sh".into(),
                "-c".into(),
                r#"goose run --interactive --text "$1""#.into(),
                "goose".into(),
                prompt,
            ],
            Self::Interpreter => vec!["interpreter".into(), prompt],
        }
    }

    /// Keys that make the agent quit while leaving the pane's shell alive.
    pub fn pause_keys(self) -> Vec<Keystroke> {
        use Keystroke::{Key, Text};
        match self {
            Self::Claude => vec![Key("Escape"), Text("/exit".into()), Key("Enter")],
            Self::Gemini | Self::Codex => {
                vec![Key("Escape"), Text("/quit".into()), Key("Enter")]
            }
            Self::Aider | Self::Goose => vec![Text("/exit".into()), Key("Enter")],
            Self::Interpreter => vec![Key("C-c"), Text("exit".into()), Key("Enter")],
        }
    }

    /// Keys typed into the pane's shell to bring a paused agent back.
    pub fn resume_keys(self) -> Vec<Keystroke> {
        let command = match self {
            Self::Claude => "claude --continue",
            Self::Gemini => "gemini",
            Self::Aider => "aider --restore-chat-history",
            Self::Codex => "codex resume --last",
            Self::Goose => "goose session --resume",
            Self::Interpreter => "interpreter",
        };
        vec![Keystroke::Text(command.into()), Keystroke::Key("Enter")]
    }

    /// Best-effort recognition from a pane's `pane_current_command`.
    pub fn from_command(current_cmd: &str) -> Option<Self> {
        let lower = current_cmd.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|agent| lower.contains(agent.as_str()))
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Agent {
    type Err = PilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str() == wanted)
            .ok_or_else(|| PilotError::UnknownAgent(s.to_string()))
    }
}

// ─── Keystrokes ───────────────────────────────────────────────────

/// One unit sent to a pane: a tmux key name or literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Key(&'static str),
    Text(String),
}
