//! Key and text delivery to panes.
//!
//! tmux key names go through `send-keys`. Free text is pasted from a named
//! buffer with bracketed paste so popups and key tables in the target pane
//! cannot intercept individual characters.

use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use pilot_core::{Agent, Keystroke};
use regex::Regex;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

static SPECIAL_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(Enter|Escape|Tab|BTab|Space|BSpace|NPage|PPage|Up|Down|Left|Right|Home|End|IC|DC|F[0-9]{1,2}|[CMS]-.+)$",
    )
    .expect("special key regex pattern is valid")
});

const PASTE_BUFFER: &str = "pilot-send";

/// Claude's input box needs time to absorb a paste before it accepts keys.
const CLAUDE_PASTE_SETTLE: Duration = Duration::from_millis(300);
const CLAUDE_ESCAPE_SETTLE: Duration = Duration::from_millis(100);

/// True when `keys` is a single tmux key name rather than text.
pub fn is_special_key(keys: &str) -> bool {
    SPECIAL_KEY_RE.is_match(keys)
}

/// Send `keys` to `target`: a key name is pressed, anything else is pasted.
///
/// For Claude panes pasted text is also submitted: the paste lands in the
/// prompt editor, `Escape` closes any completion popup and `Enter` sends it.
pub fn send_keys(
    runner: &impl TmuxCommandRunner,
    target: &str,
    keys: &str,
    agent: Option<Agent>,
) -> Result<(), TmuxError> {
    if is_special_key(keys) {
        return press(runner, target, keys);
    }
    paste_text(runner, target, keys)?;
    if agent == Some(Agent::Claude) {
        thread::sleep(CLAUDE_PASTE_SETTLE);
        press(runner, target, "Escape")?;
        thread::sleep(CLAUDE_ESCAPE_SETTLE);
        press(runner, target, "Enter")?;
    }
    Ok(())
}

/// Deliver a pause/resume sequence. Text is typed literally so slash
/// commands reach the agent as keystrokes.
pub fn send_sequence(
    runner: &impl TmuxCommandRunner,
    target: &str,
    sequence: &[Keystroke],
) -> Result<(), TmuxError> {
    for stroke in sequence {
        match stroke {
            Keystroke::Key(key) => press(runner, target, key)?,
            Keystroke::Text(text) => {
                runner.run(&["send-keys", "-t", target, "-l", "--", text])?;
            }
        }
    }
    Ok(())
}

fn press(runner: &impl TmuxCommandRunner, target: &str, key: &str) -> Result<(), TmuxError> {
    runner.run(&["send-keys", "-t", target, key])?;
    Ok(())
}

fn paste_text(runner: &impl TmuxCommandRunner, target: &str, text: &str) -> Result<(), TmuxError> {
    runner.run(&["set-buffer", "-b", PASTE_BUFFER, "--", text])?;
    runner.run(&["paste-buffer", "-d", "-p", "-b", PASTE_BUFFER, "-t", target])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl TmuxCommandRunner for Recorder {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|s| s.to_string()).collect());
            Ok(String::new())
        }
    }

    #[test]
    fn special_key_names() {
        for key in ["Enter", "Escape", "BTab", "C-c", "M-x", "S-Left", "F1", "F12", "DC"] {
            assert!(is_special_key(key), "{key}");
        }
        for text in ["hello", "enter", "F123", "C-", "yes please", "/exit"] {
            assert!(!is_special_key(text), "{text}");
        }
    }

    #[test]
    fn special_key_goes_through_send_keys() {
        let runner = Recorder::default();
        send_keys(&runner, "s:0.0", "C-c", Some(Agent::Claude)).expect("ok");
        assert_eq!(runner.calls(), vec![vec!["send-keys", "-t", "s:0.0", "C-c"]]);
    }

    #[test]
    fn text_is_pasted() {
        let runner = Recorder::default();
        send_keys(&runner, "s:0.0", "run the tests\nthen report", Some(Agent::Aider))
            .expect("ok");
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0][0], "set-buffer");
        assert_eq!(calls[0].last().map(String::as_str), Some("run the tests\nthen report"));
        assert_eq!(
            calls[1],
            vec!["paste-buffer", "-d", "-p", "-b", PASTE_BUFFER, "-t", "s:0.0"]
        );
    }

    #[test]
    fn claude_text_is_submitted() {
        let runner = Recorder::default();
        send_keys(&runner, "%3", "continue", Some(Agent::Claude)).expect("ok");
        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], vec!["send-keys", "-t", "%3", "Escape"]);
        assert_eq!(calls[3], vec!["send-keys", "-t", "%3", "Enter"]);
    }

    #[test]
    fn sequence_types_text_literally() {
        let runner = Recorder::default();
        send_sequence(&runner, "a:1.0", &Agent::Claude.pause_keys()).expect("ok");
        assert_eq!(
            runner.calls(),
            vec![
                vec!["send-keys", "-t", "a:1.0", "Escape"],
                vec!["send-keys", "-t", "a:1.0", "-l", "--", "/exit"],
                vec!["send-keys", "-t", "a:1.0", "Enter"],
            ]
        );
    }

    #[test]
    fn failure_stops_sequence() {
        struct Failing;
        impl TmuxCommandRunner for Failing {
            fn run(&self, _args: &[&str]) -> Result<String, TmuxError> {
                Err(TmuxError::CommandFailed("can't find pane".into()))
            }
        }
        assert!(send_sequence(&Failing, "x", &Agent::Aider.resume_keys()).is_err());
    }
}
