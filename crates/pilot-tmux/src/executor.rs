//! TmuxCommandRunner trait, the local TmuxExecutor and the ssh-proxied
//! SshTmuxExecutor used for remote-tmux spawns.

use crate::error::TmuxError;

/// Everything that talks to a tmux server goes through this, so tests can
/// record calls instead of running tmux.
pub trait TmuxCommandRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

/// Local tmux, invoked as `TMUX_BIN ARGS...`.
pub struct TmuxExecutor {
    tmux_bin: String,
}

impl TmuxExecutor {
    pub fn new(tmux_bin: impl Into<String>) -> Self {
        Self {
            tmux_bin: tmux_bin.into(),
        }
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        tracing::debug!(?args, "tmux");
        let output = std::process::Command::new(&self.tmux_bin)
            .args(args)
            .output()
            .map_err(TmuxError::Io)?;
        output_or_error(output)
    }
}

/// Runs tmux on a remote host through `ssh HOST tmux ...`.
///
/// ssh joins its trailing arguments into one remote shell line, so every
/// tmux argument is shell-quoted here.
pub struct SshTmuxExecutor {
    host: String,
    ssh_bin: String,
    tmux_bin: String,
}

impl SshTmuxExecutor {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ssh_bin: "ssh".to_string(),
            tmux_bin: "tmux".to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote shell line for `args`.
    pub fn remote_command(&self, args: &[&str]) -> String {
        shell_words::join(std::iter::once(self.tmux_bin.as_str()).chain(args.iter().copied()))
    }
}

impl TmuxCommandRunner for SshTmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        let remote = self.remote_command(args);
        tracing::debug!(host = %self.host, %remote, "ssh tmux");
        let output = std::process::Command::new(&self.ssh_bin)
            .args([self.host.as_str(), "--", remote.as_str()])
            .output()
            .map_err(TmuxError::Io)?;
        output_or_error(output)
    }
}

fn output_or_error(output: std::process::Output) -> Result<String, TmuxError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TmuxError::CommandFailed(format!(
            "exit code {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
