//! Spawner: validates a request, names the session, starts the agent in the
//! right execution mode and tags the new pane.

use std::path::PathBuf;

use pilot_core::launch::{
    SpawnArgs, SpawnPlan, agent_shell_command, local_ssh_command, quote_remote_path,
};
use pilot_core::naming::{resolve_collision, sanitize_session_name, suggest_session_name};
use pilot_core::{ExecMode, PilotError, tags};
use pilot_tmux::{
    SshTmuxExecutor, TmuxCommandRunner, TmuxError, TmuxExecutor, list_session_names, new_session,
    set_pane_option,
};
use thiserror::Error;

use crate::config::{Config, expand_home};
use crate::hosts::HostRegistry;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(transparent)]
    Invalid(#[from] PilotError),

    #[error("no usable session name; pass one with --session")]
    NoName,

    #[error("cannot create directory {path}: {source}")]
    Directory {
        path: String,
        source: std::io::Error,
    },

    #[error("session creation failed: {0}")]
    Tmux(#[from] TmuxError),
}

impl SpawnError {
    /// Stable error class for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(e) => e.kind(),
            Self::NoName => "validation",
            Self::Directory { .. } => "directory",
            Self::Tmux(_) => "tmux",
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.kind() == "validation" { 2 } else { 1 }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.kind(), "message": self.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOutcome {
    pub session: String,
    pub mode: ExecMode,
    pub host: Option<String>,
}

impl SpawnOutcome {
    /// How to reach a session that lives on a remote tmux server.
    pub fn attach_hint(&self) -> Option<String> {
        match (self.mode, &self.host) {
            (ExecMode::RemoteTmux, Some(host)) => Some(format!(
                "ssh {host} -t \"tmux attach -t {}\"",
                self.session
            )),
            _ => None,
        }
    }
}

/// The tmux server a plan's sessions are created on.
pub enum SessionServer {
    Local(TmuxExecutor),
    Remote(SshTmuxExecutor),
}

impl SessionServer {
    pub fn for_plan(plan: &SpawnPlan, config: &Config) -> Self {
        match (plan.mode, &plan.host) {
            (ExecMode::RemoteTmux, Some(host)) => Self::Remote(SshTmuxExecutor::new(host)),
            _ => Self::Local(config.tmux()),
        }
    }
}

impl TmuxCommandRunner for SessionServer {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        match self {
            Self::Local(t) => t.run(args),
            Self::Remote(t) => t.run(args),
        }
    }
}

/// Validate `args` and start the session. `server_for` is only consulted
/// once validation passed, so an invalid request touches nothing.
pub fn spawn<R, F>(
    args: SpawnArgs,
    server_for: F,
    hosts: &HostRegistry,
) -> Result<SpawnOutcome, SpawnError>
where
    R: TmuxCommandRunner,
    F: FnOnce(&SpawnPlan) -> R,
{
    let plan = args.validate()?;

    let local_dir = match plan.mode {
        ExecMode::Local => Some(prepare_directory(&plan.directory)?),
        _ => None,
    };

    let server = server_for(&plan);
    let session = session_name(&server, &plan)?;

    let shell_command = agent_shell_command(plan.agent, &plan.prompt);
    let command = match (plan.mode, plan.host.as_deref()) {
        (ExecMode::LocalSsh, Some(host)) => {
            local_ssh_command(host, &plan.directory, plan.agent, &plan.prompt)
        }
        (ExecMode::RemoteTmux, _) => {
            format!("cd {} && {shell_command}", quote_remote_path(&plan.directory))
        }
        _ => shell_command,
    };
    let dir_arg = local_dir.as_ref().map(|d| d.to_string_lossy().into_owned());
    new_session(&server, &session, dir_arg.as_deref(), &command)?;
    tracing::debug!(session = %session, mode = %plan.mode, "session created");

    tag_session(&server, &session, &plan);

    if let Some(host) = plan.host.as_deref() {
        if let Err(e) = hosts.remember(host) {
            tracing::warn!(host, error = %e, "could not record host");
        }
    }

    Ok(SpawnOutcome {
        session,
        mode: plan.mode,
        host: plan.host,
    })
}

fn prepare_directory(raw: &str) -> Result<PathBuf, SpawnError> {
    let home = std::env::var("HOME").unwrap_or_default();
    let dir = expand_home(raw, &home);
    std::fs::create_dir_all(&dir).map_err(|source| SpawnError::Directory {
        path: dir.display().to_string(),
        source,
    })?;
    Ok(dir)
}

fn session_name(server: &impl TmuxCommandRunner, plan: &SpawnPlan) -> Result<String, SpawnError> {
    let candidate = match plan.session_name.as_deref() {
        Some(raw) => sanitize_session_name(raw),
        None => suggest_session_name(&plan.prompt, plan.agent),
    }
    .ok_or(SpawnError::NoName)?;
    let live = list_session_names(server)?;
    Ok(resolve_collision(&candidate, &live)?)
}

fn tag_session(server: &impl TmuxCommandRunner, session: &str, plan: &SpawnPlan) {
    let target = format!("{session}:");
    let description = tags::description_from(&plan.prompt);
    let mut pairs: Vec<(&str, &str)> = vec![
        (tags::DESC, description.as_str()),
        (tags::AGENT, plan.agent.as_str()),
    ];
    if let Some(host) = plan.host.as_deref() {
        pairs.push((tags::HOST, host));
        pairs.push((tags::MODE, plan.mode.as_str()));
        // The pane's own cwd is local (ssh) or unrelated; record the real one.
        pairs.push((tags::WORKDIR, plan.directory.as_str()));
    }
    for (key, value) in [
        (tags::OWNER, &plan.owner),
        (tags::TIER, &plan.tier),
        (tags::TRUST, &plan.trust),
    ] {
        if let Some(v) = value.as_deref() {
            pairs.push((key, v));
        }
    }

    for (key, value) in pairs {
        if let Err(e) = set_pane_option(server, &target, key, value) {
            tracing::warn!(session, key, error = %e, "tagging failed");
        }
    }
}

// ─── Headless command ─────────────────────────────────────────────

/// `pilot spawn`: prints the session name, or a JSON error on stderr.
/// Returns the process exit code.
pub fn cmd_spawn(config: &Config, args: SpawnArgs) -> i32 {
    let hosts = HostRegistry::new(&config.hosts_file, &config.ssh_config);
    match spawn(args, |plan| SessionServer::for_plan(plan, config), &hosts) {
        Ok(outcome) => {
            println!("{}", outcome.session);
            if let Some(hint) = outcome.attach_hint() {
                eprintln!("attach with: {hint}");
            }
            0
        }
        Err(e) => {
            eprintln!("{}", e.to_json());
            e.exit_code()
        }
    }
}

/// Fill the owner from `$TMUX_PANE` when none was given.
pub fn with_default_owner(mut args: SpawnArgs, tmux_pane: Option<String>) -> SpawnArgs {
    if args.owner.as_deref().is_none_or(|o| o.trim().is_empty()) {
        args.owner = tmux_pane.filter(|p| !p.is_empty());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Reply = fn(&[&str]) -> Result<String, TmuxError>;

    struct MockTmux {
        reply: Reply,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl MockTmux {
        fn new(reply: Reply) -> Self {
            Self { reply, calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("lock").clone()
        }

        fn option(&self, key: &str) -> Option<String> {
            self.calls()
                .into_iter()
                .find(|c| c[0] == "set-option" && c[c.len() - 2] == key)
                .and_then(|c| c.last().cloned())
        }
    }

    impl TmuxCommandRunner for MockTmux {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|s| s.to_string()).collect());
            (self.reply)(args)
        }
    }

    fn no_sessions(args: &[&str]) -> Result<String, TmuxError> {
        match args {
            ["list-sessions", ..] => Err(TmuxError::CommandFailed(
                "exit code 1: no server running on /tmp/tmux-0/default".into(),
            )),
            _ => Ok(String::new()),
        }
    }

    fn request(dir: &str) -> SpawnArgs {
        SpawnArgs {
            agent: Some("claude".into()),
            prompt: Some("Fix bug #42".into()),
            directory: Some(dir.into()),
            ..Default::default()
        }
    }

    fn registry(dir: &tempfile::TempDir) -> HostRegistry {
        HostRegistry::new(dir.path().join("hosts"), dir.path().join("ssh_config"))
    }

    #[test]
    fn local_ssh_without_agent_touches_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tmux = MockTmux::new(no_sessions);
        let args = SpawnArgs {
            agent: None,
            host: Some("devbox".into()),
            mode: Some("local-ssh".into()),
            ..request("/srv/app")
        };
        let err = spawn(args, |_| &tmux, &registry(&tmp)).expect_err("rejected");
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.exit_code(), 2);
        assert!(tmux.calls().is_empty());
        assert!(!tmp.path().join("hosts").exists());
    }

    #[test]
    fn local_spawn_creates_tagged_session() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let workdir = tmp.path().join("new/project");
        let tmux = MockTmux::new(|args| match args {
            ["list-sessions", ..] => Ok("claude-fix-42\nwork\n".into()),
            _ => Ok(String::new()),
        });
        let args = SpawnArgs {
            owner: Some("%5".into()),
            ..request(&workdir.to_string_lossy())
        };
        let outcome = spawn(args, |_| &tmux, &registry(&tmp)).expect("spawned");

        assert_eq!(outcome.session, "claude-fix-42-2");
        assert_eq!(outcome.mode, ExecMode::Local);
        assert!(outcome.attach_hint().is_none());
        assert!(workdir.is_dir());

        let calls = tmux.calls();
        let create = calls.iter().find(|c| c[0] == "new-session").expect("created");
        assert_eq!(&create[1..6], ["-d", "-s", "claude-fix-42-2", "-c", &*workdir.to_string_lossy()]);
        let command = create.last().expect("command");
        assert!(command.contains("export PATH="));
        assert!(command.contains("claude 'Fix bug #42'"));
        assert!(command.ends_with(r#"exec "${SHELL:-/bin/sh}""#));

        assert_eq!(tmux.option(tags::DESC).as_deref(), Some("Fix bug #42"));
        assert_eq!(tmux.option(tags::AGENT).as_deref(), Some("claude"));
        assert_eq!(tmux.option(tags::OWNER).as_deref(), Some("%5"));
        assert_eq!(tmux.option(tags::HOST), None);
    }

    #[test]
    fn local_ssh_spawn_wraps_command() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tmux = MockTmux::new(no_sessions);
        let args = SpawnArgs {
            host: Some("devbox".into()),
            ..request("~/src/app")
        };
        let outcome = spawn(args, |_| &tmux, &registry(&tmp)).expect("spawned");
        assert_eq!(outcome.mode, ExecMode::LocalSsh);

        let calls = tmux.calls();
        let create = calls.iter().find(|c| c[0] == "new-session").expect("created");
        assert!(!create.contains(&"-c".to_string()));
        let argv = shell_words::split(create.last().expect("command")).expect("quoted");
        assert_eq!(&argv[..3], ["ssh", "-t", "devbox"]);
        assert!(argv[3].starts_with("cd ~/"));
        assert_eq!(tmux.option(tags::MODE).as_deref(), Some("local-ssh"));
        assert_eq!(tmux.option(tags::WORKDIR).as_deref(), Some("~/src/app"));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("hosts")).expect("cached"),
            "devbox\n"
        );
    }

    #[test]
    fn remote_tmux_spawn_runs_on_remote_server() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let remote = MockTmux::new(no_sessions);
        let args = SpawnArgs {
            host: Some("gpu-1".into()),
            mode: Some("remote-tmux".into()),
            ..request("/srv/app")
        };
        let outcome = spawn(
            args,
            |plan| {
                assert_eq!(plan.mode, ExecMode::RemoteTmux);
                &remote
            },
            &registry(&tmp),
        )
        .expect("spawned");

        assert_eq!(
            outcome.attach_hint().as_deref(),
            Some("ssh gpu-1 -t \"tmux attach -t claude-fix-42\"")
        );
        let calls = remote.calls();
        assert_eq!(calls[0][0], "list-sessions");
        let create = calls.iter().find(|c| c[0] == "new-session").expect("created");
        assert!(create.last().expect("cmd").starts_with("cd /srv/app && "));
        assert_eq!(remote.option(tags::HOST).as_deref(), Some("gpu-1"));
    }

    #[test]
    fn mode_without_host_is_validation_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tmux = MockTmux::new(no_sessions);
        let args = SpawnArgs {
            mode: Some("remote-tmux".into()),
            ..request("/x")
        };
        let err = spawn(args, |_| &tmux, &registry(&tmp)).expect_err("rejected");
        assert_eq!(err.kind(), "validation");
        assert!(tmux.calls().is_empty());
    }

    #[test]
    fn numeric_override_produces_no_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tmux = MockTmux::new(no_sessions);
        let args = SpawnArgs {
            session_name: Some("1234".into()),
            ..request(&tmp.path().to_string_lossy())
        };
        let err = spawn(args, |_| &tmux, &registry(&tmp)).expect_err("no name");
        assert!(matches!(err, SpawnError::NoName));
        assert!(!tmux.calls().iter().any(|c| c[0] == "new-session"));
    }

    #[test]
    fn override_is_sanitized() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tmux = MockTmux::new(no_sessions);
        let args = SpawnArgs {
            session_name: Some("my session!!".into()),
            ..request(&tmp.path().to_string_lossy())
        };
        let outcome = spawn(args, |_| &tmux, &registry(&tmp)).expect("spawned");
        assert_eq!(outcome.session, "mysession");
    }

    #[test]
    fn creation_failure_propagates() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tmux = MockTmux::new(|args| match args {
            ["new-session", ..] => Err(TmuxError::CommandFailed("duplicate session".into())),
            other => no_sessions(other),
        });
        let err = spawn(request(&tmp.path().to_string_lossy()), |_| &tmux, &registry(&tmp))
            .expect_err("fails");
        assert_eq!(err.kind(), "tmux");
        assert_eq!(err.exit_code(), 1);
        assert!(!tmux.calls().iter().any(|c| c[0] == "set-option"));
    }

    #[test]
    fn uncreatable_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("plain-file");
        std::fs::write(&file, "x").expect("write");
        let tmux = MockTmux::new(no_sessions);
        let err = spawn(request(&file.join("sub").to_string_lossy()), |_| &tmux, &registry(&tmp))
            .expect_err("fails");
        assert_eq!(err.kind(), "directory");
        assert!(tmux.calls().is_empty());
    }

    #[test]
    fn error_json_shape() {
        let err = SpawnError::Invalid(PilotError::UnknownAgent("vim".into()));
        let json = err.to_json();
        assert_eq!(json["error"], "validation");
        assert!(json["message"].as_str().expect("message").contains("vim"));
    }

    #[test]
    fn owner_defaults_to_tmux_pane() {
        let args = with_default_owner(SpawnArgs::default(), Some("%7".into()));
        assert_eq!(args.owner.as_deref(), Some("%7"));
        let explicit = SpawnArgs { owner: Some("%1".into()), ..Default::default() };
        assert_eq!(with_default_owner(explicit, Some("%7".into())).owner.as_deref(), Some("%1"));
        assert_eq!(with_default_owner(SpawnArgs::default(), None).owner, None);
    }
}
