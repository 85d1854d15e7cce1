//! pilot: launch, watch and steer AI coding agents running in tmux panes.
//! Single synchronous binary; tmux holds all pane state.

use clap::Parser;
use pilot_core::launch::SpawnArgs;

use crate::config::Config;
use crate::vcs::GitExecutor;

mod cli;
mod cmd_control;
mod cmd_deck;
mod cmd_ls;
mod cmd_monitor;
mod config;
mod hook;
mod hosts;
mod preview;
mod selector;
mod setup_hooks;
mod spawn;
mod vcs;

fn init_tracing() {
    let filter = std::env::var("PILOT_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

fn spawn_args(opts: cli::SpawnOpts) -> SpawnArgs {
    SpawnArgs {
        agent: opts.agent,
        prompt: opts.prompt,
        directory: opts.directory,
        session_name: opts.session,
        host: opts.host,
        mode: opts.mode,
        owner: opts.owner,
        tier: opts.tier,
        trust: opts.trust,
    }
}

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing();

    let config = Config::from_cli(&args);
    let tmux = config.tmux();
    let command = args.command.unwrap_or(cli::Command::Deck);

    match command {
        cli::Command::Deck => cmd_deck::cmd_deck(&config)?,
        cli::Command::Rows(opts) => cmd_deck::cmd_rows(&config, &opts.data)?,
        cli::Command::Preview(opts) => preview::cmd_preview(&config, opts.index, &opts.data)?,
        cli::Command::Spawn(opts) => {
            let args = spawn::with_default_owner(spawn_args(opts), std::env::var("TMUX_PANE").ok());
            let exit_code = spawn::cmd_spawn(&config, args);
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        cli::Command::Ls(opts) => cmd_ls::cmd_ls(&tmux, opts.all, opts.json)?,
        cli::Command::Pause(opts) => cmd_control::cmd_pause(&tmux, &opts.target)?,
        cli::Command::Resume(opts) => cmd_control::cmd_resume(&tmux, &opts.target)?,
        cli::Command::Kill(opts) => cmd_control::cmd_kill(&tmux, &GitExecutor, &opts.target)?,
        cli::Command::Capture(opts) => cmd_control::cmd_capture(&tmux, &opts.target, opts.lines)?,
        cli::Command::Send(opts) => cmd_control::cmd_send(&tmux, &opts.target, &opts.keys)?,
        cli::Command::Monitor(opts) => cmd_monitor::cmd_monitor(&tmux, opts.lines)?,
        cli::Command::TransferOwnership(opts) => {
            cmd_control::cmd_transfer_ownership(&tmux, &opts.old_owner, &opts.new_owner)?
        }
        cli::Command::Tag(opts) => hook::cmd_tag(&tmux, opts)?,
        cli::Command::Hook(opts) => hook::cmd_hook(&tmux, opts.event, opts.target),
        cli::Command::SetupHooks(opts) => {
            let path = setup_hooks::apply_hooks(&opts)?;
            println!("hooks written to {}", path.display());
        }
        cli::Command::Hosts => {
            let hosts = hosts::HostRegistry::new(&config.hosts_file, &config.ssh_config);
            for host in hosts.known_hosts() {
                println!("{host}");
            }
        }
    }

    Ok(())
}
