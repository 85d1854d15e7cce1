//! pilot-core: pure domain logic for tmux-pilot.
//! Agent profiles, session naming, launch commands, process-tree math, deck
//! listing/layout, pane-output monitoring and VCS status parsing. No IO.

pub mod agent;
pub mod deck;
pub mod error;
pub mod launch;
pub mod layout;
pub mod monitor;
pub mod naming;
pub mod pane;
pub mod proctree;
pub mod tags;
pub mod vcs;

pub use agent::{Agent, Keystroke};
pub use error::PilotError;
pub use launch::ExecMode;
pub use pane::{PaneRecord, PaneStatus};
pub use proctree::{ProcessEntry, ProcessTable, TreeUsage};
