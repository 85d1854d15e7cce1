//! pilot-tmux: tmux and process-table IO boundary.
//! Subprocess execution, pane listing with pilot tags, capture, key
//! delivery, session/option commands and `ps` scans. No business logic.

pub mod capture;
pub mod error;
pub mod executor;
pub mod keys;
pub mod pane_info;
pub mod process;
pub mod session;

pub use capture::capture_pane;
pub use error::TmuxError;
pub use executor::{SshTmuxExecutor, TmuxCommandRunner, TmuxExecutor};
pub use keys::{is_special_key, send_keys, send_sequence};
pub use pane_info::{LIST_PANES_FORMAT, list_panes, parse_list_panes_output};
pub use process::{parse_ps_output, process_start_time, scan_process_table};
pub use session::{
    display, kill_pane, list_session_names, new_session, select_target, set_pane_option,
    unset_pane_option,
};
