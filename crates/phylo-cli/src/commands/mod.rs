//! CLI command implementations.

pub mod init;
pub mod run;
pub mod session;
pub mod show;
pub mod stats;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use phylo::prelude::*;

use crate::config::current_session_path;

/// Load the current session, or explain how to create one.
pub(crate) fn load_current() -> Result<Population> {
    let session_path = current_session_path()?;
    if !session_path.exists() {
        bail!("No session found. Run {} first.", "phylo run".cyan());
    }
    load_from_path(&session_path)
        .with_context(|| format!("Failed to load session: {}", session_path.display()))
}
