//! Serializable summaries of registered commands.
//!
//! Remote consoles fetch these as JSON to build completion lists and
//! offline help without running any command.

use helm_types::AccessLevel;
use serde::Serialize;

use crate::descriptor::CommandDescriptor;

/// A dispatcher and every command registered under it.
#[derive(Debug, Serialize)]
pub struct DispatcherSummary<'a> {
    pub name: &'a str,
    pub help: &'a str,
    pub access: AccessLevel,
    pub commands: Vec<CommandSummary<'a>>,
}

/// A command under the name it was registered with.
#[derive(Debug, Serialize)]
pub struct CommandSummary<'a> {
    pub name: &'a str,
    pub command: &'a CommandDescriptor,
}
