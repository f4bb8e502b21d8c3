//! Chat commands for editing a channel's forward targets.

use std::fmt;

/// A parsed `forward` subcommand. The invoking channel is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardCommand {
    Add { address: String },
    Remove { address: String },
    Clear,
    List,
}

impl ForwardCommand {
    /// Parse command text such as `add discord:200`. Returns `None` for
    /// unknown subcommands or a missing address.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let cmd = text.split_whitespace().next().unwrap_or("");
        let args = text[cmd.len()..].trim();

        match (cmd.to_ascii_lowercase().as_str(), args) {
            ("add", address) if !address.is_empty() => Some(Self::Add {
                address: address.to_string(),
            }),
            ("remove" | "rm", address) if !address.is_empty() => Some(Self::Remove {
                address: address.to_string(),
            }),
            ("clear", "") => Some(Self::Clear),
            ("list" | "ls", "") => Some(Self::List),
            _ => None,
        }
    }
}

/// User-visible outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Updated,
    Unchanged,
    NoMatchingBot { address: String },
    InvalidAddress { address: String },
    UpdateFailed,
    ReadOnly,
    /// Addresses of the channel's targets, in order.
    Targets(Vec<String>),
    NoTargets,
    Usage,
}

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated => f.write_str("Forward targets updated."),
            Self::Unchanged => f.write_str("Forward targets unchanged."),
            Self::NoMatchingBot { address } => write!(f, "No matching bot for {address}."),
            Self::InvalidAddress { address } => {
                write!(f, "Invalid address {address}, expected platform:channel.")
            },
            Self::UpdateFailed => f.write_str("Failed to update forward targets."),
            Self::ReadOnly => f.write_str(
                "Forward targets are defined in the configuration file and cannot be changed here.",
            ),
            Self::Targets(addresses) => {
                f.write_str("Forward targets for this channel:")?;
                for address in addresses {
                    write!(f, "\n{address}")?;
                }
                Ok(())
            },
            Self::NoTargets => f.write_str("This channel has no forward targets."),
            Self::Usage => f.write_str("Usage: forward add <address> | remove <address> | clear | list"),
        }
    }
}
