use keynav_protocol::Command;

use crate::{Error, Result};

/// Prefix marking a binding that runs a shell command.
const EXEC_PREFIX: &str = "exec";

/// What a hotkey binding does when its chord fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Run the string with the user's shell.
    Exec(String),
    /// Dispatch an internal command, as if received over IPC.
    Internal(Command),
}

impl HotkeyAction {
    /// Parse a binding's action string: `exec <command>` or
    /// `<command> [params...]`.
    pub fn parse(action: &str) -> Result<Self> {
        let action = action.trim();
        if let Some(rest) = action.strip_prefix(EXEC_PREFIX)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let cmd = rest.trim();
            if cmd.is_empty() {
                return Err(Error::EmptyCommand);
            }
            return Ok(Self::Exec(cmd.to_string()));
        }
        Command::parse(action)
            .map(Self::Internal)
            .ok_or_else(|| Error::Msg("empty action".into()))
    }

    /// The first word of the action: `exec` or the internal command name.
    pub fn verb(&self) -> &str {
        match self {
            Self::Exec(_) => EXEC_PREFIX,
            Self::Internal(c) => &c.action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_and_internal() {
        assert_eq!(
            HotkeyAction::parse("  exec   open -a Terminal ").unwrap(),
            HotkeyAction::Exec("open -a Terminal".into())
        );
        assert_eq!(
            HotkeyAction::parse("hints actions").unwrap(),
            HotkeyAction::Internal(Command::new("hints", ["actions"]))
        );
        // a command that merely starts with "exec" is internal
        assert_eq!(HotkeyAction::parse("executor").unwrap().verb(), "executor");
    }

    #[test]
    fn empty_exec_is_an_error() {
        assert!(matches!(HotkeyAction::parse("exec"), Err(Error::EmptyCommand)));
        assert!(matches!(HotkeyAction::parse("exec   "), Err(Error::EmptyCommand)));
        assert!(HotkeyAction::parse("  ").is_err());
    }
}
