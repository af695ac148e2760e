//! Wire types shared by the keynav daemon and its clients.
//!
//! A request is a [`Command`]; the reply is a [`Response`]. Both travel as
//! JSON documents inside length-delimited frames (see [`ipc`]).
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod ipc;

/// A request: an action name plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Action such as `hints`, `status` or `idle`.
    pub action: String,
    /// Positional parameters.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Command {
    /// Build a command from an action and arguments.
    pub fn new<I, S>(action: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: action.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated line (`hints actions`) into a command.
    /// Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let action = parts.next()?;
        Some(Self::new(action, parts))
    }
}

/// The daemon's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// True when the command was carried out.
    pub success: bool,
    /// Human-readable outcome.
    #[serde(default)]
    pub message: String,
    /// Structured payload for `status` and `config`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    /// Successful reply with a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Failed reply with a message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Successful reply carrying `data`.
    pub fn with_data(data: Value) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }
}

/// Payload of the `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    /// Whether the daemon accepts activations.
    pub enabled: bool,
    /// Current mode name: `idle`, `hints`, `grid` or `scroll`.
    pub mode: String,
    /// Config file in use, or a note that defaults are active.
    pub config: String,
}
