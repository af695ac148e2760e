//! Interaction modes for keyboard navigation.
//!
//! [`State`] is a pure state machine: it consumes [`Key`]s and answers with a
//! [`ModeResponse`] describing what the caller should draw or do. It never
//! touches the screen or the accessibility tree itself.
mod action;
mod error;
mod key;
mod scroll;
mod state;

pub use action::{ActionKeys, ClickAction, MenuItem, action_menu};
pub use error::NavmodeError;
pub use key::Key;
pub use scroll::{ScrollKey, ScrollKeys, ScrollOp, ScrollSteps};
pub use state::{HintVariant, Mode, ModeResponse, ScrollTarget, State};
