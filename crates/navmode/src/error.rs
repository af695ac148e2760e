use thiserror::Error;

/// Error type for mode state handling
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum NavmodeError {
    /// Hint mode was entered without any hints to show
    #[error("no hints to show")]
    NoHints,

    /// An action key arrived with no hint selected
    #[error("no hint selected in {mode}")]
    NoSelection { mode: &'static str },

    /// An action verb was not recognised
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
