//! Configuration for the keynav daemon: typed sections with defaults, RON
//! loading and validation.
#![allow(missing_docs)]

mod defaults;
mod error;
mod loader;
mod types;
mod validate;

#[cfg(test)]
mod test_parse;

pub use error::{Error, Result};
pub use loader::{
    LoadedConfig, config_search_paths, from_ron_str, load, load_from_path, resolve_config_path,
};
pub use types::{
    Action, AppConfig, AppRoles, AxSupport, Config, General, Grid, HintStyle, Hints, Hotkeys,
    Logging, Scroll,
};
pub use validate::validate_chord;
