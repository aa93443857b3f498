//! Application runtime composition modules.

pub(crate) mod config_file;
pub(crate) mod runtime;
pub(crate) mod terminal;
