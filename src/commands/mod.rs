//! Command handlers — one module per subcommand.

pub mod install;
pub mod releases;
pub mod start;
pub mod status;
pub mod stop;
pub mod uninstall;
