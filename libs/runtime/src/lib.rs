//! Process-level plumbing shared by the user server binary: layered
//! configuration, logging bootstrap, home directory resolution and the
//! shutdown signal.

pub mod config;
pub mod home_dir;
pub mod logging;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
pub use home_dir::resolve_home_dir;
pub use logging::{init_default_logging, init_logging_from_config};
pub use shutdown::{shutdown_token, wait_for_shutdown};
