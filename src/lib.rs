// modtools - conversion between mod descriptor formats
//
// This is the library crate holding the project model, path rules and codecs.
// The binary crate (main.rs) provides the command-line front end.

pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod paths;
pub mod services;

// Re-export commonly used types for convenience
pub use codec::FileKind;
pub use config::ConfigManager;
pub use error::{ModError, Result};
pub use models::{ModSolution, ProjectModel, ToolSettings};
pub use services::ConversionService;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
