//! Configuration file loading for boardroom
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BOARDROOM_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./boardroom.toml` or `./.boardroom.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/boardroom/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAlignmentConfig, FileConfig, FileLearningConfig, FileLoggingConfig, FileOutputConfig,
    FileRoleConfig, FileUpgradeConfig, FileVotingConfig, FileWeightsConfig,
};
pub use loader::ConfigLoader;
