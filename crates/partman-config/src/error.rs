//! Error types for loading partition inputs.

use std::path::PathBuf;

/// Errors that can occur while reading declarations and build configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML deserialization error.
    #[error("TOML parse error in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// I/O error reading an input file.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declaration is structurally invalid.
    #[error("invalid declaration of '{partition}' in {}: {detail}", path.display())]
    InvalidDeclaration {
        partition: String,
        path: PathBuf,
        detail: String,
    },

    /// The same partition is declared by two files.
    #[error("partition '{name}' declared in both {} and {}", first.display(), second.display())]
    DuplicatePartition {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A configuration value could not be parsed.
    #[error("invalid value for {key} in {}: '{value}'", path.display())]
    InvalidValue {
        key: String,
        value: String,
        path: PathBuf,
    },

    /// No configuration file defines the flash size.
    #[error("unable to find 'CONFIG_FLASH_SIZE' in {}", path.display())]
    MissingFlashSize { path: PathBuf },

    /// No build configuration files were given.
    #[error("no build configuration files given")]
    NoConfigs,

    /// A scanner pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
