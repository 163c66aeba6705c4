//! Build configuration (`autoconf.h`) scanning.
//!
//! Images reserve flash through their generated configuration headers:
//!
//! ```c
//! #define CONFIG_PARTITION_MANAGER_RESERVED_SPACE_MCUBOOT 0xc000
//! #define CONFIG_FLASH_SIZE 1024
//! ```
//!
//! Reserved sizes are keyed by the lower-cased partition name. The flash
//! size is given in KiB.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use partman_core::SizeLookup;
use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

const RESERVED_PATTERN: &str =
    r"^#define CONFIG_PARTITION_MANAGER_RESERVED_SPACE_(\w+) (0x[0-9a-fA-F]+)";
const FLASH_SIZE_PATTERN: &str = r"^#define CONFIG_FLASH_SIZE (\d+)";

/// What one configuration header says about flash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    pub path: PathBuf,
    /// Non-zero reserved sizes, keyed by lower-cased partition name.
    pub reserved: IndexMap<String, u64>,
    /// Total flash capacity in bytes, if defined.
    pub flash_size: Option<u64>,
}

/// Line scanner for configuration headers.
#[derive(Debug, Clone)]
pub struct ConfigScanner {
    reserved: Regex,
    flash_size: Regex,
}

impl ConfigScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            reserved: Regex::new(RESERVED_PATTERN)?,
            flash_size: Regex::new(FLASH_SIZE_PATTERN)?,
        })
    }

    /// Scan a header's contents. `path` is only used in error messages.
    pub fn scan(&self, input: &str, path: &Path) -> Result<BuildConfig> {
        let mut config = BuildConfig {
            path: path.to_path_buf(),
            ..BuildConfig::default()
        };

        for line in input.lines() {
            if let Some(caps) = self.reserved.captures(line) {
                let size = parse_hex(&caps[2]).ok_or_else(|| ConfigError::InvalidValue {
                    key: format!("CONFIG_PARTITION_MANAGER_RESERVED_SPACE_{}", &caps[1]),
                    value: caps[2].to_string(),
                    path: path.to_path_buf(),
                })?;
                if size != 0 {
                    config.reserved.insert(caps[1].to_lowercase(), size);
                }
            } else if let Some(caps) = self.flash_size.captures(line) {
                if config.flash_size.is_none() {
                    let invalid = || ConfigError::InvalidValue {
                        key: "CONFIG_FLASH_SIZE".into(),
                        value: caps[1].to_string(),
                        path: path.to_path_buf(),
                    };
                    let kib: u64 = caps[1].parse().map_err(|_| invalid())?;
                    config.flash_size = Some(kib.checked_mul(1024).ok_or_else(invalid)?);
                }
            }
        }

        debug!(path = %path.display(), reserved = config.reserved.len(), flash_size = ?config.flash_size, "scanned build configuration");
        Ok(config)
    }

    /// Read and scan a header.
    pub fn load(&self, path: &Path) -> Result<BuildConfig> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.scan(&content, path)
    }
}

fn parse_hex(literal: &str) -> Option<u64> {
    let digits = literal.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}

/// Reserved sizes merged across every image's configuration.
///
/// When two headers reserve space for the same partition, the one given
/// later wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedSizes {
    sizes: IndexMap<String, u64>,
}

impl ReservedSizes {
    pub fn from_configs(configs: &[BuildConfig]) -> Self {
        let mut sizes = IndexMap::new();
        for config in configs {
            for (name, size) in &config.reserved {
                sizes.insert(name.clone(), *size);
            }
        }
        Self { sizes }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl SizeLookup for ReservedSizes {
    fn size_of(&self, partition: &str) -> Option<u64> {
        self.sizes.size_of(partition)
    }
}

/// Flash capacity, taken from the first configuration header.
pub fn flash_size(configs: &[BuildConfig]) -> Result<u64> {
    let first = configs.first().ok_or(ConfigError::NoConfigs)?;
    first.flash_size.ok_or_else(|| ConfigError::MissingFlashSize {
        path: first.path.clone(),
    })
}
