//! Partition declaration file (`pm.toml`) parsing.
//!
//! Each image that needs flash space ships a declaration file next to its
//! build output. Every top-level table declares one partition:
//!
//! ```toml
//! [mcuboot]
//! size = 0xc000
//! placement = { before = ["spm", "app"] }
//!
//! [mcuboot_partitions]
//! inside = ["spm", "app"]
//! sub_partitions = ["primary", "secondary"]
//! ```
//!
//! The first table is the image's own partition.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use partman_core::{PartitionDecl, Placement};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// A placement as written in a declaration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementDecl {
    Anchor,
    Last,
    Before(Vec<String>),
    After(Vec<String>),
}

impl From<PlacementDecl> for Placement {
    fn from(decl: PlacementDecl) -> Self {
        match decl {
            PlacementDecl::Anchor => Placement::Anchor,
            PlacementDecl::Last => Placement::Last,
            PlacementDecl::Before(targets) => Placement::Before(targets),
            PlacementDecl::After(targets) => Placement::After(targets),
        }
    }
}

/// One table of a declaration file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPartition {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    placement: Option<PlacementDecl>,
    #[serde(default)]
    inside: Option<Vec<String>>,
    #[serde(default)]
    sub_partitions: Option<Vec<String>>,
}

/// A parsed declaration file.
#[derive(Debug, Clone)]
pub struct DeclarationFile {
    /// Where the file was read from; its directory is the image's output directory.
    pub path: PathBuf,
    /// Declared partitions, in file order.
    pub partitions: IndexMap<String, PartitionDecl>,
}

impl DeclarationFile {
    /// Parse a declaration file's contents. `path` is only used for
    /// locating outputs and for error messages.
    pub fn parse(input: &str, path: &Path) -> Result<Self> {
        let raw: IndexMap<String, RawPartition> =
            toml::from_str(input).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;

        let mut partitions = IndexMap::with_capacity(raw.len());
        for (name, entry) in raw {
            let decl = validate(&name, entry, path)?;
            partitions.insert(name, decl);
        }

        Ok(Self {
            path: path.to_path_buf(),
            partitions,
        })
    }

    /// Read and parse a declaration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// The partition this file's image occupies.
    pub fn image(&self) -> Option<&str> {
        self.partitions.keys().next().map(String::as_str)
    }

    /// Directory the image's generated files go into.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn validate(name: &str, entry: RawPartition, path: &Path) -> Result<PartitionDecl> {
    let invalid = |detail: &str| ConfigError::InvalidDeclaration {
        partition: name.to_string(),
        path: path.to_path_buf(),
        detail: detail.to_string(),
    };

    match (entry.inside, entry.sub_partitions) {
        (Some(parents), Some(subregions)) => {
            if entry.placement.is_some() || entry.size.is_some() {
                return Err(invalid("a span takes neither 'placement' nor 'size'"));
            }
            if subregions.is_empty() {
                return Err(invalid("'sub_partitions' must not be empty"));
            }
            Ok(PartitionDecl::span(parents, subregions))
        }
        (Some(_), None) => Err(invalid("'inside' requires 'sub_partitions'")),
        (None, Some(_)) => Err(invalid("'sub_partitions' requires 'inside'")),
        (None, None) => {
            let placement = entry.placement.map_or(Placement::Unplaced, Placement::from);
            if let Some((_, targets)) = placement.chain() {
                if targets.is_empty() {
                    return Err(invalid("placement target list is empty"));
                }
            }
            Ok(PartitionDecl::placed(placement, entry.size))
        }
    }
}
