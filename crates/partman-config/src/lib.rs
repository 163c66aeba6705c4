//! Inputs to the partition layout engine.
//!
//! - [`declaration`]: `pm.toml` partition declaration files
//! - [`autoconf`]: reserved sizes and flash capacity from `autoconf.h`
//! - [`project`]: merging every image's declarations into one table

pub mod autoconf;
pub mod declaration;
pub mod error;
pub mod project;

pub use autoconf::{flash_size, BuildConfig, ConfigScanner, ReservedSizes};
pub use declaration::{DeclarationFile, PlacementDecl};
pub use error::{ConfigError, Result};
pub use project::{AnchorImage, Image, Project};
