//! Flash partition layout engine.
//!
//! Firmware for a multi-image device (bootloader, secure firmware,
//! application, provisioning data, ...) is built from independently built
//! images, each of which only says where its partition goes *relative* to
//! others. This crate turns those declarations into one non-overlapping
//! layout that covers the whole flash.
//!
//! ## Modules
//!
//! - [`partition`]: declarations and the input table
//! - [`normalize`]: fallback-chain pruning and up-front validation
//! - [`span`]: span overlay extraction and apportionment
//! - [`size`]: binding sizes from declarations and external lookups
//! - [`resolve`]: total order from relative placements
//! - [`assign`]: addresses and sizes, anchor takes the residual
//! - [`layout`]: the resolved name → region map
//! - [`pipeline`]: all of the above in one call

pub mod assign;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod partition;
pub mod pipeline;
pub mod resolve;
pub mod size;
pub mod span;

// Re-exports for convenience.
pub use error::{Direction, LayoutError, Result};
pub use layout::{Layout, Region, RegionKind};
pub use partition::{DeclKind, Partition, PartitionDecl, PartitionTable, Placement, SpanPartition};
pub use pipeline::{resolve_layout, Resolution};
pub use resolve::PlacementOrder;
pub use size::{NoSizes, SizeLookup};
pub use span::SpanAllocation;
