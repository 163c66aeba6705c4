//! Layout resolution errors.
//!
//! Every error here is a fatal configuration error: a flash layout is either
//! fully resolved and tiles the whole device, or it is not produced at all.

use std::fmt;

/// Which side of a target a relative placement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// Placed immediately before (at a lower address than) the target.
    Before,
    /// Placed immediately after (at a higher address than) the target.
    After,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Before => write!(f, "before"),
            Direction::After => write!(f, "after"),
        }
    }
}

/// Errors that can occur while resolving a partition layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// No partition is marked as the anchor.
    #[error("no anchor partition declared")]
    MissingAnchor,

    /// More than one partition is marked as the anchor.
    #[error("multiple anchor partitions declared: {}", names.join(", "))]
    MultipleAnchors { names: Vec<String> },

    /// More than one partition asks to be placed last.
    #[error("multiple partitions placed last: {}", names.join(", "))]
    MultipleLast { names: Vec<String> },

    /// Every target in a placement chain was absent from the input set.
    #[error("partition '{partition}' is placed {direction} [{}], none of which exist", targets.join(", "))]
    EmptyPlacementChain {
        partition: String,
        direction: Direction,
        targets: Vec<String>,
    },

    /// More than one partition claims the same immediate neighbour slot.
    #[error("ambiguous placement: {} all claim to be immediately {direction} '{slot}'", claimants.join(", "))]
    AmbiguousPlacement {
        slot: String,
        direction: Direction,
        claimants: Vec<String>,
    },

    /// A partition's placement chain never connects to the anchor or the last chain.
    #[error("partition '{partition}' (placed {direction} '{target}') cannot be connected to the layout")]
    Unreachable {
        partition: String,
        direction: Direction,
        target: String,
    },

    /// A partition has neither an explicit nor an externally resolved size.
    #[error("no size found for partition '{partition}'")]
    MissingSize { partition: String },

    /// Fixed-size partitions need more space than the flash provides.
    #[error("partitions require {required:#x} bytes but flash is only {available:#x} bytes")]
    FlashOverflow { required: u64, available: u64 },

    /// None of a span's parents are present in the resolved layout.
    #[error("no compatible parent partition found for span '{span}'")]
    NoCompatibleParent { span: String },

    /// A span's present parents do not form one contiguous range in list order.
    #[error("span '{span}' is not contiguous: parent '{parent}' does not start where the previous parent ends")]
    DisjointSpanParents { span: String, parent: String },

    /// A span declares no subregions to divide its range into.
    #[error("span '{span}' declares no subregions")]
    EmptySubregions { span: String },

    /// A generated span child collides with an existing partition name.
    #[error("span '{span}' generates '{name}', which is already a partition")]
    DuplicateName { span: String, name: String },

    /// The resolved ordinary partitions do not exactly cover the flash.
    #[error("layout does not tile flash: {detail}")]
    TilingViolation { detail: String },
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
