//! Partition declarations and the input table.
//!
//! A declaration either places a partition relative to others or describes
//! a span overlay over already-placed partitions. Placement is always
//! relative; absolute addresses are only ever produced by the engine.

use indexmap::IndexMap;

use crate::error::Direction;

/// Where a partition wants to live, relative to the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The flexible-size partition that absorbs all remaining flash.
    Anchor,
    /// Immediately before the first target in the chain that exists.
    Before(Vec<String>),
    /// Immediately after the first target in the chain that exists.
    After(Vec<String>),
    /// At the highest address of all ordinary partitions.
    Last,
    /// No constraint. Such partitions never enter the ordered layout.
    Unplaced,
}

impl Placement {
    /// The relative direction and fallback chain, if this is a relative placement.
    pub fn chain(&self) -> Option<(Direction, &[String])> {
        match self {
            Placement::Before(targets) => Some((Direction::Before, targets)),
            Placement::After(targets) => Some((Direction::After, targets)),
            _ => None,
        }
    }

    /// The slot this placement claims: the first surviving target in `direction`.
    pub fn claims(&self, direction: Direction) -> Option<&str> {
        match self.chain() {
            Some((d, targets)) if d == direction => targets.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn is_relative(&self) -> bool {
        self.chain().is_some()
    }
}

/// The body of one declaration in the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// An ordinary partition taking part in the total order.
    Placed(Placement),
    /// An overlay over `parents`, divided evenly into `subregions`.
    Span {
        parents: Vec<String>,
        subregions: Vec<String>,
    },
}

/// One entry of the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDecl {
    /// Explicit size in bytes. When absent, the size lookup supplies it.
    pub size: Option<u64>,
    pub kind: DeclKind,
}

impl PartitionDecl {
    pub fn placed(placement: Placement, size: Option<u64>) -> Self {
        Self {
            size,
            kind: DeclKind::Placed(placement),
        }
    }

    pub fn span<P, S>(parents: P, subregions: S) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            size: None,
            kind: DeclKind::Span {
                parents: parents.into_iter().map(Into::into).collect(),
                subregions: subregions.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// The placement of an ordinary partition, `None` for spans.
    pub fn placement(&self) -> Option<&Placement> {
        match &self.kind {
            DeclKind::Placed(p) => Some(p),
            DeclKind::Span { .. } => None,
        }
    }
}

/// The full set of declarations for one layout, keyed by partition name.
///
/// Declaration order is preserved; it decides the order span children are
/// reported in and the order errors are reported in, never the layout itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTable {
    entries: IndexMap<String, PartitionDecl>,
}

impl PartitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declaration, returning the one it replaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, decl: PartitionDecl) -> Option<PartitionDecl> {
        self.entries.insert(name.into(), decl)
    }

    /// Builder form of [`insert`](Self::insert) for an ordinary partition.
    pub fn with(mut self, name: &str, placement: Placement, size: Option<u64>) -> Self {
        self.insert(name, PartitionDecl::placed(placement, size));
        self
    }

    /// Builder form of [`insert`](Self::insert) for a span overlay.
    pub fn with_span(mut self, name: &str, parents: &[&str], subregions: &[&str]) -> Self {
        self.insert(
            name,
            PartitionDecl::span(parents.iter().copied(), subregions.iter().copied()),
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&PartitionDecl> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PartitionDecl)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of every partition whose placement matches `pred`.
    pub fn names_where(&self, pred: impl Fn(&Placement) -> bool) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, d)| d.placement().is_some_and(&pred))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut PartitionDecl)> {
        self.entries.iter_mut()
    }

    pub(crate) fn into_entries(self) -> IndexMap<String, PartitionDecl> {
        self.entries
    }
}

/// An ordinary partition after span extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub size: Option<u64>,
    pub placement: Placement,
}

/// An overlay partition, resolved from the final address map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanPartition {
    pub name: String,
    /// Partitions whose combined range the overlay covers.
    pub parents: Vec<String>,
    /// Generated children, named `"{name}_{subregion}"`, in layout order.
    pub subregions: Vec<String>,
}

impl SpanPartition {
    /// The name of the generated child for `subregion`.
    pub fn child_name(&self, subregion: &str) -> String {
        format!("{}_{}", self.name, subregion)
    }
}
