//! Size resolution.
//!
//! Most partitions do not declare their size directly; it comes from the
//! build configuration of the image that owns them. Sizes are bound once,
//! before ordering starts, so the resolver and the address assigner only
//! ever see a finished snapshot.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;

use crate::error::{LayoutError, Result};
use crate::partition::Placement;
use crate::span::PlacedTable;

/// Source of externally resolved partition sizes.
pub trait SizeLookup {
    /// Size in bytes reserved for `partition`, if known.
    fn size_of(&self, partition: &str) -> Option<u64>;
}

impl<S: BuildHasher> SizeLookup for HashMap<String, u64, S> {
    fn size_of(&self, partition: &str) -> Option<u64> {
        self.get(partition).copied()
    }
}

impl<S: BuildHasher> SizeLookup for IndexMap<String, u64, S> {
    fn size_of(&self, partition: &str) -> Option<u64> {
        self.get(partition).copied()
    }
}

impl SizeLookup for BTreeMap<String, u64> {
    fn size_of(&self, partition: &str) -> Option<u64> {
        self.get(partition).copied()
    }
}

/// A lookup that knows nothing; every partition must declare its size.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSizes;

impl SizeLookup for NoSizes {
    fn size_of(&self, _partition: &str) -> Option<u64> {
        None
    }
}

/// Ordinary partitions together with the size of every one but the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedTable {
    placed: PlacedTable,
    sizes: IndexMap<String, u64>,
}

impl SizedTable {
    pub fn placed(&self) -> &PlacedTable {
        &self.placed
    }

    /// The bound size of `partition`. The anchor never has one.
    pub fn size_of(&self, partition: &str) -> Result<u64> {
        self.sizes
            .get(partition)
            .copied()
            .ok_or_else(|| LayoutError::MissingSize {
                partition: partition.to_string(),
            })
    }
}

/// Give every non-anchor partition a size: its declared one if present,
/// otherwise whatever `lookup` reports.
pub fn bind_sizes(placed: PlacedTable, lookup: &dyn SizeLookup) -> Result<SizedTable> {
    let mut sizes = IndexMap::new();
    for partition in placed.partitions() {
        if partition.placement == Placement::Anchor {
            continue;
        }
        let size = partition
            .size
            .or_else(|| lookup.size_of(&partition.name))
            .ok_or_else(|| LayoutError::MissingSize {
                partition: partition.name.clone(),
            })?;
        sizes.insert(partition.name.clone(), size);
    }
    Ok(SizedTable { placed, sizes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::partition::PartitionTable;
    use crate::span::extract_spans;

    fn placed(table: PartitionTable) -> PlacedTable {
        extract_spans(normalize(table).unwrap()).0
    }

    #[test]
    fn explicit_size_wins_over_lookup() {
        let table = PartitionTable::new()
            .with("mcuboot", Placement::Before(vec!["app".into()]), Some(0x8000))
            .with("app", Placement::Anchor, None);
        let lookup = HashMap::from([("mcuboot".to_string(), 0xc000u64)]);
        let sized = bind_sizes(placed(table), &lookup).unwrap();
        assert_eq!(sized.size_of("mcuboot").unwrap(), 0x8000);
    }

    #[test]
    fn lookup_fills_missing_sizes() {
        let table = PartitionTable::new()
            .with("spm", Placement::Before(vec!["app".into()]), None)
            .with("app", Placement::Anchor, None);
        let lookup = BTreeMap::from([("spm".to_string(), 0x10000u64)]);
        let sized = bind_sizes(placed(table), &lookup).unwrap();
        assert_eq!(sized.size_of("spm").unwrap(), 0x10000);
    }

    #[test]
    fn anchor_is_never_sized() {
        let table = PartitionTable::new().with("app", Placement::Anchor, Some(5));
        let sized = bind_sizes(placed(table), &NoSizes).unwrap();
        assert!(sized.size_of("app").is_err());
    }

    #[test]
    fn unknown_size_is_an_error() {
        let table = PartitionTable::new()
            .with("spm", Placement::Before(vec!["app".into()]), None)
            .with("app", Placement::Anchor, None);
        assert_eq!(
            bind_sizes(placed(table), &NoSizes).unwrap_err(),
            LayoutError::MissingSize {
                partition: "spm".into()
            }
        );
    }
}
