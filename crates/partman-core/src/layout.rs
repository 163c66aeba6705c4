//! The resolved flash layout.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{LayoutError, Result};

/// What produced a region of the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RegionKind {
    /// An ordinary partition taking part in the non-overlapping tiling.
    Ordinary,
    /// A subregion generated from a span overlay.
    SpanChild { span: String },
}

/// A resolved address range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    /// Offset from the start of flash, in bytes.
    pub address: u64,
    /// Size in bytes.
    pub size: u64,
    #[serde(flatten)]
    pub kind: RegionKind,
}

impl Region {
    pub fn ordinary(address: u64, size: u64) -> Self {
        Self {
            address,
            size,
            kind: RegionKind::Ordinary,
        }
    }

    /// One past the last byte of the region.
    pub fn end(&self) -> u64 {
        self.address + self.size
    }

    pub fn is_ordinary(&self) -> bool {
        self.kind == RegionKind::Ordinary
    }
}

/// Final mapping from partition name to its address range.
///
/// Iteration follows insertion order: ordinary partitions in placement
/// order first, then span children in span declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Layout {
    regions: IndexMap<String, Region>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region. Fails if the name is already taken.
    pub(crate) fn insert(&mut self, name: String, region: Region) -> std::result::Result<(), String> {
        if self.regions.contains_key(&name) {
            return Err(name);
        }
        self.regions.insert(name, region);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Regions sorted by ascending address.
    ///
    /// The sort is stable, so a span child sharing an address with its
    /// parent sorts after it. The index in this sequence is the region's
    /// flash area id.
    pub fn by_address(&self) -> Vec<(&str, &Region)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by_key(|(_, r)| r.address);
        sorted
    }

    /// Flash area id of every region, keyed by name.
    pub fn area_ids(&self) -> IndexMap<&str, usize> {
        self.by_address()
            .into_iter()
            .enumerate()
            .map(|(id, (name, _))| (name, id))
            .collect()
    }

    /// Check that the partitions named in `order` are contiguous, start at
    /// zero and end exactly at `flash_size`.
    pub fn check_tiling(&self, order: &[String], flash_size: u64) -> Result<()> {
        let mut expected = 0u64;
        for name in order {
            let region = self.get(name).ok_or_else(|| LayoutError::TilingViolation {
                detail: format!("'{name}' has no address"),
            })?;
            if region.address != expected {
                return Err(LayoutError::TilingViolation {
                    detail: format!(
                        "'{name}' starts at {:#x}, expected {expected:#x}",
                        region.address
                    ),
                });
            }
            expected = region.end();
        }
        if expected != flash_size {
            return Err(LayoutError::TilingViolation {
                detail: format!("layout ends at {expected:#x}, flash ends at {flash_size:#x}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(entries: &[(&str, u64, u64)]) -> Layout {
        let mut layout = Layout::new();
        for (name, address, size) in entries {
            layout
                .insert(name.to_string(), Region::ordinary(*address, *size))
                .unwrap();
        }
        layout
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_insert_is_refused() {
        let mut l = layout(&[("app", 0, 10)]);
        assert_eq!(
            l.insert("app".into(), Region::ordinary(0, 1)),
            Err("app".to_string())
        );
    }

    #[test]
    fn by_address_is_stable() {
        let mut l = layout(&[("app", 100, 900), ("boot", 0, 100)]);
        l.insert(
            "slots_primary".into(),
            Region {
                address: 100,
                size: 450,
                kind: RegionKind::SpanChild {
                    span: "slots".into(),
                },
            },
        )
        .unwrap();
        let names: Vec<&str> = l.by_address().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["boot", "app", "slots_primary"]);
        assert_eq!(l.area_ids()["slots_primary"], 2);
    }

    #[test]
    fn tiling_accepts_exact_cover() {
        let l = layout(&[("boot", 0, 100), ("app", 100, 900)]);
        assert!(l.check_tiling(&order(&["boot", "app"]), 1000).is_ok());
    }

    #[test]
    fn tiling_rejects_gap_and_short_cover() {
        let gap = layout(&[("boot", 0, 100), ("app", 200, 800)]);
        assert!(gap.check_tiling(&order(&["boot", "app"]), 1000).is_err());

        let short = layout(&[("boot", 0, 100), ("app", 100, 800)]);
        assert!(short.check_tiling(&order(&["boot", "app"]), 1000).is_err());
    }

    #[test]
    fn serializes_as_name_map() {
        let l = layout(&[("app", 0, 16)]);
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["app"]["address"], 0);
        assert_eq!(json["app"]["size"], 16);
        assert_eq!(json["app"]["kind"], "ordinary");
    }
}
