//! Span overlays: extraction before resolution and apportionment after it.
//!
//! A span covers the combined range of one or more placed partitions (for
//! example the primary and secondary image slots of a bootloader across
//! `spm` and `app`) and splits it into equal named subregions. Spans do not
//! take part in the tiling; their children overlap their parents.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LayoutError, Result};
use crate::layout::{Layout, Region, RegionKind};
use crate::normalize::NormalizedTable;
use crate::partition::{DeclKind, Partition, SpanPartition};

/// The ordinary partitions left once spans are set aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedTable {
    pub(crate) anchor: String,
    pub(crate) partitions: IndexMap<String, Partition>,
}

impl PlacedTable {
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn get(&self, name: &str) -> Option<&Partition> {
        self.partitions.get(name)
    }

    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }
}

/// Split span declarations from ordinary partitions.
pub fn extract_spans(normalized: NormalizedTable) -> (PlacedTable, Vec<SpanPartition>) {
    let NormalizedTable { anchor, table } = normalized;
    let mut partitions = IndexMap::new();
    let mut spans = Vec::new();

    for (name, decl) in table.into_entries() {
        match decl.kind {
            DeclKind::Placed(placement) => {
                partitions.insert(
                    name.clone(),
                    Partition {
                        name,
                        size: decl.size,
                        placement,
                    },
                );
            }
            DeclKind::Span {
                parents,
                subregions,
            } => spans.push(SpanPartition {
                name,
                parents,
                subregions,
            }),
        }
    }

    (PlacedTable { anchor, partitions }, spans)
}

/// How one span was divided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanAllocation {
    pub name: String,
    /// Address of the first parent present in the layout.
    pub base: u64,
    /// Combined size of all present parents.
    pub total: u64,
    /// Size of each generated child.
    pub child_size: u64,
    /// Bytes at the end of the span that no child covers.
    pub dropped_bytes: u64,
}

/// Lay out every span's children over its resolved parents.
///
/// Children are `total / subregions` bytes each, contiguous from the first
/// present parent's address. Present parents must follow each other
/// without gaps in the order they are listed. The remainder of that division is left
/// unallocated and reported in the returned [`SpanAllocation`].
pub fn apportion_spans(
    mut layout: Layout,
    spans: &[SpanPartition],
) -> Result<(Layout, Vec<SpanAllocation>)> {
    let mut allocations = Vec::with_capacity(spans.len());

    for span in spans {
        let allocation = divide(&layout, span)?;

        let mut address = allocation.base;
        for sub in &span.subregions {
            let region = Region {
                address,
                size: allocation.child_size,
                kind: RegionKind::SpanChild {
                    span: span.name.clone(),
                },
            };
            debug!(span = %span.name, subregion = %sub, address, size = region.size, "placed span child");
            layout
                .insert(span.child_name(sub), region)
                .map_err(|name| LayoutError::DuplicateName {
                    span: span.name.clone(),
                    name,
                })?;
            address += allocation.child_size;
        }

        if allocation.dropped_bytes > 0 {
            warn!(
                span = %span.name,
                dropped = allocation.dropped_bytes,
                "span size is not a multiple of its subregion count; trailing bytes are unallocated"
            );
        }
        allocations.push(allocation);
    }

    Ok((layout, allocations))
}

fn divide(layout: &Layout, span: &SpanPartition) -> Result<SpanAllocation> {
    if span.subregions.is_empty() {
        return Err(LayoutError::EmptySubregions {
            span: span.name.clone(),
        });
    }

    let mut base = None;
    let mut end = None;
    let mut total = 0u64;
    for parent in &span.parents {
        let Some(region) = layout.get(parent).filter(|r| r.is_ordinary()) else {
            continue;
        };
        if end.is_some_and(|end| end != region.address) {
            return Err(LayoutError::DisjointSpanParents {
                span: span.name.clone(),
                parent: parent.clone(),
            });
        }
        base.get_or_insert(region.address);
        end = Some(region.end());
        total += region.size;
    }

    let base = match base {
        Some(base) if total > 0 => base,
        _ => {
            return Err(LayoutError::NoCompatibleParent {
                span: span.name.clone(),
            })
        }
    };

    let count = span.subregions.len() as u64;
    Ok(SpanAllocation {
        name: span.name.clone(),
        base,
        total,
        child_size: total / count,
        dropped_bytes: total % count,
    })
}
