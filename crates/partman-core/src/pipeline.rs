//! Layout resolution pipeline.
//!
//! normalize -> extract spans -> bind sizes -> order -> assign -> apportion
//! spans -> tiling check. Each stage takes the previous stage's output by
//! value, so no stage can observe another's half-finished state.

use tracing::info;

use crate::assign::assign_addresses;
use crate::error::Result;
use crate::layout::Layout;
use crate::normalize::normalize;
use crate::partition::PartitionTable;
use crate::resolve::{resolve_order, PlacementOrder};
use crate::size::{bind_sizes, SizeLookup};
use crate::span::{apportion_spans, extract_spans, SpanAllocation};

/// Output of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Ordinary partitions from lowest to highest address.
    pub order: PlacementOrder,
    /// Every ordinary partition and generated span child.
    pub layout: Layout,
    /// How each span was divided, including any unallocated remainder.
    pub spans: Vec<SpanAllocation>,
    pub flash_size: u64,
}

/// Resolve `table` into a layout covering `flash_size` bytes.
pub fn resolve_layout(
    table: PartitionTable,
    sizes: &dyn SizeLookup,
    flash_size: u64,
) -> Result<Resolution> {
    // Stage 1: prune fallback chains, validate anchor/last
    let normalized = normalize(table)?;

    // Stage 2: set spans aside until addresses exist
    let (placed, spans) = extract_spans(normalized);

    // Stage 3: snapshot every size the assigner will need
    let sized = bind_sizes(placed, sizes)?;

    // Stage 4: total order
    let order = resolve_order(sized.placed())?;

    // Stage 5: addresses, anchor takes the residual
    let layout = assign_addresses(&order, &sized, flash_size)?;
    layout.check_tiling(order.names(), flash_size)?;

    // Stage 6: span overlays
    let (layout, spans) = apportion_spans(layout, &spans)?;

    info!(
        partitions = order.len(),
        regions = layout.len(),
        flash_size,
        "layout resolved"
    );

    Ok(Resolution {
        order,
        layout,
        spans,
        flash_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::partition::Placement;
    use crate::size::NoSizes;
    use std::collections::HashMap;

    #[test]
    fn resolves_with_external_sizes() {
        let table = PartitionTable::new()
            .with("mcuboot", Placement::Before(vec!["app".into()]), None)
            .with("app", Placement::Anchor, None);
        let sizes = HashMap::from([("mcuboot".to_string(), 0xc000u64)]);

        let resolution = resolve_layout(table, &sizes, 0x10_0000).unwrap();
        let app = resolution.layout.get("app").unwrap();
        assert_eq!(app.address, 0xc000);
        assert_eq!(app.size, 0x10_0000 - 0xc000);
        assert!(resolution.spans.is_empty());
    }

    #[test]
    fn first_failing_stage_wins() {
        // Both a missing size and an empty chain: normalization runs first.
        let table = PartitionTable::new()
            .with("x", Placement::Before(vec!["gone".into()]), None)
            .with("app", Placement::Anchor, None);
        assert!(matches!(
            resolve_layout(table, &NoSizes, 1000),
            Err(LayoutError::EmptyPlacementChain { .. })
        ));
    }
}
