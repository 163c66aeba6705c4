//! Address assignment.
//!
//! Partitions below the anchor are packed upward from address zero,
//! partitions above it are packed downward from the end of flash, and the
//! anchor takes whatever lies between the two.

use tracing::{debug, warn};

use crate::error::{LayoutError, Result};
use crate::layout::{Layout, Region};
use crate::resolve::PlacementOrder;
use crate::size::SizedTable;

/// Assign an address and size to every partition in `order`.
pub fn assign_addresses(order: &PlacementOrder, sizes: &SizedTable, flash_size: u64) -> Result<Layout> {
    let names = order.names();
    let anchor = order.anchor_index();

    let mut fixed = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        fixed.push(if i == anchor { 0 } else { sizes.size_of(name)? });
    }

    let required = fixed
        .iter()
        .try_fold(0u64, |acc, s| acc.checked_add(*s))
        .filter(|r| *r <= flash_size)
        .ok_or_else(|| LayoutError::FlashOverflow {
            required: fixed.iter().fold(0u64, |acc, s| acc.saturating_add(*s)),
            available: flash_size,
        })?;

    let mut addresses = vec![0u64; names.len()];
    for i in 1..=anchor {
        addresses[i] = addresses[i - 1] + fixed[i - 1];
    }

    let anchor_size = if anchor + 1 < names.len() {
        let last = names.len() - 1;
        addresses[last] = flash_size - fixed[last];
        for i in (anchor + 1..last).rev() {
            addresses[i] = addresses[i + 1] - fixed[i];
        }
        addresses[anchor + 1] - addresses[anchor]
    } else {
        flash_size - addresses[anchor]
    };
    fixed[anchor] = anchor_size;

    if anchor_size == 0 {
        warn!(anchor = %names[anchor], required, flash_size, "fixed partitions fill the flash; the anchor is empty");
    }

    let mut layout = Layout::new();
    for ((name, address), size) in names.iter().zip(&addresses).zip(&fixed) {
        debug!(partition = %name, address = *address, size = *size, "assigned");
        layout
            .insert(name.clone(), Region::ordinary(*address, *size))
            .map_err(|_| LayoutError::TilingViolation {
                detail: format!("'{name}' appears twice in the placement order"),
            })?;
    }
    Ok(layout)
}
