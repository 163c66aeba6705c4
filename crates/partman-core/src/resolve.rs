//! Placement resolution: one total order from relative constraints.
//!
//! The order is grown outward from two fixed points. The partition placed
//! last pulls in the chain of partitions that sit immediately before it;
//! the anchor pulls in the chain immediately before it and the chain
//! immediately after it. Every relative partition must end up on one of
//! these three chains.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::{Direction, LayoutError, Result};
use crate::partition::{Partition, Placement};
use crate::span::PlacedTable;

/// Ordinary partitions from the lowest address to the highest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOrder {
    names: Vec<String>,
    anchor_index: usize,
}

impl PlacementOrder {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn anchor_index(&self) -> usize {
        self.anchor_index
    }

    pub fn anchor(&self) -> &str {
        &self.names[self.anchor_index]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Compute the total order of the ordinary partitions in `table`.
///
/// Fails if two partitions claim the same slot, or if a relatively placed
/// partition is left over once all chains have been followed. Partitions
/// without any placement are not part of the order.
pub fn resolve_order(table: &PlacedTable) -> Result<PlacementOrder> {
    check_claims(table)?;

    let mut order = vec![table.anchor().to_string()];

    let last = table
        .partitions()
        .find(|p| p.placement == Placement::Last)
        .map(|p| p.name.clone());
    if let Some(last) = last {
        order.push(last.clone());
        follow_chain(table, &mut order, &last, Direction::Before)?;
    }

    let anchor = table.anchor();
    follow_chain(table, &mut order, anchor, Direction::Before)?;
    follow_chain(table, &mut order, anchor, Direction::After)?;

    let placed: HashSet<&str> = order.iter().map(String::as_str).collect();
    if let Some(stray) = table
        .partitions()
        .find(|p| p.placement.is_relative() && !placed.contains(p.name.as_str()))
    {
        return Err(unreachable(stray));
    }

    for p in table.partitions() {
        if p.placement == Placement::Unplaced {
            warn!(partition = %p.name, "partition has no placement and is left out of the layout");
        }
    }

    let anchor_index = order
        .iter()
        .position(|n| n == anchor)
        .ok_or(LayoutError::MissingAnchor)?;
    info!(order = ?order, "resolved partition order");

    Ok(PlacementOrder {
        names: order,
        anchor_index,
    })
}

/// Reject any slot claimed by more than one partition, whether or not the
/// slot is reachable from a fixed point.
fn check_claims(table: &PlacedTable) -> Result<()> {
    let mut slots: BTreeMap<(&str, Direction), Vec<String>> = BTreeMap::new();
    for p in table.partitions() {
        if let Some((direction, targets)) = p.placement.chain() {
            if let Some(target) = targets.first() {
                slots
                    .entry((target.as_str(), direction))
                    .or_default()
                    .push(p.name.clone());
            }
        }
    }

    match slots.into_iter().find(|(_, claimants)| claimants.len() > 1) {
        Some(((slot, direction), mut claimants)) => {
            claimants.sort();
            Err(LayoutError::AmbiguousPlacement {
                slot: slot.to_string(),
                direction,
                claimants,
            })
        }
        None => Ok(()),
    }
}

/// Starting at `start`, repeatedly insert the partition that claims the
/// slot next to the cursor in `direction`, until nobody does.
fn follow_chain(
    table: &PlacedTable,
    order: &mut Vec<String>,
    start: &str,
    direction: Direction,
) -> Result<()> {
    let mut cursor = start.to_string();

    loop {
        let mut claimants: Vec<&Partition> = table
            .partitions()
            .filter(|p| p.placement.claims(direction) == Some(cursor.as_str()))
            .collect();

        let next = match claimants.len() {
            0 => return Ok(()),
            1 => claimants.remove(0),
            _ => {
                let mut names: Vec<String> = claimants.iter().map(|p| p.name.clone()).collect();
                names.sort();
                return Err(LayoutError::AmbiguousPlacement {
                    slot: cursor,
                    direction,
                    claimants: names,
                });
            }
        };

        // Each partition claims exactly one slot, so a chain can only come
        // back to itself through a cycle that never touches a fixed point.
        if order.contains(&next.name) {
            return Err(unreachable(next));
        }

        let at = order
            .iter()
            .position(|n| *n == cursor)
            .ok_or_else(|| unreachable(next))?;
        let at = match direction {
            Direction::Before => at,
            Direction::After => at + 1,
        };
        debug!(partition = %next.name, %direction, target = %cursor, "placed");
        order.insert(at, next.name.clone());
        cursor = next.name.clone();
    }
}

fn unreachable(partition: &Partition) -> LayoutError {
    let (direction, target) = match partition.placement.chain() {
        Some((direction, targets)) => (direction, targets.first().cloned().unwrap_or_default()),
        None => (Direction::Before, String::new()),
    };
    LayoutError::Unreachable {
        partition: partition.name.clone(),
        direction,
        target,
    }
}
