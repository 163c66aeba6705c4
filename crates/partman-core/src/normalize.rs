//! Constraint normalization.
//!
//! Placement chains are fallback lists: `before = ["mcuboot", "app"]` means
//! "before mcuboot if this build has one, otherwise before app". Normalizing
//! drops every target that is not part of this build so that the first entry
//! of each chain is the slot the partition actually claims.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Direction, LayoutError, Result};
use crate::partition::{DeclKind, Placement, PartitionTable};

/// A table whose placement chains only name partitions that exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    pub(crate) anchor: String,
    pub(crate) table: PartitionTable,
}

impl NormalizedTable {
    /// Name of the anchor partition.
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn table(&self) -> &PartitionTable {
        &self.table
    }
}

/// Validate the anchor and last markers, then prune every placement chain
/// down to targets present in the table.
///
/// The anchor's name is never pruned. A chain left empty is rejected here
/// rather than surfacing later as an unreachable partition.
pub fn normalize(mut table: PartitionTable) -> Result<NormalizedTable> {
    let anchor = single_anchor(&table)?;

    let last = table.names_where(|p| *p == Placement::Last);
    if last.len() > 1 {
        return Err(LayoutError::MultipleLast { names: last });
    }

    let present: HashSet<String> = table.iter().map(|(name, _)| name.to_string()).collect();

    for (name, decl) in table.iter_mut() {
        let (direction, targets) = match &mut decl.kind {
            DeclKind::Placed(Placement::Before(targets)) => (Direction::Before, targets),
            DeclKind::Placed(Placement::After(targets)) => (Direction::After, targets),
            _ => continue,
        };

        let declared = targets.clone();
        targets.retain(|t| *t == anchor || present.contains(t));

        if targets.is_empty() {
            return Err(LayoutError::EmptyPlacementChain {
                partition: name.clone(),
                direction,
                targets: declared,
            });
        }
        if targets.len() != declared.len() {
            debug!(
                partition = %name,
                %direction,
                from = ?declared,
                to = ?targets,
                "dropped absent placement targets"
            );
        }
    }

    Ok(NormalizedTable { anchor, table })
}

fn single_anchor(table: &PartitionTable) -> Result<String> {
    let mut anchors = table.names_where(|p| *p == Placement::Anchor);
    match anchors.len() {
        0 => Err(LayoutError::MissingAnchor),
        1 => Ok(anchors.remove(0)),
        _ => Err(LayoutError::MultipleAnchors { names: anchors }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn before(targets: &[&str]) -> Placement {
        Placement::Before(targets.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn absent_targets_are_dropped() {
        let table = PartitionTable::new()
            .with("b0", before(&["mcuboot", "app"]), Some(100))
            .with("app", Placement::Anchor, None);
        let normalized = normalize(table).unwrap();
        assert_eq!(normalized.anchor(), "app");
        assert_eq!(
            normalized.table().get("b0").unwrap().placement(),
            Some(&before(&["app"]))
        );
    }

    #[test]
    fn present_targets_keep_their_order() {
        let table = PartitionTable::new()
            .with("spu", before(&["app"]), Some(100))
            .with("mcuboot", before(&["spu", "app"]), Some(100))
            .with("app", Placement::Anchor, None);
        let normalized = normalize(table).unwrap();
        assert_eq!(
            normalized.table().get("mcuboot").unwrap().placement(),
            Some(&before(&["spu", "app"]))
        );
    }

    #[test]
    fn span_names_count_as_present() {
        let table = PartitionTable::new()
            .with("x", before(&["slots", "app"]), Some(10))
            .with("app", Placement::Anchor, None)
            .with_span("slots", &["app"], &["a"]);
        let normalized = normalize(table).unwrap();
        assert_eq!(
            normalized.table().get("x").unwrap().placement(),
            Some(&before(&["slots", "app"]))
        );
    }

    #[test]
    fn chain_of_only_absent_names_is_rejected() {
        let table = PartitionTable::new()
            .with("b0", Placement::After(vec!["mcuboot".into()]), Some(100))
            .with("app", Placement::Anchor, None);
        let err = normalize(table).unwrap_err();
        assert_eq!(
            err,
            LayoutError::EmptyPlacementChain {
                partition: "b0".into(),
                direction: Direction::After,
                targets: vec!["mcuboot".into()],
            }
        );
    }

    #[test]
    fn missing_anchor_is_rejected() {
        let table = PartitionTable::new().with("p", Placement::Last, Some(4));
        assert_eq!(normalize(table).unwrap_err(), LayoutError::MissingAnchor);
    }

    #[test]
    fn multiple_anchors_are_rejected() {
        let table = PartitionTable::new()
            .with("app", Placement::Anchor, None)
            .with("other", Placement::Anchor, None);
        assert!(matches!(
            normalize(table),
            Err(LayoutError::MultipleAnchors { names }) if names == ["app", "other"]
        ));
    }

    #[test]
    fn multiple_last_are_rejected() {
        let table = PartitionTable::new()
            .with("app", Placement::Anchor, None)
            .with("a", Placement::Last, Some(1))
            .with("b", Placement::Last, Some(1));
        assert!(matches!(
            normalize(table),
            Err(LayoutError::MultipleLast { .. })
        ));
    }
}
