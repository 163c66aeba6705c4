//! `KEY=value` layout description for build systems.

use partman_core::Layout;

use crate::header::macro_name;

/// One `PM_<NAME>_ADDRESS`, `PM_<NAME>_SIZE` and `PM_<NAME>_ID` line per
/// area in address order, followed by `PM_NUM`.
pub fn render_kv_config(layout: &Layout) -> String {
    let mut out = String::new();
    for (id, (name, region)) in layout.by_address().into_iter().enumerate() {
        let name = macro_name(name);
        out.push_str(&format!("PM_{name}_ADDRESS={:#x}\n", region.address));
        out.push_str(&format!("PM_{name}_SIZE={:#x}\n", region.size));
        out.push_str(&format!("PM_{name}_ID={id}\n"));
    }
    out.push_str(&format!("PM_NUM={}\n", layout.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use partman_core::{resolve_layout, NoSizes, PartitionTable, Placement};

    #[test]
    fn lines_in_address_order() {
        let table = PartitionTable::new()
            .with("provision", Placement::Last, Some(0x1000))
            .with("b0", Placement::Before(vec!["app".into()]), Some(0x8000))
            .with("app", Placement::Anchor, None);
        let layout = resolve_layout(table, &NoSizes, 0x10_0000).unwrap().layout;

        assert_eq!(
            render_kv_config(&layout),
            "PM_B0_ADDRESS=0x0\n\
             PM_B0_SIZE=0x8000\n\
             PM_B0_ID=0\n\
             PM_APP_ADDRESS=0x8000\n\
             PM_APP_SIZE=0xf7000\n\
             PM_APP_ID=1\n\
             PM_PROVISION_ADDRESS=0xff000\n\
             PM_PROVISION_SIZE=0x1000\n\
             PM_PROVISION_ID=2\n\
             PM_NUM=3\n"
        );
    }
}
