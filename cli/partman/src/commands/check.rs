//! `partman check`: resolve the layout without writing anything.

use anyhow::Result;

use crate::input::{self, InputArgs};

pub fn run(args: &InputArgs) -> Result<()> {
    let loaded = input::resolve(args, "override.h")?;
    let resolution = &loaded.resolution;
    let order = &resolution.order;
    let anchor = resolution.layout.get(order.anchor());

    println!(
        "OK: {} partition(s) in {:#x} bytes of flash; {} gets {:#x} bytes",
        resolution.layout.len(),
        resolution.flash_size,
        order.anchor(),
        anchor.map(|r| r.size).unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tests::build_tree;

    #[test]
    fn valid_tree_passes() {
        let dir = tempfile::tempdir().unwrap();
        run(&build_tree(dir.path())).unwrap();
    }

    #[test]
    fn overfull_flash_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = build_tree(dir.path());
        std::fs::write(
            &args.configs[0],
            "#define CONFIG_FLASH_SIZE 64\n\
             #define CONFIG_PARTITION_MANAGER_RESERVED_SPACE_MCUBOOT 0xc000\n\
             #define CONFIG_PARTITION_MANAGER_RESERVED_SPACE_SPM 0x10000\n",
        )
        .unwrap();
        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to resolve partition layout"));
    }
}
