//! C header generation.

use partman_core::{Layout, Region};

/// Settings shared by the aggregate header renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Flash driver name every area is reported on.
    pub device: String,
    /// Tool name written into the "generated" banner.
    pub generator: String,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            device: "NRF_FLASH_DRV_NAME".into(),
            generator: "partman".into(),
        }
    }
}

/// Linker override for the image linked into `region`.
pub fn render_override(region: &Region) -> String {
    format!(
        "#undef CONFIG_FLASH_BASE_ADDRESS\n\
         #define CONFIG_FLASH_BASE_ADDRESS {:#x}\n\
         #undef CONFIG_FLASH_LOAD_OFFSET\n\
         #define CONFIG_FLASH_LOAD_OFFSET 0\n\
         #undef CONFIG_FLASH_LOAD_SIZE\n\
         #define CONFIG_FLASH_LOAD_SIZE {:#x}\n",
        region.address, region.size
    )
}

/// Include guard macro for a header file name: `pm_config.h` → `PM_CONFIG_H__`.
pub fn header_guard(file_name: &str) -> String {
    let stem = file_name.split(".h").next().unwrap_or(file_name);
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{stem}_H__")
}

/// The aggregate header listing every flash area.
///
/// Areas are numbered by ascending address. The indirect list lets code
/// iterate areas by id; the direct list looks them up by name.
pub fn render_pm_config(layout: &Layout, file_name: &str, options: &HeaderOptions) -> String {
    let guard = header_guard(file_name);
    let areas = layout.by_address();
    let ids = layout.area_ids();

    let mut lines = vec![
        format!("/* File generated by {}, do not modify */", options.generator),
        format!("#ifndef {guard}"),
        format!("#define {guard}"),
        String::new(),
        "/* Indirect, iterable list of flash areas */".to_string(),
    ];

    for (id, (name, region)) in areas.iter().enumerate() {
        lines.push(format!("#define PM_CFG_{id}_DEV \"{}\"", options.device));
        lines.push(format!("#define PM_CFG_{id}_LABEL {}", macro_name(name)));
        lines.push(format!("#define PM_CFG_{id}_OFFSET {:#x}", region.address));
        lines.push(format!("#define PM_CFG_{id}_SIZE {:#x}", region.size));
    }
    for (name, id) in &ids {
        lines.push(format!("#define PM_CFG_{}_ID {id}", macro_name(name)));
    }
    lines.push(format!("#define PM_CFG_NUM {}", areas.len()));

    lines.push(String::new());
    lines.push("/* Direct look up list of flash areas */".to_string());
    for (name, region) in &areas {
        let name = macro_name(name);
        lines.push(format!("#define PM_CFG_{name}_ADDRESS {:#x}", region.address));
        lines.push(format!("#define PM_CFG_{name}_SIZE {:#x}", region.size));
        lines.push(format!("#define PM_CFG_{name}_DEV_NAME \"{}\"", options.device));
    }

    lines.push(format!("#endif /* {guard} */"));
    lines.join("\n") + "\n"
}

pub(crate) fn macro_name(partition: &str) -> String {
    partition.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use partman_core::{resolve_layout, NoSizes, PartitionTable, Placement};

    fn layout() -> Layout {
        let table = PartitionTable::new()
            .with("spm", Placement::Before(vec!["app".into()]), Some(0x100))
            .with("mcuboot", Placement::Before(vec!["spm".into(), "app".into()]), Some(0x200))
            .with_span("mcuboot_partitions", &["spm", "app"], &["primary", "secondary"])
            .with("app", Placement::Anchor, None);
        resolve_layout(table, &NoSizes, 0x1000).unwrap().layout
    }

    #[test]
    fn override_header() {
        let region = Region::ordinary(0xc000, 0x34000);
        assert_eq!(
            render_override(&region),
            "#undef CONFIG_FLASH_BASE_ADDRESS\n\
             #define CONFIG_FLASH_BASE_ADDRESS 0xc000\n\
             #undef CONFIG_FLASH_LOAD_OFFSET\n\
             #define CONFIG_FLASH_LOAD_OFFSET 0\n\
             #undef CONFIG_FLASH_LOAD_SIZE\n\
             #define CONFIG_FLASH_LOAD_SIZE 0x34000\n"
        );
    }

    #[test]
    fn override_at_zero() {
        assert!(render_override(&Region::ordinary(0, 0x10)).contains("BASE_ADDRESS 0x0\n"));
    }

    #[test]
    fn guards() {
        assert_eq!(header_guard("pm_config.h"), "PM_CONFIG_H__");
        assert_eq!(header_guard("my-layout.h"), "MY_LAYOUT_H__");
    }

    #[test]
    fn pm_config_lists_areas_by_address() {
        let text = render_pm_config(&layout(), "pm_config.h", &HeaderOptions::default());

        assert!(text.starts_with("/* File generated by partman, do not modify */\n#ifndef PM_CONFIG_H__\n"));
        assert!(text.ends_with("#endif /* PM_CONFIG_H__ */\n"));
        assert!(text.contains("#define PM_CFG_0_LABEL MCUBOOT\n"));
        assert!(text.contains("#define PM_CFG_1_LABEL SPM\n"));
        assert!(text.contains("#define PM_CFG_2_LABEL MCUBOOT_PARTITIONS_PRIMARY\n"));
        assert!(text.contains("#define PM_CFG_2_OFFSET 0x200\n"));
        assert!(text.contains("#define PM_CFG_2_SIZE 0x700\n"));
        assert!(text.contains("#define PM_CFG_MCUBOOT_PARTITIONS_SECONDARY_ADDRESS 0x900\n"));
        assert!(text.contains("#define PM_CFG_APP_ID 3\n"));
        assert!(text.contains("#define PM_CFG_NUM 5\n"));
        assert!(text.contains("#define PM_CFG_APP_ADDRESS 0x300\n"));
        assert!(text.contains("#define PM_CFG_APP_SIZE 0xd00\n"));
        assert!(text.contains("#define PM_CFG_SPM_DEV_NAME \"NRF_FLASH_DRV_NAME\"\n"));
    }

    #[test]
    fn custom_device_name() {
        let options = HeaderOptions {
            device: "FLASH_CTRL".into(),
            ..HeaderOptions::default()
        };
        let text = render_pm_config(&layout(), "pm_config.h", &options);
        assert!(text.contains("#define PM_CFG_0_DEV \"FLASH_CTRL\"\n"));
        assert!(!text.contains("NRF_FLASH_DRV_NAME"));
    }
}
