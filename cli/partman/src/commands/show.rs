//! `partman show`: print the resolved layout.

use anyhow::{bail, Context, Result};
use partman_core::{RegionKind, Resolution};
use serde_json::json;

use crate::input::{self, InputArgs};

pub fn run(args: &InputArgs, format: &str) -> Result<()> {
    let loaded = input::resolve(args, "override.h")?;
    let text = match format {
        "text" => render_text(&loaded.resolution),
        "json" => render_json(&loaded.resolution)?,
        other => bail!("unknown format '{other}' (expected text or json)"),
    };
    print!("{text}");
    Ok(())
}

fn render_text(resolution: &Resolution) -> String {
    let mut out = format!("Flash: {:#x} bytes\n", resolution.flash_size);
    let ids = resolution.layout.area_ids();
    for (name, region) in resolution.layout.by_address() {
        let id = ids.get(name).copied().unwrap_or_default();
        let note = match &region.kind {
            RegionKind::Ordinary if name == resolution.order.anchor() => "  (anchor)".to_string(),
            RegionKind::Ordinary => String::new(),
            RegionKind::SpanChild { span } => format!("  (in {span})"),
        };
        out.push_str(&format!(
            "  {id:>3}  {:#010x}..{:#010x}  {:>10}  {name}{note}\n",
            region.address,
            region.end(),
            region.size
        ));
    }
    for span in &resolution.spans {
        if span.dropped_bytes > 0 {
            out.push_str(&format!(
                "  note: {} leaves {:#x} byte(s) unallocated\n",
                span.name, span.dropped_bytes
            ));
        }
    }
    out
}

fn render_json(resolution: &Resolution) -> Result<String> {
    let value = json!({
        "flash_size": resolution.flash_size,
        "order": resolution.order.names(),
        "layout": resolution.layout,
        "spans": resolution.spans,
    });
    let text = serde_json::to_string_pretty(&value).context("failed to serialize layout")?;
    Ok(text + "\n")
}
