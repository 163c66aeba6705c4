//! `partman generate`: write override and layout headers for every image.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use partman_emit::{render_kv_config, render_override, render_pm_config, HeaderOptions};
use tracing::info;

use crate::input::{self, InputArgs};

/// Output file names and header settings.
#[derive(Debug, Clone)]
pub struct Outputs {
    pub override_name: String,
    pub pm_config: String,
    pub kv_config: Option<String>,
    pub flash_device: String,
}

pub fn run(args: &InputArgs, outputs: &Outputs) -> Result<()> {
    let loaded = input::resolve(args, &outputs.override_name)?;
    let layout = &loaded.resolution.layout;

    for image in &loaded.project.images {
        let Some(path) = &image.override_path else {
            continue;
        };
        let region = layout
            .get(&image.partition)
            .with_context(|| format!("image partition '{}' was not placed in flash", image.partition))?;
        write(path, &render_override(region))?;
    }

    let options = HeaderOptions {
        device: outputs.flash_device.clone(),
        ..HeaderOptions::default()
    };
    let pm_config = render_pm_config(layout, &outputs.pm_config, &options);
    let kv_config = outputs.kv_config.as_ref().map(|name| (name, render_kv_config(layout)));

    let mut dirs: Vec<&PathBuf> = Vec::new();
    for image in &loaded.project.images {
        if !dirs.contains(&&image.dir) {
            dirs.push(&image.dir);
        }
    }
    for dir in dirs {
        write(&dir.join(&outputs.pm_config), &pm_config)?;
        if let Some((name, text)) = &kv_config {
            write(&dir.join(name), text)?;
        }
    }

    println!(
        "Wrote layout of {} partition(s) for {} image(s)",
        layout.len(),
        loaded.project.images.len()
    );
    Ok(())
}

fn write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote");
    Ok(())
}
