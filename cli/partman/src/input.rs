//! Loading declarations and build configuration, and resolving them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use partman_config::{flash_size, AnchorImage, ConfigScanner, DeclarationFile, Project, ReservedSizes};
use partman_core::{resolve_layout, Resolution};
use tracing::info;

/// Where a layout's inputs come from.
#[derive(Debug, Clone)]
pub struct InputArgs {
    pub inputs: Vec<PathBuf>,
    pub configs: Vec<PathBuf>,
    pub anchor: String,
    pub app_override_file: Option<PathBuf>,
}

/// A resolved build.
pub struct Loaded {
    pub project: Project,
    pub resolution: Resolution,
}

/// Read every input, snapshot sizes, and resolve the layout.
pub fn resolve(args: &InputArgs, override_name: &str) -> Result<Loaded> {
    let files = args
        .inputs
        .iter()
        .map(|p| DeclarationFile::load(p))
        .collect::<Result<Vec<_>, _>>()?;

    let scanner = ConfigScanner::new()?;
    let configs = args
        .configs
        .iter()
        .map(|p| scanner.load(p))
        .collect::<Result<Vec<_>, _>>()?;
    let flash_size = flash_size(&configs)?;
    let sizes = ReservedSizes::from_configs(&configs);
    info!(
        declarations = files.len(),
        reserved = sizes.len(),
        flash_size,
        "inputs loaded"
    );

    let anchor = AnchorImage {
        name: args.anchor.clone(),
        override_path: args.app_override_file.clone().unwrap_or_default(),
    };
    let project = Project::assemble(&files, override_name, &anchor)?;

    let resolution = resolve_layout(project.table.clone(), &sizes, flash_size)
        .context("failed to resolve partition layout")?;

    Ok(Loaded {
        project,
        resolution,
    })
}
