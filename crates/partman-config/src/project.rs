//! Assembling one partition table from every image's declarations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use partman_core::{PartitionDecl, PartitionTable, Placement};
use tracing::debug;

use crate::declaration::DeclarationFile;
use crate::error::{ConfigError, Result};

/// An image whose build consumes generated layout files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// The partition the image is linked into.
    pub partition: String,
    /// Directory the aggregate layout header is written to.
    pub dir: PathBuf,
    /// Where the image's linker override goes, if it gets one.
    pub override_path: Option<PathBuf>,
}

/// The root application image, which owns the anchor partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorImage {
    /// Partition name used when no declaration marks an anchor.
    pub name: String,
    /// Path of the application's own linker override file.
    pub override_path: PathBuf,
}

/// Every declaration of a build, merged, plus the images to write outputs for.
#[derive(Debug, Clone)]
pub struct Project {
    pub table: PartitionTable,
    pub images: Vec<Image>,
}

impl Project {
    /// Merge declaration files into one table.
    ///
    /// Each file's first partition becomes an image whose override is
    /// written as `override_name` in the file's directory. If no file marks
    /// an anchor, `anchor.name` is added as one. An anchor that is a file's
    /// own image keeps that file's directory. When the only input sits in
    /// the application's own directory, a sub-image is being built on its
    /// own and the application override is left alone.
    pub fn assemble(files: &[DeclarationFile], override_name: &str, anchor: &AnchorImage) -> Result<Self> {
        let mut table = PartitionTable::new();
        let mut origin: HashMap<&str, &Path> = HashMap::new();
        let mut images = Vec::new();

        for file in files {
            for (name, decl) in &file.partitions {
                if let Some(first) = origin.insert(name, &file.path) {
                    return Err(ConfigError::DuplicatePartition {
                        name: name.clone(),
                        first: first.to_path_buf(),
                        second: file.path.clone(),
                    });
                }
                table.insert(name.clone(), decl.clone());
            }
            if let Some(image) = file.image() {
                images.push(Image {
                    partition: image.to_string(),
                    dir: file.dir().to_path_buf(),
                    override_path: Some(file.dir().join(override_name)),
                });
            }
        }

        let declared_anchor = table.names_where(|p| *p == Placement::Anchor);
        let anchor_name = match declared_anchor.first() {
            Some(name) => name.clone(),
            None => {
                if let Some(existing) = table.get(&anchor.name) {
                    return Err(ConfigError::InvalidDeclaration {
                        partition: anchor.name.clone(),
                        path: origin
                            .get(anchor.name.as_str())
                            .map(|p| p.to_path_buf())
                            .unwrap_or_default(),
                        detail: format!(
                            "the application partition cannot be declared as {:?}",
                            existing.placement()
                        ),
                    });
                }
                table.insert(anchor.name.clone(), PartitionDecl::placed(Placement::Anchor, None));
                anchor.name.clone()
            }
        };

        if images.iter().any(|i| i.partition == anchor_name) {
            debug!(anchor = %anchor_name, "anchor image declares its own partition");
            return Ok(Self { table, images });
        }

        let anchor_dir = anchor
            .override_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();
        let standalone = files.len() == 1 && files[0].dir() == anchor_dir;
        if standalone {
            debug!(image = ?files[0].image(), "building a sub-image on its own; keeping the application override");
        }

        images.push(Image {
            partition: anchor_name,
            dir: anchor_dir,
            override_path: (!standalone).then(|| anchor.override_path.clone()),
        });

        Ok(Self { table, images })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, toml: &str) -> DeclarationFile {
        DeclarationFile::parse(toml, Path::new(path)).unwrap()
    }

    fn app() -> AnchorImage {
        AnchorImage {
            name: "app".into(),
            override_path: PathBuf::from("build/zephyr/include/generated/override.h"),
        }
    }

    #[test]
    fn merges_files_and_adds_anchor() {
        let files = [
            file("build/mcuboot/pm.toml", "[mcuboot]\nplacement = { before = [\"spm\", \"app\"] }\n"),
            file("build/spm/pm.toml", "[spm]\nplacement = { before = [\"app\"] }\n"),
        ];
        let project = Project::assemble(&files, "override.h", &app()).unwrap();

        assert_eq!(project.table.len(), 3);
        assert_eq!(project.table.get("app").unwrap().placement(), Some(&Placement::Anchor));
        assert_eq!(
            project.images,
            [
                Image {
                    partition: "mcuboot".into(),
                    dir: "build/mcuboot".into(),
                    override_path: Some("build/mcuboot/override.h".into()),
                },
                Image {
                    partition: "spm".into(),
                    dir: "build/spm".into(),
                    override_path: Some("build/spm/override.h".into()),
                },
                Image {
                    partition: "app".into(),
                    dir: "build/zephyr/include/generated".into(),
                    override_path: Some("build/zephyr/include/generated/override.h".into()),
                },
            ]
        );
    }

    #[test]
    fn declared_anchor_is_kept() {
        let files = [file("build/main/pm.toml", "[main]\nplacement = \"anchor\"\n")];
        let project = Project::assemble(&files, "override.h", &app()).unwrap();
        assert!(project.table.get("app").is_none());
        assert_eq!(
            project.images,
            [Image {
                partition: "main".into(),
                dir: "build/main".into(),
                override_path: Some("build/main/override.h".into()),
            }]
        );
    }

    #[test]
    fn anchor_declared_after_an_image_gets_the_app_directory() {
        let files = [file(
            "build/spm/pm.toml",
            "[spm]\nplacement = { before = [\"main\"] }\n\n[main]\nplacement = \"anchor\"\n",
        )];
        let project = Project::assemble(&files, "override.h", &app()).unwrap();
        let main = project.images.iter().find(|i| i.partition == "main").unwrap();
        assert_eq!(main.dir, Path::new("build/zephyr/include/generated"));
    }

    #[test]
    fn duplicate_partitions_are_rejected() {
        let files = [
            file("a/pm.toml", "[spm]\nsize = 1\n"),
            file("b/pm.toml", "[spm]\nsize = 2\n"),
        ];
        let err = Project::assemble(&files, "override.h", &app()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePartition { name, .. } if name == "spm"));
    }

    #[test]
    fn app_declared_with_a_placement_is_rejected() {
        let files = [file("a/pm.toml", "[app]\nplacement = \"last\"\n")];
        assert!(matches!(
            Project::assemble(&files, "override.h", &app()),
            Err(ConfigError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn standalone_sub_image_keeps_app_override() {
        let files = [file(
            "build/zephyr/include/generated/pm.toml",
            "[spm]\nplacement = { before = [\"app\"] }\n",
        )];
        let project = Project::assemble(&files, "override.h", &app()).unwrap();
        let app_image = project.images.iter().find(|i| i.partition == "app").unwrap();
        assert_eq!(app_image.override_path, None);
        assert_eq!(app_image.dir, Path::new("build/zephyr/include/generated"));
    }
}
