use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::hash;
use super::model::{ModMetafile, ModReference, PackIndex};
use crate::core::error::{ResolverError, ResolverResult};

pub const INDEX_FILE: &str = "index.toml";

/// A pack loaded from disk: its root folder and every metafile reference.
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pub root: PathBuf,
    pub references: Vec<ModReference>,
}

impl LoadedPack {
    /// References whose download URL has to come from CurseForge.
    pub fn curseforge_references(&self) -> Vec<ModReference> {
        self.references
            .iter()
            .filter(|r| r.needs_curseforge_lookup())
            .cloned()
            .collect()
    }
}

/// Reads `index.toml` and its metafiles from a pack folder.
pub struct PackLoader {
    root: PathBuf,
}

impl PackLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the index and every metafile it lists, verifying each hash.
    pub async fn load(&self) -> ResolverResult<LoadedPack> {
        let index_path = self.root.join(INDEX_FILE);
        let (index, _) = read_toml::<PackIndex>(&index_path).await?;

        let mut references = Vec::new();
        for entry in index.files.iter().filter(|e| e.metafile) {
            let relative = checked_relative_path(&entry.file)?;
            let path = self.root.join(&relative);
            let (metafile, bytes) = read_toml::<ModMetafile>(&path).await?;

            let format = entry.hash_format.as_deref().unwrap_or(&index.hash_format);
            hash::verify(&path, format, &entry.hash, &bytes)?;

            debug!("Loaded metafile {:?} ({})", relative, metafile.name);
            references.push(ModReference::from_metafile(metafile, &relative));
        }

        info!(
            "Loaded {} metafiles from {} ({} index entries)",
            references.len(),
            index_path.display(),
            index.files.len()
        );

        Ok(LoadedPack {
            root: self.root.clone(),
            references,
        })
    }
}

async fn read_toml<T: DeserializeOwned>(path: &Path) -> ResolverResult<(T, Vec<u8>)> {
    let bytes = tokio::fs::read(path).await.map_err(|e| ResolverError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let text = String::from_utf8_lossy(&bytes);
    let value = toml::from_str(&text).map_err(|source| ResolverError::Toml {
        path: path.to_path_buf(),
        source,
    })?;

    Ok((value, bytes))
}

/// Index paths are slash separated and must stay inside the pack folder.
fn checked_relative_path(file: &str) -> ResolverResult<PathBuf> {
    let path = PathBuf::from(file);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || file.is_empty() {
        return Err(ResolverError::InvalidIndexPath(file.to_string()));
    }
    Ok(path)
}
