use std::path::PathBuf;

use serde::Deserialize;

/// Download mode marking a metafile whose URL must be looked up on CurseForge.
pub const CURSEFORGE_MODE: &str = "metadata:curseforge";

/// Root `index.toml` of a pack.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackIndex {
    pub hash_format: String,
    #[serde(default)]
    pub files: Vec<IndexEntry>,
}

/// One `[[files]]` entry of the index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexEntry {
    pub file: String,
    pub hash: String,
    /// Overrides the index-wide hash format for this entry.
    #[serde(default)]
    pub hash_format: Option<String>,
    #[serde(default)]
    pub metafile: bool,
}

/// A per-mod metafile (`*.pw.toml`) as written on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ModMetafile {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub download: Option<MetafileDownload>,
    /// Raw `[update.<source>]` tables; each source decodes its own section.
    #[serde(default)]
    pub update: toml::Table,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetafileDownload {
    #[serde(default)]
    pub mode: Option<String>,
}

/// A mod entry loaded from the pack, ready to be resolved.
#[derive(Debug, Clone)]
pub struct ModReference {
    pub name: String,
    /// Where the downloaded file belongs, relative to the pack root.
    pub path: PathBuf,
    pub download_mode: Option<String>,
    pub update: toml::Table,
}

impl ModReference {
    pub fn from_metafile(metafile: ModMetafile, metafile_path: &std::path::Path) -> Self {
        let dir = metafile_path.parent().map(PathBuf::from).unwrap_or_default();
        let download_mode = metafile.download.and_then(|d| d.mode);

        Self {
            path: dir.join(&metafile.filename),
            name: metafile.name,
            download_mode,
            update: metafile.update,
        }
    }

    /// Raw update section for `source` (e.g. `"curseforge"`), if present.
    pub fn update_section(&self, source: &str) -> Option<&toml::Value> {
        self.update.get(source)
    }

    pub fn needs_curseforge_lookup(&self) -> bool {
        self.download_mode.as_deref() == Some(CURSEFORGE_MODE)
    }
}
