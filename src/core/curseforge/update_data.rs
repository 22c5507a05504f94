use serde::Deserialize;

use crate::core::index::ModReference;

/// Key of the CurseForge section under a metafile's `[update]` table.
pub const CURSEFORGE_SOURCE: &str = "curseforge";

/// Decoded `[update.curseforge]` section of a metafile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CurseForgeUpdateData {
    pub file_id: u32,
    pub project_id: u32,
}

impl CurseForgeUpdateData {
    /// `None` when the reference has no CurseForge section at all,
    /// `Some(Err)` when the section exists but does not decode.
    pub fn from_reference(reference: &ModReference) -> Option<Result<Self, toml::de::Error>> {
        reference
            .update_section(CURSEFORGE_SOURCE)
            .map(|section| section.clone().try_into())
    }
}
