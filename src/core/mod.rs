// ─── cfmeta core ───
// Resolves CurseForge-hosted mod files of a pack to download URLs.
//
// Architecture:
//   core/
//     index/       index.toml + metafile loading, hash checks
//     curseforge/  API client, wire types, two-phase resolver
//     state/       persisted settings and env overrides
//     http.rs      shared reqwest client setup

pub mod curseforge;
pub mod error;
pub mod http;
pub mod index;
pub mod state;
