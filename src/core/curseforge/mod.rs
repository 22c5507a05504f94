mod api;
mod failure;
mod model;
mod resolver;
mod update_data;

pub use api::{CurseForgeClient, MetadataApi, CURSEFORGE_API};
pub use failure::{BatchPhase, FailureDetail, LookupKind, ResolveFailure};
pub use model::{FileRecord, ProjectLinks, ProjectRecord};
pub use resolver::{MetadataResolver, ReferenceId, Resolution};
pub use update_data::{CurseForgeUpdateData, CURSEFORGE_SOURCE};
