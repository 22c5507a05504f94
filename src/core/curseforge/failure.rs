use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Why a single reference could not be resolved to a download URL.
///
/// None of these abort the caller; they are collected into the resolution.
#[derive(Debug, Error)]
pub enum ResolveFailure {
    #[error("Failed to resolve CurseForge metadata: no CurseForge update section")]
    MissingUpdateSection,

    #[error("Failed to resolve CurseForge metadata: invalid CurseForge update section: {0}")]
    InvalidUpdateSection(String),

    #[error("Failed to resolve CurseForge metadata for {phase} data: {reason}")]
    BatchRequestFailed { phase: BatchPhase, reason: String },

    #[error("Failed to find file from result: ID {file_id}, Project ID {project_id}")]
    UnrequestedResultId { file_id: u32, project_id: u32 },

    #[error("Failed to parse URL: {url} for ID {file_id}, Project ID {project_id}: {reason}")]
    UrlParseError {
        url: String,
        file_id: u32,
        project_id: u32,
        reason: String,
    },

    #[error(
        "This mod is excluded from the CurseForge API and must be downloaded manually.\n\
         Please go to {url} and save this file to {}",
        .destination.display()
    )]
    ManualDownloadRequired { url: String, destination: PathBuf },

    #[error("Failed to find {kind} from result: {kind} ID {id}")]
    LookupMismatch { kind: LookupKind, id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Files,
    Projects,
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Files => write!(f, "file"),
            BatchPhase::Projects => write!(f, "mod"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    File,
    Project,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::File => write!(f, "file"),
            LookupKind::Project => write!(f, "project"),
        }
    }
}

/// One reported problem: who it concerns, what went wrong, and where the
/// user can act on it.
#[derive(Debug)]
pub struct FailureDetail {
    pub name: String,
    pub failure: ResolveFailure,
    pub action_url: Option<String>,
}

impl FailureDetail {
    pub fn new(name: impl Into<String>, failure: ResolveFailure) -> Self {
        Self {
            name: name.into(),
            failure,
            action_url: None,
        }
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    pub fn message(&self) -> String {
        self.failure.to_string()
    }
}

impl Serialize for FailureDetail {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FailureDetail", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("url", &self.action_url)?;
        state.end()
    }
}
