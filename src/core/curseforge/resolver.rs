use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use reqwest::Url;
use tracing::{debug, info, warn};

use super::api::MetadataApi;
use super::failure::{BatchPhase, FailureDetail, LookupKind, ResolveFailure};
use super::update_data::CurseForgeUpdateData;
use crate::core::error::ResolverError;
use crate::core::index::ModReference;

/// Position of a reference in the slice handed to [`MetadataResolver::resolve`].
pub type ReferenceId = usize;

/// Subject used for failures that concern no single reference.
const GENERIC_SUBJECT: &str = "Other";

/// Outcome of one resolution pass.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Direct download URL per reference, in the order the file lookup returned them.
    pub resolved: IndexMap<ReferenceId, Url>,
    pub failures: Vec<FailureDetail>,
}

/// Resolves CurseForge file references to download URLs in two batched lookups:
/// files first, then projects for whatever the file lookup could not serve.
pub struct MetadataResolver<'a, A: MetadataApi + ?Sized> {
    api: &'a A,
    /// Absolute pack root, used for the destination hint of manual downloads.
    pack_folder: PathBuf,
}

impl<'a, A: MetadataApi + ?Sized> MetadataResolver<'a, A> {
    pub fn new(api: &'a A, pack_folder: &Path) -> Self {
        let pack_folder =
            std::path::absolute(pack_folder).unwrap_or_else(|_| pack_folder.to_path_buf());
        Self { api, pack_folder }
    }

    pub async fn resolve(&self, references: &[ModReference]) -> Resolution {
        let mut resolution = Resolution::default();

        // 1. Group by file id
        let mut file_groups: IndexMap<u32, Vec<ReferenceId>> = IndexMap::new();
        let mut project_ids: HashMap<ReferenceId, u32> = HashMap::new();

        for (id, reference) in references.iter().enumerate() {
            match CurseForgeUpdateData::from_reference(reference) {
                None => resolution.failures.push(FailureDetail::new(
                    &reference.name,
                    ResolveFailure::MissingUpdateSection,
                )),
                Some(Err(e)) => resolution.failures.push(FailureDetail::new(
                    &reference.name,
                    ResolveFailure::InvalidUpdateSection(e.to_string().trim().to_string()),
                )),
                Some(Ok(data)) => {
                    file_groups.entry(data.file_id).or_default().push(id);
                    project_ids.insert(id, data.project_id);
                }
            }
        }

        if file_groups.is_empty() {
            return resolution;
        }

        // 2. Batch file lookup
        let file_ids: Vec<u32> = file_groups.keys().copied().collect();
        info!("Looking up {} CurseForge files", file_ids.len());

        let files = match self.api.get_files(&file_ids).await {
            Ok(files) => files,
            Err(e) => {
                resolution
                    .failures
                    .push(batch_failure(BatchPhase::Files, &e));
                return resolution;
            }
        };

        // 3. Reconcile file results
        let mut manual_downloads: IndexMap<u32, IndexSet<u32>> = IndexMap::new();

        for file in &files {
            let Some(group) = file_groups.get(&file.id) else {
                resolution.failures.push(FailureDetail::new(
                    file.id.to_string(),
                    ResolveFailure::UnrequestedResultId {
                        file_id: file.id,
                        project_id: file.mod_id,
                    },
                ));
                continue;
            };

            let Some(raw_url) = file.download_url() else {
                debug!("File {} of project {} has no download URL", file.id, file.mod_id);
                manual_downloads
                    .entry(file.mod_id)
                    .or_default()
                    .insert(file.id);
                continue;
            };

            match parse_download_url(raw_url) {
                Ok(url) => {
                    for &id in group {
                        resolution.resolved.insert(id, url.clone());
                    }
                }
                Err(reason) => resolution.failures.push(FailureDetail::new(
                    file.id.to_string(),
                    ResolveFailure::UrlParseError {
                        url: raw_url.to_string(),
                        file_id: file.id,
                        project_id: file.mod_id,
                        reason,
                    },
                )),
            }
        }

        // Some categories (e.g. shaderpacks) never show up in the file lookup.
        for (&file_id, group) in &file_groups {
            for id in group {
                if resolution.resolved.contains_key(id) {
                    continue;
                }
                if let Some(&project_id) = project_ids.get(id) {
                    manual_downloads
                        .entry(project_id)
                        .or_default()
                        .insert(file_id);
                }
            }
        }

        info!(
            "Resolved {} of {} references, {} projects need manual download",
            resolution.resolved.len(),
            project_ids.len(),
            manual_downloads.len()
        );

        if manual_downloads.is_empty() {
            return resolution;
        }

        // 4. Batch project lookup
        let mod_ids: Vec<u32> = manual_downloads.keys().copied().collect();
        let projects = match self.api.get_mods(&mod_ids).await {
            Ok(projects) => projects,
            Err(e) => {
                resolution
                    .failures
                    .push(batch_failure(BatchPhase::Projects, &e));
                return resolution;
            }
        };

        // 5. Manual download notices
        for project in &projects {
            let Some(queued) = manual_downloads.get(&project.id) else {
                resolution.failures.push(FailureDetail::new(
                    &project.name,
                    ResolveFailure::LookupMismatch {
                        kind: LookupKind::Project,
                        id: project.id,
                    },
                ));
                continue;
            };

            for &file_id in queued {
                let Some(group) = file_groups.get(&file_id) else {
                    resolution.failures.push(FailureDetail::new(
                        &project.name,
                        ResolveFailure::LookupMismatch {
                            kind: LookupKind::File,
                            id: file_id,
                        },
                    ));
                    continue;
                };

                let url = project.manual_download_url(file_id);
                for &id in group {
                    let reference = &references[id];
                    let failure = ResolveFailure::ManualDownloadRequired {
                        url: url.clone(),
                        destination: self.pack_folder.join(&reference.path),
                    };
                    resolution
                        .failures
                        .push(FailureDetail::new(&reference.name, failure).with_action_url(&url));
                }
            }
        }

        for project_id in manual_downloads.keys() {
            if !projects.iter().any(|p| p.id == *project_id) {
                warn!("Project {} missing from CurseForge project lookup", project_id);
            }
        }

        resolution
    }
}

/// Download URLs must be absolute http(s) URLs.
fn parse_download_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

fn batch_failure(phase: BatchPhase, error: &ResolverError) -> FailureDetail {
    let reason = match error {
        ResolverError::ApiStatus { status, .. } => format!("error code {}", status),
        other => other.to_string(),
    };
    warn!("CurseForge {} lookup failed: {}", phase, error);
    FailureDetail::new(
        GENERIC_SUBJECT,
        ResolveFailure::BatchRequestFailed { phase, reason },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::curseforge::model::{FileRecord, ProjectLinks, ProjectRecord};
    use crate::core::error::ResolverResult;

    #[derive(Default)]
    struct FakeApi {
        files: Vec<FileRecord>,
        projects: Vec<ProjectRecord>,
        files_status: Option<u16>,
        files_malformed: bool,
        projects_status: Option<u16>,
        file_requests: Mutex<Vec<Vec<u32>>>,
        mod_requests: Mutex<Vec<Vec<u32>>>,
    }

    #[async_trait]
    impl MetadataApi for FakeApi {
        async fn get_files(&self, file_ids: &[u32]) -> ResolverResult<Vec<FileRecord>> {
            self.file_requests.lock().unwrap().push(file_ids.to_vec());
            if self.files_malformed {
                let err = serde_json::from_str::<serde_json::Value>("{\"data\": [").unwrap_err();
                return Err(ResolverError::Json(err));
            }
            match self.files_status {
                Some(status) => Err(ResolverError::ApiStatus {
                    endpoint: "files".into(),
                    status,
                }),
                None => Ok(self.files.clone()),
            }
        }

        async fn get_mods(&self, mod_ids: &[u32]) -> ResolverResult<Vec<ProjectRecord>> {
            self.mod_requests.lock().unwrap().push(mod_ids.to_vec());
            match self.projects_status {
                Some(status) => Err(ResolverError::ApiStatus {
                    endpoint: "mods".into(),
                    status,
                }),
                None => Ok(self.projects.clone()),
            }
        }
    }

    fn cf_reference(name: &str, file_id: u32, project_id: u32) -> ModReference {
        let mut section = toml::Table::new();
        section.insert("file-id".into(), toml::Value::Integer(file_id.into()));
        section.insert("project-id".into(), toml::Value::Integer(project_id.into()));
        let mut update = toml::Table::new();
        update.insert("curseforge".into(), toml::Value::Table(section));

        ModReference {
            name: name.into(),
            path: PathBuf::from(format!("mods/{}.jar", name.to_lowercase())),
            download_mode: Some("metadata:curseforge".into()),
            update,
        }
    }

    fn bare_reference(name: &str) -> ModReference {
        ModReference {
            name: name.into(),
            path: PathBuf::from("mods/bare.jar"),
            download_mode: None,
            update: toml::Table::new(),
        }
    }

    fn file(id: u32, mod_id: u32, url: Option<&str>) -> FileRecord {
        FileRecord {
            id,
            mod_id,
            download_url: url.map(String::from),
        }
    }

    fn project(id: u32, name: &str, website: &str) -> ProjectRecord {
        ProjectRecord {
            id,
            name: name.into(),
            links: Some(ProjectLinks {
                website_url: website.into(),
            }),
        }
    }

    #[tokio::test]
    async fn duplicates_share_one_resolved_url() {
        let api = FakeApi {
            files: vec![file(10, 100, Some("https://cdn.example/a.jar"))],
            ..Default::default()
        };
        let refs = vec![cf_reference("A", 10, 100), cf_reference("A copy", 10, 100)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert!(resolution.failures.is_empty());
        let expected = Url::parse("https://cdn.example/a.jar").unwrap();
        assert_eq!(resolution.resolved.get(&0), Some(&expected));
        assert_eq!(resolution.resolved.get(&1), Some(&expected));
        assert_eq!(*api.file_requests.lock().unwrap(), vec![vec![10]]);
        assert!(api.mod_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_reference_resolved_when_all_urls_returned() {
        let api = FakeApi {
            files: vec![
                file(1, 11, Some("https://cdn.example/one.jar")),
                file(2, 22, Some("https://cdn.example/two.jar")),
                file(3, 33, Some("https://cdn.example/three.jar")),
            ],
            ..Default::default()
        };
        let refs = vec![
            cf_reference("One", 1, 11),
            cf_reference("Two", 2, 22),
            cf_reference("Three", 3, 33),
        ];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert!(resolution.failures.is_empty());
        assert_eq!(resolution.resolved.len(), 3);
        assert_eq!(
            resolution.resolved[&2].as_str(),
            "https://cdn.example/three.jar"
        );
    }

    #[tokio::test]
    async fn missing_update_section_is_reported_and_not_requested() {
        let api = FakeApi {
            files: vec![file(10, 100, Some("https://cdn.example/a.jar"))],
            ..Default::default()
        };
        let refs = vec![bare_reference("Bare"), cf_reference("A", 10, 100)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].name, "Bare");
        assert!(matches!(
            resolution.failures[0].failure,
            ResolveFailure::MissingUpdateSection
        ));
        assert_eq!(*api.file_requests.lock().unwrap(), vec![vec![10]]);
        assert!(resolution.resolved.contains_key(&1));
        assert!(!resolution.resolved.contains_key(&0));
    }

    #[tokio::test]
    async fn no_request_when_nothing_to_look_up() {
        let api = FakeApi::default();
        let refs = vec![bare_reference("Bare")];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.failures.len(), 1);
        assert!(api.file_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_update_section_is_reported() {
        let api = FakeApi::default();
        let mut reference = cf_reference("Broken", 1, 1);
        reference
            .update
            .insert("curseforge".into(), toml::Value::String("oops".into()));

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&[reference])
            .await;

        assert_eq!(resolution.failures.len(), 1);
        assert!(matches!(
            resolution.failures[0].failure,
            ResolveFailure::InvalidUpdateSection(_)
        ));
    }

    #[tokio::test]
    async fn failed_file_lookup_aborts_with_single_failure() {
        let api = FakeApi {
            files_status: Some(403),
            ..Default::default()
        };
        let refs = vec![cf_reference("A", 10, 100), cf_reference("B", 20, 200)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].name, "Other");
        assert_eq!(
            resolution.failures[0].message(),
            "Failed to resolve CurseForge metadata for file data: error code 403"
        );
        assert!(resolution.resolved.is_empty());
        assert!(api.mod_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn absent_file_goes_through_manual_download() {
        let api = FakeApi {
            projects: vec![project(200, "ShaderX", "https://cf.example/shaderx")],
            ..Default::default()
        };
        let refs = vec![cf_reference("ShaderX", 20, 200)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert!(resolution.resolved.is_empty());
        assert_eq!(*api.mod_requests.lock().unwrap(), vec![vec![200]]);
        assert_eq!(resolution.failures.len(), 1);

        let detail = &resolution.failures[0];
        assert_eq!(detail.name, "ShaderX");
        assert_eq!(
            detail.action_url.as_deref(),
            Some("https://cf.example/shaderx/files/20")
        );
        match &detail.failure {
            ResolveFailure::ManualDownloadRequired { url, destination } => {
                assert_eq!(url, "https://cf.example/shaderx/files/20");
                assert!(destination.ends_with("mods/shaderx.jar"));
                assert!(destination.is_absolute());
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_url_reports_each_duplicate_once() {
        let api = FakeApi {
            files: vec![file(30, 300, None)],
            projects: vec![project(300, "Locked", "https://cf.example/locked")],
            ..Default::default()
        };
        let refs = vec![cf_reference("Locked", 30, 300), cf_reference("Locked", 30, 300)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.failures.len(), 2);
        assert!(resolution
            .failures
            .iter()
            .all(|f| f.action_url.as_deref() == Some("https://cf.example/locked/files/30")));
    }

    #[tokio::test]
    async fn unrequested_and_malformed_records_are_per_item_failures() {
        let api = FakeApi {
            files: vec![
                file(99, 990, Some("https://cdn.example/x.jar")),
                file(10, 100, Some("not a url")),
                file(20, 200, Some("https://cdn.example/b.jar")),
            ],
            projects: vec![project(100, "A", "https://cf.example/a")],
            ..Default::default()
        };
        let refs = vec![cf_reference("A", 10, 100), cf_reference("B", 20, 200)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert!(matches!(
            resolution.failures[0].failure,
            ResolveFailure::UnrequestedResultId {
                file_id: 99,
                project_id: 990
            }
        ));
        assert!(matches!(
            resolution.failures[1].failure,
            ResolveFailure::UrlParseError { file_id: 10, .. }
        ));
        // The unparsable file still gets a manual download notice.
        assert!(matches!(
            resolution.failures[2].failure,
            ResolveFailure::ManualDownloadRequired { .. }
        ));
        assert_eq!(resolution.failures.len(), 3);
        assert_eq!(resolution.resolved.len(), 1);
        assert!(resolution.resolved.contains_key(&1));
    }

    #[tokio::test]
    async fn unexpected_project_is_a_lookup_mismatch() {
        let api = FakeApi {
            projects: vec![
                project(200, "ShaderX", "https://cf.example/shaderx"),
                project(777, "Stranger", "https://cf.example/stranger"),
            ],
            ..Default::default()
        };
        let refs = vec![cf_reference("ShaderX", 20, 200)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.failures.len(), 2);
        assert_eq!(resolution.failures[1].name, "Stranger");
        assert!(matches!(
            resolution.failures[1].failure,
            ResolveFailure::LookupMismatch {
                kind: LookupKind::Project,
                id: 777
            }
        ));
    }

    #[tokio::test]
    async fn failed_project_lookup_keeps_earlier_results() {
        let api = FakeApi {
            files: vec![file(10, 100, Some("https://cdn.example/a.jar"))],
            projects_status: Some(500),
            ..Default::default()
        };
        let refs = vec![cf_reference("A", 10, 100), cf_reference("ShaderX", 20, 200)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(
            resolution.failures[0].message(),
            "Failed to resolve CurseForge metadata for mod data: error code 500"
        );
    }

    #[tokio::test]
    async fn non_http_download_urls_are_rejected() {
        let api = FakeApi {
            files: vec![
                file(10, 100, Some("file:///etc/passwd")),
                file(20, 200, Some("javascript:alert(1)")),
                file(30, 300, Some("https://cdn.example/c.jar")),
            ],
            projects: vec![
                project(100, "A", "https://cf.example/a"),
                project(200, "B", "https://cf.example/b"),
            ],
            ..Default::default()
        };
        let refs = vec![
            cf_reference("A", 10, 100),
            cf_reference("B", 20, 200),
            cf_reference("C", 30, 300),
        ];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(
            resolution.resolved[&2].as_str(),
            "https://cdn.example/c.jar"
        );
        assert!(matches!(
            resolution.failures[0].failure,
            ResolveFailure::UrlParseError { file_id: 10, .. }
        ));
        assert!(matches!(
            resolution.failures[1].failure,
            ResolveFailure::UrlParseError { file_id: 20, .. }
        ));
        assert!(resolution.failures[0].message().contains("unsupported scheme 'file'"));
        // Both rejected files fall through to manual download.
        assert_eq!(*api.mod_requests.lock().unwrap(), vec![vec![100, 200]]);
        assert_eq!(resolution.failures.len(), 4);
        assert_eq!(
            resolution.failures[3].action_url.as_deref(),
            Some("https://cf.example/b/files/20")
        );
    }

    #[tokio::test]
    async fn undecodable_file_lookup_aborts_with_single_failure() {
        let api = FakeApi {
            files_malformed: true,
            ..Default::default()
        };
        let refs = vec![cf_reference("A", 10, 100), cf_reference("B", 20, 200)];

        let resolution = MetadataResolver::new(&api, Path::new("/pack"))
            .resolve(&refs)
            .await;

        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].name, "Other");
        assert!(matches!(
            resolution.failures[0].failure,
            ResolveFailure::BatchRequestFailed {
                phase: BatchPhase::Files,
                ..
            }
        ));
        assert!(resolution.failures[0].message().contains("JSON error"));
        assert!(resolution.resolved.is_empty());
        assert!(api.mod_requests.lock().unwrap().is_empty());
    }
}
