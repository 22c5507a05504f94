use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::core::curseforge::{FailureDetail, MetadataApi, MetadataResolver, Resolution};
use crate::core::error::ResolverResult;
use crate::core::index::{ModReference, PackLoader};
use crate::core::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "cfmeta", version, about = "Resolve CurseForge mod files of a pack")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve every `metadata:curseforge` metafile in a pack.
    Resolve {
        /// Pack folder containing `index.toml`.
        pack: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
        /// API key, overriding settings and environment.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Persist API settings.
    Config {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> ResolverResult<ExitCode> {
        match self.command {
            Command::Resolve {
                pack,
                json,
                api_key,
            } => {
                let mut state = AppState::load();
                if let Some(key) = api_key {
                    state.settings.api_key = Some(key);
                }
                let api = state.api_client()?;
                let report = resolve_pack(&api, &pack).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", report.render_text());
                }

                Ok(if report.failures.is_empty() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
            Command::Config { api_key, api_url } => {
                let mut state = AppState::load();
                if let Some(key) = api_key {
                    state.settings.api_key = Some(key);
                }
                if let Some(url) = api_url {
                    state.settings.api_base_url = url;
                }
                state.save_settings()?;
                println!("Saved settings to {}", state.settings_path().display());
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResolvedEntry {
    pub name: String,
    pub path: PathBuf,
    pub url: String,
}

/// What `resolve` prints: successes by reference, failures as reported.
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub generated_at: DateTime<Utc>,
    pub resolved: Vec<ResolvedEntry>,
    pub failures: Vec<FailureDetail>,
}

impl ResolveReport {
    pub fn new(references: &[ModReference], resolution: Resolution) -> Self {
        let resolved = resolution
            .resolved
            .iter()
            .filter_map(|(&id, url)| {
                references.get(id).map(|r| ResolvedEntry {
                    name: r.name.clone(),
                    path: r.path.clone(),
                    url: url.to_string(),
                })
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            resolved,
            failures: resolution.failures,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.resolved {
            out.push_str(&format!("{} -> {}\n", entry.name, entry.url));
        }
        for failure in &self.failures {
            out.push_str(&format!("[!] {}: {}\n", failure.name, failure.message()));
        }
        out.push_str(&format!(
            "{} resolved, {} failed\n",
            self.resolved.len(),
            self.failures.len()
        ));
        out
    }
}

/// Load the pack at `pack` and resolve its CurseForge references against `api`.
pub async fn resolve_pack<A>(api: &A, pack: &Path) -> ResolverResult<ResolveReport>
where
    A: MetadataApi + ?Sized,
{
    let loaded = PackLoader::new(pack).load().await?;
    let references = loaded.curseforge_references();
    info!(
        "{} of {} metafiles use CurseForge metadata",
        references.len(),
        loaded.references.len()
    );

    let resolution = MetadataResolver::new(api, &loaded.root)
        .resolve(&references)
        .await;

    Ok(ResolveReport::new(&references, resolution))
}
