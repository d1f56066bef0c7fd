use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MANIFEST_SCHEMA_VERSION: i32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const GRADE_REPORT_FILE: &str = "grade_report.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub config_hash: String,
    pub traces_dir: String,
    pub host_fingerprint: String,
    pub created_at_utc: DateTime<Utc>,
    pub artifacts: ArtifactList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactList {
    pub manifest_json: String,
    pub grade_report_json: String,
}

pub struct InitRunArtifactsArgs<'a> {
    pub exports_root: &'a Path,
    pub run_id: Uuid,
    pub config_hash: &'a str,
    pub traces_dir: &'a Path,
    pub host_fingerprint: &'a str,
}

pub struct InitRunArtifactsResult {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Create `<exports_root>/<run_id>/` and write its `manifest.json`.
///
/// The grade report itself is written by the caller into `run_dir` under
/// [`GRADE_REPORT_FILE`].
pub fn init_run_artifacts(args: InitRunArtifactsArgs<'_>) -> Result<InitRunArtifactsResult> {
    let run_dir = args.exports_root.join(args.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create exports dir failed: {}", run_dir.display()))?;

    let manifest = RunManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        run_id: args.run_id,
        config_hash: args.config_hash.to_string(),
        traces_dir: args.traces_dir.display().to_string(),
        host_fingerprint: args.host_fingerprint.to_string(),
        created_at_utc: Utc::now(),
        artifacts: ArtifactList {
            manifest_json: MANIFEST_FILE.to_string(),
            grade_report_json: GRADE_REPORT_FILE.to_string(),
        },
    };

    let manifest_path = run_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest failed")?;
    fs::write(&manifest_path, format!("{json}\n"))
        .with_context(|| format!("write manifest failed: {}", manifest_path.display()))?;

    Ok(InitRunArtifactsResult {
        run_dir,
        manifest_path,
    })
}

/// Non-sensitive host fingerprint for run attribution. Not a hardware id.
pub fn host_fingerprint() -> String {
    let hostname = env_first(&["HOSTNAME", "COMPUTERNAME"]).unwrap_or_else(|| "UNKNOWN_HOST".to_string());
    let username = env_first(&["USER", "USERNAME"]).unwrap_or_else(|| "UNKNOWN_USER".to_string());
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    format!("{hostname}|{username}|{os}|{arch}")
}

fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
}
