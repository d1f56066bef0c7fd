//! mml-config
//!
//! Layered YAML configuration for the grading harness.
//!
//! Every layer is merged on top of the serialized [`HarnessConfig::default`],
//! so an empty layer list resolves to the stock lab setup (`./runner`,
//! `./performance`, `./traces/*.rep`, `make clean; make all`).
//!
//! Scoring weights, targets and clamps are fixed grading policy and live in
//! `mml-score`, not here.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Phrase the checker prints once a trace ran to completion without faults.
pub const DEFAULT_CORRECTNESS_MARKER: &str = "umalloc package passed correctness check.";

/// Word the performance binary prints in front of its elapsed time.
pub const DEFAULT_PERFORMANCE_MARKER: &str = "Success";

/// Timed trials per trace.
pub const DEFAULT_PERFORMANCE_RUNS: u32 = 20;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub traces: TracesConfig,
    pub tools: ToolsConfig,
    pub markers: MarkersConfig,
    pub performance: PerformanceConfig,
    pub build: BuildConfig,
    pub exports: ExportsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracesConfig {
    /// Directory scanned for workload files.
    pub dir: PathBuf,
    /// File extension without the leading dot.
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Working directory for the external tools. `None` = the harness cwd.
    pub workdir: Option<PathBuf>,
    /// Correctness / utilization checker.
    pub checker: PathBuf,
    /// Performance timing binary.
    pub performance: PathBuf,
    pub correctness_args: Vec<String>,
    pub utilization_args: Vec<String>,
    /// Upper bound for a single tool invocation.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkersConfig {
    pub correctness: String,
    pub performance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub runs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub enabled: bool,
    /// argv of the clean step.
    pub clean: Vec<String>,
    /// argv of the build step.
    pub all: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportsConfig {
    /// Root for per-run artifact directories. `None` disables exports.
    pub dir: Option<PathBuf>,
}

impl Default for TracesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./traces"),
            extension: "rep".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workdir: None,
            checker: PathBuf::from("./runner"),
            performance: PathBuf::from("./performance"),
            correctness_args: vec!["-r".to_string()],
            utilization_args: vec!["-ru".to_string()],
            timeout_secs: 60,
        }
    }
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            correctness: DEFAULT_CORRECTNESS_MARKER.to_string(),
            performance: DEFAULT_PERFORMANCE_MARKER.to_string(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_PERFORMANCE_RUNS,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clean: vec!["make".to_string(), "clean".to_string()],
            all: vec!["make".to_string(), "all".to_string()],
            timeout_secs: 300,
        }
    }
}

impl HarnessConfig {
    /// Reject settings the harness cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.traces.extension.trim().is_empty() {
            bail!("CONFIG_INVALID: traces.extension must not be empty");
        }
        if self.performance.runs == 0 {
            bail!("CONFIG_INVALID: performance.runs must be >= 1");
        }
        if self.tools.timeout_secs == 0 {
            bail!("CONFIG_INVALID: tools.timeout_secs must be >= 1");
        }
        if self.build.enabled && self.build.timeout_secs == 0 {
            bail!("CONFIG_INVALID: build.timeout_secs must be >= 1");
        }
        if self.markers.correctness.is_empty() || self.markers.performance.is_empty() {
            bail!("CONFIG_INVALID: markers must not be empty");
        }
        if self.build.enabled && (self.build.clean.is_empty() || self.build.all.is_empty()) {
            bail!("CONFIG_INVALID: build.clean and build.all need at least a program name");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

/// Every pointer the harness reads. Leaves under any of these prefixes are
/// consumed; anything else in a layer is a typo or a stale key.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/traces/dir",
    "/traces/extension",
    "/tools/workdir",
    "/tools/checker",
    "/tools/performance",
    "/tools/correctness_args",
    "/tools/utilization_args",
    "/tools/timeout_secs",
    "/markers/correctness",
    "/markers/performance",
    "/performance/runs",
    "/build/enabled",
    "/build/clean",
    "/build/all",
    "/build/timeout_secs",
    "/exports/dir",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Produce an unused-key report for a merged config document.
/// If `policy == Fail`, returns an error when unused keys exist.
///
/// Each registered pointer consumes its whole subtree (argv lists are read
/// as a unit). Anything else is reported at the first unregistered level
/// that is not a mapping: a stray `grading: {curve: 5}` shows up as
/// `/grading/curve`, a stray list as the list itself.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut unused = Vec::new();
    let mut pointer = String::new();
    find_unread(config_json, &mut pointer, &mut unused);
    unused.sort();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown: Vec<&str> = report
            .unused_leaf_pointers
            .iter()
            .take(12)
            .map(String::as_str)
            .collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {}",
            report.unused_leaf_pointers.len(),
            shown.join(", ")
        );
    }

    Ok(report)
}

/// Depth-first walk; `pointer` is the JSON pointer of `v` and is restored
/// before returning.
fn find_unread(v: &Value, pointer: &mut String, out: &mut Vec<String>) {
    if CONSUMED_POINTERS.contains(&pointer.as_str()) {
        return;
    }
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let len = pointer.len();
                pointer.push('/');
                // RFC 6901 escaping
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                find_unread(child, pointer, out);
                pointer.truncate(len);
            }
        }
        _ if pointer.is_empty() => out.push("/".to_string()),
        _ => out.push(pointer.clone()),
    }
}

// ---------------------------------------------------------------------------
// Loading + hashing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: HarnessConfig,
    pub config_hash: String,
    pub canonical_json: String,
    /// Merged document (defaults + layers), before typed deserialization.
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Defaults form the bottom layer; later docs override earlier ones.
    let mut merged =
        serde_json::to_value(HarnessConfig::default()).context("serialize defaults failed")?;
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        if v_yaml.is_null() {
            // Empty document.
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merge_layer(&mut merged, v_json);
    }

    let config: HarnessConfig =
        serde_json::from_value(merged.clone()).context("config does not match harness schema")?;
    config.validate()?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config,
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Overlay `layer` onto `base`: mappings merge key by key, anything else
/// (scalars, lists, null) replaces what was there.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_layer(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default map is ordered by key, so source key order never
    // reaches the hash.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
