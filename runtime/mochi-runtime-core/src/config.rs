use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;
const DEFAULT_WASM_MAX_STACK: usize = 8 * 1024 * 1024;
const DEFAULT_SCRIPT_MAX_JOBS: usize = 100_000;

/// Host-wide knobs shared by both backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    pub http_timeout: Duration,
    pub user_agent: String,
    /// Responses larger than this fail the send with a transport fault.
    pub max_body_bytes: usize,
    pub wasm_max_stack: usize,
    pub wasm_cache: bool,
    /// Upper bound on promise jobs pumped per script invocation.
    pub script_max_jobs: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            user_agent: concat!("mochi-host/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: DEFAULT_MAX_BODY,
            wasm_max_stack: DEFAULT_WASM_MAX_STACK,
            wasm_cache: false,
            script_max_jobs: DEFAULT_SCRIPT_MAX_JOBS,
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `MOCHI_*` environment variables. Unparseable
    /// or zero values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let positive = |key: &str| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
                .filter(|val| *val > 0)
        };
        Self {
            http_timeout: positive("MOCHI_HTTP_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.http_timeout),
            user_agent: lookup("MOCHI_HTTP_USER_AGENT")
                .filter(|val| !val.is_empty())
                .unwrap_or(defaults.user_agent),
            max_body_bytes: positive("MOCHI_HTTP_MAX_BODY")
                .map(|val| val as usize)
                .unwrap_or(defaults.max_body_bytes),
            wasm_max_stack: positive("MOCHI_WASM_MAX_STACK")
                .map(|val| val as usize)
                .unwrap_or(defaults.wasm_max_stack),
            wasm_cache: matches!(lookup("MOCHI_WASM_CACHE").as_deref(), Some("1")),
            script_max_jobs: positive("MOCHI_SCRIPT_MAX_JOBS")
                .map(|val| val as usize)
                .unwrap_or(defaults.script_max_jobs),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Wasm,
    Script,
}

/// Module description shipped next to the module binary or bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub backend: BackendKind,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl ModuleManifest {
    /// Reads a manifest; a relative `file` is resolved against the
    /// manifest's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("read manifest {path:?}"))?;
        let mut manifest: ModuleManifest =
            serde_json::from_str(&raw).with_context(|| format!("parse manifest {path:?}"))?;
        if manifest.id.trim().is_empty() {
            bail!("manifest {path:?} has an empty id");
        }
        if manifest.file.is_relative() {
            if let Some(dir) = path.parent() {
                manifest.file = dir.join(&manifest.file);
            }
        }
        Ok(manifest)
    }

    pub fn class_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or("Source")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("MOCHI_HTTP_TIMEOUT_MS", "1500"),
            ("MOCHI_HTTP_USER_AGENT", "test-agent"),
            ("MOCHI_WASM_CACHE", "1"),
            ("MOCHI_SCRIPT_MAX_JOBS", "0"),
            ("MOCHI_HTTP_MAX_BODY", "lots"),
        ]
        .into_iter()
        .collect();
        let config = HostConfig::from_lookup(|key| vars.get(key).map(|val| val.to_string()));
        assert_eq!(config.http_timeout, Duration::from_millis(1500));
        assert_eq!(config.user_agent, "test-agent");
        assert!(config.wasm_cache);
        assert_eq!(config.script_max_jobs, DEFAULT_SCRIPT_MAX_JOBS);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY);
        assert_eq!(config.wasm_max_stack, DEFAULT_WASM_MAX_STACK);
    }

    #[test]
    fn manifest_file_is_relative_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.json");
        fs::write(
            &path,
            r#"{"id":"dev.mochi.demo","name":"Demo","version":"1.0.0","backend":"script","file":"index.js"}"#,
        )
        .unwrap();
        let manifest = ModuleManifest::load(&path).unwrap();
        assert_eq!(manifest.backend, BackendKind::Script);
        assert_eq!(manifest.file, dir.path().join("index.js"));
        assert_eq!(manifest.class_name(), "Source");
    }

    #[test]
    fn manifest_rejects_unknown_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.json");
        fs::write(
            &path,
            r#"{"id":"x","name":"X","version":"1","backend":"lua","file":"x.lua"}"#,
        )
        .unwrap();
        assert!(ModuleManifest::load(&path).is_err());
    }
}
