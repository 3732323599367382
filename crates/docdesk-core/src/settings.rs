//! Process-wide operator settings.
//!
//! `SettingsStore` holds the settings resolved from [`Config`](crate::config::Config)
//! plus the operator overrides persisted as JSON. Components call
//! [`SettingsStore::subscribe`] and read the receiver when they need a value;
//! every accepted change is broadcast through a `tokio::sync::watch` channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::{resolve_with_base, Config};
use crate::error::{Error, Result};
use crate::types::SearchMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_ms: 30_000,
            user_agent: concat!("docdesk/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub mode: SearchMode,
    /// Keep hits that only clear the similarity floor.
    pub include_semantic: bool,
    pub synonyms_enabled: bool,
    /// Apply the keyword/synonym rank boost across documents.
    pub boost: bool,
    /// Documents per listing page; also sizes the ranked request.
    pub page_size: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { mode: SearchMode::Hybrid, include_semantic: true, synonyms_enabled: true, boost: true, page_size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub color: bool,
}

impl Default for RenderSettings {
    fn default() -> Self { Self { color: true } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Relative paths are taken from the directory holding `config.toml`.
    pub overrides_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self { Self { overrides_path: "~/.config/docdesk/overrides.json".into() } }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub search: SearchSettings,
    pub render: RenderSettings,
    /// Canonical term -> synonyms. Empty means the built-in table.
    pub synonyms: BTreeMap<String, Vec<String>>,
    pub store: StoreSettings,
}

pub struct SettingsStore {
    base: Settings,
    overrides: Value,
    path: Option<PathBuf>,
    tx: watch::Sender<Settings>,
}

impl SettingsStore {
    /// In-memory store with no persisted overrides.
    pub fn new(base: Settings) -> Self {
        let (tx, _rx) = watch::channel(base.clone());
        Self { base, overrides: Value::Object(Map::new()), path: None, tx }
    }

    /// Resolve settings from `config` and apply the overrides file it names.
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        let base = config.settings()?;
        let path = resolve_with_base(config.dir(), &base.store.overrides_path);
        Ok(Self::with_overrides_file(base, path)?)
    }

    pub fn with_overrides_file(base: Settings, path: PathBuf) -> Result<Self> {
        let overrides = read_overrides(&path)?;
        let current = apply(&base, &overrides)?;
        debug!(path = %path.display(), "loaded settings overrides");
        let (tx, _rx) = watch::channel(current);
        Ok(Self { base, overrides, path: Some(path), tx })
    }

    pub fn current(&self) -> Settings { self.tx.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<Settings> { self.tx.subscribe() }

    pub fn overrides(&self) -> &Value { &self.overrides }

    /// Set a dotted key (`search.mode`, `render.color`, ...) as an override.
    ///
    /// `value` is parsed as JSON when possible and taken as a string
    /// otherwise. Values that do not fit the settings schema are rejected and
    /// leave the store unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        let parsed = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
        if !key.starts_with("synonyms.") && !known_key(&self.base, key) {
            return Err(Error::InvalidConfig(format!("unknown settings key '{key}'")));
        }
        let mut candidate = self.overrides.clone();
        insert_dotted(&mut candidate, key, parsed)?;
        let next = apply(&self.base, &candidate)?;
        self.overrides = candidate;
        Ok(self.publish(next))
    }

    /// Apply an in-memory change without recording it as an override.
    pub fn update<F: FnOnce(&mut Settings)>(&self, f: F) -> bool {
        let mut next = self.current();
        f(&mut next);
        self.publish(next)
    }

    /// Drop every override and fall back to the configured settings.
    pub fn reset(&mut self) -> bool {
        self.overrides = Value::Object(Map::new());
        self.publish(self.base.clone())
    }

    /// Write the overrides file. Config files are never rewritten.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::Operation(format!("create {}: {e}", dir.display())))?;
        }
        let body = serde_json::to_string_pretty(&self.overrides).map_err(|e| Error::Operation(e.to_string()))?;
        std::fs::write(path, body).map_err(|e| Error::Operation(format!("write {}: {e}", path.display())))?;
        info!(path = %path.display(), "saved settings overrides");
        Ok(())
    }

    fn publish(&self, next: Settings) -> bool {
        self.tx.send_if_modified(|cur| {
            if *cur == next { return false; }
            *cur = next;
            true
        })
    }
}

fn read_overrides(path: &Path) -> Result<Value> {
    if !path.exists() { return Ok(Value::Object(Map::new())); }
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Operation(format!("read {}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
    if !value.is_object() { return Err(Error::InvalidConfig(format!("{}: expected a JSON object", path.display()))); }
    Ok(value)
}

fn apply(base: &Settings, overrides: &Value) -> Result<Settings> {
    let mut merged = serde_json::to_value(base).map_err(|e| Error::Operation(e.to_string()))?;
    merge_values(&mut merged, overrides);
    serde_json::from_value(merged).map_err(|e| Error::InvalidConfig(e.to_string()))
}

fn merge_values(into: &mut Value, from: &Value) {
    match (into, from) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                match dst.get_mut(k) {
                    Some(slot) if slot.is_object() && v.is_object() => merge_values(slot, v),
                    _ => { dst.insert(k.clone(), v.clone()); }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

fn known_key(base: &Settings, key: &str) -> bool {
    let Ok(tree) = serde_json::to_value(base) else { return false };
    key.split('.').try_fold(&tree, |node, part| node.get(part)).is_some()
}

fn insert_dotted(root: &mut Value, key: &str, value: Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) { return Err(Error::InvalidConfig(format!("bad settings key '{key}'"))); }
    let mut node = root;
    for part in &parts[..parts.len() - 1] {
        let obj = node.as_object_mut().ok_or_else(|| Error::InvalidConfig(format!("'{key}' crosses a non-table value")))?;
        node = obj.entry((*part).to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
    let obj = node.as_object_mut().ok_or_else(|| Error::InvalidConfig(format!("'{key}' crosses a non-table value")))?;
    obj.insert(parts[parts.len() - 1].to_string(), value);
    Ok(())
}
