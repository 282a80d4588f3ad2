use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    movesets: HashMap<String, MovesetEntry>,
    #[serde(default)]
    scenarios: HashMap<String, ScenarioEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MovesetEntry {
    Path(String),
    Detailed { path: String },
}

impl MovesetEntry {
    fn as_path(&self) -> &str {
        match self {
            MovesetEntry::Path(path) => path,
            MovesetEntry::Detailed { path } => path,
        }
    }
}

/// Scripted input run against one or more movesets.
#[derive(Debug, Deserialize)]
struct ScenarioEntry {
    script: String,
    movesets: Vec<String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod movesets {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.movesets.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.movesets, "moveset", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.movesets, "moveset", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.movesets, "moveset", name)?;
        Ok(resolve_path(entry.as_path()))
    }
}

pub mod scenarios {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.scenarios.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Moveset fixture names the scenario expects to be registered, in priority order.
    pub fn movesets(name: &str) -> Result<Vec<String>> {
        let entry = lookup(&MANIFEST.scenarios, "scenario", name)?;
        Ok(entry.movesets.clone())
    }

    pub fn script_json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.scenarios, "scenario", name)?;
        read_to_string(&entry.script)
    }

    pub fn script<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.scenarios, "scenario", name)?;
        super::load_json(&entry.script)
    }
}
