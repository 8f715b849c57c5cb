use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;

/// The merged run configuration for one pipeline invocation.
///
/// A nested mapping with three top-level regions: `project` (facts about
/// the run and its inputs), `bin` (tool parameters originating from
/// templates), and `options` (run-mode flags). Keys merged in from any
/// template survive unless a later synthesis stage overwrites them.
///
/// The backing `serde_json::Map` is BTreeMap-based, so serialization
/// emits keys in lexicographic order at every nesting level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineConfig {
    root: Map<String, Value>,
}

impl From<Map<String, Value>> for PipelineConfig {
    fn from(root: Map<String, Value>) -> Self {
        PipelineConfig { root }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.root
    }

    /// Merge one template document into the configuration. A key present
    /// in the document fully replaces any prior top-level value; there is
    /// no deep merge.
    pub fn merge_document(&mut self, document: Map<String, Value>) {
        for (key, value) in document {
            self.root.insert(key, value);
        }
    }

    /// A top-level region, created empty on first access.
    pub fn region_mut(&mut self, name: &str) -> &mut Map<String, Value> {
        child_object_mut(&mut self.root, name)
    }

    pub fn project_mut(&mut self) -> &mut Map<String, Value> {
        self.region_mut("project")
    }

    pub fn options_mut(&mut self) -> &mut Map<String, Value> {
        self.region_mut("options")
    }

    /// The nested tool-parameter mapping under `bin.rnaseq.tool_parameters`.
    /// This is the one region that cluster overlays update in place rather
    /// than overwrite.
    pub fn tool_parameters_mut(&mut self) -> &mut Map<String, Value> {
        let rnaseq = child_object_mut(self.region_mut("bin"), "rnaseq");
        child_object_mut(rnaseq, "tool_parameters")
    }

    /// Render with sorted keys and 4-space indentation, the format the
    /// downstream workflow consumes.
    pub fn to_json_string(&self) -> Result<String> {
        let mut out = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        Ok(String::from_utf8(out)?)
    }

    /// Persist to `path` in the deterministic on-disk format.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| path.display().to_string())?;
        let mut ser =
            serde_json::Serializer::with_formatter(file, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)
            .with_context(|| format!("error writing config to {}", path.display()))?;
        Ok(())
    }

    /// Parse a previously persisted configuration.
    pub fn read_json(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        serde_json::from_str(&text)
            .with_context(|| format!("error parsing config at {}", path.display()))
    }
}

/// A nested object under `key`, created (or reset, if `key` holds a
/// non-object) on first access.
pub fn child_object_mut<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut().unwrap()
}

/// A nested array under `key`, created on first access.
pub fn child_array_mut<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let slot = map
        .entry(key.to_owned())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut().unwrap()
}
