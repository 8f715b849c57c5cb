use rnaseq_types::SetupError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Loads the JSON templates bundled with the pipeline and joins them into
/// one mapping. Template files are read-only; the loader never writes.
pub struct TemplateLoader {
    base_dir: PathBuf,
}

impl TemplateLoader {
    /// `base_dir` anchors relative template paths; absolute paths pass
    /// through unchanged.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        TemplateLoader {
            base_dir: base_dir.into(),
        }
    }

    /// Parse a single template document.
    pub fn load(&self, template: &Path) -> Result<Map<String, Value>, SetupError> {
        let path = self.base_dir.join(template);
        let text = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SetupError::ResourceNotFound { path: path.clone() },
            _ => SetupError::Io {
                path: path.clone(),
                source,
            },
        })?;
        serde_json::from_str(&text).map_err(|source| SetupError::MalformedTemplate { path, source })
    }

    /// Join templates in sequence. A top-level key in a later template
    /// fully replaces the earlier value; there is no deep merge.
    pub fn join<P: AsRef<Path>>(&self, templates: &[P]) -> Result<Map<String, Value>, SetupError> {
        let mut aggregated = Map::new();
        for template in templates {
            for (key, value) in self.load(template.as_ref())? {
                aggregated.insert(key, value);
            }
        }
        Ok(aggregated)
    }
}
