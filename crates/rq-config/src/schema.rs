use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Glob of `.rqs` schema files, relative to the config file.
    pub files: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            files: "*.rqs".to_string(),
        }
    }
}

impl SchemaConfig {
    /// Expand the glob against `base_dir`. Matches are sorted so catalogs
    /// assemble in a stable order.
    pub fn resolve_files(&self, base_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let pattern = if Path::new(&self.files).is_absolute() {
            PathBuf::from(&self.files)
        } else {
            base_dir.join(&self.files)
        };
        let pattern_str = pattern.to_string_lossy();

        let mut entries: Vec<_> = glob::glob(&pattern_str)
            .map_err(|e| anyhow::anyhow!("schema.files {:?}: {e}", self.files))?
            .filter_map(|e| e.ok())
            .collect();
        entries.sort();

        if entries.is_empty() {
            anyhow::bail!("schema.files {:?} matched no files", pattern_str);
        }
        Ok(entries)
    }
}
