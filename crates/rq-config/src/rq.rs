use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::logging::LoggingConfig;
use crate::schema::SchemaConfig;
use crate::service::ServiceConfig;
use crate::translator::{TranslatorConfig, TranslatorConfigRaw};
use crate::validate;

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RqConfigRaw {
    service: ServiceConfig,
    #[serde(default)]
    translator: TranslatorConfigRaw,
    #[serde(default)]
    schema: SchemaConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// RqConfig (resolved, validated)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RqConfig {
    pub service: ServiceConfig,
    pub translator: TranslatorConfig,
    pub schema: SchemaConfig,
    pub logging: LoggingConfig,
    /// Directory relative paths resolve against: the config file's parent,
    /// or `.` for configs parsed from a string.
    pub base_dir: PathBuf,
}

impl RqConfig {
    /// Read and parse an `rq.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let mut config: RqConfig = content
            .parse()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Schema files matched by `[schema] files`.
    pub fn schema_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        self.schema.resolve_files(&self.base_dir)
    }

    /// Log file path resolved against the config directory.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|f| {
            if f.is_absolute() {
                f.clone()
            } else {
                self.base_dir.join(f)
            }
        })
    }
}

impl FromStr for RqConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a resolved, validated [`RqConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: RqConfigRaw = toml::from_str(toml_str)?;

        let config = RqConfig {
            service: raw.service,
            translator: raw.translator.resolve()?,
            schema: raw.schema,
            logging: raw.logging,
            base_dir: PathBuf::from("."),
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
