use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// `[logging]`: every key is optional.
///
/// ```toml
/// [logging]
/// level = "warn"
/// format = "json"
/// file = "logs/rq.log"
///
/// [logging.modules]
/// "rq_lang::fold" = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Level overrides keyed by module path.
    pub modules: BTreeMap<String, String>,
    /// Relative to the directory holding `rq.toml`.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: BTreeMap::new(),
            file: None,
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directives: the global level, then each module override
    /// in module-path order.
    pub fn directives(&self) -> String {
        self.modules
            .iter()
            .fold(self.level.clone(), |mut acc, (module, level)| {
                acc.push_str(&format!(",{module}={level}"));
                acc
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `<time> <LEVEL> [domain] message key=value ...`
    #[default]
    Plain,
    Json,
}
