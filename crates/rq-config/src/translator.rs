use serde::Deserialize;

use rq_lang::MemberNaming;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct TranslatorConfigRaw {
    member_naming: String,
    fold_constants: bool,
}

impl Default for TranslatorConfigRaw {
    fn default() -> Self {
        Self {
            member_naming: MemberNaming::default().to_string(),
            fold_constants: true,
        }
    }
}

impl TranslatorConfigRaw {
    pub(crate) fn resolve(self) -> anyhow::Result<TranslatorConfig> {
        let member_naming = self
            .member_naming
            .parse()
            .map_err(|e| anyhow::anyhow!("translator.member_naming: {e}"))?;
        Ok(TranslatorConfig {
            member_naming,
            fold_constants: self.fold_constants,
        })
    }
}

/// How predicates are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Naming of members without an explicit external name.
    pub member_naming: MemberNaming,
    /// Fold constant sub-expressions before translation. Captured variables
    /// are substituted either way.
    pub fold_constants: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            member_naming: MemberNaming::default(),
            fold_constants: true,
        }
    }
}
