use std::path::Path;

use orion_error::ErrorOweBase;
use orion_error::prelude::*;
use rq_config::RqConfig;
use rq_lang::{ClosureEvaluator, PredicateCompiler, ResourceCatalog, parse_rqs};

use crate::error::{ClientReason, ClientResult};
use crate::query::RestQuery;

/// Entry point for composing queries against one service: configuration
/// plus the resource catalog assembled from the configured schema files.
#[derive(Debug, Clone)]
pub struct QueryClient {
    config: RqConfig,
    catalog: ResourceCatalog,
}

impl QueryClient {
    /// Load `rq.toml` and every schema file it names.
    pub fn open(config_path: impl AsRef<Path>) -> ClientResult<Self> {
        let config = RqConfig::load(config_path.as_ref()).owe(ClientReason::Config)?;
        Self::from_config(config)
    }

    /// Assemble the catalog from the schema files of an already loaded
    /// configuration.
    pub fn from_config(config: RqConfig) -> ClientResult<Self> {
        let files = config.schema_files().owe(ClientReason::Schema)?;
        let mut decls = Vec::new();
        for path in &files {
            let content = std::fs::read_to_string(path)
                .owe(ClientReason::Schema)
                .map_err(|e| e.with_detail(format!("failed to read {}", path.display())))?;
            let file_decls = parse_rqs(&content)
                .owe(ClientReason::Schema)
                .map_err(|e| e.with_detail(format!("in {}", path.display())))?;
            rq_debug!(conf, file = %path.display(), decls = file_decls.len(), "schema parsed");
            decls.extend(file_decls);
        }
        let catalog = ResourceCatalog::from_decls(decls).owe(ClientReason::Schema)?;
        rq_info!(
            conf,
            files = files.len(),
            resources = catalog.resource_names().count(),
            "catalog loaded"
        );
        Ok(Self::with_catalog(config, catalog))
    }

    /// Client over an existing catalog. The configured member naming is
    /// applied to it.
    pub fn with_catalog(config: RqConfig, catalog: ResourceCatalog) -> Self {
        let catalog = catalog.with_naming(config.translator.member_naming);
        Self { config, catalog }
    }

    pub fn config(&self) -> &RqConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Compiler honouring the `[translator]` settings.
    pub fn compiler(&self) -> PredicateCompiler<'_> {
        let evaluator =
            ClosureEvaluator::new().with_constant_folding(self.config.translator.fold_constants);
        PredicateCompiler::new(&self.catalog).with_evaluator(evaluator)
    }

    /// Start a query over `resource`, which must be a declared resource
    /// with a URI.
    pub fn query(&self, resource: &str) -> ClientResult<RestQuery<'_>> {
        if self.catalog.resource(resource).is_none() {
            return Err(StructError::from(ClientReason::Schema)
                .with_detail(format!("unknown resource type `{resource}`")));
        }
        let Some(path) = self.catalog.uri(resource) else {
            return Err(StructError::from(ClientReason::Schema)
                .with_detail(format!("resource `{resource}` declares no uri")));
        };
        Ok(RestQuery::new(self, resource, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
enum Status { Active = 1, Retired = 2 }
resource Critter {
    uri = "critters"
    fields {
        Name: string
        Status: Status
    }
}
resource Dog { base = Critter  fields { Bark: string } }
resource Orphan { fields { Name: string } }
"#;

    fn client() -> QueryClient {
        let config: RqConfig = "[service]\nbase_uri = \"https://api.example.com\"\n"
            .parse()
            .unwrap();
        QueryClient::with_catalog(config, ResourceCatalog::parse(SCHEMA).unwrap())
    }

    #[test]
    fn query_requires_declared_resource() {
        let c = client();
        assert!(c.query("Critter").is_ok());
        // uri inherited from the base
        assert!(c.query("Dog").is_ok());
        let err = c.query("Nope").unwrap_err();
        assert_eq!(err.reason(), &ClientReason::Schema);
        let err = c.query("Orphan").unwrap_err();
        assert_eq!(err.reason(), &ClientReason::Schema);
    }

    #[test]
    fn configured_naming_applies_to_catalog() {
        let config: RqConfig =
            "[service]\nbase_uri = \"https://x\"\n[translator]\nmember_naming = \"declared\"\n"
                .parse()
                .unwrap();
        let c = QueryClient::with_catalog(config, ResourceCatalog::parse(SCHEMA).unwrap());
        assert_eq!(
            c.compiler()
                .compile(r#"x => x.Name == "a""#, "Critter")
                .unwrap(),
            "Name eq 'a'"
        );
    }

    #[test]
    fn open_loads_schema_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("critters.rqs"), SCHEMA).unwrap();
        std::fs::write(
            dir.path().join("rq.toml"),
            "[service]\nbase_uri = \"https://x\"\n[schema]\nfiles = \"*.rqs\"\n",
        )
        .unwrap();
        let c = QueryClient::open(dir.path().join("rq.toml")).unwrap();
        assert!(c.catalog().resource("Dog").is_some());
    }

    #[test]
    fn broken_schema_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.rqs"), "resource {").unwrap();
        std::fs::write(dir.path().join("rq.toml"), "[service]\nbase_uri = \"https://x\"\n")
            .unwrap();
        let err = QueryClient::open(dir.path().join("rq.toml")).unwrap_err();
        assert_eq!(err.reason(), &ClientReason::Schema);
    }

    #[test]
    fn bad_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rq.toml"), "[service]\nbase_uri = \"ftp://x\"\n").unwrap();
        let err = QueryClient::open(dir.path().join("rq.toml")).unwrap_err();
        assert_eq!(err.reason(), &ClientReason::Config);
    }
}
