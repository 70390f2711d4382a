use std::path::PathBuf;

use anyhow::{Context, Result};

use rq_lang::{MemberNaming, PredicateCompiler, ResourceCatalog, parse_rqs};

pub fn run(
    schemas: Vec<PathBuf>,
    resource: String,
    naming: String,
    selector: bool,
    lambda: String,
) -> Result<()> {
    let naming: MemberNaming = naming.parse()?;

    let mut decls = Vec::new();
    for path in &schemas {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        decls.extend(parse_rqs(&content).with_context(|| format!("in {}", path.display()))?);
    }
    let catalog = ResourceCatalog::from_decls(decls)?.with_naming(naming);

    let compiler = PredicateCompiler::new(&catalog);
    let text = if selector {
        compiler.compile_selector(&lambda, &resource)?
    } else {
        compiler.compile(&lambda, &resource)?
    };
    println!("{text}");
    Ok(())
}
