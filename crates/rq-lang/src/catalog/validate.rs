use std::collections::{HashMap, HashSet};

use super::schema::{Decl, TypeCategory};
use crate::types::TypeRef;

/// Checks that only need one file: unique declaration, field and enum
/// member names, enum underlying types, uri placement.
pub(super) fn validate_file(decls: &[Decl]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for d in decls {
        if !seen.insert(d.name()) {
            anyhow::bail!("duplicate type name: '{}'", d.name());
        }
    }

    for d in decls {
        match d {
            Decl::Type(t) => {
                let mut fields = HashSet::new();
                for f in &t.fields {
                    if !fields.insert(f.name.as_str()) {
                        anyhow::bail!("type '{}': duplicate field '{}'", t.name, f.name);
                    }
                }
                if t.uri.is_some() && t.category != TypeCategory::Resource {
                    anyhow::bail!("type '{}': only resources may declare a uri", t.name);
                }
            }
            Decl::Enum(e) => {
                if !matches!(e.underlying, TypeRef::Byte | TypeRef::Int32 | TypeRef::Int64) {
                    anyhow::bail!(
                        "enum '{}': underlying type must be byte, int32 or int64, got {}",
                        e.name,
                        e.underlying
                    );
                }
                let mut members = HashSet::new();
                for (m, v) in &e.members {
                    if !members.insert(m.as_str()) {
                        anyhow::bail!("enum '{}': duplicate member '{}'", e.name, m);
                    }
                    if e.underlying == TypeRef::Byte && !(0..=255).contains(v) {
                        anyhow::bail!("enum '{}': member '{}' = {} does not fit in a byte", e.name, m, v);
                    }
                    if e.underlying == TypeRef::Int32 && i32::try_from(*v).is_err() {
                        anyhow::bail!("enum '{}': member '{}' = {} does not fit in int32", e.name, m, v);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Checks across every loaded file: names are unique, every referenced type
/// is declared, bases are composite types and base chains are acyclic.
pub(super) fn validate_catalog(decls: &[Decl]) -> anyhow::Result<()> {
    validate_file(decls)?;

    let by_name: HashMap<&str, &Decl> = decls.iter().map(|d| (d.name(), d)).collect();

    for d in decls {
        let Decl::Type(t) = d else { continue };
        for f in &t.fields {
            for name in f.ty.referenced_names() {
                if !by_name.contains_key(name) {
                    anyhow::bail!(
                        "type '{}': field '{}' refers to unknown type '{}'",
                        t.name,
                        f.name,
                        name
                    );
                }
            }
        }
        if let Some(base) = &t.base {
            match by_name.get(base.as_str()) {
                Some(Decl::Type(_)) => {}
                Some(Decl::Enum(_)) => {
                    anyhow::bail!("type '{}': base '{}' is an enum", t.name, base)
                }
                None => anyhow::bail!("type '{}': unknown base type '{}'", t.name, base),
            }
        }
    }

    // Base chains must terminate
    for d in decls {
        let Decl::Type(start) = d else { continue };
        let mut visited = HashSet::new();
        visited.insert(start.name.as_str());
        let mut current = start.base.as_deref();
        while let Some(name) = current {
            if !visited.insert(name) {
                anyhow::bail!("type '{}': cyclic base chain through '{}'", start.name, name);
            }
            current = match by_name.get(name) {
                Some(Decl::Type(t)) => t.base.as_deref(),
                _ => None,
            };
        }
    }

    Ok(())
}
