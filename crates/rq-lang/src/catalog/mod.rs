use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use winnow::prelude::*;

mod parser;
mod schema;
mod validate;

pub use schema::{Decl, EnumDecl, FieldDecl, TypeCategory, TypeDecl, TypeExpr};

pub(crate) use parser::type_expr;

use crate::names::{NameResolver, to_camel_case};
use crate::types::{EnumDef, TypeRef};


// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse a `.rqs` schema file containing resource, value, anonymous and
/// enum declarations.
///
/// Per-file validation runs here: unique names, unique fields and members,
/// valid enum underlying types. Cross-file checks (type references, base
/// chains) run when the declarations are assembled into a
/// [`ResourceCatalog`].
pub fn parse_rqs(input: &str) -> anyhow::Result<Vec<Decl>> {
    let decls = parser::rqs_file
        .parse(input)
        .map_err(|e| anyhow::anyhow!("parse error: {e}"))?;
    validate::validate_file(&decls)?;
    Ok(decls)
}

// ---------------------------------------------------------------------------
// Member naming policy
// ---------------------------------------------------------------------------

/// How member names are exposed when a field has no explicit `as` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberNaming {
    /// First character lower-cased.
    #[default]
    CamelCase,
    /// Name as declared.
    Declared,
}

impl FromStr for MemberNaming {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel_case" => Ok(MemberNaming::CamelCase),
            "declared" => Ok(MemberNaming::Declared),
            other => anyhow::bail!(
                "unknown member naming '{other}', expected camel_case or declared"
            ),
        }
    }
}

impl fmt::Display for MemberNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberNaming::CamelCase => "camel_case",
            MemberNaming::Declared => "declared",
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Validated set of declared types; the name-resolution collaborator of the
/// translator.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    types: BTreeMap<String, TypeDecl>,
    enums: BTreeMap<String, Arc<EnumDef>>,
    naming: MemberNaming,
}

impl ResourceCatalog {
    /// Assemble declarations from one or more files.
    pub fn from_decls(decls: Vec<Decl>) -> anyhow::Result<Self> {
        validate::validate_catalog(&decls)?;
        let mut catalog = ResourceCatalog::default();
        for d in decls {
            match d {
                Decl::Type(t) => {
                    catalog.types.insert(t.name.clone(), t);
                }
                Decl::Enum(e) => {
                    let def = EnumDef::new(e.name.clone(), e.underlying, e.members);
                    catalog.enums.insert(e.name, Arc::new(def));
                }
            }
        }
        Ok(catalog)
    }

    /// Parse and assemble a single schema source.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        Self::from_decls(parse_rqs(input)?)
    }

    pub fn with_naming(mut self, naming: MemberNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn naming(&self) -> MemberNaming {
        self.naming
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// A declared type with the `resource` category.
    pub fn resource(&self, name: &str) -> Option<&TypeDecl> {
        self.types
            .get(name)
            .filter(|t| t.category == TypeCategory::Resource)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.types
            .values()
            .filter(|t| t.category == TypeCategory::Resource)
            .map(|t| t.name.as_str())
    }

    pub fn enum_def(&self, name: &str) -> Option<&Arc<EnumDef>> {
        self.enums.get(name)
    }

    /// Static type of a declared type or enum name.
    pub fn type_ref(&self, name: &str) -> Option<TypeRef> {
        if let Some(def) = self.enums.get(name) {
            return Some(TypeRef::Enum(def.clone()));
        }
        self.types.get(name).map(|t| TypeRef::complex(&t.name))
    }

    /// Resolve a schema type expression. `?` on reference types is dropped.
    pub fn resolve(&self, ty: &TypeExpr) -> Option<TypeRef> {
        Some(match ty {
            TypeExpr::Scalar(t) => t.clone(),
            TypeExpr::Named(n) => self.type_ref(n)?,
            TypeExpr::Nullable(inner) => {
                let inner = self.resolve(inner)?;
                if inner.is_reference() {
                    inner
                } else {
                    TypeRef::nullable(inner)
                }
            }
            TypeExpr::Sequence(kind, item) => {
                TypeRef::Sequence(*kind, Box::new(self.resolve(item)?))
            }
            TypeExpr::Map(k, v) => {
                TypeRef::Map(Box::new(self.resolve(k)?), Box::new(self.resolve(v)?))
            }
        })
    }

    /// Field `name` of `owner` or of one of its bases, with the type that
    /// declares it.
    pub fn field(&self, owner: &str, name: &str) -> Option<(&TypeDecl, &FieldDecl)> {
        let mut current = self.types.get(owner);
        // Validation guarantees acyclic chains; the bound guards hand-built
        // catalogs.
        for _ in 0..=self.types.len() {
            let t = current?;
            if let Some(f) = t.fields.iter().find(|f| f.name == name) {
                return Some((t, f));
            }
            current = t.base.as_deref().and_then(|b| self.types.get(b));
        }
        None
    }

    /// Like [`field`](Self::field), falling back to a case-insensitive match
    /// when exactly one field qualifies, so `x.age` finds `Age`.
    pub fn find_field(&self, owner: &str, name: &str) -> Option<(&TypeDecl, &FieldDecl)> {
        if let Some(found) = self.field(owner, name) {
            return Some(found);
        }
        let mut matches = Vec::new();
        let mut current = self.types.get(owner);
        for _ in 0..=self.types.len() {
            let Some(t) = current else { break };
            matches.extend(
                t.fields
                    .iter()
                    .filter(|f| f.name.eq_ignore_ascii_case(name))
                    .map(|f| (t, f)),
            );
            current = t.base.as_deref().and_then(|b| self.types.get(b));
        }
        match matches.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Resolved static type of field `name` on `owner`.
    pub fn field_type(&self, owner: &str, name: &str) -> Option<TypeRef> {
        let (_, f) = self.field(owner, name)?;
        self.resolve(&f.ty)
    }

    /// True when `derived` is `base` or inherits from it.
    pub fn is_subtype(&self, derived: &str, base: &str) -> bool {
        let mut current = Some(derived);
        for _ in 0..=self.types.len() {
            let Some(name) = current else { return false };
            if name == base {
                return true;
            }
            current = self.types.get(name).and_then(|t| t.base.as_deref());
        }
        false
    }

    /// URI path of a resource, inherited from the nearest base that has one.
    pub fn uri(&self, resource: &str) -> Option<&str> {
        let mut current = self.types.get(resource);
        for _ in 0..=self.types.len() {
            let t = current?;
            if let Some(uri) = &t.uri {
                return Some(uri);
            }
            current = t.base.as_deref().and_then(|b| self.types.get(b));
        }
        None
    }

    /// External type name: the `json` override or the declared name.
    pub fn json_name(&self, name: &str) -> Option<&str> {
        if let Some(def) = self.enums.get(name) {
            return Some(&def.name);
        }
        let t = self.types.get(name)?;
        Some(t.json.as_deref().unwrap_or(&t.name))
    }
}

impl NameResolver for ResourceCatalog {
    fn member_name(&self, owner: &str, member: &str) -> String {
        if let Some(external) = self
            .field(owner, member)
            .and_then(|(_, f)| f.external.as_ref())
        {
            return external.clone();
        }
        match self.naming {
            MemberNaming::CamelCase => to_camel_case(member),
            MemberNaming::Declared => member.to_string(),
        }
    }

    fn type_name(&self, ty: &TypeRef) -> Option<String> {
        match ty {
            TypeRef::Complex(name) => self.json_name(name).map(str::to_string),
            TypeRef::Enum(def) => self.json_name(&def.name).map(str::to_string),
            _ => None,
        }
    }
}
