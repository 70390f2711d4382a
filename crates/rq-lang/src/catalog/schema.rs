use std::fmt;

use crate::types::{SequenceKind, TypeRef};

/// Kind of a declared composite type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// Addressable through a URI.
    Resource,
    /// Embedded value object.
    Value,
    /// Anonymous composite (projection result).
    Anonymous,
}

/// A field type as written in a schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar(TypeRef),
    /// Reference to a declared type or enum.
    Named(String),
    Nullable(Box<TypeExpr>),
    Sequence(SequenceKind, Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
}

/// A single field definition within a type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    /// Explicit wire name (`as "..."`).
    pub external: Option<String>,
}

/// A parsed `resource`, `value` or `anonymous` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub category: TypeCategory,
    /// Path segment under the service root. Resources only.
    pub uri: Option<String>,
    /// External type name override.
    pub json: Option<String>,
    pub base: Option<String>,
    pub fields: Vec<FieldDecl>,
}

/// A parsed `enum` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub underlying: TypeRef,
    pub members: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeDecl),
    Enum(EnumDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Type(t) => &t.name,
            Decl::Enum(e) => &e.name,
        }
    }
}

impl TypeExpr {
    /// Names of declared types this expression refers to.
    pub fn referenced_names(&self) -> Vec<&str> {
        match self {
            TypeExpr::Scalar(_) => vec![],
            TypeExpr::Named(n) => vec![n.as_str()],
            TypeExpr::Nullable(inner) | TypeExpr::Sequence(_, inner) => inner.referenced_names(),
            TypeExpr::Map(k, v) => {
                let mut names = k.referenced_names();
                names.extend(v.referenced_names());
                names
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(t) => write!(f, "{t}"),
            TypeExpr::Named(n) => f.write_str(n),
            TypeExpr::Nullable(inner) => write!(f, "{inner}?"),
            TypeExpr::Sequence(kind, item) => {
                let name = match kind {
                    SequenceKind::Array => "array",
                    SequenceKind::List => "list",
                    SequenceKind::Enumerable => "seq",
                    SequenceKind::Queryable => "query",
                };
                write!(f, "{name}<{item}>")
            }
            TypeExpr::Map(k, v) => write!(f, "map<{k},{v}>"),
        }
    }
}
