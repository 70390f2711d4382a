use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Static types carried by expression nodes
// ---------------------------------------------------------------------------

/// Static type of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Bool,
    Char,
    String,
    Byte,
    Int32,
    Int64,
    Double,
    Single,
    Decimal,
    DateTime,
    Guid,
    /// The universal reference type; target of boxing conversions.
    Object,
    /// A reflected type passed around as a value.
    Type,
    Enum(Arc<EnumDef>),
    Nullable(Box<TypeRef>),
    Sequence(SequenceKind, Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Resource, value object, anonymous composite or closure environment,
    /// identified by its declared name.
    Complex(Arc<str>),
    /// Delegate type of a lambda: parameter types and result type.
    Function(Vec<TypeRef>, Box<TypeRef>),
    /// A lambda kept as data (argument of a queryable method).
    Quoted(Box<TypeRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Array,
    List,
    Enumerable,
    Queryable,
}

/// An enumeration with named integral members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumDef {
    pub name: String,
    /// One of `Byte`, `Int32`, `Int64`.
    pub underlying: TypeRef,
    pub members: Vec<(String, i64)>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>, underlying: TypeRef, members: Vec<(String, i64)>) -> Self {
        Self {
            name: name.into(),
            underlying,
            members,
        }
    }

    pub fn member_name(&self, value: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    pub fn member_value(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

impl TypeRef {
    pub fn complex(name: &str) -> Self {
        TypeRef::Complex(Arc::from(name))
    }

    pub fn nullable(inner: TypeRef) -> Self {
        match inner {
            TypeRef::Nullable(_) => inner,
            other => TypeRef::Nullable(Box::new(other)),
        }
    }

    pub fn list(item: TypeRef) -> Self {
        TypeRef::Sequence(SequenceKind::List, Box::new(item))
    }

    pub fn array(item: TypeRef) -> Self {
        TypeRef::Sequence(SequenceKind::Array, Box::new(item))
    }

    pub fn enumerable(item: TypeRef) -> Self {
        TypeRef::Sequence(SequenceKind::Enumerable, Box::new(item))
    }

    pub fn queryable(item: TypeRef) -> Self {
        TypeRef::Sequence(SequenceKind::Queryable, Box::new(item))
    }

    pub fn function(params: Vec<TypeRef>, ret: TypeRef) -> Self {
        TypeRef::Function(params, Box::new(ret))
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumDef>> {
        match self {
            TypeRef::Enum(def) => Some(def),
            _ => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeRef::Enum(_))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    /// `T` for `Nullable<T>`, `None` otherwise.
    pub fn nullable_inner(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// Strips one level of `Nullable`.
    pub fn non_nullable(&self) -> &TypeRef {
        self.nullable_inner().unwrap_or(self)
    }

    /// Element type when values of this type are iterable. Strings are not.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Sequence(_, item) => Some(item),
            _ => None,
        }
    }

    pub fn sequence_kind(&self) -> Option<SequenceKind> {
        match self {
            TypeRef::Sequence(kind, _) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeRef::Byte
                | TypeRef::Int32
                | TypeRef::Int64
                | TypeRef::Double
                | TypeRef::Single
                | TypeRef::Decimal
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, TypeRef::Byte | TypeRef::Int32 | TypeRef::Int64)
    }

    /// Types that can hold `null` without a `Nullable` wrapper.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            TypeRef::String
                | TypeRef::Object
                | TypeRef::Type
                | TypeRef::Sequence(..)
                | TypeRef::Map(..)
                | TypeRef::Complex(_)
        )
    }

    /// Fixed wire name of the natively understood scalar types.
    pub fn native_name(&self) -> Option<&'static str> {
        Some(match self {
            TypeRef::Bool => "Boolean",
            TypeRef::Char => "Char",
            TypeRef::String => "String",
            TypeRef::Byte => "Byte",
            TypeRef::Int32 => "Int32",
            TypeRef::Int64 => "Int64",
            TypeRef::Double => "Double",
            TypeRef::Single => "Single",
            TypeRef::Decimal => "Decimal",
            TypeRef::DateTime => "DateTime",
            TypeRef::Guid => "Guid",
            _ => return None,
        })
    }

    /// Owner key used in member and method signatures.
    pub fn signature_owner(&self) -> String {
        match self {
            TypeRef::String => "string".into(),
            TypeRef::DateTime => "datetime".into(),
            TypeRef::Nullable(_) => "nullable".into(),
            TypeRef::Sequence(SequenceKind::List, _) => "list".into(),
            TypeRef::Sequence(SequenceKind::Array, _) => "array".into(),
            TypeRef::Sequence(SequenceKind::Enumerable, _) => "enumerable".into(),
            TypeRef::Sequence(SequenceKind::Queryable, _) => "queryable".into(),
            TypeRef::Map(..) => "map".into(),
            TypeRef::Complex(name) => name.to_string(),
            TypeRef::Enum(def) => def.name.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Char => f.write_str("char"),
            TypeRef::String => f.write_str("string"),
            TypeRef::Byte => f.write_str("byte"),
            TypeRef::Int32 => f.write_str("int32"),
            TypeRef::Int64 => f.write_str("int64"),
            TypeRef::Double => f.write_str("double"),
            TypeRef::Single => f.write_str("single"),
            TypeRef::Decimal => f.write_str("decimal"),
            TypeRef::DateTime => f.write_str("datetime"),
            TypeRef::Guid => f.write_str("guid"),
            TypeRef::Object => f.write_str("object"),
            TypeRef::Type => f.write_str("type"),
            TypeRef::Enum(def) => f.write_str(&def.name),
            TypeRef::Nullable(inner) => write!(f, "{inner}?"),
            TypeRef::Sequence(kind, item) => {
                let name = match kind {
                    SequenceKind::Array => "array",
                    SequenceKind::List => "list",
                    SequenceKind::Enumerable => "seq",
                    SequenceKind::Queryable => "query",
                };
                write!(f, "{name}<{item}>")
            }
            TypeRef::Map(k, v) => write!(f, "map<{k},{v}>"),
            TypeRef::Complex(name) => f.write_str(name),
            TypeRef::Function(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "fn({params}) -> {ret}")
            }
            TypeRef::Quoted(inner) => write!(f, "quote<{inner}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> Arc<EnumDef> {
        Arc::new(EnumDef::new(
            "Status",
            TypeRef::Int32,
            vec![("Active".into(), 1), ("Retired".into(), 2)],
        ))
    }

    #[test]
    fn enum_member_lookup() {
        let def = status();
        assert_eq!(def.member_name(2), Some("Retired"));
        assert_eq!(def.member_name(7), None);
        assert_eq!(def.member_value("Active"), Some(1));
    }

    #[test]
    fn nullable_does_not_nest() {
        let t = TypeRef::nullable(TypeRef::nullable(TypeRef::Int32));
        assert_eq!(t, TypeRef::Nullable(Box::new(TypeRef::Int32)));
        assert_eq!(t.non_nullable(), &TypeRef::Int32);
    }

    #[test]
    fn strings_are_not_sequences() {
        assert!(TypeRef::String.element_type().is_none());
        assert_eq!(
            TypeRef::list(TypeRef::String).element_type(),
            Some(&TypeRef::String)
        );
    }

    #[test]
    fn display_composite_types() {
        let t = TypeRef::Map(Box::new(TypeRef::String), Box::new(TypeRef::list(TypeRef::Int32)));
        assert_eq!(t.to_string(), "map<string,list<int32>>");
        assert_eq!(TypeRef::Enum(status()).to_string(), "Status");
        assert_eq!(TypeRef::nullable(TypeRef::Double).to_string(), "double?");
    }

    #[test]
    fn native_names() {
        assert_eq!(TypeRef::Bool.native_name(), Some("Boolean"));
        assert_eq!(TypeRef::Single.native_name(), Some("Single"));
        assert_eq!(TypeRef::complex("Critter").native_name(), None);
        assert_eq!(TypeRef::Object.native_name(), None);
    }
}
