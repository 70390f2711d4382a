use std::borrow::Cow;
use std::fmt;

// ---------------------------------------------------------------------------
// Structural member identity
// ---------------------------------------------------------------------------

/// Identity of a property or method: declaring owner, name and parameter
/// shape. Overloads differ in shape, so lookups never collide by name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub owner: Cow<'static, str>,
    pub name: Cow<'static, str>,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Property,
    Method {
        params: Vec<ParamShape>,
        is_static: bool,
    },
}

/// Parameter kinds as they appear in signatures. Generic element and key
/// types collapse to `Item` / `Key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamShape {
    Bool,
    Char,
    String,
    Int32,
    Int64,
    Double,
    Decimal,
    DateTime,
    Object,
    Item,
    Key,
    Sequence,
    Queryable,
    Map,
    /// `fn(T) -> bool`
    Predicate,
    /// `fn(T) -> R`
    Selector,
    Quoted(Box<ParamShape>),
}

impl Signature {
    pub fn property(owner: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            shape: Shape::Property,
        }
    }

    pub fn method(
        owner: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        params: Vec<ParamShape>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            shape: Shape::Method {
                params,
                is_static: false,
            },
        }
    }

    pub fn static_method(
        owner: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        params: Vec<ParamShape>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            shape: Shape::Method {
                params,
                is_static: true,
            },
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self.shape, Shape::Property)
    }

    pub fn is_static(&self) -> bool {
        matches!(self.shape, Shape::Method { is_static: true, .. })
    }

    pub fn params(&self) -> &[ParamShape] {
        match &self.shape {
            Shape::Property => &[],
            Shape::Method { params, .. } => params,
        }
    }

    /// `owner.name`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    /// The enumerable counterpart of a static queryable method: owner
    /// `enumerable`, queryable sources become sequences and quoted lambdas
    /// become plain ones.
    pub fn enumerable_counterpart(&self) -> Option<Signature> {
        match &self.shape {
            Shape::Method {
                params,
                is_static: true,
            } if self.owner == "queryable" => Some(Signature::static_method(
                "enumerable",
                self.name.clone(),
                params.iter().map(ParamShape::unquoted_enumerable).collect(),
            )),
            _ => None,
        }
    }
}

impl ParamShape {
    fn unquoted_enumerable(&self) -> ParamShape {
        match self {
            ParamShape::Queryable => ParamShape::Sequence,
            ParamShape::Quoted(inner) => inner.unquoted_enumerable(),
            other => other.clone(),
        }
    }
}

impl fmt::Display for ParamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamShape::Bool => "bool",
            ParamShape::Char => "char",
            ParamShape::String => "string",
            ParamShape::Int32 => "int32",
            ParamShape::Int64 => "int64",
            ParamShape::Double => "double",
            ParamShape::Decimal => "decimal",
            ParamShape::DateTime => "datetime",
            ParamShape::Object => "object",
            ParamShape::Item => "T",
            ParamShape::Key => "K",
            ParamShape::Sequence => "seq<T>",
            ParamShape::Queryable => "query<T>",
            ParamShape::Map => "map<K,V>",
            ParamShape::Predicate => "fn(T) -> bool",
            ParamShape::Selector => "fn(T) -> R",
            ParamShape::Quoted(inner) => return write!(f, "quote<{inner}>"),
        };
        f.write_str(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shape {
            Shape::Property => write!(f, "{}.{}", self.owner, self.name),
            Shape::Method { params, is_static } => {
                let params = params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let prefix = if *is_static { "static " } else { "" };
                write!(f, "{prefix}{}.{}({params})", self.owner, self.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queryable_maps_to_enumerable() {
        let q = Signature::static_method(
            "queryable",
            "any",
            vec![
                ParamShape::Queryable,
                ParamShape::Quoted(Box::new(ParamShape::Predicate)),
            ],
        );
        let e = q.enumerable_counterpart().unwrap();
        assert_eq!(
            e,
            Signature::static_method(
                "enumerable",
                "any",
                vec![ParamShape::Sequence, ParamShape::Predicate]
            )
        );
    }

    #[test]
    fn instance_methods_have_no_counterpart() {
        let m = Signature::method("queryable", "any", vec![]);
        assert!(m.enumerable_counterpart().is_none());
        assert!(Signature::property("string", "length")
            .enumerable_counterpart()
            .is_none());
    }

    #[test]
    fn overloads_are_distinct() {
        let one = Signature::method("string", "substring", vec![ParamShape::Int32]);
        let two = Signature::method(
            "string",
            "substring",
            vec![ParamShape::Int32, ParamShape::Int32],
        );
        assert_ne!(one, two);
        assert_eq!(two.to_string(), "string.substring(int32, int32)");
    }
}
