use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{EnumDef, TypeRef};

/// A runtime value held by a constant node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    String(String),
    Byte(u8),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Single(f32),
    Decimal(Decimal),
    DateTime(DateTimeValue),
    Guid(Uuid),
    Enum(EnumValue),
    Type(TypeRef),
    List(Vec<Value>),
    /// An object with named fields; closure environments are records.
    Record(Arc<Record>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub def: Arc<EnumDef>,
    pub value: i64,
}

impl EnumValue {
    /// Member name, or the numeric value when no member matches.
    pub fn name(&self) -> String {
        match self.def.member_name(self.value) {
            Some(n) => n.to_string(),
            None => self.value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    Unspecified,
    Utc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeValue {
    pub value: NaiveDateTime,
    pub kind: DateTimeKind,
}

impl DateTimeValue {
    pub fn utc(value: NaiveDateTime) -> Self {
        Self {
            value,
            kind: DateTimeKind::Utc,
        }
    }

    pub fn unspecified(value: NaiveDateTime) -> Self {
        Self {
            value,
            kind: DateTimeKind::Unspecified,
        }
    }

    /// Parse `yyyy-MM-dd`, `yyyy-MM-ddTHH:mm:ss[.fffffff]` with an optional
    /// trailing `Z` marking UTC.
    pub fn parse(text: &str) -> Option<Self> {
        let (body, kind) = match text.strip_suffix('Z') {
            Some(b) => (b, DateTimeKind::Utc),
            None => (text, DateTimeKind::Unspecified),
        };
        let value = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(body, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        Some(Self { value, kind })
    }

    /// True when the value carries no sub-second component.
    pub fn is_whole_second(&self) -> bool {
        self.value.nanosecond() % 1_000_000_000 == 0
    }
}

/// Named fields of an object value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integral payload of integer and enum values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Enum(e) => Some(e.value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Best-effort static type of a value; used when capturing variables.
    pub fn type_of(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::Object,
            Value::Bool(_) => TypeRef::Bool,
            Value::Char(_) => TypeRef::Char,
            Value::String(_) => TypeRef::String,
            Value::Byte(_) => TypeRef::Byte,
            Value::Int32(_) => TypeRef::Int32,
            Value::Int64(_) => TypeRef::Int64,
            Value::Double(_) => TypeRef::Double,
            Value::Single(_) => TypeRef::Single,
            Value::Decimal(_) => TypeRef::Decimal,
            Value::DateTime(_) => TypeRef::DateTime,
            Value::Guid(_) => TypeRef::Guid,
            Value::Enum(e) => TypeRef::Enum(e.def.clone()),
            Value::Type(_) => TypeRef::Type,
            Value::List(items) => {
                let item = items
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::type_of)
                    .unwrap_or(TypeRef::Object);
                TypeRef::list(item)
            }
            Value::Record(r) => TypeRef::complex(&r.type_name),
        }
    }

    /// Reinterpret an integral value as a member of `def`.
    pub fn to_enum(&self, def: &Arc<EnumDef>) -> Option<Value> {
        self.as_i64().map(|value| {
            Value::Enum(EnumValue {
                def: def.clone(),
                value,
            })
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "'{c}'"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}L"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Single(v) => write!(f, "{v}f"),
            Value::Decimal(v) => write!(f, "{v}m"),
            Value::DateTime(dt) => {
                let z = if dt.kind == DateTimeKind::Utc { "Z" } else { "" };
                write!(f, "datetime'{}{z}'", dt.value.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            Value::Guid(g) => write!(f, "guid'{g}'"),
            Value::Enum(e) => write!(f, "{}.{}", e.def.name, e.name()),
            Value::Type(t) => write!(f, "{t}"),
            Value::List(items) => {
                let items = items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{items}]")
            }
            Value::Record(r) => write!(f, "<{}>", r.type_name),
        }
    }
}
