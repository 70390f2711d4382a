use chrono::Timelike;

use crate::error::TranslateError;
use crate::names::{NameResolver, encode_string, type_literal};
use crate::types::TypeRef;
use crate::value::{DateTimeKind, DateTimeValue, Value};

/// Literal text of a constant of static type `ty`.
pub fn encode_constant(
    value: &Value,
    ty: &TypeRef,
    names: &dyn NameResolver,
) -> Result<String, TranslateError> {
    if let Some(def) = ty.non_nullable().as_enum()
        && !matches!(value, Value::Null | Value::Enum(_))
        && let Some(as_enum) = value.to_enum(def)
    {
        return encode_constant(&as_enum, ty, names);
    }

    match value {
        Value::Null => Ok("null".to_string()),
        Value::List(items) => {
            let item_ty = ty.element_type();
            let parts = items
                .iter()
                .map(|item| {
                    let item_ty = item_ty.cloned().unwrap_or_else(|| item.type_of());
                    encode_constant(item, &item_ty, names)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", parts.join(",")))
        }
        Value::Enum(e) => Ok(encode_string(&e.name(), "")),
        Value::Char(c) => Ok(encode_string(&c.to_string(), "")),
        Value::String(s) => Ok(encode_string(s, "")),
        Value::Int32(v) => Ok(v.to_string()),
        Value::DateTime(dt) => Ok(encode_string(&datetime_text(dt)?, "datetime")),
        Value::Double(v) => {
            if !v.is_finite() {
                return Err(TranslateError::malformed(TypeRef::Double, format!("{v} has no literal form")));
            }
            if v.fract() == 0.0 {
                Ok(format!("{v:.1}"))
            } else {
                Ok(format!("{v}"))
            }
        }
        Value::Single(v) => {
            if !v.is_finite() {
                return Err(TranslateError::malformed(TypeRef::Single, format!("{v} has no literal form")));
            }
            Ok(format!("{v}f"))
        }
        Value::Decimal(d) => Ok(format!("{d}m")),
        Value::Guid(g) => Ok(encode_string(&g.hyphenated().to_string(), "guid")),
        Value::Type(t) => type_literal(t, names),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Int64(_) | Value::Byte(_) | Value::Record(_) => Err(TranslateError::malformed(
            value.type_of(),
            "don't know how to send constants of this type",
        )),
    }
}

/// `yyyy-MM-ddTHH:mm:ss` for whole seconds, otherwise seven fractional
/// digits (100ns ticks); UTC values end in `Z`. Finer precision has no
/// wire form.
fn datetime_text(dt: &DateTimeValue) -> Result<String, TranslateError> {
    let nanos = dt.value.nanosecond() % 1_000_000_000;
    if nanos % 100 != 0 {
        return Err(TranslateError::malformed(
            TypeRef::DateTime,
            format!("{nanos}ns is finer than the 100ns tick"),
        ));
    }
    let mut text = dt.value.format("%Y-%m-%dT%H:%M:%S").to_string();
    if !dt.is_whole_second() {
        text.push_str(&format!(".{:07}", nanos / 100));
    }
    if dt.kind == DateTimeKind::Utc {
        text.push('Z');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::names::DefaultNames;
    use crate::types::EnumDef;
    use crate::value::Record;

    fn enc(v: Value) -> String {
        let ty = v.type_of();
        encode_constant(&v, &ty, &DefaultNames).unwrap()
    }

    fn status() -> Arc<EnumDef> {
        Arc::new(EnumDef::new(
            "Status",
            TypeRef::Int32,
            vec![("Active".into(), 1), ("Retired".into(), 2)],
        ))
    }

    #[test]
    fn scalars() {
        assert_eq!(enc(Value::Null), "null");
        assert_eq!(enc(Value::Bool(true)), "true");
        assert_eq!(enc(Value::Int32(-42)), "-42");
        assert_eq!(enc(Value::Char('\'')), "''''");
        assert_eq!(enc(Value::String("it's".into())), "'it''s'");
    }

    #[test]
    fn floating_point() {
        assert_eq!(enc(Value::Double(3.0)), "3.0");
        assert_eq!(enc(Value::Double(-0.5)), "-0.5");
        assert_eq!(enc(Value::Double(0.1)), "0.1");
        assert_eq!(enc(Value::Single(1.5)), "1.5f");
        let err = encode_constant(&Value::Double(f64::NAN), &TypeRef::Double, &DefaultNames)
            .unwrap_err();
        assert!(matches!(err, TranslateError::MalformedLiteral { .. }));
    }

    #[test]
    fn decimal_keeps_scale() {
        assert_eq!(enc(Value::Decimal(Decimal::from_str("12.50").unwrap())), "12.50m");
    }

    #[test]
    fn datetimes() {
        let whole = NaiveDate::from_ymd_opt(2014, 3, 5)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(
            enc(Value::DateTime(DateTimeValue::utc(whole))),
            "datetime'2014-03-05T10:20:30Z'"
        );
        assert_eq!(
            enc(Value::DateTime(DateTimeValue::unspecified(whole))),
            "datetime'2014-03-05T10:20:30'"
        );
        let frac = NaiveDate::from_ymd_opt(2014, 3, 5)
            .unwrap()
            .and_hms_milli_opt(10, 20, 30, 250)
            .unwrap();
        assert_eq!(
            enc(Value::DateTime(DateTimeValue::utc(frac))),
            "datetime'2014-03-05T10:20:30.2500000Z'"
        );
        let tick = NaiveDate::from_ymd_opt(2014, 3, 5)
            .unwrap()
            .and_hms_nano_opt(10, 20, 30, 100)
            .unwrap();
        assert_eq!(
            enc(Value::DateTime(DateTimeValue::unspecified(tick))),
            "datetime'2014-03-05T10:20:30.0000001'"
        );
    }

    #[test]
    fn sub_tick_datetime_is_rejected() {
        let fine = NaiveDate::from_ymd_opt(2014, 3, 5)
            .unwrap()
            .and_hms_nano_opt(10, 20, 30, 50)
            .unwrap();
        let err = encode_constant(
            &Value::DateTime(DateTimeValue::utc(fine)),
            &TypeRef::DateTime,
            &DefaultNames,
        )
        .unwrap_err();
        assert!(matches!(err, TranslateError::MalformedLiteral { .. }), "{err:?}");
        assert!(err.to_string().contains("50ns"), "{err}");
    }

    #[test]
    fn guid_and_type() {
        let g = Uuid::from_str("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap();
        assert_eq!(enc(Value::Guid(g)), "guid'6f9619ff-8b86-d011-b42d-00cf4fc964ff'");
        assert_eq!(enc(Value::Type(TypeRef::complex("Dog"))), "t'Dog'");
    }

    #[test]
    fn enums_encode_as_member_names() {
        let def = status();
        let v = Value::Int32(2).to_enum(&def).unwrap();
        assert_eq!(enc(v), "'Retired'");
        let unknown = Value::Int32(9).to_enum(&def).unwrap();
        assert_eq!(enc(unknown), "'9'");
        // integral payload under an enum static type
        let ty = TypeRef::nullable(TypeRef::Enum(def));
        assert_eq!(
            encode_constant(&Value::Int32(1), &ty, &DefaultNames).unwrap(),
            "'Active'"
        );
    }

    #[test]
    fn sequences_encode_items() {
        let v = Value::List(vec![
            Value::String("a".into()),
            Value::Null,
            Value::String("b'c".into()),
        ]);
        assert_eq!(enc(v), "['a',null,'b''c']");
    }

    #[test]
    fn unsupported_literals_are_rejected() {
        for v in [
            Value::Int64(5),
            Value::Byte(1),
            Value::Record(Arc::new(Record::new("Closure"))),
        ] {
            let ty = v.type_of();
            let err = encode_constant(&v, &ty, &DefaultNames).unwrap_err();
            assert!(
                matches!(err, TranslateError::MalformedLiteral { .. }),
                "expected malformed literal for {v}"
            );
        }
    }
}
