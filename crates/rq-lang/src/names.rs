use crate::error::TranslateError;
use crate::types::TypeRef;

/// Maps members and types to the names the remote service understands.
pub trait NameResolver {
    /// External name of `member` declared on the type keyed `owner`.
    fn member_name(&self, owner: &str, member: &str) -> String;

    /// External name of a type outside the native scalar table, if known.
    fn type_name(&self, ty: &TypeRef) -> Option<String>;
}

/// Resolver without a catalog: camelCase members, declared type names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNames;

impl NameResolver for DefaultNames {
    fn member_name(&self, _owner: &str, member: &str) -> String {
        to_camel_case(member)
    }

    fn type_name(&self, ty: &TypeRef) -> Option<String> {
        match ty {
            TypeRef::Complex(name) => Some(name.to_string()),
            TypeRef::Enum(def) => Some(def.name.clone()),
            _ => None,
        }
    }
}

/// Lower-cases the first character.
pub fn to_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Single-quoted string literal with embedded quotes doubled, optionally
/// prefixed (`t'..'`, `datetime'..'`).
pub fn encode_string(text: &str, prefix: &str) -> String {
    format!("{prefix}'{}'", text.replace('\'', "''"))
}

/// Wire name of a type: native table first, then the resolver. Nullable
/// types append `?`.
pub fn external_type_name(ty: &TypeRef, names: &dyn NameResolver) -> Result<String, TranslateError> {
    if let Some(inner) = ty.nullable_inner() {
        return Ok(format!("{}?", external_type_name(inner, names)?));
    }
    if let Some(native) = ty.native_name() {
        return Ok(native.to_string());
    }
    names
        .type_name(ty)
        .ok_or_else(|| TranslateError::AmbiguousTypeResolution {
            type_name: ty.to_string(),
        })
}

/// `t'Name'`
pub fn type_literal(ty: &TypeRef, names: &dyn NameResolver) -> Result<String, TranslateError> {
    external_type_name(ty, names).map(|name| encode_string(&name, "t"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_first_char_only() {
        assert_eq!(to_camel_case("Name"), "name");
        assert_eq!(to_camel_case("HTTPPort"), "hTTPPort");
        assert_eq!(to_camel_case("x"), "x");
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(encode_string("O'Neil", ""), "'O''Neil'");
        assert_eq!(encode_string("Critter", "t"), "t'Critter'");
        assert_eq!(encode_string("''", ""), "''''''");
    }

    #[test]
    fn encoded_strings_decode_to_the_original() {
        use winnow::Parser;

        for text in ["", "'", "''", "'lead", "trail'", "a'b''c", "naïve 日本 'ü'", "\\n"] {
            let encoded = encode_string(text, "");
            let decoded = crate::parse_utils::single_quoted
                .parse(encoded.as_str())
                .unwrap_or_else(|e| panic!("decode {encoded}: {e}"));
            assert_eq!(decoded, text, "via {encoded}");
        }
    }

    #[test]
    fn type_names() {
        let names = DefaultNames;
        assert_eq!(
            type_literal(&TypeRef::nullable(TypeRef::Int32), &names).unwrap(),
            "t'Int32?'"
        );
        assert_eq!(
            type_literal(&TypeRef::complex("Dog"), &names).unwrap(),
            "t'Dog'"
        );
        let err = external_type_name(&TypeRef::list(TypeRef::Int32), &names).unwrap_err();
        assert_eq!(
            err,
            TranslateError::AmbiguousTypeResolution {
                type_name: "list<int32>".into()
            }
        );
    }
}
