use std::collections::HashMap;
use std::sync::LazyLock;

use crate::expr::BinaryOp;
use crate::segment::{Precedence, Segment, template_arity};
use crate::signature::{ParamShape, Signature};

// ---------------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------------

/// Query-language token and precedence of a binary operator.
pub fn binary_token(op: BinaryOp) -> Option<(&'static str, Precedence)> {
    Some(match op {
        BinaryOp::And => ("and", Precedence::And),
        BinaryOp::Or => ("or", Precedence::Or),
        BinaryOp::Eq => ("eq", Precedence::Comparison),
        BinaryOp::Ne => ("ne", Precedence::Comparison),
        BinaryOp::Gt => ("gt", Precedence::Comparison),
        BinaryOp::Ge => ("ge", Precedence::Comparison),
        BinaryOp::Lt => ("lt", Precedence::Comparison),
        BinaryOp::Le => ("le", Precedence::Comparison),
        BinaryOp::Sub => ("sub", Precedence::Additive),
        BinaryOp::Add => ("add", Precedence::Additive),
        BinaryOp::Mul => ("mul", Precedence::Multiplicative),
        BinaryOp::Div => ("div", Precedence::Multiplicative),
        BinaryOp::Mod => ("mod", Precedence::Multiplicative),
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::Xor
        | BinaryOp::Coalesce
        | BinaryOp::ArrayIndex => return None,
    })
}

// ---------------------------------------------------------------------------
// Members and methods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// Operator form; the template is wrapped in a scope.
    Infix(Precedence),
    /// `{0}.name(..)`
    Chained,
    /// `name({0},..)`
    Static,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMapping {
    pub signature: Signature,
    pub static_format: &'static str,
    /// Receiver-first form derived from `static_format`, when it has the
    /// `name({0},..)` shape.
    pub chained_format: Option<String>,
    pub style: CallStyle,
}

impl FunctionMapping {
    fn new(signature: Signature, static_format: &'static str, style: CallStyle) -> Self {
        Self {
            chained_format: derive_chained(static_format),
            signature,
            static_format,
            style,
        }
    }

    /// Operands the template expects, receiver included.
    pub fn arity(&self) -> usize {
        template_arity(self.static_format)
    }

    /// Apply the mapping to the translated receiver (if any) and arguments.
    pub fn apply(&self, mut args: Vec<Segment>) -> Segment {
        match self.style {
            CallStyle::Infix(p) => Segment::scope(p, Segment::formatted(self.static_format, args)),
            _ if self.static_format == "{0}" && args.len() == 1 => args.remove(0),
            CallStyle::Chained => match &self.chained_format {
                Some(chained) => Segment::formatted(chained.clone(), args),
                None => Segment::formatted(self.static_format, args),
            },
            CallStyle::Static => Segment::formatted(self.static_format, args),
        }
    }
}

/// `name({0},{1})` -> `{0}.name({1})`; `name({0})` -> `{0}.name()`.
fn derive_chained(template: &str) -> Option<String> {
    let (name, rest) = template.split_once('(')?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let rest = rest.strip_suffix(')')?;
    let tail = rest.strip_prefix("{0}")?;
    let tail = match tail.strip_prefix(',') {
        Some(t) => t,
        None if tail.is_empty() => "",
        None => return None,
    };
    Some(format!("{{0}}.{name}({tail})"))
}

/// Mapping for `sig`; queryable overloads fall back to their enumerable
/// counterpart.
pub fn lookup(sig: &Signature) -> Option<&'static FunctionMapping> {
    MAPPINGS.get(sig).or_else(|| {
        sig.enumerable_counterpart()
            .and_then(|e| MAPPINGS.get(&e))
    })
}

// Well-known signatures the translator treats specially.

pub fn map_get_item() -> Signature {
    Signature::method("map", "get_Item", vec![ParamShape::Key])
}

pub fn map_safe_get() -> Signature {
    Signature::method("map", "SafeGet", vec![ParamShape::Key])
}

pub fn string_concat() -> Signature {
    Signature::static_method(
        "string",
        "Concat",
        vec![ParamShape::String, ParamShape::String],
    )
}

static MAPPINGS: LazyLock<HashMap<Signature, FunctionMapping>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for m in build_mappings() {
        table.insert(m.signature.clone(), m);
    }
    table
});

fn build_mappings() -> Vec<FunctionMapping> {
    use CallStyle::{Chained, Infix, Static};
    use ParamShape as P;

    let string = |name: &'static str, params: Vec<ParamShape>| Signature::method("string", name, params);
    let math = |name: &'static str, p: ParamShape| Signature::static_method("math", name, vec![p]);
    let seq = |name: &'static str, params: Vec<ParamShape>| {
        Signature::static_method("enumerable", name, params)
    };
    let cmp = Infix(Precedence::Comparison);

    let mut m = vec![
        // string
        FunctionMapping::new(Signature::property("string", "Length"), "length({0})", Static),
        FunctionMapping::new(string("StartsWith", vec![P::String]), "startswith({0},{1})", Static),
        FunctionMapping::new(string("EndsWith", vec![P::String]), "endswith({0},{1})", Static),
        FunctionMapping::new(string("Contains", vec![P::String]), "substringof({1},{0})", Static),
        FunctionMapping::new(string("IndexOf", vec![P::String]), "indexof({0},{1})", Static),
        FunctionMapping::new(string("IndexOf", vec![P::Char]), "indexof({0},{1})", Static),
        FunctionMapping::new(string("ToLower", vec![]), "tolower({0})", Static),
        FunctionMapping::new(string("ToUpper", vec![]), "toupper({0})", Static),
        FunctionMapping::new(string("Trim", vec![]), "trim({0})", Static),
        FunctionMapping::new(string("Substring", vec![P::Int32]), "substring({0},{1})", Static),
        FunctionMapping::new(
            string("Substring", vec![P::Int32, P::Int32]),
            "substring({0},{1},{2})",
            Static,
        ),
        FunctionMapping::new(
            string("Replace", vec![P::String, P::String]),
            "replace({0},{1},{2})",
            Static,
        ),
        FunctionMapping::new(string_concat(), "concat({0},{1})", Static),
        FunctionMapping::new(string("Equals", vec![P::String]), "{0} eq {1}", cmp),
        // collections
        FunctionMapping::new(Signature::property("list", "Count"), "count({0})", Chained),
        FunctionMapping::new(Signature::property("array", "Length"), "count({0})", Chained),
        FunctionMapping::new(
            Signature::method("list", "Contains", vec![P::Item]),
            "{1} in {0}",
            cmp,
        ),
        FunctionMapping::new(seq("Contains", vec![P::Sequence, P::Item]), "{1} in {0}", cmp),
        FunctionMapping::new(seq("Any", vec![P::Sequence]), "any({0})", Chained),
        FunctionMapping::new(seq("Any", vec![P::Sequence, P::Predicate]), "any({0},{1})", Chained),
        FunctionMapping::new(seq("All", vec![P::Sequence, P::Predicate]), "all({0},{1})", Chained),
        FunctionMapping::new(seq("Count", vec![P::Sequence]), "count({0})", Chained),
        FunctionMapping::new(
            seq("Count", vec![P::Sequence, P::Predicate]),
            "count({0},{1})",
            Chained,
        ),
        FunctionMapping::new(
            seq("Where", vec![P::Sequence, P::Predicate]),
            "where({0},{1})",
            Chained,
        ),
        FunctionMapping::new(
            seq("Select", vec![P::Sequence, P::Selector]),
            "select({0},{1})",
            Chained,
        ),
        FunctionMapping::new(seq("First", vec![P::Sequence]), "first({0})", Chained),
        FunctionMapping::new(
            seq("First", vec![P::Sequence, P::Predicate]),
            "first({0},{1})",
            Chained,
        ),
        FunctionMapping::new(
            seq("FirstOrDefault", vec![P::Sequence]),
            "firstdefault({0})",
            Chained,
        ),
        FunctionMapping::new(
            seq("FirstOrDefault", vec![P::Sequence, P::Predicate]),
            "firstdefault({0},{1})",
            Chained,
        ),
        FunctionMapping::new(seq("Sum", vec![P::Sequence]), "sum({0})", Chained),
        FunctionMapping::new(seq("Sum", vec![P::Sequence, P::Selector]), "sum({0},{1})", Chained),
        FunctionMapping::new(seq("Min", vec![P::Sequence]), "min({0})", Chained),
        FunctionMapping::new(seq("Min", vec![P::Sequence, P::Selector]), "min({0},{1})", Chained),
        FunctionMapping::new(seq("Max", vec![P::Sequence]), "max({0})", Chained),
        FunctionMapping::new(seq("Max", vec![P::Sequence, P::Selector]), "max({0},{1})", Chained),
        FunctionMapping::new(seq("Average", vec![P::Sequence]), "average({0})", Chained),
        FunctionMapping::new(
            seq("Average", vec![P::Sequence, P::Selector]),
            "average({0},{1})",
            Chained,
        ),
        // nullable
        FunctionMapping::new(Signature::property("nullable", "HasValue"), "{0} ne null", cmp),
        FunctionMapping::new(Signature::property("nullable", "Value"), "{0}", Static),
        // map
        FunctionMapping::new(map_get_item(), "{0}[{1}]", Static),
        FunctionMapping::new(map_safe_get(), "{0}[{1}]", Static),
    ];

    for part in ["Year", "Month", "Day", "Hour", "Minute", "Second"] {
        let template = match part {
            "Year" => "year({0})",
            "Month" => "month({0})",
            "Day" => "day({0})",
            "Hour" => "hour({0})",
            "Minute" => "minute({0})",
            _ => "second({0})",
        };
        m.push(FunctionMapping::new(
            Signature::property("datetime", part),
            template,
            Static,
        ));
    }

    for p in [P::Double, P::Decimal] {
        m.push(FunctionMapping::new(math("Round", p.clone()), "round({0})", Static));
        m.push(FunctionMapping::new(math("Floor", p.clone()), "floor({0})", Static));
        m.push(FunctionMapping::new(math("Ceiling", p), "ceiling({0})", Static));
    }

    m
}
