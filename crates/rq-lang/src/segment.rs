use std::borrow::Cow;

use crate::error::TranslateError;

// ---------------------------------------------------------------------------
// Deferred query text
// ---------------------------------------------------------------------------

/// Binding strength of infix forms in the query language, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    TypeAs,
    Or,
    And,
    Comparison,
    Additive,
    Multiplicative,
}

impl Precedence {
    fn is_associative(self) -> bool {
        !matches!(self, Precedence::Comparison | Precedence::TypeAs)
    }
}

/// A node of the output tree. Text is produced once, by [`Segment::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Terminal(String),
    /// Template with `{n}` slots filled by `args`.
    Formatted {
        template: Cow<'static, str>,
        args: Vec<Segment>,
    },
    /// Items concatenated verbatim.
    List(Vec<Segment>),
    /// An infix form; parenthesized only where its context needs grouping.
    Scope {
        precedence: Precedence,
        inner: Box<Segment>,
    },
    Unsupported(TranslateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Where a segment sits relative to the text around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Delimited on both sides (argument position, top level).
    Free,
    /// Glued to surrounding text, e.g. the owner of `.member`.
    Tight,
    /// Left or right operand of an infix form.
    Operand { parent: Precedence, side: Side },
}

impl Slot {
    fn needs_parens(self, own: Precedence) -> bool {
        match self {
            Slot::Free => false,
            Slot::Tight => true,
            Slot::Operand { parent, side } => {
                own < parent
                    || (own == parent && (side == Side::Right || !parent.is_associative()))
            }
        }
    }
}

impl Segment {
    pub fn terminal(text: impl Into<String>) -> Self {
        Segment::Terminal(text.into())
    }

    pub fn formatted(template: impl Into<Cow<'static, str>>, args: Vec<Segment>) -> Self {
        Segment::Formatted {
            template: template.into(),
            args,
        }
    }

    pub fn list(items: Vec<Segment>) -> Self {
        Segment::List(items)
    }

    pub fn scope(precedence: Precedence, inner: Segment) -> Self {
        Segment::Scope {
            precedence,
            inner: Box::new(inner),
        }
    }

    /// `left <op> right` as a scoped infix form.
    pub fn infix(precedence: Precedence, left: Segment, op: &str, right: Segment) -> Self {
        Segment::scope(
            precedence,
            Segment::list(vec![left, Segment::terminal(format!(" {op} ")), right]),
        )
    }

    pub fn unsupported(err: TranslateError) -> Self {
        Segment::Unsupported(err)
    }

    /// First failure marker in depth-first, left-to-right order.
    pub fn first_error(&self) -> Option<&TranslateError> {
        match self {
            Segment::Terminal(_) => None,
            Segment::Formatted { args, .. } => args.iter().find_map(Segment::first_error),
            Segment::List(items) => items.iter().find_map(Segment::first_error),
            Segment::Scope { inner, .. } => inner.first_error(),
            Segment::Unsupported(err) => Some(err),
        }
    }

    /// Render the whole tree, or fail with the first unsupported construct.
    /// The outermost scope is never parenthesized.
    pub fn finalize(&self) -> Result<String, TranslateError> {
        if let Some(err) = self.first_error() {
            return Err(err.clone());
        }
        if let Some(err) = self.first_unfilled() {
            return Err(err);
        }
        let mut out = String::new();
        self.render(Slot::Free, &mut out);
        Ok(out)
    }

    /// First template, depth-first, with a slot beyond its arguments.
    fn first_unfilled(&self) -> Option<TranslateError> {
        match self {
            Segment::Terminal(_) | Segment::Unsupported(_) => None,
            Segment::Formatted { template, args } => {
                let slots = template_arity(template);
                if slots > args.len() {
                    return Some(TranslateError::UnfilledTemplate {
                        template: template.to_string(),
                        slots,
                        operands: args.len(),
                    });
                }
                args.iter().find_map(Segment::first_unfilled)
            }
            Segment::List(items) => items.iter().find_map(Segment::first_unfilled),
            Segment::Scope { inner, .. } => inner.first_unfilled(),
        }
    }

    fn render(&self, slot: Slot, out: &mut String) {
        match self {
            Segment::Terminal(text) => out.push_str(text),
            Segment::Formatted { template, args } => render_template(template, args, None, out),
            Segment::List(items) => {
                for item in items {
                    item.render(Slot::Tight, out);
                }
            }
            Segment::Scope { precedence, inner } => {
                let parens = slot.needs_parens(*precedence);
                if parens {
                    out.push('(');
                }
                inner.render_scoped(*precedence, out);
                if parens {
                    out.push(')');
                }
            }
            Segment::Unsupported(_) => {}
        }
    }

    fn render_scoped(&self, parent: Precedence, out: &mut String) {
        match self {
            Segment::List(items) => {
                let last = items.len().saturating_sub(1);
                for (i, item) in items.iter().enumerate() {
                    let slot = if i == 0 {
                        Slot::Operand {
                            parent,
                            side: Side::Left,
                        }
                    } else if i == last {
                        Slot::Operand {
                            parent,
                            side: Side::Right,
                        }
                    } else {
                        Slot::Tight
                    };
                    item.render(slot, out);
                }
            }
            Segment::Formatted { template, args } => {
                render_template(template, args, Some(parent), out)
            }
            other => other.render(Slot::Free, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Template expansion
// ---------------------------------------------------------------------------

const OPEN_DELIMS: &str = "([,:";
const CLOSE_DELIMS: &str = "),]:";

/// Byte range and index of each `{n}` slot; other braces are literal text.
fn slots(template: &str) -> Vec<(usize, usize, usize)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(open) = template[from..].find('{').map(|i| from + i) {
        let after = &template[open + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && after[digits..].starts_with('}') {
            let end = open + digits + 2;
            if let Ok(index) = after[..digits].parse() {
                found.push((open, end, index));
            }
            from = end;
        } else {
            from = open + 1;
        }
    }
    found
}

/// Number of arguments `template` needs: highest slot index plus one.
pub(crate) fn template_arity(template: &str) -> usize {
    slots(template)
        .iter()
        .map(|&(_, _, index)| index + 1)
        .max()
        .unwrap_or(0)
}

/// Unfilled slots render as nothing; [`Segment::finalize`] rejects them
/// before rendering.
fn render_template(template: &str, args: &[Segment], scoped: Option<Precedence>, out: &mut String) {
    let mut last = 0;
    for (start, end, index) in slots(template) {
        out.push_str(&template[last..start]);
        if let Some(arg) = args.get(index) {
            arg.render(slot_for(template, start, end, scoped), out);
        }
        last = end;
    }
    out.push_str(&template[last..]);
}

fn slot_for(template: &str, start: usize, end: usize, scoped: Option<Precedence>) -> Slot {
    let prev = template[..start].chars().next_back();
    let next = template[end..].chars().next();
    let left_delimited = prev.is_none_or(|c| OPEN_DELIMS.contains(c));
    let right_delimited = next.is_none_or(|c| CLOSE_DELIMS.contains(c));
    if left_delimited && right_delimited {
        return Slot::Free;
    }
    match scoped {
        Some(parent) if prev.is_none() => Slot::Operand {
            parent,
            side: Side::Left,
        },
        Some(parent) if next.is_none() => Slot::Operand {
            parent,
            side: Side::Right,
        },
        _ => Slot::Tight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::NodeKind;

    fn t(s: &str) -> Segment {
        Segment::terminal(s)
    }

    fn cmp(l: &str, op: &str, r: &str) -> Segment {
        Segment::infix(Precedence::Comparison, t(l), op, t(r))
    }

    #[test]
    fn top_level_scope_is_unwrapped() {
        let seg = Segment::infix(
            Precedence::And,
            cmp("age", "gt", "18"),
            "and",
            cmp("name", "eq", "'bob'"),
        );
        assert_eq!(seg.finalize().unwrap(), "age gt 18 and name eq 'bob'");
    }

    #[test]
    fn weaker_operand_is_parenthesized() {
        let or = Segment::infix(Precedence::Or, t("a"), "or", t("b"));
        let seg = Segment::infix(Precedence::And, or, "and", t("c"));
        assert_eq!(seg.finalize().unwrap(), "(a or b) and c");
    }

    #[test]
    fn right_nested_same_precedence_is_parenthesized() {
        let inner = Segment::infix(Precedence::Additive, t("b"), "sub", t("c"));
        let seg = Segment::infix(Precedence::Additive, t("a"), "sub", inner.clone());
        assert_eq!(seg.finalize().unwrap(), "a sub (b sub c)");

        let seg = Segment::infix(Precedence::Additive, inner, "sub", t("a"));
        assert_eq!(seg.finalize().unwrap(), "b sub c sub a");
    }

    #[test]
    fn comparisons_never_chain_unparenthesized() {
        let seg = Segment::infix(Precedence::Comparison, cmp("a", "eq", "b"), "eq", t("true"));
        assert_eq!(seg.finalize().unwrap(), "(a eq b) eq true");
    }

    #[test]
    fn delimited_slots_drop_parens() {
        let body = Segment::infix(Precedence::Comparison, t("i.price"), "gt", t("10"));
        let lambda = Segment::formatted("{0}:{1}", vec![t("i"), body]);
        let call = Segment::formatted("{0}.any({1})", vec![t("items"), lambda]);
        assert_eq!(call.finalize().unwrap(), "items.any(i:i.price gt 10)");
    }

    #[test]
    fn tight_slots_keep_parens() {
        let sum = Segment::infix(Precedence::Additive, t("a"), "add", t("b"));
        let seg = Segment::formatted("{0}.{1}", vec![sum, t("length")]);
        assert_eq!(seg.finalize().unwrap(), "(a add b).length");
    }

    #[test]
    fn scoped_template_operands() {
        let in_set = Segment::scope(
            Precedence::Comparison,
            Segment::formatted("{0} in {1}", vec![t("v"), t("tags")]),
        );
        let seg = Segment::infix(Precedence::And, in_set, "and", t("ok"));
        assert_eq!(seg.finalize().unwrap(), "v in tags and ok");

        let or = Segment::infix(Precedence::Or, t("a"), "or", t("b"));
        let seg = Segment::scope(
            Precedence::Comparison,
            Segment::formatted("{0} in {1}", vec![or, t("s")]),
        );
        assert_eq!(seg.finalize().unwrap(), "(a or b) in s");
    }

    #[test]
    fn first_unsupported_wins() {
        let first = TranslateError::UnsupportedConstruct {
            kind: NodeKind::New,
            node: "new A()".into(),
            reason: "first".into(),
        };
        let second = TranslateError::malformed("int64", "second");
        let seg = Segment::list(vec![
            t("a"),
            Segment::formatted("f({0})", vec![Segment::unsupported(first.clone())]),
            Segment::unsupported(second),
        ]);
        assert_eq!(seg.finalize().unwrap_err(), first);
    }

    #[test]
    fn stray_braces_are_literal() {
        let seg = Segment::formatted("{x}{0}{}", vec![t("a")]);
        assert_eq!(seg.finalize().unwrap(), "{x}a{}");
    }

    #[test]
    fn missing_template_argument_fails() {
        let inner = Segment::formatted("length({0})", vec![]);
        let seg = Segment::infix(Precedence::Comparison, inner, "gt", t("3"));
        assert_eq!(
            seg.finalize().unwrap_err(),
            TranslateError::UnfilledTemplate {
                template: "length({0})".into(),
                slots: 1,
                operands: 0,
            }
        );
        let seg = Segment::formatted("{0}.{1}", vec![t("a")]);
        assert!(seg.finalize().is_err());
    }

    #[test]
    fn arity_is_highest_slot() {
        assert_eq!(template_arity("substringof({1},{0})"), 2);
        assert_eq!(template_arity("{0}"), 1);
        assert_eq!(template_arity("true"), 0);
        assert_eq!(template_arity("{x}{2}"), 3);
    }
}
