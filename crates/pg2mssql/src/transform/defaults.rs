//! Column default translation.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. `nextval('...')` becomes a `NEXT VALUE FOR` on the named sequence.
//! 2. A `value::type` cast keeps the bare value when the type is on the
//!    allow-list and is otherwise unsupported.
//! 3. `now()`, `true` and `false` map to their T-SQL forms; everything else
//!    is emitted as written.

use crate::core::DefaultValueSpec;

/// Cast types whose literal value is valid T-SQL once the cast is dropped.
const PASSTHROUGH_CASTS: &[&str] = &[
    "bpchar",
    "date",
    "timestamp without time zone",
    "character",
    "character varying",
    "interval",
    "text",
];

/// Translate a raw default expression for a column in `schema`.
pub fn translate(schema: &str, raw: &str) -> DefaultValueSpec {
    let expr = raw.trim();

    if expr.starts_with("nextval(") {
        return match sequence_reference(schema, expr) {
            Some((schema, sequence)) => DefaultValueSpec::SequenceNextValue { schema, sequence },
            None => DefaultValueSpec::Unsupported,
        };
    }

    if let Some(pos) = expr.find("::") {
        let value = &expr[..pos];
        let cast = expr[pos + 2..].trim();
        let cast = match cast.find('(') {
            Some(paren) => cast[..paren].trim_end(),
            None => cast,
        };
        return if PASSTHROUGH_CASTS.contains(&cast) {
            DefaultValueSpec::PassThrough(value.to_string())
        } else {
            DefaultValueSpec::Unsupported
        };
    }

    if expr == "now()" {
        DefaultValueSpec::BuiltinNow
    } else if expr.eq_ignore_ascii_case("true") {
        DefaultValueSpec::BooleanLiteral(true)
    } else if expr.eq_ignore_ascii_case("false") {
        DefaultValueSpec::BooleanLiteral(false)
    } else {
        DefaultValueSpec::Literal(expr.to_string())
    }
}

/// Extract `(schema, sequence)` from `nextval('name'::regclass)`.
///
/// Unqualified names resolve to `default_schema`.
fn sequence_reference(default_schema: &str, expr: &str) -> Option<(String, String)> {
    let start = expr.find('\'')? + 1;
    let len = expr[start..].find('\'')?;
    let qualified = expr[start..start + len].trim();
    if qualified.is_empty() {
        return None;
    }

    let parts = split_qualified(qualified);
    match parts.as_slice() {
        [sequence] => Some((default_schema.to_string(), sequence.clone())),
        [schema, sequence] => Some((schema.clone(), sequence.clone())),
        _ => None,
    }
}

/// Split on dots outside double quotes, removing the quotes.
pub(crate) fn split_qualified(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            '.' if !quoted => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}
