//! Expression evaluator. Parses and evaluates a captured
//! `FilterExpr`/`BindExpr` span in a single pass — "the expression parser
//! is reused for nested bodies" applies here too: a nested
//! `(...)`  or `EXISTS { ... }` body is walked by recursing into the same
//! functions on a fresh `Cursor` over the sub-text, never by building an
//! owned expression tree.
//!
//! The evaluator never fails: malformed input, unknown builtins, unbound
//! arithmetic operands and invalid regexes all degrade to `Unbound`/
//! `false` rather than an error.

use crate::ast::TriplePattern;
use crate::bindings::{hash_variable_name, BindingTable, BindingType};
use crate::cursor::Cursor;
use crate::span::Span;
use crate::store::ExecutorConfig;

const XSD_STRING: &str = "<http://www.w3.org/2001/XMLSchema#string>";
const XSD_INTEGER: &str = "<http://www.w3.org/2001/XMLSchema#integer>";
const XSD_DOUBLE: &str = "<http://www.w3.org/2001/XMLSchema#double>";
const XSD_BOOLEAN: &str = "<http://www.w3.org/2001/XMLSchema#boolean>";
const RDF_LANG_STRING: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#langString>";

/// `Value`: `Unbound | Uri | String | Integer | Double |
/// Boolean`. `Uri`/`String` hold the SPARQL lexical text as produced by
/// the binding table (quotes, `@lang`, `^^dt` suffix included) — builtins
/// that fabricate plain text (`STR`, `CONCAT`, hashes, …) store unquoted
/// content instead; `value_string_content` normalises either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unbound,
    Uri(String),
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
}

/// Tested by `FILTER [NOT] EXISTS { ... }`/`MINUS` anti-join blocks
/// against the current binding frame. Implemented by `crate::executor`
/// over a live `TripleSource`; kept as a trait so `eval` never depends on
/// the store or executor module directly.
pub trait ExistsTester {
    fn test(&self, patterns: &[TriplePattern], source: &str) -> bool;
}

pub struct EvalCtx<'a> {
    pub bindings: &'a BindingTable,
    pub config: &'a ExecutorConfig,
}

#[derive(Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Flt(f64),
}

fn num_to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Flt(f) => f,
    }
}

/// Strips a literal's surrounding quotes (short or long form), returning
/// `(content, lang, datatype)`. Text with no leading quote char is
/// already plain content (a builtin's output) and is passed through.
fn split_literal(text: &str) -> (&str, Option<&str>, Option<&str>) {
    let bytes = text.as_bytes();
    if bytes.is_empty() || !(bytes[0] == b'"' || bytes[0] == b'\'') {
        return (text, None, None);
    }
    let quote = bytes[0];
    let triple = bytes.len() >= 6 && bytes[1] == quote && bytes[2] == quote;
    let qlen = if triple { 3 } else { 1 };
    let mut i = qlen;
    loop {
        if i >= bytes.len() {
            return (text, None, None);
        }
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote && (!triple || (bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote))) {
            break;
        }
        i += 1;
    }
    let content = &text[qlen..i];
    let after = &text[(i + qlen).min(text.len())..];
    if let Some(rest) = after.strip_prefix('@') {
        (content, Some(rest), None)
    } else if let Some(rest) = after.strip_prefix("^^") {
        (content, None, Some(rest))
    } else {
        (content, None, None)
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders any `Value` as plain text: `STR()`-equivalent content, used
/// by every string builtin and by non-numeric comparisons.
pub fn value_string_content(v: &Value) -> String {
    match v {
        Value::Unbound => String::new(),
        Value::Uri(s) => s.trim_start_matches('<').trim_end_matches('>').to_string(),
        Value::String(s) => unescape(split_literal(s).0),
        Value::Integer(i) => i.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Boolean(b) => b.to_string(),
    }
}

fn numeric_coerce(v: &Value) -> Option<Num> {
    match v {
        Value::Integer(i) => Some(Num::Int(*i)),
        Value::Double(d) => Some(Num::Flt(*d)),
        Value::String(_) => {
            let text = value_string_content(v);
            if let Ok(i) = text.parse::<i64>() {
                Some(Num::Int(i))
            } else {
                text.parse::<f64>().ok().map(Num::Flt)
            }
        }
        _ => None,
    }
}

fn num_cmp(a: Num, b: Num) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        _ => num_to_f64(a).partial_cmp(&num_to_f64(b)),
    }
}

fn apply_cmp(op: CmpOp, ord: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    match ord {
        None => false,
        Some(o) => match op {
            CmpOp::Eq => o == Equal,
            CmpOp::Ne => o != Equal,
            CmpOp::Lt => o == Less,
            CmpOp::Le => o != Greater,
            CmpOp::Gt => o == Greater,
            CmpOp::Ge => o != Less,
        },
    }
}

/// `=`/`!=`/`<`/`<=`/`>`/`>=`: numeric coercion when either
/// side is `Integer`/`Double`; otherwise byte-wise text comparison. An
/// `Unbound` operand makes every comparison false.
fn compare(op: CmpOp, l: &Value, r: &Value) -> bool {
    if matches!(l, Value::Unbound) || matches!(r, Value::Unbound) {
        return false;
    }
    let numeric_context = matches!(l, Value::Integer(_) | Value::Double(_)) || matches!(r, Value::Integer(_) | Value::Double(_));
    if numeric_context {
        return match (numeric_coerce(l), numeric_coerce(r)) {
            (Some(a), Some(b)) => apply_cmp(op, num_cmp(a, b)),
            _ => false,
        };
    }
    if let (Value::Boolean(a), Value::Boolean(b)) = (l, r) {
        return apply_cmp(op, a.partial_cmp(b));
    }
    apply_cmp(op, value_string_content(l).partial_cmp(&value_string_content(r)))
}

/// `sameTerm`: strict, no coercion; `Double` compares
/// bitwise.
fn same_term(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Uri(a), Value::Uri(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Unbound, Value::Unbound) => true,
        _ => false,
    }
}

/// EBV coercion: `Boolean→self`, `Integer→≠0`,
/// `Double→|x|>1e-10`, non-empty `String`/`Uri→true`, `Unbound→false`.
pub fn effective_boolean_value(v: &Value) -> bool {
    match v {
        Value::Boolean(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Double(d) => d.abs() > 1e-10,
        Value::String(_) => !value_string_content(v).is_empty(),
        Value::Uri(s) => !s.is_empty(),
        Value::Unbound => false,
    }
}

fn ebv(v: &Value) -> bool {
    effective_boolean_value(v)
}

fn lookup_variable(bindings: &BindingTable, name: &str) -> Value {
    let hash = hash_variable_name(name);
    match bindings.find_binding(hash) {
        Some(idx) => binding_to_value(bindings, idx),
        None => Value::Unbound,
    }
}

pub(crate) fn binding_to_value(bindings: &BindingTable, idx: usize) -> Value {
    let b = bindings.binding_at(idx);
    match b.binding_type {
        BindingType::Unbound => Value::Unbound,
        BindingType::Uri => Value::Uri(bindings.get_string(idx).to_string()),
        BindingType::String => Value::String(bindings.get_string(idx).to_string()),
        BindingType::Integer => Value::Integer(b.int_value),
        BindingType::Double => Value::Double(b.double_value),
        BindingType::Boolean => Value::Boolean(b.bool_value),
    }
}

/// Writes a computed `Value` into the binding table under `hash` (`BIND`).
/// `Unbound` leaves the variable unbound, matching `COALESCE`'s/
/// arithmetic's "unbound on failure" convention.
pub fn bind_value(bindings: &mut BindingTable, hash: u32, value: &Value, depth: u32) {
    match value {
        Value::Unbound => {}
        Value::Uri(s) => bindings.bind_uri(hash, s, depth),
        Value::String(s) => bindings.bind_string(hash, s, depth),
        Value::Integer(i) => bindings.bind_integer(hash, *i, depth),
        Value::Double(d) => bindings.bind_double(hash, *d, depth),
        Value::Boolean(b) => bindings.bind_boolean(hash, *b, depth),
    }
}

fn parse_identifier<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    let start = cursor.pos();
    while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'_' {
        cursor.advance();
    }
    &cursor.source()[start as usize..cursor.pos() as usize]
}

fn parse_raw_variable_name<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    cursor.skip_whitespace();
    if !matches!(cursor.peek(), b'?' | b'$') {
        return None;
    }
    cursor.advance();
    Some(parse_identifier(cursor))
}

fn parse_literal_text(cursor: &mut Cursor) -> String {
    let start = cursor.pos();
    let quote = cursor.advance();
    let long_form = cursor.peek() == quote && cursor.peek_at(1) == quote;
    if long_form {
        cursor.advance();
        cursor.advance();
        loop {
            if cursor.is_at_end() {
                break;
            }
            if cursor.peek() == b'\\' {
                cursor.advance();
                cursor.advance();
                continue;
            }
            if cursor.peek() == quote && cursor.peek_at(1) == quote && cursor.peek_at(2) == quote {
                cursor.advance();
                cursor.advance();
                cursor.advance();
                break;
            }
            cursor.advance();
        }
    } else {
        loop {
            if cursor.is_at_end() || cursor.peek() == b'\n' {
                break;
            }
            if cursor.peek() == b'\\' {
                cursor.advance();
                cursor.advance();
                continue;
            }
            if cursor.peek() == quote {
                cursor.advance();
                break;
            }
            cursor.advance();
        }
    }
    if cursor.peek() == b'@' {
        cursor.advance();
        while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'-' {
            cursor.advance();
        }
    } else if cursor.peek() == b'^' && cursor.peek_at(1) == b'^' {
        cursor.advance();
        cursor.advance();
        if cursor.peek() == b'<' {
            cursor.advance();
            while cursor.peek() != b'>' && !cursor.is_at_end() {
                cursor.advance();
            }
            if cursor.peek() == b'>' {
                cursor.advance();
            }
        } else {
            while cursor.peek().is_ascii_alphanumeric() || matches!(cursor.peek(), b'_' | b'-' | b':' | b'.') {
                cursor.advance();
            }
        }
    }
    cursor.source()[start as usize..cursor.pos() as usize].to_string()
}

fn parse_numeric(cursor: &mut Cursor) -> Value {
    let start = cursor.pos();
    if matches!(cursor.peek(), b'+' | b'-') {
        cursor.advance();
    }
    let mut is_float = false;
    while cursor.peek().is_ascii_digit() {
        cursor.advance();
    }
    if cursor.peek() == b'.' && cursor.peek_at(1).is_ascii_digit() {
        is_float = true;
        cursor.advance();
        while cursor.peek().is_ascii_digit() {
            cursor.advance();
        }
    }
    if matches!(cursor.peek(), b'e' | b'E') {
        is_float = true;
        cursor.advance();
        if matches!(cursor.peek(), b'+' | b'-') {
            cursor.advance();
        }
        while cursor.peek().is_ascii_digit() {
            cursor.advance();
        }
    }
    let text = &cursor.source()[start as usize..cursor.pos() as usize];
    if is_float {
        Value::Double(text.parse().unwrap_or(0.0))
    } else {
        Value::Integer(text.parse().unwrap_or(0))
    }
}

fn eval_exists_block(cursor: &mut Cursor, tester: &dyn ExistsTester) -> bool {
    cursor.skip_whitespace();
    let local_source = cursor.source();
    let patterns = crate::parser::pattern::parse_flat_pattern_list::<{ crate::ast::MAX_CLAUSE_PATTERNS }>(cursor).unwrap_or_default();
    tester.test(patterns.as_slice(), local_source)
}

fn parse_arg_list(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Vec<Value> {
    let mut items = Vec::new();
    loop {
        cursor.skip_whitespace();
        if cursor.peek() == b')' {
            cursor.advance();
            break;
        }
        if cursor.is_at_end() {
            break;
        }
        let before = cursor.pos();
        items.push(parse_or(cursor, ctx, tester));
        cursor.skip_whitespace();
        if cursor.peek() == b',' {
            cursor.advance();
        } else if cursor.pos() == before {
            // malformed content the caller can't consume: bail rather
            // than spin.
            cursor.advance();
        }
    }
    items
}

fn one_arg(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    let v = parse_or(cursor, ctx, tester);
    cursor.skip_whitespace();
    if cursor.peek() == b')' {
        cursor.advance();
    }
    v
}

struct DateTimeParts {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: f64,
    tz_minutes: Option<i64>,
}

/// Parses a fixed `YYYY-MM-DDTHH:MM:SS[.sss][Z|+HH:MM|-HH:MM]` form — the
/// only shape the date builtins need to support.
fn parse_datetime(content: &str) -> Option<DateTimeParts> {
    if content.len() < 19 || content.as_bytes().get(4) != Some(&b'-') {
        return None;
    }
    let year: i64 = content.get(0..4)?.parse().ok()?;
    let month: i64 = content.get(5..7)?.parse().ok()?;
    let day: i64 = content.get(8..10)?.parse().ok()?;
    let hour: i64 = content.get(11..13)?.parse().ok()?;
    let minute: i64 = content.get(14..16)?.parse().ok()?;
    let rest = &content[17..];
    if let Some(pos) = rest.find(['Z', '+', '-']) {
        let (sec_part, tz_part) = rest.split_at(pos);
        let second: f64 = sec_part.parse().ok()?;
        let tz_minutes = if tz_part == "Z" {
            Some(0)
        } else {
            let sign = if tz_part.starts_with('-') { -1 } else { 1 };
            let hh: i64 = tz_part.get(1..3)?.parse().ok()?;
            let mm: i64 = tz_part.get(4..6)?.parse().ok()?;
            Some(sign * (hh * 60 + mm))
        };
        Some(DateTimeParts { year, month, day, hour, minute, second, tz_minutes })
    } else {
        let second: f64 = rest.parse().ok()?;
        Some(DateTimeParts { year, month, day, hour, minute, second, tz_minutes: None })
    }
}

fn tz_to_text(tz_minutes: Option<i64>) -> String {
    match tz_minutes {
        None => String::new(),
        Some(0) => "Z".to_string(),
        Some(m) => format!("{}{:02}:{:02}", if m < 0 { "-" } else { "+" }, m.abs() / 60, m.abs() % 60),
    }
}

/// Days-since-epoch to Gregorian civil date, Howard Hinnant's
/// `civil_from_days` (<http://howardhinnant.github.io/date_algorithms.html>).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

fn now_iso8601() -> String {
    let dur = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    let secs = dur.as_secs() as i64;
    let millis = dur.subsec_millis();
    let days = secs.div_euclid(86400);
    let sod = secs.rem_euclid(86400);
    let (y, m, d) = civil_from_days(days);
    format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z", y, m, d, sod / 3600, (sod % 3600) / 60, sod % 60, millis)
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}

/// Builds a `regex::Regex` honouring the `i/s/m/x` flags.
/// The 100 ms compile timeout (`ExecutorConfig::regex_timeout_ms`) has no
/// literal wall-clock equivalent in the `regex` crate; bounding the
/// compiled program size is the practical proxy so pathological patterns
/// fail fast instead of hanging.
fn compile_regex(pattern: &str, flags: &str, config: &ExecutorConfig) -> Option<regex::Regex> {
    let mut builder = regex::RegexBuilder::new(pattern);
    for f in flags.chars() {
        match f {
            'i' => {
                builder.case_insensitive(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            _ => {}
        }
    }
    builder.size_limit((config.regex_timeout_ms as usize).saturating_mul(2048).max(1 << 16));
    match builder.build() {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(%pattern, %err, "REGEX compile failed, evaluating as no-match");
            None
        }
    }
}

fn numeric_to_integer(v: &Value, f: fn(f64) -> f64) -> Value {
    match numeric_coerce(v) {
        Some(n) => Value::Integer(f(num_to_f64(n)) as i64),
        None => Value::Unbound,
    }
}

fn call_builtin(name: &str, cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    cursor.advance(); // consume '('
    match name.to_ascii_uppercase().as_str() {
        "BOUND" => {
            let var = parse_raw_variable_name(cursor).map(|n| n.to_string());
            cursor.skip_whitespace();
            if cursor.peek() == b')' {
                cursor.advance();
            }
            Value::Boolean(var.is_some_and(|n| ctx.bindings.find_binding(hash_variable_name(&n)).is_some()))
        }
        "IF" => {
            let cond = parse_or(cursor, ctx, tester);
            cursor.skip_whitespace();
            if cursor.peek() == b',' {
                cursor.advance();
            }
            let then_v = parse_or(cursor, ctx, tester);
            cursor.skip_whitespace();
            if cursor.peek() == b',' {
                cursor.advance();
            }
            let v = one_arg(cursor, ctx, tester);
            if ebv(&cond) {
                then_v
            } else {
                v
            }
        }
        "COALESCE" => {
            let args = parse_arg_list(cursor, ctx, tester);
            args.into_iter().find(|v| !matches!(v, Value::Unbound)).unwrap_or(Value::Unbound)
        }
        "SAMETERM" => {
            let args = parse_arg_list(cursor, ctx, tester);
            Value::Boolean(args.len() == 2 && same_term(&args[0], &args[1]))
        }
        "ISIRI" | "ISURI" => Value::Boolean(matches!(one_arg(cursor, ctx, tester), Value::Uri(_))),
        "ISBLANK" => Value::Boolean(matches!(one_arg(cursor, ctx, tester), Value::String(s) if s.starts_with("_:"))),
        "ISLITERAL" => {
            let v = one_arg(cursor, ctx, tester);
            Value::Boolean(match v {
                Value::Integer(_) | Value::Double(_) | Value::Boolean(_) => true,
                Value::String(s) => !s.starts_with("_:"),
                _ => false,
            })
        }
        "ISNUMERIC" => Value::Boolean(numeric_coerce(&one_arg(cursor, ctx, tester)).is_some()),
        "STR" => Value::String(value_string_content(&one_arg(cursor, ctx, tester))),
        "LANG" => {
            let v = one_arg(cursor, ctx, tester);
            match v {
                Value::String(s) => Value::String(split_literal(&s).1.unwrap_or("").to_string()),
                _ => Value::String(String::new()),
            }
        }
        "DATATYPE" => {
            let v = one_arg(cursor, ctx, tester);
            match v {
                Value::String(s) => {
                    let (_, lang, dt) = split_literal(&s);
                    if let Some(dt) = dt {
                        Value::Uri(if dt.starts_with('<') { dt.to_string() } else { format!("<{dt}>") })
                    } else if lang.is_some() {
                        Value::Uri(RDF_LANG_STRING.to_string())
                    } else {
                        Value::Uri(XSD_STRING.to_string())
                    }
                }
                Value::Integer(_) => Value::Uri(XSD_INTEGER.to_string()),
                Value::Double(_) => Value::Uri(XSD_DOUBLE.to_string()),
                Value::Boolean(_) => Value::Uri(XSD_BOOLEAN.to_string()),
                _ => Value::Unbound,
            }
        }
        "STRLEN" => Value::Integer(value_string_content(&one_arg(cursor, ctx, tester)).chars().count() as i64),
        "UCASE" => Value::String(value_string_content(&one_arg(cursor, ctx, tester)).to_uppercase()),
        "LCASE" => Value::String(value_string_content(&one_arg(cursor, ctx, tester)).to_lowercase()),
        "ENCODE_FOR_URI" => Value::String(urlencoding::encode(&value_string_content(&one_arg(cursor, ctx, tester))).into_owned()),
        "CONCAT" => Value::String(parse_arg_list(cursor, ctx, tester).iter().map(value_string_content).collect()),
        "SUBSTR" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let s = args.first().map(value_string_content).unwrap_or_default();
            let chars: Vec<char> = s.chars().collect();
            let start = args.get(1).and_then(numeric_coerce).map(num_to_f64).unwrap_or(1.0) as i64;
            let start_idx = (start - 1).max(0) as usize;
            let len = args.get(2).and_then(numeric_coerce).map(num_to_f64);
            let end_idx = match len {
                Some(l) => (start_idx as i64 + (l.max(0.0) as i64)).clamp(start_idx as i64, chars.len() as i64) as usize,
                None => chars.len(),
            };
            if start_idx >= chars.len() {
                Value::String(String::new())
            } else {
                Value::String(chars[start_idx..end_idx].iter().collect())
            }
        }
        "CONTAINS" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let (a, b) = (args.first().map(value_string_content).unwrap_or_default(), args.get(1).map(value_string_content).unwrap_or_default());
            Value::Boolean(a.contains(&b))
        }
        "STRSTARTS" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let (a, b) = (args.first().map(value_string_content).unwrap_or_default(), args.get(1).map(value_string_content).unwrap_or_default());
            Value::Boolean(a.starts_with(&b))
        }
        "STRENDS" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let (a, b) = (args.first().map(value_string_content).unwrap_or_default(), args.get(1).map(value_string_content).unwrap_or_default());
            Value::Boolean(a.ends_with(&b))
        }
        "STRBEFORE" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let (a, b) = (args.first().map(value_string_content).unwrap_or_default(), args.get(1).map(value_string_content).unwrap_or_default());
            Value::String(a.find(&b).map(|i| a[..i].to_string()).unwrap_or_default())
        }
        "STRAFTER" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let (a, b) = (args.first().map(value_string_content).unwrap_or_default(), args.get(1).map(value_string_content).unwrap_or_default());
            Value::String(a.find(&b).map(|i| a[i + b.len()..].to_string()).unwrap_or_default())
        }
        "REPLACE" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let s = args.first().map(value_string_content).unwrap_or_default();
            let pattern = args.get(1).map(value_string_content).unwrap_or_default();
            let repl = args.get(2).map(value_string_content).unwrap_or_default();
            let flags = args.get(3).map(value_string_content).unwrap_or_default();
            match compile_regex(&pattern, &flags, ctx.config) {
                Some(re) => Value::String(re.replace_all(&s, repl.as_str()).into_owned()),
                None => Value::Unbound,
            }
        }
        "REGEX" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let s = args.first().map(value_string_content).unwrap_or_default();
            let pattern = args.get(1).map(value_string_content).unwrap_or_default();
            let flags = args.get(2).map(value_string_content).unwrap_or_default();
            match compile_regex(&pattern, &flags, ctx.config) {
                Some(re) => Value::Boolean(re.is_match(&s)),
                None => Value::Boolean(false),
            }
        }
        "LANGMATCHES" => {
            let args = parse_arg_list(cursor, ctx, tester);
            let tag = args.first().map(value_string_content).unwrap_or_default();
            let range = args.get(1).map(value_string_content).unwrap_or_default();
            let matched = if range == "*" {
                !tag.is_empty()
            } else {
                let tag_lc = tag.to_ascii_lowercase();
                let range_lc = range.to_ascii_lowercase();
                tag_lc == range_lc || tag_lc.starts_with(&format!("{range_lc}-"))
            };
            Value::Boolean(matched)
        }
        "ABS" => {
            let v = one_arg(cursor, ctx, tester);
            match v {
                Value::Integer(i) => Value::Integer(i.abs()),
                _ => match numeric_coerce(&v) {
                    Some(n) => Value::Double(num_to_f64(n).abs()),
                    None => Value::Unbound,
                },
            }
        }
        "ROUND" => numeric_to_integer(&one_arg(cursor, ctx, tester), f64::round),
        "CEIL" => numeric_to_integer(&one_arg(cursor, ctx, tester), f64::ceil),
        "FLOOR" => numeric_to_integer(&one_arg(cursor, ctx, tester), f64::floor),
        "YEAR" => date_field(&one_arg(cursor, ctx, tester), |p| Value::Integer(p.year)),
        "MONTH" => date_field(&one_arg(cursor, ctx, tester), |p| Value::Integer(p.month)),
        "DAY" => date_field(&one_arg(cursor, ctx, tester), |p| Value::Integer(p.day)),
        "HOURS" => date_field(&one_arg(cursor, ctx, tester), |p| Value::Integer(p.hour)),
        "MINUTES" => date_field(&one_arg(cursor, ctx, tester), |p| Value::Integer(p.minute)),
        "SECONDS" => date_field(&one_arg(cursor, ctx, tester), |p| Value::Double(p.second)),
        "TZ" => date_field(&one_arg(cursor, ctx, tester), |p| Value::String(tz_to_text(p.tz_minutes))),
        "MD5" => Value::String(hex_encode(<md5::Md5 as md5::Digest>::digest(value_string_content(&one_arg(cursor, ctx, tester)).as_bytes()))),
        "SHA1" => Value::String(hex_encode(<sha1::Sha1 as sha1::Digest>::digest(value_string_content(&one_arg(cursor, ctx, tester)).as_bytes()))),
        "SHA256" => Value::String(hex_encode(<sha2::Sha256 as sha2::Digest>::digest(value_string_content(&one_arg(cursor, ctx, tester)).as_bytes()))),
        "SHA384" => Value::String(hex_encode(<sha2::Sha384 as sha2::Digest>::digest(value_string_content(&one_arg(cursor, ctx, tester)).as_bytes()))),
        "SHA512" => Value::String(hex_encode(<sha2::Sha512 as sha2::Digest>::digest(value_string_content(&one_arg(cursor, ctx, tester)).as_bytes()))),
        "UUID" => {
            cursor.skip_whitespace();
            if cursor.peek() == b')' {
                cursor.advance();
            }
            Value::Uri(format!("<urn:uuid:{}>", uuid::Uuid::now_v7()))
        }
        "STRUUID" => {
            cursor.skip_whitespace();
            if cursor.peek() == b')' {
                cursor.advance();
            }
            Value::String(uuid::Uuid::now_v7().to_string())
        }
        "NOW" => {
            cursor.skip_whitespace();
            if cursor.peek() == b')' {
                cursor.advance();
            }
            Value::String(format!("\"{}\"^^<http://www.w3.org/2001/XMLSchema#dateTime>", now_iso8601()))
        }
        _ => {
            // Unknown builtin: drain the argument
            // list so the cursor stays in sync, then return Unbound.
            let _ = parse_arg_list(cursor, ctx, tester);
            Value::Unbound
        }
    }
}

fn date_field(v: &Value, f: impl Fn(&DateTimeParts) -> Value) -> Value {
    let content = value_string_content(v);
    match parse_datetime(&content) {
        Some(parts) => f(&parts),
        None => Value::Unbound,
    }
}

fn parse_value_term(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    cursor.skip_whitespace();
    match cursor.peek() {
        b'?' | b'$' => {
            cursor.advance();
            let name = parse_identifier(cursor);
            lookup_variable(ctx.bindings, name)
        }
        b'"' | b'\'' => Value::String(parse_literal_text(cursor)),
        b'<' => {
            let start = cursor.pos();
            cursor.advance();
            while cursor.peek() != b'>' && !cursor.is_at_end() {
                cursor.advance();
            }
            if cursor.peek() == b'>' {
                cursor.advance();
            }
            Value::Uri(cursor.source()[start as usize..cursor.pos() as usize].to_string())
        }
        b'0'..=b'9' => parse_numeric(cursor),
        b'+' | b'-' if cursor.peek_at(1).is_ascii_digit() || cursor.peek_at(1) == b'.' => parse_numeric(cursor),
        _ => {
            let name = parse_identifier(cursor);
            if name.eq_ignore_ascii_case("true") {
                return Value::Boolean(true);
            }
            if name.eq_ignore_ascii_case("false") {
                return Value::Boolean(false);
            }
            cursor.skip_whitespace();
            if cursor.peek() == b'(' {
                call_builtin(name, cursor, ctx, tester)
            } else {
                Value::Unbound
            }
        }
    }
}

fn parse_comparison(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    let left = parse_value_term(cursor, ctx, tester);
    cursor.skip_whitespace();
    if cursor.match_keyword("NOT") {
        let save = cursor.pos();
        cursor.consume_keyword("NOT").ok();
        cursor.skip_whitespace();
        if cursor.match_keyword("IN") {
            cursor.consume_keyword("IN").ok();
            cursor.skip_whitespace();
            let items = parse_arg_list_paren(cursor, ctx, tester);
            return Value::Boolean(!items.iter().any(|it| compare(CmpOp::Eq, &left, it)));
        }
        cursor.set_pos(save);
        return left;
    }
    if cursor.match_keyword("IN") {
        cursor.consume_keyword("IN").ok();
        cursor.skip_whitespace();
        let items = parse_arg_list_paren(cursor, ctx, tester);
        return Value::Boolean(items.iter().any(|it| compare(CmpOp::Eq, &left, it)));
    }
    for (op_str, op) in [("!=", CmpOp::Ne), ("<=", CmpOp::Le), (">=", CmpOp::Ge), ("=", CmpOp::Eq), ("<", CmpOp::Lt), (">", CmpOp::Gt)] {
        if cursor.match_operator(op_str) {
            cursor.consume_operator(op_str).ok();
            let right = parse_value_term(cursor, ctx, tester);
            return Value::Boolean(compare(op, &left, &right));
        }
    }
    left
}

fn parse_arg_list_paren(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Vec<Value> {
    cursor.skip_whitespace();
    if cursor.peek() == b'(' {
        cursor.advance();
    }
    parse_arg_list(cursor, ctx, tester)
}

fn parse_primary(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    cursor.skip_whitespace();
    if cursor.peek() == b'(' {
        cursor.advance();
        let v = parse_or(cursor, ctx, tester);
        cursor.skip_whitespace();
        if cursor.peek() == b')' {
            cursor.advance();
        }
        return v;
    }
    if cursor.match_keyword("EXISTS") {
        cursor.consume_keyword("EXISTS").ok();
        cursor.skip_whitespace();
        return Value::Boolean(eval_exists_block(cursor, tester));
    }
    parse_comparison(cursor, ctx, tester)
}

fn parse_unary(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    cursor.skip_whitespace();
    if cursor.peek() == b'!' && cursor.peek_at(1) != b'=' {
        cursor.advance();
        let v = parse_unary(cursor, ctx, tester);
        return Value::Boolean(!ebv(&v));
    }
    if cursor.match_keyword("NOT") {
        let save = cursor.pos();
        cursor.consume_keyword("NOT").ok();
        cursor.skip_whitespace();
        if cursor.match_keyword("EXISTS") {
            cursor.consume_keyword("EXISTS").ok();
            cursor.skip_whitespace();
            return Value::Boolean(!eval_exists_block(cursor, tester));
        }
        // "NOT" before anything but IN/EXISTS is invalid at this position;
        // restore and let the comparison-level `NOT IN` handler (or a
        // plain identifier lookup, which yields Unbound) see it.
        cursor.set_pos(save);
    }
    parse_primary(cursor, ctx, tester)
}

fn parse_and(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    let first = parse_unary(cursor, ctx, tester);
    cursor.skip_whitespace();
    if !(cursor.match_operator("&&") || cursor.match_keyword("AND")) {
        return first;
    }
    let mut truth = ebv(&first);
    loop {
        cursor.skip_whitespace();
        if cursor.match_operator("&&") {
            cursor.consume_operator("&&").ok();
        } else if cursor.match_keyword("AND") {
            cursor.consume_keyword("AND").ok();
        } else {
            break;
        }
        let next = parse_unary(cursor, ctx, tester);
        truth = truth && ebv(&next);
    }
    Value::Boolean(truth)
}

fn parse_or(cursor: &mut Cursor, ctx: &EvalCtx, tester: &dyn ExistsTester) -> Value {
    let first = parse_and(cursor, ctx, tester);
    cursor.skip_whitespace();
    if !(cursor.match_operator("||") || cursor.match_keyword("OR")) {
        return first;
    }
    let mut truth = ebv(&first);
    loop {
        cursor.skip_whitespace();
        if cursor.match_operator("||") {
            cursor.consume_operator("||").ok();
        } else if cursor.match_keyword("OR") {
            cursor.consume_keyword("OR").ok();
        } else {
            break;
        }
        let next = parse_and(cursor, ctx, tester);
        truth = truth || ebv(&next);
    }
    Value::Boolean(truth)
}

/// Evaluates one `FILTER` body to its EBV.
pub fn evaluate_filter(expr: Span, source: &str, bindings: &BindingTable, config: &ExecutorConfig, tester: &dyn ExistsTester) -> bool {
    let text = expr.resolve(source);
    let mut cursor = Cursor::new(text);
    let ctx = EvalCtx { bindings, config };
    let v = parse_or(&mut cursor, &ctx, tester);
    ebv(&v)
}

// --- BindExpressionEvaluator: additive/multiplicative
// arithmetic, negation, variable lookup, literals, and {STR, STRLEN,
// UCASE, LCASE}. Division by zero yields Unbound. ---

fn arith_binop(op: u8, l: Value, r: Value) -> Value {
    let (ln, rn) = match (numeric_coerce(&l), numeric_coerce(&r)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Value::Unbound,
    };
    if let (Num::Int(a), Num::Int(b)) = (ln, rn) {
        if op != b'/' {
            return match op {
                b'+' => Value::Integer(a + b),
                b'-' => Value::Integer(a - b),
                b'*' => Value::Integer(a * b),
                _ => unreachable!(),
            };
        }
    }
    let (a, b) = (num_to_f64(ln), num_to_f64(rn));
    match op {
        b'+' => Value::Double(a + b),
        b'-' => Value::Double(a - b),
        b'*' => Value::Double(a * b),
        b'/' => {
            if b == 0.0 {
                Value::Unbound
            } else {
                Value::Double(a / b)
            }
        }
        _ => Value::Unbound,
    }
}

fn arith_neg(v: Value) -> Value {
    match v {
        Value::Integer(i) => Value::Integer(-i),
        _ => match numeric_coerce(&v) {
            Some(n) => Value::Double(-num_to_f64(n)),
            None => Value::Unbound,
        },
    }
}

fn parse_bind_atom(cursor: &mut Cursor, bindings: &BindingTable) -> Value {
    cursor.skip_whitespace();
    match cursor.peek() {
        b'(' => {
            cursor.advance();
            let v = parse_bind_add(cursor, bindings);
            cursor.skip_whitespace();
            if cursor.peek() == b')' {
                cursor.advance();
            }
            v
        }
        b'?' | b'$' => {
            cursor.advance();
            lookup_variable(bindings, parse_identifier(cursor))
        }
        b'"' | b'\'' => Value::String(parse_literal_text(cursor)),
        b'0'..=b'9' => parse_numeric(cursor),
        _ => {
            let name = parse_identifier(cursor);
            cursor.skip_whitespace();
            if cursor.peek() == b'(' {
                cursor.advance();
                let arg = parse_bind_add(cursor, bindings);
                cursor.skip_whitespace();
                if cursor.peek() == b')' {
                    cursor.advance();
                }
                match name.to_ascii_uppercase().as_str() {
                    "STR" => Value::String(value_string_content(&arg)),
                    "STRLEN" => Value::Integer(value_string_content(&arg).chars().count() as i64),
                    "UCASE" => Value::String(value_string_content(&arg).to_uppercase()),
                    "LCASE" => Value::String(value_string_content(&arg).to_lowercase()),
                    _ => Value::Unbound,
                }
            } else {
                Value::Unbound
            }
        }
    }
}

fn parse_bind_unary(cursor: &mut Cursor, bindings: &BindingTable) -> Value {
    cursor.skip_whitespace();
    if cursor.peek() == b'-' {
        cursor.advance();
        return arith_neg(parse_bind_unary(cursor, bindings));
    }
    if cursor.peek() == b'+' {
        cursor.advance();
        return parse_bind_unary(cursor, bindings);
    }
    parse_bind_atom(cursor, bindings)
}

fn parse_bind_mul(cursor: &mut Cursor, bindings: &BindingTable) -> Value {
    let mut acc = parse_bind_unary(cursor, bindings);
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            b'*' => {
                cursor.advance();
                acc = arith_binop(b'*', acc, parse_bind_unary(cursor, bindings));
            }
            b'/' => {
                cursor.advance();
                acc = arith_binop(b'/', acc, parse_bind_unary(cursor, bindings));
            }
            _ => break,
        }
    }
    acc
}

fn parse_bind_add(cursor: &mut Cursor, bindings: &BindingTable) -> Value {
    let mut acc = parse_bind_mul(cursor, bindings);
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            b'+' => {
                cursor.advance();
                acc = arith_binop(b'+', acc, parse_bind_mul(cursor, bindings));
            }
            b'-' => {
                cursor.advance();
                acc = arith_binop(b'-', acc, parse_bind_mul(cursor, bindings));
            }
            _ => break,
        }
    }
    acc
}

/// Evaluates a `BIND (expr AS ?var)` body.
pub fn evaluate_bind(expr: Span, source: &str, bindings: &BindingTable) -> Value {
    let text = expr.resolve(source);
    let mut cursor = Cursor::new(text);
    parse_bind_add(&mut cursor, bindings)
}
