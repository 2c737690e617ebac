//! Reader for PHP's native `serialize()` format
//!
//! Horde stores preference values as serialized PHP arrays. Values are read
//! into `serde_json::Value`: arrays whose keys are `0..n` in order become JSON
//! arrays, every other array or object becomes a JSON object with the keys in
//! stored order.

use std::str::{self, FromStr};

use nom::{
    bytes::complete::{take, take_till, take_while},
    character::complete::char,
    combinator::map,
    error::{ErrorKind, ParseError},
    number::complete::be_u8,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use serde_json::{Map, Number, Value};

use super::{PrefsError, PrefsResult};

/// Deepest array nesting accepted; rule lists need three levels
pub const MAX_DEPTH: usize = 256;

/// Parse a complete serialized value; trailing bytes other than whitespace
/// are an error
pub fn unserialize(input: &[u8]) -> PrefsResult<Value> {
    match document(input) {
        Ok((rest, value)) if rest.is_empty() => Ok(value),
        Ok((rest, _)) => {
            let trailing = SyntaxError::new(rest, Problem::Invalid("unexpected trailing data"));
            Err(trailing.into_prefs_error(input))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e.into_prefs_error(input)),
        Err(nom::Err::Incomplete(_)) => {
            let end = SyntaxError::new(&input[input.len()..], Problem::Parser(ErrorKind::Eof));
            Err(end.into_prefs_error(input))
        }
    }
}

type PResult<'a, T> = IResult<&'a [u8], T, SyntaxError<'a>>;

#[derive(Debug)]
enum Problem {
    Expected(char),
    Invalid(&'static str),
    UnknownTag(u8),
    Reference,
    Parser(ErrorKind),
}

/// Parse failure pointing at the remaining input
#[derive(Debug)]
struct SyntaxError<'a> {
    input: &'a [u8],
    problem: Problem,
}

impl<'a> SyntaxError<'a> {
    fn new(input: &'a [u8], problem: Problem) -> Self {
        Self { input, problem }
    }

    fn into_prefs_error(self, whole: &[u8]) -> PrefsError {
        let offset = whole.len() - self.input.len();
        let message = match self.problem {
            Problem::Reference => return PrefsError::Unsupported("PHP references".to_string()),
            _ if self.input.is_empty() => "unexpected end of input".to_string(),
            Problem::Expected(c) => format!("expected '{}'", c),
            Problem::Invalid(message) => message.to_string(),
            Problem::UnknownTag(tag) => format!("unknown type tag '{}'", tag as char),
            Problem::Parser(kind) => kind.description().to_lowercase(),
        };
        PrefsError::Syntax { offset, message }
    }
}

impl<'a> ParseError<&'a [u8]> for SyntaxError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self::new(input, Problem::Parser(kind))
    }

    fn append(_: &'a [u8], _: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a [u8], c: char) -> Self {
        Self::new(input, Problem::Expected(c))
    }
}

fn reject(input: &[u8], problem: Problem) -> nom::Err<SyntaxError<'_>> {
    nom::Err::Error(SyntaxError::new(input, problem))
}

// ==================== PRIMITIVE PARSERS ====================

fn expect<'a>(c: char) -> impl FnMut(&'a [u8]) -> PResult<'a, char> {
    char(c)
}

fn type_tag(i: &[u8]) -> PResult<'_, u8> {
    be_u8(i)
}

fn padding(i: &[u8]) -> PResult<'_, &[u8]> {
    take_while(|b: u8| b.is_ascii_whitespace() || b == 0)(i)
}

/// Bytes up to `delimiter`, consuming the delimiter
fn field<'a>(delimiter: u8) -> impl FnMut(&'a [u8]) -> PResult<'a, &'a [u8]> {
    terminated(take_till(move |b| b == delimiter), char(delimiter as char))
}

fn number<'a, T: FromStr>(
    delimiter: u8,
    message: &'static str,
) -> impl FnMut(&'a [u8]) -> PResult<'a, T> {
    move |i: &'a [u8]| {
        let (rest, digits) = field(delimiter)(i)?;
        str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .map(|n| (rest, n))
            .ok_or_else(|| reject(i, Problem::Invalid(message)))
    }
}

/// `len` raw bytes; PHP string lengths count bytes, not characters
fn exactly<'a>(len: usize) -> impl FnMut(&'a [u8]) -> PResult<'a, &'a [u8]> {
    move |i: &'a [u8]| {
        if i.len() < len {
            return Err(reject(i, Problem::Invalid("string length runs past the end of input")));
        }
        take(len)(i)
    }
}

// ==================== VALUE PARSERS ====================

fn document(i: &[u8]) -> PResult<'_, Value> {
    let (i, item) = value(i, 0)?;
    let (i, _) = padding(i)?;
    Ok((i, item))
}

fn value(i: &[u8], depth: usize) -> PResult<'_, Value> {
    if depth > MAX_DEPTH {
        return Err(reject(i, Problem::Invalid("arrays nested too deeply")));
    }

    let (rest, tag) = type_tag(i)?;
    match tag {
        b'N' => map(expect(';'), |_| Value::Null)(rest),
        b'b' => preceded(expect(':'), boolean)(rest),
        b'i' => map(preceded(expect(':'), number(b';', "invalid integer")), |n: i64| {
            Value::from(n)
        })(rest),
        // INF and NAN have no JSON form
        b'd' => map(preceded(expect(':'), number(b';', "invalid float")), |n: f64| {
            Number::from_f64(n).map_or(Value::Null, Value::Number)
        })(rest),
        b's' => map(preceded(expect(':'), string), Value::String)(rest),
        b'a' => {
            let (rest, _) = expect(':')(rest)?;
            array(rest, depth)
        }
        b'O' => {
            let (rest, _) = expect(':')(rest)?;
            object(rest, depth)
        }
        b'r' | b'R' => Err(reject(i, Problem::Reference)),
        other => Err(reject(i, Problem::UnknownTag(other))),
    }
}

fn boolean(i: &[u8]) -> PResult<'_, Value> {
    let (rest, flag) = field(b';')(i)?;
    match flag {
        b"0" => Ok((rest, Value::Bool(false))),
        b"1" => Ok((rest, Value::Bool(true))),
        _ => Err(reject(i, Problem::Invalid("invalid boolean"))),
    }
}

/// `<len>:"<bytes>";` after the `s:` prefix
fn string(i: &[u8]) -> PResult<'_, String> {
    terminated(string_body, expect(';'))(i)
}

fn string_body(i: &[u8]) -> PResult<'_, String> {
    let (i, len): (&[u8], usize) = number(b':', "invalid string length")(i)?;
    let (i, bytes) = delimited(expect('"'), exactly(len), expect('"'))(i)?;
    Ok((i, String::from_utf8_lossy(bytes).into_owned()))
}

fn key(i: &[u8]) -> PResult<'_, String> {
    let (rest, tag) = type_tag(i)?;
    match tag {
        b'i' => map(preceded(expect(':'), number(b';', "invalid integer")), |n: i64| {
            n.to_string()
        })(rest),
        b's' => preceded(expect(':'), string)(rest),
        _ => Err(reject(i, Problem::Invalid("array keys must be integers or strings"))),
    }
}

/// `<count>:{<key><value>...}` after the `a:` prefix
fn array(i: &[u8], depth: usize) -> PResult<'_, Value> {
    let (i, count): (&[u8], usize) = number(b':', "invalid array length")(i)?;
    let (mut i, _) = expect('{')(i)?;

    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let (rest, name) = key(i)?;
        let (rest, item) = value(rest, depth + 1)?;
        entries.push((name, item));
        i = rest;
    }
    let (i, _) = expect('}')(i)?;

    let sequential = entries
        .iter()
        .enumerate()
        .all(|(n, (name, _))| *name == n.to_string());
    let array = if sequential {
        Value::Array(entries.into_iter().map(|(_, item)| item).collect())
    } else {
        let mut map = Map::with_capacity(entries.len());
        for (name, item) in entries {
            map.insert(name, item);
        }
        Value::Object(map)
    };
    Ok((i, array))
}

/// `<len>:"<class>":<count>:{...}` after the `O:` prefix; properties are
/// read like an associative array
fn object(i: &[u8], depth: usize) -> PResult<'_, Value> {
    let (i, _class) = terminated(string_body, expect(':'))(i)?;
    let (i, properties) = array(i, depth)?;
    let properties = match properties {
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(n, item)| (n.to_string(), item))
                .collect(),
        ),
        other => other,
    };
    Ok((i, properties))
}
