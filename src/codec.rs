//! Canonical JSON wire form.
//!
//! Field order is `id, code, name, message, meta, stacktrace, cause`. Empty
//! strings, a zero code and empty metadata are left out; the stacktrace is
//! always written. Both directions walk the cause chain with a loop, so
//! chains of any depth encode and decode without growing the stack.
//!
//! [`decode`] splits the nested payload into one object per level and hands
//! each of them to `serde_json`. The `serde` impls of [`StructuredError`]
//! carry the same canonical text as a `serde_json` raw value.

use std::fmt::Write;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::error::DecodeError;
use crate::meta::Meta;
use crate::stacktrace::Stacktrace;
use crate::structured::StructuredError;

pub fn encode(err: &StructuredError) -> Vec<u8> {
    encode_to_string(err).into_bytes()
}

pub fn encode_to_string(err: &StructuredError) -> String {
    let mut out = String::with_capacity(256);
    let mut open = 0usize;
    for level in err.chain() {
        if open > 0 {
            // the stacktrace is always written, so a field precedes `cause`
            out.push_str(",\"cause\":");
        }
        out.push('{');
        write_level(&mut out, level);
        open += 1;
    }
    for _ in 0..open {
        out.push('}');
    }
    out
}

fn write_level(out: &mut String, level: &StructuredError) {
    let mut fields = Fields { out, first: true };
    if !level.id().is_empty() {
        fields.key("id");
        push_json_str(fields.out, level.id());
    }
    if level.code() != 0 {
        fields.key("code");
        let _ = write!(fields.out, "{}", level.code());
    }
    if !level.name().is_empty() {
        fields.key("name");
        push_json_str(fields.out, level.name());
    }
    if !level.message().is_empty() {
        fields.key("message");
        push_json_str(fields.out, level.message());
    }
    if !level.meta().is_empty() {
        fields.key("meta");
        write_meta(fields.out, level.meta());
    }
    fields.key("stacktrace");
    write_stacktrace(fields.out, level.stacktrace());
}

struct Fields<'a> {
    out: &'a mut String,
    first: bool,
}

impl Fields<'_> {
    fn key(&mut self, name: &str) {
        if !self.first {
            self.out.push(',');
        }
        self.first = false;
        push_json_str(self.out, name);
        self.out.push(':');
    }
}

fn write_meta(out: &mut String, meta: &Meta) {
    out.push('[');
    for (i, (key, value)) in meta.pairs().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str("{\"key\":");
        push_json_str(out, key);
        out.push_str(",\"value\":");
        push_json_str(out, value);
        out.push('}');
    }
    out.push(']');
}

fn write_stacktrace(out: &mut String, stacktrace: &Stacktrace) {
    out.push_str("{\"fn\":");
    push_json_str(out, &stacktrace.function);
    out.push_str(",\"file\":");
    push_json_str(out, &stacktrace.file);
    let _ = write!(out, ",\"line\":{}}}", stacktrace.line);
}

fn push_json_str(out: &mut String, value: &str) {
    let _ = write!(out, "{}", serde_json::Value::from(value));
}

pub fn decode(bytes: &[u8]) -> Result<StructuredError, DecodeError> {
    let result = decode_object(bytes);
    if let Err(err) = &result {
        tracing::debug!(error = %err, len = bytes.len(), "structured error decode failed");
    }
    result
}

fn decode_object(bytes: &[u8]) -> Result<StructuredError, DecodeError> {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => {
            let levels = split_levels(bytes)?;
            let mut chain: Option<Box<StructuredError>> = None;
            for raw in levels.iter().rev() {
                let mut level = serde_json::from_slice::<WireLevel>(raw)?.into_error();
                level.cause = chain;
                chain = Some(Box::new(level));
            }
            chain
                .map(|head| *head)
                .ok_or_else(|| malformed("EOF while parsing an object"))
        }
        first => {
            serde_json::from_slice::<serde::de::IgnoredAny>(bytes)?;
            Err(DecodeError::NotAnObject {
                found: first.map_or("nothing", |b| json_type_name(*b)),
            })
        }
    }
}

/// The fields of one level; `cause` is handled by [`split_levels`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct WireLevel {
    id: String,
    code: i32,
    name: String,
    message: String,
    meta: Meta,
    stacktrace: Stacktrace,
}

impl WireLevel {
    fn into_error(self) -> StructuredError {
        StructuredError {
            id: self.id,
            code: self.code,
            name: self.name,
            message: self.message,
            meta: self.meta,
            stacktrace: self.stacktrace,
            cause: None,
        }
    }
}

struct LevelFrame {
    index: usize,
    depth: usize,
    expect_key: bool,
    cause_key: bool,
    has_cause: bool,
}

/// Splits a nested payload into standalone objects, outermost level first.
///
/// Each nested `cause` object is cut out of its parent and replaced by
/// `null`. Only object and string boundaries are tracked here; everything
/// else is validated when the levels are parsed.
fn split_levels(bytes: &[u8]) -> Result<Vec<Vec<u8>>, DecodeError> {
    let mut levels: Vec<Vec<u8>> = Vec::new();
    let mut stack: Vec<LevelFrame> = Vec::new();
    let mut i = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());

    while i < bytes.len() {
        let b = bytes[i];
        let Some(top) = stack.last_mut() else {
            if b != b'{' {
                return Err(malformed("expected `{` to start a level"));
            }
            levels.push(vec![b'{']);
            stack.push(LevelFrame::open(levels.len() - 1));
            i += 1;
            continue;
        };
        let buf = &mut levels[top.index];
        match b {
            b'"' => {
                let end = string_end(bytes, i)?;
                let token = &bytes[i..=end];
                if top.depth == 1 && top.expect_key {
                    top.cause_key = token == b"\"cause\"";
                    top.expect_key = false;
                }
                buf.extend_from_slice(token);
                i = end + 1;
                continue;
            }
            b':' if top.depth == 1 && top.cause_key => {
                top.cause_key = false;
                buf.push(b':');
                let next = bytes[i + 1..]
                    .iter()
                    .position(|b| !b.is_ascii_whitespace())
                    .map_or(bytes.len(), |offset| i + 1 + offset);
                match bytes.get(next) {
                    Some(b'{') => {
                        if top.has_cause {
                            return Err(malformed("duplicate field `cause`"));
                        }
                        top.has_cause = true;
                        buf.extend_from_slice(b"null");
                        levels.push(vec![b'{']);
                        stack.push(LevelFrame::open(levels.len() - 1));
                        i = next + 1;
                        continue;
                    }
                    Some(b'n') => {}
                    _ => return Err(malformed("invalid type for `cause`, expected an object")),
                }
            }
            b'{' | b'[' => {
                top.depth += 1;
                buf.push(b);
            }
            b'}' | b']' => {
                top.depth -= 1;
                buf.push(b);
                if top.depth == 0 {
                    stack.pop();
                    if stack.is_empty() {
                        let rest = &bytes[i + 1..];
                        if !rest.iter().all(u8::is_ascii_whitespace) {
                            return Err(malformed("trailing characters"));
                        }
                        return Ok(levels);
                    }
                }
            }
            b',' => {
                if top.depth == 1 {
                    top.expect_key = true;
                }
                buf.push(b);
            }
            _ => buf.push(b),
        }
        i += 1;
    }
    Err(malformed("EOF while parsing an object"))
}

impl LevelFrame {
    fn open(index: usize) -> Self {
        Self {
            index,
            depth: 1,
            expect_key: true,
            cause_key: false,
            has_cause: false,
        }
    }
}

/// Index of the quote closing the string that starts at `start`.
fn string_end(bytes: &[u8], start: usize) -> Result<usize, DecodeError> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Ok(i),
            _ => i += 1,
        }
    }
    Err(malformed("EOF while parsing a string"))
}

fn malformed(msg: &str) -> DecodeError {
    DecodeError::Json(serde_json::Error::custom(msg))
}

pub fn decode_str(json: &str) -> Result<StructuredError, DecodeError> {
    decode(json.as_bytes())
}

/// [`decode`], with a failure turned into the warning that describes it.
#[track_caller]
pub fn decode_or_warning(bytes: &[u8]) -> StructuredError {
    match decode(bytes) {
        Ok(err) => err,
        Err(err) => StructuredError::from(err),
    }
}

fn json_type_name(first: u8) -> &'static str {
    match first {
        b'[' => "an array",
        b'"' => "a string",
        b't' | b'f' => "a boolean",
        b'n' => "null",
        _ => "a number",
    }
}

impl StructuredError {
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode(bytes)
    }
}

/// Writes the canonical text of [`encode`] as a `serde_json` raw value, so
/// `serde_json::to_vec` gives the same bytes for chains of any depth.
impl Serialize for StructuredError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(encode_to_string(self))
            .map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

/// Reads the payload as a `serde_json` raw value and runs [`decode`] on it.
impl<'de> Deserialize<'de> for StructuredError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        decode_str(raw.get()).map_err(D::Error::custom)
    }
}
