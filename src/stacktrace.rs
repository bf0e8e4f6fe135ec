use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};

use crate::config::{self, Config};

pub const UNKNOWN: &str = "unknown";

/// Symbol prefixes of frames that belong to the capture machinery itself.
const CAPTURE_FRAME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "<std::",
    "<core::",
    "<alloc::",
    "structured_error::stacktrace::Stacktrace::",
    "structured_error::stacktrace::symbolized_frames",
];

/// The call site an error was constructed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stacktrace {
    #[serde(rename = "fn", default)]
    pub function: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

impl Stacktrace {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Sentinel used when the call site cannot be resolved.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, 0)
    }

    pub fn is_unknown(&self) -> bool {
        self.function == UNKNOWN && self.file == UNKNOWN && self.line == 0
    }

    /// Captures the caller's location.
    ///
    /// Wrappers marked `#[track_caller]` are transparent, so the frame
    /// recorded is the first one outside such a chain.
    #[track_caller]
    pub fn capture() -> Self {
        Self::from_location(Location::caller(), config::get())
    }

    pub fn from_location(location: &Location<'_>, config: &Config) -> Self {
        let function = if config.resolve_functions {
            resolve_function(location.file(), location.line())
        } else {
            None
        };
        Self {
            function: function.unwrap_or_else(|| UNKNOWN.to_string()),
            file: normalize_path(location.file(), &config.source_roots),
            line: location.line(),
        }
    }

    /// Captures the frame `skip` levels above the caller from a symbolized
    /// backtrace. `capture_skip(0)` is the caller itself.
    ///
    /// Needs debug info; without it the sentinel is returned.
    #[inline(never)]
    pub fn capture_skip(skip: usize) -> Self {
        let config = config::get();
        let frames = symbolized_frames();
        let Some(first) = frames.iter().position(|f| !is_capture_frame(&f.symbol)) else {
            return Self::unknown();
        };
        match frames.get(first + skip) {
            Some(Frame {
                symbol,
                file: Some(file),
                line: Some(line),
            }) => Self {
                function: symbol.clone(),
                file: normalize_path(file, &config.source_roots),
                line: *line,
            },
            _ => Self::unknown(),
        }
    }
}

impl Default for Stacktrace {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Stacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.function, self.file, self.line)
    }
}

/// Strips the first matching source root, or failing that a toolchain
/// prefix (cargo registry, git checkouts, rustc sources), from `file`.
/// Paths that match neither are returned with separators normalized.
pub fn normalize_path(file: &str, roots: &[String]) -> String {
    let file = file.replace('\\', "/");

    for root in roots {
        let root = root.replace('\\', "/");
        let root = root.trim_end_matches('/');
        if root.is_empty() {
            continue;
        }
        if let Some(rest) = file.strip_prefix(root)
            && let Some(rest) = rest.strip_prefix('/')
            && !rest.is_empty()
        {
            return rest.to_string();
        }
    }

    match strip_toolchain_prefix(&file) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => file,
    }
}

fn strip_toolchain_prefix(file: &str) -> Option<&str> {
    const REGISTRY: &str = "/registry/src/";
    const CHECKOUTS: &str = "/git/checkouts/";

    if let Some(idx) = file.find(REGISTRY) {
        // drop the registry index directory, keep `<crate>-<version>/...`
        let rest = &file[idx + REGISTRY.len()..];
        return rest.split_once('/').map(|(_, tail)| tail);
    }
    if let Some(idx) = file.find(CHECKOUTS) {
        return Some(&file[idx + CHECKOUTS.len()..]);
    }
    if let Some(rest) = file.strip_prefix("/rustc/") {
        return rest.split_once('/').map(|(_, tail)| tail);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    symbol: String,
    file: Option<String>,
    line: Option<u32>,
}

fn is_capture_frame(symbol: &str) -> bool {
    CAPTURE_FRAME_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

fn resolve_function(file: &str, line: u32) -> Option<String> {
    let file = file.replace('\\', "/");
    let suffix = format!("/{file}");
    let found = symbolized_frames().into_iter().find(|frame| {
        frame.line == Some(line)
            && frame
                .file
                .as_deref()
                .is_some_and(|f| f == file || f.ends_with(&suffix))
    });
    if found.is_none() {
        tracing::trace!(file = %file, line, "no backtrace frame matched call site");
    }
    found.map(|frame| frame.symbol)
}

fn symbolized_frames() -> Vec<Frame> {
    let backtrace = std::backtrace::Backtrace::force_capture();
    parse_frames(&backtrace.to_string())
}

/// Parses the textual form of `std::backtrace::Backtrace`:
///
/// ```text
///    0: crate::module::function
///              at /path/to/file.rs:12:5
/// ```
fn parse_frames(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut()
                && frame.file.is_none()
                && let Some((file, line_no)) = parse_location(location)
            {
                frame.file = Some(file.replace('\\', "/"));
                frame.line = Some(line_no);
            }
            continue;
        }
        if let Some((index, symbol)) = line.split_once(": ")
            && !index.is_empty()
            && index.bytes().all(|b| b.is_ascii_digit())
        {
            frames.push(Frame {
                symbol: strip_symbol_hash(symbol.trim()).to_string(),
                file: None,
                line: None,
            });
        }
    }
    frames
}

/// `path:line:column`, where the path itself may contain `:`.
fn parse_location(location: &str) -> Option<(&str, u32)> {
    let mut parts = location.rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some((file, line))
}

fn strip_symbol_hash(symbol: &str) -> &str {
    if let Some((head, hash)) = symbol.rsplit_once("::h")
        && hash.len() == 16
        && hash.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return head;
    }
    symbol
}
