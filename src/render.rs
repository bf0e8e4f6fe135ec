use std::fmt::{self, Write};

use crate::structured::StructuredError;

const META_INDENT: &str = "          ";
const CAUSE_LEAD: &str = "CAUSE   = ";
const CAUSE_CONTINUATION: &str = "        = ";
const BLOCK_SEPARATOR: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Message only, safe for end users.
    #[default]
    Compact,
    /// Every field plus the cause messages, for logs.
    Detailed,
}

impl StructuredError {
    pub fn format(&self, mode: RenderMode) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = match mode {
            RenderMode::Compact => out.write_str(self.message()),
            RenderMode::Detailed => self.write_detailed(&mut out),
        };
        out
    }

    /// Every level of the chain as a full detailed block, separated by `---`.
    pub fn render_chain(&self) -> String {
        let mut out = String::new();
        for (i, level) in self.chain().enumerate() {
            if i > 0 {
                out.push('\n');
                out.push_str(BLOCK_SEPARATOR);
                out.push('\n');
            }
            let _ = level.write_block(&mut out);
        }
        out
    }

    fn write_detailed<W: Write>(&self, out: &mut W) -> fmt::Result {
        self.write_block(out)?;
        for (i, cause) in self.causes().enumerate() {
            let lead = if i == 0 { CAUSE_LEAD } else { CAUSE_CONTINUATION };
            write!(out, "\n{lead}{}", cause.message())?;
        }
        Ok(())
    }

    fn write_block<W: Write>(&self, out: &mut W) -> fmt::Result {
        if !self.id().is_empty() {
            writeln!(out, "ID      = [{}]", self.id())?;
        }
        writeln!(out, "CN      = [{}][{}]", self.code(), self.name())?;
        writeln!(out, "MESSAGE = {}", self.message())?;
        for (i, (key, values)) in self.meta().iter().enumerate() {
            let lead = if i == 0 { "META    = " } else { META_INDENT };
            writeln!(out, "{lead}{key} : {}", values.join(", "))?;
        }
        write!(out, "STACK   = {}", self.stacktrace())
    }
}

/// `{}` renders the message, `{:#}` the detailed block.
impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.write_detailed(f)
        } else {
            f.write_str(self.message())
        }
    }
}

impl fmt::Debug for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let causes: Vec<&str> = self.causes().map(StructuredError::message).collect();
        f.debug_struct("StructuredError")
            .field("id", &self.id())
            .field("code", &self.code())
            .field("name", &self.name())
            .field("message", &self.message())
            .field("meta", self.meta())
            .field("stacktrace", self.stacktrace())
            .field("causes", &causes)
            .finish()
    }
}
