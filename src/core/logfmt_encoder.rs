//! Logfmt (key=value) encoder
//!
//! Example: `ts=2025-01-08T10:30:45.000Z level=info msg="Request processed" user=jane latency=1500`
//!
//! Nested objects are flattened with dotted keys (`http.status=200`), arrays
//! render as `[a,b]`. With the `console` feature the level can be colored for
//! terminals.

use super::encoder::{ArrayEncoder, ArrayMarshaler, Encoder, ObjectEncoder, ObjectMarshaler};
use super::entry::Entry;
use super::error::Result;
use super::field::Field;
use super::pool::Buffer;
use std::io::Write;

#[derive(Debug, Default, Clone)]
pub struct LogfmtEncoder {
    buf: Buffer,
    prefix: String,
    colored: bool,
}

impl LogfmtEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color the level name (only effective with the `console` feature)
    #[must_use]
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Rendered context pairs
    pub fn context(&self) -> &str {
        self.buf.as_str().trim_start()
    }

    fn scoped(&self, key: &str) -> Self {
        let mut prefix = String::with_capacity(self.prefix.len() + key.len() + 1);
        prefix.push_str(&self.prefix);
        push_key(&mut prefix, key);
        prefix.push('.');
        Self {
            buf: Buffer::get(),
            prefix,
            colored: false,
        }
    }

    fn add_key(&mut self, key: &str) {
        self.buf.push(b' ');
        self.buf.extend_from_slice(self.prefix.as_bytes());
        let mut clean = String::with_capacity(key.len());
        push_key(&mut clean, key);
        self.buf.extend_from_slice(clean.as_bytes());
        self.buf.push(b'=');
    }

    #[cfg(feature = "console")]
    fn write_level(&mut self, entry: &Entry) {
        use colored::Colorize;
        if self.colored {
            let painted = entry.level.to_str().color(entry.level.color_code());
            let _ = write!(self.buf, "{}", painted);
        } else {
            self.buf.extend_from_slice(entry.level.to_str().as_bytes());
        }
    }

    #[cfg(not(feature = "console"))]
    fn write_level(&mut self, entry: &Entry) {
        self.buf.extend_from_slice(entry.level.to_str().as_bytes());
    }
}

/// Keys keep alphanumerics plus `_`, `-` and `.`
fn push_key(out: &mut String, key: &str) {
    out.extend(
        key.chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
    );
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c == ' ' || c == '"' || c == '=' || c == '\\' || c.is_control())
}

fn write_value(buf: &mut Vec<u8>, value: &str) {
    if needs_quotes(value) {
        write_quoted(buf, value);
    } else {
        buf.extend_from_slice(value.as_bytes());
    }
}

fn write_quoted(buf: &mut Vec<u8>, value: &str) {
    buf.push(b'"');
    for c in value.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if c.is_control() => {
                let _ = write!(buf, "\\u{{{:04x}}}", c as u32);
            }
            c => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

fn write_float(buf: &mut Vec<u8>, value: f64) {
    if value.is_nan() {
        buf.extend_from_slice(b"NaN");
    } else if value.is_infinite() {
        let text: &[u8] = if value > 0.0 { b"+Inf" } else { b"-Inf" };
        buf.extend_from_slice(text);
    } else {
        let mut fmt = ryu::Buffer::new();
        buf.extend_from_slice(fmt.format_finite(value).as_bytes());
    }
}

fn write_reflected(buf: &mut Vec<u8>, value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::String(s) => write_value(buf, s),
        other => {
            let rendered = serde_json::to_string(other)?;
            write_value(buf, &rendered);
        }
    }
    Ok(())
}

impl ObjectEncoder for LogfmtEncoder {
    fn add_bool(&mut self, key: &str, value: bool) {
        self.add_key(key);
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(text);
    }

    fn add_int64(&mut self, key: &str, value: i64) {
        self.add_key(key);
        let mut fmt = itoa::Buffer::new();
        self.buf.extend_from_slice(fmt.format(value).as_bytes());
    }

    fn add_uint64(&mut self, key: &str, value: u64) {
        self.add_key(key);
        let mut fmt = itoa::Buffer::new();
        self.buf.extend_from_slice(fmt.format(value).as_bytes());
    }

    fn add_float64(&mut self, key: &str, value: f64) {
        self.add_key(key);
        write_float(&mut self.buf, value);
    }

    fn add_string(&mut self, key: &str, value: &str) {
        self.add_key(key);
        write_value(&mut self.buf, value);
    }

    fn add_object(&mut self, key: &str, marshaler: &dyn ObjectMarshaler) -> Result<()> {
        let mut scoped = self.scoped(key);
        marshaler.marshal_log_object(&mut scoped)?;
        self.buf.extend_from_slice(&scoped.buf);
        Ok(())
    }

    fn add_array(&mut self, key: &str, marshaler: &dyn ArrayMarshaler) -> Result<()> {
        let mut items = LogfmtArray::default();
        marshaler.marshal_log_array(&mut items)?;
        self.add_key(key);
        self.buf.push(b'[');
        self.buf.extend_from_slice(&items.buf);
        self.buf.push(b']');
        Ok(())
    }

    fn add_reflected(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        let mut scratch = Buffer::get();
        write_reflected(&mut scratch, value)?;
        self.add_key(key);
        self.buf.extend_from_slice(&scratch);
        Ok(())
    }
}

/// Array elements, comma separated
#[derive(Default)]
struct LogfmtArray {
    buf: Buffer,
}

impl LogfmtArray {
    fn separate(&mut self) {
        if !self.buf.is_empty() {
            self.buf.push(b',');
        }
    }
}

impl ArrayEncoder for LogfmtArray {
    fn append_bool(&mut self, value: bool) {
        self.separate();
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(text);
    }

    fn append_int64(&mut self, value: i64) {
        self.separate();
        let mut fmt = itoa::Buffer::new();
        self.buf.extend_from_slice(fmt.format(value).as_bytes());
    }

    fn append_uint64(&mut self, value: u64) {
        self.separate();
        let mut fmt = itoa::Buffer::new();
        self.buf.extend_from_slice(fmt.format(value).as_bytes());
    }

    fn append_float64(&mut self, value: f64) {
        self.separate();
        write_float(&mut self.buf, value);
    }

    fn append_string(&mut self, value: &str) {
        self.separate();
        write_value(&mut self.buf, value);
    }

    fn append_object(&mut self, marshaler: &dyn ObjectMarshaler) -> Result<()> {
        let mut inner = LogfmtEncoder::new();
        marshaler.marshal_log_object(&mut inner)?;
        self.separate();
        self.buf.push(b'{');
        self.buf.extend_from_slice(inner.context().as_bytes());
        self.buf.push(b'}');
        Ok(())
    }

    fn append_array(&mut self, marshaler: &dyn ArrayMarshaler) -> Result<()> {
        let mut inner = LogfmtArray::default();
        marshaler.marshal_log_array(&mut inner)?;
        self.separate();
        self.buf.push(b'[');
        self.buf.extend_from_slice(&inner.buf);
        self.buf.push(b']');
        Ok(())
    }

    fn append_reflected(&mut self, value: &serde_json::Value) -> Result<()> {
        let mut scratch = Buffer::get();
        write_reflected(&mut scratch, value)?;
        self.separate();
        self.buf.extend_from_slice(&scratch);
        Ok(())
    }
}

impl Encoder for LogfmtEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone())
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Buffer> {
        let mut out = LogfmtEncoder {
            buf: Buffer::get(),
            prefix: String::new(),
            colored: self.colored,
        };
        write!(out.buf, "ts={}", entry.time.format("%Y-%m-%dT%H:%M:%S%.3fZ"))?;
        out.buf.extend_from_slice(b" level=");
        out.write_level(entry);
        out.buf.extend_from_slice(b" msg=");
        write_quoted(&mut out.buf, &entry.message);
        if let Some(caller) = entry.caller {
            out.buf.extend_from_slice(b" caller=");
            write_value(&mut out.buf, &format!("{}:{}", caller.file(), caller.line()));
        }
        if let Some(stack) = entry.stack.as_deref() {
            out.buf.extend_from_slice(b" stacktrace=");
            write_quoted(&mut out.buf, stack);
        }
        out.buf.extend_from_slice(&self.buf);
        out.add_fields(fields);
        out.buf.push(b'\n');
        Ok(out.buf)
    }
}
