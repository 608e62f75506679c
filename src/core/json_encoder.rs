//! Reflection-free JSON encoder
//!
//! Produces one object per entry:
//!
//! ```text
//! {"msg":"Oh no!","level":"error","ts":0,"fields":{"user":"jane@test.com","visits":42}}
//! ```
//!
//! `caller` is written after `ts` when the entry carries a call site, then
//! `stacktrace` when it carries a captured backtrace. The
//! accumulated context is stored pre-rendered, so adding it to a record is a
//! single copy.

use super::encoder::{ArrayEncoder, ArrayMarshaler, Encoder, ObjectEncoder, ObjectMarshaler};
use super::entry::Entry;
use super::error::Result;
use super::field::Field;
use super::pool::Buffer;
use chrono::{DateTime, Utc};

const HEX: &[u8; 16] = b"0123456789abcdef";

#[derive(Debug, Default, Clone)]
pub struct JsonEncoder {
    buf: Buffer,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self { buf: Buffer::get() }
    }

    /// Rendered context, without the enclosing braces
    pub fn context(&self) -> &str {
        self.buf.as_str()
    }

    fn separate(&mut self) {
        match self.buf.last() {
            None | Some(b'{') | Some(b'[') | Some(b':') | Some(b',') => {}
            Some(_) => self.buf.push(b','),
        }
    }

    fn add_key(&mut self, key: &str) {
        self.separate();
        self.write_quoted(key);
        self.buf.push(b':');
    }

    fn write_quoted(&mut self, s: &str) {
        self.buf.push(b'"');
        write_escaped(&mut self.buf, s);
        self.buf.push(b'"');
    }

    fn write_int64(&mut self, value: i64) {
        let mut fmt = itoa::Buffer::new();
        self.buf.extend_from_slice(fmt.format(value).as_bytes());
    }

    fn write_uint64(&mut self, value: u64) {
        let mut fmt = itoa::Buffer::new();
        self.buf.extend_from_slice(fmt.format(value).as_bytes());
    }

    fn write_float64(&mut self, value: f64) {
        if value.is_nan() {
            self.buf.extend_from_slice(b"\"NaN\"");
        } else if value.is_infinite() {
            let text: &[u8] = if value > 0.0 { b"\"+Inf\"" } else { b"\"-Inf\"" };
            self.buf.extend_from_slice(text);
        } else {
            let mut fmt = ryu::Buffer::new();
            self.buf.extend_from_slice(fmt.format_finite(value).as_bytes());
        }
    }

    fn write_time(&mut self, time: &DateTime<Utc>) {
        let secs = time.timestamp();
        let nanos = time.timestamp_subsec_nanos();
        if nanos == 0 {
            self.write_int64(secs);
        } else {
            self.write_float64(secs as f64 + f64::from(nanos) / 1e9);
        }
    }

    /// Marshal into a scratch encoder; the caller splices the result in
    fn marshal_object(marshaler: &dyn ObjectMarshaler) -> Result<JsonEncoder> {
        let mut scratch = JsonEncoder::new();
        marshaler.marshal_log_object(&mut scratch)?;
        Ok(scratch)
    }

    fn marshal_array(marshaler: &dyn ArrayMarshaler) -> Result<JsonEncoder> {
        let mut scratch = JsonEncoder::new();
        marshaler.marshal_log_array(&mut scratch)?;
        Ok(scratch)
    }

    fn reflect(value: &serde_json::Value) -> Result<Buffer> {
        let mut scratch = Buffer::get();
        serde_json::to_writer(&mut *scratch, value)?;
        Ok(scratch)
    }

    fn splice(&mut self, open: u8, scratch: &JsonEncoder, close: u8) {
        self.buf.push(open);
        self.buf.extend_from_slice(&scratch.buf);
        self.buf.push(close);
    }
}

/// Append `s` with JSON string escaping applied
fn write_escaped(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let escape: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x00..=0x1f => b"",
            _ => continue,
        };
        buf.extend_from_slice(&bytes[start..i]);
        if escape.is_empty() {
            buf.extend_from_slice(b"\\u00");
            buf.push(HEX[(b >> 4) as usize]);
            buf.push(HEX[(b & 0xf) as usize]);
        } else {
            buf.extend_from_slice(escape);
        }
        start = i + 1;
    }
    buf.extend_from_slice(&bytes[start..]);
}

impl ObjectEncoder for JsonEncoder {
    fn add_bool(&mut self, key: &str, value: bool) {
        self.add_key(key);
        self.append_bool(value);
    }

    fn add_int64(&mut self, key: &str, value: i64) {
        self.add_key(key);
        self.write_int64(value);
    }

    fn add_uint64(&mut self, key: &str, value: u64) {
        self.add_key(key);
        self.write_uint64(value);
    }

    fn add_float64(&mut self, key: &str, value: f64) {
        self.add_key(key);
        self.write_float64(value);
    }

    fn add_string(&mut self, key: &str, value: &str) {
        self.add_key(key);
        self.write_quoted(value);
    }

    fn add_object(&mut self, key: &str, marshaler: &dyn ObjectMarshaler) -> Result<()> {
        let scratch = Self::marshal_object(marshaler)?;
        self.add_key(key);
        self.splice(b'{', &scratch, b'}');
        Ok(())
    }

    fn add_array(&mut self, key: &str, marshaler: &dyn ArrayMarshaler) -> Result<()> {
        let scratch = Self::marshal_array(marshaler)?;
        self.add_key(key);
        self.splice(b'[', &scratch, b']');
        Ok(())
    }

    fn add_reflected(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        let rendered = Self::reflect(value)?;
        self.add_key(key);
        self.buf.extend_from_slice(&rendered);
        Ok(())
    }
}

impl ArrayEncoder for JsonEncoder {
    fn append_bool(&mut self, value: bool) {
        self.separate();
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(text);
    }

    fn append_int64(&mut self, value: i64) {
        self.separate();
        self.write_int64(value);
    }

    fn append_uint64(&mut self, value: u64) {
        self.separate();
        self.write_uint64(value);
    }

    fn append_float64(&mut self, value: f64) {
        self.separate();
        self.write_float64(value);
    }

    fn append_string(&mut self, value: &str) {
        self.separate();
        self.write_quoted(value);
    }

    fn append_object(&mut self, marshaler: &dyn ObjectMarshaler) -> Result<()> {
        let scratch = Self::marshal_object(marshaler)?;
        self.separate();
        self.splice(b'{', &scratch, b'}');
        Ok(())
    }

    fn append_array(&mut self, marshaler: &dyn ArrayMarshaler) -> Result<()> {
        let scratch = Self::marshal_array(marshaler)?;
        self.separate();
        self.splice(b'[', &scratch, b']');
        Ok(())
    }

    fn append_reflected(&mut self, value: &serde_json::Value) -> Result<()> {
        let rendered = Self::reflect(value)?;
        self.separate();
        self.buf.extend_from_slice(&rendered);
        Ok(())
    }
}

impl Encoder for JsonEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone())
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Buffer> {
        let mut out = JsonEncoder::new();
        out.buf.push(b'{');
        out.add_string("msg", &entry.message);
        out.add_string("level", entry.level.to_str());
        out.add_key("ts");
        out.write_time(&entry.time);

        if let Some(caller) = entry.caller {
            out.add_key("caller");
            out.buf.push(b'"');
            write_escaped(&mut out.buf, caller.file());
            out.buf.push(b':');
            let mut line = itoa::Buffer::new();
            out.buf.extend_from_slice(line.format(caller.line()).as_bytes());
            out.buf.push(b'"');
        }
        if let Some(stack) = entry.stack.as_deref() {
            out.add_string("stacktrace", stack);
        }

        out.add_key("fields");
        out.buf.push(b'{');
        out.buf.extend_from_slice(&self.buf);
        out.add_fields(fields);
        out.buf.extend_from_slice(b"}}\n");
        Ok(out.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{Clock, EpochClock};
    use crate::core::error::LoggerError;
    use crate::core::level::Level;
    use std::time::Duration;

    fn entry(level: Level, msg: &str) -> Entry {
        Entry::new(level, msg, EpochClock.now())
    }

    struct Pair;

    impl ArrayMarshaler for Pair {
        fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
            enc.append_int64(1);
            enc.append_string("two");
            Ok(())
        }
    }

    struct Broken;

    impl ArrayMarshaler for Broken {
        fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
            enc.append_int64(1);
            Err(LoggerError::other("broken array"))
        }
    }

    #[test]
    fn test_entry_without_fields() {
        let enc = JsonEncoder::new();
        let buf = enc
            .encode_entry(&entry(Level::Warn, "Log without structured data..."), &[])
            .unwrap();
        assert_eq!(
            buf.as_str(),
            "{\"msg\":\"Log without structured data...\",\"level\":\"warn\",\"ts\":0,\"fields\":{}}\n"
        );
    }

    #[test]
    fn test_context_precedes_call_fields() {
        let mut enc = JsonEncoder::new();
        enc.add_string("user", "jane@test.com");
        let buf = enc
            .encode_entry(&entry(Level::Error, "Oh no!"), &[Field::int("visits", 42)])
            .unwrap();
        assert_eq!(
            buf.as_str(),
            "{\"msg\":\"Oh no!\",\"level\":\"error\",\"ts\":0,\"fields\":{\"user\":\"jane@test.com\",\"visits\":42}}\n"
        );
    }

    #[test]
    fn test_encode_does_not_mutate_context() {
        let mut enc = JsonEncoder::new();
        enc.add_int64("a", 1);
        let _ = enc.encode_entry(&entry(Level::Info, "x"), &[Field::int("b", 2)]);
        assert_eq!(enc.context(), "\"a\":1");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut parent = JsonEncoder::new();
        parent.add_int64("a", 1);
        let mut child = parent.clone_encoder();
        child.add_int64("b", 2);
        assert_eq!(parent.context(), "\"a\":1");
    }

    #[test]
    fn test_string_escaping() {
        let mut enc = JsonEncoder::new();
        enc.add_string("k\"ey", "line\nbreak\t\"quoted\" \\ \u{1} é");
        assert_eq!(
            enc.context(),
            "\"k\\\"ey\":\"line\\nbreak\\t\\\"quoted\\\" \\\\ \\u0001 é\""
        );
        let parsed: serde_json::Value =
            serde_json::from_str(&format!("{{{}}}", enc.context())).unwrap();
        assert_eq!(parsed["k\"ey"], "line\nbreak\t\"quoted\" \\ \u{1} é");
    }

    #[test]
    fn test_special_floats() {
        let mut enc = JsonEncoder::new();
        enc.add_float64("nan", f64::NAN);
        enc.add_float64("inf", f64::INFINITY);
        enc.add_float64("ninf", f64::NEG_INFINITY);
        enc.add_float64("half", 0.5);
        assert_eq!(
            enc.context(),
            "\"nan\":\"NaN\",\"inf\":\"+Inf\",\"ninf\":\"-Inf\",\"half\":0.5"
        );
    }

    #[test]
    fn test_fractional_timestamp() {
        let enc = JsonEncoder::new();
        let time = DateTime::<Utc>::from_timestamp(1, 500_000_000).unwrap();
        let buf = enc.encode_entry(&Entry::new(Level::Info, "m", time), &[]).unwrap();
        assert!(buf.as_str().contains("\"ts\":1.5,"), "{}", buf.as_str());
    }

    #[test]
    fn test_caller_annotation() {
        let enc = JsonEncoder::new();
        let caller = std::panic::Location::caller();
        let entry = entry(Level::Info, "m").with_caller(Some(caller));
        let buf = enc.encode_entry(&entry, &[]).unwrap();
        let expected = format!(
            "\"ts\":0,\"caller\":\"{}:{}\",\"fields\"",
            caller.file(),
            caller.line()
        );
        assert!(buf.as_str().contains(&expected), "{}", buf.as_str());
    }

    #[test]
    fn test_stacktrace_precedes_fields() {
        let enc = JsonEncoder::new();
        let entry = entry(Level::Error, "m").with_stack(Some("0: main\n1: start".to_string()));
        let buf = enc.encode_entry(&entry, &[]).unwrap();
        assert_eq!(
            buf.as_str(),
            "{\"msg\":\"m\",\"level\":\"error\",\"ts\":0,\"stacktrace\":\"0: main\\n1: start\",\"fields\":{}}\n"
        );
    }

    #[test]
    fn test_nested_and_arrays() {
        let mut enc = JsonEncoder::new();
        enc.add_fields(&[
            Field::nest("outer", [Field::int("inner", 42)]),
            Field::array("pair", Pair),
            Field::duration("took", Duration::from_micros(1)),
        ]);
        assert_eq!(
            enc.context(),
            "\"outer\":{\"inner\":42},\"pair\":[1,\"two\"],\"took\":1000"
        );
    }

    #[test]
    fn test_failed_array_is_not_spliced() {
        let mut enc = JsonEncoder::new();
        enc.add_int64("before", 1);
        enc.add_fields(&[Field::array("list", Broken)]);
        assert_eq!(enc.context(), "\"before\":1,\"listError\":\"broken array\"");
    }

    #[test]
    fn test_output_parses_as_json() {
        let mut enc = JsonEncoder::new();
        enc.add_fields(&[Field::reflect("tags", &vec!["a", "b"])]);
        let buf = enc
            .encode_entry(&entry(Level::Debug, "check"), &[Field::bool("ok", true)])
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(buf.as_bytes()).unwrap();
        assert_eq!(parsed["fields"]["tags"], serde_json::json!(["a", "b"]));
        assert_eq!(parsed["fields"]["ok"], true);
        assert_eq!(parsed["level"], "debug");
    }
}
