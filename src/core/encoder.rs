//! Format-agnostic encoder contract
//!
//! An [`Encoder`] is an [`ObjectEncoder`] that holds a logger's accumulated
//! context plus the ability to serialize a whole entry. Typed `add_*`
//! methods avoid any generic serialization; `add_reflected` is the slow path
//! for values that have no typed primitive.
//!
//! Object and array encoders are not safe for concurrent mutation.
//! [`Encoder::clone_encoder`] and [`Encoder::encode_entry`] take `&self` and
//! never modify the receiver, so one context can serve many concurrent calls.

use super::entry::Entry;
use super::error::Result;
use super::field::Field;
use super::pool::Buffer;

pub trait ObjectEncoder {
    fn add_bool(&mut self, key: &str, value: bool);
    fn add_int64(&mut self, key: &str, value: i64);
    fn add_uint64(&mut self, key: &str, value: u64);
    fn add_float64(&mut self, key: &str, value: f64);
    fn add_string(&mut self, key: &str, value: &str);
    fn add_object(&mut self, key: &str, marshaler: &dyn ObjectMarshaler) -> Result<()>;
    fn add_array(&mut self, key: &str, marshaler: &dyn ArrayMarshaler) -> Result<()>;
    /// Generic serialization; slow and allocation-heavy
    fn add_reflected(&mut self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Add every field in order
    fn add_fields(&mut self, fields: &[Field]) {
        for field in fields {
            field.add_to(self);
        }
    }
}

/// Array counterpart of [`ObjectEncoder`]; mixed element types are allowed
pub trait ArrayEncoder {
    fn append_bool(&mut self, value: bool);
    fn append_int64(&mut self, value: i64);
    fn append_uint64(&mut self, value: u64);
    fn append_float64(&mut self, value: f64);
    fn append_string(&mut self, value: &str);
    fn append_object(&mut self, marshaler: &dyn ObjectMarshaler) -> Result<()>;
    fn append_array(&mut self, marshaler: &dyn ArrayMarshaler) -> Result<()>;
    fn append_reflected(&mut self, value: &serde_json::Value) -> Result<()>;
}

/// A type that knows how to add itself to an object
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::encoder::{ObjectEncoder, ObjectMarshaler};
/// use rust_structured_logger::Result;
///
/// struct User {
///     name: String,
///     visits: i64,
/// }
///
/// impl ObjectMarshaler for User {
///     fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
///         enc.add_string("name", &self.name);
///         enc.add_int64("visits", self.visits);
///         Ok(())
///     }
/// }
/// ```
pub trait ObjectMarshaler: Send + Sync {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()>;
}

/// A type that knows how to append its elements to an array
pub trait ArrayMarshaler: Send + Sync {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()>;
}

pub trait Encoder: ObjectEncoder + Send + Sync {
    /// Independent copy; adding fields to it never affects `self`
    fn clone_encoder(&self) -> Box<dyn Encoder>;

    /// Serialize the entry, the accumulated context and `fields` into one record
    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Buffer>;
}

impl ObjectMarshaler for Vec<Field> {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
        enc.add_fields(self);
        Ok(())
    }
}

macro_rules! primitive_array {
    ($name:ident, $ty:ty, $append:ident) => {
        #[derive(Debug, Clone, Default)]
        pub(crate) struct $name(pub(crate) Vec<$ty>);

        impl ArrayMarshaler for $name {
            fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
                for value in &self.0 {
                    enc.$append(*value);
                }
                Ok(())
            }
        }
    };
}

primitive_array!(Bools, bool, append_bool);
primitive_array!(Int64s, i64, append_int64);
primitive_array!(Uint64s, u64, append_uint64);
primitive_array!(Float64s, f64, append_float64);

#[derive(Debug, Clone, Default)]
pub(crate) struct Strings(pub(crate) Vec<String>);

impl ArrayMarshaler for Strings {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
        for value in &self.0 {
            enc.append_string(value);
        }
        Ok(())
    }
}
