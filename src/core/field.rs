//! Structured key/value fields
//!
//! A [`Field`] is a key plus a tagged [`FieldValue`]. Heap storage for string
//! payloads and nested field lists is drawn from the process-wide pools and
//! returned to them when the field is dropped, so building a field for a
//! single log call does not allocate once the pools are warm.
//!
//! Log calls borrow their fields, so any field may be logged more than once.
//! [`Field::keep`] exempts a field's storage from reclamation: the storage is
//! then owned by the caller and simply freed on drop. Use it for fields that
//! live for a long time (stored in a struct, shared as defaults) so they do
//! not pin pooled buffers the hot path could be reusing.

use super::encoder::{
    ArrayMarshaler, Bools, Float64s, Int64s, ObjectEncoder, ObjectMarshaler, Strings, Uint64s,
};
use super::pool::{Pool, FIELD_LISTS, STRINGS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub enum FieldValue {
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(String),
    /// Encoded as int64 nanoseconds
    Duration(Duration),
    /// Encoded as int64 nanoseconds since the Unix epoch
    Time(DateTime<Utc>),
    Nested(Vec<Field>),
    Object(Arc<dyn ObjectMarshaler>),
    Array(Arc<dyn ArrayMarshaler>),
    Reflected(serde_json::Value),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            FieldValue::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            FieldValue::Uint64(v) => f.debug_tuple("Uint64").field(v).finish(),
            FieldValue::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            FieldValue::String(v) => f.debug_tuple("String").field(v).finish(),
            FieldValue::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            FieldValue::Time(v) => f.debug_tuple("Time").field(v).finish(),
            FieldValue::Nested(v) => f.debug_tuple("Nested").field(v).finish(),
            FieldValue::Object(_) => f.write_str("Object(..)"),
            FieldValue::Array(_) => f.write_str("Array(..)"),
            FieldValue::Reflected(v) => f.debug_tuple("Reflected").field(v).finish(),
        }
    }
}

#[derive(Debug)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
    kept: bool,
}

fn pooled_string(value: &str) -> String {
    let mut s = STRINGS.get();
    s.push_str(value);
    s
}

fn duration_nanos(d: &Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

impl Field {
    fn new(key: impl Into<Cow<'static, str>>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
            kept: false,
        }
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn int64(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, FieldValue::Int64(value))
    }

    /// Any signed integer, widened to int64
    pub fn int(key: impl Into<Cow<'static, str>>, value: impl Into<i64>) -> Self {
        Self::int64(key, value.into())
    }

    pub fn uint64(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint64(value))
    }

    pub fn float64(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, FieldValue::Float64(value))
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl AsRef<str>) -> Self {
        Self::new(key, FieldValue::String(pooled_string(value.as_ref())))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    pub fn time(key: impl Into<Cow<'static, str>>, value: DateTime<Utc>) -> Self {
        Self::new(key, FieldValue::Time(value))
    }

    /// The error's message under the conventional `"error"` key
    pub fn error(err: &dyn std::error::Error) -> Self {
        let mut s = STRINGS.get();
        use std::fmt::Write;
        let _ = write!(s, "{}", err);
        Self::new("error", FieldValue::String(s))
    }

    /// Group `fields` under one key as a nested object
    ///
    /// # Example
    ///
    /// ```
    /// use rust_structured_logger::Field;
    ///
    /// // {"outer":{"inner":42}}
    /// let nest = Field::nest("outer", [Field::int("inner", 42)]);
    /// assert_eq!(nest.key(), "outer");
    /// ```
    pub fn nest(
        key: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        let mut list = FIELD_LISTS.get();
        list.extend(fields);
        Self::new(key, FieldValue::Nested(list))
    }

    pub fn object(key: impl Into<Cow<'static, str>>, value: impl ObjectMarshaler + 'static) -> Self {
        Self::new(key, FieldValue::Object(Arc::new(value)))
    }

    pub fn array(key: impl Into<Cow<'static, str>>, value: impl ArrayMarshaler + 'static) -> Self {
        Self::new(key, FieldValue::Array(Arc::new(value)))
    }

    pub fn bools(key: impl Into<Cow<'static, str>>, values: Vec<bool>) -> Self {
        Self::array(key, Bools(values))
    }

    pub fn int64s(key: impl Into<Cow<'static, str>>, values: Vec<i64>) -> Self {
        Self::array(key, Int64s(values))
    }

    pub fn uint64s(key: impl Into<Cow<'static, str>>, values: Vec<u64>) -> Self {
        Self::array(key, Uint64s(values))
    }

    pub fn float64s(key: impl Into<Cow<'static, str>>, values: Vec<f64>) -> Self {
        Self::array(key, Float64s(values))
    }

    pub fn strings(key: impl Into<Cow<'static, str>>, values: Vec<String>) -> Self {
        Self::array(key, Strings(values))
    }

    /// Serialize any `Serialize` value through serde; the slow path
    ///
    /// A value serde cannot represent becomes a `"<key>Error"` string field.
    pub fn reflect<T: Serialize + ?Sized>(key: impl Into<Cow<'static, str>>, value: &T) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => Self::new(key, FieldValue::Reflected(value)),
            Err(err) => Self::new(
                format!("{}Error", key),
                FieldValue::String(pooled_string(&err.to_string())),
            ),
        }
    }

    /// Exempt this field (and any nested fields) from pool reclamation
    #[must_use]
    pub fn keep(mut self) -> Self {
        self.mark_kept();
        self
    }

    /// Retroactive form of [`keep`](Self::keep)
    pub fn mark_kept(&mut self) {
        self.kept = true;
        if let FieldValue::Nested(children) = &mut self.value {
            for child in children.iter_mut() {
                child.mark_kept();
            }
        }
    }

    pub fn is_kept(&self) -> bool {
        self.kept
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Add this field to an encoder
    ///
    /// A marshaler or serializer failure is recorded as a `"<key>Error"`
    /// string so the rest of the record is still written.
    pub fn add_to<E: ObjectEncoder + ?Sized>(&self, enc: &mut E) {
        let key: &str = &self.key;
        let result = match &self.value {
            FieldValue::Bool(v) => {
                enc.add_bool(key, *v);
                Ok(())
            }
            FieldValue::Int64(v) => {
                enc.add_int64(key, *v);
                Ok(())
            }
            FieldValue::Uint64(v) => {
                enc.add_uint64(key, *v);
                Ok(())
            }
            FieldValue::Float64(v) => {
                enc.add_float64(key, *v);
                Ok(())
            }
            FieldValue::String(v) => {
                enc.add_string(key, v);
                Ok(())
            }
            FieldValue::Duration(v) => {
                enc.add_int64(key, duration_nanos(v));
                Ok(())
            }
            FieldValue::Time(v) => {
                enc.add_int64(key, v.timestamp_nanos_opt().unwrap_or(i64::MAX));
                Ok(())
            }
            FieldValue::Nested(children) => enc.add_object(key, children),
            FieldValue::Object(marshaler) => enc.add_object(key, marshaler.as_ref()),
            FieldValue::Array(marshaler) => enc.add_array(key, marshaler.as_ref()),
            FieldValue::Reflected(value) => enc.add_reflected(key, value),
        };

        if let Err(err) = result {
            let mut error_key = STRINGS.get();
            error_key.push_str(key);
            error_key.push_str("Error");
            enc.add_string(&error_key, &err.to_string());
            STRINGS.put(error_key);
        }
    }

    /// Return pooled storage unless the field is kept
    fn reclaim(&mut self, strings: &Pool<String>, lists: &Pool<Vec<Field>>) {
        if !self.kept {
            self.release_into(strings, lists);
        }
    }

    fn release_into(&mut self, strings: &Pool<String>, lists: &Pool<Vec<Field>>) {
        match &mut self.value {
            FieldValue::String(s) => strings.put(std::mem::take(s)),
            FieldValue::Nested(children) => {
                children.clear();
                lists.put(std::mem::take(children));
            }
            _ => {}
        }
    }
}

impl Clone for Field {
    /// The copy draws fresh pooled storage and is not kept
    fn clone(&self) -> Self {
        let value = match &self.value {
            FieldValue::Bool(v) => FieldValue::Bool(*v),
            FieldValue::Int64(v) => FieldValue::Int64(*v),
            FieldValue::Uint64(v) => FieldValue::Uint64(*v),
            FieldValue::Float64(v) => FieldValue::Float64(*v),
            FieldValue::String(v) => FieldValue::String(pooled_string(v)),
            FieldValue::Duration(v) => FieldValue::Duration(*v),
            FieldValue::Time(v) => FieldValue::Time(*v),
            FieldValue::Nested(children) => {
                let mut list = FIELD_LISTS.get();
                list.extend(children.iter().cloned());
                FieldValue::Nested(list)
            }
            FieldValue::Object(m) => FieldValue::Object(Arc::clone(m)),
            FieldValue::Array(m) => FieldValue::Array(Arc::clone(m)),
            FieldValue::Reflected(v) => FieldValue::Reflected(v.clone()),
        };
        Self {
            key: self.key.clone(),
            value,
            kept: false,
        }
    }
}

impl Drop for Field {
    fn drop(&mut self) {
        self.reclaim(&STRINGS, &FIELD_LISTS);
    }
}
