use std::fmt;

use mochi_obj_model::{Arena, Fault};
use mochi_runtime_core::{DynEncode, DynObject, DynValue, KeyStyle, Record};
use serde_json::Value as JsonValue;

use crate::html::HtmlSelection;
use crate::http::HttpRequest;

/// Arena holding every value a module instance can address.
pub type HostArena = Arena<HostValue>;

/// Closed set of values the arena can hold.
#[derive(Clone)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<HostValue>),
    Object(Vec<(String, HostValue)>),
    Html(HtmlSelection),
    Request(HttpRequest),
    Record(Record),
}

/// Numeric tags reported to guests by `env.value_kind`.
pub mod kind {
    pub const NULL: i32 = 0;
    pub const BOOL: i32 = 1;
    pub const INT: i32 = 2;
    pub const FLOAT: i32 = 3;
    pub const STRING: i32 = 4;
    pub const BYTES: i32 = 5;
    pub const ARRAY: i32 = 6;
    pub const OBJECT: i32 = 7;
    pub const HTML: i32 = 8;
    pub const REQUEST: i32 = 9;
    pub const RECORD: i32 = 10;
}

impl HostValue {
    pub fn kind_code(&self) -> i32 {
        match self {
            HostValue::Null => kind::NULL,
            HostValue::Bool(_) => kind::BOOL,
            HostValue::Int(_) => kind::INT,
            HostValue::Float(_) => kind::FLOAT,
            HostValue::String(_) => kind::STRING,
            HostValue::Bytes(_) => kind::BYTES,
            HostValue::Array(_) => kind::ARRAY,
            HostValue::Object(_) => kind::OBJECT,
            HostValue::Html(_) => kind::HTML,
            HostValue::Request(_) => kind::REQUEST,
            HostValue::Record(_) => kind::RECORD,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::String(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Html(_) => "html",
            HostValue::Request(_) => "request",
            HostValue::Record(record) => record.kind(),
        }
    }

    fn mismatch(&self, expected: &str) -> Fault {
        Fault::cast(format!("expected {expected}, found {}", self.kind_name()))
    }

    pub fn expect_str(&self) -> Result<&str, Fault> {
        match self {
            HostValue::String(value) => Ok(value),
            other => Err(other.mismatch("string")),
        }
    }

    /// Raw bytes of a `Bytes` or `String` value.
    pub fn expect_bytes(&self) -> Result<&[u8], Fault> {
        match self {
            HostValue::Bytes(bytes) => Ok(bytes),
            HostValue::String(value) => Ok(value.as_bytes()),
            other => Err(other.mismatch("bytes")),
        }
    }

    pub fn expect_array(&self) -> Result<&[HostValue], Fault> {
        match self {
            HostValue::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn expect_object(&self) -> Result<&[(String, HostValue)], Fault> {
        match self {
            HostValue::Object(entries) => Ok(entries),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn expect_html(&self) -> Result<&HtmlSelection, Fault> {
        match self {
            HostValue::Html(selection) => Ok(selection),
            other => Err(other.mismatch("html node")),
        }
    }

    pub fn expect_request(&self) -> Result<&HttpRequest, Fault> {
        match self {
            HostValue::Request(request) => Ok(request),
            other => Err(other.mismatch("http request")),
        }
    }

    pub fn expect_request_mut(&mut self) -> Result<&mut HttpRequest, Fault> {
        match self {
            HostValue::Request(request) => Ok(request),
            other => Err(other.mismatch("http request")),
        }
    }

    /// Narrows a record value to one record type.
    pub fn expect_record<T>(&self, expected: &str) -> Result<T, Fault>
    where
        T: TryFrom<Record, Error = Record>,
    {
        match self {
            HostValue::Record(record) => T::try_from(record.clone())
                .map_err(|other| Fault::cast(format!("expected {expected}, found {}", other.kind()))),
            other => Err(other.mismatch(expected)),
        }
    }

    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => HostValue::Null,
            JsonValue::Bool(value) => HostValue::Bool(value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(int) => HostValue::Int(int),
                None => HostValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(value) => HostValue::String(value),
            JsonValue::Array(items) => {
                HostValue::Array(items.into_iter().map(HostValue::from_json).collect())
            }
            JsonValue::Object(map) => HostValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, HostValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Converts a dynamic argument into an arena value. Integral numbers
    /// become `Int`.
    pub fn from_dyn(value: DynValue) -> Self {
        match value {
            DynValue::Null => HostValue::Null,
            DynValue::Bool(value) => HostValue::Bool(value),
            DynValue::Number(number) if number.fract() == 0.0 && number.abs() < 9.0e15 => {
                HostValue::Int(number as i64)
            }
            DynValue::Number(number) => HostValue::Float(number),
            DynValue::String(value) => HostValue::String(value),
            date @ DynValue::Date(_) => match date.to_json() {
                JsonValue::String(text) => HostValue::String(text),
                _ => HostValue::Null,
            },
            DynValue::Array(items) => {
                HostValue::Array(items.into_iter().map(HostValue::from_dyn).collect())
            }
            DynValue::Object(object) => HostValue::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (key, HostValue::from_dyn(value)))
                    .collect(),
            ),
        }
    }

    /// Converts to a dynamic value. Records go through the codec; markup
    /// becomes its outer HTML and bytes an array of numbers.
    pub fn to_dyn(&self, style: KeyStyle) -> DynValue {
        match self {
            HostValue::Null => DynValue::Null,
            HostValue::Bool(value) => DynValue::Bool(*value),
            HostValue::Int(value) => DynValue::Number(*value as f64),
            HostValue::Float(value) => DynValue::Number(*value),
            HostValue::String(value) => DynValue::String(value.clone()),
            HostValue::Bytes(bytes) => {
                DynValue::Array(bytes.iter().map(|byte| DynValue::Number(f64::from(*byte))).collect())
            }
            HostValue::Array(items) => {
                DynValue::Array(items.iter().map(|item| item.to_dyn(style)).collect())
            }
            HostValue::Object(entries) => DynValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_dyn(style)))
                    .collect::<DynObject>(),
            ),
            HostValue::Html(selection) => DynValue::String(selection.outer_html()),
            HostValue::Request(request) => request.to_dyn(style),
            HostValue::Record(record) => record.encode(style),
        }
    }
}

impl From<Record> for HostValue {
    fn from(record: Record) -> Self {
        HostValue::Record(record)
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(bytes: Vec<u8>) -> Self {
        HostValue::Bytes(bytes)
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => f.write_str("Null"),
            HostValue::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            HostValue::Int(value) => f.debug_tuple("Int").field(value).finish(),
            HostValue::Float(value) => f.debug_tuple("Float").field(value).finish(),
            HostValue::String(value) => f.debug_tuple("String").field(value).finish(),
            HostValue::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            HostValue::Array(items) => f.debug_tuple("Array").field(items).finish(),
            HostValue::Object(entries) => f.debug_tuple("Object").field(entries).finish(),
            HostValue::Html(selection) => write!(f, "Html({} nodes)", selection.len()),
            HostValue::Request(request) => f.debug_tuple("Request").field(request).finish(),
            HostValue::Record(record) => f.debug_tuple("Record").field(record).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mochi_obj_model::FaultKind;
    use mochi_runtime_core::records::{Playlist, SearchFilterOption};
    use serde_json::json;

    #[test]
    fn json_numbers_keep_integer_kind() {
        let value = HostValue::from_json(json!({"n": 3, "x": 1.5}));
        let entries = value.expect_object().unwrap();
        assert!(matches!(entries[0].1, HostValue::Int(3)));
        assert!(matches!(entries[1].1, HostValue::Float(x) if x == 1.5));
    }

    #[test]
    fn wrong_kind_is_a_cast_fault() {
        let value = HostValue::Int(1);
        assert_eq!(value.expect_str().unwrap_err().kind, FaultKind::CastError);
        assert_eq!(value.expect_html().unwrap_err().kind, FaultKind::CastError);
    }

    #[test]
    fn record_narrowing_names_both_kinds() {
        let value = HostValue::from(Record::from(SearchFilterOption {
            id: "a".into(),
            display_name: "A".into(),
        }));
        let fault = value.expect_record::<Playlist>("playlist").unwrap_err();
        assert_eq!(fault.kind, FaultKind::CastError);
        assert!(fault.message.contains("search_filter_option"));
    }

    #[test]
    fn dyn_round_trip_for_plain_values() {
        let dyn_value = DynValue::from_json(json!({"page": 2, "query": "x", "tags": ["a"]}));
        let host = HostValue::from_dyn(dyn_value.clone());
        assert_eq!(host.to_dyn(KeyStyle::CamelCase), dyn_value);
    }
}
