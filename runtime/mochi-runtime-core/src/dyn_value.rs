use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

/// Dynamic value tree exchanged with script guests.
#[derive(Clone, Debug, PartialEq)]
pub enum DynValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<DynValue>),
    Object(DynObject),
}

/// Keyed object that keeps insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynObject {
    entries: Vec<(String, DynValue)>,
}

impl DynObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or replaces `key`, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: DynValue) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&DynValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynValue)> + '_ {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl FromIterator<(String, DynValue)> for DynObject {
    fn from_iter<I: IntoIterator<Item = (String, DynValue)>>(iter: I) -> Self {
        let mut object = DynObject::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

impl IntoIterator for DynObject {
    type Item = (String, DynValue);
    type IntoIter = std::vec::IntoIter<(String, DynValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl DynValue {
    /// Short kind name used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            DynValue::Null => "null",
            DynValue::Bool(_) => "bool",
            DynValue::Number(_) => "number",
            DynValue::String(_) => "string",
            DynValue::Date(_) => "date",
            DynValue::Array(_) => "array",
            DynValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DynValue]> {
        match self {
            DynValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DynObject> {
        match self {
            DynValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Converts to JSON. Dates become RFC 3339 strings with millisecond
    /// precision; non-finite numbers become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            DynValue::Null => JsonValue::Null,
            DynValue::Bool(value) => JsonValue::Bool(*value),
            DynValue::Number(value) => number_to_json(*value),
            DynValue::String(value) => JsonValue::String(value.clone()),
            DynValue::Date(value) => {
                JsonValue::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            DynValue::Array(items) => JsonValue::Array(items.iter().map(DynValue::to_json).collect()),
            DynValue::Object(object) => {
                let mut map = JsonMap::with_capacity(object.len());
                for (key, value) in object.iter() {
                    map.insert(key.to_string(), value.to_json());
                }
                JsonValue::Object(map)
            }
        }
    }

    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => DynValue::Null,
            JsonValue::Bool(value) => DynValue::Bool(value),
            JsonValue::Number(number) => DynValue::Number(number.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(value) => DynValue::String(value),
            JsonValue::Array(items) => {
                DynValue::Array(items.into_iter().map(DynValue::from_json).collect())
            }
            JsonValue::Object(map) => DynValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, DynValue::from_json(value)))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return JsonValue::Number(JsonNumber::from(value as i64));
    }
    JsonNumber::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl From<JsonValue> for DynValue {
    fn from(value: JsonValue) -> Self {
        DynValue::from_json(value)
    }
}

impl From<&str> for DynValue {
    fn from(value: &str) -> Self {
        DynValue::String(value.to_string())
    }
}

impl From<String> for DynValue {
    fn from(value: String) -> Self {
        DynValue::String(value)
    }
}

impl From<f64> for DynValue {
    fn from(value: f64) -> Self {
        DynValue::Number(value)
    }
}

impl From<bool> for DynValue {
    fn from(value: bool) -> Self {
        DynValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn object_keeps_insertion_order() {
        let mut object = DynObject::new();
        object.insert("zeta", DynValue::Null);
        object.insert("alpha", DynValue::Bool(true));
        object.insert("zeta", DynValue::Number(1.0));
        let keys: Vec<&str> = object.keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(object.get("zeta"), Some(&DynValue::Number(1.0)));
    }

    #[test]
    fn json_conversion_is_structural() {
        let value = DynValue::from_json(json!({
            "title": "Frieren",
            "score": 9.5,
            "episodes": [1, 2],
            "airing": false,
            "studio": null
        }));
        let object = value.as_object().unwrap();
        assert_eq!(object.get("title").and_then(DynValue::as_str), Some("Frieren"));
        assert_eq!(object.get("episodes").and_then(DynValue::as_array).map(|a| a.len()), Some(2));
        assert_eq!(
            value.to_json(),
            json!({"title": "Frieren", "score": 9.5, "episodes": [1, 2], "airing": false, "studio": null})
        );
    }

    #[test]
    fn json_text_keeps_field_order() {
        let mut object = DynObject::new();
        object.insert("synopsis", DynValue::from("elf"));
        object.insert("altTitles", DynValue::Array(Vec::new()));
        object.insert("genres", DynValue::Array(Vec::new()));
        let text = DynValue::Object(object).to_json().to_string();
        assert_eq!(text, r#"{"synopsis":"elf","altTitles":[],"genres":[]}"#);
        let parsed = DynValue::from_json(serde_json::from_str(&text).unwrap());
        let keys: Vec<&str> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["synopsis", "altTitles", "genres"]);
    }

    #[test]
    fn dates_serialize_as_rfc3339() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(DynValue::Date(date).to_json(), json!("2024-01-02T03:04:05.000Z"));
    }

    #[test]
    fn non_finite_numbers_become_null() {
        assert_eq!(DynValue::Number(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(DynValue::Number(f64::INFINITY).to_json(), JsonValue::Null);
    }
}
