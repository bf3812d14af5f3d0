//! Structural codec between native records and [`DynValue`] trees.
//!
//! Records describe their fields once with [`dyn_record!`]; encoding walks
//! the fields in declaration order and decoding reports the exact field path
//! of the first mismatch.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

use crate::dyn_value::{DynObject, DynValue};

/// Key spelling used for record fields.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyStyle {
    /// `posterImage`; what script guests expect.
    #[default]
    CamelCase,
    /// `poster_image`; field names as declared.
    SnakeCase,
}

impl KeyStyle {
    pub fn key(self, field: &'static str) -> Cow<'static, str> {
        match self {
            KeyStyle::SnakeCase => Cow::Borrowed(field),
            KeyStyle::CamelCase => {
                if !field.contains('_') {
                    return Cow::Borrowed(field);
                }
                let mut out = String::with_capacity(field.len());
                let mut upper = false;
                for ch in field.chars() {
                    if ch == '_' {
                        upper = true;
                    } else if upper {
                        out.extend(ch.to_uppercase());
                        upper = false;
                    } else {
                        out.push(ch);
                    }
                }
                Cow::Owned(out)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} at `{path}`, found {found}")]
pub struct DecodeError {
    pub path: String,
    pub expected: &'static str,
    pub found: String,
}

#[derive(Clone, Debug)]
enum PathSegment {
    Field(String),
    Index(usize),
}

/// Decoding state: key style plus the path to the value being decoded.
pub struct DecodeContext {
    style: KeyStyle,
    path: Vec<PathSegment>,
}

impl DecodeContext {
    pub fn new(style: KeyStyle) -> Self {
        Self {
            style,
            path: Vec::new(),
        }
    }

    pub fn style(&self) -> KeyStyle {
        self.style
    }

    pub fn path(&self) -> String {
        if self.path.is_empty() {
            return "$".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    pub fn error(&self, expected: &'static str, found: impl fmt::Display) -> DecodeError {
        DecodeError {
            path: self.path(),
            expected,
            found: found.to_string(),
        }
    }

    pub fn mismatch(&self, expected: &'static str, value: &DynValue) -> DecodeError {
        self.error(expected, value.kind())
    }

    pub fn expect_object<'v>(&self, value: &'v DynValue) -> Result<&'v DynObject, DecodeError> {
        value.as_object().ok_or_else(|| self.mismatch("object", value))
    }

    /// Decodes field `name` of `object` under the current key style.
    pub fn field<T: DynDecode>(
        &mut self,
        object: &DynObject,
        name: &'static str,
    ) -> Result<T, DecodeError> {
        let key = self.style.key(name);
        self.path.push(PathSegment::Field(key.to_string()));
        let result = match object.get(&key) {
            Some(value) => T::decode(value, self),
            None => T::absent(self),
        };
        self.path.pop();
        result
    }

    pub fn element<T: DynDecode>(&mut self, index: usize, value: &DynValue) -> Result<T, DecodeError> {
        self.path.push(PathSegment::Index(index));
        let result = T::decode(value, self);
        self.path.pop();
        result
    }

    fn entry<T: DynDecode>(&mut self, key: &str, value: &DynValue) -> Result<T, DecodeError> {
        self.path.push(PathSegment::Field(key.to_string()));
        let result = T::decode(value, self);
        self.path.pop();
        result
    }
}

pub trait DynEncode {
    fn encode(&self, style: KeyStyle) -> DynValue;
}

pub trait DynDecode: Sized {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError>;

    /// Called when an object field is missing entirely.
    fn absent(cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        Err(cx.error("a value", "nothing"))
    }
}

pub fn encode<T: DynEncode + ?Sized>(value: &T, style: KeyStyle) -> DynValue {
    value.encode(style)
}

pub fn decode<T: DynDecode>(value: &DynValue, style: KeyStyle) -> Result<T, DecodeError> {
    T::decode(value, &mut DecodeContext::new(style))
}

impl DynEncode for DynValue {
    fn encode(&self, _style: KeyStyle) -> DynValue {
        self.clone()
    }
}

impl DynDecode for DynValue {
    fn decode(value: &DynValue, _cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }

    fn absent(_cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        Ok(DynValue::Null)
    }
}

impl DynEncode for String {
    fn encode(&self, _style: KeyStyle) -> DynValue {
        DynValue::String(self.clone())
    }
}

impl DynDecode for String {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        match value {
            DynValue::String(value) => Ok(value.clone()),
            other => Err(cx.mismatch("string", other)),
        }
    }
}

impl DynEncode for bool {
    fn encode(&self, _style: KeyStyle) -> DynValue {
        DynValue::Bool(*self)
    }
}

impl DynDecode for bool {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        match value {
            DynValue::Bool(value) => Ok(*value),
            other => Err(cx.mismatch("bool", other)),
        }
    }
}

impl DynEncode for f64 {
    fn encode(&self, _style: KeyStyle) -> DynValue {
        DynValue::Number(*self)
    }
}

impl DynDecode for f64 {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        match value {
            DynValue::Number(value) => Ok(*value),
            other => Err(cx.mismatch("number", other)),
        }
    }
}

macro_rules! integer_codec {
    ($($ty:ty),*) => {
        $(
            impl DynEncode for $ty {
                fn encode(&self, _style: KeyStyle) -> DynValue {
                    DynValue::Number(*self as f64)
                }
            }

            impl DynDecode for $ty {
                fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
                    let DynValue::Number(number) = value else {
                        return Err(cx.mismatch("integer", value));
                    };
                    if number.fract() != 0.0 || *number < <$ty>::MIN as f64 || *number > <$ty>::MAX as f64 {
                        return Err(cx.error("integer", number));
                    }
                    Ok(*number as $ty)
                }
            }
        )*
    };
}

integer_codec!(i32, i64, u32);

impl DynEncode for DateTime<Utc> {
    fn encode(&self, _style: KeyStyle) -> DynValue {
        DynValue::Date(*self)
    }
}

impl DynDecode for DateTime<Utc> {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        match value {
            DynValue::Date(date) => Ok(*date),
            DynValue::String(text) => DateTime::parse_from_rfc3339(text)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|_| cx.error("date", format!("string {text:?}"))),
            DynValue::Number(millis) if millis.is_finite() => {
                DateTime::<Utc>::from_timestamp_millis(*millis as i64)
                    .ok_or_else(|| cx.error("date", millis))
            }
            other => Err(cx.mismatch("date", other)),
        }
    }
}

impl DynEncode for Url {
    fn encode(&self, _style: KeyStyle) -> DynValue {
        DynValue::String(self.as_str().to_string())
    }
}

impl DynDecode for Url {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        match value {
            DynValue::String(text) => {
                Url::parse(text).map_err(|_| cx.error("url", format!("string {text:?}")))
            }
            other => Err(cx.mismatch("url", other)),
        }
    }
}

impl<T: DynEncode> DynEncode for Option<T> {
    fn encode(&self, style: KeyStyle) -> DynValue {
        match self {
            Some(value) => value.encode(style),
            None => DynValue::Null,
        }
    }
}

impl<T: DynDecode> DynDecode for Option<T> {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        match value {
            DynValue::Null => Ok(None),
            other => T::decode(other, cx).map(Some),
        }
    }

    fn absent(_cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        Ok(None)
    }
}

impl<T: DynEncode> DynEncode for Vec<T> {
    fn encode(&self, style: KeyStyle) -> DynValue {
        DynValue::Array(self.iter().map(|item| item.encode(style)).collect())
    }
}

impl<T: DynDecode> DynDecode for Vec<T> {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        let DynValue::Array(items) = value else {
            return Err(cx.mismatch("array", value));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| cx.element(index, item))
            .collect()
    }

    fn absent(_cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        Ok(Vec::new())
    }
}

impl<T: DynEncode> DynEncode for BTreeMap<String, T> {
    fn encode(&self, style: KeyStyle) -> DynValue {
        DynValue::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value.encode(style)))
                .collect(),
        )
    }
}

impl<T: DynDecode> DynDecode for BTreeMap<String, T> {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        let object = cx.expect_object(value)?;
        let mut out = BTreeMap::new();
        for (key, item) in object.iter() {
            out.insert(key.to_string(), cx.entry(key, item)?);
        }
        Ok(out)
    }

    fn absent(_cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        Ok(BTreeMap::new())
    }
}

/// Implements [`DynEncode`] and [`DynDecode`] for a struct from its field
/// list. Fields are encoded in the order given.
#[macro_export]
macro_rules! dyn_record {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::DynEncode for $ty {
            fn encode(&self, style: $crate::KeyStyle) -> $crate::DynValue {
                let mut object = $crate::DynObject::new();
                $(
                    object.insert(
                        style.key(stringify!($field)).into_owned(),
                        $crate::DynEncode::encode(&self.$field, style),
                    );
                )+
                $crate::DynValue::Object(object)
            }
        }

        impl $crate::DynDecode for $ty {
            fn decode(
                value: &$crate::DynValue,
                cx: &mut $crate::DecodeContext,
            ) -> Result<Self, $crate::DecodeError> {
                let object = cx.expect_object(value)?;
                Ok(Self {
                    $($field: cx.field(object, stringify!($field))?,)+
                })
            }
        }
    };
}

/// Declares a fieldless enum carried as a label in dynamic values and as a
/// numeric code across the bytecode boundary.
#[macro_export]
macro_rules! dyn_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(i32)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $code),+
        }

        impl $name {
            pub const fn code(self) -> i32 {
                self as i32
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl TryFrom<i32> for $name {
            type Error = i32;

            fn try_from(code: i32) -> Result<Self, i32> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err(other),
                }
            }
        }

        impl $crate::DynEncode for $name {
            fn encode(&self, _style: $crate::KeyStyle) -> $crate::DynValue {
                $crate::DynValue::String(self.label().to_string())
            }
        }

        impl $crate::DynDecode for $name {
            fn decode(
                value: &$crate::DynValue,
                cx: &mut $crate::DecodeContext,
            ) -> Result<Self, $crate::DecodeError> {
                match value {
                    $crate::DynValue::String(label) => $name::from_label(label)
                        .ok_or_else(|| cx.error(stringify!($name), format!("string {label:?}"))),
                    $crate::DynValue::Number(code) if code.fract() == 0.0 => {
                        $name::try_from(*code as i32)
                            .map_err(|code| cx.error(stringify!($name), code))
                    }
                    other => Err(cx.mismatch(stringify!($name), other)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Poster {
        image_url: Url,
        width: i32,
    }

    dyn_record!(Poster { image_url, width });

    #[derive(Clone, Debug, PartialEq)]
    struct Entry {
        display_title: String,
        score: f64,
        airing: bool,
        aired_at: DateTime<Utc>,
        poster: Option<Poster>,
        tags: Vec<String>,
    }

    dyn_record!(Entry {
        display_title,
        score,
        airing,
        aired_at,
        poster,
        tags,
    });

    dyn_enum! {
        enum Tone {
            Warm = 0 => "warm",
            Cold = 1 => "cold",
        }
    }

    fn sample() -> Entry {
        Entry {
            display_title: "Mushishi".to_string(),
            score: 9.1,
            airing: false,
            aired_at: Utc.with_ymd_and_hms(2005, 10, 22, 0, 0, 0).unwrap(),
            poster: Some(Poster {
                image_url: Url::parse("https://img.example/mushishi.png").unwrap(),
                width: 640,
            }),
            tags: vec!["seinen".to_string(), "iyashikei".to_string()],
        }
    }

    #[test]
    fn camel_case_keys() {
        assert_eq!(KeyStyle::CamelCase.key("poster_image"), "posterImage");
        assert_eq!(KeyStyle::CamelCase.key("alt_banners_v2"), "altBannersV2");
        assert_eq!(KeyStyle::CamelCase.key("id"), "id");
        assert_eq!(KeyStyle::SnakeCase.key("poster_image"), "poster_image");
    }

    #[test]
    fn encodes_fields_in_declaration_order() {
        let value = encode(&sample(), KeyStyle::CamelCase);
        let keys: Vec<&str> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["displayTitle", "score", "airing", "airedAt", "poster", "tags"]);
    }

    #[test]
    fn round_trips_in_both_styles() {
        for style in [KeyStyle::CamelCase, KeyStyle::SnakeCase] {
            let encoded = encode(&sample(), style);
            let decoded: Entry = decode(&encoded, style).unwrap();
            assert_eq!(decoded, sample());
        }
    }

    #[test]
    fn coerces_date_and_url_strings() {
        let value = DynValue::from_json(serde_json::json!({
            "displayTitle": "Aria",
            "score": 8,
            "airing": true,
            "airedAt": "2005-10-05T12:00:00+09:00",
            "poster": {"imageUrl": "https://img.example/aria.png", "width": 320},
        }));
        let entry: Entry = decode(&value, KeyStyle::CamelCase).unwrap();
        assert_eq!(entry.aired_at, Utc.with_ymd_and_hms(2005, 10, 5, 3, 0, 0).unwrap());
        assert_eq!(entry.poster.unwrap().image_url.host_str(), Some("img.example"));
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn epoch_millis_decode_as_dates() {
        let date: DateTime<Utc> = decode(&DynValue::Number(0.0), KeyStyle::CamelCase).unwrap();
        assert_eq!(date, Utc.timestamp_millis_opt(0).unwrap());
    }

    #[test]
    fn mismatch_reports_field_path() {
        let mut value = encode(&sample(), KeyStyle::CamelCase);
        if let DynValue::Object(object) = &mut value {
            object.insert("tags", DynValue::Array(vec![DynValue::from("ok"), DynValue::Number(3.0)]));
        }
        let err = decode::<Entry>(&value, KeyStyle::CamelCase).unwrap_err();
        assert_eq!(err.path, "tags[1]");
        assert_eq!(err.expected, "string");
        assert_eq!(err.found, "number");
    }

    #[test]
    fn nested_path_for_bad_url() {
        let mut value = encode(&sample(), KeyStyle::SnakeCase);
        if let DynValue::Object(object) = &mut value {
            let mut poster = DynObject::new();
            poster.insert("image_url", DynValue::from("not a url"));
            poster.insert("width", DynValue::Number(1.0));
            object.insert("poster", DynValue::Object(poster));
        }
        let err = decode::<Entry>(&value, KeyStyle::SnakeCase).unwrap_err();
        assert_eq!(err.path, "poster.image_url");
        assert_eq!(err.expected, "url");
    }

    #[test]
    fn missing_required_field_fails() {
        let value = DynValue::Object(DynObject::new());
        let err = decode::<Poster>(&value, KeyStyle::CamelCase).unwrap_err();
        assert_eq!(err.path, "imageUrl");
    }

    #[test]
    fn enums_decode_from_label_or_code() {
        assert_eq!(decode::<Tone>(&DynValue::from("cold"), KeyStyle::CamelCase), Ok(Tone::Cold));
        assert_eq!(decode::<Tone>(&DynValue::Number(0.0), KeyStyle::CamelCase), Ok(Tone::Warm));
        assert!(decode::<Tone>(&DynValue::from("tepid"), KeyStyle::CamelCase).is_err());
        assert_eq!(Tone::try_from(7), Err(7));
        assert_eq!(encode(&Tone::Warm, KeyStyle::CamelCase), DynValue::from("warm"));
    }

    #[test]
    fn maps_round_trip() {
        let mut headers = BTreeMap::new();
        headers.insert("Referer".to_string(), "https://example.org".to_string());
        let value = encode(&headers, KeyStyle::CamelCase);
        let decoded: BTreeMap<String, String> = decode(&value, KeyStyle::CamelCase).unwrap();
        assert_eq!(decoded, headers);
    }

    proptest! {
        #[test]
        fn scalar_records_round_trip(
            title in ".*",
            score in -1.0e9f64..1.0e9,
            airing in any::<bool>(),
            millis in 0i64..4_102_444_800_000,
            tags in proptest::collection::vec("[a-z]{0,8}", 0..5),
        ) {
            let entry = Entry {
                display_title: title,
                score,
                airing,
                aired_at: DateTime::<Utc>::from_timestamp_millis(millis).unwrap(),
                poster: None,
                tags,
            };
            let decoded: Entry = decode(&encode(&entry, KeyStyle::CamelCase), KeyStyle::CamelCase).unwrap();
            prop_assert_eq!(decoded, entry);
        }
    }
}
