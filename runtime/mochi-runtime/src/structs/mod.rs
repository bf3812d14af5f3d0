//! Record builders (`structs_meta`, `structs_video`).
//!
//! Each builder decodes its primitive fields, narrows every handle argument
//! to the record kind it expects and adds exactly one new arena entry.
//! Absent optional fields become `None`; a present but malformed value is a
//! cast fault.
//!
//! Optional handle arguments (list and map children a record can do
//! without) are absent when the guest passes a negative handle, `-1` by
//! convention, or a handle to a `Null` entry; they then degrade to an empty
//! collection. Required handle arguments stay strict: a fault handle there
//! is a cast fault.

pub mod meta;
pub mod video;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mochi_obj_model::{Fault, Handle};
use mochi_runtime_core::Record;
use url::Url;

use crate::error::HostError;
use crate::value::{HostArena, HostValue};

fn add(arena: &HostArena, record: impl Into<Record>) -> Handle {
    arena.add(HostValue::Record(record.into()))
}

fn record<T>(arena: &HostArena, handle: Handle, expected: &str) -> Result<T, HostError>
where
    T: TryFrom<Record, Error = Record>,
{
    Ok(arena.with(handle, |value| value.expect_record::<T>(expected))??)
}

/// Resolves an optional handle argument to `None` when the guest left it
/// out.
fn optional(arena: &HostArena, handle: Handle) -> Result<Option<Handle>, HostError> {
    if handle.is_fault() {
        return Ok(None);
    }
    let null = arena.with(handle, |value| matches!(value, HostValue::Null))?;
    Ok((!null).then_some(handle))
}

/// Builds an optional child, or its empty default when absent.
fn or_empty<T: Default>(
    arena: &HostArena,
    handle: Handle,
    build: impl FnOnce(Handle) -> Result<T, HostError>,
) -> Result<T, HostError> {
    match optional(arena, handle)? {
        Some(handle) => build(handle),
        None => Ok(T::default()),
    }
}

fn items(arena: &HostArena, array: Handle) -> Result<Vec<HostValue>, HostError> {
    Ok(arena.with(array, |value| value.expect_array().map(<[HostValue]>::to_vec))??)
}

/// Every element of an array handle, narrowed to one record kind, in
/// array order.
fn record_list<T>(arena: &HostArena, array: Handle, expected: &str) -> Result<Vec<T>, HostError>
where
    T: TryFrom<Record, Error = Record>,
{
    items(arena, array)?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.expect_record::<T>(expected).map_err(|fault| {
                Fault::cast(format!("element {index}: {}", fault.message)).into()
            })
        })
        .collect()
}

fn any_records(arena: &HostArena, array: Handle) -> Result<Vec<Record>, HostError> {
    items(arena, array)?
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            HostValue::Record(record) => Ok(record),
            other => Err(Fault::cast(format!(
                "element {index}: expected record, found {}",
                other.kind_name()
            ))
            .into()),
        })
        .collect()
}

fn string_list(arena: &HostArena, array: Handle) -> Result<Vec<String>, HostError> {
    items(arena, array)?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.expect_str().map(str::to_owned).map_err(|fault| {
                Fault::cast(format!("element {index}: {}", fault.message)).into()
            })
        })
        .collect()
}

fn url_list(arena: &HostArena, array: Handle, field: &str) -> Result<Vec<Url>, HostError> {
    string_list(arena, array)?
        .iter()
        .map(|raw| required_url(field, raw).map_err(HostError::from))
        .collect()
}

fn string_map(arena: &HostArena, object: Handle) -> Result<BTreeMap<String, String>, HostError> {
    let entries = arena.with(object, |value| value.expect_object().map(<[(String, HostValue)]>::to_vec))??;
    entries
        .into_iter()
        .map(|(key, value)| match value {
            HostValue::String(text) => Ok((key, text)),
            other => Err(Fault::cast(format!(
                "value of `{key}`: expected string, found {}",
                other.kind_name()
            ))
            .into()),
        })
        .collect()
}

fn required_url(field: &str, raw: &str) -> Result<Url, Fault> {
    Url::parse(raw).map_err(|err| Fault::cast(format!("{field}: `{raw}` is not a url ({err})")))
}

fn optional_url(field: &str, raw: Option<&str>) -> Result<Option<Url>, Fault> {
    raw.map(|raw| required_url(field, raw)).transpose()
}

fn optional_timestamp(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, Fault> {
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|err| Fault::cast(format!("{field}: `{raw}` is not an RFC 3339 date ({err})")))
    })
    .transpose()
}

fn discriminant<E>(field: &str, code: i32) -> Result<E, Fault>
where
    E: TryFrom<i32, Error = i32>,
{
    E::try_from(code).map_err(|code| Fault::cast(format!("{field}: {code} is out of range")))
}
