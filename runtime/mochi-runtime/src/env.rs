//! `env` namespace: guest diagnostics and generic value plumbing.

use mochi_obj_model::{Fault, GuestMemory, Handle};
use tracing::{debug, info};

use crate::error::HostError;
use crate::value::{HostArena, HostValue};

/// Logs a guest message. Never fails; an undecodable message is dropped.
pub fn print(module: &str, message: Result<&str, Fault>) {
    match message {
        Ok(message) => info!(module, guest_message = %message, "guest print"),
        Err(fault) => debug!(module, %fault, "dropped undecodable guest print"),
    }
}

/// Copies up to `cap` bytes of `bytes` to guest memory at `ptr` and returns
/// the number copied.
pub fn copy_out(memory: &mut GuestMemory<'_>, ptr: i32, cap: i32, bytes: &[u8]) -> Result<i32, HostError> {
    if cap < 0 {
        return Err(Fault::memory(format!("negative copy capacity {cap}")).into());
    }
    let count = bytes.len().min(cap as usize);
    if count == 0 {
        return Ok(0);
    }
    memory.write_bytes(ptr, &bytes[..count])?;
    Ok(count as i32)
}

pub fn value_kind(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    Ok(arena.with(handle, HostValue::kind_code)?)
}

pub fn create(arena: &HostArena, value: HostValue) -> Handle {
    arena.add(value)
}

pub fn string_len(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    let len = arena.with(handle, |value| value.expect_str().map(str::len))??;
    Ok(i32::try_from(len).unwrap_or(i32::MAX))
}

pub fn read_string(
    arena: &HostArena,
    memory: &mut GuestMemory<'_>,
    handle: Handle,
    ptr: i32,
    cap: i32,
) -> Result<i32, HostError> {
    let text = arena.with(handle, |value| value.expect_str().map(str::to_owned))??;
    copy_out(memory, ptr, cap, text.as_bytes())
}

pub fn read_int(arena: &HostArena, handle: Handle) -> Result<i64, HostError> {
    arena
        .with(handle, |value| match value {
            HostValue::Int(int) => Ok(*int),
            HostValue::Float(float) => Ok(*float as i64),
            HostValue::Bool(flag) => Ok(i64::from(*flag)),
            other => Err(Fault::cast(format!("expected int, found {}", other.kind_name()))),
        })?
        .map_err(HostError::from)
}

pub fn read_float(arena: &HostArena, handle: Handle) -> Result<f64, HostError> {
    arena
        .with(handle, |value| match value {
            HostValue::Float(float) => Ok(*float),
            HostValue::Int(int) => Ok(*int as f64),
            other => Err(Fault::cast(format!("expected float, found {}", other.kind_name()))),
        })?
        .map_err(HostError::from)
}

pub fn read_bool(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    arena
        .with(handle, |value| match value {
            HostValue::Bool(flag) => Ok(i32::from(*flag)),
            other => Err(Fault::cast(format!("expected bool, found {}", other.kind_name()))),
        })?
        .map_err(HostError::from)
}

fn length(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

pub fn array_len(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    Ok(arena.with(handle, |value| value.expect_array().map(|items| length(items.len())))??)
}

pub fn array_get(arena: &HostArena, handle: Handle, index: i32) -> Result<Handle, HostError> {
    let item = arena.with(handle, |value| {
        let items = value.expect_array()?;
        usize::try_from(index)
            .ok()
            .and_then(|index| items.get(index))
            .cloned()
            .ok_or_else(|| Fault::missing(format!("index {index} out of range for array of {}", items.len())))
    })??;
    Ok(arena.add(item))
}

/// Appends a copy of `item` to the array behind `handle`.
pub fn array_append(arena: &HostArena, handle: Handle, item: Handle) -> Result<(), HostError> {
    let item = arena.get(item)?;
    arena.with_mut(handle, |value| match value {
        HostValue::Array(items) => {
            items.push(item);
            Ok(())
        }
        other => Err(Fault::cast(format!("expected array, found {}", other.kind_name()))),
    })??;
    Ok(())
}

pub fn object_len(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    Ok(arena.with(handle, |value| value.expect_object().map(|entries| length(entries.len())))??)
}

pub fn object_get(arena: &HostArena, handle: Handle, key: &str) -> Result<Handle, HostError> {
    let item = arena.with(handle, |value| {
        value
            .expect_object()?
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, item)| item.clone())
            .ok_or_else(|| Fault::missing(format!("object has no key `{key}`")))
    })??;
    Ok(arena.add(item))
}

/// Sets `key` to a copy of `item`, replacing an existing entry in place.
pub fn object_set(arena: &HostArena, handle: Handle, key: &str, item: Handle) -> Result<(), HostError> {
    let item = arena.get(item)?;
    arena.with_mut(handle, |value| match value {
        HostValue::Object(entries) => {
            match entries.iter_mut().find(|(existing, _)| existing == key) {
                Some(slot) => slot.1 = item,
                None => entries.push((key.to_string(), item)),
            }
            Ok(())
        }
        other => Err(Fault::cast(format!("expected object, found {}", other.kind_name()))),
    })??;
    Ok(())
}

pub fn object_keys(arena: &HostArena, handle: Handle) -> Result<Handle, HostError> {
    let keys = arena.with(handle, |value| {
        value.expect_object().map(|entries| {
            entries
                .iter()
                .map(|(key, _)| HostValue::String(key.clone()))
                .collect::<Vec<_>>()
        })
    })??;
    Ok(arena.add(HostValue::Array(keys)))
}
