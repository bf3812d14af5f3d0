use anyhow::Result;
use mochi_obj_model::Handle;
use mochi_runtime::{HostValue, env};
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_count, call_handle, call_scalar, call_status, flag, with_memory};

const NS: &str = "env";

pub(super) fn define_env_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(NS, "print", |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
        with_memory(&mut caller, |memory, state| {
            env::print(&state.module_id, memory.read_str(ptr, len));
        })
    })?;
    linker.func_wrap(NS, "value_kind", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| env::value_kind(&state.arena, Handle::from_raw(h)))
    })?;

    linker.func_wrap(NS, "create_null", |mut caller: Caller<'_, HostState>| -> i32 {
        call_handle(&mut caller, |_, state| Ok(env::create(&state.arena, HostValue::Null)))
    })?;
    linker.func_wrap(NS, "create_bool", |mut caller: Caller<'_, HostState>, value: i32| -> i32 {
        call_handle(&mut caller, |_, state| {
            Ok(env::create(&state.arena, HostValue::Bool(flag(value))))
        })
    })?;
    linker.func_wrap(NS, "create_int", |mut caller: Caller<'_, HostState>, value: i64| -> i32 {
        call_handle(&mut caller, |_, state| Ok(env::create(&state.arena, HostValue::Int(value))))
    })?;
    linker.func_wrap(NS, "create_float", |mut caller: Caller<'_, HostState>, value: f64| -> i32 {
        call_handle(&mut caller, |_, state| Ok(env::create(&state.arena, HostValue::Float(value))))
    })?;
    linker.func_wrap(
        NS,
        "create_string",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let text = memory.read_str(ptr, len)?;
                Ok(env::create(&state.arena, HostValue::String(text.to_string())))
            })
        },
    )?;
    linker.func_wrap(NS, "create_array", |mut caller: Caller<'_, HostState>| -> i32 {
        call_handle(&mut caller, |_, state| {
            Ok(env::create(&state.arena, HostValue::Array(Vec::new())))
        })
    })?;
    linker.func_wrap(NS, "create_object", |mut caller: Caller<'_, HostState>| -> i32 {
        call_handle(&mut caller, |_, state| {
            Ok(env::create(&state.arena, HostValue::Object(Vec::new())))
        })
    })?;

    linker.func_wrap(NS, "string_len", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| env::string_len(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "read_string",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, cap: i32| -> i32 {
            call_count(&mut caller, |memory, state| {
                env::read_string(&state.arena, memory, Handle::from_raw(h), ptr, cap)
            })
        },
    )?;
    linker.func_wrap(NS, "read_int", |caller: Caller<'_, HostState>, h: i32| -> i64 {
        call_scalar(&caller, |state| env::read_int(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(NS, "read_float", |caller: Caller<'_, HostState>, h: i32| -> f64 {
        call_scalar(&caller, |state| env::read_float(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(NS, "read_bool", |caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_scalar(&caller, |state| env::read_bool(&state.arena, Handle::from_raw(h)))
    })?;

    linker.func_wrap(NS, "array_len", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| env::array_len(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "array_get",
        |mut caller: Caller<'_, HostState>, h: i32, index: i32| -> i32 {
            call_handle(&mut caller, |_, state| {
                env::array_get(&state.arena, Handle::from_raw(h), index)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "array_append",
        |mut caller: Caller<'_, HostState>, h: i32, item: i32| -> i32 {
            call_status(&mut caller, |_, state| {
                env::array_append(&state.arena, Handle::from_raw(h), Handle::from_raw(item))
            })
        },
    )?;
    linker.func_wrap(NS, "object_len", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| env::object_len(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "object_get",
        |mut caller: Caller<'_, HostState>, h: i32, key_ptr: i32, key_len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let key = memory.read_str(key_ptr, key_len)?;
                env::object_get(&state.arena, Handle::from_raw(h), key)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "object_set",
        |mut caller: Caller<'_, HostState>, h: i32, key_ptr: i32, key_len: i32, item: i32| -> i32 {
            call_status(&mut caller, |memory, state| {
                let key = memory.read_str(key_ptr, key_len)?;
                env::object_set(&state.arena, Handle::from_raw(h), key, Handle::from_raw(item))
            })
        },
    )?;
    linker.func_wrap(NS, "object_keys", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_handle(&mut caller, |_, state| env::object_keys(&state.arena, Handle::from_raw(h)))
    })?;
    Ok(())
}
