use anyhow::Result;
use mochi_obj_model::Handle;
use mochi_runtime::http;
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_count, call_handle, call_status};

const NS: &str = "http";

pub(super) fn define_http_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(NS, "create", |mut caller: Caller<'_, HostState>, method: i32| -> i32 {
        call_handle(&mut caller, |_, state| http::create(&state.arena, method))
    })?;
    linker.func_wrap(
        NS,
        "set_url",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_status(&mut caller, |memory, state| {
                http::set_url(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "set_header",
        |mut caller: Caller<'_, HostState>,
         h: i32,
         key_ptr: i32,
         key_len: i32,
         value_ptr: i32,
         value_len: i32|
         -> i32 {
            call_status(&mut caller, |memory, state| {
                let key = memory.read_str(key_ptr, key_len)?;
                let value = memory.read_str(value_ptr, value_len)?;
                http::set_header(&state.arena, Handle::from_raw(h), key, value)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "set_body",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_status(&mut caller, |memory, state| {
                http::set_body(&state.arena, Handle::from_raw(h), memory.read_bytes(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "set_method",
        |mut caller: Caller<'_, HostState>, h: i32, method: i32| -> i32 {
            call_status(&mut caller, |_, state| {
                http::set_method(&state.arena, Handle::from_raw(h), method)
            })
        },
    )?;
    linker.func_wrap(NS, "send", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_status(&mut caller, |_, state| {
            http::send(&state.arena, &state.http, Handle::from_raw(h))
        })
    })?;
    linker.func_wrap(NS, "get_status_code", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| http::get_status_code(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "get_header",
        |mut caller: Caller<'_, HostState>, h: i32, key_ptr: i32, key_len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let key = memory.read_str(key_ptr, key_len)?;
                http::get_header(&state.arena, Handle::from_raw(h), key)
            })
        },
    )?;
    linker.func_wrap(NS, "get_data_len", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| http::get_data_len(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "get_data",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, cap: i32| -> i32 {
            call_count(&mut caller, |memory, state| {
                http::get_data(&state.arena, memory, Handle::from_raw(h), ptr, cap)
            })
        },
    )?;
    linker.func_wrap(NS, "get_method", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| http::get_method(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(NS, "get_url", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_handle(&mut caller, |_, state| http::get_url(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(NS, "close", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_status(&mut caller, |_, state| http::close(&state.arena, Handle::from_raw(h)))
    })?;
    Ok(())
}
