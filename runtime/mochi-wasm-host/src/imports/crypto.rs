use anyhow::Result;
use mochi_obj_model::Handle;
use mochi_runtime::crypto;
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_count, call_handle};

const NS: &str = "crypto";

pub(super) fn define_crypto_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(NS, "get_data_len", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| crypto::get_data_len(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "get_data",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, cap: i32| -> i32 {
            call_count(&mut caller, |memory, state| {
                crypto::get_data(&state.arena, memory, Handle::from_raw(h), ptr, cap)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "base64_encode",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                Ok(crypto::base64_encode(&state.arena, memory.read_bytes(ptr, len)?))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "base64_decode",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                crypto::base64_decode(&state.arena, memory.read_bytes(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "utf8_parse",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                crypto::utf8_parse(&state.arena, memory.read_bytes(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "hash",
        |mut caller: Caller<'_, HostState>, kind: i32, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                crypto::hash(&state.arena, kind, memory.read_bytes(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "pbkdf2",
        |mut caller: Caller<'_, HostState>,
         kind: i32,
         pass_ptr: i32,
         pass_len: i32,
         salt_ptr: i32,
         salt_len: i32,
         rounds: i32,
         key_len: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let password = memory.read_bytes(pass_ptr, pass_len)?;
                let salt = memory.read_bytes(salt_ptr, salt_len)?;
                crypto::pbkdf2(&state.arena, kind, password, salt, rounds, key_len)
            })
        },
    )?;
    linker.func_wrap(NS, "random_bytes", |mut caller: Caller<'_, HostState>, len: i32| -> i32 {
        call_handle(&mut caller, |_, state| crypto::random_bytes(&state.arena, len))
    })?;
    linker.func_wrap(
        NS,
        "aes_encrypt",
        |mut caller: Caller<'_, HostState>,
         data_ptr: i32,
         data_len: i32,
         key_ptr: i32,
         key_len: i32,
         iv_ptr: i32,
         iv_len: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let data = memory.read_bytes(data_ptr, data_len)?;
                let key = memory.read_bytes(key_ptr, key_len)?;
                let iv = memory.read_bytes(iv_ptr, iv_len)?;
                crypto::aes_encrypt(&state.arena, data, key, iv)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "aes_decrypt",
        |mut caller: Caller<'_, HostState>,
         data_ptr: i32,
         data_len: i32,
         key_ptr: i32,
         key_len: i32,
         iv_ptr: i32,
         iv_len: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let data = memory.read_bytes(data_ptr, data_len)?;
                let key = memory.read_bytes(key_ptr, key_len)?;
                let iv = memory.read_bytes(iv_ptr, iv_len)?;
                crypto::aes_decrypt(&state.arena, data, key, iv)
            })
        },
    )?;
    Ok(())
}
