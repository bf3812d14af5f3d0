use anyhow::Result;
use mochi_runtime::json;
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_handle};

pub(super) fn define_json_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap("json", "parse", |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
        call_handle(&mut caller, |memory, state| json::parse(&state.arena, memory.read_bytes(ptr, len)?))
    })?;
    Ok(())
}
