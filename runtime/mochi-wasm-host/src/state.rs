use mochi_obj_model::{GuestMemory, Handle};
use mochi_runtime::{
    HostArena, HostError, HttpClient, translate, translate_count, translate_scalar, translate_status,
};
use mochi_runtime_core::HostConfig;
use wasmtime::{Caller, Extern, Memory};

/// Per-instance data carried by the wasmtime store.
pub struct HostState {
    pub(crate) memory: Option<Memory>,
    pub(crate) arena: HostArena,
    pub(crate) http: HttpClient,
    pub(crate) module_id: String,
}

impl HostState {
    pub fn new(module_id: impl Into<String>, config: &HostConfig) -> Self {
        Self {
            memory: None,
            arena: HostArena::new(),
            http: HttpClient::new(config),
            module_id: module_id.into(),
        }
    }

    pub fn arena(&self) -> &HostArena {
        &self.arena
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }
}

fn ensure_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    if let Some(mem) = caller.data().memory {
        return Some(mem);
    }
    let mem = caller.get_export("memory").and_then(Extern::into_memory)?;
    caller.data_mut().memory = Some(mem);
    Some(mem)
}

/// Runs `f` with the guest's memory and the host state borrowed together.
/// A guest without exported memory sees an empty view, so every non-null
/// span it passes is reported as a memory fault.
pub(crate) fn with_memory<R>(
    caller: &mut Caller<'_, HostState>,
    f: impl FnOnce(&mut GuestMemory<'_>, &mut HostState) -> R,
) -> R {
    match ensure_memory(caller) {
        Some(memory) => {
            let (data, state) = memory.data_and_store_mut(caller);
            f(&mut GuestMemory::new(data), state)
        }
        None => f(&mut GuestMemory::new(&mut []), caller.data_mut()),
    }
}

pub(crate) fn call_handle(
    caller: &mut Caller<'_, HostState>,
    op: impl FnOnce(&mut GuestMemory<'_>, &HostState) -> Result<Handle, HostError>,
) -> i32 {
    with_memory(caller, |memory, state| {
        let state = &*state;
        translate(&state.arena, || op(memory, state)).raw()
    })
}

pub(crate) fn call_status(
    caller: &mut Caller<'_, HostState>,
    op: impl FnOnce(&mut GuestMemory<'_>, &HostState) -> Result<(), HostError>,
) -> i32 {
    with_memory(caller, |memory, state| {
        let state = &*state;
        translate_status(&state.arena, || op(memory, state))
    })
}

pub(crate) fn call_count(
    caller: &mut Caller<'_, HostState>,
    op: impl FnOnce(&mut GuestMemory<'_>, &HostState) -> Result<i32, HostError>,
) -> i32 {
    with_memory(caller, |memory, state| {
        let state = &*state;
        translate_count(&state.arena, || op(memory, state))
    })
}

pub(crate) fn call_scalar<T: Default>(
    caller: &Caller<'_, HostState>,
    op: impl FnOnce(&HostState) -> Result<T, HostError>,
) -> T {
    let state = caller.data();
    translate_scalar(&state.arena, || op(state))
}

pub(crate) fn flag(raw: i32) -> bool {
    raw != 0
}
