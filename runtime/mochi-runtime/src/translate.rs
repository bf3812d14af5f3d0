//! Every capability call runs through one of these wrappers. Errors and
//! panics alike become a fault in the arena and the guest sees only the
//! negative handle.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use mochi_obj_model::{Fault, Handle};
use tracing::debug;

use crate::error::HostError;
use crate::value::HostArena;

fn run<T>(op: impl FnOnce() -> Result<T, HostError>) -> Result<T, Fault> {
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.into_fault()),
        Err(payload) => Err(Fault::unknown(format!(
            "capability panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

fn record(arena: &HostArena, fault: Fault) -> Handle {
    debug!(kind = %fault.kind, message = %fault.message, "capability fault");
    arena.add_fault(fault)
}

/// For calls that return a handle.
pub fn translate(arena: &HostArena, op: impl FnOnce() -> Result<Handle, HostError>) -> Handle {
    run(op).unwrap_or_else(|fault| record(arena, fault))
}

/// For calls that return `0` on success.
pub fn translate_status(arena: &HostArena, op: impl FnOnce() -> Result<(), HostError>) -> i32 {
    match run(op) {
        Ok(()) => 0,
        Err(fault) => record(arena, fault).raw(),
    }
}

/// For calls that return a non-negative count, length or code; a failure
/// returns the fault handle in its place.
pub fn translate_count(arena: &HostArena, op: impl FnOnce() -> Result<i32, HostError>) -> i32 {
    match run(op) {
        Ok(count) => count.max(0),
        Err(fault) => record(arena, fault).raw(),
    }
}

/// For calls whose result has no room for a handle. The fault is still
/// recorded; the guest receives the type's default.
pub fn translate_scalar<T: Default>(arena: &HostArena, op: impl FnOnce() -> Result<T, HostError>) -> T {
    run(op).unwrap_or_else(|fault| {
        record(arena, fault);
        T::default()
    })
}
