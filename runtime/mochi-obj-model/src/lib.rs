//! Core object model for the Mochi module host.
//!
//! Guests never see host pointers. Everything they receive is a signed
//! 32-bit [`Handle`] into an [`Arena`]: non-negative handles name live
//! values, negative handles name [`Fault`]s. The two ranges grow away from
//! each other and are never reused until the arena is reset, so a stale
//! handle can never alias an unrelated value within one invocation.
//!
//! [`GuestMemory`] is the bounds-checked view over a guest's linear memory
//! that every byte span crossing the boundary is decoded through.

mod arena;
mod fault;
mod handle;
mod memory;

pub use arena::Arena;
pub use fault::{Fault, FaultKind};
pub use handle::Handle;
pub use memory::GuestMemory;
