//! Shared vocabulary of the Mochi module host: domain records, the dynamic
//! value codec, host configuration and the contract every execution
//! backend implements.

mod backend;
mod client;
pub mod codec;
pub mod config;
mod dyn_value;
pub mod records;

pub use backend::{ModuleBackend, ModuleError};
pub use client::{
    ENTRY_DISCOVER_LISTINGS, ENTRY_PLAYLIST_DETAILS, ENTRY_PLAYLIST_EVENTS, ENTRY_PLAYLIST_SERVER,
    ENTRY_PLAYLIST_SOURCES, ENTRY_SEARCH, ENTRY_SEARCH_FILTERS, ModuleClient,
};
pub use codec::{DecodeContext, DecodeError, DynDecode, DynEncode, KeyStyle, decode, encode};
pub use config::{BackendKind, HostConfig, ModuleManifest};
pub use dyn_value::{DynObject, DynValue};
pub use records::{Paging, Record};
