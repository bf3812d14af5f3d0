//! Linker registrations, one module per guest import namespace.

mod crypto;
mod env;
mod html;
mod http;
mod json;
mod structs_meta;
mod structs_video;

use anyhow::Result;
use wasmtime::Linker;

use crate::state::HostState;

/// Import namespaces a guest may link against.
pub const NAMESPACES: [&str; 7] = [
    "env",
    "crypto",
    "html",
    "json",
    "http",
    "structs_meta",
    "structs_video",
];

/// Registers every capability with `linker`.
pub fn define_host(linker: &mut Linker<HostState>) -> Result<()> {
    env::define_env_host(linker)?;
    crypto::define_crypto_host(linker)?;
    html::define_html_host(linker)?;
    json::define_json_host(linker)?;
    http::define_http_host(linker)?;
    structs_meta::define_structs_meta_host(linker)?;
    structs_video::define_structs_video_host(linker)?;
    Ok(())
}
