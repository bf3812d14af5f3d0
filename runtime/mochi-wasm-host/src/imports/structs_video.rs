use anyhow::Result;
use mochi_obj_model::Handle;
use mochi_runtime::structs::video;
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_handle, flag};

const NS: &str = "structs_video";

pub(super) fn define_structs_video_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(
        NS,
        "create_episode_source",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         name_ptr: i32,
         name_len: i32,
         desc_ptr: i32,
         desc_len: i32,
         servers: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                video::create_episode_source(
                    &state.arena,
                    memory.read_str(id_ptr, id_len)?,
                    memory.read_str(name_ptr, name_len)?,
                    memory.read_opt_str(desc_ptr, desc_len)?,
                    Handle::from_raw(servers),
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_episode_server",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         name_ptr: i32,
         name_len: i32,
         desc_ptr: i32,
         desc_len: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                Ok(video::create_episode_server(
                    &state.arena,
                    memory.read_str(id_ptr, id_len)?,
                    memory.read_str(name_ptr, name_len)?,
                    memory.read_opt_str(desc_ptr, desc_len)?,
                ))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_episode_server_response",
        |mut caller: Caller<'_, HostState>, links: i32, subtitles: i32, skip_times: i32, headers: i32| -> i32 {
            call_handle(&mut caller, |_, state| {
                video::create_episode_server_response(
                    &state.arena,
                    Handle::from_raw(links),
                    Handle::from_raw(subtitles),
                    Handle::from_raw(skip_times),
                    Handle::from_raw(headers),
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_episode_server_link",
        |mut caller: Caller<'_, HostState>, url_ptr: i32, url_len: i32, quality: i32, format: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let url = memory.read_str(url_ptr, url_len)?;
                video::create_episode_server_link(&state.arena, url, quality, format)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_episode_server_subtitle",
        |mut caller: Caller<'_, HostState>,
         url_ptr: i32,
         url_len: i32,
         name_ptr: i32,
         name_len: i32,
         format: i32,
         is_default: i32,
         autoselect: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                video::create_episode_server_subtitle(
                    &state.arena,
                    memory.read_str(url_ptr, url_len)?,
                    memory.read_str(name_ptr, name_len)?,
                    format,
                    flag(is_default),
                    flag(autoselect),
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_skip_time",
        |mut caller: Caller<'_, HostState>, start: f64, end: f64, kind: i32| -> i32 {
            call_handle(&mut caller, |_, state| video::create_skip_time(&state.arena, start, end, kind))
        },
    )?;
    Ok(())
}
