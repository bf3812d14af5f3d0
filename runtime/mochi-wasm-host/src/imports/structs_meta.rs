use anyhow::Result;
use mochi_obj_model::Handle;
use mochi_runtime::structs::meta;
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_handle, flag};

const NS: &str = "structs_meta";

pub(super) fn define_structs_meta_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(
        NS,
        "create_search_filter_option",
        |mut caller: Caller<'_, HostState>, id_ptr: i32, id_len: i32, name_ptr: i32, name_len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let id = memory.read_str(id_ptr, id_len)?;
                let name = memory.read_str(name_ptr, name_len)?;
                Ok(meta::create_search_filter_option(&state.arena, id, name))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_search_filter",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         name_ptr: i32,
         name_len: i32,
         options: i32,
         multiselect: i32,
         required: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let id = memory.read_str(id_ptr, id_len)?;
                let name = memory.read_str(name_ptr, name_len)?;
                meta::create_search_filter(
                    &state.arena,
                    id,
                    name,
                    Handle::from_raw(options),
                    flag(multiselect),
                    flag(required),
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_paging",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         prev_ptr: i32,
         prev_len: i32,
         next_ptr: i32,
         next_len: i32,
         items: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let id = memory.read_str(id_ptr, id_len)?;
                let previous = memory.read_opt_str(prev_ptr, prev_len)?;
                let next = memory.read_opt_str(next_ptr, next_len)?;
                meta::create_paging(&state.arena, id, previous, next, Handle::from_raw(items))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_discover_listing",
        |mut caller: Caller<'_, HostState>, title_ptr: i32, title_len: i32, kind: i32, paging: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let title = memory.read_str(title_ptr, title_len)?;
                meta::create_discover_listing(&state.arena, title, kind, Handle::from_raw(paging))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         title_ptr: i32,
         title_len: i32,
         poster_ptr: i32,
         poster_len: i32,
         banner_ptr: i32,
         banner_len: i32,
         url_ptr: i32,
         url_len: i32,
         status: i32,
         kind: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                meta::create_playlist(
                    &state.arena,
                    memory.read_str(id_ptr, id_len)?,
                    memory.read_opt_str(title_ptr, title_len)?,
                    memory.read_opt_str(poster_ptr, poster_len)?,
                    memory.read_opt_str(banner_ptr, banner_len)?,
                    memory.read_str(url_ptr, url_len)?,
                    status,
                    kind,
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_details",
        |mut caller: Caller<'_, HostState>,
         synopsis_ptr: i32,
         synopsis_len: i32,
         alt_titles: i32,
         alt_posters: i32,
         alt_banners: i32,
         genres: i32,
         year_released: i32,
         ratings: i32,
         previews: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                meta::create_playlist_details(
                    &state.arena,
                    memory.read_opt_str(synopsis_ptr, synopsis_len)?,
                    Handle::from_raw(alt_titles),
                    Handle::from_raw(alt_posters),
                    Handle::from_raw(alt_banners),
                    Handle::from_raw(genres),
                    year_released,
                    ratings,
                    Handle::from_raw(previews),
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_preview",
        |mut caller: Caller<'_, HostState>,
         title_ptr: i32,
         title_len: i32,
         desc_ptr: i32,
         desc_len: i32,
         thumb_ptr: i32,
         thumb_len: i32,
         link_ptr: i32,
         link_len: i32,
         kind: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                meta::create_playlist_preview(
                    &state.arena,
                    memory.read_opt_str(title_ptr, title_len)?,
                    memory.read_opt_str(desc_ptr, desc_len)?,
                    memory.read_opt_str(thumb_ptr, thumb_len)?,
                    memory.read_str(link_ptr, link_len)?,
                    kind,
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_item",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         url_ptr: i32,
         url_len: i32,
         number: f64,
         timestamp_ptr: i32,
         timestamp_len: i32,
         title_ptr: i32,
         title_len: i32,
         desc_ptr: i32,
         desc_len: i32,
         thumb_ptr: i32,
         thumb_len: i32,
         tags: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                meta::create_playlist_item(
                    &state.arena,
                    memory.read_str(id_ptr, id_len)?,
                    memory.read_opt_str(url_ptr, url_len)?,
                    number,
                    memory.read_opt_str(timestamp_ptr, timestamp_len)?,
                    memory.read_opt_str(title_ptr, title_len)?,
                    memory.read_opt_str(desc_ptr, desc_len)?,
                    memory.read_opt_str(thumb_ptr, thumb_len)?,
                    Handle::from_raw(tags),
                )
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_group_page",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         prev_ptr: i32,
         prev_len: i32,
         next_ptr: i32,
         next_len: i32,
         items: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let id = memory.read_str(id_ptr, id_len)?;
                let previous = memory.read_opt_str(prev_ptr, prev_len)?;
                let next = memory.read_opt_str(next_ptr, next_len)?;
                meta::create_playlist_group_page(&state.arena, id, previous, next, Handle::from_raw(items))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_group_variant",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         title_ptr: i32,
         title_len: i32,
         pagings: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let id = memory.read_str(id_ptr, id_len)?;
                let title = memory.read_str(title_ptr, title_len)?;
                meta::create_playlist_group_variant(&state.arena, id, title, Handle::from_raw(pagings))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_group",
        |mut caller: Caller<'_, HostState>,
         id_ptr: i32,
         id_len: i32,
         number: f64,
         alt_ptr: i32,
         alt_len: i32,
         variants: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let id = memory.read_str(id_ptr, id_len)?;
                let alt_title = memory.read_opt_str(alt_ptr, alt_len)?;
                meta::create_playlist_group(&state.arena, id, number, alt_title, Handle::from_raw(variants))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "create_playlist_items_response",
        |mut caller: Caller<'_, HostState>,
         groups: i32,
         group_ptr: i32,
         group_len: i32,
         variant_ptr: i32,
         variant_len: i32|
         -> i32 {
            call_handle(&mut caller, |memory, state| {
                let group = memory.read_opt_str(group_ptr, group_len)?;
                let variant = memory.read_opt_str(variant_ptr, variant_len)?;
                meta::create_playlist_items_response(&state.arena, Handle::from_raw(groups), group, variant)
            })
        },
    )?;
    Ok(())
}
