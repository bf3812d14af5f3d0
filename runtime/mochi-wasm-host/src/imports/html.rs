use anyhow::Result;
use mochi_obj_model::Handle;
use mochi_runtime::html::{self, Step, TextOp};
use mochi_runtime::{HostValue, env};
use wasmtime::{Caller, Linker};

use crate::state::{HostState, call_count, call_handle, call_status};

const NS: &str = "html";

const STEPS: [(&str, Step); 5] = [
    ("first", Step::First),
    ("last", Step::Last),
    ("next", Step::Next),
    ("previous", Step::Previous),
    ("parent", Step::Parent),
];

const TEXT_OPS: [(&str, TextOp); 6] = [
    ("text", TextOp::Text),
    ("untrimmed_text", TextOp::UntrimmedText),
    ("own_text", TextOp::OwnText),
    ("id", TextOp::Id),
    ("tag_name", TextOp::TagName),
    ("class_name", TextOp::ClassName),
];

pub(super) fn define_html_host(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(
        NS,
        "parse",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32, base_ptr: i32, base_len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let markup = memory.read_str(ptr, len)?;
                let base_uri = memory.read_opt_str(base_ptr, base_len)?;
                Ok(html::parse(&state.arena, markup, base_uri))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "parse_fragment",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32, base_ptr: i32, base_len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                let markup = memory.read_str(ptr, len)?;
                let base_uri = memory.read_opt_str(base_ptr, base_len)?;
                Ok(html::parse_fragment(&state.arena, markup, base_uri))
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "select",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                html::select(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "attr",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_handle(&mut caller, |memory, state| {
                html::attr(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "set_attr",
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
                html::set_attr(&state.arena, Handle::from_raw(h), key, value)
            })
        },
    )?;
    linker.func_wrap(NS, "html", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_handle(&mut caller, |_, state| html::html(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "set_html",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_status(&mut caller, |memory, state| {
                html::set_html(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(NS, "outer_html", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_handle(&mut caller, |_, state| html::outer_html(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(
        NS,
        "set_outer_html",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_status(&mut caller, |memory, state| {
                html::set_outer_html(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;

    for (name, step) in STEPS {
        linker.func_wrap(NS, name, move |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
            call_handle(&mut caller, |_, state| html::navigate(&state.arena, Handle::from_raw(h), step))
        })?;
    }
    for (name, op) in TEXT_OPS {
        linker.func_wrap(NS, name, move |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
            call_handle(&mut caller, |_, state| html::text(&state.arena, Handle::from_raw(h), op))
        })?;
    }

    linker.func_wrap(
        NS,
        "has_class",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_count(&mut caller, |memory, state| {
                html::has_class(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(
        NS,
        "has_attr",
        |mut caller: Caller<'_, HostState>, h: i32, ptr: i32, len: i32| -> i32 {
            call_count(&mut caller, |memory, state| {
                html::has_attr(&state.arena, Handle::from_raw(h), memory.read_str(ptr, len)?)
            })
        },
    )?;
    linker.func_wrap(NS, "size", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_count(&mut caller, |_, state| html::size(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(NS, "array", |mut caller: Caller<'_, HostState>, h: i32| -> i32 {
        call_handle(&mut caller, |_, state| html::array(&state.arena, Handle::from_raw(h)))
    })?;
    linker.func_wrap(NS, "escape", |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
        call_handle(&mut caller, |memory, state| {
            let escaped = html::escape(memory.read_str(ptr, len)?);
            Ok(env::create(&state.arena, HostValue::String(escaped)))
        })
    })?;
    linker.func_wrap(NS, "unescape", |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
        call_handle(&mut caller, |memory, state| {
            let unescaped = html::unescape(memory.read_str(ptr, len)?);
            Ok(env::create(&state.arena, HostValue::String(unescaped)))
        })
    })?;
    Ok(())
}
