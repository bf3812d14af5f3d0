//! Native functions the prelude wraps into `console` and `request`.

use std::collections::BTreeMap;
use std::rc::Rc;

use mochi_obj_model::{Fault, Handle};
use mochi_runtime::{HostArena, HostError, HttpClient, HttpMethod, HttpResponse, http, translate};
use rquickjs::{Ctx, Function};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, error, info, warn};

/// Host side of one script instance.
pub(crate) struct ScriptState {
    pub(crate) module_id: String,
    pub(crate) arena: HostArena,
    pub(crate) http: HttpClient,
}

pub(crate) fn install(ctx: &Ctx<'_>, state: &Rc<ScriptState>) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    let log_state = Rc::clone(state);
    globals.set(
        "__mochi_log",
        Function::new(ctx.clone(), move |level: String, message: String| {
            console(&log_state.module_id, &level, &message);
        })?,
    )?;

    let request_state = Rc::clone(state);
    globals.set(
        "__mochi_native_request",
        Function::new(
            ctx.clone(),
            move |method: String, url: String, headers: String, body: String| -> String {
                native_request(&request_state, &method, &url, &headers, &body).to_string()
            },
        )?,
    )?;
    Ok(())
}

fn console(module: &str, level: &str, message: &str) {
    match level {
        "error" => error!(module, guest_message = %message, "guest console"),
        "warn" => warn!(module, guest_message = %message, "guest console"),
        "debug" => debug!(module, guest_message = %message, "guest console"),
        _ => info!(module, guest_message = %message, "guest console"),
    }
}

fn body_bytes(body: &str) -> Result<Option<Vec<u8>>, HostError> {
    match serde_json::from_str(body)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(text) => Ok(Some(text.into_bytes())),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|byte| u8::try_from(byte).ok())
                    .ok_or_else(|| Fault::cast(format!("request body byte {item} out of range")).into())
            })
            .collect::<Result<Vec<_>, HostError>>()
            .map(Some),
        other => Err(Fault::cast(format!("unsupported request body {other}")).into()),
    }
}

/// Builds, sends and reads back one request through the `http` capability,
/// so script transfers share the fault taxonomy with bytecode guests.
fn native_request(state: &ScriptState, method: &str, url: &str, headers: &str, body: &str) -> JsonValue {
    let arena = &state.arena;
    let handle = translate(arena, || {
        let request = http::create(arena, HttpMethod::parse(method)?.code())?;
        http::set_url(arena, request, url)?;
        let headers: BTreeMap<String, String> = serde_json::from_str(headers)?;
        for (key, value) in &headers {
            http::set_header(arena, request, key, value)?;
        }
        if let Some(body) = body_bytes(body)? {
            http::set_body(arena, request, &body)?;
        }
        http::send(arena, &state.http, request)?;
        Ok(request)
    });
    match response(arena, handle) {
        Ok(response) => {
            let text = String::from_utf8_lossy(&response.body).into_owned();
            let headers: serde_json::Map<String, JsonValue> = response
                .headers
                .into_iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), JsonValue::String(value)))
                .collect();
            json!({
                "status": response.status,
                "headers": headers,
                "url": url,
                "body": response.body,
                "text": text,
            })
        }
        Err(fault) => json!({
            "error": { "kind": fault.kind.to_string(), "message": fault.message },
        }),
    }
}

fn response(arena: &HostArena, handle: Handle) -> Result<HttpResponse, Fault> {
    if handle.is_fault() {
        return Err(arena
            .fault(handle)
            .unwrap_or_else(|| Fault::unknown("request failed without a recorded fault")));
    }
    arena
        .with(handle, |value| {
            value
                .expect_request()
                .and_then(|request| {
                    request
                        .response
                        .clone()
                        .ok_or_else(|| Fault::missing("request has not been sent"))
                })
        })?
}
