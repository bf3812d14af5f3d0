//! `http` namespace: request entries that are built up in place, sent, and
//! then read back.
//!
//! The arena lock is never held across a transfer. `send` clones the
//! request description out, performs the transfer unlocked and re-locks
//! only to store the outcome.

use std::time::Duration;

use mochi_obj_model::{Fault, GuestMemory, Handle};
use mochi_runtime_core::{DynObject, DynValue, HostConfig, KeyStyle};
use tracing::debug;
use ureq::{Agent, RequestBuilder};
use url::Url;

use crate::env::copy_out;
use crate::error::HostError;
use crate::value::{HostArena, HostValue};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self, Fault> {
        match code {
            0 => Ok(HttpMethod::Get),
            1 => Ok(HttpMethod::Post),
            2 => Ok(HttpMethod::Put),
            3 => Ok(HttpMethod::Patch),
            4 => Ok(HttpMethod::Delete),
            5 => Ok(HttpMethod::Head),
            other => Err(Fault::cast(format!("unknown http method {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    pub fn parse(name: &str) -> Result<Self, Fault> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            _ => Err(Fault::cast(format!("unsupported http method `{name}`"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A request entry. After `send` it also carries either the response or
/// the transport failure.
#[derive(Clone, Debug, Default)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Option<Url>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub response: Option<HttpResponse>,
    pub failure: Option<Fault>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Sets a header, replacing any existing value case-insensitively.
    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.to_string()));
    }

    fn has_header(&self, key: &str) -> bool {
        self.headers.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(key))
    }

    /// Description of the request without its transfer state.
    fn outgoing(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            response: None,
            failure: None,
        }
    }

    pub fn to_dyn(&self, _style: KeyStyle) -> DynValue {
        let mut object = DynObject::new();
        object.insert("method", DynValue::from(self.method.as_str()));
        object.insert(
            "url",
            self.url
                .as_ref()
                .map(|url| DynValue::from(url.as_str()))
                .unwrap_or(DynValue::Null),
        );
        object.insert(
            "status",
            self.response
                .as_ref()
                .map(|response| DynValue::Number(f64::from(response.status)))
                .unwrap_or(DynValue::Null),
        );
        DynValue::Object(object)
    }
}

/// Blocking transfer client shared by both backends.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
    user_agent: String,
    max_body: usize,
}

impl HttpClient {
    pub fn new(config: &HostConfig) -> Self {
        Self::with_timeout(config, config.http_timeout)
    }

    fn with_timeout(config: &HostConfig, timeout: Duration) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(agent_config),
            user_agent: config.user_agent.clone(),
            max_body: config.max_body_bytes,
        }
    }

    fn headers<B>(&self, mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.has_header("user-agent") {
            builder = builder.header("User-Agent", self.user_agent.as_str());
        }
        builder
    }

    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HostError> {
        let url = request
            .url
            .as_ref()
            .ok_or_else(|| Fault::missing("request has no url"))?
            .as_str();
        let body = request.body.as_deref().unwrap_or_default();
        debug!(method = request.method.as_str(), url, body = body.len(), "http send");
        let result = match request.method {
            HttpMethod::Get => self.headers(self.agent.get(url), request).call(),
            HttpMethod::Head => self.headers(self.agent.head(url), request).call(),
            HttpMethod::Delete => self.headers(self.agent.delete(url), request).call(),
            HttpMethod::Post => self.headers(self.agent.post(url), request).send(body),
            HttpMethod::Put => self.headers(self.agent.put(url), request).send(body),
            HttpMethod::Patch => self.headers(self.agent.patch(url), request).send(body),
        };
        let response = result?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let mut body = response.into_body();
        let body = body.with_config().limit(self.max_body as u64).read_to_vec()?;
        debug!(status, bytes = body.len(), "http response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn edit(
    arena: &HostArena,
    handle: Handle,
    f: impl FnOnce(&mut HttpRequest) -> Result<(), HostError>,
) -> Result<(), HostError> {
    arena.with_mut(handle, |value| f(value.expect_request_mut()?))?
}

fn with_response<R>(
    arena: &HostArena,
    handle: Handle,
    f: impl FnOnce(&HttpResponse) -> R,
) -> Result<R, HostError> {
    let result = arena.with(handle, |value| {
        let request = value.expect_request()?;
        if let Some(failure) = &request.failure {
            return Err(failure.clone());
        }
        request
            .response
            .as_ref()
            .map(f)
            .ok_or_else(|| Fault::missing("request has not been sent"))
    })?;
    Ok(result?)
}

pub fn create(arena: &HostArena, method: i32) -> Result<Handle, HostError> {
    let method = HttpMethod::from_code(method)?;
    Ok(arena.add(HostValue::Request(HttpRequest::new(method))))
}

pub fn set_url(arena: &HostArena, handle: Handle, url: &str) -> Result<(), HostError> {
    let url = Url::parse(url)?;
    edit(arena, handle, |request| {
        request.url = Some(url);
        Ok(())
    })
}

pub fn set_header(arena: &HostArena, handle: Handle, key: &str, value: &str) -> Result<(), HostError> {
    edit(arena, handle, |request| {
        request.set_header(key, value);
        Ok(())
    })
}

pub fn set_body(arena: &HostArena, handle: Handle, body: &[u8]) -> Result<(), HostError> {
    edit(arena, handle, |request| {
        request.body = Some(body.to_vec());
        Ok(())
    })
}

pub fn set_method(arena: &HostArena, handle: Handle, method: i32) -> Result<(), HostError> {
    let method = HttpMethod::from_code(method)?;
    edit(arena, handle, |request| {
        request.method = method;
        Ok(())
    })
}

/// Performs the transfer and stores its outcome in the request entry. A
/// failure is stored as well, so later accessors report it.
pub fn send(arena: &HostArena, client: &HttpClient, handle: Handle) -> Result<(), HostError> {
    let outgoing = arena.with(handle, |value| value.expect_request().map(HttpRequest::outgoing))??;
    let outcome = client.execute(&outgoing).map_err(HostError::into_fault);
    let failure = outcome.as_ref().err().cloned();
    edit(arena, handle, |request| {
        match outcome {
            Ok(response) => {
                request.response = Some(response);
                request.failure = None;
            }
            Err(fault) => {
                request.response = None;
                request.failure = Some(fault);
            }
        }
        Ok(())
    })?;
    match failure {
        Some(fault) => Err(fault.into()),
        None => Ok(()),
    }
}

pub fn get_status_code(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    with_response(arena, handle, |response| i32::from(response.status))
}

pub fn get_header(arena: &HostArena, handle: Handle, key: &str) -> Result<Handle, HostError> {
    let value = with_response(arena, handle, |response| response.header(key).map(str::to_owned))?
        .ok_or_else(|| Fault::missing(format!("response has no `{key}` header")))?;
    Ok(arena.add(HostValue::String(value)))
}

pub fn get_data_len(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    with_response(arena, handle, |response| {
        i32::try_from(response.body.len()).unwrap_or(i32::MAX)
    })
}

pub fn get_data(
    arena: &HostArena,
    memory: &mut GuestMemory<'_>,
    handle: Handle,
    ptr: i32,
    cap: i32,
) -> Result<i32, HostError> {
    let body = with_response(arena, handle, |response| response.body.clone())?;
    copy_out(memory, ptr, cap, &body)
}

pub fn get_method(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    Ok(arena.with(handle, |value| value.expect_request().map(|request| request.method.code()))??)
}

pub fn get_url(arena: &HostArena, handle: Handle) -> Result<Handle, HostError> {
    let url = arena.with(handle, |value| {
        value.expect_request().and_then(|request| {
            request
                .url
                .as_ref()
                .map(|url| url.as_str().to_string())
                .ok_or_else(|| Fault::missing("request has no url"))
        })
    })??;
    Ok(arena.add(HostValue::String(url)))
}

/// Releases the transfer bodies. The entry and its status stay readable.
pub fn close(arena: &HostArena, handle: Handle) -> Result<(), HostError> {
    edit(arena, handle, |request| {
        request.body = None;
        if let Some(response) = request.response.as_mut() {
            response.body = Vec::new();
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mochi_obj_model::FaultKind;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn test_client() -> HttpClient {
        HttpClient::with_timeout(&HostConfig::default(), Duration::from_secs(5))
    }

    /// Serves one canned response and returns the raw request it received.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api", listener.local_addr().unwrap());
        let worker = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            head.push_str(&String::from_utf8_lossy(&body));
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            head
        });
        (url, worker)
    }

    #[test]
    fn unreachable_host_faults_instead_of_crashing() {
        let arena = HostArena::new();
        let client = test_client();
        let request = create(&arena, HttpMethod::Get.code()).unwrap();
        set_url(&arena, request, "https://unreachable.test").unwrap();
        let err = send(&arena, &client, request).unwrap_err();
        assert_eq!(err.kind(), FaultKind::TransportError);
        let status = get_status_code(&arena, request).unwrap_err();
        assert_eq!(status.kind(), FaultKind::TransportError);
        assert_eq!(get_method(&arena, request).unwrap(), HttpMethod::Get.code());
    }

    #[test]
    fn accessors_before_send_report_missing() {
        let arena = HostArena::new();
        let request = create(&arena, HttpMethod::Post.code()).unwrap();
        assert_eq!(
            get_status_code(&arena, request).unwrap_err().kind(),
            FaultKind::NullOrMissing
        );
        assert_eq!(get_url(&arena, request).unwrap_err().kind(), FaultKind::NullOrMissing);
        assert_eq!(create(&arena, 42).unwrap_err().kind(), FaultKind::CastError);
    }

    #[test]
    fn send_writes_response_back_into_entry() {
        let (url, server) = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"ok\":true}",
        );
        let arena = HostArena::new();
        let client = test_client();
        let request = create(&arena, HttpMethod::Post.code()).unwrap();
        set_url(&arena, request, &url).unwrap();
        set_header(&arena, request, "X-Token", "abc").unwrap();
        set_body(&arena, request, b"q=frieren").unwrap();
        send(&arena, &client, request).unwrap();

        assert_eq!(get_status_code(&arena, request).unwrap(), 201);
        let content_type = get_header(&arena, request, "content-type").unwrap();
        assert_eq!(
            arena.get(content_type).unwrap().expect_str().unwrap(),
            "application/json"
        );
        assert_eq!(get_data_len(&arena, request).unwrap(), 11);
        let mut data = vec![0u8; 32];
        let mut memory = GuestMemory::new(&mut data);
        assert_eq!(get_data(&arena, &mut memory, request, 8, 32).unwrap(), 11);
        assert_eq!(&data[8..19], b"{\"ok\":true}");

        close(&arena, request).unwrap();
        assert_eq!(get_data_len(&arena, request).unwrap(), 0);
        assert_eq!(get_status_code(&arena, request).unwrap(), 201);

        let received = server.join().unwrap();
        assert!(received.starts_with("POST /api HTTP/1.1"));
        assert!(received.to_ascii_lowercase().contains("x-token: abc"));
        assert!(received.ends_with("q=frieren"));
    }

    #[test]
    fn header_replacement_is_case_insensitive() {
        let mut request = HttpRequest::new(HttpMethod::Get);
        request.set_header("Referer", "a");
        request.set_header("referer", "b");
        assert_eq!(request.headers, vec![("referer".to_string(), "b".to_string())]);
    }

    #[test]
    fn method_names_parse() {
        assert_eq!(HttpMethod::parse("patch").unwrap(), HttpMethod::Patch);
        assert!(HttpMethod::parse("BREW").is_err());
        assert_eq!(HttpMethod::from_code(5).unwrap().as_str(), "HEAD");
    }
}
