//! Purpose: Abstract the HTTP exchange behind a small `Transport` capability.
//! Exports: `Transport`, `HttpRequest`, `HttpResponse`, `Method`, `UreqTransport`.
//! Role: Seam between `DrawingsClient` and the network; tests substitute in-memory impls.
//! Invariants: Any HTTP status is a successful exchange; only transport failures are `Err`.
//! Invariants: Transport failures map to `ErrorKind::Request` with the cause attached.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use serde_json::Value;
use url::Url;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Full URL, query parameters included.
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let mut call = self
            .agent
            .request(request.method.as_str(), request.url.as_str());
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                call.set("Content-Type", "application/json")
                    .send_string(&payload)
            }
            None => call.call(),
        };

        match result {
            Ok(resp) => read_response(resp),
            Err(ureq::Error::Status(_, resp)) => read_response(resp),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Request)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn read_response(response: ureq::Response) -> Result<HttpResponse, Error> {
    let status = response.status();
    let status_text = response.status_text().to_string();
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Request)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    Ok(HttpResponse {
        status,
        status_text,
        body,
    })
}
