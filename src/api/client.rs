//! Purpose: Talk to the chart storage API: token issuance, save and fetch of drawings.
//! Exports: `ClientConfig`, `DrawingsClient`, endpoint defaults.
//! Role: Thin orchestration over a `Transport`; all shaping lives in builder/parser.
//! Invariants: Every storage call first obtains a fresh access token; no retries, no caching.
//! Invariants: Validation failures are raised before the transport is touched.
//! Invariants: Non-2xx responses become `ErrorKind::Api` carrying the HTTP status.
#![allow(clippy::result_large_err)]

use super::model::{Credentials, DrawingBundle};
use super::parser::{ParsedResponse, parse};
use super::transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
use crate::core::error::{Error, ErrorKind, validation};
use crate::json::parse::from_str;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://charts-storage.tradingview.com/charts-storage";
pub const DEFAULT_TOKEN_URL: &str = "https://www.tradingview.com/chart-token";
pub const DEFAULT_CHART_ID: &str = "_shared";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    token_url: String,
    default_chart_id: String,
    headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new() -> Self {
        let headers = [
            ("accept", "*/*"),
            ("cache-control", "no-cache"),
            ("content-type", "application/json"),
            ("origin", "https://www.tradingview.com"),
            ("pragma", "no-cache"),
            ("referer", "https://www.tradingview.com/"),
            ("user-agent", USER_AGENT),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            default_chart_id: DEFAULT_CHART_ID.to_string(),
            headers,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, Error> {
        self.base_url = normalize_url(base_url.into(), "base url")?.to_string();
        Ok(self)
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Result<Self, Error> {
        self.token_url = normalize_url(token_url.into(), "token url")?.to_string();
        Ok(self)
    }

    pub fn with_default_chart_id(mut self, chart_id: impl Into<String>) -> Self {
        self.default_chart_id = chart_id.into();
        self
    }

    /// Adds or replaces a default request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn default_chart_id(&self) -> &str {
        &self.default_chart_id
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct TokenEnvelope {
    #[serde(default)]
    token: Option<String>,
}

pub struct DrawingsClient<T: Transport = UreqTransport> {
    config: ClientConfig,
    credentials: Credentials,
    transport: T,
}

impl DrawingsClient<UreqTransport> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_transport(credentials, UreqTransport::new())
    }
}

impl<T: Transport> DrawingsClient<T> {
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        Self {
            config: ClientConfig::new(),
            credentials,
            transport,
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Mints a short-lived access token scoped to `layout_id`.
    pub fn issue_access_token(&self, layout_id: &str) -> Result<String, Error> {
        let Some(cookie) = self.credentials.auth_cookie() else {
            return Err(Error::new(ErrorKind::Auth)
                .with_message("session credentials required for access token")
                .with_hint("Configure a session (and signature) before saving or fetching."));
        };
        let mut url = parse_url(&self.config.token_url)?;
        url.query_pairs_mut()
            .append_pair("image_url", layout_id)
            .append_pair("user_id", &self.credentials.user_id().to_string());

        let mut request = HttpRequest::new(Method::Get, url);
        request.headers.push(("cookie".to_string(), cookie));
        request
            .headers
            .push(("user-agent".to_string(), USER_AGENT.to_string()));

        let response = self.send(&request)?;
        let envelope: TokenEnvelope = from_str(&response.body, "token response")?;
        envelope
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::Auth).with_message("token endpoint returned no token")
            })
    }

    pub fn save_drawings(
        &self,
        layout_id: &str,
        bundle: &DrawingBundle,
        chart_id: Option<&str>,
    ) -> Result<Value, Error> {
        let body = serde_json::to_value(bundle).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode drawing bundle")
                .with_source(err)
        })?;
        self.save_drawings_value(layout_id, body, chart_id)
    }

    /// Saves an already-encoded bundle; it must be an object with a `sources` object.
    pub fn save_drawings_value(
        &self,
        layout_id: &str,
        bundle: Value,
        chart_id: Option<&str>,
    ) -> Result<Value, Error> {
        require_layout_id(layout_id)?;
        let source_count = match bundle.get("sources") {
            Some(Value::Object(sources)) => sources.len(),
            _ => {
                return Err(validation(
                    "sources",
                    "drawing data with sources is required",
                ));
            }
        };

        let token = self.issue_access_token(layout_id)?;
        let chart_id = chart_id.unwrap_or(self.config.default_chart_id.as_str());
        let mut url = self.storage_url(&["layout", layout_id, "sources"])?;
        url.query_pairs_mut()
            .append_pair("chart_id", chart_id)
            .append_pair("layout_id", layout_id)
            .append_pair("jwt", &token);

        let mut request = HttpRequest::new(Method::Put, url);
        request.headers = self.config.headers.clone();
        if let Some(cookie) = self.credentials.auth_cookie() {
            request.headers.push(("cookie".to_string(), cookie));
        }
        request.body = Some(bundle);

        let response = self.send(&request)?;
        tracing::info!(layout_id, chart_id, source_count, "saved drawings");
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        from_str(&response.body, "save response")
    }

    /// Returns the `payload` object (`sources` + `drawing_groups`) of the fetch response.
    pub fn get_drawings(
        &self,
        layout_id: &str,
        chart_id: Option<&str>,
        symbol: Option<&str>,
    ) -> Result<Value, Error> {
        let mut envelope = self.fetch_envelope(layout_id, chart_id, symbol)?;
        match envelope.get_mut("payload").map(Value::take) {
            Some(payload) if !payload.is_null() => Ok(payload),
            _ => Err(Error::new(ErrorKind::Parse).with_message("no drawing data found")),
        }
    }

    /// Fetches and runs the full response envelope through [`parse`].
    pub fn get_parsed_drawings(
        &self,
        layout_id: &str,
        chart_id: Option<&str>,
        symbol: Option<&str>,
    ) -> Result<ParsedResponse, Error> {
        let envelope = self.fetch_envelope(layout_id, chart_id, symbol)?;
        if envelope.get("payload").is_none_or(Value::is_null) {
            return Err(Error::new(ErrorKind::Parse).with_message("no drawing data found"));
        }
        parse(&envelope)
    }

    fn fetch_envelope(
        &self,
        layout_id: &str,
        chart_id: Option<&str>,
        symbol: Option<&str>,
    ) -> Result<Value, Error> {
        require_layout_id(layout_id)?;
        let token = self.issue_access_token(layout_id)?;
        let chart_id = chart_id.unwrap_or(self.config.default_chart_id.as_str());
        let mut url = self.storage_url(&["get", "layout", layout_id, "sources"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("chart_id", chart_id);
            pairs.append_pair("jwt", &token);
            if let Some(symbol) = symbol.filter(|symbol| !symbol.is_empty()) {
                pairs.append_pair("symbol", symbol);
            }
        }

        let mut request = HttpRequest::new(Method::Get, url);
        request.headers = self.config.headers.clone();
        let response = self.send(&request)?;
        from_str(&response.body, "drawings response")
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        // The query carries the access token; log the path only.
        tracing::debug!(method = request.method.as_str(), path = request.url.path(), "sending request");
        let response = self.transport.send(request)?;
        tracing::debug!(status = response.status, "received response");
        if !response.is_success() {
            return Err(Error::new(ErrorKind::Api)
                .with_message(format!(
                    "API error {}: {}",
                    response.status, response.status_text
                ))
                .with_status(response.status));
        }
        Ok(response)
    }

    fn storage_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = parse_url(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::Validation).with_message("base url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn require_layout_id(layout_id: &str) -> Result<(), Error> {
    if layout_id.is_empty() {
        return Err(validation("layoutId", "layout id is required"));
    }
    Ok(())
}

fn parse_url(raw: &str) -> Result<Url, Error> {
    Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Validation)
            .with_message("invalid url")
            .with_source(err)
    })
}

fn normalize_url(raw: String, what: &str) -> Result<Url, Error> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Validation)
            .with_message(format!("invalid {what}"))
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Validation)
            .with_message(format!("{what} must use http or https scheme")));
    }
    url.set_query(None);
    url.set_fragment(None);
    if url.path().len() > 1 && url.path().ends_with('/') {
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    Ok(url)
}
