/*
[INPUT]:  HTTP configuration (base URL, timeouts, credentials) and request specs
[OUTPUT]: Executed signed/unsigned REST calls with parsed JSON bodies
[POS]:    HTTP layer - core client implementation and authenticated fetch pipeline
[UPDATE]: When adding connection options or changing request signing flow
*/

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::http::clock::{ClockSync, now_ms};
use crate::http::signature::{RequestSigner, canonicalize};
use crate::http::{BinanceError, Result};
use crate::types::ServerTime;

/// Base URL for the Binance spot REST API
const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Header carrying the API key on signed requests
pub const API_KEY_HEADER: &str = "x-mbx-apikey";

const TIME_ENDPOINT: &str = "/api/v3/time";

/// Default environment variables read by [`Credentials::from_default_env`]
pub const API_KEY_ENV: &str = "BINANCE_API_KEY";
pub const API_SECRET_ENV: &str = "BINANCE_API_SECRET";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Refresh the clock offset before every signed call
    pub sync_before_signed: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            sync_before_signed: true,
        }
    }
}

/// API key pair for signed requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read both halves from the given environment variables.
    ///
    /// Returns `None` if either variable is unset.
    pub fn from_env(api_key_env: &str, api_secret_env: &str) -> Option<Self> {
        let api_key = std::env::var(api_key_env).ok()?;
        let api_secret = std::env::var(api_secret_env).ok()?;
        Some(Self::new(api_key, api_secret))
    }

    /// Read `BINANCE_API_KEY` / `BINANCE_API_SECRET`
    pub fn from_default_env() -> Option<Self> {
        Self::from_env(API_KEY_ENV, API_SECRET_ENV)
    }

    /// Both halves present and non-empty
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// One REST call: endpoint, method, extra headers, ordered parameters and
/// whether it must be signed.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    endpoint: String,
    method: Method,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    signed: bool,
}

impl RequestSpec {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            headers: HeaderMap::new(),
            params: Vec::new(),
            signed: false,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Set a parameter. An existing key keeps its position and gets the new value.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        set_param(&mut self.params, key.into(), value.to_string());
        self
    }

    /// Set a parameter only when a value is present
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Mark the request as requiring a timestamp, signature and API key
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }
}

fn set_param(params: &mut Vec<(String, String)>, key: String, value: String) {
    match params.iter_mut().find(|(existing, _)| *existing == key) {
        Some(entry) => entry.1 = value,
        None => params.push((key, value)),
    }
}

/// HTTP client for the Binance spot REST API
#[derive(Debug)]
pub struct SpotClient {
    http_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    clock: ClockSync,
    sync_before_signed: bool,
}

impl SpotClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.clone();
        Self::with_config_and_base_url(config, &base_url)
    }

    /// Create a client against an explicit base URL (mock servers, testnet)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BinanceError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            credentials: None,
            clock: ClockSync::new(),
            sync_before_signed: config.sync_before_signed,
        })
    }

    /// Attach credentials for signed requests
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Clock offset shared by every signed request of this client
    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    /// Fetch exchange time
    ///
    /// GET /api/v3/time
    ///
    /// Goes straight to the transport so the signed pipeline can call it.
    pub async fn server_time(&self) -> Result<ServerTime> {
        let url = self.build_url(TIME_ENDPOINT, "")?;
        let body = self.send(self.http_client.get(url), TIME_ENDPOINT).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Measure and store the offset between exchange and local clocks.
    ///
    /// Returns the new offset in milliseconds. No retry on failure.
    pub async fn sync_time(&self) -> Result<i64> {
        let server_time = self.server_time().await?;
        let offset = self.clock.record(server_time.server_time, now_ms());
        debug!(offset_ms = offset, "clock synchronized with exchange");
        Ok(offset)
    }

    /// Execute a request and deserialize its body into `T`
    pub async fn execute_json<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T> {
        let body = self.execute_raw(spec).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a request and return the parsed JSON body
    pub async fn execute(&self, spec: RequestSpec) -> Result<serde_json::Value> {
        self.execute_json(spec).await
    }

    async fn execute_raw(&self, spec: RequestSpec) -> Result<String> {
        let RequestSpec {
            endpoint,
            method,
            mut headers,
            mut params,
            signed,
        } = spec;

        let query = if signed {
            let signer = self
                .credentials
                .as_ref()
                .ok_or(BinanceError::Credentials)
                .and_then(RequestSigner::from_credentials)?;

            if !self.clock.is_synced() {
                return Err(BinanceError::ClockNotSynced);
            }
            if self.sync_before_signed {
                self.sync_time().await?;
            }

            set_param(&mut params, "timestamp".to_string(), self.clock.timestamp()?.to_string());

            let api_key = HeaderValue::from_str(signer.api_key())
                .map_err(|e| BinanceError::Config(format!("API key is not a valid header: {e}")))?;
            headers.insert(API_KEY_HEADER, api_key);

            signer.signed_query(&params)?
        } else {
            canonicalize(&params)?
        };

        let url = self.build_url(&endpoint, &query)?;
        debug!(method = %method, endpoint = %endpoint, signed, "rest request");

        let builder = self.http_client.request(method, url).headers(headers);
        self.send(builder, &endpoint).await
    }

    fn build_url(&self, endpoint: &str, query: &str) -> Result<Url> {
        let mut url = self.base_url.join(endpoint)?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), endpoint, body = %body, "exchange error response");
            return Err(BinanceError::exchange_error(status, body));
        }

        Ok(body)
    }
}
