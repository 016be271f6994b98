//! HTTP transport shared by every wrapper
//!
//! Builds request URLs from the base URI and percent-encoded path segments,
//! attaches Basic credentials, sends the request and turns any non-2xx status
//! into [`ClientError::Server`] carrying the response body.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use couchwire_core::ClientConfig;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::{ClientError, Result};

/// Basic authentication credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Authorization` header value: `Basic base64(user:password)`
    pub fn header_value(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug)]
pub struct Transport {
    base_url: Url,
    client: HttpClient,
    credentials: Option<Credentials>,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let url_credentials = take_url_credentials(&mut base_url);
        let credentials = match (&config.username, &config.password) {
            (Some(username), password) => Some(Credentials::new(
                username.clone(),
                password.clone().unwrap_or_default(),
            )),
            (None, _) => url_credentials,
        };

        let mut builder = HttpClient::builder().timeout(Duration::from_secs(config.timeout_secs));
        if config.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
            credentials,
        })
    }

    /// Base URI with any credentials stripped
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Append each segment as one encoded path segment, then the query pairs
    pub fn url(&self, segments: &[&str], query: &[(String, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn builder(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(credentials) = &self.credentials {
            builder = builder.header(AUTHORIZATION, credentials.header_value());
        }
        builder
    }

    async fn send(&self, method: Method, url: Url, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!(method = %method, path = %url.path(), status = status.as_u16(), "couch request");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match body.trim_end() {
            "" => status.canonical_reason().unwrap_or_default().to_string(),
            text => text.to_string(),
        };
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Send a request with an optional JSON body and decode the JSON reply
    pub async fn json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        let url = self.url(segments, query)?;
        let mut builder = self
            .builder(method.clone(), url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        builder = match body {
            Some(body) => builder.json(body),
            // CouchDB rejects body-less POSTs without a JSON content type
            None if method == Method::POST => {
                builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            }
            None => builder,
        };

        let response = self.send(method, url, builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<T> {
        self.json(Method::GET, segments, query, None).await
    }

    /// HEAD request: `true` for 2xx, `false` for 404, error otherwise
    pub async fn head(&self, segments: &[&str]) -> Result<bool> {
        let url = self.url(segments, &[])?;
        let builder = self.builder(Method::HEAD, url.clone());
        match self.send(Method::HEAD, url, builder).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// GET returning the raw response body
    pub async fn get_bytes(&self, segments: &[&str], query: &[(String, String)]) -> Result<Vec<u8>> {
        let url = self.url(segments, query)?;
        let builder = self.builder(Method::GET, url.clone());
        let response = self.send(Method::GET, url, builder).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// PUT raw bytes with an explicit content type and decode the JSON reply
    pub async fn put_bytes<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(String, String)],
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<T> {
        let url = self.url(segments, query)?;
        let builder = self
            .builder(Method::PUT, url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, content_type)
            .body(data);
        let response = self.send(Method::PUT, url, builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Move `user:password@` out of the URI, percent-decoding both parts
fn take_url_credentials(url: &mut Url) -> Option<Credentials> {
    if url.username().is_empty() {
        return None;
    }

    let decode = |s: &str| {
        urlencoding::decode(s)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| s.to_string())
    };
    let credentials = Credentials::new(
        decode(url.username()),
        url.password().map(decode).unwrap_or_default(),
    );

    // Only fails for cannot-be-a-base URLs, rejected earlier
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Some(credentials)
}
