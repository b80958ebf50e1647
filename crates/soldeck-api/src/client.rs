// Home Assistant REST API client.
//
// Wraps `reqwest::Client` with bearer-token auth, URL construction, and
// status-code mapping. Responses are plain JSON -- no envelope to unwrap.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{EntityState, ServiceDomain};
use crate::transport::TransportConfig;

/// Async client for a single Home Assistant instance.
///
/// Authenticates with a long-lived access token sent as a default
/// `Authorization: Bearer` header. Cheap to clone -- `reqwest::Client`
/// is internally reference-counted.
#[derive(Debug, Clone)]
pub struct HaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HaClient {
    /// Create a new client from a base URL and access token.
    ///
    /// The `base_url` is the instance root (e.g. `http://homeassistant.local:8123`).
    pub fn new(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this when the client already carries the auth header (tests,
    /// shared transports).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The instance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for `/api/{segments...}`.
    ///
    /// With no segments this yields `/api/` (trailing slash) -- the
    /// status endpoint is only routed with it.
    fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.push("api");
            for segment in segments {
                path.push(segment);
            }
            if segments.is_empty() {
                path.push("");
            }
        }
        Ok(url)
    }

    // ── Request helper ───────────────────────────────────────────────

    /// Send a GET request and deserialize the JSON response.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_json(resp).await
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("token rejected (HTTP {})", status.as_u16()),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: body[..body.len().min(200)].to_owned(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    // ── API surface ──────────────────────────────────────────────────

    /// Check the API is up and our token is accepted.
    ///
    /// `GET /api/` returns `{"message": "API running."}`.
    pub async fn api_status(&self) -> Result<String, Error> {
        let value: Value = self.get(self.api_url(&[])?).await?;
        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }

    /// Fetch one entity state. `None` if the entity does not exist.
    pub async fn get_state(&self, entity_id: &str) -> Result<Option<EntityState>, Error> {
        let url = self.api_url(&["states", entity_id])?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::parse_json(resp).await?))
    }

    /// List the full service registry, all domains.
    pub async fn list_services(&self) -> Result<Vec<ServiceDomain>, Error> {
        self.get(self.api_url(&["services"])?).await
    }

    /// List the registered service names within one domain.
    ///
    /// A domain that isn't registered at all yields an empty list.
    pub async fn domain_services(&self, domain: &str) -> Result<Vec<String>, Error> {
        let registry = self.list_services().await?;
        Ok(registry
            .into_iter()
            .find(|d| d.domain == domain)
            .map(|d| d.service_names())
            .unwrap_or_default())
    }

    /// Invoke a service with a JSON payload.
    ///
    /// Home Assistant responds with the list of states the call changed;
    /// we don't care about it, only about success.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.api_url(&["services", domain, service])?;
        debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .json(data)
            .send()
            .await
            .map_err(Error::Transport)?;
        let _: Value = Self::parse_json(resp).await?;
        Ok(())
    }
}
