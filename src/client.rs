use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::config::Config;
use crate::endpoints::ApiEndpoint;
use crate::error::{Error, ErrorResponse, Result};

const NO_QUERY: [(&str, &str); 0] = [];
const UNAUTHORIZED_SESSION: &str = "Invalid or expired credential";
pub(crate) const UNAUTHORIZED_ANONYMOUS: &str = "Login failed";

/// Bearer credential issued by the backend at login.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

/// This is the transport used by every component. It holds the connection
/// settings and the session credential slot.
///
/// Clones share the credential slot, so a login or logout through one clone is
/// seen by all of them. Writes replace the slot wholesale.
///
/// A clone bound to a token (see [`Client::bound_to`]) only sends requests
/// while the slot still holds that token.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<Config>,
    credential: Arc<RwLock<Option<AccessToken>>>,
    bound: Option<AccessToken>,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            credential: Arc::new(RwLock::new(None)),
            bound: None,
        })
    }

    /// A clone sharing this client's slot that refuses to send once the slot
    /// holds anything other than `token`.
    #[must_use]
    pub(crate) fn bound_to(&self, token: AccessToken) -> Self {
        Self {
            bound: Some(token),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the session credential.
    pub async fn set_credential(&self, token: Option<AccessToken>) {
        trace!(present = token.is_some(), "updating session credential");
        *self.credential.write().await = token;
    }

    pub async fn credential(&self) -> Option<AccessToken> {
        self.credential.read().await.clone()
    }

    pub async fn has_credential(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Build a request object, attaching the bearer credential when `auth` is set.
    ///
    /// Authenticated requests without a stored credential fail here, before any
    /// network activity.
    async fn build_request(
        &self,
        method: Method,
        endpoint: &ApiEndpoint,
        auth: bool,
    ) -> Result<RequestBuilder> {
        let url = endpoint.to_url(&self.config.base_url)?;
        let request = self.http.request(method, url);
        if !auth {
            return Ok(request);
        }

        match self.credential.read().await.as_ref() {
            Some(token) if self.bound.as_ref().is_some_and(|bound| bound != token) => {
                debug!(%endpoint, "refusing request from a replaced session");
                Err(Error::session_replaced(&endpoint.to_string()))
            }
            Some(token) => Ok(request.bearer_auth(token.secret())),
            None => {
                debug!(%endpoint, "refusing request without an active session");
                Err(Error::no_session(&endpoint.to_string()))
            }
        }
    }

    /// Execute a request with automatic retry for rate limit errors
    async fn execute_with_retry<T, F, Fut>(&self, request_fn: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match request_fn().await {
                Ok(result) => return Ok(result),
                Err(Error::RateLimitExceeded { retry_after, .. })
                    if attempts <= self.config.max_retry_attempts =>
                {
                    let wait_time = retry_after
                        .unwrap_or(Duration::from_secs(1))
                        .min(self.config.request_timeout);

                    warn!(
                        "Rate limit exceeded (attempt {}/{}), waiting for {:?} before retrying",
                        attempts, self.config.max_retry_attempts, wait_time
                    );

                    sleep(wait_time).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Perform an authenticated `GET` request without query parameters.
    pub async fn get<R: DeserializeOwned>(&self, endpoint: ApiEndpoint) -> Result<R> {
        self.get_endpoint(endpoint, &NO_QUERY).await
    }

    /// Perform an authenticated `GET` request against an endpoint.
    #[instrument(skip(self, query))]
    pub async fn get_endpoint<R: DeserializeOwned, T: Serialize + Sized + fmt::Debug>(
        &self,
        endpoint: ApiEndpoint,
        query: &T,
    ) -> Result<R> {
        self.execute_with_retry(|| async {
            trace!(?query, %endpoint, "making GET request");
            let response = self
                .build_request(Method::GET, &endpoint, true)
                .await?
                .query(query)
                .send()
                .await?;

            Self::handle_response(response, UNAUTHORIZED_SESSION).await
        })
        .await
    }

    /// Perform an authenticated `POST` request against an endpoint.
    #[instrument(skip(self, data))]
    pub async fn post_endpoint<R: DeserializeOwned, T: Serialize + Sized>(
        &self,
        endpoint: ApiEndpoint,
        data: &T,
    ) -> Result<R> {
        self.send_json(Method::POST, endpoint, data, true).await
    }

    /// Perform an authenticated `PUT` request against an endpoint.
    #[instrument(skip(self, data))]
    pub async fn put_endpoint<R: DeserializeOwned, T: Serialize + Sized>(
        &self,
        endpoint: ApiEndpoint,
        data: &T,
    ) -> Result<R> {
        self.send_json(Method::PUT, endpoint, data, true).await
    }

    /// Perform a `POST` request without a credential (login, registration).
    #[instrument(skip(self, data))]
    pub async fn post_anonymous<R: DeserializeOwned, T: Serialize + Sized>(
        &self,
        endpoint: ApiEndpoint,
        data: &T,
    ) -> Result<R> {
        self.send_json(Method::POST, endpoint, data, false).await
    }

    async fn send_json<R: DeserializeOwned, T: Serialize + Sized>(
        &self,
        method: Method,
        endpoint: ApiEndpoint,
        data: &T,
        auth: bool,
    ) -> Result<R> {
        let unauthorized = if auth {
            UNAUTHORIZED_SESSION
        } else {
            UNAUTHORIZED_ANONYMOUS
        };

        self.execute_with_retry(|| async {
            trace!(%endpoint, %method, "making request");
            let response = self
                .build_request(method.clone(), &endpoint, auth)
                .await?
                .json(data)
                .send()
                .await?;

            Self::handle_response(response, unauthorized).await
        })
        .await
    }

    /// Map a response onto the decoded body or a typed error.
    ///
    /// `unauthorized` is the message used for a 401 without a `detail`.
    #[instrument(skip(response))]
    async fn handle_response<T: DeserializeOwned + Sized>(
        response: reqwest::Response,
        unauthorized: &str,
    ) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .trim_end_matches('>')
            .to_string();

        debug!(
            "Response from {}: status={}, entity_type={}",
            url, status, entity_type
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);

            warn!("Rate limit exceeded for {}: retry_after={:?}", url, retry_after);

            let text = response.text().await.unwrap_or_default();
            return Err(Error::RateLimitExceeded {
                retry_after,
                url,
                response_body: Some(text),
            });
        }

        let text = response.text().await?;
        debug!("Response body size: {} bytes", text.len());
        trace!("Response text:\n{}", text);

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                error!(
                    "Deserialization error: {}, near position: {} - response text around that position: {}",
                    e,
                    e.column(),
                    &text.chars().skip(e.column().saturating_sub(30)).take(100).collect::<String>()
                );
                Error::DeserializationError {
                    source: e,
                    entity_type,
                    url,
                    response_body: Some(text.clone()),
                }
            });
        }

        let detail = ErrorResponse::parse(&text);
        let message = detail
            .as_ref()
            .map(ToString::to_string)
            .filter(|m| !m.trim().is_empty());

        match status {
            StatusCode::UNAUTHORIZED => Err(Error::Authentication {
                message: message.unwrap_or_else(|| unauthorized.to_string()),
            }),
            StatusCode::FORBIDDEN => Err(Error::Authorization {
                role: None,
                operation: url,
                message: message.unwrap_or_else(|| "Insufficient permissions".to_string()),
            }),
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                entity: entity_type,
                id: message.unwrap_or_default(),
                url: Some(url),
                response_body: Some(text),
            }),
            StatusCode::CONFLICT => Err(Error::Conflict {
                message: message.unwrap_or_else(|| "Conflict".to_string()),
                url,
            }),
            // The backend reports duplicates as a plain 400 "... already exists".
            StatusCode::BAD_REQUEST
                if message.as_deref().is_some_and(|m| m.contains("already exists")) =>
            {
                Err(Error::Conflict {
                    message: message.unwrap_or_default(),
                    url,
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Err(Error::Validation {
                field: detail.as_ref().and_then(ErrorResponse::field),
                message: message.unwrap_or_else(|| text.trim().to_string()),
            }),
            status => {
                error!("Unexpected status code: {}", status);
                Err(Error::Api {
                    status_code: status,
                    url,
                    message,
                    span_trace: tracing_error::SpanTrace::capture(),
                })
            }
        }
    }
}
