//! Thin wrapper over `reqwest` for the backend's `{ success, message, data }` envelope.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use util::config;
use util::session::Session;

use crate::error::ApiError;

const RETRY_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
    retries: u32,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: Session,
        timeout: Duration,
        retries: u32,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("campus/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            retries,
        })
    }

    /// Uses `API_BASE_URL`, `REQUEST_TIMEOUT_SECS` and `REQUEST_RETRIES`.
    pub fn from_config(session: Session) -> Result<Self, ApiError> {
        Self::new(
            config::api_base_url(),
            session,
            Duration::from_secs(config::request_timeout_secs()),
            config::request_retries(),
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Signs in and stores the returned bearer token in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let data: LoginData = self.post("/api/auth/login", &body).await?;
        self.session.set_auth_token(data.token)?;
        tracing::info!(email, "signed in");
        Ok(())
    }

    /// Forgets the token and the selected course.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.clear_auth_token()?;
        self.session.clear_course()?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.auth_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET with bounded retry on connect errors, timeouts and 5xx responses.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            let result = self
                .authorize(self.http.get(self.url(path)).query(query))
                .send()
                .await;
            let retryable = match &result {
                Err(e) => e.is_timeout() || e.is_connect(),
                Ok(resp) => resp.status().is_server_error(),
            };
            if retryable && attempt < self.retries {
                attempt += 1;
                tracing::warn!(path, attempt, "GET failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                continue;
            }
            return self.decode::<T>(result?).await?.ok_or(ApiError::MissingData);
        }
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .authorize(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        self.decode::<T>(resp).await?.ok_or(ApiError::MissingData)
    }

    /// POST whose response data, if any, is ignored.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let resp = self
            .authorize(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        self.decode::<IgnoredAny>(resp).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.authorize(self.http.delete(self.url(path))).send().await?;
        self.decode::<IgnoredAny>(resp).await?;
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(&self, resp: Response) -> Result<Option<T>, ApiError> {
        let status = resp.status();
        let text = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.session.clear_auth_token() {
                tracing::warn!(error = %e, "failed to clear rejected token");
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<IgnoredAny>>(&text)
                .ok()
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<T> =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ApiError::Rejected(envelope.message));
        }
        Ok(envelope.data)
    }
}
