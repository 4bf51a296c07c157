//! reqwest-backed implementation of the employee API seams.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shared::{
    domain::{EmployeeDraft, EmployeeId, EmployeeRecord},
    protocol::{paths, CredentialsRequest, LoginResponse},
};
use tracing::debug;
use url::Url;

use crate::{
    credential::{BearerToken, CredentialSource},
    error::GatewayError,
    AuthGateway, PositionCatalog, RecordGateway,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct EmployeeApiClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl EmployeeApiClient {
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, credentials, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        credentials: Arc<dyn CredentialSource>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Network)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn anonymous(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        let url = self.base_url.join(path)?;
        Ok(self.http.request(method, url))
    }

    /// The credential is looked up per request so a token replaced after login is honored.
    async fn authorized(
        &self,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, GatewayError> {
        let token = self
            .credentials
            .current()
            .await
            .ok_or(GatewayError::MissingCredential)?;
        Ok(self.anonymous(method, path)?.bearer_auth(token.expose()))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|err| {
            debug!(%method, path, error = %err, "employee api transport failure");
            GatewayError::Network(err)
        })?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "employee api response");
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(%method, path, error = %err, "failed to read error body");
                String::new()
            }
        };
        Err(GatewayError::from_status(status, &body))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<T, GatewayError> {
        let response = self.send(request, method, path).await?;
        let body = response.bytes().await.map_err(GatewayError::Network)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, GatewayError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn credentials_body(email: &str, password: &SecretString) -> CredentialsRequest {
    CredentialsRequest {
        email: email.trim().to_string(),
        password: password.expose_secret().to_string(),
    }
}

#[async_trait]
impl RecordGateway for EmployeeApiClient {
    async fn list(&self) -> Result<Vec<EmployeeRecord>, GatewayError> {
        let request = self.authorized(Method::GET, paths::EMPLOYEES).await?;
        self.fetch(request, Method::GET, paths::EMPLOYEES).await
    }

    async fn create(&self, draft: &EmployeeDraft) -> Result<EmployeeRecord, GatewayError> {
        let request = self
            .authorized(Method::POST, paths::EMPLOYEES)
            .await?
            .json(draft);
        self.fetch(request, Method::POST, paths::EMPLOYEES).await
    }

    async fn update(
        &self,
        id: EmployeeId,
        draft: &EmployeeDraft,
    ) -> Result<EmployeeRecord, GatewayError> {
        let path = paths::employee(id);
        let request = self.authorized(Method::PUT, &path).await?.json(draft);
        self.fetch(request, Method::PUT, &path).await
    }

    async fn delete(&self, id: EmployeeId) -> Result<(), GatewayError> {
        let path = paths::employee(id);
        let request = self.authorized(Method::DELETE, &path).await?;
        self.send(request, Method::DELETE, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl PositionCatalog for EmployeeApiClient {
    async fn positions(&self) -> Result<Vec<String>, GatewayError> {
        let request = self.authorized(Method::GET, paths::POSITIONS).await?;
        self.fetch(request, Method::GET, paths::POSITIONS).await
    }
}

#[async_trait]
impl AuthGateway for EmployeeApiClient {
    async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<BearerToken, GatewayError> {
        let request = self
            .anonymous(Method::POST, paths::LOGIN)?
            .json(&credentials_body(email, password));
        let body: LoginResponse = self.fetch(request, Method::POST, paths::LOGIN).await?;
        Ok(BearerToken::new(body.token))
    }

    async fn register(&self, email: &str, password: &SecretString) -> Result<(), GatewayError> {
        let request = self
            .anonymous(Method::POST, paths::REGISTER)?
            .json(&credentials_body(email, password));
        self.send(request, Method::POST, paths::REGISTER).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
