//! Bearer credentials, read fresh by the HTTP client on every request.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn current(&self) -> Option<BearerToken>;
}

/// Used by clients that only call the unauthenticated endpoints.
pub struct MissingCredential;

#[async_trait]
impl CredentialSource for MissingCredential {
    async fn current(&self) -> Option<BearerToken> {
        None
    }
}

/// Process-wide session token: written at login, cleared at logout.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    token: RwLock<Option<BearerToken>>,
}

impl SessionCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: BearerToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }

    pub async fn set(&self, token: BearerToken) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        self.token.write().await.take();
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}

#[async_trait]
impl CredentialSource for SessionCredentials {
    async fn current(&self) -> Option<BearerToken> {
        self.token.read().await.clone()
    }
}
