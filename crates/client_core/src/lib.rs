use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use shared::{
    domain::{EmployeeDraft, EmployeeId, EmployeeRecord},
    validation::{validate, CredentialsForm, CREDENTIALS_FORM},
};
use tracing::info;

pub mod credential;
pub mod directory;
pub mod error;
pub mod http;

pub use credential::{BearerToken, CredentialSource, MissingCredential, SessionCredentials};
pub use directory::{DirectoryStore, LoadOutcome, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
pub use error::{ClientError, ErrorKind, GatewayError};
pub use http::EmployeeApiClient;

/// The four REST verbs against the employee collection.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<EmployeeRecord>, GatewayError>;
    async fn create(&self, draft: &EmployeeDraft) -> Result<EmployeeRecord, GatewayError>;
    async fn update(
        &self,
        id: EmployeeId,
        draft: &EmployeeDraft,
    ) -> Result<EmployeeRecord, GatewayError>;
    async fn delete(&self, id: EmployeeId) -> Result<(), GatewayError>;
}

/// Server-provided set of valid job positions.
#[async_trait]
pub trait PositionCatalog: Send + Sync {
    async fn positions(&self) -> Result<Vec<String>, GatewayError>;
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, email: &str, password: &SecretString)
        -> Result<BearerToken, GatewayError>;
    async fn register(&self, email: &str, password: &SecretString) -> Result<(), GatewayError>;
}

fn check_credentials_form(email: &str, password: &SecretString) -> Result<(), ClientError> {
    let form = CredentialsForm {
        email,
        password: password.expose_secret(),
    };
    validate(CREDENTIALS_FORM, &form, &[]).into_result()?;
    Ok(())
}

/// Validates the credentials, logs in and stores the token in the session.
pub async fn sign_in(
    auth: &dyn AuthGateway,
    session: &SessionCredentials,
    email: &str,
    password: &SecretString,
) -> Result<BearerToken, ClientError> {
    check_credentials_form(email, password)?;
    let token = auth.login(email, password).await?;
    session.set(token.clone()).await;
    info!(email, "signed in");
    Ok(token)
}

pub async fn sign_up(
    auth: &dyn AuthGateway,
    email: &str,
    password: &SecretString,
) -> Result<(), ClientError> {
    check_credentials_form(email, password)?;
    auth.register(email, password).await?;
    info!(email, "account registered");
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
