use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use time::OffsetDateTime;
use yup_oauth2 as oauth2;
use yup_oauth2::storage::{TokenInfo, TokenStorage};

use super::credentials::{self, CredentialRecord};
use super::manager::AuthFlow;
use crate::error::AuthError;

pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Lifetime assumed when Google does not say when a token expires
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Google OAuth2 installed-application flow. Refresh and the loopback
/// consent both go through yup-oauth2, which reads and writes our own
/// credential cache through [`RecordStorage`].
pub struct GoogleAuthFlow {
    credentials_path: PathBuf,
    token_cache_path: PathBuf,
}

impl GoogleAuthFlow {
    pub fn new(credentials_path: impl Into<PathBuf>, token_cache_path: impl Into<PathBuf>) -> Self {
        GoogleAuthFlow {
            credentials_path: credentials_path.into(),
            token_cache_path: token_cache_path.into(),
        }
    }

    /// Asks yup-oauth2 for a token. With an expired record in the cache it
    /// refreshes silently, otherwise it opens the consent page and waits on
    /// a local redirect listener.
    async fn request_token(&self, to_error: fn(String) -> AuthError) -> Result<CredentialRecord, AuthError> {
        // The client secret is only read when a refresh or consent is actually needed
        let secret = read_client_secret(&self.credentials_path).await?;

        let auth = oauth2::InstalledFlowAuthenticator::builder(
            secret,
            oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .with_storage(Box::new(RecordStorage::new(&self.token_cache_path)))
        .build()
        .await
        .map_err(|e| to_error(format!("unable to create OAuth2 authenticator: {}", e)))?;

        auth.token(&[GMAIL_MODIFY_SCOPE])
            .await
            .map_err(|e| to_error(e.to_string()))?;

        credentials::load_record(&self.token_cache_path).ok_or_else(|| {
            to_error(format!(
                "no credentials stored in {} after authorization",
                self.token_cache_path.display()
            ))
        })
    }
}

impl AuthFlow for GoogleAuthFlow {
    fn refresh<'a>(
        &'a self,
        expired: &'a CredentialRecord,
    ) -> Pin<Box<dyn Future<Output = Result<CredentialRecord, AuthError>> + Send + 'a>> {
        Box::pin(async move {
            debug!("Refreshing access token expired at {}", expired.expires_at);
            self.request_token(AuthError::Refresh).await
        })
    }

    fn authorize<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<CredentialRecord, AuthError>> + Send + 'a>> {
        Box::pin(async move {
            info!("Opening the Google consent page");
            self.request_token(AuthError::Authorization).await
        })
    }
}

pub async fn read_client_secret(path: &Path) -> Result<oauth2::ApplicationSecret, AuthError> {
    if !path.exists() {
        return Err(AuthError::MissingClientSecret(path.to_path_buf()));
    }
    oauth2::read_application_secret(path)
        .await
        .map_err(|source| AuthError::ClientSecret {
            path: path.to_path_buf(),
            source,
        })
}

/// yup-oauth2 token storage backed by the versioned credential record file
pub struct RecordStorage {
    path: PathBuf,
}

impl RecordStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStorage { path: path.into() }
    }
}

#[async_trait]
impl TokenStorage for RecordStorage {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let previous = credentials::load_record(&self.path);
        let record = record_from_token(token, previous.as_ref(), Utc::now())?;
        credentials::save_record(&self.path, &record)?;
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        credentials::load_record(&self.path).map(|record| token_from_record(&record))
    }
}

fn token_from_record(record: &CredentialRecord) -> TokenInfo {
    TokenInfo {
        access_token: Some(record.access_token.clone()),
        refresh_token: record.refresh_token.clone(),
        expires_at: OffsetDateTime::from_unix_timestamp(record.expires_at.timestamp()).ok(),
        id_token: None,
    }
}

/// Google omits the refresh token on refresh, so the one from the previous
/// record is carried over.
fn record_from_token(
    token: TokenInfo,
    previous: Option<&CredentialRecord>,
    now: DateTime<Utc>,
) -> Result<CredentialRecord, AuthError> {
    let access_token = token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::Authorization("token response carried no access token".to_string()))?;

    let refresh_token = token
        .refresh_token
        .or_else(|| previous.and_then(|p| p.refresh_token.clone()));

    let expires_at = token
        .expires_at
        .and_then(|t| DateTime::<Utc>::from_timestamp(t.unix_timestamp(), t.nanosecond()))
        .unwrap_or_else(|| now + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));

    Ok(CredentialRecord::new(access_token, refresh_token, expires_at))
}
