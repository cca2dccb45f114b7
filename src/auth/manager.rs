use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use chrono::Utc;
use log::{error, info};

use super::credentials::{self, CredentialRecord};
use crate::error::AuthError;

/// OAuth operations needed by the credential manager
pub trait AuthFlow: Send + Sync {
    /// Trade the refresh token of an expired record for a new access token,
    /// without user interaction
    fn refresh<'a>(
        &'a self,
        expired: &'a CredentialRecord,
    ) -> Pin<Box<dyn Future<Output = Result<CredentialRecord, AuthError>> + Send + 'a>>;

    /// Run the interactive consent flow
    fn authorize<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<CredentialRecord, AuthError>> + Send + 'a>>;
}

/// Loads, refreshes and re-acquires the mail provider credentials, keeping
/// the on-disk cache in sync.
pub struct CredentialManager<F: AuthFlow> {
    cache_path: PathBuf,
    flow: F,
}

impl<F: AuthFlow> CredentialManager<F> {
    pub fn new(cache_path: impl Into<PathBuf>, flow: F) -> Self {
        CredentialManager {
            cache_path: cache_path.into(),
            flow,
        }
    }

    pub async fn acquire(&self) -> Result<CredentialRecord, AuthError> {
        self.acquire_inner().await.map_err(|e| {
            error!("Authentication failed: {}", e);
            e
        })
    }

    async fn acquire_inner(&self) -> Result<CredentialRecord, AuthError> {
        let cached = credentials::load_record(&self.cache_path);

        if let Some(record) = &cached {
            if record.is_valid_at(Utc::now()) {
                info!("Using cached credentials (valid until {})", record.expires_at);
                return Ok(record.clone());
            }
        }

        let record = match cached {
            Some(record) if record.can_refresh() => {
                info!("🔄 Refreshing expired credentials");
                let mut refreshed = self.flow.refresh(&record).await?;
                // Google usually omits the refresh token on refresh
                if !refreshed.can_refresh() {
                    refreshed.refresh_token = record.refresh_token.clone();
                }
                refreshed
            }
            _ => {
                info!("🔐 Getting new credentials");
                self.flow.authorize().await?
            }
        };

        credentials::save_record(&self.cache_path, &record)?;
        info!("✅ Credentials stored in {}", self.cache_path.display());

        Ok(record)
    }
}
