use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const CREDENTIAL_RECORD_VERSION: u32 = 1;

/// Seconds before `expires_at` at which a token already counts as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Cached authorization for the mail provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub version: u32,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        CredentialRecord {
            version: CREDENTIAL_RECORD_VERSION,
            access_token: access_token.into(),
            refresh_token,
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty()
            && now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Reads the credential cache. Missing, unreadable or foreign-version caches
/// all yield `None` so the caller falls back to a fresh authorization.
pub fn load_record(path: &Path) -> Option<CredentialRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No credential cache at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Unable to read credential cache {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<CredentialRecord>(&raw) {
        Ok(record) if record.version == CREDENTIAL_RECORD_VERSION => Some(record),
        Ok(record) => {
            warn!(
                "Ignoring credential cache {} with unsupported version {}",
                path.display(),
                record.version
            );
            None
        }
        Err(e) => {
            warn!("Ignoring unparseable credential cache {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_record(path: &Path, record: &CredentialRecord) -> Result<(), AuthError> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).map_err(|source| AuthError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Credential cache written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_respects_margin() {
        let now = Utc::now();
        let fresh = CredentialRecord::new("at", None, now + Duration::hours(1));
        let nearly_expired = CredentialRecord::new("at", None, now + Duration::seconds(30));
        let expired = CredentialRecord::new("at", None, now - Duration::seconds(1));

        assert!(fresh.is_valid_at(now));
        assert!(!nearly_expired.is_valid_at(now));
        assert!(!expired.is_valid_at(now));
    }

    #[test]
    fn test_cache_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let record = CredentialRecord::new("at", Some("rt".to_string()), Utc::now());

        save_record(&path, &record).unwrap();

        assert_eq!(load_record(&path), Some(record));
    }

    #[test]
    fn test_unknown_version_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(
            &path,
            r#"{"version": 99, "access_token": "at", "expires_at": "2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(load_record(&path), None);
    }

    #[test]
    fn test_garbage_cache_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, b"\x80\x04\x95pickle").unwrap();

        assert_eq!(load_record(&path), None);
        assert_eq!(load_record(&dir.path().join("missing.json")), None);
    }
}
