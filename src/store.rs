use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, Local, SecondsFormat};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Summary produced for one email, before it gets a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDraft {
    pub sender: String,
    pub subject: String,
    pub summary: String,
}

/// One persisted entry of the summary store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub sender: String,
    pub subject: String,
    pub summary: String,
    pub timestamp: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDocument {
    #[serde(default)]
    pub summaries: Vec<SummaryRecord>,
    /// Top-level keys this program does not know about, kept on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Append-only JSON file of every summary ever produced.
///
/// Each append is a read-modify-write of the whole document; concurrent
/// runs are not supported.
pub struct SummaryStore {
    path: PathBuf,
}

impl SummaryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SummaryStore { path: path.into() }
    }

    /// Current document, or an empty one when the file does not exist yet
    pub fn load(&self) -> Result<SummaryDocument> {
        if !self.path.exists() {
            debug!("No summary store at {}, starting empty", self.path.display());
            return Ok(SummaryDocument::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Unable to read summary store {}", self.path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Summary store {} is not valid JSON", self.path.display()))
    }

    /// Appends one timestamped record per draft, after the existing ones.
    pub fn append(&self, drafts: &[SummaryDraft]) -> Result<()> {
        let mut document = self.load()?;

        let mut previous = document
            .summaries
            .last()
            .and_then(|record| DateTime::parse_from_rfc3339(&record.timestamp).ok());

        for draft in drafts {
            let timestamp = next_timestamp(previous);
            previous = Some(timestamp);

            document.summaries.push(SummaryRecord {
                sender: draft.sender.clone(),
                subject: draft.subject.clone(),
                summary: draft.summary.clone(),
                timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
            });
        }

        self.write(&document)?;

        info!(
            "💾 Saved {} summary(ies) to {} ({} total)",
            drafts.len(),
            self.path.display(),
            document.summaries.len()
        );

        Ok(())
    }

    /// Writes through a temporary file in the same directory, then renames it
    /// over the store so readers never observe a half-written document.
    fn write(&self, document: &SummaryDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Unable to create temporary file in {}", dir.display()))?;

        // The temporary file is created owner-only; the store keeps its own mode
        let permissions = match fs::metadata(&self.path) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(_) => new_store_permissions(),
        };
        if let Some(permissions) = permissions {
            tmp.as_file()
                .set_permissions(permissions)
                .with_context(|| format!("Unable to set permissions on {}", tmp.path().display()))?;
        }

        serde_json::to_writer_pretty(&mut tmp, document).context("Unable to serialize summaries")?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Unable to replace summary store {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(unix)]
fn new_store_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_store_permissions() -> Option<fs::Permissions> {
    None
}

/// Current local time, strictly after `previous` at microsecond resolution
fn next_timestamp(previous: Option<DateTime<FixedOffset>>) -> DateTime<FixedOffset> {
    let now = Local::now().fixed_offset();
    match previous {
        Some(prev) if now.timestamp_micros() <= prev.timestamp_micros() => {
            prev + Duration::microseconds(1)
        }
        _ => now,
    }
}
