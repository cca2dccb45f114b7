//! Common structures for email processing
use serde::{Deserialize, Serialize};

/// Substituted when a message carries no body data at all
pub const NO_CONTENT: &str = "No content";

pub const UNKNOWN_SENDER: &str = "Unknown sender";
pub const NO_SUBJECT: &str = "No subject";

/// One unread message, reduced to what the summarizer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub sender: String,
    pub subject: String,
    pub content: String,
}
