pub mod common;
pub mod extractor;
pub mod fetcher;

// Re-export commonly used items
pub use common::{EmailRecord, NO_CONTENT};
pub use extractor::{extract_record, html_to_text};
pub use fetcher::{fetch_unread, MAX_UNREAD};
