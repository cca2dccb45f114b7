pub mod credentials;
pub mod google_flow;
pub mod manager;

pub use credentials::CredentialRecord;
pub use google_flow::{GoogleAuthFlow, RecordStorage, GMAIL_MODIFY_SCOPE};
pub use manager::{AuthFlow, CredentialManager};
