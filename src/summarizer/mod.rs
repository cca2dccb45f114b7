pub mod gemini;
pub mod retry;

use std::future::Future;
use std::pin::Pin;

use log::{info, warn};

use crate::email::EmailRecord;
use crate::error::GenerationError;

pub use gemini::GeminiClient;
pub use retry::retry;

/// Total attempts per email before falling back to the placeholder
pub const MAX_ATTEMPTS: usize = 4;

pub const FAILURE_PREFIX: &str = "Failed to summarize: ";

/// A text-generation backend
pub trait GenerativeModel: Send + Sync {
    fn generate_content<'a>(&'a self, prompt: &'a str) ->
        Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
}

pub fn build_prompt(email: &EmailRecord) -> String {
    format!(
        "\nSummarize this email in 5 sentences:\nFrom: {}\nSubject: {}\nContent: {}\n",
        email.sender, email.subject, email.content
    )
}

pub struct Summarizer<G: GenerativeModel> {
    model: G,
    max_attempts: usize,
}

impl<G: GenerativeModel> Summarizer<G> {
    pub fn new(model: G) -> Self {
        Summarizer {
            model,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn model(&self) -> &G {
        &self.model
    }

    /// Returns the model's raw answer, or `"Failed to summarize: <error>"`
    /// once every attempt has failed. Never returns an error.
    pub async fn summarize(&self, email: &EmailRecord) -> String {
        let prompt = build_prompt(email);

        let result = retry(self.max_attempts, |_| self.model.generate_content(&prompt)).await;

        match result {
            Ok(summary) => {
                info!("📝 Summarized '{}'", email.subject);
                summary
            }
            Err(e) => {
                warn!("Giving up on '{}' after {} attempts: {}", email.subject, self.max_attempts, e);
                format!("{}{}", FAILURE_PREFIX, e)
            }
        }
    }
}
