use anyhow::{Result, Context};
use log::info;

use crate::email::{fetch_unread, MAX_UNREAD};
use crate::gmail_client::Mailbox;
use crate::store::{SummaryDraft, SummaryStore};
use crate::summarizer::{GenerativeModel, Summarizer};

/// One fetch → summarize → persist pass over the unread batch
pub struct SummaryPipeline<M: Mailbox, G: GenerativeModel> {
    mailbox: M,
    summarizer: Summarizer<G>,
    store: SummaryStore,
    max_emails: u32,
}

impl<M: Mailbox, G: GenerativeModel> SummaryPipeline<M, G> {
    pub fn new(mailbox: M, model: G, store: SummaryStore) -> Self {
        SummaryPipeline {
            mailbox,
            summarizer: Summarizer::new(model),
            store,
            max_emails: MAX_UNREAD,
        }
    }

    /// Returns the number of emails summarized and stored.
    pub async fn run(&self) -> Result<usize> {
        info!("Starting unread email summarization");

        let emails = fetch_unread(&self.mailbox, self.max_emails).await
            .context("Unable to fetch unread emails")?;

        let mut drafts = Vec::with_capacity(emails.len());
        for (index, email) in emails.iter().enumerate() {
            info!("📧 Email {}/{}: '{}'", index + 1, emails.len(), email.subject);
            let summary = self.summarizer.summarize(email).await;
            drafts.push(SummaryDraft {
                sender: email.sender.clone(),
                subject: email.subject.clone(),
                summary,
            });
        }

        self.store.append(&drafts)
            .context("Unable to save summaries")?;

        info!("Processing completed: {} emails summarized", drafts.len());

        Ok(drafts.len())
    }
}

pub fn completion_message(count: usize) -> String {
    format!("Processed {} emails", count)
}
