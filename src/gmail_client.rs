use std::future::Future;
use std::pin::Pin;

use anyhow::{Result, Context};
use google_gmail1::api::{Message, Scope};
use google_gmail1::{Gmail, hyper, hyper_rustls};
use log::{info, debug};

use crate::auth::CredentialRecord;

/// Read access to a mailbox, as needed by the fetcher
pub trait Mailbox: Send + Sync {
    /// Identifiers of unread messages, most recent first, at most `max_results`
    fn list_unread<'a>(&'a self, max_results: u32) ->
        Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

    /// Full message (headers and MIME parts)
    fn fetch_message<'a>(&'a self, message_id: &'a str) ->
        Pin<Box<dyn Future<Output = Result<Message>> + Send + 'a>>;
}

pub struct GmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
}

impl GmailClient {
    pub fn new(credentials: &CredentialRecord) -> Result<Self> {
        info!("Connecting to Gmail API via OAuth2");

        // Create HTTP client
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = hyper::Client::builder().build(connector);

        // The credential manager already guarantees an unexpired token
        let hub = Gmail::new(client, credentials.access_token.clone());

        info!("✅ Gmail API connection established successfully");

        Ok(GmailClient { hub })
    }

    pub async fn search_unread_emails(&self, max_results: u32) -> Result<Vec<String>> {
        info!("Searching for unread emails (max {})", max_results);

        let user_id = "me";

        let result = self.hub
            .users()
            .messages_list(user_id)
            .add_label_ids("UNREAD")
            .max_results(max_results)
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context("Error listing unread emails")?;

        let message_ids: Vec<String> = result.1
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .collect();

        info!("Found {} unread email(s)", message_ids.len());

        Ok(message_ids)
    }

    pub async fn fetch_email_full(&self, message_id: &str) -> Result<Message> {
        debug!("Complete email retrieval for ID: {}", message_id);

        let user_id = "me";

        let (_, message) = self.hub
            .users()
            .messages_get(user_id, message_id)
            .format("full")
            .add_scope(Scope::Modify)
            .doit()
            .await
            .with_context(|| format!("Unable to retrieve email {}", message_id))?;

        Ok(message)
    }
}

impl Mailbox for GmailClient {
    fn list_unread<'a>(&'a self, max_results: u32) ->
        Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(self.search_unread_emails(max_results))
    }

    fn fetch_message<'a>(&'a self, message_id: &'a str) ->
        Pin<Box<dyn Future<Output = Result<Message>> + Send + 'a>> {
        Box::pin(self.fetch_email_full(message_id))
    }
}
