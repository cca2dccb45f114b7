use anyhow::{Result, Context};
use log::{info, debug};

use super::common::EmailRecord;
use super::extractor::extract_record;
use crate::gmail_client::Mailbox;

/// Size of the unread batch handled by one run
pub const MAX_UNREAD: u32 = 5;

/// Lists unread messages and normalizes each one, in listing order.
///
/// One list call, then one get call per identifier. Any provider failure
/// aborts the whole fetch.
pub async fn fetch_unread<M>(mailbox: &M, max_count: u32) -> Result<Vec<EmailRecord>>
where
    M: Mailbox + ?Sized,
{
    let message_ids = mailbox.list_unread(max_count).await
        .context("Error searching for unread emails")?;

    let mut records = Vec::with_capacity(message_ids.len());

    for message_id in message_ids.iter().take(max_count as usize) {
        let message = mailbox.fetch_message(message_id).await
            .with_context(|| format!("Unable to fetch email {}", message_id))?;

        let record = extract_record(&message);
        debug!("Email {} from '{}': '{}' ({} chars)",
               message_id, record.sender, record.subject, record.content.chars().count());
        records.push(record);
    }

    info!("Fetched {} unread email(s)", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::common::NO_CONTENT;
    use google_gmail1::api::{Message, MessagePart, MessagePartBody, MessagePartHeader};
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct FakeMailbox {
        ids: Vec<String>,
        messages: HashMap<String, Message>,
        gets: Mutex<Vec<String>>,
    }

    impl Mailbox for FakeMailbox {
        fn list_unread<'a>(&'a self, max_results: u32) ->
            Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
            Box::pin(async move {
                Ok(self.ids.iter().take(max_results as usize).cloned().collect())
            })
        }

        fn fetch_message<'a>(&'a self, message_id: &'a str) ->
            Pin<Box<dyn Future<Output = Result<Message>> + Send + 'a>> {
            Box::pin(async move {
                self.gets.lock().unwrap().push(message_id.to_string());
                self.messages
                    .get(message_id)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("404 Requested entity was not found"))
            })
        }
    }

    fn simple_message(id: &str, subject: &str, body: Option<&str>) -> Message {
        Message {
            id: Some(id.to_string()),
            payload: Some(MessagePart {
                headers: Some(vec![
                    MessagePartHeader { name: Some("Subject".into()), value: Some(subject.into()) },
                    MessagePartHeader { name: Some("From".into()), value: Some("bob@example.com".into()) },
                ]),
                body: Some(MessagePartBody {
                    data: body.map(|b| b.as_bytes().to_vec()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn mailbox(ids: &[&str], messages: Vec<Message>) -> FakeMailbox {
        FakeMailbox {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            messages: messages
                .into_iter()
                .map(|m| (m.id.clone().unwrap_or_default(), m))
                .collect(),
            gets: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_fetch_preserves_listing_order() {
        let mailbox = mailbox(
            &["b", "a"],
            vec![
                simple_message("a", "First", Some("<p>alpha</p>")),
                simple_message("b", "Second", None),
            ],
        );

        let records = fetch_unread(&mailbox, MAX_UNREAD).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject, "Second");
        assert_eq!(records[0].content, NO_CONTENT);
        assert_eq!(records[1].subject, "First");
        assert_eq!(records[1].content, "alpha");
        assert_eq!(*mailbox.gets.lock().unwrap(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_fetch_bounded_by_max_count() {
        let ids = ["1", "2", "3", "4", "5", "6", "7"];
        let messages = ids.iter().map(|id| simple_message(id, id, Some("x"))).collect();
        let mailbox = mailbox(&ids, messages);

        let records = fetch_unread(&mailbox, MAX_UNREAD).await.unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(mailbox.gets.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let mailbox = mailbox(&["a", "missing"], vec![simple_message("a", "ok", Some("x"))]);

        let err = fetch_unread(&mailbox, MAX_UNREAD).await.unwrap_err();

        assert!(format!("{:#}", err).contains("missing"));
    }

    #[tokio::test]
    async fn test_empty_inbox() {
        let mailbox = mailbox(&[], vec![]);
        assert!(fetch_unread(&mailbox, MAX_UNREAD).await.unwrap().is_empty());
    }
}
