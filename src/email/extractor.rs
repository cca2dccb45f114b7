use std::sync::OnceLock;

use google_gmail1::api::{Message, MessagePart};
use html2text::render::TrivialDecorator;
use log::{debug, warn};
use regex::Regex;

use super::common::{EmailRecord, NO_CONTENT, NO_SUBJECT, UNKNOWN_SENDER};

/// Wide enough that html2text never wraps a paragraph
const RENDER_WIDTH: usize = 10_000;

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"))
}

/// Converts an HTML body into readable plain text: markup and hidden
/// blocks dropped, character references decoded, no link or emphasis
/// decorations added.
pub fn html_to_text(html: &str) -> String {
    let rendered = html2text::config::with_decorator(TrivialDecorator::new())
        .string_from_read(html.as_bytes(), RENDER_WIDTH);

    match rendered {
        Ok(text) => normalize_text(&text),
        Err(e) => {
            warn!("Unable to render HTML body, keeping it as is: {}", e);
            normalize_text(html)
        }
    }
}

/// Trailing spaces removed, runs of blank lines collapsed to one, outer
/// whitespace trimmed.
pub fn normalize_text(text: &str) -> String {
    let text = text
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    blank_runs().replace_all(&text, "\n\n").trim().to_string()
}

fn is_plain_text(part: &MessagePart) -> bool {
    part.mime_type
        .as_deref()
        .is_some_and(|mime| mime.eq_ignore_ascii_case("text/plain"))
}

/// Value of the first header named `name` (case-insensitive)
pub fn header_value<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .as_deref()?
        .iter()
        .find(|h| h.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .and_then(|h| h.value.as_deref())
}

fn body_data(part: &MessagePart) -> Option<&[u8]> {
    part.body
        .as_ref()
        .and_then(|body| body.data.as_deref())
        .filter(|data| !data.is_empty())
}

/// Part holding the message body: the first part when the payload is
/// multipart (descending into nested multiparts whose container carries no
/// data), otherwise the payload itself.
pub fn first_body_part(payload: &MessagePart) -> Option<(&MessagePart, &[u8])> {
    let mut part = payload;
    while let Some(first) = part.parts.as_deref().and_then(|parts| parts.first()) {
        if let Some(data) = body_data(first) {
            return Some((first, data));
        }
        part = first;
    }
    body_data(part).map(|data| (part, data))
}

/// Normalizes a full Gmail message into an [`EmailRecord`].
pub fn extract_record(message: &Message) -> EmailRecord {
    let id = message.id.as_deref().unwrap_or("?");
    let default_payload = MessagePart::default();
    let payload = message.payload.as_ref().unwrap_or(&default_payload);

    let subject = header_value(payload, "Subject").map(str::to_string).unwrap_or_else(|| {
        warn!("Email {} has no Subject header, using '{}'", id, NO_SUBJECT);
        NO_SUBJECT.to_string()
    });

    let sender = header_value(payload, "From").map(str::to_string).unwrap_or_else(|| {
        warn!("Email {} has no From header, using '{}'", id, UNKNOWN_SENDER);
        UNKNOWN_SENDER.to_string()
    });

    let content = match first_body_part(payload) {
        Some((part, data)) if is_plain_text(part) => normalize_text(&String::from_utf8_lossy(data)),
        Some((_, data)) => html_to_text(&String::from_utf8_lossy(data)),
        None => {
            debug!("Email {} has no body data", id);
            NO_CONTENT.to_string()
        }
    };

    EmailRecord {
        sender,
        subject,
        content,
    }
}
