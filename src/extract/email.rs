//! Raw email intake — RFC 822 bytes to body text plus metadata.

use chrono::NaiveDate;
use mail_parser::{MessageParser, MimeHeaders};

use crate::extract::types::ContentMetadata;

/// A parsed email ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub body: String,
    pub metadata: ContentMetadata,
}

/// Parse a raw message. Returns `None` when the bytes are not a message
/// `mail-parser` can read.
pub fn parse_raw_email(raw: &[u8]) -> Option<ParsedEmail> {
    let parsed = MessageParser::default().parse(raw)?;

    let mut metadata = ContentMetadata::email();
    metadata.sender = extract_sender(&parsed);
    metadata.subject = parsed.subject().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    metadata.received_on = parsed.date().and_then(|d| {
        NaiveDate::from_ymd_opt(d.year as i32, u32::from(d.month), u32::from(d.day))
    });

    Some(ParsedEmail {
        body: extract_text(&parsed),
        metadata,
    })
}

/// Sender address, falling back to the display name.
fn extract_sender(parsed: &mail_parser::Message) -> Option<String> {
    let first = parsed.from().and_then(|addr| addr.first())?;
    first
        .address()
        .or_else(|| first.name())
        .map(|s| s.to_string())
}

/// Readable text from a parsed email: plain part, else de-tagged HTML,
/// else the first text attachment.
fn extract_text(parsed: &mail_parser::Message) -> String {
    if let Some(text) = parsed.body_text(0) {
        return text.to_string();
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    for part in parsed.attachments() {
        let part: &mail_parser::MessagePart = part;
        if let Some(ct) = MimeHeaders::content_type(part)
            && ct.ctype() == "text"
            && let Ok(text) = std::str::from_utf8(part.contents())
        {
            return text.to_string();
        }
    }
    String::new()
}

/// Drop tags, keeping block boundaries as line breaks so sentences and
/// list items survive.
fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "p" | "br" | "div" | "li" | "tr" | "h1" | "h2" | "h3") {
                    result.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => result.push(ch),
        }
    }

    result
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::types::ContentType;

    const RAW: &str = "From: Alice Smith <alice@example.com>\r\n\
To: team@example.com\r\n\
Subject: Q3 planning\r\n\
Date: Mon, 3 Jun 2024 09:30:00 +0000\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Please update the roadmap by Friday.\r\n";

    #[test]
    fn parses_headers_and_body() {
        let email = parse_raw_email(RAW.as_bytes()).unwrap();
        assert_eq!(email.metadata.content_type, ContentType::Email);
        assert_eq!(email.metadata.sender.as_deref(), Some("alice@example.com"));
        assert_eq!(email.metadata.subject.as_deref(), Some("Q3 planning"));
        assert_eq!(
            email.metadata.received_on,
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
        assert!(email.body.contains("Please update the roadmap by Friday."));
    }

    #[test]
    fn strip_html_keeps_blocks() {
        assert_eq!(
            strip_html("<p>Fix the bug.</p><ul><li>Send notes</li><li>Book room</li></ul>"),
            "Fix the bug.\nSend notes\nBook room"
        );
        assert_eq!(strip_html("<b>Bold</b> and <i>italic</i>"), "Bold and italic");
        assert_eq!(strip_html(""), "");
    }
}
