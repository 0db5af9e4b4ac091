use crate::ghapi::NotificationFields;

pub static CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
pub static CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
pub static CARD_VERSION: &str = "1.2";

#[derive(PartialEq, Clone, Debug, serde::Serialize)]
pub struct TextBlock {
    pub r#type: &'static str,
    pub text: String,
    pub wrap: bool,
    pub markdown: bool,
}

#[derive(PartialEq, Clone, Debug, serde::Serialize)]
pub struct AdaptiveCard {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub r#type: &'static str,
    pub version: &'static str,
    pub body: Vec<TextBlock>,
}

#[derive(PartialEq, Clone, Debug, serde::Serialize)]
pub struct Attachment {
    #[serde(rename = "contentType")]
    pub content_type: &'static str,
    pub content: AdaptiveCard,
}

/// Envelope posted to the chat webhook.
#[derive(PartialEq, Clone, Debug, serde::Serialize)]
pub struct OutboundMessage {
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn new(text: String) -> Self {
        OutboundMessage {
            attachments: vec![Attachment {
                content_type: CARD_CONTENT_TYPE,
                content: AdaptiveCard {
                    schema: CARD_SCHEMA,
                    r#type: "AdaptiveCard",
                    version: CARD_VERSION,
                    body: vec![TextBlock {
                        r#type: "TextBlock",
                        text,
                        wrap: true,
                        markdown: true,
                    }],
                },
            }],
        }
    }

    pub fn text(&self) -> &str {
        self.attachments
            .first()
            .and_then(|a| a.content.body.first())
            .map_or("", |b| b.text.as_str())
    }
}

// Issue events keep the "New Pull Request" label; receivers match on it.
pub fn format_message(fields: &NotificationFields) -> String {
    match fields {
        NotificationFields::PullRequest {
            title,
            url,
            repository_name,
        } => format!("[[{}] New Pull Request: {}]({})", repository_name, title, url),
        NotificationFields::Issue {
            title,
            url,
            repository_name,
            comment_body,
        } => format!(
            "[[{}] New Pull Request: {}]({})<br />{}",
            repository_name, title, url, comment_body
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr() -> NotificationFields {
        NotificationFields::PullRequest {
            title: "Fix bug".to_string(),
            url: "http://x/1".to_string(),
            repository_name: "repo1".to_string(),
        }
    }

    #[test]
    fn pull_request_message() {
        assert_eq!(format_message(&pr()), "[[repo1] New Pull Request: Fix bug](http://x/1)");
    }

    #[test]
    fn issue_message() {
        let fields = NotificationFields::Issue {
            title: "Crash".to_string(),
            url: "http://x/issues/7".to_string(),
            repository_name: "repo1".to_string(),
            comment_body: "**same** here [link](y)".to_string(),
        };
        // no escaping of markdown in the comment
        assert_eq!(
            format_message(&fields),
            "[[repo1] New Pull Request: Crash](http://x/issues/7)<br />**same** here [link](y)"
        );
    }

    #[test]
    fn envelope_layout() {
        let message = OutboundMessage::new(format_message(&pr()));
        let expected = serde_json::json!({
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "content": {
                    "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                    "type": "AdaptiveCard",
                    "version": "1.2",
                    "body": [{
                        "type": "TextBlock",
                        "text": "[[repo1] New Pull Request: Fix bug](http://x/1)",
                        "wrap": true,
                        "markdown": true
                    }]
                }
            }]
        });
        assert_eq!(serde_json::to_value(&message).unwrap(), expected);
        assert_eq!(message.text(), "[[repo1] New Pull Request: Fix bug](http://x/1)");
    }

    #[test]
    fn formatting_is_deterministic() {
        let a = serde_json::to_vec(&OutboundMessage::new(format_message(&pr()))).unwrap();
        let b = serde_json::to_vec(&OutboundMessage::new(format_message(&pr()))).unwrap();
        assert_eq!(a, b);
    }
}
