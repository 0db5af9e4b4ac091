use crate::error::RelayError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::Value;

pub static EVENT_HEADER: &str = "X-GitHub-Event";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    PullRequest,
    Issues,
    IssueComment,
}

impl EventType {
    pub fn tag(self) -> &'static str {
        match self {
            EventType::PullRequest => "pull_request",
            EventType::Issues => "issues",
            EventType::IssueComment => "issue_comment",
        }
    }

    pub fn accepted_action(self) -> Action {
        match self {
            EventType::PullRequest => Action::Opened,
            EventType::Issues | EventType::IssueComment => Action::Created,
        }
    }

    /// Fails with a benign `UnhandledAction` unless the payload's `action` is
    /// the one this event type is relayed for.
    pub fn check_action(self, doc: &Value) -> Result<Action, RelayError> {
        let raw = doc.get("action").unwrap_or(&Value::Null);
        match Action::deserialize(raw) {
            Ok(action) if action == self.accepted_action() => Ok(action),
            _ => Err(RelayError::UnhandledAction {
                event: self.tag().to_string(),
                action: match raw {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            }),
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = RelayError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag {
            "pull_request" => EventType::PullRequest,
            "issues" => EventType::Issues,
            "issue_comment" => EventType::IssueComment,
            _ => return Err(RelayError::UnhandledEvent(tag.to_string())),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum Action {
    #[serde(rename = "opened")]
    Opened,
    #[serde(rename = "created")]
    Created,
}

/// Which link an `issue_comment` notification points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    Issue,
    Comment,
}

impl Default for LinkSource {
    fn default() -> Self {
        LinkSource::Issue
    }
}

/// Decodes the request body into a JSON document.
///
/// Base64 and UTF-8 failures count as invalid JSON. Falsy documents (`null`,
/// `false`, `0`, `""`, `{}`, `[]`) are rejected as empty; a blank body is not
/// a JSON document at all.
pub fn parse_payload(raw: &str, is_base64_encoded: bool) -> Result<Value, RelayError> {
    let decoded;
    let text = if is_base64_encoded {
        // gateways may line-wrap the encoded body
        let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| RelayError::InvalidJson(e.to_string()))?;
        decoded = String::from_utf8(bytes).map_err(|e| RelayError::InvalidJson(e.to_string()))?;
        decoded.as_str()
    } else {
        raw
    };

    let doc: Value =
        serde_json::from_str(text).map_err(|e| RelayError::InvalidJson(e.to_string()))?;
    if is_falsy(&doc) {
        return Err(RelayError::EmptyBody);
    }

    Ok(doc)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Walks a dotted path through nested objects. Any missing step is `None`.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, key| node.get(key))
}

/// The string at `path`, provided it exists and is non-empty.
pub fn required<'a>(doc: &'a Value, path: &str) -> Result<&'a str, RelayError> {
    lookup(doc, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RelayError::MissingField(path.to_string()))
}

/// Fields a notification is rendered from. Only built once every required
/// field has been found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationFields {
    PullRequest {
        title: String,
        url: String,
        repository_name: String,
    },
    Issue {
        title: String,
        url: String,
        repository_name: String,
        comment_body: String,
    },
}

impl NotificationFields {
    pub fn extract(
        event_type: EventType,
        doc: &Value,
        issue_comment_link: LinkSource,
    ) -> Result<NotificationFields, RelayError> {
        match event_type {
            EventType::PullRequest => Ok(NotificationFields::PullRequest {
                title: required(doc, "pull_request.title")?.to_string(),
                url: required(doc, "pull_request.html_url")?.to_string(),
                repository_name: required(doc, "pull_request.base.repo.name")?.to_string(),
            }),
            EventType::Issues | EventType::IssueComment => {
                let url_path = match (event_type, issue_comment_link) {
                    (EventType::IssueComment, LinkSource::Comment) => "comment.html_url",
                    _ => "issue.html_url",
                };
                Ok(NotificationFields::Issue {
                    title: required(doc, "issue.title")?.to_string(),
                    url: required(doc, url_path)?.to_string(),
                    repository_name: required(doc, "repository.name")?.to_string(),
                    comment_body: required(doc, "comment.body")?.to_string(),
                })
            }
        }
    }
}
