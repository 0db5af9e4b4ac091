use crate::card::{format_message, OutboundMessage};
use crate::delivery::{Notifier, WebhookUrlSource};
use crate::error::RelayError;
use crate::ghapi::{self, EventType, LinkSource, NotificationFields};

/// One inbound webhook call, as handed over by the transport.
#[derive(Clone, Debug, Default)]
pub struct InboundEvent {
    pub event_type: Option<String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// `{statusCode, body}` as returned to the gateway.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RelayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl RelayResponse {
    fn delivered(message: &str) -> Self {
        RelayResponse {
            status_code: 200,
            body: serde_json::json!({ "message": message }).to_string(),
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        RelayResponse {
            status_code: err.status_code().as_u16(),
            body: err.response_body(),
        }
    }
}

pub struct Relay {
    pub url_source: Box<dyn WebhookUrlSource>,
    pub notifier: Box<dyn Notifier>,
    pub issue_comment_link: LinkSource,
}

/// Turns an inbound event into a card, without any I/O.
pub fn build_message(
    event: &InboundEvent,
    issue_comment_link: LinkSource,
) -> Result<OutboundMessage, RelayError> {
    let event_type: EventType = event.event_type.as_deref().unwrap_or("").parse()?;
    let doc = ghapi::parse_payload(&event.body, event.is_base64_encoded)?;
    event_type.check_action(&doc)?;
    let fields = NotificationFields::extract(event_type, &doc, issue_comment_link)?;

    Ok(OutboundMessage::new(format_message(&fields)))
}

impl Relay {
    pub async fn handle(&self, event: &InboundEvent) -> RelayResponse {
        match self.relay(event).await {
            Ok(message) => RelayResponse::delivered(&message),
            Err(err) => {
                match &err {
                    e if e.is_benign() => log::info!("skipped: {}", e),
                    RelayError::Configuration(_) | RelayError::Delivery(_) => {
                        log::error!("{}", err)
                    }
                    e => log::warn!("rejected: {}", e),
                }
                err.into()
            }
        }
    }

    async fn relay(&self, event: &InboundEvent) -> Result<String, RelayError> {
        // no destination, no processing
        let url = self.url_source.webhook_url().await?;

        let message = build_message(event, self.issue_comment_link)?;
        self.notifier.deliver(&url, &message).await?;
        log::info!(
            "relayed {} event",
            event.event_type.as_deref().unwrap_or_default()
        );

        Ok(message.text().to_string())
    }
}
