use crate::card::OutboundMessage;
use crate::error::RelayError;
use std::time::Duration;

pub static DEFAULT_PARAMETER_ENDPOINT: &str = "http://localhost:2773/systemsmanager/parameters/get";
pub static SESSION_TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";
pub const DEFAULT_PARAMETER_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the chat webhook URL comes from. Resolved on every invocation.
#[async_trait::async_trait(?Send)]
pub trait WebhookUrlSource: Send + Sync {
    async fn webhook_url(&self) -> Result<String, RelayError>;
}

/// Sends a finished card to the chat webhook. Called at most once per event.
#[async_trait::async_trait(?Send)]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, url: &str, message: &OutboundMessage) -> Result<(), RelayError>;
}

#[derive(Debug, Clone)]
pub struct StaticUrl(pub String);

#[async_trait::async_trait(?Send)]
impl WebhookUrlSource for StaticUrl {
    async fn webhook_url(&self) -> Result<String, RelayError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, serde::Deserialize)]
struct Parameter {
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, serde::Deserialize)]
struct ParameterResponse {
    #[serde(rename = "Parameter")]
    parameter: Parameter,
}

/// Reads the webhook URL through the local parameter/secrets extension.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    pub endpoint: String,
    pub name: String,
    pub session_token: String,
    pub timeout: Duration,
}

#[async_trait::async_trait(?Send)]
impl WebhookUrlSource for ParameterStore {
    async fn webhook_url(&self) -> Result<String, RelayError> {
        let client = actix_web::client::Client::default();
        let mut response = client
            .get(&self.endpoint)
            .query(&[("name", self.name.as_str())])
            .map_err(|e| RelayError::Configuration(format!("bad parameter name: {}", e)))?
            .header(SESSION_TOKEN_HEADER, self.session_token.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                RelayError::Configuration(format!("can't reach parameter store: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(RelayError::Configuration(format!(
                "parameter store returned {} for {}",
                response.status(),
                self.name
            )));
        }

        let parameter: ParameterResponse = response.json().await.map_err(|e| {
            RelayError::Configuration(format!("can't decode parameter {}: {}", self.name, e))
        })?;
        if parameter.parameter.value.is_empty() {
            return Err(RelayError::Configuration(format!(
                "parameter {} is empty",
                self.name
            )));
        }

        Ok(parameter.parameter.value)
    }
}

/// Posts cards as JSON to an incoming webhook.
#[derive(Debug, Clone, Default)]
pub struct WebhookNotifier;

#[async_trait::async_trait(?Send)]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, url: &str, message: &OutboundMessage) -> Result<(), RelayError> {
        let client = actix_web::client::Client::default();
        let response = client
            .post(url)
            .header("Content-Type", "application/json")
            .send_json(message)
            .await
            .map_err(|e| RelayError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::Delivery(format!(
                "webhook returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
