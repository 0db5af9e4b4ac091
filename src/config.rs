use crate::delivery::{
    ParameterStore, StaticUrl, WebhookUrlSource, DEFAULT_PARAMETER_ENDPOINT,
    DEFAULT_PARAMETER_TIMEOUT,
};
use crate::error::RelayError;
use crate::ghapi::LinkSource;
use std::time::Duration;

pub static DEFAULT_CONFIG_PATH: &str = "/etc/webhookrelay";
pub static CONFIG_PATH_ENV: &str = "WEBHOOKRELAY_CONFIG";

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tls {
    /// SSL key
    pub key: String,
    /// SSL cert
    pub cert: String,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterStoreConfig {
    /// name of the parameter holding the webhook URL
    pub name: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// environment variable with the session token, defaults to AWS_SESSION_TOKEN
    #[serde(default)]
    pub session_token_env: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Webhook {
    Url(String),
    ParameterStore(ParameterStoreConfig),
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// serve https when set
    #[serde(default)]
    pub tls: Option<Tls>,
    /// destination of the cards. Falls back to WEBHOOK_URL / SSM_PARAMETER_PATH
    #[serde(default)]
    pub webhook: Option<Webhook>,
    /// link issue_comment cards to the issue or to the comment itself
    #[serde(default)]
    pub issue_comment_link: LinkSource,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: default_listen(),
            tls: None,
            webhook: None,
            issue_comment_link: LinkSource::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(s: &str) -> Result<Config, RelayError> {
        // an empty file is a valid, all-defaults config
        if s.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(s).map_err(|e| RelayError::Configuration(e.to_string()))
    }

    /// Reads the config file if there is one. A missing default file means
    /// everything comes from the environment.
    pub fn load(env: impl Fn(&str) -> Option<String>) -> Result<Config, RelayError> {
        let (path, explicit) = match env(CONFIG_PATH_ENV) {
            Some(path) => (path, true),
            None => (DEFAULT_CONFIG_PATH.to_string(), false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(s) => Config::from_yaml(&s)?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(RelayError::Configuration(format!(
                    "can't read {}: {}",
                    path, e
                )))
            }
        };
        config.apply_env(&env);

        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if self.webhook.is_some() {
            return;
        }
        let non_empty = |name: &str| env(name).filter(|v| !v.is_empty());
        self.webhook = if let Some(name) = non_empty("SSM_PARAMETER_PATH") {
            Some(Webhook::ParameterStore(ParameterStoreConfig {
                name,
                endpoint: None,
                timeout_secs: None,
                session_token_env: None,
            }))
        } else {
            non_empty("WEBHOOK_URL").map(Webhook::Url)
        };
    }

    /// Builds the webhook URL source, failing if the destination or its
    /// credential isn't configured.
    pub fn url_source(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Box<dyn WebhookUrlSource>, RelayError> {
        match &self.webhook {
            None => Err(RelayError::Configuration(
                "no webhook configured (set webhook, WEBHOOK_URL or SSM_PARAMETER_PATH)"
                    .to_string(),
            )),
            Some(Webhook::Url(url)) if url.is_empty() => Err(RelayError::Configuration(
                "webhook url is empty".to_string(),
            )),
            Some(Webhook::Url(url)) => Ok(Box::new(StaticUrl(url.clone()))),
            Some(Webhook::ParameterStore(store)) => {
                if store.name.is_empty() {
                    return Err(RelayError::Configuration(
                        "parameter store name is empty".to_string(),
                    ));
                }
                let token_env = store
                    .session_token_env
                    .as_deref()
                    .unwrap_or("AWS_SESSION_TOKEN");
                let session_token = env(token_env)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| RelayError::Configuration(format!("{} is not set", token_env)))?;

                Ok(Box::new(ParameterStore {
                    endpoint: store
                        .endpoint
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PARAMETER_ENDPOINT.to_string()),
                    name: store.name.clone(),
                    session_token,
                    timeout: store
                        .timeout_secs
                        .map_or(DEFAULT_PARAMETER_TIMEOUT, Duration::from_secs),
                }))
            }
        }
    }
}
