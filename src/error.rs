use actix_web::http::StatusCode;

/// Every way a relay invocation can end early.
///
/// The benign skips (`UnhandledEvent`, `UnhandledAction`) travel through the
/// same channel as real failures so each stage can bail out with `?`; they map
/// to a 200 response.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unexpected event: {0}")]
    UnhandledEvent(String),

    #[error("unexpected action for {event}: {action}")]
    UnhandledAction { event: String, action: String },

    #[error("failed to parse JSON: {0}")]
    InvalidJson(String),

    #[error("empty body")]
    EmptyBody,

    #[error("missing or empty field `{0}`")]
    MissingField(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::UnhandledEvent(_) | RelayError::UnhandledAction { .. } => StatusCode::OK,
            RelayError::InvalidJson(_) | RelayError::EmptyBody | RelayError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Configuration(_) | RelayError::Delivery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text returned to the caller. Downstream details stay in the log.
    pub fn response_body(&self) -> String {
        match self {
            RelayError::UnhandledEvent(event) => format!("Unexcepted event: {}", event),
            RelayError::UnhandledAction { event, action } => {
                format!("Unexcepted event action: {}: {}", event, action)
            }
            RelayError::InvalidJson(_) => "Invalid JSON".to_string(),
            RelayError::EmptyBody => "Empty body".to_string(),
            RelayError::MissingField(path) => format!("invalid body: missing {}", path),
            RelayError::Delivery(_) => "Unexcept Error".to_string(),
            RelayError::Configuration(_) => "Configuration Error".to_string(),
        }
    }

    pub fn is_benign(&self) -> bool {
        self.status_code() == StatusCode::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            RelayError::UnhandledEvent("push".to_string()).status_code(),
            StatusCode::OK
        );
        assert_eq!(RelayError::EmptyBody.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::Delivery("503".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::Configuration("no url".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bodies_hide_downstream_detail() {
        let err = RelayError::Delivery("connection refused to https://secret".to_string());
        assert_eq!(err.response_body(), "Unexcept Error");

        let err = RelayError::InvalidJson("expected value at line 1".to_string());
        assert_eq!(err.response_body(), "Invalid JSON");
    }

    #[test]
    fn skip_bodies() {
        let err = RelayError::UnhandledAction {
            event: "pull_request".to_string(),
            action: "closed".to_string(),
        };
        assert!(err.is_benign());
        assert_eq!(
            err.response_body(),
            "Unexcepted event action: pull_request: closed"
        );
    }
}
