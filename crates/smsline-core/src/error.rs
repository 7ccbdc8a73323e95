use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmslineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),
}

impl SmslineError {
    /// Short error code string, logged as `error_code` by the webhook.
    pub fn code(&self) -> &'static str {
        match self {
            SmslineError::Config(_) => "CONFIG_ERROR",
            SmslineError::InvalidSignature(_) => "INVALID_SIGNATURE",
            SmslineError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
        }
    }
}

pub type Result<T> = std::result::Result<T, SmslineError>;
