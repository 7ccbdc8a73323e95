use smsline_core::config::DEFAULT_PORT;

use crate::error::ClientError;

pub fn default_webhook_url() -> String {
    format!("http://localhost:{DEFAULT_PORT}/webhook")
}

/// Form fields of a simulated Twilio inbound-SMS webhook.
#[derive(Debug, Clone)]
pub struct TestSms {
    pub from: String,
    pub body: String,
    pub sid: String,
}

impl Default for TestSms {
    fn default() -> Self {
        Self {
            from: "+15551234567".into(),
            body: "Test message from script!".into(),
            sid: format!("SM{}", chrono::Utc::now().timestamp_millis()),
        }
    }
}

/// POST `sms` to `url` as a form, returning the status and response body.
pub async fn send_test_sms(
    http: &reqwest::Client,
    url: &str,
    sms: &TestSms,
) -> Result<(u16, String), ClientError> {
    let resp = http
        .post(url)
        .form(&[
            ("From", sms.from.as_str()),
            ("Body", sms.body.as_str()),
            ("MessageSid", sms.sid.as_str()),
        ])
        .send()
        .await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok((status, body))
}
