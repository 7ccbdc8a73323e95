//! SMS webhook receiver, POST /webhook
//!
//! Twilio posts each inbound text as `application/x-www-form-urlencoded`
//! (`From`, `Body`, `MessageSid`, plus provider metadata we ignore). The
//! message is appended to the store, which fans it out to every open stream,
//! and Twilio gets a TwiML acknowledgement back.
//!
//! Signature verification (`X-Twilio-Signature`) is opt-in through
//! `webhook.verify_signature`.

use axum::{
    extract::{rejection::FormRejection, OriginalUri, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha1::Sha1;
use smsline_core::{config::WebhookConfig, Message, SmslineError};
use smsline_protocol::twiml;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info, warn};

use crate::app::AppState;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

// ── Public handler ────────────────────────────────────────────────────────────

/// POST /webhook
///
/// Returns 200 + TwiML on success, 403 on a bad signature (when enabled),
/// 500 + JSON error when the body cannot be read as a form.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    form: Result<Form<BTreeMap<String, String>>, FormRejection>,
) -> Response {
    let params = match form {
        Ok(Form(params)) => params,
        Err(rejection) => {
            return reject(SmslineError::MalformedPayload(rejection.body_text()));
        }
    };

    let cfg = &state.config.webhook;
    if cfg.verify_signature {
        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        let url = signed_url(cfg, &headers, path);
        if let Err(e) = verify_twilio_signature(&headers, &url, &params, cfg.auth_token.as_deref())
        {
            debug!(url = %url, "signature check failed");
            return reject(e);
        }
    }

    let message = message_from_params(&params);
    let delivered = state.store.append(message.clone());
    info!(
        id = %message.id,
        from = %message.from,
        body_len = message.body.len(),
        delivered,
        "new SMS received and broadcast"
    );

    let body = match &cfg.auto_reply {
        Some(text) => twiml::reply(text),
        None => twiml::EMPTY_RESPONSE.to_string(),
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, twiml::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Build the stored message from webhook fields.
///
/// Absent `From`/`Body` become empty strings; an absent `MessageSid` gets a
/// locally generated id.
pub fn message_from_params(params: &BTreeMap<String, String>) -> Message {
    let field = |name: &str| params.get(name).cloned().unwrap_or_default();
    let id = params
        .get("MessageSid")
        .filter(|sid| !sid.is_empty())
        .cloned()
        .unwrap_or_else(Message::local_id);
    Message::received(id, field("From"), field("Body"))
}

// ── Signature helpers ─────────────────────────────────────────────────────────

/// The URL Twilio signed: configured public origin (or the request's Host)
/// plus the request path and query.
fn signed_url(cfg: &WebhookConfig, headers: &HeaderMap, path: &str) -> String {
    if let Some(base) = cfg.public_url.as_deref() {
        return format!("{}{}", base.trim_end_matches('/'), path);
    }
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let scheme = header_str("x-forwarded-proto").unwrap_or("https");
    let host = header_str("host").unwrap_or("localhost");
    format!("{scheme}://{host}{path}")
}

/// `base64(HMAC-SHA1(auth_token, url + key1 + value1 + key2 + value2 ...))`
/// with the POST parameters sorted by key.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, String> {
    let mac = signing_mac(auth_token, url, params)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn signing_mac(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> Result<HmacSha1, String> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|_| "invalid HMAC key length".to_string())?;
    mac.update(url.as_bytes());
    for (key, value) in params {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(mac)
}

/// Verify `X-Twilio-Signature` against the request URL and form parameters.
pub fn verify_twilio_signature(
    headers: &HeaderMap,
    url: &str,
    params: &BTreeMap<String, String>,
    auth_token: Option<&str>,
) -> Result<(), SmslineError> {
    let invalid = |reason: &str| SmslineError::InvalidSignature(reason.to_string());
    let auth_token = auth_token.ok_or_else(|| invalid("no auth token configured"))?;

    let sig_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| invalid("missing X-Twilio-Signature header"))?;

    let expected = STANDARD
        .decode(sig_header)
        .map_err(|_| invalid("X-Twilio-Signature is not valid base64"))?;

    signing_mac(auth_token, url, params)
        .map_err(|e| invalid(e.as_str()))?
        .verify_slice(&expected)
        .map_err(|_| invalid("signature mismatch"))
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Log a webhook failure and map it to its HTTP response.
fn reject(err: SmslineError) -> Response {
    warn!(error_code = err.code(), error = %err, "error processing webhook");
    let (status, message) = match err {
        SmslineError::InvalidSignature(_) => (StatusCode::FORBIDDEN, "Invalid signature"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    };
    (status, Json(json!({ "error": message }))).into_response()
}
