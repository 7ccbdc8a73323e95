use chrono::{Local, TimeZone};
use smsline_core::Message;

/// `+15551234567` / `5551234567` → `(555) 123-4567`. Anything else is
/// returned unchanged.
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let national = match digits.len() {
        10 => &digits[..],
        11 if digits.starts_with('1') => &digits[1..],
        _ => return phone.to_string(),
    };
    format!("({}) {}-{}", &national[..3], &national[3..6], &national[6..])
}

/// Relative age for recent messages, local clock time for older ones.
pub fn format_timestamp(timestamp_ms: i64, now_ms: i64) -> String {
    let age_ms = now_ms - timestamp_ms;
    if age_ms < 60_000 {
        return "Just now".to_string();
    }
    if age_ms < 3_600_000 {
        return format!("{}m ago", age_ms / 60_000);
    }
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

/// Plain-text toast card for terminal output.
pub fn render_toast(message: &Message, now_ms: i64) -> String {
    format!(
        "┌ New Text Message\n│ From: {}\n│ {}\n└ {}",
        format_phone_number(&message.from),
        message.body,
        format_timestamp(message.timestamp, now_ms)
    )
}
