//! Error sanitization: fixed user-facing messages plus credential redaction.
//!
//! Raw failures can echo request headers back in their messages, API key
//! included. Nothing leaves this module with the literal key in it.

use crate::host::HttpFailure;
use crate::UserFacingError;

/// Mask suffix appended to the preserved key prefix during redaction.
const MASK_SUFFIX: &str = "****";

/// Fixed status-code → message table. Codes outside this table surface the
/// (redacted) upstream message verbatim.
fn friendly_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "Bad Request: Please check your input parameters",
        401 => "Unauthorized: Invalid API Key",
        403 => "Forbidden: Your API Key does not have access to this resource",
        404 => "Not Found: The requested endpoint does not exist",
        429 => "Rate Limited: Too many requests, please try again later",
        500 => "Internal Server Error: DeerAPI service error",
        502 => "Bad Gateway: DeerAPI service temporarily unavailable",
        503 => "Service Unavailable: DeerAPI is under maintenance",
        _ => return None,
    };
    Some(message)
}

/// Replace every literal occurrence of the API key with its first four
/// characters plus a fixed mask.
fn redact(text: &str, api_key: &str) -> String {
    if api_key.is_empty() || !text.contains(api_key) {
        return text.to_string();
    }
    let prefix: String = api_key.chars().take(4).collect();
    text.replace(api_key, &format!("{prefix}{MASK_SUFFIX}"))
}

/// Sanitize a raw transport failure into a host-facing error.
///
/// The credential is redacted from both message and description before the
/// status-code mapping is applied, so an unmapped status can never leak the
/// key through the verbatim-message path.
pub fn sanitize(failure: &HttpFailure, api_key: &str) -> UserFacingError {
    let message = redact(&failure.message, api_key);
    let description = redact(&failure.description, api_key);

    let status = failure.status_code();
    let message = status
        .and_then(friendly_message)
        .map(str::to_string)
        .unwrap_or(message);

    UserFacingError {
        message,
        description,
        code: status.map_or_else(|| "0".to_string(), |s| s.to_string()),
    }
}
