//! Single-shot HTTP helpers for the police API.
//!
//! Sub-requests are never retried here: a failed month is absorbed as a
//! zero contribution by the aggregation layer, so every helper performs
//! exactly one request and classifies the outcome.

use serde::de::DeserializeOwned;

use crate::PoliceApiError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends the request and decodes a successful response body as JSON.
///
/// HTTP 429 maps to [`PoliceApiError::RateLimited`]; any other non-2xx
/// status maps to [`PoliceApiError::Status`].
///
/// # Errors
///
/// Returns [`PoliceApiError`] if the request fails, the server returns a
/// non-success status, or the body is not valid JSON for `T`.
pub async fn send_json<T>(request: reqwest::RequestBuilder) -> Result<T, PoliceApiError>
where
    T: DeserializeOwned,
{
    let response = request.send().await?;

    let url = response.url().to_string();
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        log::warn!("HTTP 429 (rate limited): {url}");
        return Err(PoliceApiError::RateLimited { url });
    }

    if !status.is_success() {
        log::debug!("HTTP {status}: {url}");
        return Err(PoliceApiError::Status {
            status: status.as_u16(),
            url,
        });
    }

    // Read the raw body first so the actual content can be logged when
    // decoding fails.
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        log::warn!(
            "JSON parse failed\n  \
             url: {url}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {}",
            text.len(),
            preview(&text),
        );
        PoliceApiError::Json(e)
    })
}

fn preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_bodies() {
        assert_eq!(preview("[]"), "[]");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let body = "é".repeat(BODY_PREVIEW_LEN);
        let out = preview(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= BODY_PREVIEW_LEN + 3);
    }
}
