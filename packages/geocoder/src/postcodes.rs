//! postcodes.io client.
//!
//! Resolves a UK postcode to its canonical form and centroid with
//! `GET /postcodes/{postcode}`. Unknown postcodes answer HTTP 404 with
//! `{"status": 404, "error": "Invalid postcode"}`.
//!
//! See <https://postcodes.io/docs>

use std::fmt::Write as _;

use async_trait::async_trait;
use crime_lookup_police_models::{Coordinate, LocationId};

use crate::{LocationResolver, ResolveError, ResolvedLocation};

/// postcodes.io resolver.
#[derive(Debug, Clone)]
pub struct PostcodesIoResolver {
    client: reqwest::Client,
    base_url: String,
}

impl PostcodesIoResolver {
    /// Creates a resolver against `base_url` (no trailing slash).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn lookup_url(&self, postcode: &str) -> String {
        format!("{}/postcodes/{}", self.base_url, encode_path_segment(postcode))
    }
}

#[async_trait]
impl LocationResolver for PostcodesIoResolver {
    async fn resolve(&self, text: &str) -> Result<ResolvedLocation, ResolveError> {
        let resp = self.client.get(self.lookup_url(text)).send().await?;
        check_status(resp.status(), text)?;

        let body = resp.text().await?;
        parse_response(&decode_body(&body)?)?.ok_or_else(|| ResolveError::NotFound {
            query: text.to_string(),
        })
    }
}

/// Maps a non-success lookup status to its error.
fn check_status(status: reqwest::StatusCode, query: &str) -> Result<(), ResolveError> {
    match status {
        reqwest::StatusCode::NOT_FOUND => Err(ResolveError::NotFound {
            query: query.to_string(),
        }),
        reqwest::StatusCode::TOO_MANY_REQUESTS => Err(ResolveError::RateLimited),
        status if !status.is_success() => Err(ResolveError::Status {
            status: status.as_u16(),
        }),
        _ => Ok(()),
    }
}

fn decode_body(body: &str) -> Result<serde_json::Value, ResolveError> {
    serde_json::from_str(body).map_err(|e| ResolveError::Parse {
        message: format!("Invalid postcodes.io response: {e}"),
    })
}

/// Parses a postcodes.io lookup response.
///
/// Returns `Ok(None)` when the response carries no result.
fn parse_response(body: &serde_json::Value) -> Result<Option<ResolvedLocation>, ResolveError> {
    let result = match body.get("result") {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(result) => result,
    };

    let postcode = result["postcode"]
        .as_str()
        .ok_or_else(|| ResolveError::Parse {
            message: "Missing postcode in postcodes.io response".to_string(),
        })?;

    // Non-geographic postcodes (PO boxes, large users) have null
    // coordinates and cannot be looked up by location.
    let (Some(latitude), Some(longitude)) =
        (result["latitude"].as_f64(), result["longitude"].as_f64())
    else {
        log::debug!("postcodes.io: {postcode} has no coordinates");
        return Ok(None);
    };

    Ok(Some(ResolvedLocation {
        id: LocationId::new(postcode),
        coordinate: Coordinate::new(latitude, longitude),
    }))
}

/// Percent-encodes everything except ASCII alphanumerics.
fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postcode_result() {
        let body = serde_json::json!({
            "status": 200,
            "result": {
                "postcode": "SW1A 1AA",
                "quality": 1,
                "longitude": -0.141_588,
                "latitude": 51.501_009,
                "country": "England"
            }
        });
        let resolved = parse_response(&body).unwrap().unwrap();
        assert_eq!(resolved.id, LocationId::new("SW1A 1AA"));
        assert!((resolved.coordinate.latitude - 51.501_009).abs() < 1e-6);
        assert!((resolved.coordinate.longitude - -0.141_588).abs() < 1e-6);
    }

    #[test]
    fn null_result_is_not_found() {
        let body = serde_json::json!({ "status": 404, "error": "Invalid postcode" });
        assert!(parse_response(&body).unwrap().is_none());

        let body = serde_json::json!({ "status": 200, "result": null });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn null_coordinates_are_not_found() {
        let body = serde_json::json!({
            "status": 200,
            "result": { "postcode": "BX1 1LT", "latitude": null, "longitude": null }
        });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn missing_postcode_is_parse_error() {
        let body = serde_json::json!({
            "status": 200,
            "result": { "latitude": 51.5, "longitude": -0.1 }
        });
        assert!(matches!(
            parse_response(&body),
            Err(ResolveError::Parse { .. })
        ));
    }

    #[test]
    fn maps_lookup_statuses() {
        assert!(check_status(reqwest::StatusCode::OK, "SW1A 1AA").is_ok());
        assert!(matches!(
            check_status(reqwest::StatusCode::NOT_FOUND, "ZZ99 9ZZ"),
            Err(ResolveError::NotFound { ref query }) if query == "ZZ99 9ZZ"
        ));
        assert!(matches!(
            check_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "SW1A 1AA"),
            Err(ResolveError::RateLimited)
        ));
        assert!(matches!(
            check_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "SW1A 1AA"),
            Err(ResolveError::Status { status: 500 })
        ));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(
            decode_body("<html>Bad Gateway</html>"),
            Err(ResolveError::Parse { .. })
        ));
        assert!(decode_body(r#"{"status": 200, "result": null}"#).is_ok());
    }

    #[test]
    fn encodes_spaces_in_lookup_url() {
        let resolver = PostcodesIoResolver::new(reqwest::Client::new(), "https://api.postcodes.io/");
        assert_eq!(
            resolver.lookup_url("SW1A 1AA"),
            "https://api.postcodes.io/postcodes/SW1A%201AA"
        );
        assert_eq!(encode_path_segment("a/b?c"), "a%2Fb%3Fc");
    }
}
