use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::{debug, warn};

use crate::model::Coordinates;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "MOF-Guide-Scraper/2.0";
const COUNTRY_CODES: &str = "fr";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between Nominatim calls. Applied before every call,
/// including the first of a run, so back-to-back pipeline invocations
/// cannot burst past the service's one-request-per-second budget.
const RATE_LIMIT: Duration = Duration::from_millis(1100);

/// Free-text address lookup against Nominatim, one candidate per
/// query, restricted to France.
pub struct Geocoder {
    client: Client,
}

impl Geocoder {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Geocoder { client })
    }

    /// Resolve an address to coordinates. Never fails: any network or
    /// response problem is logged and reported as unresolved. A null
    /// or empty address short-circuits without touching the network.
    pub async fn geocode(&self, address: Option<&str>) -> Coordinates {
        let Some(addr) = address.map(str::trim).filter(|a| !a.is_empty()) else {
            return Coordinates::none();
        };

        tokio::time::sleep(RATE_LIMIT).await;

        match self.lookup(addr).await {
            Ok(coords) => coords,
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", addr, e);
                Coordinates::none()
            }
        }
    }

    async fn lookup(&self, address: &str) -> Result<Coordinates> {
        let body: serde_json::Value = self
            .client
            .get(NOMINATIM_URL)
            .query(&[
                ("q", address),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", COUNTRY_CODES),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_candidate(&body, address)
    }
}

/// Pull lat/lon out of the first candidate of a Nominatim response.
/// An empty candidate list is a normal "no match" (unresolved, not an
/// error); a response that is not an array, or a candidate missing
/// parseable lat/lon fields, is an error.
fn first_candidate(body: &serde_json::Value, address: &str) -> Result<Coordinates> {
    let candidates = body
        .as_array()
        .ok_or_else(|| anyhow!("unexpected response shape: not an array"))?;

    let Some(hit) = candidates.first() else {
        debug!("No geocoding match for '{}'", address);
        return Ok(Coordinates::none());
    };

    let lat = parse_coord(hit.get("lat"))
        .ok_or_else(|| anyhow!("candidate has no parseable 'lat'"))?;
    let lon = parse_coord(hit.get("lon"))
        .ok_or_else(|| anyhow!("candidate has no parseable 'lon'"))?;

    Ok(Coordinates { lat: Some(lat), lon: Some(lon) })
}

// Nominatim serializes lat/lon as strings; accept plain numbers too.
fn parse_coord(value: Option<&serde_json::Value>) -> Option<f64> {
    let value = value?;
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    #[tokio::test]
    async fn null_address_short_circuits() {
        let geocoder = Geocoder::new().unwrap();
        let t0 = Instant::now();
        let coords = geocoder.geocode(None).await;
        assert_eq!(coords, Coordinates::none());
        // No rate-limit sleep, no network: must return immediately.
        assert!(t0.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn empty_and_blank_addresses_short_circuit() {
        let geocoder = Geocoder::new().unwrap();
        let t0 = Instant::now();
        assert_eq!(geocoder.geocode(Some("")).await, Coordinates::none());
        assert_eq!(geocoder.geocode(Some("   ")).await, Coordinates::none());
        assert!(t0.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn first_candidate_parses_string_floats() {
        let body = json!([{ "lat": "48.8655", "lon": "2.3298", "display_name": "..." }]);
        let coords = first_candidate(&body, "231 rue Saint-Honoré, 75001 Paris").unwrap();
        assert_eq!(coords.lat, Some(48.8655));
        assert_eq!(coords.lon, Some(2.3298));
    }

    #[test]
    fn no_match_is_unresolved_not_error() {
        let body = json!([]);
        let coords = first_candidate(&body, "nowhere").unwrap();
        assert_eq!(coords, Coordinates::none());
    }

    #[test]
    fn malformed_response_is_error() {
        assert!(first_candidate(&json!({"error": "boom"}), "x").is_err());
        assert!(first_candidate(&json!([{ "lat": "not-a-float", "lon": "2.0" }]), "x").is_err());
        assert!(first_candidate(&json!([{ "lat": "48.0" }]), "x").is_err());
    }
}
