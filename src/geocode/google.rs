use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{AddressCandidate, Coordinate, Geocoder};

/// Reverse geocoding through the Google Geocoding API.
pub struct GoogleGeocoder {
    api_key: String,
    endpoint: String,
    language: Option<String>,
    client: Client,
}

impl GoogleGeocoder {
    pub fn new(api_key: String, endpoint: String, language: Option<String>) -> Self {
        Self {
            api_key,
            endpoint,
            language: language.filter(|l| !l.trim().is_empty()),
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &str {
        "Google"
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<AddressCandidate>> {
        let latlng = format!("{},{}", coordinate.latitude, coordinate.longitude);
        let mut query = vec![("latlng", latlng.as_str()), ("key", self.api_key.as_str())];
        if let Some(language) = &self.language {
            query.push(("language", language.as_str()));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .context("Geocoding request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read geocoding response")?;

        if !status.is_success() {
            anyhow::bail!("Geocoding API error ({}): {}", status, text);
        }

        parse_geocode_response(&text)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Parse a Geocoding API response body into address candidates.
///
/// `ZERO_RESULTS` is an empty list. Any other status besides `OK` is an error carrying
/// the service's `error_message`.
pub fn parse_geocode_response(text: &str) -> Result<Vec<AddressCandidate>> {
    let response: GeocodeResponse =
        serde_json::from_str(text).context("Failed to parse geocoding response JSON")?;

    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .map(|r| AddressCandidate {
                formatted_address: r.formatted_address,
                types: r.types,
            })
            .collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        status => anyhow::bail!(
            "Geocoding failed with status {status}: {}",
            response.error_message.as_deref().unwrap_or("no error message")
        ),
    }
}
