mod google;

pub use google::{GoogleGeocoder, parse_geocode_response};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;

/// Place name cached and returned when the service has no address for a coordinate.
pub const NOT_FOUND: &str = "?";

/// A GPS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` for non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }

    /// Cache key for this coordinate: each component multiplied by `precision` and floored,
    /// joined as `"{lat}-{lng}"`.
    ///
    /// Points in the same cell share a key and therefore a single lookup.
    pub fn cache_key(&self, precision: f64) -> String {
        let lat = (self.latitude * precision).floor() as i64;
        let lng = (self.longitude * precision).floor() as i64;
        format!("{lat}-{lng}")
    }
}

/// One address returned by a reverse-geocoding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCandidate {
    pub formatted_address: String,
    /// Place-type tags, e.g. `"neighborhood"`, `"sublocality_level_1"`, `"locality"`.
    pub types: Vec<String>,
}

impl AddressCandidate {
    pub fn new(formatted_address: impl Into<String>, types: &[&str]) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// Trait for reverse-geocoding services.
///
/// The crate ships with [`GoogleGeocoder`]; tests and other backends implement this trait
/// directly.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// The display name of this service.
    fn name(&self) -> &str;
    /// Look up the addresses at an exact coordinate. One call is one service request.
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<AddressCandidate>>;
}

/// Pick the most useful place name out of the candidates.
///
/// A neighborhood wins outright. Otherwise a sub-locality (level 1) is taken, the last one
/// seen replacing earlier picks, and a locality is only taken while nothing has been picked.
/// With none of those tags the first candidate is used, and an empty list yields
/// [`NOT_FOUND`].
pub fn select_best_address(candidates: &[AddressCandidate]) -> String {
    let mut selected: Option<&AddressCandidate> = None;

    for candidate in candidates {
        if candidate.has_type("neighborhood") {
            selected = Some(candidate);
            break;
        } else if candidate.has_type("sublocality_level_1") {
            selected = Some(candidate);
        } else if candidate.has_type("locality") && selected.is_none() {
            selected = Some(candidate);
        }
    }

    selected
        .or_else(|| candidates.first())
        .map(|c| c.formatted_address.clone())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Reverse geocoding with a per-run cache keyed on quantized coordinates.
///
/// The cache lives as long as the resolver, which is created for a single run.
pub struct GeocodeResolver {
    geocoder: Arc<dyn Geocoder>,
    precision: f64,
    cache: HashMap<String, String>,
    lookups: usize,
}

impl GeocodeResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, precision: f64) -> Self {
        Self {
            geocoder,
            precision,
            cache: HashMap::new(),
            lookups: 0,
        }
    }

    /// Resolve a coordinate to a place name.
    ///
    /// A cache hit returns the stored name without contacting the service, even if the
    /// exact coordinate differs within the cell. A miss queries the service once for the
    /// exact coordinate and caches the selected name, including [`NOT_FOUND`]. Service
    /// errors are returned and not cached. Every resolution is written to `sink`.
    pub async fn resolve(
        &mut self,
        coordinate: Coordinate,
        sink: &mut DiagnosticSink,
    ) -> Result<String> {
        let key = coordinate.cache_key(self.precision);

        let place = match self.cache.get(&key) {
            Some(place) => {
                log::debug!("  geocode cache hit for {key}");
                place.clone()
            }
            None => {
                self.lookups += 1;
                let candidates = self.geocoder.reverse_geocode(coordinate).await?;
                let place = select_best_address(&candidates);
                log::debug!(
                    "  {} returned {} candidate(s) for {key}",
                    self.geocoder.name(),
                    candidates.len()
                );
                self.cache.insert(key, place.clone());
                place
            }
        };

        sink.geocode(coordinate.latitude, coordinate.longitude, &place);
        Ok(place)
    }

    /// Number of service requests made so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Number of cached cells.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
