//! Reverse geocoding for the Mayday TUI.
//!
//! Turns an acquired coordinate pair into something a rescue operator can
//! read. Talks to a Nominatim-compatible service; every failure (transport,
//! HTTP status, body shape) collapses into the formatted-coordinates
//! fallback, so resolution never fails outward.

use crate::config::GeocodingConfig;
use serde::Deserialize;
use tracing::{debug, warn};

/// Client identifier sent with every geocoding request. Nominatim's usage
/// policy requires one.
const USER_AGENT: &str = "MaydayTui/0.1 (emergency-report-client)";

/// An address string plus how it was obtained. The two variants drive
/// different status-line copy after acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAddress {
    /// The geocoder produced a readable address or place name.
    Geocoded(String),
    /// Formatted coordinates, shown when the geocoder was unreachable,
    /// unparseable, or had nothing usable to say.
    Fallback(String),
}

impl ResolvedAddress {
    pub fn into_string(self) -> String {
        match self {
            ResolvedAddress::Geocoded(s) | ResolvedAddress::Fallback(s) => s,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResolvedAddress::Geocoded(s) | ResolvedAddress::Fallback(s) => s,
        }
    }
}

/// Anything that can turn coordinates into display text.
///
/// The production implementation is [`Geocoder`]; tests substitute a canned
/// resolver. Implementations must be infallible.
#[allow(async_fn_in_trait)]
pub trait AddressResolver {
    async fn resolve(&self, lat: f64, lng: f64) -> ResolvedAddress;
}

/// Structured address detail from the geocoding response. All fields are
/// optional; empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressParts {
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl AddressParts {
    /// Joins whichever parts are present, in fixed priority order:
    /// house number, road, suburb/neighbourhood, city/town/village, state.
    /// Returns `None` when no part qualifies.
    pub fn assemble(&self) -> Option<String> {
        let parts: Vec<&str> = [
            pick(&[&self.house_number]),
            pick(&[&self.road]),
            pick(&[&self.suburb, &self.neighbourhood]),
            pick(&[&self.city, &self.town, &self.village]),
            pick(&[&self.state]),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// First non-empty candidate, e.g. suburb falling back to neighbourhood.
fn pick<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|c| c.as_deref().filter(|s| !s.is_empty()))
}

/// The subset of the reverse-geocoding response the app reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseGeocode {
    #[serde(default)]
    pub address: Option<AddressParts>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ReverseGeocode {
    /// Best displayable address for this response: assembled parts, then
    /// the service's display name, then formatted coordinates.
    pub fn best_address(&self, lat: f64, lng: f64) -> ResolvedAddress {
        if let Some(assembled) = self.address.as_ref().and_then(AddressParts::assemble) {
            return ResolvedAddress::Geocoded(assembled);
        }
        match self.display_name.clone().filter(|s| !s.is_empty()) {
            Some(name) => ResolvedAddress::Geocoded(name),
            None => ResolvedAddress::Fallback(coordinate_fallback(lat, lng)),
        }
    }
}

/// `"lat, lng"` at six decimal places, the address of last resort.
pub fn coordinate_fallback(lat: f64, lng: f64) -> String {
    format!("{:.6}, {:.6}", lat, lng)
}

/// Reverse-geocoding client against a Nominatim-compatible endpoint.
#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, lat: f64, lng: f64) -> Result<ReverseGeocode, reqwest::Error> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=18&addressdetails=1",
            self.base_url, lat, lng
        );

        self.client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseGeocode>()
            .await
    }
}

impl AddressResolver for Geocoder {
    async fn resolve(&self, lat: f64, lng: f64) -> ResolvedAddress {
        match self.lookup(lat, lng).await {
            Ok(body) => {
                let resolved = body.best_address(lat, lng);
                debug!("Reverse geocoded ({}, {}) to '{}'", lat, lng, resolved.as_str());
                resolved
            }
            Err(e) => {
                warn!("Reverse geocoding failed: {}. Falling back to coordinates.", e);
                ResolvedAddress::Fallback(coordinate_fallback(lat, lng))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(pairs: &[(&str, &str)]) -> AddressParts {
        let mut p = AddressParts::default();
        for (key, value) in pairs {
            let v = Some(value.to_string());
            match *key {
                "house_number" => p.house_number = v,
                "road" => p.road = v,
                "suburb" => p.suburb = v,
                "neighbourhood" => p.neighbourhood = v,
                "city" => p.city = v,
                "town" => p.town = v,
                "village" => p.village = v,
                "state" => p.state = v,
                other => panic!("unknown field {other}"),
            }
        }
        p
    }

    #[test]
    fn assembles_in_priority_order() {
        let p = parts(&[
            ("house_number", "12"),
            ("road", "Main St"),
            ("city", "Springfield"),
        ]);
        assert_eq!(p.assemble().as_deref(), Some("12, Main St, Springfield"));
    }

    #[test]
    fn suburb_beats_neighbourhood_and_city_beats_town() {
        let p = parts(&[
            ("suburb", "District 1"),
            ("neighbourhood", "Ben Thanh"),
            ("town", "Small Town"),
            ("city", "Ho Chi Minh City"),
            ("state", "HCMC"),
        ]);
        assert_eq!(
            p.assemble().as_deref(),
            Some("District 1, Ho Chi Minh City, HCMC")
        );
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let p = parts(&[("road", ""), ("village", "An Binh")]);
        assert_eq!(p.assemble().as_deref(), Some("An Binh"));
    }

    #[test]
    fn no_parts_assembles_to_none() {
        assert_eq!(AddressParts::default().assemble(), None);
    }

    #[test]
    fn display_name_used_when_no_parts_recognized() {
        let body = ReverseGeocode {
            address: Some(AddressParts::default()),
            display_name: Some("Unnamed Area".to_string()),
        };
        assert_eq!(
            body.best_address(10.0, 106.0),
            ResolvedAddress::Geocoded("Unnamed Area".to_string())
        );
    }

    #[test]
    fn coordinates_used_when_nothing_usable() {
        let body = ReverseGeocode::default();
        assert_eq!(
            body.best_address(10.123456, 106.654321),
            ResolvedAddress::Fallback("10.123456, 106.654321".to_string())
        );
    }

    #[test]
    fn fallback_formats_six_decimals() {
        assert_eq!(
            coordinate_fallback(10.123456789, 106.654321012),
            "10.123457, 106.654321"
        );
        assert_eq!(coordinate_fallback(-0.5, 0.25), "-0.500000, 0.250000");
    }

    #[test]
    fn parses_a_nominatim_body() {
        let body: ReverseGeocode = serde_json::from_str(
            r#"{
                "place_id": 99,
                "display_name": "12, Main St, Springfield, Illinois, USA",
                "address": {
                    "house_number": "12",
                    "road": "Main St",
                    "city": "Springfield",
                    "state": "Illinois",
                    "country": "USA",
                    "country_code": "us"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            body.best_address(0.0, 0.0),
            ResolvedAddress::Geocoded("12, Main St, Springfield, Illinois".to_string())
        );
    }
}
