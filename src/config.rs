use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub geocoding: GeocodingConfig,
    pub location: LocationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,             // Report API; injected into the client
    pub health_poll_seconds: u64,     // Interval for the background health probe
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String, // Reverse-geocoding service (Nominatim-compatible)
}

/// Which backend supplies the device position.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// IP geolocation (coarse, works anywhere with a network).
    Ip,
    /// Fixed coordinates from this file.
    Manual,
    /// Location acquisition disabled; submissions fail as unsupported.
    Off,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationConfig {
    pub source: SourceKind,
    pub manual_lat: f64,       // Latitude used when source is "manual"
    pub manual_lon: f64,       // Longitude used when source is "manual"
    pub timeout_seconds: u64,  // Deadline for one acquisition
    pub high_accuracy: bool,   // Request the most precise fix the source can give
    pub max_age_seconds: u64,  // 0 = never serve a cached fix
}

impl LocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        let config_path = "config.toml";

        if let Ok(content) = fs::read_to_string(config_path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to parse config.toml: {}. Using defaults.", e),
            }
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        let toml_string = toml::to_string_pretty(&default_config).unwrap();
        if fs::write(config_path, toml_string).is_err() {
            warn!("Could not write default config.toml to disk.");
        }

        info!("Loaded default configuration.");
        default_config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "https://lthaibinh-rescue.hf.space".to_string(),
                health_poll_seconds: 30,
            },
            geocoding: GeocodingConfig {
                base_url: "https://nominatim.openstreetmap.org".to_string(),
            },
            location: LocationConfig {
                source: SourceKind::Ip,
                manual_lat: 10.8231,
                manual_lon: 106.6297,
                timeout_seconds: 15,
                high_accuracy: true,
                max_age_seconds: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_file() {
        let toml_src = r#"
            [api]
            base_url = "http://localhost:5000"
            health_poll_seconds = 10

            [geocoding]
            base_url = "http://localhost:8080"

            [location]
            source = "manual"
            manual_lat = 20.4463
            manual_lon = 106.3366
            timeout_seconds = 5
            high_accuracy = false
            max_age_seconds = 60
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.location.source, SourceKind::Manual);
        assert_eq!(config.location.timeout(), Duration::from_secs(5));
        assert_eq!(config.location.max_age(), Duration::from_secs(60));
    }

    #[test]
    fn defaults_match_the_deployed_service() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://lthaibinh-rescue.hf.space");
        assert_eq!(config.location.source, SourceKind::Ip);
        assert!(config.location.high_accuracy);
        assert_eq!(config.location.timeout(), Duration::from_secs(15));
        assert_eq!(config.location.max_age(), Duration::ZERO);
    }

    #[test]
    fn default_file_round_trips() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.geocoding.base_url, Config::default().geocoding.base_url);
        assert_eq!(parsed.location.source, SourceKind::Ip);
    }
}
