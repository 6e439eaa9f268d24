//! Best-effort geolocation collaborators.
//!
//! Every lookup returns `None` on failure; callers pick the fallback wording.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Device-reported position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What the device told us about its position for this turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceLocation {
    /// The user refused location access or the device has none.
    Denied,
    /// Access was granted but no coordinates came back.
    NoFix,
    /// A position fix. `(0.0, 0.0)` is a real fix here, not a missing one.
    At(Coordinates),
}

/// City and region from an IP lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpPlace {
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl std::fmt::Display for IpPlace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.region {
            Some(region) if !region.is_empty() => write!(f, "{}, {region}", self.city),
            _ => f.write_str(&self.city),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Geolocator {
    /// Readable address for a coordinate pair.
    async fn reverse_geocode(&self, at: Coordinates) -> Option<String>;

    /// City/region of this host's public IP, for answering "where am I".
    async fn ip_place(&self) -> Option<IpPlace>;

    /// City/region used as context in LLM prompts.
    async fn context_place(&self) -> Option<IpPlace>;
}

/// Geolocation over plain HTTP JSON services.
pub struct HttpGeolocator {
    client: reqwest::Client,
    reverse_geocode_url: String,
    ip_lookup_url: String,
    ip_context_url: String,
}

impl HttpGeolocator {
    pub fn from_config(config: &crate::config::CompanionConfig) -> Result<Self> {
        // Nominatim refuses requests without an identifying User-Agent
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            reverse_geocode_url: config.reverse_geocode_url.clone(),
            ip_lookup_url: config.ip_lookup_url.clone(),
            ip_context_url: config.ip_context_url.clone(),
        })
    }

    async fn get_json(&self, url: reqwest::Url) -> Result<Value> {
        let response = self.client.get(url.clone()).send().await?;
        anyhow::ensure!(
            response.status().is_success(),
            "{url} returned HTTP {}",
            response.status()
        );
        Ok(response.json().await?)
    }

    async fn lookup_ip_place(&self, url: &str) -> Option<IpPlace> {
        let result = async {
            let url = reqwest::Url::parse(url)?;
            let value = self.get_json(url).await?;
            Ok::<_, anyhow::Error>(parse_ip_place(&value))
        }
        .await;

        match result {
            Ok(place) => place,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "IP lookup failed");
                None
            }
        }
    }
}

impl Geolocator for HttpGeolocator {
    async fn reverse_geocode(&self, at: Coordinates) -> Option<String> {
        let result = async {
            let url = reqwest::Url::parse_with_params(
                &self.reverse_geocode_url,
                &[
                    ("format", "jsonv2".to_string()),
                    ("lat", at.latitude.to_string()),
                    ("lon", at.longitude.to_string()),
                ],
            )?;
            let value = self.get_json(url).await?;
            Ok::<_, anyhow::Error>(parse_display_name(&value))
        }
        .await;

        match result {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(error = %e, "reverse geocoding failed");
                None
            }
        }
    }

    async fn ip_place(&self) -> Option<IpPlace> {
        self.lookup_ip_place(&self.ip_lookup_url).await
    }

    async fn context_place(&self) -> Option<IpPlace> {
        self.lookup_ip_place(&self.ip_context_url).await
    }
}

/// `display_name` from a reverse-geocoding response.
pub fn parse_display_name(value: &Value) -> Option<String> {
    value
        .get("display_name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `city`/`region` from an IP lookup response. A missing city means no place.
pub fn parse_ip_place(value: &Value) -> Option<IpPlace> {
    let place: IpPlace = serde_json::from_value(value.clone()).ok()?;
    if place.city.is_empty() {
        None
    } else {
        Some(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_is_extracted() {
        let value = json!({"place_id": 1, "display_name": "10 Downing Street, London"});
        assert_eq!(
            parse_display_name(&value).as_deref(),
            Some("10 Downing Street, London")
        );
        assert!(parse_display_name(&json!({"error": "Unable to geocode"})).is_none());
    }

    #[test]
    fn ip_place_requires_a_city() {
        let place = parse_ip_place(&json!({"ip": "1.2.3.4", "city": "Austin", "region": "Texas"}))
            .unwrap();
        assert_eq!(place.to_string(), "Austin, Texas");

        assert!(parse_ip_place(&json!({"city": "", "region": "Texas"})).is_none());
        assert!(parse_ip_place(&json!({"error": true, "reason": "RateLimited"})).is_none());
    }

    #[test]
    fn ip_place_without_region_shows_city_only() {
        let place = parse_ip_place(&json!({"city": "Reykjavik", "region": null})).unwrap();
        assert_eq!(place.to_string(), "Reykjavik");
    }
}
