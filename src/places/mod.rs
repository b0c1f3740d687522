//! Restaurant search client.
//!
//! Thin wrapper over a Geoapify-style places API: given a coordinate and
//! a radius, return nearby restaurant rows (name + address). This is the
//! only outbound HTTP call in the service.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::db::CandidateSeed;

/// Place categories requested from the search API
const CATEGORIES: &str = "catering.restaurant,catering.fast_food";

/// Places API client
pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
    formatted: Option<String>,
}

impl PlacesClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Fetch up to `limit` restaurants within `radius_m` meters of the
    /// given coordinate, nearest first.
    pub async fn nearby_restaurants(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
        limit: i64,
    ) -> Result<Vec<CandidateSeed>> {
        let url = format!(
            "{}?categories={}&filter=circle:{lon},{lat},{radius}&bias=proximity:{lon},{lat}&limit={limit}&apiKey={key}",
            self.base_url,
            CATEGORIES,
            lon = longitude,
            lat = latitude,
            radius = radius_m,
            limit = limit,
            key = self.api_key,
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "platematch")
            .send()
            .await
            .context("Failed to reach places API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Places API error: {} - {}", status, body);
        }

        let parsed: PlacesResponse = response
            .json()
            .await
            .context("Failed to parse places API response")?;

        Ok(parsed
            .features
            .into_iter()
            .map(|f| CandidateSeed {
                name: f
                    .properties
                    .name
                    .unwrap_or_else(|| "Unnamed place".to_string()),
                address: f.properties.formatted.unwrap_or_default(),
                photo_url: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_mapping_fills_fallbacks() {
        let raw = serde_json::json!({
            "features": [
                { "properties": { "name": "Luigi's", "formatted": "12 Canal St" } },
                { "properties": { "formatted": "99 Side Al" } },
                { "properties": {} }
            ]
        });

        let parsed: PlacesResponse = serde_json::from_value(raw).unwrap();
        let seeds: Vec<CandidateSeed> = parsed
            .features
            .into_iter()
            .map(|f| CandidateSeed {
                name: f
                    .properties
                    .name
                    .unwrap_or_else(|| "Unnamed place".to_string()),
                address: f.properties.formatted.unwrap_or_default(),
                photo_url: None,
            })
            .collect();

        assert_eq!(seeds[0].name, "Luigi's");
        assert_eq!(seeds[1].name, "Unnamed place");
        assert_eq!(seeds[1].address, "99 Side Al");
        assert_eq!(seeds[2].address, "");
    }

    #[test]
    fn test_empty_body_is_zero_features() {
        let parsed: PlacesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.features.is_empty());
    }
}
