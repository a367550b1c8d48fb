use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::ProviderError, model::Kelvin, provider::truncate_body};

use super::TemperatureProvider;

const NAME: &str = "openweather";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http: Client::new(),
        }
    }

    async fn fetch_current(&self, city: &str) -> Result<String, ProviderError> {
        let url = format!("{}/weather", self.base_url.trim_end_matches('/'));

        // `standard` units report Kelvin directly.
        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "standard"),
            ])
            .send()
            .await
            .map_err(|e| {
                ProviderError::io_with_source(NAME, "failed to send current weather request", e)
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ProviderError::io_with_source(NAME, "failed to read current weather response body", e)
        })?;

        if !status.is_success() {
            return Err(ProviderError::io(
                NAME,
                format!(
                    "current weather request failed with status {}: {}",
                    status,
                    truncate_body(&body)
                ),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
}

fn parse_current(body: &str) -> Result<Kelvin, ProviderError> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::decode(NAME, e))?;

    parsed
        .main
        .and_then(|m| m.temp)
        .map(Kelvin)
        .ok_or_else(|| ProviderError::data(NAME, "response contained no `main.temp` value"))
}

#[async_trait]
impl TemperatureProvider for OpenWeatherProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn temperature(&self, location: &str) -> Result<Kelvin, ProviderError> {
        let body = self.fetch_current(location).await?;
        let kelvin = parse_current(&body)?;

        debug!(provider = NAME, location, kelvin = kelvin.value(), "reading");
        Ok(kelvin)
    }
}
