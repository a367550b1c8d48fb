use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::ProviderError, model::Kelvin, provider::truncate_body};

use super::TemperatureProvider;

const NAME: &str = "weatherapi";
const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http: Client::new(),
        }
    }

    async fn fetch_current(&self, city: &str) -> Result<String, ProviderError> {
        let url = format!("{}/current.json", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .send()
            .await
            .map_err(|e| ProviderError::io_with_source(NAME, "failed to send current request", e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ProviderError::io_with_source(NAME, "failed to read current response body", e)
        })?;

        if !status.is_success() {
            return Err(ProviderError::io(
                NAME,
                format!("current request failed with status {}: {}", status, truncate_body(&body)),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: Option<WaCurrent>,
}

fn parse_current(body: &str) -> Result<Kelvin, ProviderError> {
    let parsed: WaResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::decode(NAME, e))?;

    parsed
        .current
        .and_then(|c| c.temp_c)
        .map(Kelvin::from_celsius)
        .ok_or_else(|| ProviderError::data(NAME, "response contained no `current.temp_c` value"))
}

#[async_trait]
impl TemperatureProvider for WeatherApiProvider {
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
