use crate::{
    Config, Kelvin, ProviderError,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// A source of current temperature readings for a location.
///
/// Implementations own their request construction, decoding and unit
/// conversion; the aggregator only sees a `Kelvin` or a `ProviderError`.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    async fn temperature(&self, location: &str) -> Result<Kelvin, ProviderError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn TemperatureProvider>> {
    let provider_cfg = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
        )
    })?;

    let api_key = provider_cfg.api_key.clone();
    let base_url = provider_cfg.base_url.clone();

    let provider: Arc<dyn TemperatureProvider> = match id {
        ProviderId::OpenWeather => Arc::new(OpenWeatherProvider::new(api_key, base_url)),
        ProviderId::WeatherApi => Arc::new(WeatherApiProvider::new(api_key, base_url)),
    };

    Ok(provider)
}

/// Construct every provider that has credentials in `config`, in `ProviderId::all()` order.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Arc<dyn TemperatureProvider>>> {
    let ids = config.configured_providers();
    if ids.is_empty() {
        return Err(anyhow::anyhow!(
            "No providers configured.\n\
             Hint: run `weather configure <provider>` (e.g. `weather configure openweather`) first."
        ));
    }

    ids.into_iter()
        .map(|id| provider_from_config(id, config))
        .collect()
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
