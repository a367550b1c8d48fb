use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use weather_core::{AggregationPolicy, Config, MultiProvider, ProviderId, TemperatureReport};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather",
    version,
    about = "Average the current temperature across weather providers"
)]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show the combined temperature for a city.
    Show {
        /// City or location name, passed unchanged to every provider.
        city: String,

        /// Query only these providers (repeatable); defaults to every configured one.
        #[arg(long = "provider", value_name = "ID")]
        providers: Vec<String>,

        /// Average the providers that succeed instead of failing on the first error.
        #[arg(long)]
        best_effort: bool,

        /// Per-provider timeout in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;

                let api_key = inquire::Password::new(&format!("API key for {id}:"))
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.upsert_provider_api_key(id, api_key.trim().to_string());
                config.save_to(&config_path)?;

                println!("Saved credentials for {id} to {}", config_path.display());
            }
            Command::Show {
                city,
                providers,
                best_effort,
                timeout,
                json,
            } => {
                let multi = build_multi_provider(&config, &providers, best_effort, timeout)?;
                let report = temperature_report(&multi, city).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!(
                        "{}: {:.1} °C ({}) from {} provider(s), took {}",
                        report.city,
                        report.temp_c,
                        report.temp,
                        multi.len(),
                        report.took
                    );
                }
            }
        }

        Ok(())
    }
}

/// Aggregator from config, with command-line flags taking precedence over `[aggregation]`.
fn build_multi_provider(
    config: &Config,
    selected: &[String],
    best_effort: bool,
    timeout_secs: Option<u64>,
) -> anyhow::Result<MultiProvider> {
    let mut multi = if selected.is_empty() {
        MultiProvider::from_config(config)?
    } else {
        let ids = selected
            .iter()
            .map(|name| ProviderId::try_from(name.as_str()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        MultiProvider::from_config_selected(config, &ids)?
    };

    if best_effort {
        multi = multi.with_policy(AggregationPolicy::BestEffort);
    }
    if let Some(secs) = timeout_secs {
        multi = multi.with_timeout(Duration::from_secs(secs));
    }

    Ok(multi)
}

/// Runs the aggregation; any failure becomes one generic message, the cause goes to the log.
async fn temperature_report(
    multi: &MultiProvider,
    city: String,
) -> anyhow::Result<TemperatureReport> {
    let begin = Instant::now();

    match multi.temperature(&city).await {
        Ok(temp) => Ok(TemperatureReport::new(city, temp, begin.elapsed())),
        Err(err) => {
            tracing::error!(city = %city, error = %err, "temperature aggregation failed");
            bail!("Could not determine the temperature for '{city}'")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::CommandFactory;
    use std::sync::Arc;
    use weather_core::{Kelvin, ProviderError, TemperatureProvider};

    #[derive(Debug)]
    struct FixedProvider(Result<f64, &'static str>);

    #[async_trait]
    impl TemperatureProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn temperature(&self, _location: &str) -> Result<Kelvin, ProviderError> {
            match self.0 {
                Ok(k) => Ok(Kelvin(k)),
                Err(message) => Err(ProviderError::io("fixed", message)),
            }
        }
    }

    fn multi(outcomes: &[Result<f64, &'static str>]) -> MultiProvider {
        MultiProvider::new(
            outcomes
                .iter()
                .map(|o| Arc::new(FixedProvider(*o)) as Arc<dyn TemperatureProvider>)
                .collect(),
        )
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_options() {
        let cli = Cli::try_parse_from([
            "weather",
            "show",
            "Berlin",
            "--provider",
            "openweather",
            "--best-effort",
            "--timeout",
            "3",
            "--json",
        ])
        .expect("valid arguments");

        match cli.command {
            Command::Show {
                city,
                providers,
                best_effort,
                timeout,
                json,
            } => {
                assert_eq!(city, "Berlin");
                assert_eq!(providers, ["openweather"]);
                assert!(best_effort);
                assert_eq!(timeout, Some(3));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn selected_providers_must_be_configured() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        let err = build_multi_provider(&config, &["weatherapi".into()], false, None).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn unknown_selected_provider_is_rejected() {
        let config = Config::default();

        let err = build_multi_provider(&config, &["nope".into()], false, None).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::OpenWeather, "A".into());
        config.upsert_provider_api_key(ProviderId::WeatherApi, "B".into());
        config.aggregation.timeout_secs = Some(10);

        let multi = build_multi_provider(&config, &["openweather".into()], true, Some(2))
            .expect("configured provider");
        assert_eq!(multi.len(), 1);
        assert_eq!(multi.policy(), AggregationPolicy::BestEffort);
        assert_eq!(multi.timeout(), Some(Duration::from_secs(2)));

        let all = build_multi_provider(&config, &[], false, None).expect("configured providers");
        assert_eq!(all.len(), 2);
        assert_eq!(all.policy(), AggregationPolicy::FailFast);
        assert_eq!(all.timeout(), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn report_carries_combined_temperature() {
        let report = temperature_report(&multi(&[Ok(300.15), Ok(301.15)]), "Berlin".into())
            .await
            .expect("both providers succeed");

        assert_eq!(report.city, "Berlin");
        assert!((report.temp.value() - 300.65).abs() < 1e-9);
        assert!((report.temp_c - 27.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn aggregation_failure_is_reported_generically() {
        let err = temperature_report(
            &multi(&[Ok(300.15), Err("invalid API key 1234")]),
            "Berlin".into(),
        )
        .await
        .unwrap_err();

        let msg = format!("{err:#}");
        assert_eq!(msg, "Could not determine the temperature for 'Berlin'");
        assert!(!msg.contains("fixed"));
        assert!(!msg.contains("invalid API key"));
    }
}
