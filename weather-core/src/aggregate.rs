//! Concurrent fan-out over a set of temperature providers.
//!
//! [`MultiProvider`] queries every provider on its own tokio task and folds
//! the outcomes as they complete. With the default [`AggregationPolicy::FailFast`]
//! the first failure ends the call and the remaining tasks are aborted;
//! [`AggregationPolicy::BestEffort`] averages whatever succeeded instead.

use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    AggregationConfig, Config, TemperatureProvider, combine,
    error::{AggregateError, ProviderError},
    model::Kelvin,
    provider::{ProviderId, provider_from_config, providers_from_config},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Return the first provider error without waiting for the others.
    #[default]
    FailFast,
    /// Wait for every provider and average the successes; fail only if none succeeded.
    BestEffort,
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggregationPolicy::FailFast => "fail_fast",
            AggregationPolicy::BestEffort => "best_effort",
        })
    }
}

#[derive(Debug, Clone)]
pub struct MultiProvider {
    providers: Vec<Arc<dyn TemperatureProvider>>,
    policy: AggregationPolicy,
    timeout: Option<Duration>,
}

impl MultiProvider {
    pub fn new(providers: Vec<Arc<dyn TemperatureProvider>>) -> Self {
        Self {
            providers,
            policy: AggregationPolicy::default(),
            timeout: None,
        }
    }

    /// Build from every configured provider, applying the `[aggregation]` settings.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(providers_from_config(config)?).with_aggregation(&config.aggregation))
    }

    /// Build from the given providers only; each must be configured.
    pub fn from_config_selected(config: &Config, ids: &[ProviderId]) -> anyhow::Result<Self> {
        let providers = ids
            .iter()
            .map(|id| provider_from_config(*id, config))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::new(providers).with_aggregation(&config.aggregation))
    }

    fn with_aggregation(mut self, aggregation: &AggregationConfig) -> Self {
        self.policy = aggregation.policy;
        self.timeout = aggregation.timeout();
        self
    }

    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound each provider call; a provider that exceeds it fails with `ProviderError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Mean temperature for `location` across all providers.
    #[instrument(skip(self), fields(providers = self.providers.len(), policy = %self.policy))]
    pub async fn temperature(&self, location: &str) -> Result<Kelvin, AggregateError> {
        if self.providers.is_empty() {
            return Err(AggregateError::NoProviders);
        }

        let mut tasks = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let location = location.to_owned();
            let timeout = self.timeout;
            tasks.spawn(async move { query(provider.as_ref(), &location, timeout).await });
        }
        debug!("dispatched provider queries");

        let mut readings = Vec::with_capacity(self.providers.len());
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    tasks.abort_all();
                    return Err(AggregateError::Task(err));
                }
            };

            match outcome {
                Ok(kelvin) => readings.push(kelvin),
                Err(err) => match self.policy {
                    AggregationPolicy::FailFast => {
                        warn!(
                            provider = err.provider(),
                            kind = %err.kind(),
                            error = %err,
                            "provider failed, aborting remaining queries"
                        );
                        tasks.abort_all();
                        return Err(err.into());
                    }
                    AggregationPolicy::BestEffort => {
                        warn!(
                            provider = err.provider(),
                            kind = %err.kind(),
                            error = %err,
                            "provider failed"
                        );
                        first_error.get_or_insert(err);
                    }
                },
            }
        }

        match combine::mean(&readings) {
            Some(mean) => {
                debug!(
                    succeeded = readings.len(),
                    kelvin = mean.value(),
                    "combined provider readings"
                );
                Ok(mean)
            }
            None => Err(first_error.map_or(AggregateError::NoProviders, AggregateError::from)),
        }
    }

    /// Like [`MultiProvider::temperature`], but gives up with `AggregateError::Cancelled`
    /// as soon as `cancel` fires. In-flight provider tasks are aborted either way.
    pub async fn temperature_with_cancel(
        &self,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<Kelvin, AggregateError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(location, "aggregation cancelled");
                Err(AggregateError::Cancelled)
            }
            result = self.temperature(location) => result,
        }
    }
}

async fn query(
    provider: &dyn TemperatureProvider,
    location: &str,
    timeout: Option<Duration>,
) -> Result<Kelvin, ProviderError> {
    match timeout {
        None => provider.temperature(location).await,
        Some(after) => tokio::time::timeout(after, provider.temperature(location))
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout {
                    provider: provider.name().to_string(),
                    after,
                })
            }),
    }
}
