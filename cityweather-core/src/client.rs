//! The lookup pipeline: validate, geocode, current conditions, forecast, icons.

use std::{future::Future, sync::Arc};

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::{
    Config,
    error::LookupError,
    model::{
        CityQuery, CurrentConditions, ForecastEntry, Icon, IconStatus, ResolvedLocation,
        WeatherSnapshot, day_label,
    },
    provider::{ProviderReply, WeatherProvider, provider_from_config},
};

/// At most this many forecast days are kept, day 0 being today.
pub const FORECAST_DAYS: usize = 7;

#[derive(Debug)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(provider_from_config(config)?.into()))
    }

    pub async fn lookup(&self, city: &str) -> Result<WeatherSnapshot, LookupError> {
        self.lookup_with_cancel(city, &CancellationToken::new()).await
    }

    /// Same as [`lookup`](Self::lookup), but gives up with [`LookupError::Cancelled`]
    /// as soon as `cancel` is tripped. Checked before and during every stage.
    pub async fn lookup_with_cancel(
        &self,
        city: &str,
        cancel: &CancellationToken,
    ) -> Result<WeatherSnapshot, LookupError> {
        let query = CityQuery::parse(city)?;

        let location = guarded(cancel, self.resolve(&query)).await??;
        tracing::info!(query = %query, id = %location.id, name = %location.name, "resolved city");

        let current = guarded(cancel, self.current(&location)).await??;

        let (days, forecast_error) = match guarded(cancel, self.provider.forecast(&location.id)).await? {
            Ok(ProviderReply::Success(mut days)) => {
                days.truncate(FORECAST_DAYS);
                (days, None)
            }
            Ok(ProviderReply::Status(code)) => {
                tracing::warn!(%code, "forecast unavailable, showing current conditions only");
                (Vec::new(), Some(format!("forecast request returned code {code}")))
            }
            Err(e) => {
                tracing::warn!("forecast unavailable, showing current conditions only: {e:#}");
                (Vec::new(), Some(format!("{e:#}")))
            }
        };

        let (current_icon, day_icons) = guarded(cancel, async {
            tokio::join!(
                self.icon(&current.icon_code),
                join_all(days.iter().map(|d| self.icon(&d.icon_code)))
            )
        })
        .await?;

        let forecast = days
            .into_iter()
            .zip(day_icons)
            .enumerate()
            .map(|(i, (day, icon))| ForecastEntry { label: day_label(i, day.date), day, icon })
            .collect();

        Ok(WeatherSnapshot { location, current, current_icon, forecast, forecast_error })
    }

    async fn resolve(&self, query: &CityQuery) -> Result<ResolvedLocation, LookupError> {
        match self.provider.geocode(query).await.map_err(LookupError::upstream)? {
            ProviderReply::Success(candidates) => candidates
                .into_iter()
                .next()
                .ok_or_else(|| LookupError::CityNotFound(query.to_string())),
            ProviderReply::Status(code) => {
                tracing::debug!(%code, query = %query, "geocoder returned no match");
                Err(LookupError::CityNotFound(query.to_string()))
            }
        }
    }

    async fn current(&self, location: &ResolvedLocation) -> Result<CurrentConditions, LookupError> {
        match self.provider.current(&location.id).await.map_err(LookupError::upstream)? {
            ProviderReply::Success(current) => Ok(current),
            ProviderReply::Status(code) => Err(LookupError::Upstream(format!(
                "current weather request returned code {code}"
            ))),
        }
    }

    async fn icon(&self, code: &str) -> IconStatus {
        let reason = match self.provider.icon(code).await {
            Ok(Some(bytes)) => match Icon::decode(code, bytes) {
                Ok(icon) => return IconStatus::Available(icon),
                Err(e) => format!("icon could not be decoded: {e}"),
            },
            Ok(None) => "icon not found".to_string(),
            Err(e) => format!("{e:#}"),
        };
        tracing::debug!(code, %reason, "icon unavailable");
        IconStatus::Unavailable { code: code.to_string(), reason }
    }
}

async fn guarded<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, LookupError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LookupError::Cancelled),
        out = fut => Ok(out),
    }
}
