use crate::{
    Config,
    model::{CityQuery, CurrentConditions, ForecastDay, ResolvedLocation},
    provider::qweather::QWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
pub(crate) mod fake;
pub mod qweather;

/// Status code the weather service uses for a successful reply.
pub const SUCCESS_CODE: &str = "200";

/// A reply that made it over the wire and parsed. The service reports its own
/// failures through a `code` field rather than the HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply<T> {
    Success(T),
    Status(String),
}

impl<T> ProviderReply<T> {
    pub fn from_code(code: String, payload: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<Self> {
        if code == SUCCESS_CODE { payload().map(ProviderReply::Success) } else { Ok(ProviderReply::Status(code)) }
    }
}

/// The remote calls a lookup is built from. `Err` means transport, HTTP or
/// parse failure; a well-formed non-success reply is `Ok(ProviderReply::Status)`.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn geocode(&self, query: &CityQuery) -> anyhow::Result<ProviderReply<Vec<ResolvedLocation>>>;

    async fn current(&self, location_id: &str) -> anyhow::Result<ProviderReply<CurrentConditions>>;

    async fn forecast(&self, location_id: &str) -> anyhow::Result<ProviderReply<Vec<ForecastDay>>>;

    /// Raw image bytes, or `None` when the service has no icon for `code`.
    async fn icon(&self, code: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Construct the configured provider.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    let provider = QWeatherProvider::new(
        api_key.to_owned(),
        config.endpoints.clone(),
        config.timeouts,
        config.lang.clone(),
    )?;
    Ok(Box::new(provider))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
