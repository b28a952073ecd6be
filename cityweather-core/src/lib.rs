//! Core library for the `cityweather` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The lookup pipeline over the QWeather API (geocode, current, 7-day forecast, icons)
//! - The bounded, file-backed search history
//! - Shared domain models and the error taxonomy
//!
//! It is used by `cityweather-cli`, but has no opinion about how results are drawn.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;

pub use app::{AppState, WeatherApp};
pub use client::{FORECAST_DAYS, WeatherClient};
pub use config::Config;
pub use error::{ErrorKind, HistoryError, LookupError};
pub use history::{HISTORY_CAPACITY, HistoryList, HistoryStore};
pub use model::{
    CityQuery, CurrentConditions, ForecastDay, ForecastEntry, Icon, IconStatus, ResolvedLocation,
    TemperatureBar, TemperatureScale, WeatherSnapshot,
};
pub use provider::{ProviderReply, WeatherProvider, qweather::QWeatherProvider};
