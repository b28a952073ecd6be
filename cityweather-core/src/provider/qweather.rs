use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::{Endpoints, Timeouts},
    model::{CityQuery, CurrentConditions, ForecastDay, ResolvedLocation},
    provider::{ProviderReply, truncate_body},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct QWeatherProvider {
    api_key: String,
    lang: Option<String>,
    endpoints: Endpoints,
    http: Client,
    icon_http: Client,
}

impl QWeatherProvider {
    pub fn new(
        api_key: String,
        endpoints: Endpoints,
        timeouts: Timeouts,
        lang: Option<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeouts.data())
            .build()
            .context("Failed to build HTTP client")?;
        let icon_http = Client::builder()
            .timeout(timeouts.icon())
            .build()
            .context("Failed to build icon HTTP client")?;

        Ok(Self { api_key, lang, endpoints, http, icon_http })
    }

    /// GET `url` with the location + key (+ lang) query and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, location: &str, what: &str) -> Result<T> {
        let mut query = vec![("location", location), ("key", self.api_key.as_str())];
        if let Some(lang) = self.lang.as_deref() {
            query.push(("lang", lang));
        }

        tracing::debug!(%url, location, "requesting {what}");

        let res = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "{what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct QwLocation {
    id: String,
    name: String,
    adm1: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QwGeoResponse {
    code: String,
    #[serde(default)]
    location: Vec<QwLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QwNow {
    temp: String,
    humidity: String,
    text: String,
    wind_speed: String,
    wind_scale: String,
    pressure: String,
    vis: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct QwNowResponse {
    code: String,
    now: Option<QwNow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QwDaily {
    fx_date: String,
    temp_min: String,
    temp_max: String,
    icon_day: String,
}

#[derive(Debug, Deserialize)]
struct QwDailyResponse {
    code: String,
    #[serde(default)]
    daily: Vec<QwDaily>,
}

impl From<QwLocation> for ResolvedLocation {
    fn from(loc: QwLocation) -> Self {
        Self { id: loc.id, name: loc.name, adm1: loc.adm1, country: loc.country }
    }
}

impl TryFrom<QwNow> for CurrentConditions {
    type Error = anyhow::Error;

    fn try_from(now: QwNow) -> Result<Self> {
        Ok(Self {
            temperature_c: number("temp", &now.temp)?,
            humidity_pct: number("humidity", &now.humidity)?,
            description: now.text,
            wind_speed_kmh: number("windSpeed", &now.wind_speed)?,
            wind_scale: wind_scale(&now.wind_scale)?,
            pressure_hpa: number("pressure", &now.pressure)?,
            visibility_km: number("vis", &now.vis)?,
            icon_code: now.icon,
        })
    }
}

impl TryFrom<QwDaily> for ForecastDay {
    type Error = anyhow::Error;

    fn try_from(day: QwDaily) -> Result<Self> {
        Ok(Self {
            date: NaiveDate::parse_from_str(&day.fx_date, "%Y-%m-%d")
                .with_context(|| format!("Invalid fxDate '{}'", day.fx_date))?,
            temp_min_c: number("tempMin", &day.temp_min)?,
            temp_max_c: number("tempMax", &day.temp_max)?,
            icon_code: day.icon_day,
        })
    }
}

#[async_trait]
impl WeatherProvider for QWeatherProvider {
    async fn geocode(&self, query: &CityQuery) -> Result<ProviderReply<Vec<ResolvedLocation>>> {
        let url = format!("{}/v2/city/lookup", self.endpoints.geo_base);
        let parsed: QwGeoResponse = self.get_json(&url, query.as_str(), "geocoding").await?;

        ProviderReply::from_code(parsed.code, || {
            Ok(parsed.location.into_iter().map(ResolvedLocation::from).collect())
        })
    }

    async fn current(&self, location_id: &str) -> Result<ProviderReply<CurrentConditions>> {
        let url = format!("{}/v7/weather/now", self.endpoints.api_base);
        let parsed: QwNowResponse = self.get_json(&url, location_id, "current weather").await?;

        ProviderReply::from_code(parsed.code, || {
            let now = parsed.now.ok_or_else(|| anyhow!("current weather response has no 'now' section"))?;
            CurrentConditions::try_from(now)
        })
    }

    async fn forecast(&self, location_id: &str) -> Result<ProviderReply<Vec<ForecastDay>>> {
        let url = format!("{}/v7/weather/7d", self.endpoints.api_base);
        let parsed: QwDailyResponse = self.get_json(&url, location_id, "7-day forecast").await?;

        ProviderReply::from_code(parsed.code, || {
            parsed.daily.into_iter().map(ForecastDay::try_from).collect()
        })
    }

    async fn icon(&self, code: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/{}.png", self.endpoints.icon_base, code);

        let res = self
            .icon_http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch icon {code}"))?;

        if !res.status().is_success() {
            tracing::debug!(%url, status = %res.status(), "icon not available");
            return Ok(None);
        }

        let bytes = res.bytes().await.with_context(|| format!("Failed to read icon {code}"))?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Numeric fields arrive as strings, e.g. `"temp": "24"`.
fn number(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Field '{field}' is not a number: '{value}'"))
}

/// Wind scale is sometimes a range such as "3-4"; the lower bound is kept.
fn wind_scale(value: &str) -> Result<f64> {
    let lower = value.split('-').next().unwrap_or(value);
    number("windScale", lower)
}
