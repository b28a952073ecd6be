use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// A user-entered city name, trimmed and known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery(String);

impl CityQuery {
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::InvalidInput);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CityQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// First geocoder candidate for a query. Lives for one lookup only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub id: String,
    pub name: String,
    pub adm1: Option<String>,
    pub country: Option<String>,
}

impl ResolvedLocation {
    /// "Name, Province, Country", skipping parts that are missing or repeat the name.
    pub fn display_label(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        for extra in [self.adm1.as_deref(), self.country.as_deref()].into_iter().flatten() {
            if !extra.is_empty() && !parts.contains(&extra) {
                parts.push(extra);
            }
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub description: String,
    pub wind_speed_kmh: f64,
    pub wind_scale: f64,
    pub pressure_hpa: f64,
    pub visibility_km: f64,
    pub icon_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub icon_code: String,
}

/// A decoded weather icon. Only its dimensions are inspected here; the raw
/// PNG bytes are handed through to whatever draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub code: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub png: Vec<u8>,
}

impl Icon {
    pub fn decode(code: &str, bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)?;
        Ok(Self { code: code.to_string(), width: img.width(), height: img.height(), png: bytes })
    }
}

/// Outcome of the best-effort icon side fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IconStatus {
    Available(Icon),
    Unavailable { code: String, reason: String },
}

impl IconStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, IconStatus::Available(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub day: ForecastDay,
    pub label: String,
    pub icon: IconStatus,
}

/// Everything a presentation layer needs to draw one successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: ResolvedLocation,
    pub current: CurrentConditions,
    pub current_icon: IconStatus,
    /// Empty when the forecast call failed; see `forecast_error`.
    pub forecast: Vec<ForecastEntry>,
    pub forecast_error: Option<String>,
}

impl WeatherSnapshot {
    pub fn temperature_scale(&self) -> Option<TemperatureScale> {
        TemperatureScale::from_days(self.forecast.iter().map(|e| &e.day))
    }
}

/// Shared scale for the per-day min/max temperature bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureScale {
    pub min: f64,
    pub max: f64,
}

/// Position of one day's bar, in cells from the left edge of the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureBar {
    pub offset: u32,
    pub length: u32,
}

impl TemperatureScale {
    /// Global minimum of the lows and global maximum of the highs. `None` for no days.
    pub fn from_days<'a>(days: impl IntoIterator<Item = &'a ForecastDay>) -> Option<Self> {
        days.into_iter().fold(None, |acc, day| {
            Some(match acc {
                None => Self { min: day.temp_min_c, max: day.temp_max_c },
                Some(s) => Self { min: s.min.min(day.temp_min_c), max: s.max.max(day.temp_max_c) },
            })
        })
    }

    /// `max - min`, or 1 when the range is degenerate.
    pub fn span(&self) -> f64 {
        if self.max == self.min { 1.0 } else { self.max - self.min }
    }

    pub fn bar(&self, day: &ForecastDay, width: u32) -> TemperatureBar {
        let start = self.cells(day.temp_min_c, width);
        let end = self.cells(day.temp_max_c, width);
        TemperatureBar { offset: start, length: end.saturating_sub(start) }
    }

    fn cells(&self, temp: f64, width: u32) -> u32 {
        let scaled = (temp - self.min) * f64::from(width) / self.span();
        scaled.clamp(0.0, f64::from(width)) as u32
    }
}

/// "today" for index 0, otherwise the short weekday name of `date`.
pub fn day_label(index: usize, date: NaiveDate) -> String {
    if index == 0 { "today".to_string() } else { date.weekday().to_string() }
}

/// Month/day without padding, e.g. "3/7".
pub fn short_date(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}
