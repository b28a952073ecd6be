//! In-memory provider used by the client and app tests.

use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::model::{CityQuery, CurrentConditions, ForecastDay, ResolvedLocation};

use super::{ProviderReply, WeatherProvider};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Mode {
    #[default]
    Ok,
    /// Well-formed reply with a non-success code.
    Rejected,
    /// Transport or parse failure.
    Broken,
    /// Success with nothing in it (no candidates, no icon).
    Empty,
    /// Icon only: bytes that are not a PNG.
    Garbage,
}

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    pub geocode: Mode,
    pub current: Mode,
    pub forecast: Mode,
    pub icon: Mode,
    /// Geocoding this city notifies and then never completes.
    pub hang_on: Option<(String, Arc<Notify>)>,
    /// Tripped right after geocoding returns.
    pub cancel_after_geocode: Option<CancellationToken>,
    pub calls: Calls,
}

#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub geocode: AtomicUsize,
    pub current: AtomicUsize,
    pub forecast: AtomicUsize,
    pub icon: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        [&self.geocode, &self.current, &self.forecast, &self.icon]
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }
}

pub(crate) fn sample_current() -> CurrentConditions {
    CurrentConditions {
        temperature_c: 24.0,
        humidity_pct: 40.0,
        description: "Sunny".into(),
        wind_speed_kmh: 12.0,
        wind_scale: 2.0,
        pressure_hpa: 1012.0,
        visibility_km: 25.0,
        icon_code: "100".into(),
    }
}

pub(crate) fn sample_forecast() -> Vec<ForecastDay> {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let mins = [10.0, 12.0, 8.0, 15.0, 9.0, 11.0, 13.0];
    let maxs = [20.0, 19.0, 18.0, 25.0, 17.0, 21.0, 22.0];
    (0..7)
        .map(|i| ForecastDay {
            date: start + Duration::days(i as i64),
            temp_min_c: mins[i],
            temp_max_c: maxs[i],
            icon_code: format!("10{i}"),
        })
        .collect()
}

pub(crate) fn tiny_png() -> Vec<u8> {
    let mut buf = Vec::new();
    image::RgbaImage::new(4, 2)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png");
    buf
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn geocode(&self, query: &CityQuery) -> Result<ProviderReply<Vec<ResolvedLocation>>> {
        self.calls.geocode.fetch_add(1, Ordering::SeqCst);

        if let Some((city, started)) = &self.hang_on {
            if city == query.as_str() {
                started.notify_one();
                std::future::pending::<()>().await;
            }
        }

        let reply = match self.geocode {
            Mode::Rejected => ProviderReply::Status("404".into()),
            Mode::Broken => return Err(anyhow!("geocoder unreachable")),
            Mode::Empty => ProviderReply::Success(Vec::new()),
            _ => ProviderReply::Success(vec![
                ResolvedLocation {
                    id: format!("id-{query}"),
                    name: query.to_string(),
                    adm1: None,
                    country: None,
                },
                ResolvedLocation {
                    id: "runner-up".into(),
                    name: format!("{query} County"),
                    adm1: None,
                    country: None,
                },
            ]),
        };

        if let Some(token) = &self.cancel_after_geocode {
            token.cancel();
        }
        Ok(reply)
    }

    async fn current(&self, _location_id: &str) -> Result<ProviderReply<CurrentConditions>> {
        self.calls.current.fetch_add(1, Ordering::SeqCst);
        match self.current {
            Mode::Rejected => Ok(ProviderReply::Status("500".into())),
            Mode::Broken => Err(anyhow!("Failed to parse current weather JSON")),
            _ => Ok(ProviderReply::Success(sample_current())),
        }
    }

    async fn forecast(&self, _location_id: &str) -> Result<ProviderReply<Vec<ForecastDay>>> {
        self.calls.forecast.fetch_add(1, Ordering::SeqCst);
        match self.forecast {
            Mode::Rejected => Ok(ProviderReply::Status("402".into())),
            Mode::Broken => Err(anyhow!("forecast request timed out")),
            Mode::Empty => Ok(ProviderReply::Success(Vec::new())),
            _ => Ok(ProviderReply::Success(sample_forecast())),
        }
    }

    async fn icon(&self, _code: &str) -> Result<Option<Vec<u8>>> {
        self.calls.icon.fetch_add(1, Ordering::SeqCst);
        match self.icon {
            Mode::Broken => Err(anyhow!("icon request timed out")),
            Mode::Empty | Mode::Rejected => Ok(None),
            Mode::Garbage => Ok(Some(b"<html>not an image</html>".to_vec())),
            Mode::Ok => Ok(Some(tiny_png())),
        }
    }
}
