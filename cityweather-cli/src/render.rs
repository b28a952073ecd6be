//! Plain-text presentation of the app state.

use std::fmt::Write;

use cityweather_core::{AppState, HistoryList, IconStatus, WeatherSnapshot, model::short_date};

/// Width of the min/max temperature track, in characters.
const BAR_WIDTH: u32 = 24;
const BAR_CHAR: char = '━';

pub fn state(state: &AppState) -> String {
    let mut out = String::new();
    match (&state.snapshot, &state.last_error) {
        (Some(snapshot), _) => out.push_str(&snapshot_text(snapshot)),
        (None, Some(err)) => {
            let _ = writeln!(out, "{err}");
        }
        (None, None) => {}
    }

    if !state.history.is_empty() {
        let recent: Vec<&str> = state.history.iter().rev().collect();
        let _ = writeln!(out, "\nRecent: {}", recent.join(", "));
    }
    out
}

pub fn snapshot_text(snapshot: &WeatherSnapshot) -> String {
    let mut out = String::new();
    let c = &snapshot.current;

    let _ = writeln!(out, "{}", snapshot.location.display_label());
    let _ = writeln!(
        out,
        "  {} {}°C  {}",
        icon_marker(&snapshot.current_icon),
        c.temperature_c,
        c.description
    );
    let _ = writeln!(out, "  Humidity:   {}%", c.humidity_pct);
    let _ = writeln!(out, "  Wind:       {} km/h (scale {})", c.wind_speed_kmh, c.wind_scale);
    let _ = writeln!(out, "  Pressure:   {} hPa", c.pressure_hpa);
    let _ = writeln!(out, "  Visibility: {} km", c.visibility_km);

    let Some(scale) = snapshot.temperature_scale() else {
        let reason = snapshot.forecast_error.as_deref().unwrap_or("no data");
        let _ = writeln!(out, "\n7-day forecast unavailable ({reason})");
        return out;
    };

    let _ = writeln!(out, "\n7-day forecast");
    for entry in &snapshot.forecast {
        let bar = scale.bar(&entry.day, BAR_WIDTH);
        let track: String = std::iter::repeat_n(' ', bar.offset as usize)
            .chain(std::iter::repeat_n(BAR_CHAR, bar.length as usize))
            .collect();
        let _ = writeln!(
            out,
            "  {:<5} {:>5}  {}  {:>4} {:<width$} {}",
            entry.label,
            short_date(entry.day.date),
            icon_marker(&entry.icon),
            format!("{}°", entry.day.temp_max_c),
            track,
            format!("{}°", entry.day.temp_min_c),
            width = BAR_WIDTH as usize,
        );
    }
    out
}

pub fn history(list: &HistoryList) -> String {
    if list.is_empty() {
        return "No search history yet.\n".to_string();
    }
    list.iter().enumerate().fold(String::new(), |mut out, (i, name)| {
        let _ = writeln!(out, "{:>2}. {name}", i + 1);
        out
    })
}

fn icon_marker(icon: &IconStatus) -> String {
    match icon {
        IconStatus::Available(icon) => format!("[{:>3}]", icon.code),
        IconStatus::Unavailable { .. } => "[ ? ]".to_string(),
    }
}
