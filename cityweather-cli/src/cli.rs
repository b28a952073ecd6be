use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use cityweather_core::{Config, HistoryStore, WeatherApp, WeatherClient};
use inquire::{Password, PasswordDisplayMode, Select};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather and 7-day forecast by city name")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the QWeather API key in the config file.
    Configure {
        /// Key to store; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,

        /// Response language, e.g. "en" or "zh".
        #[arg(long)]
        lang: Option<String>,
    },

    /// Show current conditions and the 7-day forecast for a city.
    Show {
        /// City name; several words are joined with spaces.
        #[arg(required = true)]
        city: Vec<String>,

        /// Print the result as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List recently searched cities.
    History {
        /// Forget all recent cities.
        #[arg(long)]
        clear: bool,
    },

    /// Choose a recent city interactively and show its weather.
    Pick,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { api_key, lang } => configure(api_key, lang),
            Command::Show { city, json } => show(&city.join(" "), json).await,
            Command::History { clear } => history(clear),
            Command::Pick => pick().await,
        }
    }
}

fn configure(api_key: Option<String>, lang: Option<String>) -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    // Read the file alone so environment overrides are not written back.
    let mut config = Config::load_file(&path)?;

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("QWeather API key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read API key")?,
    };
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    config.set_api_key(api_key.to_string());
    if lang.is_some() {
        config.lang = lang;
    }
    config.save_file(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn open_app() -> anyhow::Result<WeatherApp> {
    let config = Config::load()?;
    let client = WeatherClient::from_config(&config)?;
    let store = HistoryStore::from_config(&config)?;
    Ok(WeatherApp::new(client, store))
}

async fn show(city: &str, json: bool) -> anyhow::Result<()> {
    let app = open_app()?;
    let result = app.search(city).await;

    if let Err(e) = app.shutdown().await {
        tracing::warn!("search history not saved: {e}");
    }

    let snapshot = result.map_err(|e| anyhow!(e.user_message()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render::state(&app.state().await));
    }
    Ok(())
}

fn history(clear: bool) -> anyhow::Result<()> {
    let store = HistoryStore::from_config(&Config::load()?)?;

    if clear {
        store.save(&Default::default())?;
        println!("Search history cleared.");
        return Ok(());
    }

    print!("{}", render::history(&store.load()));
    Ok(())
}

async fn pick() -> anyhow::Result<()> {
    let config = Config::load()?;
    let names: Vec<String> = HistoryStore::from_config(&config)?.load().into();

    if names.is_empty() {
        println!("No search history yet. Try `cityweather show <city>` first.");
        return Ok(());
    }

    let city = Select::new("Recent cities:", names).prompt().context("No city selected")?;
    show(&city, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_joins_city_words() {
        let cli = Cli::try_parse_from(["cityweather", "show", "New", "York", "--json"]).unwrap();
        match cli.command {
            Command::Show { city, json } => {
                assert_eq!(city.join(" "), "New York");
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_requires_a_city() {
        assert!(Cli::try_parse_from(["cityweather", "show"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["cityweather", "history", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
