use std::fmt;

use anyhow::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Current conditions for `city` in metric units.
    #[instrument(name = "fetch_weather", skip(self))]
    pub async fn fetch(&self, city: &str) -> Result<WeatherSnapshot, Error> {
        let res: CurrentWeather = self
            .client
            .get(&self.endpoint)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let snapshot = WeatherSnapshot::from(res);
        debug!(city = ?snapshot.city, temperature = ?snapshot.temperature, "weather decoded");
        Ok(snapshot)
    }
}

/// Flat view of the current conditions. Every field is optional so that a
/// failed fetch (`Default`) or a partial response still renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub city: Option<String>,
    /// °C
    pub temperature: Option<f64>,
    /// °C
    pub min_temp: Option<f64>,
    /// °C
    pub feels_like: Option<f64>,
    /// percent
    pub humidity: Option<i64>,
    pub weather_condition: Option<String>,
    /// m/s
    pub wind_speed: Option<f64>,
    /// meters
    pub visibility: Option<i64>,
}

impl WeatherSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Renders a snapshot field, `N/A` when absent.
pub struct Field<'a, T>(pub &'a Option<T>);

impl<T: fmt::Display> fmt::Display for Field<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("N/A"),
        }
    }
}

//
// Match OpenWeatherMap current weather JSON
// https://openweathermap.org/current
//
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: Option<String>,
    #[serde(default)]
    main: Option<Main>,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Option<Wind>,
    visibility: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
struct Main {
    temp: Option<f64>,
    temp_min: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

impl From<CurrentWeather> for WeatherSnapshot {
    fn from(res: CurrentWeather) -> Self {
        let main = res.main.unwrap_or_default();

        Self {
            city: res.name,
            temperature: main.temp,
            min_temp: main.temp_min,
            feels_like: main.feels_like,
            humidity: main.humidity,
            weather_condition: res.weather.into_iter().next().and_then(|c| c.description),
            wind_speed: res.wind.and_then(|w| w.speed),
            visibility: res.visibility,
        }
    }
}
