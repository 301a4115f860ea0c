use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use lettre::message::Mailbox;

#[derive(Clone, Debug)]
pub struct Config {
    pub market_url: String,
    pub webdriver_url: String,
    pub browser_headless: bool,
    pub market_wait: Duration,
    pub market_data_path: PathBuf,
    pub chart_path: PathBuf,

    pub weather_url: String,
    pub weather_api_key: String,
    pub city: String,

    pub quotes_url: String,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub sender: Mailbox,
    pub recipient: Mailbox,
    pub subject: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(lookup);

        let smtp_username = env.required("SMTP_USERNAME")?;

        Ok(Self {
            market_url: env.or("MARKET_URL", "https://www.nepalstock.com/today-price"),
            webdriver_url: env.or("WEBDRIVER_URL", "http://localhost:4444"),
            browser_headless: env.parse_or("BROWSER_HEADLESS", true)?,
            market_wait: Duration::from_secs(env.parse_or("MARKET_WAIT_SECS", 10)?),
            market_data_path: env.or("MARKET_DATA_PATH", "nepse_data.csv").into(),
            chart_path: env.or("CHART_PATH", "nepse_chart.png").into(),

            weather_url: env.or(
                "WEATHER_URL",
                "https://api.openweathermap.org/data/2.5/weather",
            ),
            weather_api_key: env.required("WEATHER_API_KEY")?,
            city: env.or("WEATHER_CITY", "Kathmandu"),

            quotes_url: env.or("QUOTES_URL", "https://zenquotes.io/api/quotes"),

            smtp_host: env.or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env.parse_or("SMTP_PORT", 587)?,
            smtp_password: env.required("SMTP_PASSWORD")?,
            sender: env.mailbox("REPORT_SENDER", Some(&smtp_username))?,
            smtp_username,
            recipient: env.mailbox("REPORT_RECIPIENT", None)?,
            subject: env.or("REPORT_SUBJECT", "Your Daily Inspiration & Nepse Report"),
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key).with_context(|| format!("{key} not set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Address from `key`, or from `fallback` when unset and one is given.
    fn mailbox(&self, key: &str, fallback: Option<&str>) -> Result<Mailbox> {
        let raw = match (self.get(key), fallback) {
            (Some(raw), _) => raw,
            (None, Some(fallback)) => fallback.to_string(),
            (None, None) => self.required(key)?,
        };

        raw.trim()
            .parse()
            .with_context(|| format!("{key} has invalid address {raw:?}"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{key} has invalid value {raw:?}")),
            None => Ok(default),
        }
    }
}
