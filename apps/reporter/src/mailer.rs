use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use feeds::{Field, Quote, WeatherSnapshot};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;

/// Sends the composed report through `T`, SMTP over STARTTLS in production.
pub struct ReportMailer<T = AsyncSmtpTransport<Tokio1Executor>> {
    transport: T,
    relay: String,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl ReportMailer {
    pub fn smtp(config: &Config) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("invalid smtp relay {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self::with_transport(
            transport,
            format!("{}:{}", config.smtp_host, config.smtp_port),
            config,
        ))
    }
}

impl<T> ReportMailer<T>
where
    T: AsyncTransport + Sync,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn with_transport(transport: T, relay: impl Into<String>, config: &Config) -> Self {
        Self {
            transport,
            relay: relay.into(),
            from: config.sender.clone(),
            to: config.recipient.clone(),
            subject: config.subject.clone(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn compose(&self, body: String, chart_path: &Path) -> Result<Message> {
        compose_report(
            self.from.clone(),
            self.to.clone(),
            &self.subject,
            body,
            chart_path,
        )
    }

    #[instrument(name = "send_report", skip_all, fields(relay = %self.relay, to = %self.to))]
    pub async fn send(&self, message: Message) -> Result<()> {
        self.transport
            .send(message)
            .await
            .context("smtp submission failed")?;

        info!("email sent successfully");
        Ok(())
    }
}

/// Multipart message with the plain-text body and, when it can be read, the
/// chart as a binary attachment. An unreadable chart only drops the
/// attachment.
pub fn compose_report(
    from: Mailbox,
    to: Mailbox,
    subject: &str,
    body: String,
    chart_path: &Path,
) -> Result<Message> {
    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body));

    match std::fs::read(chart_path) {
        Ok(bytes) => {
            let filename = chart_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "chart.png".to_string());
            debug!(%filename, bytes = bytes.len(), "attaching chart");

            parts = parts.singlepart(
                Attachment::new(filename)
                    .body(bytes, ContentType::parse("application/octet-stream")?),
            );
        }
        Err(e) => {
            warn!(path = %chart_path.display(), error = %e, "error attaching chart, sending without it");
        }
    }

    Ok(Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(parts)?)
}

pub fn render_body(city: &str, date: NaiveDate, weather: &WeatherSnapshot, quote: &Quote) -> String {
    format!(
        "Hello, this is your daily inspiration and Nepse report for {date}.

Daily Inspiration:
----------------------
\"{text}\"
- {author}

Weather in {city}:
----------------------
City: {w_city}
Temperature: {temp}°C (Feels like {feels}°C)
Minimum Temperature: {min}°C
Humidity: {humidity}%
Weather Condition: {condition}
Wind Speed: {wind} m/s
Visibility: {visibility} meters

Stay inspired and have a great day!
",
        date = date.format("%A, %B %-d, %Y"),
        text = quote.text,
        author = quote.author,
        w_city = Field(&weather.city),
        temp = Field(&weather.temperature),
        feels = Field(&weather.feels_like),
        min = Field(&weather.min_temp),
        humidity = Field(&weather.humidity),
        condition = Field(&weather.weather_condition),
        wind = Field(&weather.wind_speed),
        visibility = Field(&weather.visibility),
    )
}
