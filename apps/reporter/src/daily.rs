use anyhow::Result;
use chrono::Local;
use feeds::{Quote, QuoteClient, WeatherClient, WeatherSnapshot};
use lettre::AsyncTransport;
use stock::{CollectOutcome, MarketCollector, chart};
use tracing::{error, info, info_span, instrument, warn};
use tracing_futures::Instrument;

use crate::{
    config::Config,
    mailer::{ReportMailer, render_body},
};

/// Run every stage once, in order, returning how many stages failed. A failing
/// stage is logged and the next one still runs; only client construction
/// errors are returned.
#[instrument(name = "run_daily", skip_all, fields(city = %config.city))]
pub async fn run_daily<T>(config: &Config, mailer: &ReportMailer<T>) -> Result<usize>
where
    T: AsyncTransport + Sync,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let collector = MarketCollector::new(
        &config.webdriver_url,
        &config.market_url,
        config.market_wait,
        config.browser_headless,
    );
    let weather_client = WeatherClient::new(&config.weather_url, &config.weather_api_key)?;
    let quote_client = QuoteClient::new(&config.quotes_url)?;

    let mut failures: usize = 0;

    match collector
        .collect(&config.market_data_path)
        .instrument(info_span!("stage", stage = "market"))
        .await
    {
        Ok(CollectOutcome::Saved { rows }) => info!(rows, "market stage done"),
        Ok(CollectOutcome::TableMissing) => {
            failures += 1;
            warn!("market stage aborted: table not found");
        }
        Err(e) => {
            failures += 1;
            error!(error = ?e, "market stage failed");
        }
    }

    let weather = match weather_client
        .fetch(&config.city)
        .instrument(info_span!("stage", stage = "weather"))
        .await
    {
        Ok(w) => w,
        Err(e) => {
            failures += 1;
            warn!(error = ?e, "weather stage failed, using empty snapshot");
            WeatherSnapshot::default()
        }
    };

    let chart_result = {
        let _span = info_span!("stage", stage = "chart").entered();
        chart::render_chart_file(&config.market_data_path, &config.chart_path)
    };
    if let Err(e) = chart_result {
        failures += 1;
        error!(error = ?e, "chart stage failed");
    }

    let quote = match quote_client
        .fetch_random()
        .instrument(info_span!("stage", stage = "quote"))
        .await
    {
        Ok(q) => q,
        Err(e) => {
            failures += 1;
            warn!(error = ?e, "quote stage failed, using fallback");
            Quote::fallback()
        }
    };

    let body = render_body(&config.city, Local::now().date_naive(), &weather, &quote);

    let sent = async {
        let message = mailer.compose(body, &config.chart_path)?;
        mailer.send(message).await
    }
    .instrument(info_span!("stage", stage = "email"))
    .await;

    if let Err(e) = sent {
        failures += 1;
        error!(error = ?e, "email stage failed");
    }

    info!(failures, "completed daily report");

    Ok(failures)
}
