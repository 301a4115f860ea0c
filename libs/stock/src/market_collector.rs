use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow, ensure};
use fantoccini::{Client, ClientBuilder, Locator, wd::Capabilities};
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::price_table::{self, MarketRow};

/// Rendered once the listing script has populated the table.
pub const TABLE_CSS: &str = ".table.table__lg.table-striped.table__border.table__border--bottom";

/// Exact `class` attribute of the listing table.
pub const TABLE_CLASS: &str = "table table__lg table-striped table__border table__border--bottom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    Saved { rows: usize },
    TableMissing,
}

#[derive(Clone)]
pub struct MarketCollector {
    webdriver_url: String,
    page_url: String,
    wait: Duration,
    headless: bool,
}

impl MarketCollector {
    pub fn new(
        webdriver_url: impl Into<String>,
        page_url: impl Into<String>,
        wait: Duration,
        headless: bool,
    ) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            page_url: page_url.into(),
            wait,
            headless,
        }
    }

    /// Scrape the listing and overwrite `out` with its rows.
    ///
    /// The browser session is closed before returning, whatever the outcome
    /// of loading the page.
    #[instrument(name = "collect_market", skip(self), fields(url = %self.page_url))]
    pub async fn collect(&self, out: &Path) -> Result<CollectOutcome> {
        let client = self.connect().await?;

        let html = self.load_page(&client).await;

        if let Err(e) = client.close().await {
            warn!(error = ?e, "closing browser session failed");
        } else {
            debug!("browser session closed");
        }

        let html = html?;
        debug!(bytes = html.len(), "page source captured");

        let Some(rows) = parse_table(&html)? else {
            warn!("no table was found");
            return Ok(CollectOutcome::TableMissing);
        };

        price_table::write(out, &rows)?;
        info!(rows = rows.len(), path = %out.display(), "market data saved");

        Ok(CollectOutcome::Saved { rows: rows.len() })
    }

    async fn connect(&self) -> Result<Client> {
        let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
        if self.headless {
            args.push("--headless=new");
        }

        let mut caps = Capabilities::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        builder
            .connect(&self.webdriver_url)
            .await
            .with_context(|| format!("connect to webdriver at {}", self.webdriver_url))
    }

    async fn load_page(&self, client: &Client) -> Result<String> {
        client
            .goto(&self.page_url)
            .await
            .with_context(|| format!("navigate to {}", self.page_url))?;

        client
            .wait()
            .at_most(self.wait)
            .for_element(Locator::Css(TABLE_CSS))
            .await
            .with_context(|| format!("table did not render within {:?}", self.wait))?;

        Ok(client.source().await?)
    }
}

/// Extract `(company, price)` rows from the rendered listing.
///
/// Returns `Ok(None)` when no table carries the exact class signature. The
/// first row is the header. Rows with fewer than two cells are skipped; any
/// other row must have a finite, non-negative third cell once `,` separators
/// are removed.
pub fn parse_table(html: &str) -> Result<Option<Vec<MarketRow>>> {
    let document = Html::parse_document(html);

    let table_sel = selector(&format!("table[class=\"{TABLE_CLASS}\"]"))?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let Some(table) = document.select(&table_sel).next() else {
        return Ok(None);
    };

    let mut rows = Vec::new();

    for (i, tr) in table.select(&row_sel).enumerate().skip(1) {
        let cells: Vec<ElementRef> = tr.select(&cell_sel).collect();
        if cells.len() <= 1 {
            continue;
        }

        let company = cell_text(cells[1]);
        let price_cell = cells
            .get(2)
            .ok_or_else(|| anyhow!("row {i} ({company}) has no price cell"))?;
        let price_text = cell_text(*price_cell).replace(',', "");

        let price: f64 = price_text
            .parse()
            .with_context(|| format!("row {i} ({company}): invalid price {price_text:?}"))?;
        ensure!(
            price.is_finite() && price >= 0.0,
            "row {i} ({company}): price {price_text:?} is not a non-negative number"
        );

        rows.push(MarketRow::new(company, price));
    }

    Ok(Some(rows))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e:?}"))
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="{TABLE_CLASS}">
              <thead><tr><th>S.N.</th><th>Symbol</th><th>Close Price</th></tr></thead>
              <tbody>{rows}</tbody>
            </table>
            </body></html>"#
        )
    }

    #[test]
    fn parses_rows_after_header() {
        let html = page(
            "<tr><td>1</td><td> Alpha </td><td>100.50</td></tr>
             <tr><td>2</td><td>Beta</td><td>1,200.00</td></tr>",
        );

        let rows = parse_table(&html).unwrap().unwrap();

        assert_eq!(
            rows,
            vec![MarketRow::new("Alpha", 100.5), MarketRow::new("Beta", 1200.0)]
        );
    }

    #[test]
    fn joins_nested_text() {
        let html = page("<tr><td>1</td><td><a href='#'> Gamma </a> <span>Ltd</span></td><td><b>2,000</b></td></tr>");

        let rows = parse_table(&html).unwrap().unwrap();

        assert_eq!(rows, vec![MarketRow::new("GammaLtd", 2000.0)]);
    }

    #[test]
    fn skips_rows_without_enough_cells() {
        let html = page(
            "<tr><td colspan='3'>Loading</td></tr>
             <tr><td>1</td><td>Alpha</td><td>10</td></tr>",
        );

        let rows = parse_table(&html).unwrap().unwrap();

        assert_eq!(rows, vec![MarketRow::new("Alpha", 10.0)]);
    }

    #[test]
    fn header_only_table_is_empty() {
        let rows = parse_table(&page("")).unwrap().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_table_is_none() {
        let html = r#"<table class="table table-striped"><tr><td>1</td><td>A</td><td>1</td></tr></table>"#;
        assert!(parse_table(html).unwrap().is_none());
    }

    #[test]
    fn class_signature_must_match_exactly() {
        let html = format!(
            r#"<table class="{TABLE_CLASS} extra"><tr><th>h</th></tr><tr><td>1</td><td>A</td><td>1</td></tr></table>"#
        );
        assert!(parse_table(&html).unwrap().is_none());
    }

    #[test]
    fn non_numeric_price_fails_the_run() {
        let html = page(
            "<tr><td>1</td><td>Alpha</td><td>10</td></tr>
             <tr><td>2</td><td>Beta</td><td>n/a</td></tr>",
        );

        let err = parse_table(&html).unwrap_err();
        assert!(err.to_string().contains("Beta"));
    }

    #[test]
    fn negative_price_fails_the_run() {
        let html = page("<tr><td>1</td><td>Alpha</td><td>-12.5</td></tr>");

        let err = parse_table(&html).unwrap_err();
        assert!(err.to_string().contains("Alpha"));
    }

    #[test]
    fn non_finite_price_fails_the_run() {
        for price in ["NaN", "inf", "-inf"] {
            let html = page(&format!("<tr><td>1</td><td>Alpha</td><td>{price}</td></tr>"));
            assert!(parse_table(&html).is_err(), "{price} was accepted");
        }
    }

    #[test]
    fn zero_price_is_accepted() {
        let rows = parse_table(&page("<tr><td>1</td><td>Alpha</td><td>0.00</td></tr>"))
            .unwrap()
            .unwrap();
        assert_eq!(rows, vec![MarketRow::new("Alpha", 0.0)]);
    }

    #[test]
    fn missing_price_cell_fails_the_run() {
        let html = page("<tr><td>1</td><td>Alpha</td></tr>");
        assert!(parse_table(&html).is_err());
    }
}
