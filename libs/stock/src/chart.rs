use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Error, ensure};
use charming::{
    Chart, ImageFormat, ImageRenderer,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisType, ItemStyle, NameLocation, TextStyle},
    series::Bar,
};
use tracing::{debug, info, instrument};

use crate::price_table::{self, MarketRow};

pub const TOP_N: usize = 10;

/// The `n` highest priced rows, highest first. Equal prices keep file order.
pub fn top_by_price(rows: &[MarketRow], n: usize) -> Vec<MarketRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.price.total_cmp(&a.price));
    sorted.truncate(n);
    sorted
}

pub fn generate_chart(rows: &[MarketRow]) -> Result<Vec<u8>, Error> {
    ensure!(!rows.is_empty(), "no market rows to chart");

    const WIDTH: u32 = 1000;
    const HEIGHT: u32 = 600;

    let top = top_by_price(rows, TOP_N);
    let companies: Vec<String> = top.iter().map(|r| r.company.clone()).collect();
    let prices: Vec<f64> = top.iter().map(|r| r.price).collect();

    let chart = Chart::new()
        .background_color("#ffffff")
        .title(
            Title::new()
                .text(format!("Top {TOP_N} Companies by Stock Price (Nepse)"))
                .left("center")
                .top("2%")
                .text_style(TextStyle::new().font_size(14)),
        )
        .grid(Grid::new().left("10%").right("4%").bottom("24%"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Company")
                .name_location(NameLocation::Middle)
                .name_gap(70)
                .data(companies)
                .axis_label(AxisLabel::new().rotate(45).interval(0)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Stock Price (NPR)")
                .name_location(NameLocation::Middle)
                .name_gap(55),
        )
        .series(
            Bar::new()
                .name("Stock Price")
                .data(prices)
                .item_style(ItemStyle::new().color("#87ceeb")),
        );

    let mut renderer = ImageRenderer::new(WIDTH, HEIGHT);
    let png_bytes = renderer.render_format(ImageFormat::Png, &chart)?;
    Ok(png_bytes)
}

/// Chart the market table at `data_path` into `chart_path`, returning the
/// number of bars drawn.
///
/// Any previous chart is removed first, so a failed run never leaves an
/// older chart behind.
#[instrument(name = "render_chart", skip_all, fields(data = %data_path.display(), chart = %chart_path.display()))]
pub fn render_chart_file(data_path: &Path, chart_path: &Path) -> Result<usize, Error> {
    match std::fs::remove_file(chart_path) {
        Ok(()) => debug!("removed previous chart"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::new(e)
                .context(format!("remove previous chart {}", chart_path.display())));
        }
    }

    let rows = price_table::read(data_path)?;
    debug!(rows = rows.len(), "loaded market rows");

    let bytes = generate_chart(&rows)?;
    std::fs::write(chart_path, &bytes)
        .with_context(|| format!("write chart to {}", chart_path.display()))?;

    let bars = rows.len().min(TOP_N);
    info!(bars, bytes = bytes.len(), "chart saved");
    Ok(bars)
}
