use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

const HEADER: [&str; 2] = ["Company", "Stock Price"];

/// One company row scraped from the market listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    #[serde(rename = "Company")]
    pub company: String,

    #[serde(rename = "Stock Price")]
    pub price: f64,
}

impl MarketRow {
    pub fn new(company: impl Into<String>, price: f64) -> Self {
        Self {
            company: company.into(),
            price,
        }
    }
}

/// Overwrite `path` with the header line followed by one record per row.
pub fn write(path: &Path, rows: &[MarketRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("open {} for writing", path.display()))?;

    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Read every record back; a missing file, a malformed record or a negative
/// or non-finite price is an error.
pub fn read(path: &Path) -> Result<Vec<MarketRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open {} for reading", path.display()))?;

    reader
        .deserialize::<MarketRow>()
        .enumerate()
        .map(|(i, record)| -> Result<MarketRow> {
            let row = record.with_context(|| format!("malformed record {}", i + 1))?;
            ensure!(
                row.price.is_finite() && row.price >= 0.0,
                "record {} ({}): price {} is not a non-negative number",
                i + 1,
                row.company,
                row.price
            );
            Ok(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.csv");

        write(
            &path,
            &[MarketRow::new("Alpha", 100.5), MarketRow::new("Beta", 1200.0)],
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Company,Stock Price"));
        assert_eq!(lines.count(), 2);

        let rows = read(&path).unwrap();
        assert_eq!(rows[0], MarketRow::new("Alpha", 100.5));
        assert_eq!(rows[1], MarketRow::new("Beta", 1200.0));
    }

    #[test]
    fn rewrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.csv");

        write(&path, &[MarketRow::new("Old", 1.0), MarketRow::new("Older", 2.0)]).unwrap();
        write(&path, &[MarketRow::new("New", 3.0)]).unwrap();

        assert_eq!(read(&path).unwrap(), vec![MarketRow::new("New", 3.0)]);
    }

    #[test]
    fn empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.csv");

        write(&path, &[]).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap().trim_end(),
            "Company,Stock Price"
        );
        assert!(read(&path).unwrap().is_empty());
    }

    #[test]
    fn non_finite_or_negative_price_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.csv");

        for price in ["NaN", "inf", "-3.5"] {
            std::fs::write(&path, format!("Company,Stock Price\nAlpha,{price}\n")).unwrap();
            assert!(read(&path).is_err(), "{price} was accepted");
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn malformed_price_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.csv");
        std::fs::write(&path, "Company,Stock Price\nAlpha,lots\n").unwrap();

        assert!(read(&path).is_err());
    }
}
