// broker/data.rs

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::broker::portfolio::Portfolio;
use crate::error::StoreError;
use crate::models::Position;

/// One row of a saved portfolio: `Stock Name,Quantity,Average Price`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct PositionRow {
    #[serde(rename = "Stock Name")]
    symbol: String,
    #[serde(rename = "Quantity")]
    quantity: u64,
    #[serde(rename = "Average Price")]
    average_cost: f64,
}

impl From<&Position> for PositionRow {
    fn from(position: &Position) -> Self {
        Self {
            symbol: position.symbol.clone(),
            quantity: position.quantity,
            average_cost: position.average_cost,
        }
    }
}

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Position {
            symbol: row.symbol,
            quantity: row.quantity,
            average_cost: row.average_cost,
        }
    }
}

pub fn read_positions<R: Read>(reader: R) -> Result<Portfolio, StoreError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut positions = Vec::new();
    for row in rdr.deserialize::<PositionRow>() {
        positions.push(Position::from(row?));
    }
    Ok(Portfolio::from_positions(positions)?)
}

pub fn write_positions<W: Write>(writer: W, portfolio: &Portfolio) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if portfolio.is_empty() {
        wtr.write_record(["Stock Name", "Quantity", "Average Price"])?;
    }
    for position in portfolio {
        wtr.serialize(PositionRow::from(position))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Load a saved portfolio. A missing file is an empty portfolio.
pub fn load_positions(path: &Path) -> Result<Portfolio, StoreError> {
    if !path.exists() {
        return Ok(Portfolio::new());
    }
    let file = File::open(path)?;
    read_positions(file)
}

pub fn save_positions(path: &Path, portfolio: &Portfolio) -> Result<(), StoreError> {
    let file = File::create(path)?;
    write_positions(file, portfolio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(portfolio: &Portfolio) -> String {
        let mut buf = Vec::new();
        write_positions(&mut buf, portfolio).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_header_and_rows_in_symbol_order() {
        let mut portfolio = Portfolio::new();
        portfolio.insert_or_merge("MSFT", 3, 250.5).unwrap();
        portfolio.insert_or_merge("AAPL", 10, 100.0).unwrap();

        assert_eq!(
            export(&portfolio),
            "Stock Name,Quantity,Average Price\nAAPL,10,100.0\nMSFT,3,250.5\n"
        );
    }

    #[test]
    fn empty_portfolio_still_writes_header() {
        assert_eq!(export(&Portfolio::new()), "Stock Name,Quantity,Average Price\n");
    }

    #[test]
    fn reads_rows_and_merges_repeated_symbols() {
        let csv = "Stock Name,Quantity,Average Price\nAAPL,10,100.0\nGOOG,1,2000\nAAPL,10,200.0\n";
        let portfolio = read_positions(csv.as_bytes()).unwrap();

        assert_eq!(portfolio.len(), 2);
        let aapl = portfolio.search("AAPL").unwrap();
        assert_eq!(aapl.quantity, 20);
        assert_eq!(aapl.average_cost, 150.0);
    }

    #[test]
    fn rejects_malformed_rows() {
        let csv = "Stock Name,Quantity,Average Price\nAAPL,ten,100.0\n";
        assert!(matches!(read_positions(csv.as_bytes()), Err(StoreError::Csv(_))));
    }

    #[test]
    fn rejects_rows_the_portfolio_refuses() {
        let csv = "Stock Name,Quantity,Average Price\nAAPL,0,100.0\n";
        assert!(matches!(
            read_positions(csv.as_bytes()),
            Err(StoreError::Portfolio(_))
        ));
    }
}
