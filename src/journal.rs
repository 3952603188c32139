use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::OrderAction;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One line of the transaction history file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JournalEntry {
    #[serde(rename = "Transaction Type")]
    pub action: OrderAction,
    #[serde(rename = "Stock Name")]
    pub symbol: String,
    #[serde(rename = "Quantity")]
    pub quantity: u64,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Date")]
    pub date: String,
}

/// Append-only audit trail of buys and sells. It is never read back into
/// the portfolio.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(
        &self,
        action: OrderAction,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<JournalEntry, StoreError> {
        let entry = JournalEntry {
            action,
            symbol: symbol.to_string(),
            quantity,
            price,
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
        };
        self.append(&entry)?;
        Ok(entry)
    }

    pub fn append(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let is_new = self
            .path
            .metadata()
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        wtr.serialize(entry)?;
        wtr.flush()?;
        Ok(())
    }

    /// Every recorded transaction in file order.
    pub fn entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_reader(File::open(&self.path)?);
        let mut entries = Vec::new();
        for entry in rdr.deserialize::<JournalEntry>() {
            entries.push(entry?);
        }
        Ok(entries)
    }
}

/// The transaction with the lowest price. Ties go to the earliest entry.
pub fn lowest_price(entries: &[JournalEntry]) -> Option<&JournalEntry> {
    entries.iter().min_by(|a, b| a.price.total_cmp(&b.price))
}

/// The transaction with the highest price. Ties go to the latest entry.
pub fn highest_price(entries: &[JournalEntry]) -> Option<&JournalEntry> {
    entries.iter().max_by(|a, b| a.price.total_cmp(&b.price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appends_rows_under_a_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("alice_transaction_history.csv"));

        journal.record(OrderAction::Buy, "AAPL", 10, 100.0).unwrap();
        journal.record(OrderAction::Sell, "AAPL", 4, 120.5).unwrap();

        let contents = fs::read_to_string(journal.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Transaction Type,Stock Name,Quantity,Price,Date");
        assert!(lines[1].starts_with("BUY,AAPL,10,100.0,"));
        assert!(lines[2].starts_with("SELL,AAPL,4,120.5,"));
    }

    #[test]
    fn reads_entries_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("history.csv"));
        let written = journal.record(OrderAction::Sell, "MSFT", 2, 300.0).unwrap();

        let entries = journal.entries().unwrap();
        assert_eq!(entries, vec![written]);
        assert_eq!(entries[0].date.len(), "2024-01-01 00:00:00".len());
    }

    #[test]
    fn missing_file_has_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("none.csv"));
        assert!(journal.entries().unwrap().is_empty());
    }

    #[test]
    fn price_extremes_over_buys_and_sells() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("history.csv"));
        journal.record(OrderAction::Buy, "AAPL", 10, 100.0).unwrap();
        journal.record(OrderAction::Buy, "GOOG", 1, 2000.0).unwrap();
        journal.record(OrderAction::Sell, "AAPL", 5, 95.5).unwrap();

        let entries = journal.entries().unwrap();
        let lowest = lowest_price(&entries).unwrap();
        assert_eq!((lowest.action, lowest.symbol.as_str()), (OrderAction::Sell, "AAPL"));
        assert_eq!(lowest.price, 95.5);
        assert_eq!(highest_price(&entries).unwrap().symbol, "GOOG");

        assert!(lowest_price(&[]).is_none());
        assert!(highest_price(&[]).is_none());
    }
}
