// broker/client.rs

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::broker::data::{load_positions, save_positions};
use crate::broker::portfolio::Portfolio;
use crate::config::Config;
use crate::error::{PortfolioError, StoreError};
use crate::journal::{Journal, JournalEntry};
use crate::models::{OrderAction, TradeRecord};
use crate::performance::PerformanceHeap;

/// Files a logged-in client reads and writes.
struct ClientFiles {
    portfolio: PathBuf,
    journal: Journal,
}

/// One user's trading session: the holdings, the ranking of closed trades
/// and, when opened from disk, the files they are persisted to.
pub struct Client {
    pub username: String,
    portfolio: Portfolio,
    performance: PerformanceHeap,
    files: Option<ClientFiles>,
}

impl Client {
    /// A session that lives only in memory.
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            portfolio: Portfolio::new(),
            performance: PerformanceHeap::new(),
            files: None,
        }
    }

    /// Load the user's saved portfolio and attach their files. The trade
    /// ranking always starts empty.
    pub fn open(config: &Config, username: &str) -> Result<Self, StoreError> {
        let portfolio_path = config.portfolio_path(username);
        let portfolio = load_positions(&portfolio_path)?;
        if !portfolio_path.exists() {
            save_positions(&portfolio_path, &portfolio)?;
        }
        info!(
            "Client {}: loaded {} positions from {}",
            username,
            portfolio.len(),
            portfolio_path.display()
        );

        Ok(Self {
            username: username.to_string(),
            portfolio,
            performance: PerformanceHeap::new(),
            files: Some(ClientFiles {
                portfolio: portfolio_path,
                journal: Journal::new(config.journal_path(username)),
            }),
        })
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn performance(&self) -> &PerformanceHeap {
        &self.performance
    }

    pub fn buy(&mut self, symbol: &str, quantity: u64, price: f64) -> Result<(), StoreError> {
        if let Err(e) = self.portfolio.insert_or_merge(symbol, quantity, price) {
            warn!("Client {}: buy rejected: {}", self.username, e);
            return Err(e.into());
        }
        info!(
            "Client {}: bought {} shares of {} at {:.2}",
            self.username, quantity, symbol, price
        );

        self.save()?;
        self.log_transaction(OrderAction::Buy, symbol, quantity, price)
    }

    /// Sell shares at `price`, pricing the trade against the average cost
    /// held before the sell.
    pub fn sell(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<TradeRecord, StoreError> {
        let record = match self.close_trade(symbol, quantity, price) {
            Ok(record) => record,
            Err(e) => {
                warn!("Client {}: sell rejected: {}", self.username, e);
                return Err(e.into());
            }
        };
        info!(
            "Client {}: sold {} shares of {} at {:.2}, profit {:.2}",
            self.username, quantity, symbol, price, record.realized_profit
        );

        self.save()?;
        self.log_transaction(OrderAction::Sell, symbol, quantity, price)?;
        Ok(record)
    }

    fn close_trade(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<TradeRecord, PortfolioError> {
        if !price.is_finite() || price < 0.0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "sell price for {} must be a non-negative number, got {}",
                symbol, price
            )));
        }
        if quantity == 0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "quantity for {} must be positive",
                symbol
            )));
        }

        let held = self
            .portfolio
            .search(symbol)
            .ok_or_else(|| PortfolioError::NotFound {
                symbol: symbol.to_string(),
            })?;
        if held.quantity < quantity {
            return Err(PortfolioError::InsufficientQuantity {
                symbol: symbol.to_string(),
                held: held.quantity,
                requested: quantity,
            });
        }

        let record = TradeRecord::new(symbol, quantity, held.realized_profit(quantity, price));
        self.portfolio.reduce(symbol, quantity)?;
        self.performance.push(record.clone())?;
        Ok(record)
    }

    /// Write the portfolio to its ledger file, if the session has one.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(files) = &self.files {
            save_positions(&files.portfolio, &self.portfolio)?;
        }
        Ok(())
    }

    /// Write a copy of the portfolio ledger to `path`.
    pub fn export(&self, path: &Path) -> Result<(), StoreError> {
        save_positions(path, &self.portfolio)?;
        info!(
            "Client {}: exported {} positions to {}",
            self.username,
            self.portfolio.len(),
            path.display()
        );
        Ok(())
    }

    /// Recorded transactions, oldest first. In-memory sessions have none.
    pub fn history(&self) -> Result<Vec<JournalEntry>, StoreError> {
        match &self.files {
            Some(files) => files.journal.entries(),
            None => Ok(Vec::new()),
        }
    }

    fn log_transaction(
        &self,
        action: OrderAction,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<(), StoreError> {
        if let Some(files) = &self.files {
            files.journal.record(action, symbol, quantity, price)?;
        }
        Ok(())
    }
}
