// models.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregated holding of one symbol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub average_cost: f64,
}

impl Position {
    pub fn new(symbol: &str, quantity: u64, average_cost: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity,
            average_cost,
        }
    }

    /// Cost basis of the whole holding.
    pub fn notional(&self) -> f64 {
        self.average_cost * self.quantity as f64
    }

    /// Realized profit of selling `quantity` shares at `sell_price`.
    pub fn realized_profit(&self, quantity: u64, sell_price: f64) -> f64 {
        (sell_price - self.average_cost) * quantity as f64
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stock: {} | Quantity: {} | Avg Price: {:.2}",
            self.symbol, self.quantity, self.average_cost
        )
    }
}

/// A completed sell. Never mutated once created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub quantity_sold: u64,
    pub realized_profit: f64,
}

impl TradeRecord {
    pub fn new(symbol: &str, quantity_sold: u64, realized_profit: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity_sold,
            realized_profit,
        }
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stock: {} | Quantity: {} | Profit: {:.2}",
            self.symbol, self.quantity_sold, self.realized_profit
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Buy => write!(f, "BUY"),
            OrderAction::Sell => write!(f, "SELL"),
        }
    }
}
