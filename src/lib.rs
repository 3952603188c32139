// lib.rs

pub mod accounts;
pub mod broker;
pub mod config;
pub mod error;
pub mod journal;
pub mod models;
pub mod performance;
pub mod report;

pub use broker::{Client, Portfolio};
pub use error::{PortfolioError, StoreError};
pub use models::{Position, TradeRecord};
pub use performance::PerformanceHeap;
