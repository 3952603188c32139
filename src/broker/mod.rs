// broker/mod.rs

pub mod client;
pub mod data;
pub mod portfolio;

pub use client::Client;
pub use data::{load_positions, read_positions, save_positions, write_positions};
pub use portfolio::Portfolio;
