use thiserror::Error;

/// Failures of the in-memory portfolio structures. None of them leave a
/// structure partially mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("stock {symbol} not found in portfolio")]
    NotFound { symbol: String },

    #[error("not enough {symbol} to sell: held {held}, requested {requested}")]
    InsufficientQuantity {
        symbol: String,
        held: u64,
        requested: u64,
    },

    #[error("performance heap is empty")]
    Empty,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures of the flat-file layer around the portfolio.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("user name {0} already exists")]
    UserExists(String),

    #[error("invalid user name or password")]
    InvalidCredentials,

    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
}
