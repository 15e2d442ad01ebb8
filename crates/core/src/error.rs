use thiserror::Error;

pub type ShopperResult<T> = Result<T, ShopperError>;

#[derive(Error, Debug)]
pub enum ShopperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ShopperError {
    /// True when the error stems from a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ShopperError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            ShopperError::Csv(e) => matches!(
                e.kind(),
                csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}
