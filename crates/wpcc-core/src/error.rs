//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WpccError {
    #[error("STORE/{0}")]
    Store(String),

    #[error("SERIALIZE/{0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("AUTH/{0}")]
    Auth(String),
}
