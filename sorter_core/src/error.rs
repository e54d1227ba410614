use thiserror::Error;

use crate::category::Category;

#[derive(Debug, Error, Clone)]
pub enum SorterError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("category link error: {0}")]
    Link(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing encoder")]
    MissingEncoder,
    #[error("missing category link")]
    MissingLink,
    #[error("missing actuator for category {0}")]
    MissingActuator(Category),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
