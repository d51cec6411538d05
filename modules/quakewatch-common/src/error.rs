use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuakeError {
    #[error("Configuration error: {0}")]
    Config(String),
}
