use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("empty ring")]
    EmptyRing,
    #[error("ring engine has been stopped")]
    Stopped,
    #[error("failed to decode ring descriptor: {0}")]
    Decode(String),
    #[error("failed to encode ring descriptor: {0}")]
    Encode(String),
}
