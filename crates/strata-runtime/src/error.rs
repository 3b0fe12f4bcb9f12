use thiserror::Error;

pub use strata_io::CodecError;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A configuration value is outside what the engine can run with.
    #[error("invalid terrain config: {0}")]
    Config(String),
}
